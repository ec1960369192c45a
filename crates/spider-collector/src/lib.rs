//! Standalone candle ingestion worker for CandleSpider.
//!
//! 이 crate는 거래소 세션 풀에서 세션을 임대해 (심볼, 타임프레임) 쌍별로
//! 캔들을 수집하는 바이너리를 제공합니다:
//! - 세션 풀 초기화 (Redis 스트림 시드)
//! - 현재 구간 + 과거 방향 백필 수집
//! - coverage 레코드 갱신

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CycleStats;
