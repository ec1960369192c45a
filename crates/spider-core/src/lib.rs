//! # Spider Core
//!
//! 캔들 수집기의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 캔들(OHLCV) 레코드 및 복합 키 유도
//! - 심볼/타임프레임 카탈로그
//! - 수집 범위(coverage) 레코드
//! - 세션 풀 자격증명
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
