//! # Spider Data
//!
//! 수집기의 공유 상태 접근 계층을 제공합니다.
//!
//! - [`pool`]: Redis 스트림 기반 세션 풀 (lease/reclaim/initialize)
//! - [`memory`]: 테스트/로컬 실행용 인메모리 풀
//! - [`storage`]: Postgres 캔들/커버리지 저장소

pub mod error;
pub mod memory;
pub mod pool;
pub mod storage;

pub use error::{DataError, Result};
pub use memory::MemorySessionPool;
pub use pool::{LeasedSession, RedisSessionPool, SessionPool};
pub use storage::{CandleStore, CoverageStore};
