//! 수집 모듈.

pub mod backfill;
pub mod collect;
pub mod pool_init;

pub use backfill::{historical_window, max_backdate, present_window, FetchWindow, WindowKind};
pub use collect::collect_pair;
pub use pool_init::init_pool;
