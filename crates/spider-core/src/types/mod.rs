//! 공용 타입 정의.

pub mod instrument;
pub mod period;

pub use instrument::{default_pairs, symbol_id, Instrument};
pub use period::Period;
