//! Postgres 저장소 접근.

pub mod candles;
pub mod coverage;

pub use candles::CandleStore;
pub use coverage::CoverageStore;
