//! 도메인 모델.

pub mod candle;
pub mod coverage;
pub mod credential;

pub use candle::{candle_id, Candle};
pub use coverage::CandleStat;
pub use credential::Credential;
