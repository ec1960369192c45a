//! # Spider Exchange
//!
//! 거래소와의 명령 프로토콜 계층을 제공합니다.
//!
//! - [`protocol::ProtocolClient`]: 지속 연결 위에서 JSON 명령 하나당
//!   응답 하나를 주고받는 저수준 클라이언트
//! - [`session::ExchangeSession`]: 자격증명 하나와 연결 하나를 묶어
//!   login/logout/차트 조회 명령과 재시도 정책을 제공하는 세션

pub mod error;
pub mod protocol;
pub mod session;

pub use error::{ExchangeError, ExchangeResult};
pub use protocol::{CommandChannel, CommandResponse, ProtocolClient};
pub use session::{ConnectionState, ExchangeSession, RangeResult, RateInfo};
