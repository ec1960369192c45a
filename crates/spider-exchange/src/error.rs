//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 연결 수립 실패
    #[error("Connection error: {0}")]
    Connection(String),

    /// 연결된 소켓의 송수신 실패
    #[error("Transport error: {0}")]
    Transport(String),

    /// 연결되지 않은 상태에서의 명령 시도
    #[error("Not connected")]
    NotConnected,

    /// 거래소가 명령을 거부함
    #[error("Command failed with error code {code} - {description}")]
    CommandFailed {
        code: String,
        description: String,
    },

    /// 응답 파싱 실패
    #[error("Parse error: {0}")]
    Parse(String),

    /// 응답 대기 타임아웃
    #[error("Request timeout after {0}ms")]
    Timeout(u64),
}

impl ExchangeError {
    /// 재로그인 후 한 번 재시도할 가치가 있는 에러인지 확인.
    ///
    /// 명령 거부와 전송 계층 실패가 여기에 해당하며, 파싱 실패는
    /// 재시도해도 같은 결과가 나오므로 제외합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::Transport(_)
                | ExchangeError::NotConnected
                | ExchangeError::CommandFailed { .. }
                | ExchangeError::Timeout(_)
                | ExchangeError::Connection(_)
        )
    }

    /// 전송 계층 실패 여부 (연결을 버려야 하는 경우).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ExchangeError::Transport(_) | ExchangeError::Timeout(_) | ExchangeError::NotConnected
        )
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ExchangeError::Transport("socket closed".into()).is_retryable());
        assert!(ExchangeError::CommandFailed {
            code: "BE005".into(),
            description: "userPasswordCheck: Invalid login or password".into(),
        }
        .is_retryable());
        assert!(!ExchangeError::Parse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_transport_classification() {
        assert!(ExchangeError::Timeout(5000).is_transport());
        assert!(!ExchangeError::CommandFailed {
            code: "EX000".into(),
            description: "Invalid parameters".into(),
        }
        .is_transport());
    }
}
