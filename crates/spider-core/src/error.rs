//! 수집 시스템의 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum SpiderError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 카탈로그에 없는 심볼
    #[error("알 수 없는 심볼: {0}")]
    UnknownSymbol(String),

    /// 카탈로그에 없는 타임프레임 (분 단위)
    #[error("알 수 없는 타임프레임: {0}분")]
    UnknownPeriod(i32),

    /// 직렬화/역직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SpiderError {
    fn from(err: serde_json::Error) -> Self {
        SpiderError::Serialization(err.to_string())
    }
}
