//! 세션 풀 자격증명.

use serde::{Deserialize, Serialize};

/// 거래소 로그인 자격증명 한 벌.
///
/// 풀의 식별자는 `user`입니다. 발급 후에는 불변이며, Redis 스트림
/// 엔트리로 그대로 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// 거래소 사용자 ID
    pub user: String,
    /// 로그인 토큰
    pub token: String,
}

impl Credential {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}
