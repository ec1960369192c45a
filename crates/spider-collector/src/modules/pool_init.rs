//! 세션 풀 초기화.

use crate::{CollectorConfig, CollectorError, Result};
use spider_data::SessionPool;
use tracing::info;

/// 설정된 계정 목록으로 세션 풀을 다시 시드합니다.
///
/// 기존 풀 내용은 버려지므로 임대 중인 세션이 없을 때 실행해야 합니다.
pub async fn init_pool(pool: &dyn SessionPool, config: &CollectorConfig) -> Result<()> {
    if config.exchange.accounts.is_empty() {
        return Err(CollectorError::Config(
            "SPIDER_ACCOUNTS 환경변수에 계정이 없습니다".to_string(),
        ));
    }

    pool.initialize(&config.exchange.accounts).await?;
    info!(accounts = config.exchange.accounts.len(), "세션 풀 초기화 완료");
    Ok(())
}
