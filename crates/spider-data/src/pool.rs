//! Redis 스트림 기반 세션 풀.
//!
//! 자격증명들을 FIFO 순서의 Redis 스트림에 담아두고 워커들이 하나씩
//! 임대(lease)해 갑니다. 스트림은 프로세스 경계를 넘는 단일한 공유
//! 상태이므로 어떤 프로세스도 풀 상태를 자체적으로 들고 있지 않습니다.
//!
//! # 임대 패턴
//!
//! `lease`는 가장 오래된 엔트리를 읽은 뒤(read) 그 엔트리를 ID로
//! 삭제(delete)하는 두 단계로 동작합니다. 삭제가 0건이면 다른 워커가
//! 먼저 가져간 것이므로 "풀 비어 있음"으로 처리합니다. 읽기와 삭제를
//! 한 단계로 합치지 않는 것이 경쟁에서 진 쪽을 안전한 no-op으로
//! 만들어 줍니다.
//!
//! # 알려진 한계
//!
//! 임대에는 만료가 없습니다. 워커가 반납(reclaim) 없이 죽으면 해당
//! 자격증명은 `initialize`로 풀을 다시 시드할 때까지 돌아오지 않습니다.
//! 임대 핸들이 스트림 타임스탬프를 들고 있으므로 필요해지면
//! visibility-timeout을 덧붙일 수 있습니다.

use crate::error::{DataError, Result};
use async_trait::async_trait;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use spider_core::Credential;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 풀이 비었을 때 재시도 간격.
const LEASE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 기본 스트림 키.
const DEFAULT_STREAM_KEY: &str = "SessionPoolFIFO";

/// 풀에서 임대한 세션 핸들.
///
/// 반납 시 자격증명이 풀 뒤쪽에 다시 들어갑니다. 핸들을 버리면
/// 자격증명은 임대 상태로 남습니다.
#[derive(Debug, Clone)]
pub struct LeasedSession {
    /// 임대한 자격증명
    pub credential: Credential,
    /// 풀 백엔드의 엔트리 ID
    pub lease_id: String,
    /// 엔트리가 풀에 들어간 시각 (epoch 밀리초)
    pub leased_at_ms: i64,
}

/// 세션 풀 계약.
///
/// 구현체는 `lease`가 같은 자격증명을 두 호출자에게 동시에 주지 않는
/// 것을 보장해야 합니다. `reclaim`은 추가식이라 항상 성공하며, 중복
/// 반납은 풀을 깨뜨리지 않는 대신 일시적으로 같은 자격증명이 두 번
/// 들어갈 수 있습니다(알려진 위험).
#[async_trait]
pub trait SessionPool: Send + Sync {
    /// 풀을 정확히 이 자격증명 집합으로 재설정합니다. 기동 시 1회용.
    async fn initialize(&self, credentials: &[Credential]) -> Result<()>;

    /// 가장 오래된 자격증명 하나를 배타적으로 가져옵니다.
    ///
    /// 풀이 비어 있으면(또는 경쟁에서 졌으면) `None` — 에러가 아니라
    /// 호출자가 물러나야 한다는 신호입니다.
    async fn lease(&self) -> Result<Option<LeasedSession>>;

    /// 자격증명을 풀 뒤쪽에 반납합니다.
    async fn reclaim(&self, leased: &LeasedSession) -> Result<()>;

    /// 임대를 짧은 간격으로 재시도하며 `timeout`까지 기다립니다.
    ///
    /// 시간 안에 임대하지 못하면 `None` — 이번 사이클은 건너뜁니다.
    async fn lease_with_timeout(&self, timeout: Duration) -> Result<Option<LeasedSession>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(leased) = self.lease().await? {
                return Ok(Some(leased));
            }
            if tokio::time::Instant::now() + LEASE_POLL_INTERVAL > deadline {
                return Ok(None);
            }
            tokio::time::sleep(LEASE_POLL_INTERVAL).await;
        }
    }
}

/// Redis 스트림을 백엔드로 쓰는 세션 풀.
#[derive(Clone)]
pub struct RedisSessionPool {
    connection: Arc<RwLock<MultiplexedConnection>>,
    stream_key: String,
}

impl RedisSessionPool {
    /// Redis에 연결하고 기본 스트림 키로 풀을 만듭니다.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_key(url, DEFAULT_STREAM_KEY).await
    }

    /// Redis에 연결하고 지정한 스트림 키로 풀을 만듭니다.
    pub async fn connect_with_key(url: &str, stream_key: &str) -> Result<Self> {
        info!(stream_key = stream_key, "Connecting to Redis session pool...");

        let client = Client::open(url).map_err(|e| DataError::PoolError(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::PoolError(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            stream_key: stream_key.to_string(),
        })
    }

    /// 스트림 엔트리 ID에서 등록 시각(ms)을 파싱합니다.
    fn entry_timestamp_ms(entry_id: &str) -> i64 {
        entry_id
            .split('-')
            .next()
            .and_then(|ts| ts.parse().ok())
            .unwrap_or(0)
    }
}

#[async_trait]
impl SessionPool for RedisSessionPool {
    async fn initialize(&self, credentials: &[Credential]) -> Result<()> {
        let mut conn = self.connection.write().await;

        let _: () = conn.del(&self.stream_key).await?;
        for credential in credentials {
            let _: String = conn
                .xadd(
                    &self.stream_key,
                    "*",
                    &[
                        ("user", credential.user.as_str()),
                        ("token", credential.token.as_str()),
                    ],
                )
                .await?;
            info!(user = %credential.user, "세션 풀에 자격증명 등록");
        }

        Ok(())
    }

    async fn lease(&self) -> Result<Option<LeasedSession>> {
        let mut conn = self.connection.write().await;

        // 1단계: 가장 오래된 엔트리 읽기
        let options = StreamReadOptions::default().count(1);
        let reply: StreamReadReply = conn
            .xread_options(&[&self.stream_key], &["0"], &options)
            .await?;

        let entry = reply
            .keys
            .first()
            .and_then(|stream| stream.ids.first())
            .cloned();

        let Some(entry) = entry else {
            debug!("세션 풀 비어 있음");
            return Ok(None);
        };

        let user: String = entry
            .get("user")
            .ok_or_else(|| DataError::PoolError("stream entry missing user".to_string()))?;
        let token: String = entry
            .get("token")
            .ok_or_else(|| DataError::PoolError("stream entry missing token".to_string()))?;

        // 2단계: 그 엔트리를 ID로 삭제해서 클레임 확정
        let deleted: i64 = conn.xdel(&self.stream_key, &[&entry.id]).await?;
        if deleted == 0 {
            // 다른 워커가 먼저 가져갔다 — 빈 풀과 동일하게 처리
            debug!(user = %user, "임대 경쟁에서 밀림");
            return Ok(None);
        }

        info!(user = %user, lease_id = %entry.id, "세션 임대");
        Ok(Some(LeasedSession {
            credential: Credential::new(user, token),
            leased_at_ms: Self::entry_timestamp_ms(&entry.id),
            lease_id: entry.id,
        }))
    }

    async fn reclaim(&self, leased: &LeasedSession) -> Result<()> {
        let mut conn = self.connection.write().await;

        let new_id: String = conn
            .xadd(
                &self.stream_key,
                "*",
                &[
                    ("user", leased.credential.user.as_str()),
                    ("token", leased.credential.token.as_str()),
                ],
            )
            .await?;

        info!(user = %leased.credential.user, lease_id = %new_id, "세션 반납");
        if leased.leased_at_ms > 0 {
            let held_ms = Self::entry_timestamp_ms(&new_id) - leased.leased_at_ms;
            if held_ms > 0 {
                debug!(user = %leased.credential.user, held_ms = held_ms, "임대 유지 시간");
            }
        } else {
            warn!(user = %leased.credential.user, "임대 타임스탬프 없음");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_timestamp_parse() {
        assert_eq!(
            RedisSessionPool::entry_timestamp_ms("1728187084376-1"),
            1_728_187_084_376
        );
        assert_eq!(RedisSessionPool::entry_timestamp_ms("garbage"), 0);
    }
}
