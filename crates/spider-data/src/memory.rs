//! 인메모리 세션 풀.
//!
//! Redis 없이 단일 프로세스로 돌리는 로컬 실행과 테스트에서 사용합니다.
//! 계약은 [`crate::pool::SessionPool`]과 동일하지만 프로세스 경계를 넘는
//! 배타성은 제공하지 않습니다.

use crate::error::Result;
use crate::pool::{LeasedSession, SessionPool};
use async_trait::async_trait;
use chrono::Utc;
use spider_core::Credential;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// VecDeque 기반 FIFO 풀.
#[derive(Default)]
pub struct MemorySessionPool {
    entries: Mutex<VecDeque<Credential>>,
    lease_seq: AtomicU64,
}

impl MemorySessionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 시드된 풀을 만듭니다.
    pub fn with_credentials(credentials: Vec<Credential>) -> Self {
        Self {
            entries: Mutex::new(credentials.into()),
            lease_seq: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl SessionPool for MemorySessionPool {
    async fn initialize(&self, credentials: &[Credential]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        entries.extend(credentials.iter().cloned());
        Ok(())
    }

    async fn lease(&self) -> Result<Option<LeasedSession>> {
        let mut entries = self.entries.lock().await;
        let Some(credential) = entries.pop_front() else {
            return Ok(None);
        };

        let seq = self.lease_seq.fetch_add(1, Ordering::Relaxed);
        Ok(Some(LeasedSession {
            credential,
            lease_id: format!("mem-{}", seq),
            leased_at_ms: Utc::now().timestamp_millis(),
        }))
    }

    async fn reclaim(&self, leased: &LeasedSession) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.push_back(leased.credential.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn two_accounts() -> Vec<Credential> {
        vec![
            Credential::new("a", "token-a"),
            Credential::new("b", "token-b"),
        ]
    }

    #[tokio::test]
    async fn test_lease_reclaim_round_trip() {
        let pool = MemorySessionPool::with_credentials(vec![Credential::new("a", "token-a")]);

        let leased = pool.lease().await.unwrap().unwrap();
        assert_eq!(leased.credential.user, "a");
        assert!(pool.lease().await.unwrap().is_none());

        pool.reclaim(&leased).await.unwrap();
        let again = pool.lease().await.unwrap().unwrap();
        assert_eq!(again.credential.user, "a");
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let pool = MemorySessionPool::with_credentials(two_accounts());

        let first = pool.lease().await.unwrap().unwrap();
        assert_eq!(first.credential.user, "a");
        pool.reclaim(&first).await.unwrap();

        // 반납은 뒤쪽으로 들어간다
        let second = pool.lease().await.unwrap().unwrap();
        assert_eq!(second.credential.user, "b");
    }

    #[tokio::test]
    async fn test_concurrent_lease_exclusivity() {
        // 두 워커가 동시에 임대하면 서로 다른 자격증명을 받아야 하고,
        // 세 번째 임대는 반납 전까지 아무것도 받지 못한다.
        let pool = Arc::new(MemorySessionPool::with_credentials(two_accounts()));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move {
                pool.lease().await.unwrap().unwrap()
            }));
        }

        let mut users = HashSet::new();
        let mut leases = Vec::new();
        for handle in handles {
            let leased = handle.await.unwrap();
            users.insert(leased.credential.user.clone());
            leases.push(leased);
        }
        assert_eq!(users.len(), 2);

        assert!(pool.lease().await.unwrap().is_none());

        pool.reclaim(&leases[0]).await.unwrap();
        assert!(pool.lease().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_initialize_resets_pool() {
        let pool = MemorySessionPool::with_credentials(two_accounts());
        let _ = pool.lease().await.unwrap().unwrap();

        pool.initialize(&[Credential::new("c", "token-c")])
            .await
            .unwrap();

        let leased = pool.lease().await.unwrap().unwrap();
        assert_eq!(leased.credential.user, "c");
        assert!(pool.lease().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lease_with_timeout_gives_up() {
        let pool = MemorySessionPool::new();
        let leased = pool
            .lease_with_timeout(Duration::from_millis(250))
            .await
            .unwrap();
        assert!(leased.is_none());
    }

    #[tokio::test]
    async fn test_double_reclaim_duplicates_entry() {
        // 중복 반납은 계약상 추가식이라 풀에 같은 자격증명이 두 번 들어간다.
        // 조용히 "고치지" 않고 그대로 두는 것이 계약이다.
        let pool = MemorySessionPool::with_credentials(vec![Credential::new("a", "token-a")]);
        let leased = pool.lease().await.unwrap().unwrap();
        pool.reclaim(&leased).await.unwrap();
        pool.reclaim(&leased).await.unwrap();

        assert!(pool.lease().await.unwrap().is_some());
        assert!(pool.lease().await.unwrap().is_some());
        assert!(pool.lease().await.unwrap().is_none());
    }
}
