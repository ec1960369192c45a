//! 환경변수 기반 설정 모듈.

use crate::Result;
use secrecy::{ExposeSecret, SecretString};
use spider_core::Credential;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 세션 풀 Redis URL
    pub redis_url: String,
    /// 거래소 연결 설정
    pub exchange: ExchangeConfig,
    /// 수집 사이클 설정
    pub cycle: CycleConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 거래소 연결 설정
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// WebSocket 엔드포인트
    pub endpoint: String,
    /// 풀에 시드할 계정 목록
    pub accounts: Vec<Credential>,
    /// 명령 응답 타임아웃 (밀리초)
    pub command_timeout_ms: u64,
}

/// 수집 사이클 설정
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// 세션 임대 대기 한도 (밀리초)
    pub lease_timeout_ms: u64,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 사이클 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379/0".to_string());

        Ok(Self {
            database_url,
            redis_url,
            exchange: ExchangeConfig {
                endpoint: std::env::var("SPIDER_WS_ENDPOINT")
                    .unwrap_or_else(|_| "wss://ws.xtb.com/real".to_string()),
                accounts: parse_accounts()?,
                command_timeout_ms: env_var_parse("SPIDER_COMMAND_TIMEOUT_MS", 10_000),
            },
            cycle: CycleConfig {
                lease_timeout_ms: env_var_parse("SPIDER_LEASE_TIMEOUT_MS", 5_000),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 15),
            },
        })
    }
}

impl ExchangeConfig {
    /// 명령 응답 타임아웃을 Duration으로 반환
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl CycleConfig {
    /// 임대 대기 한도를 Duration으로 반환
    pub fn lease_timeout(&self) -> Duration {
        Duration::from_millis(self.lease_timeout_ms)
    }
}

impl DaemonConfig {
    /// 사이클 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// `SPIDER_ACCOUNTS` 환경변수에서 계정 목록을 파싱합니다.
///
/// 형식: `user1:token1,user2:token2`. 풀 초기화 전용이며 비어 있어도
/// 됩니다 (풀이 이미 시드되어 있는 경우).
fn parse_accounts() -> Result<Vec<Credential>> {
    let Ok(raw) = std::env::var("SPIDER_ACCOUNTS") else {
        return Ok(Vec::new());
    };
    let raw = SecretString::from(raw);

    let mut accounts = Vec::new();
    for entry in raw.expose_secret().split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((user, token)) = entry.split_once(':') else {
            return Err(crate::error::CollectorError::Config(format!(
                "SPIDER_ACCOUNTS 항목 형식이 잘못되었습니다: {}",
                entry.split(':').next().unwrap_or("")
            )));
        };
        accounts.push(Credential::new(user, token));
    }
    Ok(accounts)
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let cycle = CycleConfig {
            lease_timeout_ms: 5_000,
        };
        assert_eq!(cycle.lease_timeout(), Duration::from_secs(5));

        let daemon = DaemonConfig {
            interval_minutes: 15,
        };
        assert_eq!(daemon.interval(), Duration::from_secs(900));
    }
}
