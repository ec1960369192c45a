//! Standalone candle collector CLI.

use clap::{Parser, Subcommand};
use spider_collector::{modules, CollectorConfig, CycleStats};
use spider_core::{default_pairs, init_logging, LogFormat, Period};
use spider_data::{CandleStore, CoverageStore, RedisSessionPool, SessionPool};

#[derive(Parser)]
#[command(name = "spider-collector")]
#[command(about = "CandleSpider Standalone Candle Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// 세션 풀을 SPIDER_ACCOUNTS 계정으로 다시 시드
    InitPool,

    /// 단일 (심볼, 타임프레임) 쌍 수집
    Collect {
        /// 거래소 심볼 (예: "GOLD")
        #[arg(long)]
        symbol: String,

        /// 타임프레임 (분 단위, 예: 30)
        #[arg(long)]
        period: i32,
    },

    /// 기본 스케줄의 모든 쌍을 한 바퀴 수집
    RunAll,

    /// 데몬 모드: 주기적으로 전체 스케줄 실행
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(
        &format!("spider_collector={}", cli.log_level),
        cli.log_format,
    )?;

    tracing::info!("CandleSpider Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(database_url = %config.database_url, "설정 로드 완료");

    // 세션 풀 연결
    let session_pool = RedisSessionPool::connect(&config.redis_url).await?;

    if let Commands::InitPool = cli.command {
        modules::init_pool(&session_pool, &config).await?;
        return Ok(());
    }

    // DB 연결
    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    tracing::info!("데이터베이스 연결 성공");

    let candle_store = CandleStore::new(pool.clone());
    let coverage_store = CoverageStore::new(pool.clone());

    match cli.command {
        // 위에서 처리됨
        Commands::InitPool => {}
        Commands::Collect { symbol, period } => {
            let period = Period::from_minutes(period)?;
            let stats = modules::collect_pair(
                &candle_store,
                &coverage_store,
                &session_pool,
                &config,
                &symbol,
                period,
            )
            .await?;
            stats.log_summary("캔들 수집");
        }
        Commands::RunAll => {
            let stats =
                run_schedule(&candle_store, &coverage_store, &session_pool, &config).await?;
            stats.log_summary("전체 스케줄");
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        match run_schedule(&candle_store, &coverage_store, &session_pool, &config)
                            .await
                        {
                            Ok(stats) => stats.log_summary("전체 스케줄"),
                            Err(e) => tracing::error!("스케줄 실행 실패: {}", e),
                        }
                        tracing::info!(
                            "=== 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    pool.close().await;
    tracing::info!("CandleSpider Collector 종료");

    Ok(())
}

/// 기본 스케줄의 모든 쌍을 순서대로 수집합니다.
///
/// 풀의 세션 수가 제한되어 있으므로 쌍 단위로 순차 실행합니다. 쌍 하나의
/// 저장소 오류는 기록하고 다음 쌍으로 넘어갑니다.
async fn run_schedule(
    candle_store: &CandleStore,
    coverage_store: &CoverageStore,
    session_pool: &dyn SessionPool,
    config: &CollectorConfig,
) -> spider_collector::Result<CycleStats> {
    let mut total = CycleStats::new();

    for (symbol, period) in default_pairs() {
        match modules::collect_pair(
            candle_store,
            coverage_store,
            session_pool,
            config,
            symbol,
            *period,
        )
        .await
        {
            Ok(stats) => total.merge(&stats),
            Err(e) => {
                tracing::error!(symbol = symbol, period = %period, "쌍 수집 실패: {}", e);
                total.total += 1;
                total.errors += 1;
            }
        }
    }

    Ok(total)
}
