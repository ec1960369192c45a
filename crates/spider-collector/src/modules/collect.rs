//! (심볼, 타임프레임) 쌍 하나의 수집 사이클.

use crate::modules::backfill;
use crate::{CollectorConfig, CycleStats, Result};
use chrono::Utc;
use spider_core::{Candle, CandleStat, Instrument, Period};
use spider_data::{CandleStore, CoverageStore, SessionPool};
use spider_exchange::{ExchangeSession, ProtocolClient, RangeResult};
use std::time::Instant;
use tracing::{info, warn};

/// 한 쌍에 대해 사이클 하나를 실행합니다.
///
/// 세션 임대 → 구간 계획 → 조회(재시도 정책 적용) → 멱등 병합 →
/// coverage 갱신 → 세션 반납. 조회 실패는 빈 구간으로 강등되지만
/// 저장소 실패는 그대로 전파되며, 병합이 멱등이므로 다음 주기에
/// 사이클을 통째로 다시 돌려도 안전합니다.
pub async fn collect_pair(
    candle_store: &CandleStore,
    coverage_store: &CoverageStore,
    session_pool: &dyn SessionPool,
    config: &CollectorConfig,
    symbol: &str,
    period: Period,
) -> Result<CycleStats> {
    let start = Instant::now();
    let mut stats = CycleStats::new();
    stats.total = 1;

    let instrument = Instrument::resolve(symbol)?;
    let timeframe_id = period.timeframe_id();

    // 1. coverage 레코드 확보 (없으면 오늘 날짜로 시드)
    let today = Utc::now().date_naive();
    let ct = match coverage_store.get(instrument.symbol_id, timeframe_id).await? {
        Some(ct) => ct,
        None => {
            let seed = CandleStat::seed(
                instrument.symbol_id,
                timeframe_id,
                symbol,
                period.minutes(),
                today,
            );
            coverage_store.insert(&seed).await?;
            seed
        }
    };

    // 2. 세션 임대 (풀이 비어 있으면 이번 사이클은 건너뛴다)
    let Some(leased) = session_pool
        .lease_with_timeout(config.cycle.lease_timeout())
        .await?
    else {
        warn!(symbol = symbol, period = %period, "세션 없음, 사이클 건너뜀");
        stats.skipped = 1;
        stats.elapsed = start.elapsed();
        return Ok(stats);
    };

    let client = ProtocolClient::new(&config.exchange.endpoint)
        .with_command_timeout(config.exchange.command_timeout());
    let mut session = ExchangeSession::new(leased.credential.clone(), client);

    if let Err(e) = session.login().await {
        warn!(user = %session.user(), error = %e, "로그인 실패");
        session_pool.reclaim(&leased).await?;
        stats.errors = 1;
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    // 3. 구간 계획 + 조회 (§ 재시도 정책은 세션이 처리)
    let now = Utc::now();
    let present_window = backfill::present_window(now);
    let present = session
        .fetch_range_or_empty(
            symbol,
            period.minutes(),
            present_window.start,
            present_window.end,
            present_window.ticks,
        )
        .await;

    let historical = match backfill::historical_window(&ct, today) {
        Some(window) => {
            session
                .fetch_range_or_empty(
                    symbol,
                    period.minutes(),
                    window.start,
                    window.end,
                    window.ticks,
                )
                .await
        }
        None => RangeResult::empty(),
    };

    stats.bars_fetched = present.rate_infos.len() + historical.rate_infos.len();

    // 4. 저장 단계. 실패해도 세션은 반드시 반납한다.
    let persisted = persist_cycle(
        candle_store,
        coverage_store,
        &instrument,
        timeframe_id,
        &ct,
        &present,
        &historical,
    )
    .await;

    session.logout().await;
    session_pool.reclaim(&leased).await?;

    match persisted? {
        Some(inserted) => {
            stats.success = 1;
            stats.bars_inserted = inserted as usize;
        }
        None => {
            stats.empty = 1;
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 병합 + coverage 갱신. 양쪽 구간이 모두 비었으면 쓰기 없이 끝납니다.
async fn persist_cycle(
    candle_store: &CandleStore,
    coverage_store: &CoverageStore,
    instrument: &Instrument,
    timeframe_id: i32,
    ct: &CandleStat,
    present: &RangeResult,
    historical: &RangeResult,
) -> Result<Option<u64>> {
    if present.is_empty() && historical.is_empty() {
        info!(symbol = %instrument.symbol, "새 캔들 없음, 쓰기 생략");
        return Ok(None);
    }

    let candles: Vec<Candle> = present
        .rate_infos
        .iter()
        .chain(historical.rate_infos.iter())
        .cloned()
        .map(|r| r.into_candle(instrument.symbol_id, timeframe_id))
        .collect();

    let inserted = candle_store.insert_candles(&candles).await?;

    let updated = backfill::apply_cycle(ct, present, historical);
    coverage_store.upsert(&updated).await?;

    info!(
        symbol = %instrument.symbol,
        timeframe_id = timeframe_id,
        fetched = candles.len(),
        inserted = inserted,
        date_from = %updated.date_from,
        date_until = %updated.date_until,
        "사이클 완료"
    );

    Ok(Some(inserted))
}
