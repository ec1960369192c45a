//! 백필 계획과 coverage 갱신 규칙.
//!
//! 매 사이클은 최대 두 구간을 요청합니다:
//!
//! 1. **현재 구간**: 항상 `[now, now]`에 음수 tick으로 "now에서 끝나는
//!    최근 N개"를 요청해 최신 상태를 유지합니다.
//! 2. **과거 구간**: coverage의 `date_from`이 아직 바닥 날짜보다 뒤에
//!    있을 때만 `[date_from, date_from]`에 더 큰 음수 tick으로 요청해
//!    한 사이클에 한 페이지씩 과거로 걸어갑니다.
//!
//! 바닥 날짜에 닿으면 과거 구간 요청이 사라지므로 백필은 자연히
//! 종료됩니다.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use spider_core::CandleStat;
use spider_exchange::RangeResult;

/// 현재 구간의 tick 수 (now에서 끝나는 최근 300개).
pub const PRESENT_TICKS: i32 = -300;

/// 과거 구간의 tick 수 (더 넓은 페이지로 과거를 걷는다).
pub const BACKFILL_TICKS: i32 = -500;

/// 30분봉 데이터의 거래소 제공 시작일. 이보다 앞은 요청하지 않습니다.
const M30_HISTORY_FLOOR: (i32, u32, u32) = (2023, 7, 21);

/// 이보다 앞선 타임스탬프의 캔들은 비정상 데이터로 보고 coverage를
/// 갱신하지 않습니다.
const SANITY_CUTOFF: (i32, u32, u32) = (2020, 7, 1);

/// 요청할 구간의 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// 최신 캔들 구간
    Present,
    /// 과거 방향 백필 구간
    Historical,
}

/// 한 번의 getChartRangeRequest에 해당하는 구간.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchWindow {
    /// 구간 시작 (epoch 초)
    pub start: i64,
    /// 구간 끝 (epoch 초)
    pub end: i64,
    /// tick 수 (음수 = 끝 시점 기준 최근 N개)
    pub ticks: i32,
    pub kind: WindowKind,
}

fn m30_history_floor() -> NaiveDate {
    let (y, m, d) = M30_HISTORY_FLOOR;
    NaiveDate::from_ymd_opt(y, m, d).expect("valid constant date")
}

fn sanity_cutoff() -> NaiveDate {
    let (y, m, d) = SANITY_CUTOFF;
    NaiveDate::from_ymd_opt(y, m, d).expect("valid constant date")
}

/// 이 타임프레임이 거슬러 올라갈 수 있는 바닥 날짜.
///
/// 넓은 타임프레임일수록 더 먼 과거까지 의미가 있으므로 바닥은
/// `today - 12 * 분` 일수로 계산합니다. 30분봉은 거래소 데이터 제공
/// 경계가 있어 그보다 앞으로는 내려가지 않습니다.
pub fn max_backdate(period_minutes: i32, today: NaiveDate) -> NaiveDate {
    let lookback_days = 12u64 * period_minutes.max(0) as u64;
    let floor = today
        .checked_sub_days(Days::new(lookback_days))
        .unwrap_or(today);
    if period_minutes == 30 {
        floor.max(m30_history_floor())
    } else {
        floor
    }
}

/// 항상 요청하는 현재 구간.
pub fn present_window(now: DateTime<Utc>) -> FetchWindow {
    let ts = now.timestamp();
    FetchWindow {
        start: ts,
        end: ts,
        ticks: PRESENT_TICKS,
        kind: WindowKind::Present,
    }
}

/// coverage가 아직 바닥에 닿지 않았을 때의 과거 구간.
///
/// 바닥에 닿았으면(`floor >= date_from`) 이번 사이클에는 과거 구간이
/// 없습니다.
pub fn historical_window(ct: &CandleStat, today: NaiveDate) -> Option<FetchWindow> {
    if max_backdate(ct.period, today) >= ct.date_from {
        return None;
    }

    let ts = ct
        .date_from
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp();
    Some(FetchWindow {
        start: ts,
        end: ts,
        ticks: BACKFILL_TICKS,
        kind: WindowKind::Historical,
    })
}

/// 사이클 결과를 coverage에 반영한 새 레코드를 계산합니다.
///
/// - 과거 구간이 캔들을 돌려줬으면 `date_from`을 가장 이른 캔들
///   다음 날로 내립니다. 단 sanity cutoff 이전 타임스탬프는 비정상
///   데이터로 보고 무시합니다.
/// - 현재 구간이 캔들을 돌려줬으면 `date_until`을 가장 늦은 캔들
///   날짜로 올립니다.
/// - coverage는 앞으로만 좁혀집니다: 이미 더 넓은 범위를 기록한
///   레코드를 역행시키지 않습니다.
pub fn apply_cycle(
    ct: &CandleStat,
    present: &RangeResult,
    historical: &RangeResult,
) -> CandleStat {
    let mut updated = ct.clone();

    if let Some(earliest_ms) = historical.rate_infos.iter().map(|r| r.ctm).min() {
        if let Some(earliest) = DateTime::from_timestamp_millis(earliest_ms) {
            let earliest_date = earliest.date_naive();
            if earliest_date > sanity_cutoff() {
                let candidate = earliest_date
                    .checked_add_days(Days::new(1))
                    .unwrap_or(earliest_date);
                updated.date_from = updated.date_from.min(candidate);
            }
        }
    }

    if let Some(latest_ms) = present.rate_infos.iter().map(|r| r.ctm).max() {
        if let Some(latest) = DateTime::from_timestamp_millis(latest_ms) {
            updated.date_until = updated.date_until.max(latest.date_naive());
        }
    }

    if !present.is_empty() {
        updated.digits = present.digits;
    } else if !historical.is_empty() {
        updated.digits = historical.digits;
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use spider_exchange::RateInfo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stat(date_from: NaiveDate, date_until: NaiveDate, period: i32) -> CandleStat {
        CandleStat {
            symbol_id: 1,
            timeframe_id: 4,
            symbol: "GOLD".to_string(),
            period,
            date_from,
            date_until,
            digits: 0,
        }
    }

    fn range(ctms: &[i64], digits: i32) -> RangeResult {
        RangeResult {
            digits,
            rate_infos: ctms
                .iter()
                .map(|&ctm| RateInfo {
                    ctm,
                    ctm_string: String::new(),
                    open: Decimal::ZERO,
                    close: Decimal::ZERO,
                    high: Decimal::ZERO,
                    low: Decimal::ZERO,
                    vol: Decimal::ZERO,
                })
                .collect(),
        }
    }

    fn millis(y: i32, m: u32, d: u32) -> i64 {
        date(y, m, d)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_m30_floor_is_clamped() {
        // 12 * 30 = 360일 전이 2023-07-21보다 앞이어도 바닥은 경계에 머문다
        let floor = max_backdate(30, date(2024, 6, 1));
        assert_eq!(floor, date(2023, 7, 21));
    }

    #[test]
    fn test_wide_period_floor_is_not_clamped() {
        let floor = max_backdate(60, date(2024, 6, 1));
        assert_eq!(floor, date(2024, 6, 1) - chrono::Duration::days(720));
    }

    #[test]
    fn test_no_window_before_m30_boundary() {
        // coverage가 경계보다 앞서 있으면 과거 구간을 요청하지 않는다
        let ct = stat(date(2023, 7, 10), date(2024, 6, 1), 30);
        assert!(historical_window(&ct, date(2024, 6, 1)).is_none());
    }

    #[test]
    fn test_backfill_terminates_at_floor() {
        let today = date(2024, 6, 1);
        let floor = max_backdate(60, today);
        let ct = stat(floor, today, 60);
        assert!(historical_window(&ct, today).is_none());
    }

    #[test]
    fn test_backfill_requests_date_from_window() {
        let today = date(2024, 1, 20);
        let ct = stat(date(2024, 1, 10), date(2024, 1, 20), 60);
        let window = historical_window(&ct, today).unwrap();

        assert_eq!(window.kind, WindowKind::Historical);
        assert_eq!(window.ticks, BACKFILL_TICKS);
        assert_eq!(window.start, window.end);
        assert_eq!(window.start, millis(2024, 1, 10) / 1000);
    }

    #[test]
    fn test_present_window_is_now_with_recent_ticks() {
        let now = Utc::now();
        let window = present_window(now);
        assert_eq!(window.kind, WindowKind::Present);
        assert_eq!(window.start, now.timestamp());
        assert_eq!(window.ticks, PRESENT_TICKS);
    }

    #[test]
    fn test_apply_cycle_scenario() {
        // coverage {2024-01-10, 2024-01-10}, 현재 구간 2024-01-15,
        // 과거 구간 2024-01-08 → {2024-01-09, 2024-01-15}
        let ct = stat(date(2024, 1, 10), date(2024, 1, 10), 60);
        let present = range(&[millis(2024, 1, 15), millis(2024, 1, 15) + 3_600_000], 2);
        let historical = range(&[millis(2024, 1, 8), millis(2024, 1, 9)], 2);

        let updated = apply_cycle(&ct, &present, &historical);
        assert_eq!(updated.date_from, date(2024, 1, 9));
        assert_eq!(updated.date_until, date(2024, 1, 15));
        assert_eq!(updated.digits, 2);
    }

    #[test]
    fn test_apply_cycle_ignores_bars_before_sanity_cutoff() {
        let ct = stat(date(2024, 1, 10), date(2024, 1, 10), 60);
        let historical = range(&[millis(2019, 1, 1)], 2);

        let updated = apply_cycle(&ct, &RangeResult::empty(), &historical);
        assert_eq!(updated.date_from, date(2024, 1, 10));
    }

    #[test]
    fn test_apply_cycle_is_monotone() {
        // 어떤 응답이 와도 coverage는 역행하지 않는다
        let ct = stat(date(2024, 1, 5), date(2024, 1, 20), 60);
        let present = range(&[millis(2024, 1, 12)], 2);
        let historical = range(&[millis(2024, 1, 10)], 2);

        let updated = apply_cycle(&ct, &present, &historical);
        assert!(updated.date_from <= ct.date_from);
        assert!(updated.date_until >= ct.date_until);
        assert_eq!(updated.date_from, date(2024, 1, 5));
        assert_eq!(updated.date_until, date(2024, 1, 20));
    }

    #[test]
    fn test_apply_cycle_empty_keeps_coverage() {
        let ct = stat(date(2024, 1, 10), date(2024, 1, 12), 60);
        let updated = apply_cycle(&ct, &RangeResult::empty(), &RangeResult::empty());
        assert_eq!(updated, ct);
    }

    #[test]
    fn test_digits_last_writer_wins() {
        let ct = stat(date(2024, 1, 10), date(2024, 1, 10), 60);
        let present = range(&[millis(2024, 1, 15)], 5);
        let updated = apply_cycle(&ct, &present, &RangeResult::empty());
        assert_eq!(updated.digits, 5);
    }
}
