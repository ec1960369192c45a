//! (심볼, 타임프레임) 쌍별 수집 범위 레코드.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 한 (symbol, timeframe) 쌍에 대해 지금까지 수집된 날짜 범위.
///
/// `date_from <= date_until` 불변식이 유지됩니다. `digits`는 거래소가
/// 보고하는 가격 소수 자릿수 지수로, 매 사이클 마지막 응답 값으로
/// 갱신됩니다(last-writer-wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleStat {
    /// 심볼 ID
    pub symbol_id: i32,
    /// 타임프레임 ID
    pub timeframe_id: i32,
    /// 거래소 심볼
    pub symbol: String,
    /// 타임프레임 (분 단위)
    pub period: i32,
    /// 수집된 범위의 시작일 (포함)
    pub date_from: NaiveDate,
    /// 수집된 범위의 종료일 (포함)
    pub date_until: NaiveDate,
    /// 가격 소수 자릿수 지수
    pub digits: i32,
}

impl CandleStat {
    /// 첫 수집 사이클용 시드 레코드를 생성합니다.
    ///
    /// 양 끝을 오늘 날짜로 두면 과거 방향 백필이 오늘부터 시작됩니다.
    pub fn seed(
        symbol_id: i32,
        timeframe_id: i32,
        symbol: impl Into<String>,
        period: i32,
        today: NaiveDate,
    ) -> Self {
        Self {
            symbol_id,
            timeframe_id,
            symbol: symbol.into(),
            period,
            date_from: today,
            date_until: today,
            digits: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_bounds_equal_today() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let ct = CandleStat::seed(1, 4, "GOLD", 60, today);
        assert_eq!(ct.date_from, today);
        assert_eq!(ct.date_until, today);
        assert_eq!(ct.digits, 0);
    }
}
