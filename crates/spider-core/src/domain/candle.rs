//! 캔들(OHLCV) 레코드.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 저장소의 캔들 복합 키를 유도합니다.
///
/// 기존 candles 테이블과의 호환을 위해 유지하는 산술 인코딩입니다.
/// `ctm` 값이 겹치는 다른 (symbol, timeframe) 쌍과 충돌할 수 있으므로
/// 새 저장소를 설계할 때는 튜플 키를 쓰는 것이 안전합니다.
pub fn candle_id(symbol_id: i32, timeframe_id: i32, ctm: i64) -> i64 {
    symbol_id as i64 * 10 + timeframe_id as i64 + ctm
}

/// 하나의 OHLCV 캔들.
///
/// 가격 필드는 거래소가 내려주는 원시 정수 스케일 그대로 저장하며,
/// 실제 가격으로 환산하려면 coverage 레코드의 `digits`를 적용해야 합니다.
/// 닫힌 캔들의 가격은 변하지 않으므로 저장 후에는 불변입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 복합 키 (`candle_id` 참조)
    pub id: i64,
    /// 심볼 ID
    pub symbol_id: i32,
    /// 타임프레임 ID
    pub timeframe_id: i32,
    /// 버킷 시작 시각 (epoch 밀리초)
    pub ctm: i64,
    /// 거래소가 내려주는 사람이 읽는 시각 표현
    pub ctm_string: String,
    /// 시가
    pub open: Decimal,
    /// 종가 (시가 대비 델타)
    pub close: Decimal,
    /// 고가 (시가 대비 델타)
    pub high: Decimal,
    /// 저가 (시가 대비 델타)
    pub low: Decimal,
    /// 거래량
    pub vol: Decimal,
}

impl Candle {
    /// 버킷 시작 시각을 UTC DateTime으로 반환합니다.
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ctm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_id_derivation() {
        // symbol_id=1, timeframe_id=4, ctm=1700000000000
        assert_eq!(candle_id(1, 4, 1_700_000_000_000), 1_700_000_000_014);
    }

    #[test]
    fn test_candle_id_is_deterministic() {
        assert_eq!(candle_id(6, 2, 42), candle_id(6, 2, 42));
    }

    #[test]
    fn test_open_time() {
        let candle = Candle {
            id: 0,
            symbol_id: 1,
            timeframe_id: 4,
            ctm: 1_704_067_200_000, // 2024-01-01T00:00:00Z
            ctm_string: "Jan 1, 2024, 12:00:00 AM".to_string(),
            open: Decimal::new(20000, 0),
            close: Decimal::new(15, 0),
            high: Decimal::new(30, 0),
            low: Decimal::new(-10, 0),
            vol: Decimal::new(100, 0),
        };
        assert_eq!(
            candle.open_time().unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }
}
