//! 수집 대상 심볼 카탈로그.
//!
//! 심볼 ID는 기존 candles 테이블의 복합 키에 들어가므로
//! 한 번 배정된 값은 바꾸지 않습니다.

use crate::error::SpiderError;
use crate::types::Period;
use serde::{Deserialize, Serialize};

/// 수집 대상 상품 식별자.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// 거래소 심볼 (예: "GOLD", "EURUSD")
    pub symbol: String,
    /// 저장소 키로 사용하는 심볼 ID
    pub symbol_id: i32,
}

impl Instrument {
    /// 카탈로그에서 심볼을 찾아 Instrument를 생성합니다.
    pub fn resolve(symbol: &str) -> Result<Self, SpiderError> {
        Ok(Self {
            symbol: symbol.to_string(),
            symbol_id: symbol_id(symbol)?,
        })
    }
}

/// 심볼에 배정된 저장소 ID를 반환합니다.
pub fn symbol_id(symbol: &str) -> Result<i32, SpiderError> {
    match symbol {
        "GOLD" => Ok(1),
        "GOLD.FUT" => Ok(2),
        "BITCOIN" => Ok(3),
        "EURUSD" => Ok(4),
        "OIL.WTI" => Ok(5),
        "USDJPY" => Ok(6),
        _ => Err(SpiderError::UnknownSymbol(symbol.to_string())),
    }
}

/// 기본 수집 스케줄에 포함되는 (심볼, 타임프레임) 쌍.
pub fn default_pairs() -> &'static [(&'static str, Period)] {
    &[
        ("GOLD", Period::M5),
        ("GOLD", Period::M15),
        ("GOLD", Period::M30),
        ("GOLD", Period::H1),
        ("GOLD", Period::H4),
        ("GOLD.FUT", Period::M15),
        ("GOLD.FUT", Period::M30),
        ("GOLD.FUT", Period::H1),
        ("OIL.WTI", Period::M15),
        ("OIL.WTI", Period::M30),
        ("OIL.WTI", Period::H1),
        ("USDJPY", Period::M15),
        ("USDJPY", Period::M30),
        ("USDJPY", Period::H1),
        ("EURUSD", Period::M15),
        ("EURUSD", Period::M30),
        ("EURUSD", Period::H1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbols() {
        assert_eq!(symbol_id("GOLD").unwrap(), 1);
        assert_eq!(symbol_id("USDJPY").unwrap(), 6);
        assert!(symbol_id("TSLA").is_err());
    }

    #[test]
    fn test_default_pairs_resolve() {
        for (symbol, _) in default_pairs() {
            assert!(Instrument::resolve(symbol).is_ok());
        }
    }
}
