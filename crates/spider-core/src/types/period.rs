//! 캔들스틱 데이터를 위한 타임프레임 정의.
//!
//! 거래소 API는 분 단위 정수(period)를 받고, 저장소는 0부터 시작하는
//! timeframe_id를 키로 사용합니다. 이 모듈이 두 표현을 잇습니다.

use crate::error::SpiderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 캔들스틱 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// 1분봉
    M1,
    /// 5분봉
    M5,
    /// 15분봉
    M15,
    /// 30분봉
    M30,
    /// 1시간봉
    H1,
    /// 4시간봉
    H4,
    /// 일봉
    D1,
    /// 주봉
    W1,
    /// 월봉 (30일 근사)
    MN1,
}

impl Period {
    /// 이 타임프레임의 분 단위 값을 반환합니다.
    ///
    /// 거래소의 getChartRangeRequest `period` 인자와 동일한 값입니다.
    pub fn minutes(&self) -> i32 {
        match self {
            Period::M1 => 1,
            Period::M5 => 5,
            Period::M15 => 15,
            Period::M30 => 30,
            Period::H1 => 60,
            Period::H4 => 240,
            Period::D1 => 1440,
            Period::W1 => 10080,
            Period::MN1 => 43200,
        }
    }

    /// 저장소 키로 사용하는 타임프레임 ID를 반환합니다.
    pub fn timeframe_id(&self) -> i32 {
        match self {
            Period::M1 => 0,
            Period::M5 => 1,
            Period::M15 => 2,
            Period::M30 => 3,
            Period::H1 => 4,
            Period::H4 => 5,
            Period::D1 => 6,
            Period::W1 => 7,
            Period::MN1 => 8,
        }
    }

    /// 분 단위 값에서 타임프레임을 파싱합니다.
    pub fn from_minutes(minutes: i32) -> Result<Self, SpiderError> {
        match minutes {
            1 => Ok(Period::M1),
            5 => Ok(Period::M5),
            15 => Ok(Period::M15),
            30 => Ok(Period::M30),
            60 => Ok(Period::H1),
            240 => Ok(Period::H4),
            1440 => Ok(Period::D1),
            10080 => Ok(Period::W1),
            43200 => Ok(Period::MN1),
            _ => Err(SpiderError::UnknownPeriod(minutes)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_round_trip() {
        for period in [
            Period::M1,
            Period::M5,
            Period::M15,
            Period::M30,
            Period::H1,
            Period::H4,
            Period::D1,
            Period::W1,
            Period::MN1,
        ] {
            assert_eq!(Period::from_minutes(period.minutes()).unwrap(), period);
        }
    }

    #[test]
    fn test_timeframe_ids_are_dense() {
        let ids: Vec<i32> = [
            Period::M1,
            Period::M5,
            Period::M15,
            Period::M30,
            Period::H1,
            Period::H4,
            Period::D1,
            Period::W1,
            Period::MN1,
        ]
        .iter()
        .map(|p| p.timeframe_id())
        .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_unknown_minutes_rejected() {
        assert!(Period::from_minutes(7).is_err());
    }
}
