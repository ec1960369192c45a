//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 사이클 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleStats {
    /// 총 사이클 수
    pub total: usize,
    /// 성공한 사이클 수
    pub success: usize,
    /// 에러로 끝난 사이클 수
    pub errors: usize,
    /// 세션을 얻지 못해 건너뛴 사이클 수
    pub skipped: usize,
    /// 양쪽 구간 모두 빈 사이클 수
    pub empty: usize,
    /// 거래소에서 받은 총 캔들 수
    pub bars_fetched: usize,
    /// 실제로 삽입된 캔들 수 (중복 제외)
    pub bars_inserted: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 다른 사이클의 통계를 합산
    pub fn merge(&mut self, other: &CycleStats) {
        self.total += other.total;
        self.success += other.success;
        self.errors += other.errors;
        self.skipped += other.skipped;
        self.empty += other.empty;
        self.bars_fetched += other.bars_fetched;
        self.bars_inserted += other.bars_inserted;
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            bars_fetched = self.bars_fetched,
            bars_inserted = self.bars_inserted,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let mut total = CycleStats::new();
        let mut one = CycleStats::new();
        one.total = 1;
        one.success = 1;
        one.bars_inserted = 42;

        total.merge(&one);
        total.merge(&one);
        assert_eq!(total.total, 2);
        assert_eq!(total.bars_inserted, 84);
    }
}
