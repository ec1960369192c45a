//! 수집 범위(coverage) 저장소.
//!
//! candles_stat 테이블 스키마:
//!
//! ```sql
//! CREATE TABLE candles_stat (
//!     id           SERIAL PRIMARY KEY,
//!     symbol_id    INTEGER,
//!     timeframe_id INTEGER,
//!     symbol       TEXT,
//!     period       INTEGER,
//!     date_from    DATE,
//!     date_until   DATE,
//!     digits       INTEGER,
//!     UNIQUE (symbol_id, timeframe_id)
//! );
//! ```

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use spider_core::CandleStat;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, info};

/// coverage 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct CandleStatRecord {
    pub symbol_id: i32,
    pub timeframe_id: i32,
    pub symbol: String,
    pub period: i32,
    pub date_from: NaiveDate,
    pub date_until: NaiveDate,
    pub digits: i32,
}

impl CandleStatRecord {
    pub fn into_stat(self) -> CandleStat {
        CandleStat {
            symbol_id: self.symbol_id,
            timeframe_id: self.timeframe_id,
            symbol: self.symbol,
            period: self.period,
            date_from: self.date_from,
            date_until: self.date_until,
            digits: self.digits,
        }
    }
}

/// coverage 저장소 서비스.
#[derive(Clone)]
pub struct CoverageStore {
    pool: PgPool,
}

impl CoverageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 한 (symbol, timeframe) 쌍의 coverage 레코드를 조회합니다.
    pub async fn get(&self, symbol_id: i32, timeframe_id: i32) -> Result<Option<CandleStat>> {
        let record: Option<CandleStatRecord> = sqlx::query_as(
            r#"
            SELECT symbol_id, timeframe_id, symbol, period, date_from, date_until, digits
            FROM candles_stat
            WHERE symbol_id = $1 AND timeframe_id = $2
            "#,
        )
        .bind(symbol_id)
        .bind(timeframe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        Ok(record.map(|r| r.into_stat()))
    }

    /// 새 coverage 레코드를 삽입합니다.
    pub async fn insert(&self, ct: &CandleStat) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO candles_stat
                (symbol_id, timeframe_id, symbol, period, date_from, date_until, digits)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(ct.symbol_id)
        .bind(ct.timeframe_id)
        .bind(&ct.symbol)
        .bind(ct.period)
        .bind(ct.date_from)
        .bind(ct.date_until)
        .bind(ct.digits)
        .execute(&self.pool)
        .await
        .map_err(|e| DataError::InsertError(e.to_string()))?;

        info!(
            symbol = %ct.symbol,
            period = ct.period,
            "coverage 레코드 생성"
        );

        Ok(())
    }

    /// 기존 coverage 레코드의 범위/digits를 갱신합니다.
    ///
    /// 갱신된 행 수를 반환합니다. 행이 없으면 0.
    pub async fn update(&self, ct: &CandleStat) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE candles_stat
            SET date_from = $3, date_until = $4, digits = $5
            WHERE symbol_id = $1 AND timeframe_id = $2
            "#,
        )
        .bind(ct.symbol_id)
        .bind(ct.timeframe_id)
        .bind(ct.date_from)
        .bind(ct.date_until)
        .bind(ct.digits)
        .execute(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// update-or-insert. 기존 레코드를 삭제하는 일은 없습니다.
    pub async fn upsert(&self, ct: &CandleStat) -> Result<()> {
        let updated = self.update(ct).await?;
        if updated == 0 {
            self.insert(ct).await?;
        } else {
            debug!(
                symbol = %ct.symbol,
                period = ct.period,
                date_from = %ct.date_from,
                date_until = %ct.date_until,
                "coverage 갱신"
            );
        }
        Ok(())
    }
}
