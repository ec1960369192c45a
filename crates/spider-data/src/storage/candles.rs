//! 캔들 저장소.
//!
//! candles 테이블 스키마:
//!
//! ```sql
//! CREATE TABLE candles (
//!     id           BIGINT PRIMARY KEY,
//!     symbol_id    INTEGER,
//!     timeframe_id INTEGER,
//!     ctm          BIGINT,
//!     ctmstring    TEXT,
//!     open         NUMERIC,
//!     close        NUMERIC,
//!     high         NUMERIC,
//!     low          NUMERIC,
//!     vol          NUMERIC
//! );
//! ```
//!
//! 닫힌 캔들의 가격은 변하지 않으므로 병합은 insert-if-absent입니다.
//! 같은 배치를 두 번 넣어도 두 번째는 0건이 들어가는 멱등 쓰기라서
//! 실패한 사이클을 통째로 재실행해도 안전합니다.

use crate::error::{DataError, Result};
use rust_decimal::Decimal;
use spider_core::Candle;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, info};

/// 캔들 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct CandleRecord {
    pub id: i64,
    pub symbol_id: i32,
    pub timeframe_id: i32,
    pub ctm: i64,
    pub ctmstring: String,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub vol: Decimal,
}

impl CandleRecord {
    /// 도메인 캔들로 변환.
    pub fn into_candle(self) -> Candle {
        Candle {
            id: self.id,
            symbol_id: self.symbol_id,
            timeframe_id: self.timeframe_id,
            ctm: self.ctm,
            ctm_string: self.ctmstring,
            open: self.open,
            close: self.close,
            high: self.high,
            low: self.low,
            vol: self.vol,
        }
    }
}

/// 캔들 저장소 서비스.
#[derive(Clone)]
pub struct CandleStore {
    pool: PgPool,
}

impl CandleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 캔들 배치를 insert-if-absent로 병합합니다.
    ///
    /// 실제로 삽입된 행 수를 반환합니다. 이미 있는 id는 건드리지
    /// 않습니다 (`ON CONFLICT (id) DO NOTHING`).
    pub async fn insert_candles(&self, candles: &[Candle]) -> Result<u64> {
        if candles.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0u64;

        // UNNEST 패턴으로 일괄 삽입
        for chunk in candles.chunks(500) {
            let ids: Vec<i64> = chunk.iter().map(|c| c.id).collect();
            let symbol_ids: Vec<i32> = chunk.iter().map(|c| c.symbol_id).collect();
            let timeframe_ids: Vec<i32> = chunk.iter().map(|c| c.timeframe_id).collect();
            let ctms: Vec<i64> = chunk.iter().map(|c| c.ctm).collect();
            let ctmstrings: Vec<&str> = chunk.iter().map(|c| c.ctm_string.as_str()).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|c| c.open).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|c| c.close).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|c| c.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|c| c.low).collect();
            let vols: Vec<Decimal> = chunk.iter().map(|c| c.vol).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO candles
                    (id, symbol_id, timeframe_id, ctm, ctmstring, open, close, high, low, vol)
                SELECT * FROM UNNEST(
                    $1::bigint[], $2::int[], $3::int[], $4::bigint[], $5::text[],
                    $6::numeric[], $7::numeric[], $8::numeric[], $9::numeric[], $10::numeric[]
                )
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&ids)
            .bind(&symbol_ids)
            .bind(&timeframe_ids)
            .bind(&ctms)
            .bind(&ctmstrings)
            .bind(&opens)
            .bind(&closes)
            .bind(&highs)
            .bind(&lows)
            .bind(&vols)
            .execute(&self.pool)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected();
        }

        info!(
            total = candles.len(),
            inserted = inserted,
            "캔들 병합 완료"
        );

        Ok(inserted)
    }

    /// 한 (symbol, timeframe) 쌍의 캔들을 시간순으로 페이징 조회합니다.
    pub async fn get_candles(
        &self,
        symbol_id: i32,
        timeframe_id: i32,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Candle>> {
        let records: Vec<CandleRecord> = sqlx::query_as(
            r#"
            SELECT id, symbol_id, timeframe_id, ctm, ctmstring, open, close, high, low, vol
            FROM candles
            WHERE symbol_id = $1 AND timeframe_id = $2
            ORDER BY ctm ASC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(symbol_id)
        .bind(timeframe_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        debug!(
            symbol_id = symbol_id,
            timeframe_id = timeframe_id,
            count = records.len(),
            "캔들 조회"
        );

        Ok(records.into_iter().map(|r| r.into_candle()).collect())
    }

    /// 한 쌍의 저장된 캔들 수.
    pub async fn count(&self, symbol_id: i32, timeframe_id: i32) -> Result<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM candles
            WHERE symbol_id = $1 AND timeframe_id = $2
            "#,
        )
        .bind(symbol_id)
        .bind(timeframe_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DataError::QueryError(e.to_string()))?;

        Ok(result.0)
    }
}
