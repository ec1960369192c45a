//! 인증된 거래소 세션.
//!
//! 풀에서 임대한 자격증명 하나와 연결 하나를 묶습니다. 연결은 로그인마다
//! 새로 열리며 임대 간에 공유되지 않습니다.

use crate::error::{ExchangeError, ExchangeResult};
use crate::protocol::CommandChannel;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use spider_core::{candle_id, Candle, Credential};
use tracing::{info, warn};

/// 세션 연결 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 로그인 전 또는 로그아웃/실패 후
    Unauthenticated,
    /// login 명령 성공 후
    Authenticated,
}

/// 차트 범위 응답의 캔들 한 건.
#[derive(Debug, Clone, Deserialize)]
pub struct RateInfo {
    /// 버킷 시작 시각 (epoch 밀리초)
    pub ctm: i64,
    /// 사람이 읽는 시각 표현
    #[serde(rename = "ctmString", default)]
    pub ctm_string: String,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub vol: Decimal,
}

impl RateInfo {
    /// 저장용 캔들 레코드로 변환합니다.
    pub fn into_candle(self, symbol_id: i32, timeframe_id: i32) -> Candle {
        Candle {
            id: candle_id(symbol_id, timeframe_id, self.ctm),
            symbol_id,
            timeframe_id,
            ctm: self.ctm,
            ctm_string: self.ctm_string,
            open: self.open,
            close: self.close,
            high: self.high,
            low: self.low,
            vol: self.vol,
        }
    }
}

/// getChartRangeRequest의 returnData.
#[derive(Debug, Deserialize)]
struct ChartRangeData {
    digits: i32,
    #[serde(rename = "rateInfos", default)]
    rate_infos: Vec<RateInfo>,
}

/// 한 번의 차트 범위 조회 결과.
#[derive(Debug, Default)]
pub struct RangeResult {
    /// 응답에 포함된 캔들들 (정렬 보장 없음)
    pub rate_infos: Vec<RateInfo>,
    /// 이 상품의 가격 소수 자릿수 지수
    pub digits: i32,
}

impl RangeResult {
    /// 빈 결과. "이번 사이클에는 데이터 없음"을 의미하며 에러가 아닙니다.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rate_infos.is_empty()
    }
}

/// 자격증명 하나로 인증된 명령 표면을 제공하는 세션.
pub struct ExchangeSession<C: CommandChannel> {
    credential: Credential,
    channel: C,
    state: ConnectionState,
}

impl<C: CommandChannel> ExchangeSession<C> {
    /// 임대한 자격증명과 명령 채널로 세션을 만듭니다.
    pub fn new(credential: Credential, channel: C) -> Self {
        Self {
            credential,
            channel,
            state: ConnectionState::Unauthenticated,
        }
    }

    /// 이 세션이 사용하는 사용자 ID.
    pub fn user(&self) -> &str {
        &self.credential.user
    }

    /// 현재 연결 상태.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 연결을 열고 login 명령을 보냅니다.
    ///
    /// 실패하면 상태는 Unauthenticated로 남습니다.
    pub async fn login(&mut self) -> ExchangeResult<()> {
        self.state = ConnectionState::Unauthenticated;
        self.channel.connect().await?;

        let arguments = json!({
            "userId": self.credential.user,
            "password": self.credential.token,
        });
        self.channel.send_command("login", Some(arguments)).await?;

        self.state = ConnectionState::Authenticated;
        info!(user = %self.credential.user, "logged in");
        Ok(())
    }

    /// logout 명령을 보냅니다 (best-effort).
    ///
    /// 명령이 실패해도 상태는 Unauthenticated가 되고 연결은 닫힙니다.
    pub async fn logout(&mut self) {
        if self.channel.is_connected() {
            if let Err(e) = self.channel.send_command("logout", None).await {
                warn!(user = %self.credential.user, error = %e, "logout failed");
            }
        }
        self.channel.close().await;
        self.state = ConnectionState::Unauthenticated;
    }

    /// 차트 범위 조회 명령을 보냅니다.
    ///
    /// `start`/`end`는 epoch 초 단위로 받고 거래소 규약대로 밀리초로
    /// 변환해 보냅니다. `ticks`가 음수면 해당 시점에서 끝나는 최근 N개를
    /// 요청하는 의미이며 그대로 전달합니다.
    pub async fn fetch_range(
        &mut self,
        symbol: &str,
        period: i32,
        start: i64,
        end: i64,
        ticks: i32,
    ) -> ExchangeResult<RangeResult> {
        let arguments = json!({
            "info": {
                "symbol": symbol,
                "period": period,
                "start": start * 1000,
                "end": end * 1000,
                "ticks": ticks,
            }
        });

        let return_data = self
            .channel
            .send_command("getChartRangeRequest", Some(arguments))
            .await?
            .ok_or_else(|| ExchangeError::Parse("missing returnData".to_string()))?;

        let data: ChartRangeData = serde_json::from_value(return_data)?;
        Ok(RangeResult {
            rate_infos: data.rate_infos,
            digits: data.digits,
        })
    }

    /// 재시도 정책이 적용된 차트 범위 조회.
    ///
    /// 명령 거부나 전송 실패 시 정확히 한 번 재로그인하고 같은 요청을
    /// 한 번 다시 보냅니다. 그래도 실패하면 빈 결과로 강등합니다.
    /// 수집기는 고정 주기로 돌기 때문에 빈 결과는 "이번 사이클에는
    /// 데이터 없음"으로 처리하고 다음 주기에 자연히 재시도됩니다.
    pub async fn fetch_range_or_empty(
        &mut self,
        symbol: &str,
        period: i32,
        start: i64,
        end: i64,
        ticks: i32,
    ) -> RangeResult {
        let first = match self.fetch_range(symbol, period, start, end, ticks).await {
            Ok(result) => return result,
            Err(e) => e,
        };

        if !first.is_retryable() {
            warn!(symbol = symbol, period = period, error = %first, "fetch failed, not retryable");
            return RangeResult::empty();
        }

        warn!(symbol = symbol, period = period, error = %first, "fetch failed, relogin and retry");
        if let Err(e) = self.login().await {
            warn!(user = %self.credential.user, error = %e, "relogin failed");
            return RangeResult::empty();
        }

        match self.fetch_range(symbol, period, start, end, ticks).await {
            Ok(result) => result,
            Err(e) => {
                warn!(symbol = symbol, period = period, error = %e, "retry failed, empty cycle");
                RangeResult::empty()
            }
        }
    }
}
