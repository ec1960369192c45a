//! 거래소 명령 프로토콜 클라이언트.
//!
//! 지속 WebSocket 연결 하나 위에서 `{"command": .., "arguments": ..}` 형태의
//! JSON 명령을 보내고 같은 연결에서 응답 한 건을 기다립니다. 멀티플렉싱은
//! 없으며 요청/응답은 전송 순서로 대응됩니다.
//!
//! 전송 계층이 실패하면 연결을 버리고 연결 없음 상태로 돌아갑니다.
//! 재연결은 이 계층의 책임이 아니라 세션([`crate::session`])의 몫입니다.

use crate::error::{ExchangeError, ExchangeResult};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

/// 기본 명령 응답 대기 시간.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// 요청 메시지.
#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<&'a Value>,
}

/// 응답 메시지.
#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    /// 명령 수락 여부
    pub status: bool,
    /// 거부 시 에러 코드
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
    /// 거부 시 에러 설명
    #[serde(rename = "errorDescr")]
    pub error_descr: Option<String>,
    /// 수락 시 응답 본문
    #[serde(rename = "returnData")]
    pub return_data: Option<Value>,
}

/// 명령 채널 추상화.
///
/// 세션이 프로토콜 클라이언트에 의존하는 지점을 trait으로 분리해
/// 테스트에서 스크립트된 채널로 대체할 수 있게 합니다.
#[async_trait]
pub trait CommandChannel: Send {
    /// 지속 연결을 엽니다. 이미 열려 있으면 기존 연결을 버리고 다시 엽니다.
    async fn connect(&mut self) -> ExchangeResult<()>;

    /// 명령 하나를 보내고 대응하는 응답의 `returnData`를 반환합니다.
    async fn send_command(
        &mut self,
        command: &str,
        arguments: Option<Value>,
    ) -> ExchangeResult<Option<Value>>;

    /// 연결 여부.
    fn is_connected(&self) -> bool;

    /// 연결을 닫습니다 (best-effort).
    async fn close(&mut self);
}

/// WebSocket 기반 프로토콜 클라이언트.
pub struct ProtocolClient {
    endpoint: String,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    command_timeout: Duration,
}

impl ProtocolClient {
    /// 새 클라이언트를 생성합니다. 연결은 [`CommandChannel::connect`]에서 엽니다.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ws: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// 명령 응답 대기 시간을 설정합니다.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// 한 번의 송신/수신 왕복. 실패 시 호출자가 연결을 버려야 합니다.
    async fn round_trip(
        ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
        payload: String,
        timeout: Duration,
    ) -> ExchangeResult<String> {
        ws.send(Message::Text(payload.into()))
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        loop {
            let received = tokio::time::timeout(timeout, ws.next())
                .await
                .map_err(|_| ExchangeError::Timeout(timeout.as_millis() as u64))?;

            match received {
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                // Ping/Pong은 응답으로 치지 않고 계속 기다린다
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) => {
                    return Err(ExchangeError::Transport("closed by server".to_string()))
                }
                Some(Ok(other)) => {
                    return Err(ExchangeError::Parse(format!(
                        "unexpected message type: {:?}",
                        other
                    )))
                }
                Some(Err(e)) => return Err(ExchangeError::Transport(e.to_string())),
                None => return Err(ExchangeError::Transport("stream ended".to_string())),
            }
        }
    }
}

#[async_trait]
impl CommandChannel for ProtocolClient {
    async fn connect(&mut self) -> ExchangeResult<()> {
        if self.ws.is_some() {
            warn!(endpoint = %self.endpoint, "reconnecting, dropping previous connection");
            self.close().await;
        }

        info!(endpoint = %self.endpoint, "connecting to exchange");
        let (ws, _) = connect_async(&self.endpoint)
            .await
            .map_err(|e| ExchangeError::Connection(e.to_string()))?;
        self.ws = Some(ws);
        info!(endpoint = %self.endpoint, "connected");

        Ok(())
    }

    async fn send_command(
        &mut self,
        command: &str,
        arguments: Option<Value>,
    ) -> ExchangeResult<Option<Value>> {
        let ws = self.ws.as_mut().ok_or(ExchangeError::NotConnected)?;

        let request = CommandRequest {
            command,
            arguments: arguments.as_ref(),
        };
        let payload = serde_json::to_string(&request)?;
        debug!(command = command, payload = %payload, "sending command");

        let raw = match Self::round_trip(ws, payload, self.command_timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                // 전송이 깨졌으면 이 연결은 더 쓸 수 없다
                warn!(command = command, error = %e, "command transport failed");
                self.ws = None;
                return Err(e);
            }
        };
        debug!(command = command, response = %raw, "received response");

        let response: CommandResponse = serde_json::from_str(&raw)?;
        if !response.status {
            let code = response.error_code.unwrap_or_default();
            let description = response.error_descr.unwrap_or_default();
            info!(command = command, code = %code, "command rejected");
            return Err(ExchangeError::CommandFailed { code, description });
        }

        info!(command = command, "command ok");
        Ok(response.return_data)
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }

    async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            let _ = ws.close(None).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape_without_arguments() {
        let request = CommandRequest {
            command: "logout",
            arguments: None,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"command":"logout"}"#
        );
    }

    #[test]
    fn test_request_shape_with_arguments() {
        let args = json!({"userId": "12345678", "password": "s3cr3t"});
        let request = CommandRequest {
            command: "login",
            arguments: Some(&args),
        };
        let value: Value = serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(value["command"], "login");
        assert_eq!(value["arguments"]["userId"], "12345678");
    }

    #[test]
    fn test_response_parse_rejection() {
        let raw = r#"{"status": false, "errorCode": "BE005", "errorDescr": "Invalid login"}"#;
        let response: CommandResponse = serde_json::from_str(raw).unwrap();
        assert!(!response.status);
        assert_eq!(response.error_code.as_deref(), Some("BE005"));
        assert!(response.return_data.is_none());
    }

    #[test]
    fn test_response_parse_success() {
        let raw = r#"{"status": true, "returnData": {"digits": 2, "rateInfos": []}}"#;
        let response: CommandResponse = serde_json::from_str(raw).unwrap();
        assert!(response.status);
        assert_eq!(response.return_data.unwrap()["digits"], 2);
    }
}
