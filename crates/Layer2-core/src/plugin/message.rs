//! Plugin Message - 플러그인으로 라우팅되는 수신 메시지

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 외부 프로토콜 계층에서 들어오는 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMessage {
    /// 메시지 ID
    pub id: String,

    /// 메시지 타입 (플러그인 기능 판별에 사용)
    pub message_type: String,

    /// 본문
    pub payload: Value,

    /// 발신자
    pub source: Option<String>,

    /// 수신 시각
    pub timestamp: DateTime<Utc>,
}

impl PluginMessage {
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_type: message_type.into(),
            payload,
            source: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 본문을 문자열로 (문자열 payload가 아니면 JSON 직렬화)
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
