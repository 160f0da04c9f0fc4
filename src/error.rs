use thiserror::Error;

/// Shown alongside quota failures so users can check their allocation.
pub const QUOTA_HELP_URL: &str = "https://platform.openai.com/usage";

/// Everything that can go wrong between the client and the backend, plus
/// the one local failure (required answers missing) that blocks submission.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-OK HTTP status or a network-level request failure.
    #[error("请求失败: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The generation stream reported a semantic failure.
    #[error("生成问卷时出错: {message}")]
    Stream { message: String },

    /// Stream ended without a usable survey (missing payload or zero
    /// questions).
    #[error("未收到完整的问卷数据")]
    EmptyCompletion,

    /// The provider ran out of allocation; carries the raw message.
    #[error("API配额不足: {message}")]
    Quota { message: String },

    /// Required questions left unanswered; `missing` holds their texts.
    #[error("请填写以下必填问题：\n{}", missing.join("\n"))]
    Validation { missing: Vec<String> },
}

impl ClientError {
    /// Classify a backend-reported failure message from the stream.
    pub fn from_stream_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_quota_message(&message) {
            ClientError::Quota { message }
        } else {
            ClientError::Stream { message }
        }
    }

    /// Whether a retry affordance makes sense: network-level transport
    /// failures, or messages that point at connectivity trouble.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { status: None, .. } => true,
            ClientError::Transport { message, .. } | ClientError::Stream { message } => {
                is_connectivity_message(message)
            }
            _ => false,
        }
    }

    /// Link for the quota explanation panel, when applicable.
    pub fn help_url(&self) -> Option<&'static str> {
        match self {
            ClientError::Quota { .. } => Some(QUOTA_HELP_URL),
            _ => None,
        }
    }
}

pub fn is_connectivity_message(message: &str) -> bool {
    message.contains("网络") || message.contains("连接")
}

pub fn is_quota_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    message.contains("配额") || lower.contains("quota") || lower.contains("insufficient_quota")
}

/// Best-effort extraction of a human-readable message from an error
/// response body: prefer `message`, then `detail`, else a generic
/// status-code line.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    format!("HTTP错误 {}", status)
}
