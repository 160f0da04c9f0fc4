//! Clients for the save/publish and response-submission endpoints.

use std::time::Duration;

use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::error::{extract_error_message, ClientError};
use crate::survey::Survey;

pub struct BackendClient {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct SaveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    survey_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl BackendClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    /// Publish an export snapshot and return the backend's survey id.
    pub async fn save_survey(
        &self,
        snapshot: &Survey,
        session_id: Option<&str>,
    ) -> Result<String, ClientError> {
        let url = format!("{}/api/save-survey", self.api_base);
        let response = self
            .client
            .post(&url)
            .json(&save_payload(snapshot, session_id))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ClientError::Transport {
                status: Some(status.as_u16()),
                message: extract_error_message(status.as_u16(), &body),
            });
        }

        let parsed: SaveResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Transport {
                status: Some(status.as_u16()),
                message: format!("保存响应无法解析: {}", e),
            })?;
        match parsed {
            SaveResponse {
                success: true,
                survey_id: Some(id),
                ..
            } => {
                info!("问卷已保存: {}", id);
                Ok(id)
            }
            SaveResponse { message, .. } => Err(ClientError::Transport {
                status: Some(status.as_u16()),
                message: message.unwrap_or_else(|| "保存问卷失败".to_string()),
            }),
        }
    }

    /// Submission is acknowledged generically; only the status matters.
    pub async fn submit_response(
        &self,
        survey_id: &str,
        answers: &Value,
        user_id: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/submit-response", self.api_base);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "survey_id": survey_id,
                "answers": answers,
                "user_id": user_id,
            }))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport {
                status: Some(status.as_u16()),
                message: extract_error_message(status.as_u16(), &body),
            });
        }
        info!("答卷已提交: {}", survey_id);
        Ok(())
    }

    /// Respondent-facing link for a published survey.
    pub fn share_url(&self, survey_id: &str) -> String {
        let origin = Url::parse(&self.api_base)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| self.api_base.trim_end_matches('/').to_string());
        format!("{}/fill/{}", origin, urlencoding::encode(survey_id))
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport {
        status: None,
        message: e.to_string(),
    }
}

/// An absent session id still appears in the body, as JSON null.
fn save_payload(snapshot: &Survey, session_id: Option<&str>) -> Value {
    json!({
        "survey": snapshot,
        "session_id": session_id,
    })
}
