//! Streaming client for the AI generation endpoint.

use std::time::Duration;

use futures_util::StreamExt;
use log::{error, info};

use crate::error::{extract_error_message, ClientError};
use crate::progress::{ProgressTracker, ProgressUpdate};
use crate::stream::{SseDecoder, StreamEvent};
use crate::survey::Survey;

pub struct GenerationClient {
    client: reqwest::Client,
    api_base: String,
}

impl GenerationClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    /// POST the prompt and consume the SSE reply until a usable survey
    /// arrives. `on_update` fires once per decoded event with the tracker's
    /// display state. One generation per call; the function always returns,
    /// so the caller's re-enable step runs no matter the outcome.
    pub async fn generate<F>(&self, prompt: &str, mut on_update: F) -> Result<Survey, ClientError>
    where
        F: FnMut(&ProgressUpdate),
    {
        let url = format!("{}/api/generate", self.api_base);
        info!("请求生成问卷: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status.as_u16(), &body);
            error!("生成请求失败 {}: {}", status, message);
            return Err(ClientError::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        let mut decoder = SseDecoder::new();
        let mut tracker = ProgressTracker::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| {
                error!("读取生成流时出错: {}", e);
                ClientError::Transport {
                    status: None,
                    message: e.to_string(),
                }
            })?;
            let text = String::from_utf8_lossy(&bytes);
            for event in decoder.feed(&text) {
                if let Some(survey) = handle_event(event, &mut tracker, &mut on_update)? {
                    return Ok(survey);
                }
            }
        }

        // The terminal chunk may lack a trailing newline.
        for event in decoder.finish() {
            if let Some(survey) = handle_event(event, &mut tracker, &mut on_update)? {
                return Ok(survey);
            }
        }

        Err(ClientError::EmptyCompletion)
    }
}

/// Returns the finished survey on a usable `complete` event, an error when
/// the stream reports a failure (an empty completion counts as one), `None`
/// for everything in between.
fn handle_event<F>(
    event: StreamEvent,
    tracker: &mut ProgressTracker,
    on_update: &mut F,
) -> Result<Option<Survey>, ClientError>
where
    F: FnMut(&ProgressUpdate),
{
    let update = tracker.apply(&event);
    on_update(&update);

    match event {
        StreamEvent::Error { message } => Err(ClientError::from_stream_message(message)),
        StreamEvent::Complete { survey } => match survey {
            Some(survey) if !survey.questions.is_empty() => Ok(Some(survey)),
            _ => Err(ClientError::EmptyCompletion),
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(lines: &[&str]) -> Result<Option<Survey>, ClientError> {
        let mut decoder = SseDecoder::new();
        let mut tracker = ProgressTracker::new();
        let mut on_update = |_: &ProgressUpdate| {};

        for line in lines {
            for event in decoder.feed(line) {
                if let Some(survey) = handle_event(event, &mut tracker, &mut on_update)? {
                    return Ok(Some(survey));
                }
            }
        }
        for event in decoder.finish() {
            if let Some(survey) = handle_event(event, &mut tracker, &mut on_update)? {
                return Ok(Some(survey));
            }
        }
        Ok(None)
    }

    #[test]
    fn complete_with_questions_yields_the_survey() {
        let survey = drive(&[
            "data: {\"type\":\"step\",\"message\":\"正在生成问卷内容...\"}\n",
            "data: {\"type\":\"complete\",\"survey\":{\"title\":\"调研\",\"questions\":[{\"id\":1,\"type\":\"开放式问题\",\"text\":\"想法？\"}]}}\n",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(survey.title, "调研");
        assert_eq!(survey.questions.len(), 1);
    }

    #[test]
    fn complete_with_zero_questions_is_a_failure() {
        let err = drive(&[
            "data: {\"type\":\"complete\",\"survey\":{\"title\":\"空\",\"questions\":[]}}\n",
        ])
        .unwrap_err();
        assert!(matches!(err, ClientError::EmptyCompletion));
    }

    #[test]
    fn complete_without_a_survey_is_a_failure() {
        let err = drive(&["data: {\"type\":\"complete\"}\n"]).unwrap_err();
        assert!(matches!(err, ClientError::EmptyCompletion));
    }

    #[test]
    fn stream_ending_without_complete_is_a_failure() {
        // The driver returns Ok(None); the client maps that to EmptyCompletion.
        let outcome = drive(&[
            "data: {\"type\":\"step\",\"message\":\"正在分析您的需求...\"}\n",
            "data: {\"type\":\"thinking\",\"message\":\"目标人群\"}\n",
        ])
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn error_event_aborts_with_the_backend_message() {
        let err = drive(&[
            "data: {\"type\":\"step\",\"message\":\"正在检索相关案例...\"}\n",
            "data: {\"type\":\"error\",\"message\":\"网络连接中断\"}\n",
        ])
        .unwrap_err();
        assert!(matches!(err, ClientError::Stream { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn quota_error_event_is_classified_as_quota() {
        let err = drive(&["data: {\"type\":\"error\",\"message\":\"insufficient_quota\"}\n"])
            .unwrap_err();
        assert!(matches!(err, ClientError::Quota { .. }));
        assert!(err.help_url().is_some());
    }

    #[test]
    fn terminal_complete_without_trailing_newline_is_flushed() {
        let survey = drive(&[
            "data: {\"type\":\"complete\",\"survey\":{\"title\":\"尾行\",\"questions\":[{\"id\":1,\"type\":\"开放式问题\",\"text\":\"？\"}]}}",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(survey.title, "尾行");
    }
}
