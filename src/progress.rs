use std::collections::{HashMap, VecDeque};

use once_cell::sync::Lazy;
use rand::Rng;

use crate::stream::StreamEvent;

/// Coarse progress for the backend's fixed pipeline steps. Messages are the
/// exact strings the generation service emits; anything else maps to 0.
static STEP_PROGRESS: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    HashMap::from([
        ("正在分析您的需求...", 10.0),
        ("需求优化完成", 25.0),
        ("正在检索相关案例...", 40.0),
        ("正在生成问卷内容...", 70.0),
        ("问卷生成完成", 100.0),
    ])
});

/// Thinking events only nudge the bar while no explicit step/progress update
/// has pushed past this point.
const THINKING_CEILING: f32 = 70.0;

const MAX_THINKING_MESSAGES: usize = 20;

const COMPLETE_MESSAGE: &str = "问卷生成完成";

/// Display state derived from one applied event.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub progress: f32,
    pub status: String,
    /// Thinking message appended by this event, if any.
    pub thinking: Option<String>,
}

/// Maps generation stream events to a 0-100 progress value, a status line
/// and a capped log of the model's thinking messages.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    progress: f32,
    status: String,
    thinking: VecDeque<String>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn thinking_log(&self) -> impl Iterator<Item = &str> {
        self.thinking.iter().map(|s| s.as_str())
    }

    /// Apply one stream event and return the resulting display state.
    ///
    /// Explicit `progress` events are last-writer-wins and may move the bar
    /// backward; smoothing is a rendering concern, not handled here.
    pub fn apply(&mut self, event: &StreamEvent) -> ProgressUpdate {
        let mut appended = None;

        match event {
            StreamEvent::Step { message } => {
                self.progress = step_progress(message);
                self.status = message.clone();
            }
            StreamEvent::Progress { progress, message } => {
                self.progress = progress.clamp(0.0, 100.0);
                self.status = message.clone();
            }
            StreamEvent::Thinking { message } => {
                self.thinking.push_back(message.clone());
                if self.thinking.len() > MAX_THINKING_MESSAGES {
                    self.thinking.pop_front();
                }
                if self.progress < THINKING_CEILING {
                    let bump: f32 = rand::thread_rng().gen_range(0.5..2.5);
                    self.progress = (self.progress + bump).min(THINKING_CEILING);
                }
                appended = Some(message.clone());
            }
            StreamEvent::Complete { .. } => {
                self.progress = 100.0;
                self.status = COMPLETE_MESSAGE.to_string();
            }
            // The caller surfaces the failure; display state stays as-is.
            StreamEvent::Error { .. } => {}
        }

        ProgressUpdate {
            progress: self.progress,
            status: self.status.clone(),
            thinking: appended,
        }
    }
}

fn step_progress(message: &str) -> f32 {
    STEP_PROGRESS.get(message).copied().unwrap_or(0.0)
}
