use super::model::{Question, QuestionKind, QuestionType, Survey};

pub const DEFAULT_QUESTION_TEXT: &str = "新问题";
pub const DEFAULT_OPTION_TEXT: &str = "新选项";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

/// A field-level edit on one question.
#[derive(Clone, Debug)]
pub enum QuestionEdit {
    Text(String),
    Required(bool),
    Kind(QuestionType),
}

/// Owns the document being edited. A document may not exist yet (nothing
/// generated or loaded), in which case every mutation is a silent no-op.
#[derive(Debug, Default)]
pub struct SurveyEditor {
    survey: Option<Survey>,
}

impl SurveyEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_survey(survey: Survey) -> Self {
        Self {
            survey: Some(survey),
        }
    }

    pub fn load(&mut self, survey: Survey) {
        self.survey = Some(survey);
    }

    pub fn survey(&self) -> Option<&Survey> {
        self.survey.as_ref()
    }

    pub fn take(&mut self) -> Option<Survey> {
        self.survey.take()
    }

    pub fn question_count(&self) -> usize {
        self.survey.as_ref().map_or(0, |s| s.questions.len())
    }

    /// Partial update; `None` leaves the field unchanged.
    pub fn update_meta(
        &mut self,
        title: Option<&str>,
        description: Option<&str>,
        target_audience: Option<&str>,
    ) {
        let Some(survey) = self.survey.as_mut() else {
            return;
        };
        if let Some(title) = title {
            survey.title = title.to_string();
        }
        if let Some(description) = description {
            survey.description = description.to_string();
        }
        if let Some(target_audience) = target_audience {
            survey.target_audience = target_audience.to_string();
        }
    }

    /// Insert a default single-choice question at the head of the list and
    /// return its freshly minted id (`max(existing ids, 0) + 1`, never
    /// reused).
    pub fn add_question(&mut self) -> Option<u32> {
        let survey = self.survey.as_mut()?;

        let new_id = survey.questions.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        survey.questions.insert(
            0,
            Question {
                id: new_id,
                text: DEFAULT_QUESTION_TEXT.to_string(),
                required: true,
                kind: QuestionKind::SingleChoice {
                    options: vec!["选项1".to_string(), "选项2".to_string()],
                },
                display_number: None,
            },
        );
        Some(new_id)
    }

    /// Remove the question at `index`. The confirmation prompt happens
    /// upstream; out-of-bounds is a no-op.
    pub fn delete_question(&mut self, index: usize) {
        if let Some(survey) = self.survey.as_mut() {
            if index < survey.questions.len() {
                survey.questions.remove(index);
            }
        }
    }

    /// Swap with the neighbor in `direction`. Returns false when the move is
    /// impossible (sequence boundary or no document).
    pub fn move_question(&mut self, index: usize, direction: Direction) -> bool {
        let Some(survey) = self.survey.as_mut() else {
            return false;
        };
        let len = survey.questions.len();
        if index >= len {
            return false;
        }
        let neighbor = match direction {
            Direction::Up => {
                if index == 0 {
                    return false;
                }
                index - 1
            }
            Direction::Down => {
                if index + 1 >= len {
                    return false;
                }
                index + 1
            }
        };
        survey.questions.swap(index, neighbor);
        true
    }

    pub fn update_field(&mut self, index: usize, edit: QuestionEdit) {
        let Some(question) = self.question_mut(index) else {
            return;
        };
        match edit {
            QuestionEdit::Text(text) => question.text = text,
            QuestionEdit::Required(required) => question.required = required,
            QuestionEdit::Kind(target) => question.kind = convert_kind(&question.kind, target),
        }
    }

    pub fn set_option(&mut self, index: usize, option_index: usize, value: &str) {
        if let Some(options) = self.options_mut(index) {
            if let Some(slot) = options.get_mut(option_index) {
                *slot = value.to_string();
            }
        }
    }

    pub fn add_option(&mut self, index: usize) {
        if let Some(options) = self.options_mut(index) {
            options.push(DEFAULT_OPTION_TEXT.to_string());
        }
    }

    pub fn delete_option(&mut self, index: usize, option_index: usize) {
        if let Some(options) = self.options_mut(index) {
            if option_index < options.len() {
                options.remove(option_index);
            }
        }
    }

    /// Set one scale bound, pushing the other bound by exactly 1 when the
    /// edit would violate `min < max`.
    pub fn set_scale_bound(&mut self, index: usize, bound: Bound, value: i32) {
        let Some(question) = self.question_mut(index) else {
            return;
        };
        let Some((min, max)) = question.kind.scale_bounds_mut() else {
            return;
        };
        match bound {
            Bound::Min => {
                if value >= *max {
                    *max = value + 1;
                }
                *min = value;
            }
            Bound::Max => {
                if value <= *min {
                    *min = value - 1;
                }
                *max = value;
            }
        }
    }

    /// Immutable export copy with `displayNumber = position + 1` on every
    /// question, used for both preview and publish. Stored ids are kept but
    /// downstream display must use `displayNumber`.
    pub fn snapshot_for_export(&self) -> Option<Survey> {
        let survey = self.survey.as_ref()?;
        let mut snapshot = survey.clone();
        for (index, question) in snapshot.questions.iter_mut().enumerate() {
            question.display_number = Some(index as u32 + 1);
        }
        Some(snapshot)
    }

    fn question_mut(&mut self, index: usize) -> Option<&mut Question> {
        self.survey.as_mut()?.questions.get_mut(index)
    }

    fn options_mut(&mut self, index: usize) -> Option<&mut Vec<String>> {
        self.question_mut(index)?.kind.options_mut()
    }
}

/// Change a question's type, carrying over whatever payload still makes
/// sense: options survive between the two choice kinds, scale bounds survive
/// between the scale-shaped kinds.
fn convert_kind(old: &QuestionKind, target: QuestionType) -> QuestionKind {
    let carried_options = || {
        old.options()
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec!["选项1".to_string(), "选项2".to_string()])
    };
    match target {
        QuestionType::SingleChoice => QuestionKind::SingleChoice {
            options: carried_options(),
        },
        QuestionType::MultiChoice => QuestionKind::MultiChoice {
            options: carried_options(),
        },
        QuestionType::Scale => {
            let (scale_min, scale_max) = old.scale_bounds().unwrap_or((1, 10));
            QuestionKind::Scale {
                scale_min,
                scale_max,
                scale_min_label: None,
                scale_max_label: None,
                scale_labels: Default::default(),
            }
        }
        QuestionType::Matrix => {
            let (scale_min, scale_max) = old.scale_bounds().unwrap_or((1, 5));
            QuestionKind::Matrix {
                sub_questions: Vec::new(),
                brands: Vec::new(),
                scale_min,
                scale_max,
                scale_labels: Default::default(),
            }
        }
        QuestionType::Nps => {
            let (scale_min, scale_max) = old.scale_bounds().unwrap_or((0, 10));
            QuestionKind::Nps {
                scale_min,
                scale_max,
                scale_labels: Default::default(),
            }
        }
        QuestionType::OpenEnded => QuestionKind::OpenEnded,
    }
}
