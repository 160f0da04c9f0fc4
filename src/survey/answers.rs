use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::ClientError;

use super::model::{QuestionKind, QuestionType, Survey};
use super::render::is_other_label;

/// The value shape depends on the question type: one string (single choice /
/// open ended), one number (scale / NPS), a selection list (multi choice) or
/// a brand-row × sub-question-column grid (matrix).
#[derive(Clone, Debug, PartialEq)]
pub enum AnswerValue {
    Text(String),
    Number(i64),
    Selections(Vec<String>),
    Grid(BTreeMap<usize, BTreeMap<usize, i32>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub kind: QuestionType,
    pub value: AnswerValue,
    /// Free text attached to a selected "other" option.
    pub other_text: Option<String>,
}

/// Accumulates a respondent's answers keyed by question id (as string),
/// validates required questions and produces the submission payload.
#[derive(Debug, Default)]
pub struct ResponseCollector {
    answers: BTreeMap<String, Answer>,
}

impl ResponseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, qid: &str) -> Option<&Answer> {
        self.answers.get(qid)
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Single choice: last selection wins; stale other-text is dropped with
    /// the previous selection.
    pub fn select_single(&mut self, qid: &str, option: &str) {
        self.answers.insert(
            qid.to_string(),
            Answer {
                kind: QuestionType::SingleChoice,
                value: AnswerValue::Text(option.to_string()),
                other_text: None,
            },
        );
    }

    /// Multi choice: toggled membership; unchecking removes the value.
    pub fn toggle_multi(&mut self, qid: &str, option: &str, checked: bool) {
        let answer = self
            .answers
            .entry(qid.to_string())
            .or_insert_with(|| Answer {
                kind: QuestionType::MultiChoice,
                value: AnswerValue::Selections(Vec::new()),
                other_text: None,
            });
        if !matches!(answer.value, AnswerValue::Selections(_)) {
            answer.kind = QuestionType::MultiChoice;
            answer.value = AnswerValue::Selections(Vec::new());
            answer.other_text = None;
        }
        if let AnswerValue::Selections(values) = &mut answer.value {
            if checked {
                if !values.iter().any(|v| v == option) {
                    values.push(option.to_string());
                }
            } else {
                values.retain(|v| v != option);
            }
        }
    }

    pub fn set_scale(&mut self, qid: &str, value: i64) {
        self.set_number(qid, QuestionType::Scale, value);
    }

    pub fn set_nps(&mut self, qid: &str, value: i64) {
        self.set_number(qid, QuestionType::Nps, value);
    }

    /// Open ended: overwrite with the latest text.
    pub fn set_open_text(&mut self, qid: &str, text: &str) {
        self.answers.insert(
            qid.to_string(),
            Answer {
                kind: QuestionType::OpenEnded,
                value: AnswerValue::Text(text.to_string()),
                other_text: None,
            },
        );
    }

    /// Matrix: one cell at a time; partial grids are fine while editing.
    pub fn set_matrix_cell(&mut self, qid: &str, brand_index: usize, sub_index: usize, value: i32) {
        let answer = self
            .answers
            .entry(qid.to_string())
            .or_insert_with(|| Answer {
                kind: QuestionType::Matrix,
                value: AnswerValue::Grid(BTreeMap::new()),
                other_text: None,
            });
        if !matches!(answer.value, AnswerValue::Grid(_)) {
            answer.kind = QuestionType::Matrix;
            answer.value = AnswerValue::Grid(BTreeMap::new());
            answer.other_text = None;
        }
        if let AnswerValue::Grid(grid) = &mut answer.value {
            grid.entry(brand_index).or_default().insert(sub_index, value);
        }
    }

    /// Clearing a cell (the respondent picked the placeholder back).
    pub fn clear_matrix_cell(&mut self, qid: &str, brand_index: usize, sub_index: usize) {
        if let Some(Answer {
            value: AnswerValue::Grid(grid),
            ..
        }) = self.answers.get_mut(qid)
        {
            if let Some(row) = grid.get_mut(&brand_index) {
                row.remove(&sub_index);
                if row.is_empty() {
                    grid.remove(&brand_index);
                }
            }
        }
    }

    /// Update the satellite "other" text of an existing choice answer. The
    /// option must be selected first; otherwise the update is dropped.
    pub fn set_other_text(&mut self, qid: &str, text: &str) {
        if let Some(answer) = self.answers.get_mut(qid) {
            if matches!(
                answer.kind,
                QuestionType::SingleChoice | QuestionType::MultiChoice
            ) {
                answer.other_text = Some(text.to_string());
            }
        }
    }

    /// Check every required question for a complete answer; failures carry
    /// the offending question texts, joined into one message upstream.
    pub fn validate(&self, survey: &Survey) -> Result<(), ClientError> {
        let mut missing = Vec::new();
        for question in survey.questions.iter().filter(|q| q.required) {
            let complete = self
                .answers
                .get(&question.id.to_string())
                .map(|answer| is_complete(answer, &question.kind))
                .unwrap_or(false);
            if !complete {
                missing.push(question.text.clone());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation { missing })
        }
    }

    /// Flatten answers into the backend's submission shape. Choice answers
    /// whose selected "other" option has accompanying text are merged as
    /// `"<option>: <text>"`; matrix grids go out as the raw nested mapping.
    pub fn to_submission(&self) -> Value {
        let mut payload = Map::new();
        for (qid, answer) in &self.answers {
            payload.insert(qid.clone(), format_answer(answer));
        }
        Value::Object(payload)
    }

    fn set_number(&mut self, qid: &str, kind: QuestionType, value: i64) {
        self.answers.insert(
            qid.to_string(),
            Answer {
                kind,
                value: AnswerValue::Number(value),
                other_text: None,
            },
        );
    }
}

fn is_complete(answer: &Answer, kind: &QuestionKind) -> bool {
    // A matrix question needs at least one filled cell; anything else on a
    // matrix question means the grid was never touched.
    if matches!(kind, QuestionKind::Matrix { .. }) {
        return match &answer.value {
            AnswerValue::Grid(grid) => grid.values().any(|row| !row.is_empty()),
            _ => false,
        };
    }
    match &answer.value {
        AnswerValue::Text(text) => !text.is_empty(),
        AnswerValue::Number(_) => true,
        AnswerValue::Selections(values) => !values.is_empty(),
        AnswerValue::Grid(grid) => grid.values().any(|row| !row.is_empty()),
    }
}

fn format_answer(answer: &Answer) -> Value {
    let other_text = answer
        .other_text
        .as_deref()
        .filter(|text| !text.is_empty());

    match &answer.value {
        AnswerValue::Selections(values) => {
            let merged: Vec<Value> = match other_text {
                Some(text) if values.iter().any(|v| is_other_label(v)) => values
                    .iter()
                    .map(|v| {
                        if is_other_label(v) {
                            Value::String(format!("{}: {}", v, text))
                        } else {
                            Value::String(v.clone())
                        }
                    })
                    .collect(),
                _ => values.iter().cloned().map(Value::String).collect(),
            };
            Value::Array(merged)
        }
        AnswerValue::Grid(grid) => {
            let mut rows = Map::new();
            for (brand_index, row) in grid {
                let mut cells = Map::new();
                for (sub_index, value) in row {
                    cells.insert(sub_index.to_string(), Value::from(*value));
                }
                rows.insert(brand_index.to_string(), Value::Object(cells));
            }
            Value::Object(rows)
        }
        AnswerValue::Text(text) => match other_text {
            Some(other) if is_other_label(text) => {
                Value::String(format!("{}: {}", text, other))
            }
            _ => Value::String(text.clone()),
        },
        AnswerValue::Number(value) => Value::from(*value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::model::Question;
    use serde_json::json;

    fn survey_with(questions: Vec<Question>) -> Survey {
        let mut survey = Survey::empty();
        survey.questions = questions;
        survey
    }

    fn required(id: u32, text: &str, kind: QuestionKind) -> Question {
        Question {
            id,
            text: text.to_string(),
            required: true,
            kind,
            display_number: None,
        }
    }

    fn matrix_kind() -> QuestionKind {
        QuestionKind::Matrix {
            sub_questions: vec!["知名度".to_string(), "好感度".to_string()],
            brands: vec!["品牌A".to_string(), "品牌B".to_string()],
            scale_min: 1,
            scale_max: 5,
            scale_labels: Default::default(),
        }
    }

    #[test]
    fn single_choice_last_selection_wins_and_clears_other_text() {
        let mut collector = ResponseCollector::new();
        collector.select_single("1", "其他");
        collector.set_other_text("1", "朋友推荐");
        collector.select_single("1", "线上广告");

        let answer = collector.answer("1").unwrap();
        assert_eq!(answer.value, AnswerValue::Text("线上广告".to_string()));
        assert_eq!(answer.other_text, None);
    }

    #[test]
    fn multi_choice_toggles_membership() {
        let mut collector = ResponseCollector::new();
        collector.toggle_multi("2", "线上", true);
        collector.toggle_multi("2", "线下", true);
        collector.toggle_multi("2", "线上", true); // duplicate check stays single
        collector.toggle_multi("2", "线下", false);

        assert_eq!(
            collector.answer("2").unwrap().value,
            AnswerValue::Selections(vec!["线上".to_string()])
        );
    }

    #[test]
    fn other_text_without_a_selection_is_dropped() {
        let mut collector = ResponseCollector::new();
        collector.set_other_text("3", "无处安放");
        assert!(collector.answer("3").is_none());

        // Open-ended answers never take other-text either.
        collector.set_open_text("4", "自由回答");
        collector.set_other_text("4", "忽略");
        assert_eq!(collector.answer("4").unwrap().other_text, None);
    }

    #[test]
    fn matrix_cells_accumulate_and_clear() {
        let mut collector = ResponseCollector::new();
        collector.set_matrix_cell("5", 0, 1, 4);
        collector.set_matrix_cell("5", 1, 0, 2);
        collector.clear_matrix_cell("5", 1, 0);

        match &collector.answer("5").unwrap().value {
            AnswerValue::Grid(grid) => {
                assert_eq!(grid.len(), 1);
                assert_eq!(grid[&0][&1], 4);
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn validation_requires_at_least_one_matrix_cell() {
        let survey = survey_with(vec![required(1, "品牌对比", matrix_kind())]);
        let mut collector = ResponseCollector::new();

        let err = collector.validate(&survey).unwrap_err();
        match &err {
            ClientError::Validation { missing } => assert_eq!(missing, &vec!["品牌对比".to_string()]),
            other => panic!("unexpected error: {:?}", other),
        }

        collector.set_matrix_cell("1", 0, 0, 3);
        assert!(collector.validate(&survey).is_ok());
    }

    #[test]
    fn validation_accepts_a_zero_nps_score() {
        let survey = survey_with(vec![required(
            1,
            "推荐意愿",
            QuestionKind::Nps {
                scale_min: 0,
                scale_max: 10,
                scale_labels: Default::default(),
            },
        )]);
        let mut collector = ResponseCollector::new();
        collector.set_nps("1", 0);
        assert!(collector.validate(&survey).is_ok());
    }

    #[test]
    fn validation_collects_every_missing_required_text() {
        let survey = survey_with(vec![
            required(
                1,
                "您的性别？",
                QuestionKind::SingleChoice {
                    options: vec!["男".to_string(), "女".to_string()],
                },
            ),
            required(2, "其他建议？", QuestionKind::OpenEnded),
            Question {
                id: 3,
                text: "选填问题".to_string(),
                required: false,
                kind: QuestionKind::OpenEnded,
                display_number: None,
            },
        ]);
        let mut collector = ResponseCollector::new();
        collector.set_open_text("2", ""); // empty text is not an answer

        let err = collector.validate(&survey).unwrap_err();
        match err {
            ClientError::Validation { missing } => {
                assert_eq!(missing, vec!["您的性别？", "其他建议？"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn submission_merges_other_text_into_multi_choice() {
        let mut collector = ResponseCollector::new();
        collector.toggle_multi("2", "线上", true);
        collector.toggle_multi("2", "其他", true);
        collector.set_other_text("2", "社区团购");

        assert_eq!(
            collector.to_submission(),
            json!({"2": ["线上", "其他: 社区团购"]})
        );
    }

    #[test]
    fn submission_appends_other_text_to_a_sentinel_single_choice() {
        let mut collector = ResponseCollector::new();
        collector.select_single("1", "其他（请说明）");
        collector.set_other_text("1", "电台广告");
        collector.select_single("7", "线上广告");

        assert_eq!(
            collector.to_submission(),
            json!({
                "1": "其他（请说明）: 电台广告",
                "7": "线上广告"
            })
        );
    }

    #[test]
    fn submission_serializes_raw_shapes() {
        let mut collector = ResponseCollector::new();
        collector.set_scale("3", 4);
        collector.set_open_text("4", "整体不错");
        collector.set_matrix_cell("5", 0, 1, 2);

        assert_eq!(
            collector.to_submission(),
            json!({
                "3": 4,
                "4": "整体不错",
                "5": {"0": {"1": 2}}
            })
        );
    }

    #[test]
    fn empty_other_text_is_not_merged() {
        let mut collector = ResponseCollector::new();
        collector.toggle_multi("2", "其他", true);
        collector.set_other_text("2", "");
        assert_eq!(collector.to_submission(), json!({"2": ["其他"]}));
    }
}
