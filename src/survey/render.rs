//! Fill-mode rendering: pure functions from the survey model to
//! presentation descriptors. Nothing here touches a UI toolkit; the
//! embedding shell turns descriptors into actual widgets.

use super::model::{Question, QuestionKind, Survey};

pub const UNTITLED_SURVEY: &str = "问卷";
pub const OPEN_PLACEHOLDER: &str = "请输入您的回答...";
pub const OTHER_PLACEHOLDER: &str = "请说明其他...";

/// A choice option whose label marks it as the free-text escape hatch.
/// Such options get a satellite text input, disabled until selected.
pub fn is_other_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.contains("其他") || lower.contains("other")
}

#[derive(Clone, Debug, PartialEq)]
pub struct FillableSurvey {
    pub title: String,
    pub description: String,
    pub target_audience: String,
    pub estimated_time: u32,
    pub questions: Vec<FillableQuestion>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FillableQuestion {
    /// Fill mode numbers by the stored id: the publisher has already fixed
    /// the ordering via `displayNumber`, so what arrives here is trusted.
    pub number: u32,
    pub type_badge: &'static str,
    pub text: String,
    pub required: bool,
    pub widget: Widget,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    pub is_other: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleStep {
    pub value: i32,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Widget {
    Choices {
        multiple: bool,
        options: Vec<ChoiceOption>,
    },
    Scale {
        steps: Vec<ScaleStep>,
        min_label: Option<String>,
        max_label: Option<String>,
    },
    Matrix {
        columns: Vec<String>,
        rows: Vec<String>,
        choices: Vec<ScaleStep>,
    },
    Nps {
        steps: Vec<i32>,
        low_label: Option<String>,
        high_label: Option<String>,
    },
    OpenText {
        placeholder: &'static str,
    },
}

pub fn render_fillable(survey: &Survey) -> FillableSurvey {
    FillableSurvey {
        title: if survey.title.is_empty() {
            UNTITLED_SURVEY.to_string()
        } else {
            survey.title.clone()
        },
        description: survey.description.clone(),
        target_audience: survey.target_audience.clone(),
        estimated_time: survey.estimated_time,
        questions: survey
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| render_question(q, index))
            .collect(),
    }
}

pub fn render_question(question: &Question, index: usize) -> FillableQuestion {
    let number = if question.id == 0 {
        index as u32 + 1
    } else {
        question.id
    };

    let widget = match &question.kind {
        QuestionKind::SingleChoice { options } => Widget::Choices {
            multiple: false,
            options: choice_options(options),
        },
        QuestionKind::MultiChoice { options } => Widget::Choices {
            multiple: true,
            options: choice_options(options),
        },
        QuestionKind::Scale {
            scale_min,
            scale_max,
            scale_min_label,
            scale_max_label,
            scale_labels,
        } => Widget::Scale {
            steps: (*scale_min..=*scale_max)
                .map(|value| ScaleStep {
                    value,
                    label: scale_labels.get(&value.to_string()).cloned(),
                })
                .collect(),
            min_label: scale_min_label.clone(),
            max_label: scale_max_label.clone(),
        },
        QuestionKind::Matrix {
            sub_questions,
            brands,
            scale_min,
            scale_max,
            scale_labels,
        } => Widget::Matrix {
            columns: sub_questions.clone(),
            rows: brands.clone(),
            choices: (*scale_min..=*scale_max)
                .map(|value| ScaleStep {
                    value,
                    label: scale_labels.get(&value.to_string()).cloned(),
                })
                .collect(),
        },
        QuestionKind::Nps {
            scale_min,
            scale_max,
            scale_labels,
        } => Widget::Nps {
            steps: (*scale_min..=*scale_max).collect(),
            low_label: scale_labels.get(&scale_min.to_string()).cloned(),
            high_label: scale_labels.get(&scale_max.to_string()).cloned(),
        },
        QuestionKind::OpenEnded => Widget::OpenText {
            placeholder: OPEN_PLACEHOLDER,
        },
    };

    FillableQuestion {
        number,
        type_badge: question.kind.type_label(),
        text: question.text.clone(),
        required: question.required,
        widget,
    }
}

fn choice_options(options: &[String]) -> Vec<ChoiceOption> {
    options
        .iter()
        .map(|label| ChoiceOption {
            label: label.clone(),
            is_other: is_other_label(label),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn question(id: u32, kind: QuestionKind) -> Question {
        Question {
            id,
            text: "测试问题".to_string(),
            required: true,
            kind,
            display_number: None,
        }
    }

    #[test]
    fn other_sentinel_detection_is_case_insensitive_substring() {
        assert!(is_other_label("其他"));
        assert!(is_other_label("其他（请说明）"));
        assert!(is_other_label("Other"));
        assert!(is_other_label("OTHER channels"));
        assert!(!is_other_label("线上渠道"));
    }

    #[test]
    fn fill_mode_numbers_by_stored_id_with_index_fallback() {
        let q = question(7, QuestionKind::OpenEnded);
        assert_eq!(render_question(&q, 0).number, 7);

        let unnumbered = question(0, QuestionKind::OpenEnded);
        assert_eq!(render_question(&unnumbered, 2).number, 3);
    }

    #[test]
    fn choice_widget_flags_other_options() {
        let q = question(
            1,
            QuestionKind::MultiChoice {
                options: vec!["线上".to_string(), "其他（请说明）".to_string()],
            },
        );
        match render_question(&q, 0).widget {
            Widget::Choices { multiple, options } => {
                assert!(multiple);
                assert!(!options[0].is_other);
                assert!(options[1].is_other);
            }
            other => panic!("unexpected widget: {:?}", other),
        }
    }

    #[test]
    fn scale_widget_enumerates_steps_with_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("1".to_string(), "差".to_string());
        labels.insert("3".to_string(), "好".to_string());
        let q = question(
            1,
            QuestionKind::Scale {
                scale_min: 1,
                scale_max: 3,
                scale_min_label: Some("最低".to_string()),
                scale_max_label: Some("最高".to_string()),
                scale_labels: labels,
            },
        );
        match render_question(&q, 0).widget {
            Widget::Scale {
                steps,
                min_label,
                max_label,
            } => {
                assert_eq!(steps.len(), 3);
                assert_eq!(steps[0].label.as_deref(), Some("差"));
                assert_eq!(steps[1].label, None);
                assert_eq!(steps[2].label.as_deref(), Some("好"));
                assert_eq!(min_label.as_deref(), Some("最低"));
                assert_eq!(max_label.as_deref(), Some("最高"));
            }
            other => panic!("unexpected widget: {:?}", other),
        }
    }

    #[test]
    fn matrix_widget_carries_grid_dimensions() {
        let q = question(
            2,
            QuestionKind::Matrix {
                sub_questions: vec!["知名度".to_string(), "好感度".to_string()],
                brands: vec!["品牌A".to_string(), "品牌B".to_string(), "品牌C".to_string()],
                scale_min: 1,
                scale_max: 5,
                scale_labels: BTreeMap::new(),
            },
        );
        match render_question(&q, 0).widget {
            Widget::Matrix {
                columns,
                rows,
                choices,
            } => {
                assert_eq!(columns.len(), 2);
                assert_eq!(rows.len(), 3);
                assert_eq!(choices.len(), 5);
            }
            other => panic!("unexpected widget: {:?}", other),
        }
    }

    #[test]
    fn nps_widget_defaults_to_zero_through_ten_with_endpoint_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("0".to_string(), "绝不推荐".to_string());
        labels.insert("10".to_string(), "非常愿意".to_string());
        let q = question(
            3,
            QuestionKind::Nps {
                scale_min: 0,
                scale_max: 10,
                scale_labels: labels,
            },
        );
        match render_question(&q, 0).widget {
            Widget::Nps {
                steps,
                low_label,
                high_label,
            } => {
                assert_eq!(steps, (0..=10).collect::<Vec<i32>>());
                assert_eq!(low_label.as_deref(), Some("绝不推荐"));
                assert_eq!(high_label.as_deref(), Some("非常愿意"));
            }
            other => panic!("unexpected widget: {:?}", other),
        }
    }

    #[test]
    fn untitled_survey_gets_the_fallback_title() {
        let survey = Survey::empty();
        assert_eq!(render_fillable(&survey).title, UNTITLED_SURVEY);
    }
}
