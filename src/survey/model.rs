use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The authored questionnaire, in the backend's wire format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Survey {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default = "default_estimated_time")]
    pub estimated_time: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            target_audience: String::new(),
            estimated_time: default_estimated_time(),
            questions: Vec::new(),
        }
    }
}

/// One question. `id` is stable and unique within the document but does not
/// drive display order; edit mode numbers by position, and the publish
/// snapshot injects `displayNumber` so fill mode can trust what it reads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Question {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(
        rename = "displayNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_number: Option<u32>,
}

/// Type-specific payload, tagged by the backend's Chinese `type` strings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum QuestionKind {
    #[serde(rename = "单选题")]
    SingleChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    #[serde(rename = "多选题")]
    MultiChoice {
        #[serde(default)]
        options: Vec<String>,
    },
    #[serde(rename = "量表题")]
    Scale {
        #[serde(default = "default_scale_min")]
        scale_min: i32,
        #[serde(default = "default_scale_max")]
        scale_max: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale_min_label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale_max_label: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        scale_labels: BTreeMap<String, String>,
    },
    #[serde(rename = "矩阵题")]
    Matrix {
        #[serde(default)]
        sub_questions: Vec<String>,
        #[serde(default)]
        brands: Vec<String>,
        #[serde(default = "default_scale_min")]
        scale_min: i32,
        #[serde(default = "default_scale_max")]
        scale_max: i32,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        scale_labels: BTreeMap<String, String>,
    },
    // Older payloads spell the tag out in full.
    #[serde(rename = "NPS题", alias = "净推荐值（NPS）题")]
    Nps {
        #[serde(default = "default_nps_min")]
        scale_min: i32,
        #[serde(default = "default_nps_max")]
        scale_max: i32,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        scale_labels: BTreeMap<String, String>,
    },
    #[serde(rename = "开放式问题")]
    OpenEnded,
}

/// Bare discriminant for [`QuestionKind`], used where only the type matters
/// (type switchers, answer tagging).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    Scale,
    Matrix,
    Nps,
    OpenEnded,
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::SingleChoice { .. } => QuestionType::SingleChoice,
            QuestionKind::MultiChoice { .. } => QuestionType::MultiChoice,
            QuestionKind::Scale { .. } => QuestionType::Scale,
            QuestionKind::Matrix { .. } => QuestionType::Matrix,
            QuestionKind::Nps { .. } => QuestionType::Nps,
            QuestionKind::OpenEnded => QuestionType::OpenEnded,
        }
    }

    /// The wire/display label for this type.
    pub fn type_label(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice { .. } => "单选题",
            QuestionKind::MultiChoice { .. } => "多选题",
            QuestionKind::Scale { .. } => "量表题",
            QuestionKind::Matrix { .. } => "矩阵题",
            QuestionKind::Nps { .. } => "NPS题",
            QuestionKind::OpenEnded => "开放式问题",
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            QuestionKind::SingleChoice { options } | QuestionKind::MultiChoice { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            QuestionKind::SingleChoice { options } | QuestionKind::MultiChoice { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    pub fn scale_bounds(&self) -> Option<(i32, i32)> {
        match self {
            QuestionKind::Scale {
                scale_min,
                scale_max,
                ..
            }
            | QuestionKind::Matrix {
                scale_min,
                scale_max,
                ..
            }
            | QuestionKind::Nps {
                scale_min,
                scale_max,
                ..
            } => Some((*scale_min, *scale_max)),
            _ => None,
        }
    }

    pub(crate) fn scale_bounds_mut(&mut self) -> Option<(&mut i32, &mut i32)> {
        match self {
            QuestionKind::Scale {
                scale_min,
                scale_max,
                ..
            }
            | QuestionKind::Matrix {
                scale_min,
                scale_max,
                ..
            }
            | QuestionKind::Nps {
                scale_min,
                scale_max,
                ..
            } => Some((scale_min, scale_max)),
            _ => None,
        }
    }
}

pub(crate) fn default_estimated_time() -> u32 {
    5
}

fn default_scale_min() -> i32 {
    1
}

fn default_scale_max() -> i32 {
    5
}

fn default_nps_min() -> i32 {
    0
}

fn default_nps_max() -> i32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_question_type() {
        let json = r#"{
            "title": "品牌认知调研",
            "description": "了解消费者对品牌的认知",
            "target_audience": "25-40岁消费者",
            "estimated_time": 8,
            "questions": [
                {"id": 1, "type": "单选题", "text": "您的性别？", "required": true,
                 "options": ["男", "女", "其他"]},
                {"id": 2, "type": "多选题", "text": "您常用的渠道？", "required": false,
                 "options": ["线上", "线下"]},
                {"id": 3, "type": "量表题", "text": "满意度打分", "required": true,
                 "scale_min": 1, "scale_max": 5,
                 "scale_min_label": "非常不满意", "scale_max_label": "非常满意"},
                {"id": 4, "type": "矩阵题", "text": "品牌对比", "required": true,
                 "sub_questions": ["知名度", "好感度"], "brands": ["品牌A", "品牌B"],
                 "scale_min": 1, "scale_max": 5, "scale_labels": {"1": "低", "5": "高"}},
                {"id": 5, "type": "NPS题", "text": "推荐意愿", "required": true,
                 "scale_min": 0, "scale_max": 10,
                 "scale_labels": {"0": "绝不推荐", "10": "非常愿意"}},
                {"id": 6, "type": "开放式问题", "text": "其他建议？", "required": false}
            ]
        }"#;

        let survey: Survey = serde_json::from_str(json).unwrap();
        assert_eq!(survey.questions.len(), 6);
        assert_eq!(survey.questions[0].kind.type_label(), "单选题");
        assert!(matches!(survey.questions[5].kind, QuestionKind::OpenEnded));

        let reparsed: Survey =
            serde_json::from_str(&serde_json::to_string(&survey).unwrap()).unwrap();
        assert_eq!(survey, reparsed);
    }

    #[test]
    fn accepts_the_long_nps_alias() {
        let q: Question = serde_json::from_str(
            r#"{"id": 9, "type": "净推荐值（NPS）题", "text": "推荐？", "required": true}"#,
        )
        .unwrap();
        match q.kind {
            QuestionKind::Nps {
                scale_min,
                scale_max,
                ..
            } => {
                assert_eq!((scale_min, scale_max), (0, 10));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        // Serializes back with the short tag.
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "NPS题");
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let q: Question =
            serde_json::from_str(r#"{"id": 2, "type": "量表题", "text": "打分"}"#).unwrap();
        assert!(!q.required);
        assert_eq!(q.kind.scale_bounds(), Some((1, 5)));

        let survey: Survey = serde_json::from_str(r#"{"title": "空问卷"}"#).unwrap();
        assert!(survey.questions.is_empty());
        assert_eq!(survey.estimated_time, 5);
    }

    #[test]
    fn unknown_type_tag_is_an_error() {
        assert!(
            serde_json::from_str::<Question>(r#"{"id": 1, "type": "排序题", "text": "x"}"#)
                .is_err()
        );
    }

    #[test]
    fn display_number_only_serialized_when_present() {
        let q: Question =
            serde_json::from_str(r#"{"id": 3, "type": "开放式问题", "text": "想法？"}"#).unwrap();
        let bare = serde_json::to_value(&q).unwrap();
        assert!(bare.get("displayNumber").is_none());

        let mut numbered = q;
        numbered.display_number = Some(1);
        let value = serde_json::to_value(&numbered).unwrap();
        assert_eq!(value["displayNumber"], 1);
    }
}
