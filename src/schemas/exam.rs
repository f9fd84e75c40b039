use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Exam;
use crate::db::types::ExamStatus;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[serde(alias = "contentHtml")]
    #[validate(length(min = 1, message = "content_html must not be empty"))]
    pub(crate) content_html: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "contentHtml")]
    #[validate(length(min = 1, message = "content_html must not be empty"))]
    pub(crate) content_html: String,
    #[serde(default = "default_section_type")]
    #[serde(alias = "sectionType")]
    pub(crate) section_type: String,
    #[validate(length(min = 2, message = "a question needs at least two options"))]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
}

fn default_section_type() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeLimitSeconds")]
    #[validate(range(min = 1, message = "time_limit_seconds must be positive"))]
    pub(crate) time_limit_seconds: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApproveAccessRequest {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) time_limit_seconds: Option<i32>,
    pub(crate) status: ExamStatus,
    pub(crate) created_by: String,
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) question_count: i64,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: &Exam, question_count: i64) -> Self {
        Self {
            id: exam.id.clone(),
            title: exam.title.clone(),
            description: exam.description.clone(),
            time_limit_seconds: exam.time_limit_seconds,
            status: exam.status,
            created_by: exam.created_by.clone(),
            published_at: exam.published_at.map(format_primitive),
            created_at: format_primitive(exam.created_at),
            question_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exam_id: String,
    pub(crate) status: crate::db::types::AccessStatus,
    pub(crate) updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(content: &str, is_correct: bool) -> OptionCreate {
        OptionCreate { content_html: content.to_string(), is_correct }
    }

    #[test]
    fn question_needs_at_least_two_options() {
        let mut question = QuestionCreate {
            content_html: "<p>q</p>".to_string(),
            section_type: "general".to_string(),
            options: vec![option("<p>only</p>", true)],
        };
        assert!(question.validate().is_err());

        question.options.push(option("<p>second</p>", false));
        assert!(question.validate().is_ok());
    }

    #[test]
    fn nested_option_errors_surface_on_the_exam() {
        let exam = ExamCreate {
            title: "History".to_string(),
            description: None,
            time_limit_seconds: Some(600),
            questions: vec![QuestionCreate {
                content_html: "<p>q</p>".to_string(),
                section_type: "general".to_string(),
                options: vec![option("", true), option("<p>b</p>", false)],
            }],
        };
        assert!(exam.validate().is_err());
    }
}
