use thiserror::Error;

use crate::db::models::{OptionSnapshot, QuestionOption};

/// One answer row joined with its question and full option set, as loaded
/// inside the submission transaction.
#[derive(Debug)]
pub(crate) struct AnswerSheetEntry {
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) question_content_html: String,
    pub(crate) options: Vec<QuestionOption>,
}

#[derive(Debug, Error)]
pub(crate) enum GradingError {
    #[error("question {question_id} has no correct option defined")]
    MissingCorrectOption { question_id: String },
}

#[derive(Debug)]
pub(crate) struct GradedAnswer {
    pub(crate) question_id: String,
    /// None means the question was left unanswered.
    pub(crate) is_correct: Option<bool>,
    pub(crate) correct_option_id: String,
    pub(crate) question_snapshot_html: String,
    pub(crate) options_snapshot: Vec<OptionSnapshot>,
}

#[derive(Debug)]
pub(crate) struct GradingOutcome {
    pub(crate) answers: Vec<GradedAnswer>,
    pub(crate) total_correct: i32,
    pub(crate) total_wrong: i32,
    pub(crate) total_unanswered: i32,
}

/// Grade a full answer sheet. Only the final selection of each answer
/// matters; intermediate saves never influence the outcome. Fails on the
/// first question without a correct option so the caller can abort the
/// whole transaction and persist nothing.
pub(crate) fn grade_answer_sheet(
    entries: &[AnswerSheetEntry],
) -> Result<GradingOutcome, GradingError> {
    let mut answers = Vec::with_capacity(entries.len());
    let mut total_correct = 0;
    let mut total_wrong = 0;
    let mut total_unanswered = 0;

    for entry in entries {
        let correct_option =
            entry.options.iter().find(|option| option.is_correct).ok_or_else(|| {
                GradingError::MissingCorrectOption { question_id: entry.question_id.clone() }
            })?;

        let is_correct = match entry.selected_option_id.as_deref() {
            None => {
                total_unanswered += 1;
                None
            }
            Some(selected) if selected == correct_option.id => {
                total_correct += 1;
                Some(true)
            }
            Some(_) => {
                total_wrong += 1;
                Some(false)
            }
        };

        let options_snapshot = entry
            .options
            .iter()
            .map(|option| OptionSnapshot {
                id: option.id.clone(),
                content_html: option.content_html.clone(),
                is_correct: option.is_correct,
            })
            .collect();

        answers.push(GradedAnswer {
            question_id: entry.question_id.clone(),
            is_correct,
            correct_option_id: correct_option.id.clone(),
            question_snapshot_html: entry.question_content_html.clone(),
            options_snapshot,
        });
    }

    Ok(GradingOutcome { answers, total_correct, total_wrong, total_unanswered })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(question_id: &str, id: &str, is_correct: bool, order_no: i32) -> QuestionOption {
        QuestionOption {
            id: id.to_string(),
            question_id: question_id.to_string(),
            content_html: format!("<p>option {id}</p>"),
            is_correct,
            order_no,
        }
    }

    /// Three questions with three options each; `correct` marks which
    /// position holds the right answer.
    fn entry(question_no: usize, correct: usize, selected: Option<usize>) -> AnswerSheetEntry {
        let question_id = format!("q{question_no}");
        let options = (1..=3)
            .map(|position| {
                option(
                    &question_id,
                    &format!("q{question_no}-o{position}"),
                    position == correct,
                    position as i32,
                )
            })
            .collect();

        AnswerSheetEntry {
            selected_option_id: selected.map(|position| format!("q{question_no}-o{position}")),
            question_content_html: format!("<p>question {question_no}</p>"),
            question_id,
            options,
        }
    }

    #[test]
    fn tallies_correct_wrong_and_unanswered() {
        // Correct options at positions {2, 2, 1}; user picks {2, 3, 1}.
        let entries =
            vec![entry(1, 2, Some(2)), entry(2, 2, Some(3)), entry(3, 1, Some(1))];

        let outcome = grade_answer_sheet(&entries).expect("grading");

        assert_eq!(outcome.total_correct, 2);
        assert_eq!(outcome.total_wrong, 1);
        assert_eq!(outcome.total_unanswered, 0);
        assert_eq!(outcome.answers[0].is_correct, Some(true));
        assert_eq!(outcome.answers[1].is_correct, Some(false));
        assert_eq!(outcome.answers[2].is_correct, Some(true));
    }

    #[test]
    fn unanswered_question_is_counted_separately() {
        let entries = vec![entry(1, 2, Some(2)), entry(2, 2, None), entry(3, 1, Some(1))];

        let outcome = grade_answer_sheet(&entries).expect("grading");

        assert_eq!(outcome.total_correct, 2);
        assert_eq!(outcome.total_wrong, 0);
        assert_eq!(outcome.total_unanswered, 1);
        assert_eq!(outcome.answers[1].is_correct, None);
    }

    #[test]
    fn empty_sheet_grades_to_zero_tallies() {
        let outcome = grade_answer_sheet(&[]).expect("grading");

        assert!(outcome.answers.is_empty());
        assert_eq!(outcome.total_correct, 0);
        assert_eq!(outcome.total_wrong, 0);
        assert_eq!(outcome.total_unanswered, 0);
    }

    #[test]
    fn missing_correct_option_fails_with_question_id() {
        let mut broken = entry(2, 1, Some(1));
        for option in &mut broken.options {
            option.is_correct = false;
        }
        let entries = vec![entry(1, 1, Some(1)), broken];

        let err = grade_answer_sheet(&entries).expect_err("must fail");
        match err {
            GradingError::MissingCorrectOption { question_id } => {
                assert_eq!(question_id, "q2");
            }
        }
    }

    #[test]
    fn snapshot_captures_full_option_set() {
        let entries = vec![entry(1, 3, Some(1))];

        let outcome = grade_answer_sheet(&entries).expect("grading");
        let graded = &outcome.answers[0];

        assert_eq!(graded.correct_option_id, "q1-o3");
        assert_eq!(graded.question_snapshot_html, "<p>question 1</p>");
        assert_eq!(graded.options_snapshot.len(), 3);
        assert!(graded.options_snapshot[2].is_correct);
        assert!(!graded.options_snapshot[0].is_correct);
        assert_eq!(graded.options_snapshot[0].content_html, "<p>option q1-o1</p>");
    }

    #[test]
    fn regrading_same_sheet_is_deterministic() {
        let entries = vec![entry(1, 2, Some(3)), entry(2, 1, None)];

        let first = grade_answer_sheet(&entries).expect("grading");
        let second = grade_answer_sheet(&entries).expect("grading");

        assert_eq!(first.total_correct, second.total_correct);
        assert_eq!(first.total_wrong, second.total_wrong);
        assert_eq!(first.total_unanswered, second.total_unanswered);
    }
}
