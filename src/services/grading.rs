// src/services/grading.rs

use std::collections::HashMap;

use crate::models::question::ExamQuestion;

/// Scores a set of answers against a question bank.
///
/// A question earns its full weight when the learner's answer, trimmed and
/// compared case-insensitively, equals the canonical answer. Blank or missing
/// answers earn nothing. The question type plays no part.
///
/// The result is not clamped to the exam's total score.
pub fn auto_grade(answers: &HashMap<i64, String>, questions: &[ExamQuestion]) -> f64 {
    questions
        .iter()
        .filter(|q| {
            answers
                .get(&q.id)
                .is_some_and(|given| is_correct(given, &q.answer))
        })
        .map(|q| q.score)
        .sum()
}

fn is_correct(given: &str, canonical: &str) -> bool {
    let given = given.trim();
    !given.is_empty() && given.to_lowercase() == canonical.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn question(id: i64, answer: &str, score: f64, question_type: QuestionType) -> ExamQuestion {
        ExamQuestion {
            id,
            exam_id: 1,
            title: format!("Question {}", id),
            question_type,
            content: None,
            options: None,
            answer: answer.to_string(),
            score,
            sort_order: id as i32,
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, a)| (*id, a.to_string())).collect()
    }

    #[test]
    fn test_grade_ignores_case_and_whitespace() {
        let bank = vec![question(1, "a", 10.0, QuestionType::SingleChoice)];

        assert_eq!(auto_grade(&answers(&[(1, " a ")]), &bank), 10.0);
        assert_eq!(auto_grade(&answers(&[(1, "A")]), &bank), 10.0);
        assert_eq!(auto_grade(&answers(&[(1, "b")]), &bank), 0.0);
    }

    #[test]
    fn test_grade_sums_weights_without_partial_credit() {
        let bank = vec![
            question(1, "A", 40.0, QuestionType::SingleChoice),
            question(2, "A,C", 60.0, QuestionType::MultipleChoice),
        ];

        assert_eq!(auto_grade(&answers(&[(1, "A"), (2, "A,C")]), &bank), 100.0);
        // Half of a multiple-choice answer is still wrong.
        assert_eq!(auto_grade(&answers(&[(1, "A"), (2, "A")]), &bank), 40.0);
    }

    #[test]
    fn test_grade_blank_and_unknown_answers() {
        let bank = vec![
            question(1, "true", 5.0, QuestionType::TrueFalse),
            question(2, "Sun", 15.0, QuestionType::FillBlank),
        ];

        let given = answers(&[(1, "   "), (99, "Sun")]);
        assert_eq!(auto_grade(&given, &bank), 0.0);
        assert_eq!(auto_grade(&HashMap::new(), &bank), 0.0);
        assert_eq!(auto_grade(&answers(&[(2, "sun")]), &[]), 0.0);
    }

    #[test]
    fn test_grade_is_order_independent() {
        let bank = vec![
            question(1, "A", 10.0, QuestionType::SingleChoice),
            question(2, "false", 5.0, QuestionType::TrueFalse),
            question(3, "Sun", 15.0, QuestionType::FillBlank),
            question(4, "B,D", 20.0, QuestionType::MultipleChoice),
        ];
        let given = answers(&[(1, "a"), (2, "FALSE"), (3, "moon"), (4, "b,d")]);

        let expected = auto_grade(&given, &bank);
        assert_eq!(expected, 35.0);

        let mut reversed = bank.clone();
        reversed.reverse();
        assert_eq!(auto_grade(&given, &reversed), expected);

        let mut rotated = bank.clone();
        rotated.rotate_left(2);
        assert_eq!(auto_grade(&given, &rotated), expected);
    }

    #[test]
    fn test_grade_is_not_clamped() {
        let bank = vec![
            question(1, "A", 80.0, QuestionType::SingleChoice),
            question(2, "B", 80.0, QuestionType::SingleChoice),
        ];
        assert_eq!(auto_grade(&answers(&[(1, "A"), (2, "B")]), &bank), 160.0);
    }
}
