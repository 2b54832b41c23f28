use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PASSING_SCORE: u8 = 70;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceKey {
    #[serde(alias = "A")]
    A,
    #[serde(alias = "B")]
    B,
    #[serde(alias = "C")]
    C,
    #[serde(alias = "D")]
    D,
}

impl ChoiceKey {
    pub const ALL: [ChoiceKey; 4] = [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D];

    pub fn label(&self) -> &'static str {
        match self {
            ChoiceKey::A => "A",
            ChoiceKey::B => "B",
            ChoiceKey::C => "C",
            ChoiceKey::D => "D",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choices {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl Choices {
    pub fn get(&self, key: ChoiceKey) -> &str {
        match key {
            ChoiceKey::A => &self.a,
            ChoiceKey::B => &self.b,
            ChoiceKey::C => &self.c,
            ChoiceKey::D => &self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChoiceKey, &str)> {
        ChoiceKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}

/// Multiple-choice question as produced by the question-generation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub choices: Choices,
    #[serde(alias = "correct_answer", alias = "answer")]
    pub correct_answer: ChoiceKey,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSet(BTreeMap<usize, ChoiceKey>);

impl AnswerSet {
    pub fn get(&self, index: usize) -> Option<ChoiceKey> {
        self.0.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuizError {
    #[error("The quiz has no questions")]
    Empty,
    #[error("Only {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub question: String,
    pub user_answer: ChoiceKey,
    pub correct_answer: ChoiceKey,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
    pub score: u8,
    pub passed: bool,
}

/// `round(100 * correct / total)`, halves rounded up.
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    ((200 * correct + total) / (2 * total)) as u8
}

/// The only place a score is derived. Both the quiz and the results screen go
/// through here, from stored per-question correctness.
pub fn summarize(results: &[QuizResult]) -> ScoreSummary {
    let total = results.len();
    let correct = results.iter().filter(|r| r.is_correct).count();
    let score = score_percent(correct, total);
    ScoreSummary {
        correct,
        total,
        score,
        passed: total > 0 && score >= PASSING_SCORE,
    }
}

/// Linear pager over a generated question set.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: AnswerSet,
    current: usize,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            questions,
            answers: AnswerSet::default(),
            current: 0,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    pub fn select(&mut self, key: ChoiceKey) {
        self.answers.0.insert(self.current, key);
    }

    pub fn next(&mut self) {
        if !self.is_last() {
            self.current += 1;
        }
    }

    pub fn prev(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn go_to(&mut self, index: usize) {
        if index < self.questions.len() {
            self.current = index;
        }
    }

    pub fn can_submit(&self) -> bool {
        self.answered_count() == self.total()
    }

    pub fn submit(&self) -> Result<Vec<QuizResult>, QuizError> {
        if !self.can_submit() {
            return Err(QuizError::Incomplete {
                answered: self.answered_count(),
                total: self.total(),
            });
        }

        let mut results = Vec::with_capacity(self.questions.len());
        for (index, question) in self.questions.iter().enumerate() {
            let user_answer = self.answers.get(index).ok_or(QuizError::Incomplete {
                answered: self.answered_count(),
                total: self.total(),
            })?;
            results.push(QuizResult {
                question: question.question.clone(),
                user_answer,
                correct_answer: question.correct_answer,
                is_correct: user_answer == question.correct_answer,
            });
        }
        Ok(results)
    }
}

/// Active question set for a course, written by the completion handoff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizDraft {
    pub course_id: String,
    pub course_title: String,
    pub questions: Vec<Question>,
}

/// Last submitted attempt, read by the results screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizRecord {
    pub course_id: String,
    pub course_title: String,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<QuizResult>,
}

impl QuizRecord {
    pub fn summary(&self) -> ScoreSummary {
        summarize(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, correct: ChoiceKey) -> Question {
        Question {
            question: text.to_string(),
            choices: Choices {
                a: "Report it to compliance".into(),
                b: "Ignore it".into(),
                c: "Post it online".into(),
                d: "Ask a colleague to handle it".into(),
            },
            correct_answer: correct,
        }
    }

    fn five_questions() -> Vec<Question> {
        (0..5).map(|i| question(&format!("Q{}", i + 1), ChoiceKey::A)).collect()
    }

    fn answer_all(session: &mut QuizSession, keys: &[ChoiceKey]) {
        session.go_to(0);
        for key in keys {
            session.select(*key);
            session.next();
        }
    }

    #[test]
    fn test_four_of_five_passes() {
        let mut session = QuizSession::new(five_questions()).unwrap();
        answer_all(&mut session, &[ChoiceKey::A, ChoiceKey::A, ChoiceKey::A, ChoiceKey::A, ChoiceKey::B]);
        let summary = summarize(&session.submit().unwrap());
        assert_eq!(summary, ScoreSummary { correct: 4, total: 5, score: 80, passed: true });
    }

    #[test]
    fn test_three_of_five_fails() {
        let mut session = QuizSession::new(five_questions()).unwrap();
        answer_all(&mut session, &[ChoiceKey::A, ChoiceKey::C, ChoiceKey::A, ChoiceKey::A, ChoiceKey::D]);
        let summary = summarize(&session.submit().unwrap());
        assert_eq!(summary.score, 60);
        assert!(!summary.passed);
    }

    #[test]
    fn test_score_rounding() {
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(7, 10), 70);
        assert_eq!(score_percent(0, 0), 0);
        assert_eq!(score_percent(9, 9), 100);
    }

    #[test]
    fn test_pass_boundary() {
        let results = |correct: usize, total: usize| -> Vec<QuizResult> {
            (0..total)
                .map(|i| QuizResult {
                    question: format!("Q{i}"),
                    user_answer: ChoiceKey::A,
                    correct_answer: ChoiceKey::A,
                    is_correct: i < correct,
                })
                .collect()
        };
        assert!(summarize(&results(7, 10)).passed);
        assert!(!summarize(&results(69, 100)).passed);
        // 0.695 rounds to 70
        assert!(summarize(&results(139, 200)).passed);
        assert!(!summarize(&[]).passed);
    }

    #[test]
    fn test_submit_rejected_until_all_answered() {
        let mut session = QuizSession::new(five_questions()).unwrap();
        answer_all(&mut session, &[ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D]);
        assert!(!session.can_submit());
        assert_eq!(session.submit(), Err(QuizError::Incomplete { answered: 4, total: 5 }));

        session.go_to(4);
        session.select(ChoiceKey::A);
        assert!(session.can_submit());
        assert_eq!(session.submit().unwrap().len(), 5);
    }

    #[test]
    fn test_changing_an_answer_keeps_count() {
        let mut session = QuizSession::new(five_questions()).unwrap();
        session.select(ChoiceKey::B);
        session.select(ChoiceKey::A);
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.answers().get(0), Some(ChoiceKey::A));
    }

    #[test]
    fn test_pager_bounds() {
        let mut session = QuizSession::new(five_questions()).unwrap();
        session.prev();
        assert!(session.is_first());
        for _ in 0..10 {
            session.next();
        }
        assert!(session.is_last());
        assert_eq!(session.current_index(), 4);
        session.go_to(42);
        assert_eq!(session.current_index(), 4);
    }

    #[test]
    fn test_empty_quiz_is_rejected() {
        assert_eq!(QuizSession::new(vec![]), Err(QuizError::Empty));
    }

    #[test]
    fn test_record_summary_matches_submit() {
        let mut session = QuizSession::new(five_questions()).unwrap();
        answer_all(&mut session, &[ChoiceKey::A, ChoiceKey::A, ChoiceKey::C, ChoiceKey::A, ChoiceKey::A]);
        let results = session.submit().unwrap();
        let at_submit = summarize(&results);

        let record = QuizRecord {
            course_id: "c1".into(),
            course_title: "Anti-Bribery Basics".into(),
            completed_at: Utc::now(),
            results,
        };
        let stored = serde_json::to_string(&record).unwrap();
        let reloaded: QuizRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(reloaded.summary(), at_submit);
    }

    #[test]
    fn test_generated_question_formats() {
        let json = r#"{
            "question": "What should you do with a suspicious gift?",
            "choices": {"a": "Accept", "b": "Report", "c": "Resell", "d": "Hide"},
            "correctAnswer": "B"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_answer, ChoiceKey::B);
        assert_eq!(q.choices.get(ChoiceKey::B), "Report");

        let json = r#"{"question": "Q", "choices": {"a": "1", "b": "2", "c": "3", "d": "4"}, "correct_answer": "d"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_answer, ChoiceKey::D);
    }
}
