use crate::error::EvaluationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Question difficulty, ordered easy < medium < hard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepted answers for a question: a single string or a non-empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnswerRepr", into = "AnswerRepr")]
pub struct Answer(Vec<String>);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AnswerRepr {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<AnswerRepr> for Answer {
    type Error = EvaluationError;

    fn try_from(repr: AnswerRepr) -> Result<Self, Self::Error> {
        match repr {
            AnswerRepr::One(answer) => Ok(Answer::single(answer)),
            AnswerRepr::Many(answers) => Answer::many(answers),
        }
    }
}

impl From<Answer> for AnswerRepr {
    fn from(answer: Answer) -> Self {
        let mut values = answer.0;
        if values.len() == 1 {
            AnswerRepr::One(values.remove(0))
        } else {
            AnswerRepr::Many(values)
        }
    }
}

impl Answer {
    pub fn single(answer: impl Into<String>) -> Self {
        Self(vec![answer.into()])
    }

    /// Rejects an empty list
    pub fn many<I, S>(answers: I) -> Result<Self, EvaluationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        if answers.is_empty() {
            return Err(EvaluationError::InvalidAnswer(
                "answer list must not be empty".to_string(),
            ));
        }
        Ok(Self(answers))
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

/// A labelled evaluation question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationQuestion {
    pub difficulty: Difficulty,
    pub question: String,
    pub answer: Answer,
}

impl EvaluationQuestion {
    pub fn new(difficulty: Difficulty, question: impl Into<String>, answer: Answer) -> Self {
        Self {
            difficulty,
            question: question.into(),
            answer,
        }
    }
}

/// Normalized, deduplicated set of accepted answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruthSet(BTreeSet<String>);

impl GroundTruthSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.0.insert(value.into())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for GroundTruthSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_question_single_answer() {
        let json = r#"{"difficulty": "easy", "question": "Where is Book?", "answer": "com.acme.Book"}"#;
        let question: EvaluationQuestion = serde_json::from_str(json).unwrap();

        assert_eq!(question.difficulty, Difficulty::Easy);
        assert_eq!(question.answer.values(), ["com.acme.Book".to_string()]);
    }

    #[test]
    fn test_question_answer_list() {
        let json = r#"{"difficulty": "hard", "question": "q", "answer": ["A.java", "B.java"]}"#;
        let question: EvaluationQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(question.answer.values().len(), 2);
    }

    #[test]
    fn test_empty_answer_list_rejected() {
        let json = r#"{"difficulty": "medium", "question": "q", "answer": []}"#;
        assert!(serde_json::from_str::<EvaluationQuestion>(json).is_err());
        assert!(Answer::many(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_unknown_difficulty_rejected() {
        let json = r#"{"difficulty": "extreme", "question": "q", "answer": "a"}"#;
        assert!(serde_json::from_str::<EvaluationQuestion>(json).is_err());
    }

    #[test]
    fn test_answer_serializes_back_to_input_shape() {
        let single = serde_json::to_value(Answer::single("a")).unwrap();
        assert_eq!(single, serde_json::json!("a"));

        let many = serde_json::to_value(Answer::many(["a", "b"]).unwrap()).unwrap();
        assert_eq!(many, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_difficulty_order() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
        assert_eq!(Difficulty::Hard.to_string(), "hard");
    }

    #[test]
    fn test_ground_truth_dedupes() {
        let set: GroundTruthSet = ["a", "b", "a"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }
}
