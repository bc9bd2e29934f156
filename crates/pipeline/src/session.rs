//! Interactive chat session: one transcript, many questions.

use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::transcript::Transcript;

/// Sample questions offered to new users.
pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "Compare rice production in Punjab and Haryana",
    "Rainfall trends in Maharashtra over last 5 years",
    "Which state produces most wheat?",
    "Cotton production statistics in Gujarat",
    "District-wise crop production in Karnataka",
];

/// Look up an example by its 1-based position.
pub fn example_question(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|i| EXAMPLE_QUESTIONS.get(i))
        .copied()
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `question` through the pipeline and record the exchange.
    ///
    /// The answer is recorded even when it is an error message.
    pub async fn ask(&mut self, pipeline: &Pipeline, question: &str) -> PipelineOutcome {
        let outcome = pipeline.process(question).await;
        self.transcript
            .record_exchange(question, outcome.answer.as_str());
        outcome
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_lookup_is_one_based() {
        assert_eq!(example_question(1), Some(EXAMPLE_QUESTIONS[0]));
        assert_eq!(example_question(5), Some("District-wise crop production in Karnataka"));
        assert_eq!(example_question(0), None);
        assert_eq!(example_question(6), None);
    }
}
