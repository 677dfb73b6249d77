//! Interactive questions asked while restoring a snapshot.
use dialoguer::{Confirm, Input};

pub trait Prompter {
    /// Yes/no question; defaults to yes.
    fn confirm(&self, question: &str) -> bool;
    /// Free-text question; may return an empty string.
    fn input(&self, question: &str) -> String;
}

/// Asks on the controlling terminal. A prompt that cannot be shown (no
/// terminal, interrupted) counts as "no" or an empty answer.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> bool {
        Confirm::new()
            .with_prompt(question)
            .default(true)
            .interact()
            .unwrap_or(false)
    }

    fn input(&self, question: &str) -> String {
        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .map(|answer| answer.trim().to_string())
            .unwrap_or_default()
    }
}

/// Non-interactive prompter for `start --yes`: every confirmation is answered
/// with `answer` and free-text questions get an empty reply.
pub struct AutoPrompter {
    pub answer: bool,
}

impl Prompter for AutoPrompter {
    fn confirm(&self, question: &str) -> bool {
        tracing::debug!(question, answer = self.answer, "auto-answered confirmation");
        self.answer
    }

    fn input(&self, question: &str) -> String {
        tracing::debug!(question, "auto-answered input with blank");
        String::new()
    }
}
