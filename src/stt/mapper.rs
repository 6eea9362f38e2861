//! Free-text to command mapping.
//!
//! The upstream transcription is unreliable for two-word discrimination,
//! so matching is a deliberate, inspectable whitelist: exact markers
//! first, then substring containment, affirmative before negative. No
//! similarity scoring — the vocabulary is data (see `VocabularyConfig`)
//! and false positives stay bounded and auditable.

use crate::config::VocabularyConfig;
use crate::events::SpokenCommand;

/// Terminal classification of one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Affirmative,
    Negative,
    Unrecognized,
}

impl CommandResult {
    /// The recognized command, if any.
    pub fn command(self) -> Option<SpokenCommand> {
        match self {
            CommandResult::Affirmative => Some(SpokenCommand::Affirmative),
            CommandResult::Negative => Some(SpokenCommand::Negative),
            CommandResult::Unrecognized => None,
        }
    }
}

/// Trailing punctuation stripped before matching ("two." → "two").
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '"', '\''];

/// Lowercase, trim, and strip trailing punctuation.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .to_string()
}

/// Maps normalized utterances onto the two-command vocabulary.
pub struct CommandMapper {
    affirmative_exact: Vec<String>,
    affirmative_contains: Vec<String>,
    negative_exact: Vec<String>,
    negative_contains: Vec<String>,
}

impl CommandMapper {
    /// Build a mapper from vocabulary data, lowercasing every marker.
    pub fn new(vocabulary: &VocabularyConfig) -> Self {
        let lower = |words: &[String]| -> Vec<String> {
            words.iter().map(|w| w.to_lowercase()).collect()
        };
        Self {
            affirmative_exact: lower(&vocabulary.affirmative_exact),
            affirmative_contains: lower(&vocabulary.affirmative_contains),
            negative_exact: lower(&vocabulary.negative_exact),
            negative_contains: lower(&vocabulary.negative_contains),
        }
    }

    /// Classify one utterance. Deterministic and total.
    pub fn map(&self, text: &str) -> CommandResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return CommandResult::Unrecognized;
        }

        // Exact matches first, affirmative before negative
        if self.affirmative_exact.iter().any(|m| *m == normalized) {
            return CommandResult::Affirmative;
        }
        if self.negative_exact.iter().any(|m| *m == normalized) {
            return CommandResult::Negative;
        }

        // Then substring containment, same precedence
        if self
            .affirmative_contains
            .iter()
            .any(|m| normalized.contains(m.as_str()))
        {
            return CommandResult::Affirmative;
        }
        if self
            .negative_contains
            .iter()
            .any(|m| normalized.contains(m.as_str()))
        {
            return CommandResult::Negative;
        }

        CommandResult::Unrecognized
    }
}

impl Default for CommandMapper {
    fn default() -> Self {
        Self::new(&VocabularyConfig::default())
    }
}
