use serde::{Deserialize, Serialize};
use std::fmt;

/// Mode of recognition, each with its own start/stop pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionKind {
    /// One utterance, one final result
    SingleShot,
    /// Results keep arriving until stopped
    Continuous,
    /// Recognition triggered by a keyword
    Keyword,
}

impl fmt::Display for RecognitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SingleShot => "single-shot",
            Self::Continuous => "continuous",
            Self::Keyword => "keyword",
        };
        f.write_str(label)
    }
}
