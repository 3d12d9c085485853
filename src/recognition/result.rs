use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultReason {
    /// The engine recognized something
    Recognized,
    /// Nothing was recognized, or nothing arrived in time
    NoMatch,
}

/// What kind of recognition produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Speech,
    Keyword,
}

/// A recognition result delivered to waiters and listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Unique result identifier
    pub result_id: String,

    pub reason: ResultReason,

    pub result_type: ResultType,

    /// Recognized text, absent for no-match results
    pub text: Option<String>,

    /// Confidence score (0.0 to 1.0), if available
    pub confidence: Option<f32>,

    /// When this result was created
    pub created_at: DateTime<Utc>,
}

impl RecognitionResult {
    /// Build a recognized speech result
    pub fn recognized(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            result_id: uuid::Uuid::new_v4().to_string(),
            reason: ResultReason::Recognized,
            result_type: ResultType::Speech,
            text: Some(text.into()),
            confidence,
            created_at: Utc::now(),
        }
    }

    /// Build a result signifying that nothing was recognized
    pub fn no_match(result_type: ResultType) -> Self {
        Self {
            result_id: uuid::Uuid::new_v4().to_string(),
            reason: ResultReason::NoMatch,
            result_type,
            text: None,
            confidence: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.reason == ResultReason::NoMatch
    }
}

/// Produces synthetic results on behalf of the session
///
/// Called without any session lock held. Must not fail.
pub trait ResultFactory: Send + Sync {
    fn create_no_match(&self, result_type: ResultType) -> RecognitionResult;
}

/// Factory producing plain [`RecognitionResult::no_match`] results
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultFactory;

impl ResultFactory for DefaultResultFactory {
    fn create_no_match(&self, result_type: ResultType) -> RecognitionResult {
        RecognitionResult::no_match(result_type)
    }
}
