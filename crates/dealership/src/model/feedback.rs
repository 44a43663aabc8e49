//! Contact-form feedback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::Validator;

/// A stored feedback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Storage-assigned identifier.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Optional subject line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
    /// When the message was received.
    pub created_at: DateTime<Utc>,
}

/// A validated feedback message ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    /// Sender name.
    pub name: String,
    /// Normalized sender email.
    pub email: String,
    /// Subject line, `None` when blank.
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
}

/// Body of `POST /api/feedback`.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct FeedbackInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl FeedbackInput {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn validate(self) -> Result<NewFeedback> {
        let mut v = Validator::new();
        let name = v.required("name", self.name.as_deref(), "Name is required");
        let email = v.email("email", self.email.as_deref(), "Please include a valid email");
        let message = v.required("message", self.message.as_deref(), "Message is required");
        v.finish()?;

        let subject = self
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => Ok(NewFeedback {
                name,
                email,
                subject,
                message,
            }),
            _ => Err(Error::internal("validator accepted incomplete feedback")),
        }
    }
}
