//! Contact form submission payload accepted by the relay endpoint.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

const MIN_NAME_CHARS: usize = 2;
const MIN_MESSAGE_CHARS: usize = 10;

/// A contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub message: String,
}

impl ContactSubmission {
    /// Check field presence, lengths and email format.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(Error::InvalidInput("name must be at least 2 characters".into()));
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(Error::InvalidInput("invalid email address".into()));
        }
        if self.message.trim().chars().count() < MIN_MESSAGE_CHARS {
            return Err(Error::InvalidInput("message must be at least 10 characters".into()));
        }
        Ok(())
    }
}
