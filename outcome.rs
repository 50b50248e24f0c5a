// Operation outcomes and their wire encoding

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{JsonContext, Result};

pub const REASON_NO_SUCH_KEY: &str = "No such key";
pub const REASON_INVALID_ARGUMENTS: &str = "Invalid arguments";
pub const REASON_DATABASE_ERROR: &str = "503 - something went wrong on server side";

/// Result of every store operation, translated 1:1 into a response
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Option<Value>),
    NoSuchKey,
    InvalidArguments,
    DatabaseError,
}

impl Outcome {
    pub fn ok() -> Self {
        Outcome::Success(None)
    }

    pub fn found(value: Value) -> Self {
        Outcome::Success(Some(value))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Fixed reason string for failures
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::NoSuchKey => Some(REASON_NO_SUCH_KEY),
            Outcome::InvalidArguments => Some(REASON_INVALID_ARGUMENTS),
            Outcome::DatabaseError => Some(REASON_DATABASE_ERROR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// Response body: `{"response": "OK"|"ERROR", "value"?: .., "reason"?: ..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub response: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Response {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).json_context("encoding response")
    }

    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).json_context("decoding response")
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        let reason = outcome.reason().map(str::to_string);
        match outcome {
            Outcome::Success(value) => Response {
                response: Status::Ok,
                value,
                reason: None,
            },
            _ => Response {
                response: Status::Error,
                value: None,
                reason,
            },
        }
    }
}
