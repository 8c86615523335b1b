use serde::Serialize;

use crate::error::{Error, Result};

/// Transport wrapper around a façade result.
///
/// Success serializes as `{"success": true, "data": ...}`; failure as
/// `{"success": false, "message": "...", "errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// HTTP-style status; not part of the body.
    #[serde(skip)]
    pub status: u16,
}

impl<T: Serialize> Envelope<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
            status: 200,
        }
    }

    pub(crate) fn failure(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(err.public_message()),
            errors: err.details().to_vec(),
            status: err.status(),
        }
    }

    pub(crate) fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(&err),
        }
    }

    pub(crate) fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub(crate) fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
