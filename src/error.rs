//! Errors surfaced by the store and the query façade.
//!
//! Only [`Validation`] and [`Conflict`] describe problems with caller input.
//! Missing *data* is never an error: read-side computations degrade to empty
//! results instead.
//!
//!  [`Validation`]: Error::Validation
//!  [`Conflict`]: Error::Conflict
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed parameters, rejected before any computation runs. Holds
    /// one message per offending field.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    /// A second budget for an existing `(owner, category, month, year)`.
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Not authorized to {0}")]
    NotAuthorized(String),
    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(vec![msg.into()])
    }

    /// Per-field problems for the `errors` list of an envelope.
    pub fn details(&self) -> &[String] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }

    /// HTTP-style status code for the transport envelope.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Conflict(_) => 400,
            Self::NotAuthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Store(_) => 500,
        }
    }

    /// The message shown to callers. Store internals are not leaked.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_) => "Validation failed".to_string(),
            Self::Store(_) => "Server error while accessing the record store".to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::NotAuthorized(a), Self::NotAuthorized(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
