//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

use crate::selector::SelectError;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("regex error: {0}")]
	Regex(#[from] regex::Error),
	#[error("directory walk error: {0}")]
	WalkDir(#[from] walkdir::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	/// A filter or identifier matches nothing.
	#[error("{0}")]
	NotFound(String),
	/// More than one catalog entry matches after all tie-breaks.
	#[error("{0}")]
	Ambiguity(String),
	/// Two sources supply incompatible non-empty values.
	#[error("{0}")]
	Conflict(String),
	/// No layer combination satisfies the interface demands.
	#[error("{0}")]
	Capacity(crate::layer_resolver::ConnectionsFailure),
	/// The resolved component set has unmet dependencies.
	#[error("dependency validation failed for {} component(s)", .0.len())]
	Validation(Vec<crate::dependency::ValidationResult>),
	#[error("{0}")]
	AccessSequence(#[from] crate::access_sequence::AccessSequenceError),
}

impl From<SelectError> for Error {
	fn from(value: SelectError) -> Self {
		match value {
			SelectError::Ambiguous { .. } => Error::Ambiguity(value.to_string()),
			SelectError::NoMatch { .. }
			| SelectError::VersionNotFound { .. }
			| SelectError::HigherVersionNotFound { .. } => Error::NotFound(value.to_string()),
		}
	}
}
