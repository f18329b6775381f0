//! Structured, severity tagged messages.
//!
//! Wording is part of the observable contract, downstream tooling pattern-matches on it.

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Error,
	Warning,
	Info,
}

impl std::fmt::Display for Severity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Severity::Error => write!(f, "error"),
			Severity::Warning => write!(f, "warning"),
			Severity::Info => write!(f, "info"),
		}
	}
}

impl From<Severity> for log::Level {
	fn from(value: Severity) -> Self {
		match value {
			Severity::Error => log::Level::Error,
			Severity::Warning => log::Level::Warn,
			Severity::Info => log::Level::Info,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub severity: Severity,
	pub message: String,
	/// File the message refers to, printed as a prefix.
	pub path: Option<String>,
}

impl std::fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if let Some(path) = &self.path {
			write!(f, "{} - ", path)?;
		}
		write!(f, "{} csolution: {}", self.severity, self.message)
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
	entries: Vec<Diagnostic>,
}

impl Diagnostics {
	pub fn push(&mut self, diagnostic: Diagnostic) {
		log::log!(diagnostic.severity.into(), "{}", diagnostic);
		self.entries.push(diagnostic);
	}

	pub fn error(&mut self, message: impl Into<String>) {
		self.push(Diagnostic { severity: Severity::Error, message: message.into(), path: None });
	}

	pub fn warning(&mut self, message: impl Into<String>) {
		self.push(Diagnostic { severity: Severity::Warning, message: message.into(), path: None });
	}

	pub fn info(&mut self, message: impl Into<String>) {
		self.push(Diagnostic { severity: Severity::Info, message: message.into(), path: None });
	}

	pub fn warning_at(&mut self, path: impl AsRef<std::path::Path>, message: impl Into<String>) {
		self.push(Diagnostic { severity: Severity::Warning, message: message.into(), path: Some(path.as_ref().display().to_string()) });
	}

	pub fn info_at(&mut self, path: impl AsRef<std::path::Path>, message: impl Into<String>) {
		self.push(Diagnostic { severity: Severity::Info, message: message.into(), path: Some(path.as_ref().display().to_string()) });
	}

	/// Moves every entry of `other` into `self` without logging them a second time.
	pub fn append(&mut self, other: Diagnostics) {
		self.entries.extend(other.entries);
	}

	pub fn entries(&self) -> &[Diagnostic] {
		&self.entries
	}

	pub fn has_errors(&self) -> bool {
		self.entries.iter().any(|d| d.severity == Severity::Error)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Checks if any rendered entry contains `text`.
	pub fn contains(&self, text: &str) -> bool {
		self.entries.iter().any(|d| d.to_string().contains(text))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
		self.entries.iter()
	}
}
