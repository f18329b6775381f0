//! `$Name$` and `$Func(arg)$` placeholder expansion.
//!
//! Substituted text is written to the output and never scanned again,
//! so a value referring to itself can't cause an endless expansion.

use indexmap::IndexMap;

/// Variable mapping consulted by the expander.
pub type Variables = IndexMap<String, String>;

pub const DELIMITER: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessSequenceError {
	/// An opening delimiter without a matching closing one.
	#[error("access sequence '{0}' is not terminated")]
	Unterminated(String),
	/// Only raised when the caller requires every sequence to resolve.
	#[error("access sequence '{0}' could not be resolved")]
	Unresolved(String),
	#[error("{0}")]
	Function(String),
}

/// Evaluates the `Func(arg)` form of a sequence.
pub trait SequenceFunctions {
	/// `Ok(None)` when `function` is not known to this evaluator.
	fn evaluate(&self, function: &str, argument: &str) -> Result<Option<String>, AccessSequenceError>;
}

/// Evaluator knowing no functions at all.
pub struct NoFunctions;

impl SequenceFunctions for NoFunctions {
	fn evaluate(&self, _function: &str, _argument: &str) -> Result<Option<String>, AccessSequenceError> {
		Ok(None)
	}
}

/// Finds the next `open ... close` token starting at or after `offset`.
///
/// Returns the token text and the offset just past the closing delimiter,
/// `Ok(None)` when no opening delimiter is left.
/// When `open` and `close` differ nesting is honoured, `Func(a(b))` yields `a(b)`.
/// # Errors
/// - [`Unterminated`](AccessSequenceError::Unterminated) when the closing delimiter is missing.
pub fn get_access_sequence(src: &str, offset: usize, open: char, close: char) -> Result<Option<(String, usize)>, AccessSequenceError> {
	Ok(find_sequence(src, offset, open, close)?.map(|(_, sequence, next)| (sequence, next)))
}

/// Same as [`get_access_sequence()`] but also reports where the opening delimiter was found.
fn find_sequence(src: &str, offset: usize, open: char, close: char) -> Result<Option<(usize, String, usize)>, AccessSequenceError> {
	let Some(rest) = src.get(offset..) else { return Ok(None) };
	let Some(start) = rest.find(open).map(|i| i + offset) else { return Ok(None) };
	let body_start = start + open.len_utf8();

	let end = if open == close {
		src[body_start..].find(close).map(|i| i + body_start)
	} else {
		let mut depth = 0usize;
		let mut found = None;
		for (i, c) in src[body_start..].char_indices() {
			if c == open {
				depth += 1;
			} else if c == close {
				if depth == 0 {
					found = Some(i + body_start);
					break;
				}
				depth -= 1;
			}
		}
		found
	};

	match end {
		Some(end) => Ok(Some((start, src[body_start..end].to_string(), end + close.len_utf8()))),
		None => Err(AccessSequenceError::Unterminated(src[start..].to_string())),
	}
}

/// Expands every `$...$` sequence of `src`.
///
/// Unknown names are kept as written unless `strict` is set.
/// A `Func(arg)` sequence expands `arg` first and then hands it to `functions`.
pub fn expand(src: &str, variables: &Variables, functions: &dyn SequenceFunctions, strict: bool) -> Result<String, AccessSequenceError> {
	let mut out = String::with_capacity(src.len());
	let mut offset = 0;

	while let Some((start, sequence, next)) = find_sequence(src, offset, DELIMITER, DELIMITER)? {
		out.push_str(&src[offset..start]);

		match resolve_sequence(&sequence, variables, functions, strict)? {
			Some(value) => out.push_str(&value),
			None if strict => return Err(AccessSequenceError::Unresolved(sequence)),
			None => out.push_str(&src[start..next]),
		}
		offset = next;
	}

	out.push_str(&src[offset..]);
	Ok(out)
}

fn resolve_sequence(sequence: &str, variables: &Variables, functions: &dyn SequenceFunctions, strict: bool) -> Result<Option<String>, AccessSequenceError> {
	if let Some(value) = variables.get(sequence) {
		return Ok(Some(value.clone()));
	}

	if sequence.ends_with(')') {
		if let Some(paren) = sequence.find('(') {
			let name = &sequence[..paren];
			let argument = match get_access_sequence(sequence, paren, '(', ')')? {
				Some((arg, _)) => expand(&arg, variables, functions, strict)?,
				None => String::new(),
			};
			return functions.evaluate(name, &argument);
		}
	}

	Ok(None)
}

/// Lenient variable-only expansion.
///
/// Malformed input is returned unchanged with a warning, the failure stays local to this string.
pub fn expand_string(src: &str, variables: &Variables) -> String {
	match expand(src, variables, &NoFunctions, false) {
		Ok(s) => s,
		Err(e) => {
			log::warn!("leaving '{}' unexpanded: {}", src, e);
			src.to_string()
		}
	}
}
