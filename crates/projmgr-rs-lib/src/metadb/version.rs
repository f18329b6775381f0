use serde::{Serialize, Deserialize};

/// A pack, component or toolchain version.
///
/// # Format
/// `core[-pre_release][+build]`, typically `major.minor.patch`.
/// - `core` is compared segment by segment, digit runs numerically and anything else lexically.
/// - A release sorts after all of its pre-releases.
/// - `build` metadata only takes part as the final tie-break.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
	text: String,
}

impl Version {
	pub fn new(version: &str) -> crate::Result<Self> {
		let version = version.trim();
		if version.is_empty() {
			return Err(crate::Error::Parse("version is empty".to_string()))
		}
		if version.chars().any(char::is_whitespace) {
			return Err(crate::Error::Parse(format!("version '{}' contains whitespace", version)))
		}
		Ok(Self { text: version.to_string() })
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	fn without_build(&self) -> &str {
		self.text.split_once('+').map(|(v, _)| v).unwrap_or(&self.text)
	}

	fn core(&self) -> &str {
		let v = self.without_build();
		v.split_once('-').map(|(core, _)| core).unwrap_or(v)
	}

	fn pre_release(&self) -> Option<&str> {
		self.without_build().split_once('-').map(|(_, pre)| pre)
	}
}

impl Default for Version {
	fn default() -> Self {
		Self { text: "0.0.0".to_string() }
	}
}

impl TryFrom<String> for Version {
	type Error = crate::Error;
	fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(&value) }
}

impl TryFrom<&str> for Version {
	type Error = crate::Error;
	fn try_from(value: &str) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Version> for String {
	fn from(value: Version) -> Self {
		value.text
	}
}

impl std::str::FromStr for Version {
	type Err = crate::Error;
	fn from_str(s: &str) -> Result<Self, Self::Err> { Self::new(s) }
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool {
		self.text == other.text
	}
}

impl std::hash::Hash for Version {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.text.hash(state);
	}
}

/// Splits `s` into its leading run of characters satisfying `pred` and the rest.
fn split_run(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
	let end = s.char_indices()
		.find(|(_, c)| !pred(*c))
		.map(|(i, _)| i)
		.unwrap_or(s.len());
	s.split_at(end)
}

/// Compares two digit runs by value without parsing, so arbitrarily long runs never overflow.
fn cmp_numeric(lhs: &str, rhs: &str) -> std::cmp::Ordering {
	let lhs = lhs.trim_start_matches('0');
	let rhs = rhs.trim_start_matches('0');
	lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

/// Alternates between comparing non-digit runs lexically and digit runs numerically.
/// When one side runs out first it is the lesser.
fn cmp_segments(lhs: &str, rhs: &str) -> std::cmp::Ordering {
	let mut lhs = lhs;
	let mut rhs = rhs;

	while !lhs.is_empty() && !rhs.is_empty() {
		let (l_text, l_rest) = split_run(lhs, |c| !c.is_ascii_digit());
		let (r_text, r_rest) = split_run(rhs, |c| !c.is_ascii_digit());
		match l_text.cmp(r_text) {
			std::cmp::Ordering::Equal => {},
			ord => return ord
		}

		let (l_num, l_rest) = split_run(l_rest, |c| c.is_ascii_digit());
		let (r_num, r_rest) = split_run(r_rest, |c| c.is_ascii_digit());
		match cmp_numeric(l_num, r_num) {
			std::cmp::Ordering::Equal => {},
			ord => return ord
		}

		lhs = l_rest;
		rhs = r_rest;
	}

	lhs.len().cmp(&rhs.len())
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		use std::cmp::Ordering;

		cmp_segments(self.core(), other.core())
			.then_with(|| match (self.pre_release(), other.pre_release()) {
				(None, None) => Ordering::Equal,
				(None, Some(_)) => Ordering::Greater,
				(Some(_), None) => Ordering::Less,
				(Some(l), Some(r)) => cmp_segments(l, r),
			})
			.then_with(|| self.text.cmp(&other.text))
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl std::fmt::Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.text)
	}
}

/// A generic enum to describe a range of versions.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub enum VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone,
{
	#[default] Any,
	Explicit(T),
	MinOnly(T),
	MaxOnly(T),
	MinMax(T, T),
}

impl<T> VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone,
{
	/// When all arguments are `None` will return `Any`
	pub fn new(explicit: Option<T>, min: Option<T>, max: Option<T>) -> crate::Result<VersionBounds<T>> {
		match (explicit, min, max) {
			(None, None, None) => Ok(VersionBounds::Any),
			(None, None, Some(max)) => Ok(VersionBounds::MaxOnly(max)),
			(None, Some(min), None) => Ok(VersionBounds::MinOnly(min)),
			(None, Some(min), Some(max)) => Ok(VersionBounds::MinMax(min, max)),
			(Some(e), None, None) => Ok(VersionBounds::Explicit(e)),
			_ => Err(crate::Error::Parse("Attempted to create bounds with both explicit and min or max version constraint".to_string()))
		}
	}

	pub fn is_version_within(&self, other: &T) -> bool {
		match self {
			VersionBounds::Any => true,
			VersionBounds::Explicit(v) => other == v,
			VersionBounds::MinOnly(min) => other >= min,
			VersionBounds::MaxOnly(max) => other <= max,
			VersionBounds::MinMax(min, max) => min <= other && other <= max,
		}
	}

	/// The smallest version the bounds accept, if any.
	pub fn lower(&self) -> Option<&T> {
		match self {
			VersionBounds::Explicit(v) | VersionBounds::MinOnly(v) | VersionBounds::MinMax(v, _) => Some(v),
			VersionBounds::Any | VersionBounds::MaxOnly(_) => None,
		}
	}

	/// Gets the intersection between the bounds, if no intersection exists returns `None`
	pub fn inner_join(&self, other: &Self) -> Option<Self> {
		let lhs = self.clone();
		let rhs = other.clone();

		match (lhs, rhs) {
			(VersionBounds::Any, r) => Some(r),
			(l, VersionBounds::Any) => Some(l),

			(VersionBounds::Explicit(a), b) => if b.is_version_within(&a) { Some(VersionBounds::Explicit(a)) } else { None },
			(a, VersionBounds::Explicit(b)) => if a.is_version_within(&b) { Some(VersionBounds::Explicit(b)) } else { None },

			(VersionBounds::MinOnly(a), VersionBounds::MinOnly(b)) => Some(VersionBounds::MinOnly(std::cmp::max(a,b))),
			(VersionBounds::MaxOnly(a), VersionBounds::MaxOnly(b)) => Some(VersionBounds::MaxOnly(std::cmp::min(a,b))),

			(VersionBounds::MinOnly(a), VersionBounds::MaxOnly(b)) | (VersionBounds::MaxOnly(b), VersionBounds::MinOnly(a)) => Self::min_max(a, b),

			(VersionBounds::MinOnly(a), VersionBounds::MinMax(b, c)) | (VersionBounds::MinMax(b, c), VersionBounds::MinOnly(a)) => Self::min_max(std::cmp::max(a, b), c),
			(VersionBounds::MaxOnly(a), VersionBounds::MinMax(b, c)) | (VersionBounds::MinMax(b, c), VersionBounds::MaxOnly(a)) => Self::min_max(b, std::cmp::min(a, c)),
			(VersionBounds::MinMax(a, b), VersionBounds::MinMax(c, d)) => Self::min_max(std::cmp::max(a, c), std::cmp::min(b, d)),
		}
	}

	fn min_max(min: T, max: T) -> Option<Self> {
		match min.cmp(&max) {
			std::cmp::Ordering::Less => Some(VersionBounds::MinMax(min, max)),
			std::cmp::Ordering::Equal => Some(VersionBounds::Explicit(min)),
			std::cmp::Ordering::Greater => None,
		}
	}
}

impl VersionBounds<Version> {
	/// Parses the text following `@` in a filter.
	///
	/// `""` any, `1.0.0` exactly, `>=1.0.0` at least, `1.0.0:2.0.0` inclusive range, `:2.0.0` at most.
	pub fn parse(bounds: &str) -> crate::Result<Self> {
		let bounds = bounds.trim();
		if bounds.is_empty() {
			return Ok(VersionBounds::Any)
		}
		if let Some(min) = bounds.strip_prefix(">=") {
			return Ok(VersionBounds::MinOnly(Version::new(min)?))
		}
		match bounds.split_once(':') {
			Some(("", max)) => Ok(VersionBounds::MaxOnly(Version::new(max)?)),
			Some((min, "")) => Ok(VersionBounds::MinOnly(Version::new(min)?)),
			Some((min, max)) => Ok(VersionBounds::MinMax(Version::new(min)?, Version::new(max)?)),
			None => Ok(VersionBounds::Explicit(Version::new(bounds)?)),
		}
	}
}

impl std::fmt::Display for VersionBounds<Version> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			VersionBounds::Any => Ok(()),
			VersionBounds::Explicit(v) => write!(f, "@{}", v),
			VersionBounds::MinOnly(v) => write!(f, "@>={}", v),
			VersionBounds::MaxOnly(v) => write!(f, "@:{}", v),
			VersionBounds::MinMax(min, max) => write!(f, "@{}:{}", min, max),
		}
	}
}

pub type VersionRange = VersionBounds<Version>;

#[cfg(test)]
mod test {
	use super::*;

	fn v(s: &str) -> Version { Version::new(s).unwrap() }

	#[test] fn segments_are_not_compared_lexically() { assert!(v("1.2.4") < v("1.2.10")) }
	#[test] fn short_version_is_lt() { assert!(v("1.2") < v("1.2.3")) }
	#[test] fn identical_are_eq() { assert!(v("6.18.0") == v("6.18.0")) }
	#[test] fn higher_version_is_gt() { assert!(v("0.1.1") < v("0.2.0")) }
	#[test] fn pre_release_is_lt_release() { assert!(v("1.0.0-rc1") < v("1.0.0")) }
	#[test] fn pre_releases_are_ordered() { assert!(v("1.0.0-rc1") < v("1.0.0-rc2")) }
	#[test] fn leading_zeros_tie_break_on_text() { assert!(v("1.01") != v("1.1") && v("1.01").cmp(&v("1.1")) != std::cmp::Ordering::Equal) }
	#[test] fn huge_segments_do_not_overflow() { assert!(v("1.99999999999999999999999") > v("1.2")) }
	#[test] fn empty_is_rejected() { assert!(Version::new("  ").is_err()) }

	#[test]
	fn bounds_are_parsed() {
		assert_eq!(VersionRange::parse("").unwrap(), VersionBounds::Any);
		assert_eq!(VersionRange::parse("2.2.2").unwrap(), VersionBounds::Explicit(v("2.2.2")));
		assert_eq!(VersionRange::parse(">=2.2.2").unwrap(), VersionBounds::MinOnly(v("2.2.2")));
		assert_eq!(VersionRange::parse("1.0.0:2.0.0").unwrap(), VersionBounds::MinMax(v("1.0.0"), v("2.0.0")));
		assert_eq!(VersionRange::parse(":2.0.0").unwrap(), VersionBounds::MaxOnly(v("2.0.0")));
		assert!(VersionRange::parse(">=").is_err());
	}

	#[test]
	fn inner_join() {
		let explicit = VersionBounds::Explicit(v("0.2.0"));
		assert_eq!(explicit.inner_join(&VersionBounds::Any), Some(explicit.clone()));
		assert_eq!(VersionBounds::MinOnly(v("0.1.0")).inner_join(&explicit), Some(explicit.clone()));
		assert_eq!(VersionBounds::MinOnly(v("0.3.0")).inner_join(&explicit), None);
		assert_eq!(
			VersionBounds::MaxOnly(v("2.0.0")).inner_join(&VersionBounds::MinMax(v("1.0.0"), v("3.0.0"))),
			Some(VersionBounds::MinMax(v("1.0.0"), v("2.0.0")))
		);
		assert_eq!(
			VersionBounds::MinOnly(v("2.0.0")).inner_join(&VersionBounds::MaxOnly(v("2.0.0"))),
			Some(VersionBounds::Explicit(v("2.0.0")))
		);
	}
}
