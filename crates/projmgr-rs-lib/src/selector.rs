//! Version aware selection of catalog entries from partial, possibly wildcarded filters.
//!
//! # Policy
//! 1. Candidates are narrowed to those matching the filter's identity fields.
//! 1. The filter's version bounds are applied.
//! 1. Candidates matching the filter exactly, with no loosely matched field, are preferred.
//! 1. The highest version wins.
//! 1. Entries sharing a full identity collapse into one.
//!
//! Whatever remains must be a single entry, anything else is an ambiguity and never broken arbitrarily.

use std::collections::{BTreeMap, HashSet};
use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::metadb::*;
use crate::metadb::iterator::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
	#[error("no match found for {kind} filter: {filter}")]
	NoMatch { kind: String, filter: String },
	#[error("no match found for {kind} filter: {filter}")]
	VersionNotFound { kind: String, filter: String },
	#[error("higher {kind} version not found for filter: {filter}")]
	HigherVersionNotFound { kind: String, filter: String },
	#[error("multiple {kind}s were found for identifier '{filter}'")]
	Ambiguous { kind: String, filter: String, candidates: Vec<String> },
}

/// Turns a `*`/`?` wildcard pattern into an anchored regex.
pub fn wildcard_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
	let escaped = regex::escape(pattern)
		.replace(r"\*", ".*")
		.replace(r"\?", ".");
	Regex::new(&format!("^{}$", escaped))
}

pub fn is_wildcard(pattern: &str) -> bool {
	pattern.contains('*') || pattern.contains('?')
}

/// Matches `value` against a pattern that may contain wildcards.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
	if !is_wildcard(pattern) {
		return pattern == value
	}
	match wildcard_to_regex(pattern) {
		Ok(re) => re.is_match(value),
		Err(e) => {
			log::warn!("invalid wildcard pattern '{}': {}", pattern, e);
			false
		}
	}
}

/// One identity field of a filter.
#[derive(Debug, Clone)]
pub enum FieldPattern {
	/// The filter left the field empty.
	Any,
	Exact(String),
	Wildcard(Regex),
}

impl FieldPattern {
	pub fn new(filter: &str) -> Result<Self, regex::Error> {
		if filter.is_empty() || filter == "*" {
			Ok(FieldPattern::Any)
		} else if is_wildcard(filter) {
			Ok(FieldPattern::Wildcard(wildcard_to_regex(filter)?))
		} else {
			Ok(FieldPattern::Exact(filter.to_string()))
		}
	}

	pub fn matches(&self, value: &str) -> bool {
		match self {
			FieldPattern::Any => true,
			FieldPattern::Exact(s) => s == value,
			FieldPattern::Wildcard(re) => re.is_match(value),
		}
	}
}

/// Catalog entries the selection policy can rank.
pub trait Selectable {
	/// Full identity, version excluded.
	fn selection_identity(&self) -> String;
	fn selection_version(&self) -> &Version;
}

impl Selectable for PackInfo {
	fn selection_identity(&self) -> String { self.identifier().family() }
	fn selection_version(&self) -> &Version { &self.version }
}

impl Selectable for ComponentInfo {
	fn selection_identity(&self) -> String {
		ComponentIdentifier { version: String::new(), ..self.identifier() }.to_string()
	}
	fn selection_version(&self) -> &Version { &self.version }
}

impl Selectable for DeviceInfo {
	fn selection_identity(&self) -> String { format!("{}::{}", self.vendor_name(), self.name) }
	fn selection_version(&self) -> &Version { &self.pack.version }
}

impl Selectable for BoardInfo {
	fn selection_identity(&self) -> String { self.identifier() }
	fn selection_version(&self) -> &Version { &self.pack.version }
}

/// Applies the selection policy to `candidates`, which already match the filter's identity fields.
///
/// `is_exact` tells if a candidate matched every field of the filter exactly.
pub fn select_by_policy<'a, T: Selectable>(
	kind: &str,
	filter: &str,
	candidates: Vec<&'a T>,
	bounds: &VersionRange,
	is_exact: impl Fn(&T) -> bool,
) -> Result<&'a T, SelectError> {
	if candidates.is_empty() {
		return Err(SelectError::NoMatch { kind: kind.to_string(), filter: filter.to_string() })
	}

	let within: Vec<&T> = candidates.iter()
		.copied()
		.filter(|c| bounds.is_version_within(c.selection_version()))
		.collect();
	if within.is_empty() {
		let all_below = bounds.lower()
			.map(|lower| candidates.iter().all(|c| c.selection_version() < lower))
			.unwrap_or(false);
		return Err(if all_below {
			SelectError::HigherVersionNotFound { kind: kind.to_string(), filter: filter.to_string() }
		} else {
			SelectError::VersionNotFound { kind: kind.to_string(), filter: filter.to_string() }
		})
	}

	let exact: Vec<&T> = within.iter().copied().filter(|c| is_exact(c)).collect();
	let preferred = if exact.is_empty() { within } else { exact };

	let Some(highest) = preferred.iter().map(|c| c.selection_version()).max().cloned() else {
		return Err(SelectError::NoMatch { kind: kind.to_string(), filter: filter.to_string() })
	};

	let mut seen = HashSet::new();
	let remaining: Vec<&T> = preferred.into_iter()
		.filter(|c| c.selection_version() == &highest)
		.filter(|c| seen.insert(c.selection_identity()))
		.collect();

	match remaining.as_slice() {
		[single] => Ok(*single),
		_ => Err(SelectError::Ambiguous {
			kind: kind.to_string(),
			filter: filter.to_string(),
			candidates: remaining.iter().map(|c| c.selection_identity()).collect(),
		}),
	}
}

/// A pack filter, `Vendor[::Name][@bounds]` where vendor and name may use wildcards.
#[derive(Debug, Clone)]
pub struct PackFilter {
	pub text: String,
	pub vendor: String,
	pub name: String,
	pub bounds: VersionRange,
}

impl PackFilter {
	pub fn parse(filter: &str) -> crate::Result<Self> {
		let (identity, bounds) = filter.split_once('@').unwrap_or((filter, ""));
		let (vendor, name) = identity.split_once("::").unwrap_or((identity, ""));
		Ok(Self {
			text: filter.to_string(),
			vendor: vendor.to_string(),
			name: name.to_string(),
			bounds: VersionRange::parse(bounds)?,
		})
	}

	/// Names one pack family with neither wildcard nor missing name.
	pub fn is_exact(&self) -> bool {
		!self.vendor.is_empty() && !self.name.is_empty() && !is_wildcard(&self.vendor) && !is_wildcard(&self.name)
	}

	pub fn matching<'a>(&self, packs: &'a [PackInfo]) -> Result<Vec<&'a PackInfo>, regex::Error> {
		let vendor = FieldPattern::new(&self.vendor)?;
		let name = FieldPattern::new(&self.name)?;
		Ok(packs.iter().filter(|p| vendor.matches(&p.vendor) && name.matches(&p.name)).collect())
	}
}

/// Latest pack of every family in `packs`, families in first-seen order.
fn latest_per_family<'a>(packs: impl IntoIterator<Item = &'a PackInfo>) -> Vec<&'a PackInfo> {
	let mut latest: indexmap::IndexMap<String, &PackInfo> = indexmap::IndexMap::new();
	for pack in packs {
		let entry = latest.entry(pack.identifier().family()).or_insert(pack);
		if pack.version > entry.version {
			*entry = pack;
		}
	}
	latest.into_values().collect()
}

/// Resolves the pack filters of a project into the packs to load.
///
/// - No filters: the latest pack of every family, or every pack when `latest_when_unfiltered` is off.
/// - `Vendor` alone or a wildcard name: the latest matching pack of every matching family.
/// - An exact `Vendor::Name`: selected by policy, repeated filters for the same family are intersected.
///
/// Any failing filter fails the whole load, nothing is returned in that case.
pub fn load_packs<'a>(metadb: &'a MetaDB, filters: &[String], latest_when_unfiltered: bool, diags: &mut Diagnostics) -> crate::Result<Vec<&'a PackInfo>> {
	let packs = metadb.packs();

	let mut loaded: Vec<&PackInfo> = if filters.is_empty() {
		if latest_when_unfiltered {
			latest_per_family(packs)
		} else {
			packs.iter().collect()
		}
	} else {
		let mut exact: BTreeMap<(String, String), PackFilter> = BTreeMap::new();
		let mut loose = vec![];
		for text in filters {
			let filter = PackFilter::parse(text)?;
			if !filter.is_exact() {
				loose.push(filter);
				continue;
			}
			let key = (filter.vendor.clone(), filter.name.clone());
			match exact.get_mut(&key) {
				Some(existing) => {
					let Some(joined) = existing.bounds.inner_join(&filter.bounds) else {
						let e = crate::Error::Conflict(format!("pack filters '{}' and '{}' have no version in common", existing.text, filter.text));
						diags.error(e.to_string());
						return Err(e)
					};
					existing.bounds = joined;
				}
				None => { exact.insert(key, filter); }
			}
		}

		let mut loaded = vec![];
		for filter in exact.values().chain(loose.iter()) {
			let candidates = filter.matching(packs)?;
			if candidates.is_empty() {
				let e = SelectError::NoMatch { kind: "pack".to_string(), filter: filter.text.clone() };
				diags.error(e.to_string());
				return Err(e.into())
			}
			if filter.is_exact() {
				match select_by_policy("pack", &filter.text, candidates, &filter.bounds, |_| true) {
					Ok(pack) => loaded.push(pack),
					Err(e) => {
						diags.error(e.to_string());
						return Err(e.into())
					}
				}
			} else {
				let within: Vec<&PackInfo> = candidates.into_iter().version_matches(filter.bounds.clone()).collect();
				if within.is_empty() {
					let e = SelectError::VersionNotFound { kind: "pack".to_string(), filter: filter.text.clone() };
					diags.error(e.to_string());
					return Err(e.into())
				}
				loaded.extend(latest_per_family(within));
			}
		}
		loaded
	};

	let mut seen = HashSet::new();
	loaded.retain(|p| seen.insert(p.identifier()));
	loaded.sort_by_key(|p| p.identifier());

	for pack in &loaded {
		log::debug!("Loading pack {}", pack.identifier());
	}
	Ok(loaded)
}

/// Picks one component for `request` among the components visible for the device.
///
/// An empty variant in the request selects the default variant, falling back to the
/// component without variant.
pub fn select_component<'a>(
	components: impl IntoIterator<Item = &'a ComponentInfo>,
	request: &str,
	attributes: &DeviceAttributes,
) -> Result<&'a ComponentInfo, SelectError> {
	let no_match = || SelectError::NoMatch { kind: "component".to_string(), filter: request.to_string() };

	let id = ComponentIdentifier::parse(request);
	let bounds = VersionRange::parse(&id.version).map_err(|_| no_match())?;
	let fields = [&id.vendor, &id.class, &id.bundle, &id.group, &id.sub, &id.variant]
		.map(|f| FieldPattern::new(f));
	let [Ok(vendor), Ok(class), Ok(bundle), Ok(group), Ok(sub), Ok(variant)] = fields else {
		return Err(no_match())
	};

	let mut candidates: Vec<&ComponentInfo> = components.into_iter()
		.visible_for(attributes)
		.filter(|c| vendor.matches(&c.vendor) && class.matches(&c.class) && bundle.matches(&c.bundle)
			&& group.matches(&c.group) && sub.matches(&c.sub) && variant.matches(&c.variant))
		.collect();

	if id.variant.is_empty() {
		candidates = prefer_default_variants(candidates);
	}

	let exact = |c: &ComponentInfo| {
		c.class == id.class && c.bundle == id.bundle && c.group == id.group && c.sub == id.sub
			&& (id.variant.is_empty() || c.variant == id.variant)
	};
	select_by_policy("component", request, candidates, &bounds, exact)
}

/// Within each set of variants of one component keeps the default variant,
/// else the one without variant, else all of them.
fn prefer_default_variants(candidates: Vec<&ComponentInfo>) -> Vec<&ComponentInfo> {
	let same_component = |a: &ComponentInfo, b: &ComponentInfo| {
		a.vendor == b.vendor && a.class == b.class && a.bundle == b.bundle && a.group == b.group && a.sub == b.sub
	};
	candidates.iter()
		.copied()
		.filter(|c| {
			let siblings: Vec<&ComponentInfo> = candidates.iter().copied().filter(|o| same_component(o, c)).collect();
			if siblings.iter().any(|o| o.is_default_variant) {
				c.is_default_variant
			} else if siblings.iter().any(|o| o.variant.is_empty()) {
				c.variant.is_empty()
			} else {
				true
			}
		})
		.collect()
}

/// Keeps the entries of `input` containing every non-empty word of `filter`.
pub fn apply_filter<'a, S: AsRef<str>>(input: &[S], filter: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let words: Vec<&str> = filter.into_iter().filter(|w| !w.is_empty()).collect();
	input.iter()
		.map(|s| s.as_ref())
		.filter(|s| words.iter().all(|w| s.contains(w)))
		.map(|s| s.to_string())
		.collect()
}
