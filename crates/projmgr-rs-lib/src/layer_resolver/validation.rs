use indexmap::IndexMap;
use serde::{Serialize, Deserialize};

use super::ConnectItem;

/// Why a consumed interface can't be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncompatibleReason {
	/// Nothing provides the interface at all.
	NoProvider,
	/// A quantity is consumed from a provider that only announces presence.
	PresenceOnlyProvider,
	/// No provider offers the exact value asked for.
	ValueMismatch,
	/// The consumed or provided value is not a number.
	NotNumeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incompatibility {
	pub name: String,
	/// The consumed value, additive demands as their `+<sum>`.
	pub value: String,
	pub reason: IncompatibleReason,
}

impl std::fmt::Display for Incompatibility {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.reason {
			IncompatibleReason::NoProvider => write!(f, "'{}' is consumed but not provided", self.name),
			IncompatibleReason::PresenceOnlyProvider => write!(f, "'{}' consumes '{}' from a provider without value", self.name, self.value),
			IncompatibleReason::ValueMismatch => write!(f, "'{}' consumes '{}' but no provider offers that value", self.name, self.value),
			IncompatibleReason::NotNumeric => write!(f, "'{}' has a non numeric value '{}'", self.name, self.value),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsValidationResult {
	pub valid: bool,
	/// Interfaces provided more than once with differing values, in first-provided order.
	pub conflicts: Vec<String>,
	/// `(name, "<consumed> > <provided>")`
	pub overflows: Vec<(String, String)>,
	/// In consumption order.
	pub incompatibles: Vec<Incompatibility>,
}

impl ConnectionsValidationResult {
	/// `(name, consumed value)` pairs of the incompatibles.
	pub fn incompatible_pairs(&self) -> Vec<(String, String)> {
		self.incompatibles.iter().map(|i| (i.name.clone(), i.value.clone())).collect()
	}
}

/// `123` or `0x7B`.
pub fn parse_number(value: &str) -> Option<u64> {
	let value = value.trim();
	match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
		Some(hex) => u64::from_str_radix(hex, 16).ok(),
		None => value.parse().ok(),
	}
}

/// Checks one candidate set of connect items.
///
/// - An interface provided more than once must always carry the same value.
/// - Additive demands (`+N`) of one interface are summed and may not exceed the provided number.
/// - Any other non-empty demand must equal one of the provided values.
/// - An empty demand only needs a provider.
pub fn validate_connect_items(items: &[&ConnectItem]) -> ConnectionsValidationResult {
	let mut result = ConnectionsValidationResult::default();

	/* every value provided per interface, in provision order */
	let mut provided: IndexMap<&str, Vec<&str>> = IndexMap::new();
	for (name, value) in items.iter().flat_map(|i| i.provides.iter()) {
		let values = provided.entry(name.as_str()).or_default();
		if let Some(first) = values.first() {
			if *first != value.as_str() && !result.conflicts.contains(name) {
				result.conflicts.push(name.clone());
			}
		}
		values.push(value.as_str());
	}

	let consumed: Vec<(&str, &str)> = items.iter()
		.flat_map(|i| i.consumes.iter())
		.map(|(n, v)| (n.as_str(), v.as_str()))
		.collect();

	let mut summed: Vec<&str> = vec![];
	for (name, value) in &consumed {
		let incompatible = |value: String, reason| Incompatibility { name: name.to_string(), value, reason };

		if value.starts_with('+') {
			if summed.contains(name) {
				continue;
			}
			summed.push(*name);

			let mut sum: u64 = 0;
			let mut numeric = true;
			for (_, v) in consumed.iter().filter(|(n, _)| n == name) {
				match v.strip_prefix('+').and_then(parse_number) {
					Some(n) => sum = sum.saturating_add(n),
					None => if !v.starts_with('+') { continue } else { numeric = false },
				}
			}
			if !numeric {
				result.incompatibles.push(incompatible(value.to_string(), IncompatibleReason::NotNumeric));
				continue;
			}

			let demand = format!("+{}", sum);
			match provided.get(name).and_then(|v| v.first()) {
				None => result.incompatibles.push(incompatible(demand, IncompatibleReason::NoProvider)),
				Some(p) if p.is_empty() => result.incompatibles.push(incompatible(demand, IncompatibleReason::PresenceOnlyProvider)),
				Some(p) => match parse_number(p) {
					None => result.incompatibles.push(incompatible(demand, IncompatibleReason::NotNumeric)),
					Some(capacity) if sum > capacity => result.overflows.push((name.to_string(), format!("{} > {}", sum, p))),
					Some(_) => {}
				},
			}
			continue;
		}

		match provided.get(name) {
			None => result.incompatibles.push(incompatible(value.to_string(), IncompatibleReason::NoProvider)),
			Some(_) if value.is_empty() => {}
			Some(values) if values.contains(value) => {}
			Some(values) if values.iter().all(|v| v.is_empty()) => {
				result.incompatibles.push(incompatible(value.to_string(), IncompatibleReason::PresenceOnlyProvider))
			}
			Some(_) => result.incompatibles.push(incompatible(value.to_string(), IncompatibleReason::ValueMismatch)),
		}
	}

	result.valid = result.conflicts.is_empty() && result.overflows.is_empty() && result.incompatibles.is_empty();
	result
}

#[cfg(test)]
mod test {
	use super::*;

	fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
		list.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
	}

	fn item(provides: &[(&str, &str)], consumes: &[(&str, &str)]) -> ConnectItem {
		ConnectItem { provides: pairs(provides), consumes: pairs(consumes), ..Default::default() }
	}

	#[test]
	fn satisfied_connections_are_valid() {
		let valid = item(
			&[("Orange", "3"), ("Grape Fruit", "999"), ("Peach", ""), ("Lemon", "200"), ("Lime", "100")],
			&[("Orange", "3"), ("Grape Fruit", ""), ("Peach", ""), ("Lime", "+98"), ("Lime", "+2"), ("Lemon", "+150"), ("Lemon", "+20")],
		);
		let result = validate_connect_items(&[&valid]);
		assert!(result.valid, "{:?}", result);
	}

	#[test]
	fn conflicts_overflows_and_incompatibles() {
		let invalid = item(
			&[
				("Ananas", "97"), ("Grape Fruit", ""), ("Lemon", "160"),
				("Ananas", "2"), ("Ananas", "2"),
				("Orange", "3"), ("Orange", "4"),
				("Banana", ""), ("Banana", "0"),
			],
			&[("Lemon", "+150"), ("Lemon", "+20"), ("Ananas", "98"), ("Grape Fruit", "1")],
		);
		let result = validate_connect_items(&[&invalid]);
		assert!(!result.valid);
		assert_eq!(result.conflicts, vec!["Ananas", "Orange", "Banana"]);
		assert_eq!(result.overflows, pairs(&[("Lemon", "170 > 160")]));
		assert_eq!(result.incompatible_pairs(), pairs(&[("Ananas", "98"), ("Grape Fruit", "1")]));
		assert_eq!(result.incompatibles[0].reason, IncompatibleReason::ValueMismatch);
		assert_eq!(result.incompatibles[1].reason, IncompatibleReason::PresenceOnlyProvider);
	}

	#[test]
	fn demands_span_items() {
		let provider = item(&[("SPI", ""), ("Heap", "0x100")], &[]);
		let first = item(&[], &[("SPI", ""), ("Heap", "+200")]);
		let second = item(&[], &[("Heap", "+100")]);
		let result = validate_connect_items(&[&provider, &first, &second]);
		assert_eq!(result.overflows, pairs(&[("Heap", "300 > 0x100")]));

		let result = validate_connect_items(&[&first]);
		assert_eq!(result.incompatible_pairs(), pairs(&[("SPI", ""), ("Heap", "+200")]));
		assert!(result.incompatibles.iter().all(|i| i.reason == IncompatibleReason::NoProvider));
	}
}
