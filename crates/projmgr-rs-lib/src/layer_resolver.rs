//! Finding compatible layer combinations from their provided and consumed interfaces.
//!
//! # Usage
//! 1. Group candidate layers into a [`ConnectionsCollectionMap`] by layer type.
//! 1. Collect the always present collections (project, explicit layers).
//! 1. [`solve()`] returns the maximal valid layer choices, or the union of every reason none works.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

mod combinations;
pub use combinations::get_all_combinations;
pub use combinations::get_all_select_combinations;
pub use combinations::remove_redundant_subsets;

mod validation;
pub use validation::validate_connect_items;
pub use validation::parse_number;
pub use validation::ConnectionsValidationResult;
pub use validation::Incompatibility;
pub use validation::IncompatibleReason;

/// One declared capability: interfaces provided and consumed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConnectItem {
	pub connect: String,
	pub info: String,
	/// `(interface, value)`, an empty value announces presence only.
	pub provides: Vec<(String, String)>,
	/// `(interface, value)`, a `+N` value is an additive demand.
	pub consumes: Vec<(String, String)>,
}

/// Everything one file (layer or project) contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsCollection {
	pub filename: String,
	pub layer_type: String,
	pub connections: Vec<ConnectItem>,
}

/// Layer type to the candidate layers of that type, in declaration order.
pub type ConnectionsCollectionMap = BTreeMap<String, Vec<ConnectionsCollection>>;

/// Validates the complete contribution of `collections`.
pub fn validate_connections(collections: &[&ConnectionsCollection]) -> ConnectionsValidationResult {
	let items: Vec<&ConnectItem> = collections.iter().flat_map(|c| c.connections.iter()).collect();
	validate_connect_items(&items)
}

/// Why no combination of candidate layers validates, accumulated over every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsFailure {
	pub conflicts: Vec<String>,
	pub overflows: Vec<(String, String)>,
	pub incompatibles: Vec<Incompatibility>,
}

impl ConnectionsFailure {
	fn absorb(&mut self, result: ConnectionsValidationResult) {
		for conflict in result.conflicts {
			if !self.conflicts.contains(&conflict) {
				self.conflicts.push(conflict);
			}
		}
		for overflow in result.overflows {
			if !self.overflows.contains(&overflow) {
				self.overflows.push(overflow);
			}
		}
		for incompatible in result.incompatibles {
			if !self.incompatibles.contains(&incompatible) {
				self.incompatibles.push(incompatible);
			}
		}
	}

	/// One line per reason, for diagnostics.
	pub fn reasons(&self) -> Vec<String> {
		let mut reasons = vec![];
		for conflict in &self.conflicts {
			reasons.push(format!("provided connection '{}' has conflicting values", conflict));
		}
		for (name, detail) in &self.overflows {
			reasons.push(format!("sum of required values exceeds provided for '{}': {}", name, detail));
		}
		for incompatible in &self.incompatibles {
			reasons.push(incompatible.to_string());
		}
		reasons
	}
}

impl std::fmt::Display for ConnectionsFailure {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "no valid combination of layers was found")?;
		for reason in self.reasons() {
			write!(f, "\n  {}", reason)?;
		}
		Ok(())
	}
}

/// Finds the maximal valid choices of candidate layers.
///
/// `fixed` collections take part in every attempt with all their items.
/// Within one pick of a layer per category every non-empty subset of the picked layers' items is tried,
/// a picked layer counts as chosen when one of its items is in the subset or it has no items at all.
/// Each result lists the chosen candidates only, without any candidates the single result is empty.
pub fn solve<'a>(
	fixed: &[&ConnectionsCollection],
	candidates: &'a ConnectionsCollectionMap,
) -> Result<Vec<Vec<&'a ConnectionsCollection>>, ConnectionsFailure> {
	let fixed_items: Vec<&ConnectItem> = fixed.iter().flat_map(|c| c.connections.iter()).collect();

	let mut valid: Vec<Vec<&ConnectionsCollection>> = vec![];
	let mut failure = ConnectionsFailure::default();

	for combination in get_all_combinations(candidates) {
		let selectable: Vec<(usize, &ConnectItem)> = combination.iter()
			.enumerate()
			.flat_map(|(i, c)| c.connections.iter().map(move |item| (i, item)))
			.collect();

		let attempts: Vec<Vec<&(usize, &ConnectItem)>> = if selectable.is_empty() {
			vec![vec![]]
		} else {
			get_all_select_combinations(&selectable)
		};

		for attempt in attempts {
			let members: Vec<&ConnectionsCollection> = combination.iter()
				.enumerate()
				.filter(|(i, c)| c.connections.is_empty() || attempt.iter().any(|(owner, _)| owner == i))
				.map(|(_, c)| *c)
				.collect();

			let mut items = fixed_items.clone();
			items.extend(attempt.iter().map(|(_, item)| *item));

			let result = validate_connect_items(&items);
			if result.valid {
				log::trace!("valid layer combination: {:?}", members.iter().map(|m| &m.filename).collect::<Vec<_>>());
				valid.push(members);
			} else {
				failure.absorb(result);
			}
		}
	}

	if valid.is_empty() {
		if candidates.values().all(|c| c.is_empty()) {
			/* nothing to choose, only the fixed collections decide */
			let result = validate_connect_items(&fixed_items);
			if result.valid {
				return Ok(vec![vec![]])
			}
			failure.absorb(result);
		}
		return Err(failure)
	}

	Ok(remove_redundant_subsets(valid))
}
