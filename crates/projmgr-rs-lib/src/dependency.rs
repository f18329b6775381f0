//! Dependency validation of a resolved component set.
//!
//! Evaluation sits behind [`DependencyEvaluator`], the worker only aggregates the verdicts.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::metadb::*;
use crate::metadb::iterator::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationOutcome {
	Fulfilled,
	/// A required component exists in the loaded packs but isn't selected.
	Selectable,
	/// A required component isn't available at all.
	Missing,
	/// A denied component is selected.
	Conflict,
}

/// Verdict for one selected component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
	pub outcome: ValidationOutcome,
	/// Full identifier of the validated component.
	pub component: String,
	/// `require <expression>` for every unmet requirement.
	pub dependencies: BTreeSet<String>,
	/// `deny <expression>` for every violated exclusion.
	pub conflicts: BTreeSet<String>,
}

pub trait DependencyEvaluator: Send + Sync {
	/// Returns the verdict of every component of `selected` that isn't fulfilled.
	///
	/// `available` holds the components of the loaded packs.
	fn evaluate(&self, selected: &[&ComponentInfo], available: &[&ComponentInfo], attributes: &DeviceAttributes) -> Vec<ValidationResult>;
}

/// Evaluates the `requires` and `denies` expressions carried by the components.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaDbDependencyEvaluator;

impl DependencyEvaluator for MetaDbDependencyEvaluator {
	fn evaluate(&self, selected: &[&ComponentInfo], available: &[&ComponentInfo], attributes: &DeviceAttributes) -> Vec<ValidationResult> {
		let mut results = vec![];

		for component in selected {
			let mut outcome = ValidationOutcome::Fulfilled;
			let mut dependencies = BTreeSet::new();
			let mut conflicts = BTreeSet::new();

			for expression in &component.requires {
				let id = ComponentIdentifier::parse(expression);
				if selected.iter().any(|c| c.matches_expression(&id)) {
					continue;
				}
				let selectable = available.iter()
					.copied()
					.visible_for(attributes)
					.any(|c| c.matches_expression(&id));
				outcome = outcome.max(if selectable { ValidationOutcome::Selectable } else { ValidationOutcome::Missing });
				dependencies.insert(format!("require {}", expression));
			}

			for expression in &component.denies {
				let id = ComponentIdentifier::parse(expression);
				let denied = selected.iter()
					.filter(|c| !std::ptr::eq(**c, *component))
					.any(|c| c.matches_expression(&id));
				if denied {
					outcome = ValidationOutcome::Conflict;
					conflicts.insert(format!("deny {}", expression));
				}
			}

			if outcome != ValidationOutcome::Fulfilled {
				log::debug!("component {} is {:?}", component.identifier(), outcome);
				results.push(ValidationResult {
					outcome,
					component: component.identifier().to_string(),
					dependencies,
					conflicts,
				});
			}
		}

		results
	}
}

/// Fails when any verdict is not fulfilled.
pub fn check_results(results: Vec<ValidationResult>) -> crate::Result<()> {
	if results.iter().any(|r| r.outcome != ValidationOutcome::Fulfilled) {
		Err(crate::Error::Validation(results))
	} else {
		Ok(())
	}
}
