use crate::context::{LayerDescription, ResolvedComponent};
use crate::dependency;
use crate::metadb::*;
use crate::selector::{self, SelectError};

use super::ContextProcessor;

impl<'a, 'db> ContextProcessor<'a, 'db> {
	/// Components of the loaded packs.
	fn available_components(&self) -> Vec<&'db ComponentInfo> {
		self.packs.iter().flat_map(|p| p.components.iter()).collect()
	}

	/// Selects a component for every request of the project and the active layers.
	///
	/// Starts over from the packages of device and board, so it can run once per layer combination.
	pub fn process_components(&mut self) -> crate::Result<()> {
		self.context.packages = self.target_packages.clone();
		self.context.components.clear();
		self.selected.clear();

		let available = self.available_components();
		let requests: Vec<(&'a str, Option<&'a LayerDescription>)> = self.description.components.iter()
			.map(|r| (r.as_str(), None))
			.chain(self.active_layers.iter().copied().flat_map(|l| l.components.iter().map(move |r| (r.as_str(), Some(l)))))
			.collect();

		let mut errors: Vec<SelectError> = vec![];
		for (request, layer) in requests {
			let component = match selector::select_component(available.iter().copied(), request, &self.context.device_attributes) {
				Ok(c) => c,
				Err(e) => {
					errors.push(e);
					continue;
				}
			};

			let key = component.identifier().to_string();
			if self.context.components.contains_key(&key) {
				log::debug!("component {} requested more than once", key);
				continue;
			}
			log::trace!("'{}' resolved to {}", request, key);
			self.context.packages.insert(component.pack.to_string(), component.pack.clone());
			self.context.components.insert(key, ResolvedComponent {
				request: request.to_string(),
				pack: component.pack.clone(),
				from_layer: layer.map(|l| l.path.clone()),
				generator: component.generator.clone(),
			});
			self.selected.push(component);
		}

		let mut errors = errors.into_iter();
		match errors.next() {
			None => Ok(()),
			Some(first) => {
				self.diags.error(first.to_string());
				for e in errors {
					self.diags.error(e.to_string());
				}
				Err(first.into())
			}
		}
	}

	/// Runs the dependency evaluation over the selected components.
	pub fn validate_context(&mut self) -> crate::Result<()> {
		let available = self.available_components();
		let results = self.worker.evaluator.evaluate(&self.selected, &available, &self.context.device_attributes);
		if !results.is_empty() {
			let mut message = format!("dependency validation for context '{}' failed:", self.description.name);
			for result in &results {
				message.push_str(&format!("\n{:?} {}", result.outcome, result.component));
				for entry in result.dependencies.iter().chain(result.conflicts.iter()) {
					message.push_str(&format!("\n  {}", entry));
				}
			}
			self.diags.error(message);
		}
		self.context.validation_results = results.clone();
		dependency::check_results(results)
	}
}
