use crate::context::LayerDescription;
use crate::layer_resolver::{self, ConnectionsCollection, ConnectionsCollectionMap};
use crate::paths;
use crate::precedence;

use super::ContextProcessor;

impl<'a, 'db> ContextProcessor<'a, 'db> {
	/// Candidate layers fitting the resolved board and device.
	fn matching_candidate_layers(&mut self) -> Vec<&'a LayerDescription> {
		let description = self.description;
		let mut matching = vec![];
		for layer in &description.candidate_layers {
			if precedence::check_board_device_in_layer(&self.context.board, &self.context.device, &layer.for_board, &layer.for_device) {
				matching.push(layer);
			} else {
				let message = format!("layer skipped, it doesn't fit board '{}' and device '{}'", self.context.board, self.context.device);
				self.diags.info_at(&layer.path, message);
			}
		}
		matching
	}

	/// Every maximal set of candidate layers whose connections validate together with the project and the explicit layers.
	///
	/// A context without any layers has a single, empty, set and its connections aren't validated.
	pub fn valid_layer_combinations(&mut self) -> crate::Result<Vec<Vec<&'a LayerDescription>>> {
		let description = self.description;
		let candidates = self.matching_candidate_layers();
		if candidates.is_empty() && description.layers.is_empty() {
			log::debug!("context {}: no layers, connections are not checked", description.name);
			return Ok(vec![vec![]])
		}

		let mut map = ConnectionsCollectionMap::new();
		for layer in &candidates {
			map.entry(layer.layer_type.clone()).or_default().push(layer.connections_collection());
		}

		let project = ConnectionsCollection {
			filename: description.name.clone(),
			layer_type: String::new(),
			connections: description.connections.clone(),
		};
		let explicit: Vec<ConnectionsCollection> = description.layers.iter().map(|l| l.connections_collection()).collect();
		let fixed: Vec<&ConnectionsCollection> = std::iter::once(&project).chain(explicit.iter()).collect();

		match layer_resolver::solve(&fixed, &map) {
			Ok(solutions) => {
				let combinations: Vec<Vec<&'a LayerDescription>> = solutions.iter()
					.map(|members| members.iter()
						.filter_map(|m| candidates.iter().copied().find(|l| l.path.display().to_string() == m.filename))
						.collect())
					.collect();
				log::debug!("context {}: {} valid layer combination(s)", description.name, combinations.len());
				Ok(combinations)
			}
			Err(failure) => Err(self.fail(crate::Error::Capacity(failure))),
		}
	}

	/// Chooses candidate layers, the first valid combination whose components resolve and validate wins.
	///
	/// When every combination fails, the error and diagnostics of the last attempt are kept.
	pub fn process_layers(&mut self) -> crate::Result<()> {
		let description = self.description;
		let mut combinations = self.valid_layer_combinations()?;
		if combinations.is_empty() {
			combinations.push(vec![]);
		}
		let count = combinations.len();

		let mut last_failure = None;
		for (i, chosen) in combinations.into_iter().enumerate() {
			self.active_layers = description.layers.iter().chain(chosen.into_iter()).collect();

			let saved = std::mem::take(&mut self.diags);
			let result = self.process_layer_attempt();
			let attempt = std::mem::replace(&mut self.diags, saved);

			match result {
				Ok(()) => {
					self.diags.append(attempt);
					self.record_layers();
					return Ok(())
				}
				Err(e) => {
					log::debug!("layer combination {} of {} rejected: {}", i + 1, count, e);
					last_failure = Some((e, attempt));
				}
			}
		}

		match last_failure {
			Some((e, attempt)) => {
				self.diags.append(attempt);
				Err(e)
			}
			None => Ok(()),
		}
	}

	fn process_layer_attempt(&mut self) -> crate::Result<()> {
		self.process_components()?;
		self.validate_context()
	}

	/// Records the active layers and sets `<Type>-Layer` for each typed one.
	fn record_layers(&mut self) {
		let project_dir = self.project_dir();
		self.context.layers = self.active_layers.iter().map(|l| l.path.clone()).collect();
		for layer in &self.active_layers {
			if layer.layer_type.is_empty() {
				continue;
			}
			let path = paths::relative_to(project_dir.join(&layer.path), project_dir);
			log::debug!("{}-Layer is {}", layer.layer_type, path);
			self.context.variables.insert(format!("{}-Layer", layer.layer_type), path);
		}
	}
}
