use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::access_sequence::{self, AccessSequenceError, SequenceFunctions};
use crate::context::{Directories, GeneratorOptions, LayerDescription};
use crate::paths;

use super::ContextProcessor;

/// Directory of a generator without any configured location, relative to the project.
pub const DEFAULT_GENERATOR_DIR: &str = "generated";

/// `project.build+target` into its three parts, missing parts are empty.
fn split_context_name(name: &str) -> (&str, &str, &str) {
	let (rest, target) = name.split_once('+').unwrap_or((name, ""));
	let (project, build) = rest.split_once('.').unwrap_or((rest, ""));
	(project, build, target)
}

/// `SolutionDir()`, `ProjectDir(context)` and `OutDir(context)`.
///
/// A context argument may leave out parts, they are taken from the current context.
pub struct ContextFunctions<'c> {
	solution_dir: &'c Path,
	current: &'c str,
	contexts: &'c BTreeMap<String, Directories>,
}

impl<'c> ContextFunctions<'c> {
	pub fn new(solution_dir: &'c Path, current: &'c str, contexts: &'c BTreeMap<String, Directories>) -> Self {
		Self { solution_dir, current, contexts }
	}

	fn directories(&self, reference: &str, sequence: &str) -> Result<&'c Directories, AccessSequenceError> {
		let (project, build, target) = split_context_name(reference);
		let (current_project, current_build, current_target) = split_context_name(self.current);
		fn pick<'s>(given: &'s str, current: &'s str) -> &'s str {
			if given.is_empty() { current } else { given }
		}

		let mut name = pick(project, current_project).to_string();
		let build = pick(build, current_build);
		if !build.is_empty() {
			name.push('.');
			name.push_str(build);
		}
		let target = pick(target, current_target);
		if !target.is_empty() {
			name.push('+');
			name.push_str(target);
		}

		self.contexts.get(&name).ok_or_else(|| AccessSequenceError::Function(format!(
			"context '{}' referenced by access sequence '{}' does not exist or is not selected", name, sequence
		)))
	}
}

impl SequenceFunctions for ContextFunctions<'_> {
	fn evaluate(&self, function: &str, argument: &str) -> Result<Option<String>, AccessSequenceError> {
		let dir = match function {
			"SolutionDir" => self.solution_dir.to_path_buf(),
			"ProjectDir" => self.directories(argument, &format!("{}({})", function, argument))?.project.clone(),
			"OutDir" => self.directories(argument, &format!("{}({})", function, argument))?.output_dir(),
			_ => return Ok(None),
		};
		Ok(Some(paths::to_forward_slashes(&dir)))
	}
}

impl<'a, 'db> ContextProcessor<'a, 'db> {
	/// Working directory of generator `id`, relative to the project directory.
	///
	/// The first configured location wins: custom option of layer, project, solution,
	/// then base directory of layer, project, solution, then [`DEFAULT_GENERATOR_DIR`].
	/// Base directories get the generator id appended, custom options are taken as they are.
	pub fn get_generator_dir(&self, id: &str, layer: Option<&LayerDescription>) -> crate::Result<String> {
		let description = self.description;
		let project_dir = self.project_dir();
		let solution_dir = description.directories.solution.as_path();

		let mut scopes: Vec<(&GeneratorOptions, PathBuf)> = vec![];
		if let Some(layer) = layer {
			scopes.push((&layer.generators, self.layer_dir(layer)));
		}
		scopes.push((&description.generators, project_dir.to_path_buf()));
		scopes.push((&description.solution_generators, solution_dir.to_path_buf()));

		let custom = scopes.iter()
			.find_map(|(options, base)| options.options.get(id).filter(|o| !o.is_empty()).map(|o| (o.as_str(), base.clone(), false)));
		let base_dir = || scopes.iter()
			.find(|(options, _)| !options.base_dir.is_empty())
			.map(|(options, base)| (options.base_dir.as_str(), base.clone(), true));
		let (template, base, append_id) = custom
			.or_else(base_dir)
			.unwrap_or((DEFAULT_GENERATOR_DIR, project_dir.to_path_buf(), true));

		let functions = ContextFunctions::new(solution_dir, &description.name, self.contexts);
		let expanded = access_sequence::expand(template, &self.context.variables, &functions, false)?;

		let mut dir = base.join(expanded);
		if append_id {
			dir.push(id);
		}
		Ok(paths::relative_to(paths::normalize(&dir), project_dir))
	}

	/// Records the working directory of every generator used by the selected components.
	pub fn process_generators(&mut self) -> crate::Result<()> {
		let generators: Vec<(String, Option<PathBuf>)> = self.context.components.values()
			.filter_map(|c| c.generator.clone().map(|g| (g, c.from_layer.clone())))
			.collect();

		for (id, from_layer) in generators {
			let layer = from_layer.as_ref().and_then(|path| self.active_layers.iter().copied().find(|l| &l.path == path));
			match self.get_generator_dir(&id, layer) {
				Ok(dir) => {
					log::debug!("generator {} works in {}", id, dir);
					self.context.generators.insert(id, dir);
				}
				Err(e) => return Err(self.fail(e)),
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use crate::config::ProjMgrOptions;
	use crate::context::*;
	use crate::metadb::MetaDB;
	use crate::worker::ProjMgrWorker;
	use super::*;

	fn options(base_dir: &str, id: &str, option: &str) -> GeneratorOptions {
		GeneratorOptions {
			base_dir: base_dir.to_string(),
			options: if option.is_empty() { BTreeMap::new() } else { BTreeMap::from([(id.to_string(), option.to_string())]) },
		}
	}

	fn directories(project: &str) -> Directories {
		Directories { solution: PathBuf::from("/solution"), project: PathBuf::from(project), output: PathBuf::from("out"), ..Default::default() }
	}

	fn describe(solution: GeneratorOptions, project: GeneratorOptions) -> ContextDescription {
		ContextDescription {
			name: "project.Debug+CM0".to_string(),
			variables: [("Compiler".to_string(), "AC6".to_string())].into_iter().collect(),
			generators: project,
			solution_generators: solution,
			directories: directories("/solution/project"),
			..Default::default()
		}
	}

	fn layer_with(generators: GeneratorOptions) -> LayerDescription {
		LayerDescription { path: PathBuf::from("LayerDirectory/layer.clayer"), generators, ..Default::default() }
	}

	fn generator_dir(description: &ContextDescription, layer: Option<&LayerDescription>) -> crate::Result<String> {
		let metadb = MetaDB::default();
		let worker = ProjMgrWorker::new(&metadb, ProjMgrOptions::default());
		let contexts = BTreeMap::from([
			(description.name.clone(), description.directories.clone()),
			("other.Debug+CM0".to_string(), directories("/solution/other")),
		]);
		let processor = worker.processor(description, &contexts);
		processor.get_generator_dir("Id", layer)
	}

	#[test]
	fn base_directories() {
		let none = GeneratorOptions::default();

		let description = describe(options("BaseRelativeToSolution", "", ""), none.clone());
		assert_eq!(generator_dir(&description, None).unwrap(), "../BaseRelativeToSolution/Id");

		let description = describe(options("BaseRelativeToSolution", "", ""), options("BaseRelativeToProject", "", ""));
		assert_eq!(generator_dir(&description, None).unwrap(), "BaseRelativeToProject/Id");

		let layer = layer_with(options("BaseRelativeToLayer", "", ""));
		assert_eq!(generator_dir(&description, Some(&layer)).unwrap(), "LayerDirectory/BaseRelativeToLayer/Id");

		let description = describe(options("$SolutionDir()$/$Compiler$", "", ""), none.clone());
		assert_eq!(generator_dir(&description, None).unwrap(), "../AC6/Id");

		let description = describe(none.clone(), none);
		assert_eq!(generator_dir(&description, None).unwrap(), "generated/Id");
	}

	#[test]
	fn custom_options_win() {
		let description = describe(
			options("BaseRelativeToSolution", "Id", "CustomRelativeToSolution"),
			options("BaseRelativeToProject", "", ""),
		);
		assert_eq!(generator_dir(&description, None).unwrap(), "../CustomRelativeToSolution");

		let description = describe(
			options("", "Id", "CustomRelativeToSolution"),
			options("", "Id", "CustomRelativeToProject"),
		);
		assert_eq!(generator_dir(&description, None).unwrap(), "CustomRelativeToProject");

		let layer = layer_with(options("", "Id", "CustomRelativeToLayer"));
		assert_eq!(generator_dir(&description, Some(&layer)).unwrap(), "LayerDirectory/CustomRelativeToLayer");

		let description = describe(options("", "Other", "CustomForOtherGenerator"), GeneratorOptions::default());
		assert_eq!(generator_dir(&description, None).unwrap(), "generated/Id");
	}

	#[test]
	fn context_functions() {
		let description = describe(GeneratorOptions::default(), options("$ProjectDir(other)$/gen", "", ""));
		assert_eq!(generator_dir(&description, None).unwrap(), "../other/gen/Id");

		let description = describe(GeneratorOptions::default(), options("", "Id", "$OutDir()$/gen"));
		assert_eq!(generator_dir(&description, None).unwrap(), "out/gen");

		let description = describe(GeneratorOptions::default(), options("$ProjectDir(unknown)$", "", ""));
		let err = generator_dir(&description, None).unwrap_err();
		assert_eq!(err.to_string(), "context 'unknown.Debug+CM0' referenced by access sequence 'ProjectDir(unknown)' does not exist or is not selected");
	}

	#[test]
	fn context_names_are_completed() {
		let contexts = BTreeMap::from([
			("project.Release+CM0".to_string(), directories("/solution/release")),
		]);
		let functions = ContextFunctions::new(Path::new("/solution"), "project.Debug+CM0", &contexts);
		assert_eq!(functions.evaluate("ProjectDir", ".Release").unwrap(), Some("/solution/release".to_string()));
		assert_eq!(functions.evaluate("SolutionDir", "").unwrap(), Some("/solution".to_string()));
		assert_eq!(functions.evaluate("Unknown", "").unwrap(), None);
		assert!(functions.evaluate("OutDir", "+CM3").is_err());
	}
}
