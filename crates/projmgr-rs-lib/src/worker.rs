//! Resolution of context descriptions into concrete [`Context`]s.
//!
//! # Usage
//! 1. Create a [`ProjMgrWorker`] over a loaded [`MetaDB`].
//! 1. Resolve one description with [`ProjMgrWorker::resolve_context()`], or several in parallel with
//!    [`ProjMgrWorker::resolve_contexts()`].
//!
//! Every phase of a resolution is a method of [`ContextProcessor`] and can be driven on its own,
//! the phases must run in the order [`ContextProcessor::resolve()`] runs them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::ProjMgrOptions;
use crate::context::*;
use crate::dependency::{DependencyEvaluator, MetaDbDependencyEvaluator};
use crate::diagnostics::Diagnostics;
use crate::metadb::*;
use crate::precedence::IdentifierTriple;
use crate::selector;
use crate::toolchain::{self, ToolchainItem};

mod device;
mod components;
mod layers;
mod linker;
mod generator;
pub use linker::RegionsHeaderGenerator;
pub use linker::DefinesRegionsGenerator;
pub use generator::ContextFunctions;

/// Outcome of resolving one context description.
#[derive(Debug)]
pub struct ResolvedContext {
	pub name: String,
	pub result: crate::Result<Context>,
	pub diagnostics: Diagnostics,
}

pub struct ProjMgrWorker<'db> {
	metadb: &'db MetaDB,
	options: ProjMgrOptions,
	/// Discovered once, on first use.
	toolchains: OnceLock<Vec<ToolchainItem>>,
	evaluator: Box<dyn DependencyEvaluator>,
	regions_generator: Box<dyn RegionsHeaderGenerator>,
}

impl<'db> ProjMgrWorker<'db> {
	pub fn new(metadb: &'db MetaDB, options: ProjMgrOptions) -> Self {
		Self {
			metadb,
			options,
			toolchains: OnceLock::new(),
			evaluator: Box::new(MetaDbDependencyEvaluator),
			regions_generator: Box::new(DefinesRegionsGenerator),
		}
	}

	pub fn dependency_evaluator(mut self, evaluator: impl DependencyEvaluator + 'static) -> Self {
		self.evaluator = Box::new(evaluator);
		self
	}

	pub fn regions_generator(mut self, generator: impl RegionsHeaderGenerator + 'static) -> Self {
		self.regions_generator = Box::new(generator);
		self
	}

	pub fn metadb(&self) -> &'db MetaDB {
		self.metadb
	}

	pub fn options(&self) -> &ProjMgrOptions {
		&self.options
	}

	/// Registered toolchains, discovered on the first call.
	pub fn toolchains(&self) -> &[ToolchainItem] {
		self.toolchains.get_or_init(|| {
			let compiler_root = self.options.compiler_root().map(|p| p.as_path());
			match toolchain::registered_toolchains(compiler_root, self.options.toolchain_env()) {
				Ok(toolchains) => {
					log::debug!("{} toolchains registered", toolchains.len());
					toolchains
				}
				Err(e) => {
					log::warn!("failed to discover toolchains: {}", e);
					vec![]
				}
			}
		})
	}

	/// Starts the resolution of `description`.
	///
	/// `contexts` holds the directories of every context `$ProjectDir(context)$` and `$OutDir(context)$` may refer to.
	pub fn processor<'a>(&'a self, description: &'a ContextDescription, contexts: &'a BTreeMap<String, Directories>) -> ContextProcessor<'a, 'db> {
		ContextProcessor::new(self, description, contexts)
	}

	pub fn resolve_context(&self, description: &ContextDescription) -> ResolvedContext {
		let contexts = BTreeMap::from([(description.name.clone(), description.directories.clone())]);
		let processor = self.processor(description, &contexts);
		processor.run()
	}

	/// Resolves every description on its own thread, a failing context leaves the others unaffected.
	///
	/// Results are in the order of `descriptions`.
	pub fn resolve_contexts(&self, descriptions: &[ContextDescription]) -> Vec<ResolvedContext> {
		self.toolchains();
		let contexts: BTreeMap<String, Directories> = descriptions.iter()
			.map(|d| (d.name.clone(), d.directories.clone()))
			.collect();

		std::thread::scope(|scope| {
			let handles: Vec<_> = descriptions.iter()
				.map(|description| {
					let contexts = &contexts;
					scope.spawn(move || self.processor(description, contexts).run())
				})
				.collect();

			handles.into_iter()
				.map(|handle| match handle.join() {
					Ok(resolved) => resolved,
					Err(panic) => std::panic::resume_unwind(panic),
				})
				.collect()
		})
	}

	/// Identifiers of the packs selected by `pack_filters`, narrowed by the words of `filter`.
	pub fn list_packs(&self, pack_filters: &[String], filter: &str) -> crate::Result<Vec<String>> {
		let mut diags = Diagnostics::default();
		let packs = selector::load_packs(self.metadb, pack_filters, self.options.load_latest_packs_when_unfiltered(), &mut diags)?;
		let listed = packs.iter().map(|p| p.identifier().to_string()).collect();
		Ok(sorted_filtered(listed, filter))
	}

	/// `Vendor::Name`, and `Vendor::Name:Pname` for every core of a multi-core device.
	pub fn list_devices(&self, filter: &str) -> Vec<String> {
		let mut listed = vec![];
		for device in self.metadb.packs().iter().flat_map(|p| p.devices.iter()) {
			let mut id = IdentifierTriple { vendor: device.vendor_name().to_string(), name: device.name.clone(), sub: String::new() };
			listed.push(id.to_string());
			if device.is_multicore() {
				for pname in device.pnames() {
					id.sub = pname.to_string();
					listed.push(id.to_string());
				}
			}
		}
		sorted_filtered(listed, filter)
	}

	pub fn list_boards(&self, filter: &str) -> Vec<String> {
		let listed = self.metadb.packs().iter()
			.flat_map(|p| p.boards.iter())
			.map(|b| b.identifier())
			.collect();
		sorted_filtered(listed, filter)
	}

	pub fn list_components(&self, filter: &str) -> Vec<String> {
		let listed = self.metadb.packs().iter()
			.flat_map(|p| p.components.iter())
			.map(|c| c.identifier().to_string())
			.collect();
		sorted_filtered(listed, filter)
	}

	/// `Name@version` of every registered toolchain.
	pub fn list_toolchains(&self, filter: &str) -> Vec<String> {
		let listed = self.toolchains().iter()
			.map(|t| format!("{}@{}", t.name, t.version))
			.collect();
		sorted_filtered(listed, filter)
	}

	/// Layer files shipped with the packs loaded for `pack_filters`.
	///
	/// A layer file missing on disk is skipped with a warning.
	pub fn collect_layers_from_packs(&self, pack_filters: &[String], diags: &mut Diagnostics) -> crate::Result<Vec<LayerDescription>> {
		let packs = selector::load_packs(self.metadb, pack_filters, self.options.load_latest_packs_when_unfiltered(), diags)?;
		let mut layers = vec![];
		for pack in packs {
			for pack_layer in &pack.layers {
				let path = pack.path.join(&pack_layer.file);
				if !path.is_file() {
					diags.warning_at(&path, format!("layer '{}' of pack '{}' was not found", pack_layer.name, pack.identifier()));
					continue;
				}
				let file = std::fs::File::open(&path)?;
				let mut layer: LayerDescription = serde_json::from_reader(std::io::BufReader::new(file))?;
				layer.path = path;
				if layer.layer_type.is_empty() {
					layer.layer_type = pack_layer.layer_type.clone();
				}
				if layer.for_board.is_empty() {
					layer.for_board = pack_layer.for_board.clone();
				}
				if layer.for_device.is_empty() {
					layer.for_device = pack_layer.for_device.clone();
				}
				layers.push(layer);
			}
		}
		Ok(layers)
	}

	/// Layers, from the description and the loaded packs, taking part in a valid combination for `description`.
	pub fn list_layers(&self, description: &ContextDescription, filter: &str) -> crate::Result<Vec<String>> {
		let mut extended = description.clone();
		let mut diags = Diagnostics::default();
		extended.candidate_layers.extend(self.collect_layers_from_packs(&description.packs, &mut diags)?);

		let contexts = BTreeMap::from([(extended.name.clone(), extended.directories.clone())]);
		let mut processor = self.processor(&extended, &contexts);
		processor.load_packs()?;
		processor.process_precedences()?;
		processor.process_device()?;

		let mut listed = vec![];
		for combination in processor.valid_layer_combinations()? {
			for layer in combination {
				listed.push(crate::paths::relative_to(&layer.path, &extended.directories.project));
			}
		}
		listed.dedup();
		Ok(sorted_filtered(listed, filter))
	}
}

fn sorted_filtered(mut listed: Vec<String>, filter: &str) -> Vec<String> {
	listed.sort();
	listed.dedup();
	selector::apply_filter(&listed, filter.split_whitespace())
}

/// State of one context resolution.
pub struct ContextProcessor<'a, 'db> {
	worker: &'a ProjMgrWorker<'db>,
	description: &'a ContextDescription,
	contexts: &'a BTreeMap<String, Directories>,
	diags: Diagnostics,

	packs: Vec<&'db PackInfo>,
	device_item: IdentifierTriple,
	board_item: IdentifierTriple,
	compiler: String,
	device: Option<&'db DeviceInfo>,
	/// Packs of device and board, components add theirs on top.
	target_packages: BTreeMap<String, PackIdentifier>,
	selected: Vec<&'db ComponentInfo>,
	active_layers: Vec<&'a LayerDescription>,

	context: Context,
}

impl<'a, 'db> ContextProcessor<'a, 'db> {
	fn new(worker: &'a ProjMgrWorker<'db>, description: &'a ContextDescription, contexts: &'a BTreeMap<String, Directories>) -> Self {
		let context = Context {
			name: description.name.clone(),
			directories: description.directories.clone(),
			variables: description.variables.clone(),
			..Default::default()
		};
		Self {
			worker,
			description,
			contexts,
			diags: Diagnostics::default(),
			packs: vec![],
			device_item: IdentifierTriple::default(),
			board_item: IdentifierTriple::default(),
			compiler: String::new(),
			device: None,
			target_packages: BTreeMap::new(),
			selected: vec![],
			active_layers: description.layers.iter().collect(),
			context,
		}
	}

	pub fn context(&self) -> &Context {
		&self.context
	}

	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diags
	}

	pub fn loaded_packs(&self) -> &[&'db PackInfo] {
		&self.packs
	}

	fn project_dir(&self) -> &'a Path {
		&self.description.directories.project
	}

	/// Directory of a layer, relative layer paths are taken from the project directory.
	fn layer_dir(&self, layer: &LayerDescription) -> PathBuf {
		self.project_dir().join(layer.directory())
	}

	/// Records `error` as diagnostic and hands it back.
	fn fail(&mut self, error: crate::Error) -> crate::Error {
		self.diags.error(error.to_string());
		error
	}

	/// Runs every phase and packs the outcome.
	pub fn run(mut self) -> ResolvedContext {
		log::info!("Resolving context {}", self.description.name);
		let result = self.resolve();
		match &result {
			Ok(_) => log::info!("Context {} resolved", self.description.name),
			Err(e) => log::warn!("Context {} failed: {}", self.description.name, e),
		}
		ResolvedContext {
			name: self.description.name.clone(),
			result: result.map(|_| self.context),
			diagnostics: self.diags,
		}
	}

	pub fn resolve(&mut self) -> crate::Result<()> {
		self.load_packs()?;
		self.process_precedences()?;
		self.process_device()?;
		self.process_toolchain()?;
		self.set_builtin_variables();
		self.process_layers()?;
		self.process_linker_options()?;
		if self.context.linker.script.is_empty() {
			self.set_default_linker_script();
		}
		self.check_and_generate_regions_header();
		self.process_generators()?;
		Ok(())
	}

	pub fn load_packs(&mut self) -> crate::Result<()> {
		let latest = self.worker.options.load_latest_packs_when_unfiltered();
		self.packs = selector::load_packs(self.worker.metadb, &self.description.packs, latest, &mut self.diags)?;
		for duplicate in self.worker.metadb.duplicates() {
			if self.packs.iter().any(|p| p.identifier() == duplicate.identifier) {
				self.diags.warning_at(&duplicate.ignored, format!("pack '{}' is also installed at '{}', using the latter", duplicate.identifier, duplicate.kept.display()));
			}
		}
		Ok(())
	}

	pub fn process_toolchain(&mut self) -> crate::Result<()> {
		let toolchain = match toolchain::resolve_toolchain(&self.compiler, self.worker.toolchains(), &mut self.diags) {
			Ok(t) => t,
			Err(e) => return Err(self.fail(e)),
		};
		self.context.toolchain_attributes = toolchain::ToolchainAttributes::for_compiler(&toolchain.name);
		self.context.toolchain = Some(toolchain);
		Ok(())
	}

	/// Context values available as `$Name$`, variables of the description take precedence.
	fn set_builtin_variables(&mut self) {
		let mut builtins = vec![
			("Project", self.description.project_name.clone()),
			("BuildType", self.description.build_type.clone()),
			("TargetType", self.description.target_type.clone()),
			("Dname", self.context.device_attributes.dname.clone()),
			("Pname", self.context.device_attributes.pname.clone()),
			("Bname", self.board_item.name.clone()),
		];
		if let Some(toolchain) = &self.context.toolchain {
			builtins.push(("Compiler", toolchain.name.clone()));
		}
		for (name, value) in builtins {
			if !value.is_empty() {
				self.context.variables.entry(name.to_string()).or_insert(value);
			}
		}
	}
}
