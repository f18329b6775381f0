//! Context descriptions handed in by the project file reader, and the resolved [`Context`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use indexmap::IndexMap;
use serde::{Serialize, Deserialize};

use crate::access_sequence::Variables;
use crate::dependency::ValidationResult;
use crate::layer_resolver::{ConnectItem, ConnectionsCollection};
use crate::metadb::{DeviceAttributes, PackIdentifier};
use crate::toolchain::{ToolchainAttributes, ToolchainItem};

/// A value together with the scope it was declared in, e.g. `project` or `target-type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedValue {
	pub scope: String,
	pub value: String,
}

impl ScopedValue {
	pub fn new(scope: impl Into<String>, value: impl Into<String>) -> Self {
		Self { scope: scope.into(), value: value.into() }
	}
}

/// Directories of one context.
///
/// `output` and `rte` are relative to `project` unless absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Directories {
	pub solution: PathBuf,
	pub project: PathBuf,
	pub output: PathBuf,
	pub rte: PathBuf,
}

impl Directories {
	pub fn output_dir(&self) -> PathBuf {
		self.project.join(&self.output)
	}

	pub fn rte_dir(&self) -> PathBuf {
		self.project.join(&self.rte)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LinkerItem {
	/// Linker script, relative to the declaring file.
	pub script: String,
	/// Memory regions header, relative to the declaring file.
	pub regions: String,
	pub defines: Vec<String>,
	/// `Name` or `Name@bounds` entries, empty applies to every compiler.
	pub for_compiler: Vec<String>,
}

/// Per generator working directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorOptions {
	/// Parent of every generator directory, the generator id is appended.
	pub base_dir: String,
	/// Generator id to its exact working directory.
	pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SetupDescription {
	pub for_compiler: Vec<String>,
	pub linker: Vec<LinkerItem>,
}

/// A layer file, explicit or candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayerDescription {
	/// Location of the layer file, relative paths in the layer are relative to its directory.
	pub path: PathBuf,
	#[serde(rename = "type")]
	pub layer_type: String,
	pub for_board: String,
	pub for_device: String,
	pub components: Vec<String>,
	pub connections: Vec<ConnectItem>,
	pub linker: Vec<LinkerItem>,
	pub generators: GeneratorOptions,
}

impl LayerDescription {
	pub fn directory(&self) -> &Path {
		self.path.parent().unwrap_or_else(|| Path::new(""))
	}

	pub fn connections_collection(&self) -> ConnectionsCollection {
		ConnectionsCollection {
			filename: self.path.display().to_string(),
			layer_type: self.layer_type.clone(),
			connections: self.connections.clone(),
		}
	}
}

/// Everything one build context declares, as read from the project files.
///
/// Scoped lists are ranked, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContextDescription {
	/// `project.build-type+target-type`
	pub name: String,
	pub project_name: String,
	pub build_type: String,
	pub target_type: String,

	pub device: Vec<ScopedValue>,
	pub board: Vec<ScopedValue>,
	pub compiler: Vec<ScopedValue>,

	/// Pack filters, none loads the latest of every installed pack.
	pub packs: Vec<String>,
	/// Component requests of the project.
	pub components: Vec<String>,
	/// Layers always part of the context.
	pub layers: Vec<LayerDescription>,
	/// Layers to choose from by their connections, one per type at most.
	pub candidate_layers: Vec<LayerDescription>,
	/// Connect items of the project itself.
	pub connections: Vec<ConnectItem>,

	pub linker: Vec<LinkerItem>,
	pub setups: Vec<SetupDescription>,
	pub variables: Variables,
	pub generators: GeneratorOptions,
	pub solution_generators: GeneratorOptions,
	pub directories: Directories,
}

impl ContextDescription {
	pub fn read_from_file(path: &Path) -> crate::Result<Self> {
		let file = std::fs::File::open(path)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}
}

/// A selected component and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedComponent {
	/// The request as written.
	pub request: String,
	pub pack: PackIdentifier,
	/// Layer file the request came from, `None` for the project.
	pub from_layer: Option<PathBuf>,
	pub generator: Option<String>,
}

/// Linker settings after precedence and expansion, paths relative to the project directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedLinker {
	pub script: String,
	pub regions: String,
	pub defines: Vec<String>,
}

/// A fully resolved build context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Context {
	pub name: String,
	/// `Vendor::Name:Pname`
	pub device: String,
	/// `Vendor::Name:Revision`, empty without a board.
	pub board: String,
	pub device_attributes: DeviceAttributes,
	pub toolchain: Option<ToolchainItem>,
	pub toolchain_attributes: ToolchainAttributes,
	/// Every pack contributing to the context.
	pub packages: BTreeMap<String, PackIdentifier>,
	/// Keyed by full component identifier, in resolution order.
	pub components: IndexMap<String, ResolvedComponent>,
	/// Explicit and chosen candidate layers.
	pub layers: Vec<PathBuf>,
	pub variables: Variables,
	pub linker: ResolvedLinker,
	/// Generator id to working directory, relative to the project directory.
	pub generators: BTreeMap<String, String>,
	pub directories: Directories,
	/// Verdicts of the last dependency validation, only unfulfilled components appear.
	pub validation_results: Vec<ValidationResult>,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn description_from_json() {
		let json = r#"{
			"name": "test.Debug+CM0",
			"device": [{ "scope": "project", "value": "RteTest_ARMCM0" }],
			"compiler": [{ "scope": "solution", "value": "AC6" }],
			"components": ["RteTest:CORE"],
			"candidate-layers": [{
				"path": "layers/board.clayer.yml",
				"type": "Board",
				"connections": [{ "connect": "board", "provides": [["CMSIS-RTOS2", ""]] }]
			}],
			"variables": { "Board-Layer": "layers/board.clayer.yml" },
			"directories": { "project": "/work/test", "output": "out" }
		}"#;

		let description: ContextDescription = serde_json::from_str(json).unwrap();
		assert_eq!(description.device, vec![ScopedValue::new("project", "RteTest_ARMCM0")]);
		assert_eq!(description.candidate_layers[0].layer_type, "Board");
		assert_eq!(description.candidate_layers[0].directory(), Path::new("layers"));
		assert_eq!(description.candidate_layers[0].connections[0].provides, vec![("CMSIS-RTOS2".to_string(), String::new())]);
		assert_eq!(description.directories.output_dir(), PathBuf::from("/work/test/out"));
		assert!(description.layers.is_empty());
	}
}
