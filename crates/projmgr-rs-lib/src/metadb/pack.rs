use std::path::PathBuf;
use serde::{Serialize, Deserialize};

use super::*;

/// A unique identifier for packs.
///
/// Mainly used as an index into [`crate::MetaDB`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackIdentifier {
	pub vendor: String,
	pub name: String,
	pub version: Version,
}

impl PackIdentifier {
	/// `Vendor::Name` without the version.
	pub fn family(&self) -> String {
		format!("{}::{}", self.vendor, self.name)
	}
}

impl std::fmt::Display for PackIdentifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}::{}@{}", self.vendor, self.name, self.version)
	}
}

/// A layer file shipped inside a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackLayer {
	pub name: String,
	#[serde(rename = "type")]
	pub layer_type: String,
	/// Relative to the pack directory.
	pub file: String,
	#[serde(default)]
	pub for_board: String,
	#[serde(default)]
	pub for_device: String,
}

/// One installed pack, read from a `*.pack.json` index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackInfo {
	pub vendor: String,
	pub name: String,
	pub version: Version,
	#[serde(default)]
	pub description: String,
	/// Directory holding the index file.
	#[serde(skip)]
	pub path: PathBuf,
	#[serde(default)]
	pub devices: Vec<DeviceInfo>,
	#[serde(default)]
	pub boards: Vec<BoardInfo>,
	#[serde(default)]
	pub components: Vec<ComponentInfo>,
	#[serde(default)]
	pub layers: Vec<PackLayer>,
}

impl PackInfo {
	pub fn identifier(&self) -> PackIdentifier {
		PackIdentifier {
			vendor: self.vendor.clone(),
			name: self.name.clone(),
			version: self.version.clone(),
		}
	}

	/// Points every contained item back at this pack.
	pub(crate) fn link_items(&mut self) {
		let id = self.identifier();
		for device in &mut self.devices {
			device.pack = id.clone();
		}
		for board in &mut self.boards {
			board.pack = id.clone();
		}
		for component in &mut self.components {
			component.pack = id.clone();
			if component.vendor.is_empty() {
				component.vendor = self.vendor.clone();
			}
		}
	}

	pub fn read_from_file(path: &std::path::Path) -> crate::Result<Self> {
		let file = std::fs::File::open(path)?;
		let mut pack: PackInfo = serde_json::from_reader(std::io::BufReader::new(file))?;
		pack.path = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
		pack.link_items();
		Ok(pack)
	}
}
