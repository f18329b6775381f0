//! # Installed pack catalog
//!
//! Packs are described by `*.pack.json` index files below the pack root.
//! The catalog is populated once and only read afterwards, it can be shared between threads.

use std::path::{Path, PathBuf};

mod version;
pub use version::Version;
pub use version::VersionBounds;
pub use version::VersionRange;

mod pack;
pub use pack::PackIdentifier;
pub use pack::PackInfo;
pub use pack::PackLayer;

mod device;
pub use device::DeviceInfo;
pub use device::ProcessorInfo;
pub use device::MemoryRegion;
pub use device::BoardInfo;
pub use device::MountedDevice;
pub use device::DeviceAttributes;
pub use device::vendor_name;

mod component;
pub use component::ComponentIdentifier;
pub use component::ComponentInfo;

pub mod iterator;

pub const PACK_INDEX_SUFFIX: &str = ".pack.json";

/// The same pack identity found at more than one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePack {
	pub identifier: PackIdentifier,
	/// Location of the copy in use.
	pub kept: PathBuf,
	pub ignored: PathBuf,
}

#[derive(Debug, Default)]
pub struct MetaDB {
	packs: Vec<PackInfo>,
	duplicates: Vec<DuplicatePack>,
}

impl MetaDB {
	/// Walks `pack_root` for pack index files.
	///
	/// Files are visited in path order so the kept copy of a duplicated pack is stable.
	pub fn load_from_dir(pack_root: &Path) -> crate::Result<Self> {
		log::info!("Loading packs from {}", pack_root.display());
		let mut db = MetaDB::default();

		let mut files = vec![];
		for entry in walkdir::WalkDir::new(pack_root).sort_by_file_name() {
			let entry = entry?;
			if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(PACK_INDEX_SUFFIX) {
				files.push(entry.into_path());
			}
		}

		for file in files {
			log::trace!("Reading pack index {}", file.display());
			db.insert_pack(PackInfo::read_from_file(&file)?);
		}

		log::info!("Loaded {} packs", db.packs.len());
		Ok(db)
	}

	/// Adds a pack, a pack identity already present is recorded as a duplicate instead.
	pub fn insert_pack(&mut self, mut pack: PackInfo) {
		pack.link_items();
		let id = pack.identifier();
		if let Some(existing) = self.packs.iter().find(|p| p.identifier() == id) {
			log::warn!("pack '{}' found at '{}' and '{}', using the first", id, existing.path.display(), pack.path.display());
			self.duplicates.push(DuplicatePack {
				identifier: id,
				kept: existing.path.clone(),
				ignored: pack.path,
			});
			return
		}
		self.packs.push(pack);
	}

	pub fn packs(&self) -> &[PackInfo] {
		&self.packs
	}

	pub fn duplicates(&self) -> &[DuplicatePack] {
		&self.duplicates
	}

	pub fn get_pack(&self, identifier: &PackIdentifier) -> Option<&PackInfo> {
		self.packs.iter().find(|p| &p.identifier() == identifier)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn pack(version: &str, path: &str) -> PackInfo {
		PackInfo {
			vendor: "ARM".to_string(),
			name: "RteTest_DFP".to_string(),
			version: Version::new(version).unwrap(),
			description: String::new(),
			path: PathBuf::from(path),
			devices: vec![],
			boards: vec![],
			components: vec![],
			layers: vec![],
		}
	}

	#[test]
	fn duplicate_identity_is_kept_once() {
		let mut db = MetaDB::default();
		db.insert_pack(pack("0.2.0", "/packs/ARM/RteTest_DFP/0.2.0"));
		db.insert_pack(pack("0.2.0", "/solution/SolutionSpecificPack"));
		db.insert_pack(pack("0.1.1", "/packs/ARM/RteTest_DFP/0.1.1"));

		assert_eq!(db.packs().len(), 2);
		assert_eq!(db.duplicates().len(), 1);
		assert_eq!(db.duplicates()[0].ignored, PathBuf::from("/solution/SolutionSpecificPack"));
		assert_eq!(db.duplicates()[0].identifier.to_string(), "ARM::RteTest_DFP@0.2.0");
	}
}
