//! Various helper functions for testing
//!
//! functions in this module return results and don't panic, failures show up in the calling test

use std::path::{Path, PathBuf};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("projmgr error: {0}")]
	ProjMgr(#[from] projmgr_rs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn cm0_processor() -> serde_json::Value {
	json!({
		"core": "Cortex-M0", "core-version": "r0p0", "fpu": "NO_FPU", "mpu": "NO_MPU",
		"endian": "Configurable", "secure": "Non-secure", "clock": "10000000"
	})
}

fn memories() -> serde_json::Value {
	json!([
		{ "name": "IROM1", "access": "rx", "start": "0x00000000", "size": "0x00040000", "default": true, "startup": true },
		{ "name": "IRAM1", "access": "rwx", "start": "0x20000000", "size": "0x00020000", "default": true }
	])
}

/// Index documents of the test packs, the content of `*.pack.json` files.
pub fn test_packs() -> Vec<serde_json::Value> {
	vec![
		json!({
			"vendor": "ARM", "name": "RteTest_DFP", "version": "0.1.1",
			"description": "Older device family pack",
			"devices": [{ "name": "RteTest_ARMCM0", "vendor": "ARM:82", "processors": [cm0_processor()], "memories": memories() }],
			"components": [
				{ "class": "RteTest", "group": "CORE", "version": "0.1.0" }
			]
		}),
		json!({
			"vendor": "ARM", "name": "RteTest_DFP", "version": "0.2.0",
			"description": "Device family pack for the test devices",
			"devices": [
				{ "name": "RteTest_ARMCM0", "vendor": "ARM:82", "processors": [cm0_processor()], "memories": memories() },
				{
					"name": "RteTest_ARMCM3", "vendor": "ARM:82",
					"processors": [{ "core": "Cortex-M3", "core-version": "r2p1", "fpu": "NO_FPU", "mpu": "MPU", "endian": "Little-endian", "clock": "10000000" }],
					"memories": memories()
				},
				{
					"name": "RteTest_ARMCM0_Dual", "vendor": "ARM:82",
					"processors": [
						{ "pname": "cm0_core0", "core": "Cortex-M0" },
						{ "pname": "cm0_core1", "core": "Cortex-M0" }
					],
					"memories": [
						{ "name": "IROM1", "access": "rx", "start": "0x00000000", "size": "0x00020000", "pname": "cm0_core0" },
						{ "name": "IROM2", "access": "rx", "start": "0x00020000", "size": "0x00020000", "pname": "cm0_core1" }
					]
				}
			],
			"boards": [
				{ "name": "RteTest Dummy board", "vendor": "Keil", "revision": "1.1.1", "mounted-devices": [{ "dname": "RteTest_ARMCM0", "dvendor": "ARM:82" }] },
				{ "name": "RteTest Test board", "vendor": "Keil", "revision": "Rev1", "mounted-devices": [{ "dname": "RteTest_ARMCM3", "dvendor": "ARM:82" }] },
				{ "name": "RteTest Test board", "vendor": "Keil", "revision": "Rev2", "mounted-devices": [{ "dname": "RteTest_ARMCM3", "dvendor": "ARM:82" }] }
			],
			"components": [
				{ "class": "Device", "group": "Startup", "variant": "RteTest Startup", "version": "2.0.3", "requires": ["RteTest:CORE"] },
				{ "class": "RteTest", "group": "CORE", "version": "0.1.1" }
			],
			"layers": [
				{ "name": "DummyBoard", "type": "Board", "file": "Layers/dummy_board.clayer.json", "for-board": "Keil::RteTest Dummy board" },
				{ "name": "TestBoard", "type": "Board", "file": "Layers/test_board.clayer.json", "for-board": "RteTest Test board" }
			]
		}),
		json!({
			"vendor": "ARM", "name": "RteTest", "version": "0.1.0",
			"description": "Software components for tests",
			"components": [
				{ "class": "RteTest", "group": "TestVersion", "version": "1.1.1" },
				{ "class": "RteTest", "group": "TestVersion", "version": "2.2.2" },
				{ "class": "RteTest", "group": "TestVersion", "version": "3.3.3" },
				{ "class": "RteTest", "group": "ApiExclusive", "sub": "S1", "version": "0.9.9", "denies": ["RteTest:ApiExclusive:S2"] },
				{ "class": "RteTest", "group": "ApiExclusive", "sub": "S2", "version": "0.9.9", "denies": ["RteTest:ApiExclusive:S1"] },
				{ "class": "RteTest", "group": "Dependency", "sub": "Variant", "version": "0.9.9", "condition": { "Dcore": "Cortex-M?" } },
				{
					"class": "RteTest", "group": "Dependency", "sub": "Variant", "variant": "Compatible", "version": "0.9.9",
					"is-default-variant": true, "condition": { "Dcore": "Cortex-M0" }
				}
			],
			"layers": [
				{ "name": "Shield", "type": "Shield", "file": "Layers/missing.clayer.json" }
			]
		}),
		json!({
			"vendor": "ARM", "name": "RteTestGenerator", "version": "0.1.0",
			"components": [
				{ "class": "Device", "group": "RteTest Generated Component", "sub": "RteTest", "version": "1.1.0", "generator": "RteTestGeneratorIdentifier" }
			]
		}),
	]
}

/// Layer files shipped with the test packs, relative to the pack directory.
fn pack_layer_files() -> Vec<(&'static str, &'static str, &'static str, serde_json::Value)> {
	vec![
		("ARM", "RteTest_DFP", "Layers/dummy_board.clayer.json", json!({
			"components": ["RteTest:CORE"],
			"connections": [{ "connect": "dummy board", "provides": [["CORE", ""]] }]
		})),
		("ARM", "RteTest_DFP", "Layers/test_board.clayer.json", json!({
			"components": ["RteTest:CORE"],
			"connections": [{ "connect": "test board", "provides": [["CORE", ""]] }]
		})),
	]
}

/// Gets an in-memory MetaDB holding every test pack.
pub fn get_metadb() -> Result<projmgr_rs::MetaDB> {
	let mut db = projmgr_rs::MetaDB::default();
	for pack in test_packs() {
		db.insert_pack(serde_json::from_value(pack)?);
	}
	Ok(db)
}

/// Writes the test packs in the installed layout, `<root>/<Vendor>/<Name>/<version>/<Vendor>.<Name>.pack.json`.
pub fn create_pack_root() -> Result<tempfile::TempDir> {
	let root = tempfile::tempdir()?;
	write_packs(root.path())?;
	Ok(root)
}

pub fn write_packs(root: &Path) -> Result<()> {
	let layer_files = pack_layer_files();
	for pack in test_packs() {
		let vendor = pack["vendor"].as_str().unwrap_or_default();
		let name = pack["name"].as_str().unwrap_or_default();
		let version = pack["version"].as_str().unwrap_or_default();
		let dir = root.join(vendor).join(name).join(version);
		std::fs::create_dir_all(&dir)?;

		let file = std::fs::File::create(dir.join(format!("{}.{}{}", vendor, name, projmgr_rs::metadb::PACK_INDEX_SUFFIX)))?;
		serde_json::to_writer_pretty(file, &pack)?;

		for (_, _, path, content) in layer_files.iter().filter(|(v, n, _, _)| *v == vendor && *n == name) {
			let path = dir.join(path);
			if let Some(parent) = path.parent() {
				std::fs::create_dir_all(parent)?;
			}
			serde_json::to_writer_pretty(std::fs::File::create(path)?, content)?;
		}
	}
	Ok(())
}

/// A compiler root with config files and linker script templates, plus registrations pointing into it.
pub struct CompilerRoot {
	pub dir: tempfile::TempDir,
	/// `<NAME>_TOOLCHAIN_<MAJOR>_<MINOR>_<PATCH>` entries.
	pub env: Vec<(String, String)>,
}

impl CompilerRoot {
	pub fn path(&self) -> &Path {
		self.dir.path()
	}
}

/// Creates a compiler root registering every `(name, version)` of `toolchains`.
///
/// Each toolchain gets its own installation directory and a config file of the same version.
pub fn create_compiler_root(toolchains: &[(&str, &str)]) -> Result<CompilerRoot> {
	let dir = tempfile::tempdir()?;
	let mut env = vec![];
	for (name, version) in toolchains {
		std::fs::write(dir.path().join(format!("{}.{}.cmake", name, version)), "")?;

		let extension = projmgr_rs::toolchain::linker_script_extension(name);
		if let Some(extension) = extension {
			std::fs::write(dir.path().join(format!("{}_linker_script.{}", name.to_lowercase(), extension)), "")?;
		}

		let install: PathBuf = dir.path().join("installs").join(format!("{}-{}", name, version));
		std::fs::create_dir_all(&install)?;
		env.push((
			format!("{}{}{}", name, projmgr_rs::toolchain::TOOLCHAIN_ENV_MARKER, version.replace('.', "_")),
			install.display().to_string(),
		));
	}
	Ok(CompilerRoot { dir, env })
}

/// Options reading packs from `pack_root`, with toolchains from `compiler_root` only.
pub fn options(pack_root: &Path, compiler_root: Option<&CompilerRoot>) -> projmgr_rs::ProjMgrOptions {
	let mut options = projmgr_rs::ProjMgrOptions::default();
	options.set_pack_root(pack_root.to_path_buf());
	options.set_compiler_root(compiler_root.map(|r| r.path().to_path_buf()));
	options.set_toolchain_env(compiler_root.map(|r| r.env.clone()).unwrap_or_default());
	options
}
