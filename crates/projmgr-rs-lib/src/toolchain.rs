//! Installed toolchains and the resolution of a context's compiler.
//!
//! A toolchain is registered through an environment entry `<NAME>_TOOLCHAIN_<MAJOR>_<MINOR>_<PATCH>=<root>`
//! and is only usable when the compiler root holds a config file `<NAME>.<version>.cmake`
//! with a version not above the toolchain's.

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::diagnostics::Diagnostics;
use crate::metadb::{Version, VersionBounds, VersionRange};

pub const TOOLCHAIN_ENV_MARKER: &str = "_TOOLCHAIN_";
pub const CONFIG_FILE_EXTENSION: &str = "cmake";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolchainItem {
	pub name: String,
	pub version: Version,
	/// Installation directory, `None` when the toolchain isn't registered.
	pub root: Option<PathBuf>,
	/// Best matching config file in the compiler root.
	pub config: Option<PathBuf>,
}

/// A config file found in the compiler root.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigFile {
	name: String,
	version: Version,
	path: PathBuf,
}

fn read_config_files(compiler_root: &Path) -> crate::Result<Vec<ConfigFile>> {
	let mut configs = vec![];
	for entry in std::fs::read_dir(compiler_root)? {
		let path = entry?.path();
		if !path.is_file() || path.extension().map(|e| e != CONFIG_FILE_EXTENSION).unwrap_or(true) {
			continue;
		}
		let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
		let Some((name, version)) = stem.split_once('.') else { continue };
		match Version::new(version) {
			Ok(version) => configs.push(ConfigFile { name: name.to_string(), version, path: path.clone() }),
			Err(e) => log::debug!("ignoring toolchain config {}: {}", path.display(), e),
		}
	}
	Ok(configs)
}

/// Highest config of `name` whose version does not exceed `version`.
fn best_config<'a>(configs: &'a [ConfigFile], name: &str, version: &Version) -> Option<&'a ConfigFile> {
	configs.iter()
		.filter(|c| c.name == name && &c.version <= version)
		.max_by(|a, b| a.version.cmp(&b.version))
}

/// `AC6_TOOLCHAIN_6_18_0` into `("AC6", "6.18.0")`.
fn parse_registration(key: &str) -> Option<(String, Version)> {
	let (name, version) = key.split_once(TOOLCHAIN_ENV_MARKER)?;
	let parts: Vec<&str> = version.split('_').collect();
	if name.is_empty() || parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
		return None
	}
	Version::new(&parts.join(".")).ok().map(|v| (name.to_string(), v))
}

/// Every usable registered toolchain, sorted by name then version.
///
/// Registrations pointing at a missing directory or without a fitting config file are left out.
/// Without a compiler root nothing is usable.
pub fn registered_toolchains(compiler_root: Option<&Path>, env: &[(String, String)]) -> crate::Result<Vec<ToolchainItem>> {
	let Some(compiler_root) = compiler_root.filter(|r| !r.as_os_str().is_empty()) else {
		log::debug!("no compiler root, no toolchains registered");
		return Ok(vec![])
	};
	let configs = read_config_files(compiler_root)?;

	let mut toolchains = vec![];
	for (key, value) in env {
		let Some((name, version)) = parse_registration(key) else { continue };
		let root = PathBuf::from(value);
		if !root.is_dir() {
			log::debug!("toolchain {}@{} root {} does not exist", name, version, root.display());
			continue;
		}
		let Some(config) = best_config(&configs, &name, &version) else {
			log::debug!("no config file for toolchain {}@{}", name, version);
			continue;
		};
		toolchains.push(ToolchainItem {
			name,
			version,
			root: Some(root),
			config: Some(config.path.clone()),
		});
	}

	toolchains.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));
	toolchains.dedup_by(|a, b| a.name == b.name && a.version == b.version);
	Ok(toolchains)
}

/// Highest registered version of `name`.
pub fn latest_toolchain<'a>(toolchains: &'a [ToolchainItem], name: &str) -> Option<&'a ToolchainItem> {
	toolchains.iter()
		.filter(|t| t.name == name)
		.max_by(|a, b| a.version.cmp(&b.version))
}

/// `Name`, `Name@version` or `Name@>=version`.
#[derive(Debug, Clone)]
pub struct CompilerRequest {
	pub name: String,
	pub bounds: VersionRange,
}

impl CompilerRequest {
	pub fn parse(compiler: &str) -> crate::Result<Self> {
		let (name, bounds) = compiler.split_once('@').unwrap_or((compiler, ""));
		if name.trim().is_empty() {
			return Err(crate::Error::NotFound("compiler is not specified".to_string()))
		}
		Ok(Self {
			name: name.trim().to_string(),
			bounds: VersionRange::parse(bounds)?,
		})
	}
}

/// Picks the toolchain for `compiler` among `toolchains`.
///
/// Without a fitting registration the lower bound of the request, or `0.0.0`, is used with a warning.
pub fn resolve_toolchain(compiler: &str, toolchains: &[ToolchainItem], diags: &mut Diagnostics) -> crate::Result<ToolchainItem> {
	let request = CompilerRequest::parse(compiler)?;

	let found = match &request.bounds {
		VersionBounds::Any => latest_toolchain(toolchains, &request.name),
		bounds => toolchains.iter()
			.filter(|t| t.name == request.name && bounds.is_version_within(&t.version))
			.max_by(|a, b| a.version.cmp(&b.version)),
	};

	match found {
		Some(toolchain) => {
			log::debug!("compiler '{}' resolved to {}@{}", compiler, toolchain.name, toolchain.version);
			Ok(toolchain.clone())
		}
		None => {
			let version = request.bounds.lower().cloned().unwrap_or_default();
			diags.warning(format!("no registered toolchain matches compiler '{}', using version {}", compiler, version));
			Ok(ToolchainItem { name: request.name, version, root: None, config: None })
		}
	}
}

/// `Tcompiler` and `Toptions` of a toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainAttributes {
	#[serde(rename = "Tcompiler")]
	pub tcompiler: String,
	#[serde(rename = "Toptions")]
	pub toptions: String,
}

impl ToolchainAttributes {
	pub fn for_compiler(name: &str) -> Self {
		match name {
			"AC6" => Self { tcompiler: "ARMCC".to_string(), toptions: "AC6".to_string() },
			"GCC" | "IAR" | "CLANG" => Self { tcompiler: name.to_string(), toptions: String::new() },
			other => Self { tcompiler: other.to_string(), toptions: String::new() },
		}
	}
}

/// File extension of the linker script template of a compiler.
pub fn linker_script_extension(name: &str) -> Option<&'static str> {
	match name {
		"AC6" => Some("sct"),
		"GCC" | "CLANG" => Some("ld"),
		"IAR" => Some("icf"),
		_ => None,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn env(root: &Path, entries: &[(&str, &str)]) -> Vec<(String, String)> {
		entries.iter().map(|(k, sub)| (k.to_string(), root.join(sub).display().to_string())).collect()
	}

	fn compiler_root() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		for file in ["AC6.6.18.0.cmake", "GCC.11.2.1.cmake", "ac6_linker_script.sct", "notes.txt"] {
			std::fs::write(dir.path().join(file), "").unwrap();
		}
		dir
	}

	#[test]
	fn registrations_need_root_and_config() {
		let root = compiler_root();
		let env = env(root.path(), &[
			("AC6_TOOLCHAIN_6_18_0", ""),
			("AC6_TOOLCHAIN_6_18_1", "non-existent"),
			("AC6_TOOLCHAIN_6_19_0", ""),
			("AC6_TOOLCHAIN_6_6_0", ""),
			("GCC_TOOLCHAIN_11_3_1", ""),
			("PATH", ""),
		]);

		let toolchains = registered_toolchains(Some(root.path()), &env).unwrap();
		let listed: Vec<(String, String, PathBuf)> = toolchains.iter()
			.map(|t| (t.name.clone(), t.version.to_string(), t.config.clone().unwrap()))
			.collect();
		assert_eq!(listed, vec![
			("AC6".to_string(), "6.18.0".to_string(), root.path().join("AC6.6.18.0.cmake")),
			("AC6".to_string(), "6.19.0".to_string(), root.path().join("AC6.6.18.0.cmake")),
			("GCC".to_string(), "11.3.1".to_string(), root.path().join("GCC.11.2.1.cmake")),
		]);

		assert!(registered_toolchains(None, &env).unwrap().is_empty());
		assert!(registered_toolchains(Some(Path::new("")), &env).unwrap().is_empty());

		let latest = latest_toolchain(&toolchains, "AC6").unwrap();
		assert_eq!(latest.version.to_string(), "6.19.0");
		assert_eq!(latest.config, Some(root.path().join("AC6.6.18.0.cmake")));
		assert_eq!(latest_toolchain(&toolchains, "GCC").unwrap().version.to_string(), "11.3.1");
	}

	#[test]
	fn compiler_requests() {
		let root = compiler_root();
		let env = env(root.path(), &[("AC6_TOOLCHAIN_6_18_0", ""), ("AC6_TOOLCHAIN_6_19_0", "")]);
		let toolchains = registered_toolchains(Some(root.path()), &env).unwrap();
		let mut diags = Diagnostics::default();

		assert!(resolve_toolchain("", &toolchains, &mut diags).is_err());

		let resolved = resolve_toolchain("AC6", &toolchains, &mut diags).unwrap();
		assert_eq!(resolved.version.to_string(), "6.19.0");
		let resolved = resolve_toolchain("AC6@6.18.0", &toolchains, &mut diags).unwrap();
		assert_eq!(resolved.version.to_string(), "6.18.0");
		assert!(diags.is_empty());

		let resolved = resolve_toolchain("TEST", &toolchains, &mut diags).unwrap();
		assert_eq!((resolved.name.as_str(), resolved.version.to_string()), ("TEST", "0.0.0".to_string()));
		let resolved = resolve_toolchain("AC6@>=7.0.0", &toolchains, &mut diags).unwrap();
		assert_eq!(resolved.version.to_string(), "7.0.0");
		assert_eq!(diags.entries().len(), 2);
	}

	#[test]
	fn target_attributes() {
		assert_eq!(ToolchainAttributes::for_compiler("AC6"), ToolchainAttributes { tcompiler: "ARMCC".to_string(), toptions: "AC6".to_string() });
		assert_eq!(ToolchainAttributes::for_compiler("TEST"), ToolchainAttributes { tcompiler: "TEST".to_string(), toptions: String::new() });
		assert_eq!(linker_script_extension("IAR"), Some("icf"));
		assert_eq!(linker_script_extension("Unknown"), None);
	}
}
