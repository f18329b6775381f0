use std::path::PathBuf;

/// Environment variable naming the installed pack root.
pub const PACK_ROOT_ENV: &str = "CMSIS_PACK_ROOT";
/// Environment variable naming the directory holding toolchain config files.
pub const COMPILER_ROOT_ENV: &str = "CMSIS_COMPILER_ROOT";

pub struct ProjMgrOptions {
	pack_root: PathBuf,
	compiler_root: Option<PathBuf>,
	toolchain_env: Vec<(String, String)>,
	load_latest_packs_when_unfiltered: bool,
}

impl Default for ProjMgrOptions {
	fn default() -> Self {
		Self {
			pack_root: {
				if let Some(root) = std::env::var_os(PACK_ROOT_ENV).filter(|r| !r.is_empty()) {
					PathBuf::from(root)
				} else {
					#[cfg(target_os = "windows")]
					let path = std::env::var_os("LOCALAPPDATA")
						.map(|p| PathBuf::from(p).join("Arm").join("Packs"));

					#[cfg(not(target_os = "windows"))]
					let path = std::env::var_os("XDG_CACHE_HOME")
						.map(PathBuf::from)
						.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
						.map(|p| p.join("arm").join("packs"));

					path.unwrap_or_else(|| PathBuf::from("packs"))
				}
			},
			compiler_root: std::env::var_os(COMPILER_ROOT_ENV)
				.filter(|r| !r.is_empty())
				.map(PathBuf::from),
			toolchain_env: std::env::vars()
				.filter(|(k, _)| k.contains("_TOOLCHAIN_"))
				.collect(),
			load_latest_packs_when_unfiltered: true,
		}
	}
}

impl ProjMgrOptions {
	pub fn pack_root(&self) -> &PathBuf {
		&self.pack_root
	}
	/// returns if the directory is valid or not.
	pub fn set_pack_root(&mut self, pack_root: PathBuf) -> bool {
		if pack_root.is_dir() {
			self.pack_root = pack_root;
			true
		} else {
			false
		}
	}

	pub fn compiler_root(&self) -> Option<&PathBuf> {
		self.compiler_root.as_ref()
	}
	/// `None` disables toolchain discovery. returns if the directory is valid or not.
	pub fn set_compiler_root(&mut self, compiler_root: Option<PathBuf>) -> bool {
		match compiler_root {
			Some(root) if !root.is_dir() => false,
			root => {
				self.compiler_root = root;
				true
			}
		}
	}

	/// `<NAME>_TOOLCHAIN_<MAJOR>_<MINOR>_<PATCH>` registrations captured from the environment.
	pub fn toolchain_env(&self) -> &[(String, String)] {
		&self.toolchain_env
	}
	pub fn set_toolchain_env(&mut self, toolchain_env: impl IntoIterator<Item = (String, String)>) {
		self.toolchain_env = toolchain_env.into_iter().collect();
	}

	pub fn load_latest_packs_when_unfiltered(&self) -> bool {
		self.load_latest_packs_when_unfiltered
	}
	pub fn set_load_latest_packs_when_unfiltered(&mut self, value: bool) {
		self.load_latest_packs_when_unfiltered = value;
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn invalid_directories_are_rejected() {
		let mut options = ProjMgrOptions::default();
		let before = options.pack_root().clone();
		assert!(!options.set_pack_root(PathBuf::from("/definitely/not/a/pack/root")));
		assert_eq!(&before, options.pack_root());
		assert!(!options.set_compiler_root(Some(PathBuf::from("/definitely/not/a/compiler/root"))));
	}

	#[test]
	fn compiler_root_can_be_cleared() {
		let mut options = ProjMgrOptions::default();
		assert!(options.set_compiler_root(None));
		assert!(options.compiler_root().is_none());
	}
}
