use std::path::{Component, Path, PathBuf};

/// Lexically resolves `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => match out.components().next_back() {
				Some(Component::Normal(_)) => { out.pop(); }
				Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
				_ => out.push(".."),
			},
			c => out.push(c.as_os_str()),
		}
	}
	out
}

/// `path` relative to `base`, with forward slashes.
///
/// Paths that can't be expressed relative to `base` are returned normalized.
pub fn relative_to(path: impl AsRef<Path>, base: impl AsRef<Path>) -> String {
	let path = normalize(path.as_ref());
	let base = normalize(base.as_ref());
	let relative = pathdiff::diff_paths(&path, &base).unwrap_or(path);
	let s = to_forward_slashes(&relative);
	if s.is_empty() { ".".to_string() } else { s }
}

pub fn to_forward_slashes(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}
