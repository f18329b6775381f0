use std::path::{Path, PathBuf};

use crate::access_sequence;
use crate::context::LinkerItem;
use crate::metadb::DeviceInfo;
use crate::paths;
use crate::toolchain::{self, CompilerRequest};

use super::ContextProcessor;

/// Writes the memory regions header of a device.
pub trait RegionsHeaderGenerator: Send + Sync {
	fn generate(&self, device: &DeviceInfo, pname: &str, path: &Path) -> crate::Result<()>;
}

/// Emits `__<NAME>_BASE` and `__<NAME>_SIZE` for every memory region of the processor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefinesRegionsGenerator;

impl RegionsHeaderGenerator for DefinesRegionsGenerator {
	fn generate(&self, device: &DeviceInfo, pname: &str, path: &Path) -> crate::Result<()> {
		let regions: Vec<_> = device.memories.iter()
			.filter(|m| m.pname.is_empty() || m.pname == pname)
			.collect();
		if regions.is_empty() {
			return Err(crate::Error::NotFound(format!("device '{}' has no memory regions", device.name)))
		}

		let guard = format!("REGIONS_{}_H", device.name.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
		let mut header = format!("#ifndef {0}\n#define {0}\n\n", guard);
		for region in regions {
			let name = region.name.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_");
			header.push_str(&format!("#define __{}_BASE {}\n", name, region.start));
			header.push_str(&format!("#define __{}_SIZE {}\n", name, region.size));
		}
		header.push_str(&format!("\n#endif /* {} */\n", guard));

		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, header)?;
		Ok(())
	}
}

/// Checks if a `for-compiler` list admits the resolved toolchain.
fn compiler_matches(for_compiler: &[String], name: &str, version: &crate::metadb::Version) -> bool {
	for_compiler.is_empty() || for_compiler.iter().any(|c| match CompilerRequest::parse(c) {
		Ok(request) => request.name == name && request.bounds.is_version_within(version),
		Err(e) => {
			log::warn!("ignoring for-compiler entry '{}': {}", c, e);
			false
		}
	})
}

/// Sets `slot` unless it already holds a different path.
fn merge_path(slot: &mut String, path: String) -> crate::Result<()> {
	if slot.is_empty() {
		*slot = path;
	} else if *slot != path {
		return Err(crate::Error::Conflict(format!("redefinition from '{}' into '{}' is not allowed", slot, path)))
	}
	Ok(())
}

impl<'a, 'db> ContextProcessor<'a, 'db> {
	/// Linker entries of project, setups and active layers fitting the toolchain, each with its base directory.
	fn linker_entries(&self) -> Vec<(&'a LinkerItem, PathBuf)> {
		let description = self.description;
		let project_dir = self.project_dir().to_path_buf();
		let Some(toolchain) = &self.context.toolchain else { return vec![] };
		let fits = |item: &LinkerItem| compiler_matches(&item.for_compiler, &toolchain.name, &toolchain.version);

		let mut entries = vec![];
		for item in description.linker.iter().filter(|i| fits(i)) {
			entries.push((item, project_dir.clone()));
		}
		for setup in description.setups.iter().filter(|s| compiler_matches(&s.for_compiler, &toolchain.name, &toolchain.version)) {
			for item in setup.linker.iter().filter(|i| fits(i)) {
				entries.push((item, project_dir.clone()));
			}
		}
		for layer in self.active_layers.iter().copied() {
			let layer_dir = self.layer_dir(layer);
			for item in layer.linker.iter().filter(|i| fits(i)) {
				entries.push((item, layer_dir.clone()));
			}
		}
		entries
	}

	/// Expands `value` and makes it relative to the project directory.
	fn linker_path(&self, value: &str, base: &Path) -> String {
		let expanded = access_sequence::expand_string(value, &self.context.variables);
		paths::relative_to(paths::normalize(&base.join(expanded)), self.project_dir())
	}

	/// Merges script, regions and defines over every linker entry.
	///
	/// A script or regions header once set may not be redefined with a different path.
	pub fn process_linker_options(&mut self) -> crate::Result<()> {
		for (item, base) in self.linker_entries() {
			if !item.script.is_empty() {
				let path = self.linker_path(&item.script, &base);
				if let Err(e) = merge_path(&mut self.context.linker.script, path) {
					return Err(self.fail(e))
				}
			}
			if !item.regions.is_empty() {
				let path = self.linker_path(&item.regions, &base);
				if let Err(e) = merge_path(&mut self.context.linker.regions, path) {
					return Err(self.fail(e))
				}
			}
			for define in &item.defines {
				let define = access_sequence::expand_string(define, &self.context.variables);
				if !self.context.linker.defines.contains(&define) {
					self.context.linker.defines.push(define);
				}
			}
		}
		Ok(())
	}

	/// Falls back to the linker script template shipped with the toolchain config.
	pub fn set_default_linker_script(&mut self) {
		let Some(toolchain) = self.context.toolchain.clone() else { return };
		let template_dir = toolchain.config.as_ref()
			.and_then(|c| c.parent().map(|p| p.to_path_buf()))
			.or_else(|| self.worker.options.compiler_root().cloned());

		let template = toolchain::linker_script_extension(&toolchain.name)
			.zip(template_dir)
			.map(|(ext, dir)| dir.join(format!("{}_linker_script.{}", toolchain.name.to_lowercase(), ext)))
			.filter(|t| t.is_file());

		match template {
			Some(template) => {
				log::debug!("default linker script {}", template.display());
				self.context.linker.script = paths::relative_to(template, self.project_dir());
			}
			None => self.diags.warning(format!("linker script template for compiler '{}' was not found", toolchain.name)),
		}

		if self.context.linker.regions.is_empty() {
			if let Some(regions) = self.default_regions_header() {
				self.context.linker.regions = paths::relative_to(regions, self.project_dir());
			}
		}
	}

	/// `<rte>/Device/<Dname>/regions_<Dname>.h`, where generated regions headers are written.
	fn default_regions_header(&self) -> Option<PathBuf> {
		let dname = &self.context.device_attributes.dname;
		if dname.is_empty() {
			return None
		}
		Some(self.description.directories.rte_dir().join("Device").join(dname).join(format!("regions_{}.h", dname)))
	}

	/// Generates the regions header of the device when the configured one doesn't exist yet.
	///
	/// The header is always written to the default location below the RTE directory,
	/// a configured path elsewhere still has to be provided by the project.
	///
	/// Never fails the context, problems are reported as warnings.
	pub fn check_and_generate_regions_header(&mut self) {
		let regions = &self.context.linker.regions;
		if regions.is_empty() {
			return
		}
		let specified = self.project_dir().join(regions);
		if specified.is_file() {
			return
		}

		let target = self.default_regions_header();
		let generated = match (self.device, &target) {
			(Some(device), Some(target)) => self.worker.regions_generator.generate(device, &self.context.device_attributes.pname, target),
			_ => Err(crate::Error::NotFound("device is unknown".to_string())),
		};
		match generated {
			Ok(()) => self.diags.info_at(target.unwrap_or_default(), "regions header generated successfully"),
			Err(e) => {
				log::debug!("regions header generation: {}", e);
				self.diags.warning("regions header file generation failed");
			}
		}

		if !specified.is_file() {
			self.diags.warning_at(&specified, "specified regions header was not found");
		}
	}
}
