//! Devices, their processors and the boards they are mounted on.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use super::PackIdentifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProcessorInfo {
	/// Empty for single core devices.
	pub pname: String,
	pub core: String,
	pub core_version: String,
	pub fpu: String,
	pub mpu: String,
	pub endian: String,
	pub secure: String,
	pub clock: String,
	pub dsp: String,
	pub tz: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MemoryRegion {
	pub name: String,
	/// `rx`, `rwx`, ...
	pub access: String,
	pub start: String,
	pub size: String,
	/// Used by the default linker setup.
	pub default: bool,
	pub startup: bool,
	/// Only set for regions belonging to one core of a multi-core device.
	pub pname: String,
}

impl MemoryRegion {
	pub fn is_executable(&self) -> bool {
		self.access.contains('x')
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceInfo {
	pub name: String,
	/// Includes the vendor id, e.g. `ARM:82`.
	pub vendor: String,
	#[serde(default)]
	pub processors: Vec<ProcessorInfo>,
	#[serde(default)]
	pub memories: Vec<MemoryRegion>,
	/// Pack defined attributes with no dedicated field.
	#[serde(default)]
	pub extensions: BTreeMap<String, String>,
	#[serde(skip)]
	pub pack: PackIdentifier,
}

impl DeviceInfo {
	/// Vendor name without the numeric vendor id.
	pub fn vendor_name(&self) -> &str {
		vendor_name(&self.vendor)
	}

	pub fn processor(&self, pname: &str) -> Option<&ProcessorInfo> {
		self.processors.iter().find(|p| p.pname == pname)
	}

	pub fn pnames(&self) -> Vec<&str> {
		self.processors.iter().map(|p| p.pname.as_str()).filter(|p| !p.is_empty()).collect()
	}

	pub fn is_multicore(&self) -> bool {
		self.processors.len() > 1
	}
}

/// Strips the numeric vendor id, `ARM:82` becomes `ARM`.
pub fn vendor_name(vendor: &str) -> &str {
	vendor.split_once(':').map(|(v, _)| v).unwrap_or(vendor)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MountedDevice {
	pub dname: String,
	pub dvendor: String,
	pub pname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardInfo {
	pub name: String,
	pub vendor: String,
	#[serde(default)]
	pub revision: String,
	#[serde(default)]
	pub mounted_devices: Vec<MountedDevice>,
	#[serde(skip)]
	pub pack: PackIdentifier,
}

impl BoardInfo {
	/// `Vendor::Name[:Revision]`
	pub fn identifier(&self) -> String {
		crate::precedence::IdentifierTriple {
			vendor: self.vendor.clone(),
			name: self.name.clone(),
			sub: self.revision.clone(),
		}.to_string()
	}
}

/// Device attributes of a resolved context.
///
/// Pack defined attributes without a dedicated field land in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
	#[serde(rename = "Dname", default, skip_serializing_if = "String::is_empty")]
	pub dname: String,
	#[serde(rename = "Dvendor", default, skip_serializing_if = "String::is_empty")]
	pub dvendor: String,
	#[serde(rename = "Dcore", default, skip_serializing_if = "String::is_empty")]
	pub dcore: String,
	#[serde(rename = "DcoreVersion", default, skip_serializing_if = "String::is_empty")]
	pub dcore_version: String,
	#[serde(rename = "Dfpu", default, skip_serializing_if = "String::is_empty")]
	pub dfpu: String,
	#[serde(rename = "Dmpu", default, skip_serializing_if = "String::is_empty")]
	pub dmpu: String,
	#[serde(rename = "Dendian", default, skip_serializing_if = "String::is_empty")]
	pub dendian: String,
	#[serde(rename = "Dsecure", default, skip_serializing_if = "String::is_empty")]
	pub dsecure: String,
	#[serde(rename = "Dclock", default, skip_serializing_if = "String::is_empty")]
	pub dclock: String,
	#[serde(rename = "Dtz", default, skip_serializing_if = "String::is_empty")]
	pub dtz: String,
	#[serde(rename = "Ddsp", default, skip_serializing_if = "String::is_empty")]
	pub ddsp: String,
	#[serde(rename = "Pname", default, skip_serializing_if = "String::is_empty")]
	pub pname: String,
	#[serde(flatten)]
	pub extensions: BTreeMap<String, String>,
}

impl DeviceAttributes {
	pub const KEYS: [&'static str; 12] = [
		"Dname", "Dvendor", "Dcore", "DcoreVersion", "Dfpu", "Dmpu",
		"Dendian", "Dsecure", "Dclock", "Dtz", "Ddsp", "Pname",
	];

	pub fn from_device(device: &DeviceInfo, processor: &ProcessorInfo) -> Self {
		Self {
			dname: device.name.clone(),
			dvendor: device.vendor.clone(),
			dcore: processor.core.clone(),
			dcore_version: processor.core_version.clone(),
			dfpu: processor.fpu.clone(),
			dmpu: processor.mpu.clone(),
			dendian: processor.endian.clone(),
			dsecure: processor.secure.clone(),
			dclock: processor.clock.clone(),
			dtz: processor.tz.clone(),
			ddsp: processor.dsp.clone(),
			pname: processor.pname.clone(),
			extensions: device.extensions.clone(),
		}
	}

	fn field(&self, key: &str) -> Option<&String> {
		match key {
			"Dname" => Some(&self.dname),
			"Dvendor" => Some(&self.dvendor),
			"Dcore" => Some(&self.dcore),
			"DcoreVersion" => Some(&self.dcore_version),
			"Dfpu" => Some(&self.dfpu),
			"Dmpu" => Some(&self.dmpu),
			"Dendian" => Some(&self.dendian),
			"Dsecure" => Some(&self.dsecure),
			"Dclock" => Some(&self.dclock),
			"Dtz" => Some(&self.dtz),
			"Ddsp" => Some(&self.ddsp),
			"Pname" => Some(&self.pname),
			_ => None,
		}
	}

	fn field_mut(&mut self, key: &str) -> Option<&mut String> {
		match key {
			"Dname" => Some(&mut self.dname),
			"Dvendor" => Some(&mut self.dvendor),
			"Dcore" => Some(&mut self.dcore),
			"DcoreVersion" => Some(&mut self.dcore_version),
			"Dfpu" => Some(&mut self.dfpu),
			"Dmpu" => Some(&mut self.dmpu),
			"Dendian" => Some(&mut self.dendian),
			"Dsecure" => Some(&mut self.dsecure),
			"Dclock" => Some(&mut self.dclock),
			"Dtz" => Some(&mut self.dtz),
			"Ddsp" => Some(&mut self.ddsp),
			"Pname" => Some(&mut self.pname),
			_ => None,
		}
	}

	/// Empty attributes read as absent.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.field(key)
			.or_else(|| self.extensions.get(key))
			.map(|s| s.as_str())
			.filter(|s| !s.is_empty())
	}

	pub fn set(&mut self, key: &str, value: impl Into<String>) {
		match self.field_mut(key) {
			Some(field) => *field = value.into(),
			None => { self.extensions.insert(key.to_string(), value.into()); }
		}
	}

	/// Non-empty attributes, fixed ones first.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		Self::KEYS.iter()
			.filter_map(|k| self.get(k).map(|v| (*k, v)))
			.chain(self.extensions.iter().map(|(k, v)| (k.as_str(), v.as_str())).filter(|(_, v)| !v.is_empty()))
	}
}
