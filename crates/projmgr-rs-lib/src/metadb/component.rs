use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use super::*;

/// `Cvendor::Cclass&Cbundle:Cgroup:Csub&Cvariant@Cversion`, every part but `Cclass` and `Cgroup` optional.
///
/// `version` is kept as text so requests can carry bounds such as `>=1.0.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentIdentifier {
	pub vendor: String,
	pub class: String,
	pub bundle: String,
	pub group: String,
	pub sub: String,
	pub variant: String,
	pub version: String,
}

impl ComponentIdentifier {
	pub fn parse(identifier: &str) -> Self {
		let mut id = ComponentIdentifier::default();

		let (rest, version) = identifier.split_once('@').unwrap_or((identifier, ""));
		id.version = version.to_string();

		let rest = match rest.split_once("::") {
			Some((vendor, rest)) => {
				id.vendor = vendor.to_string();
				rest
			}
			None => rest,
		};

		let mut segments: Vec<&str> = rest.split(':').collect();
		/* the variant belongs to whichever of group or sub comes last */
		if segments.len() > 1 {
			if let Some(last) = segments.last_mut() {
				let segment: &str = *last;
				if let Some((head, variant)) = segment.split_once('&') {
					id.variant = variant.to_string();
					*last = head;
				}
			}
		}

		let class = segments.first().copied().unwrap_or_default();
		let (class, bundle) = class.split_once('&').unwrap_or((class, ""));
		id.class = class.to_string();
		id.bundle = bundle.to_string();
		id.group = segments.get(1).copied().unwrap_or_default().to_string();
		id.sub = segments.get(2).copied().unwrap_or_default().to_string();
		id
	}

	/// Same identifier without vendor or version.
	pub fn without_vendor_and_version(&self) -> Self {
		Self { vendor: String::new(), version: String::new(), ..self.clone() }
	}
}

impl std::fmt::Display for ComponentIdentifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if !self.vendor.is_empty() {
			write!(f, "{}::", self.vendor)?;
		}
		write!(f, "{}", self.class)?;
		if !self.bundle.is_empty() {
			write!(f, "&{}", self.bundle)?;
		}
		write!(f, ":{}", self.group)?;
		if !self.sub.is_empty() {
			write!(f, ":{}", self.sub)?;
		}
		if !self.variant.is_empty() {
			write!(f, "&{}", self.variant)?;
		}
		if !self.version.is_empty() {
			write!(f, "@{}", self.version)?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentInfo {
	/// Defaults to the vendor of the owning pack.
	#[serde(default)]
	pub vendor: String,
	pub class: String,
	#[serde(default)]
	pub bundle: String,
	pub group: String,
	#[serde(default)]
	pub sub: String,
	#[serde(default)]
	pub variant: String,
	pub version: Version,
	#[serde(default)]
	pub is_default_variant: bool,
	/// Device attributes the component is restricted to, values may use `*` and `?`.
	#[serde(default)]
	pub condition: BTreeMap<String, String>,
	/// Component expressions that must be selected as well.
	#[serde(default)]
	pub requires: Vec<String>,
	/// Component expressions that must not be selected.
	#[serde(default)]
	pub denies: Vec<String>,
	#[serde(default)]
	pub generator: Option<String>,
	#[serde(skip)]
	pub pack: PackIdentifier,
}

impl ComponentInfo {
	pub fn identifier(&self) -> ComponentIdentifier {
		ComponentIdentifier {
			vendor: self.vendor.clone(),
			class: self.class.clone(),
			bundle: self.bundle.clone(),
			group: self.group.clone(),
			sub: self.sub.clone(),
			variant: self.variant.clone(),
			version: self.version.to_string(),
		}
	}

	/// Checks if the component is usable with a device carrying `attributes`.
	pub fn is_visible_for(&self, attributes: &DeviceAttributes) -> bool {
		self.condition.iter().all(|(key, pattern)| {
			let value = attributes.get(key).unwrap_or_default();
			crate::selector::wildcard_match(pattern, value)
		})
	}

	/// Checks if every non-empty field of `expression` equals this component's field.
	pub fn matches_expression(&self, expression: &ComponentIdentifier) -> bool {
		let fields = [
			(&expression.vendor, &self.vendor),
			(&expression.class, &self.class),
			(&expression.bundle, &self.bundle),
			(&expression.group, &self.group),
			(&expression.sub, &self.sub),
			(&expression.variant, &self.variant),
		];
		fields.iter().all(|(want, have)| want.is_empty() || want == have)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn identifiers_are_parsed() {
		let id = ComponentIdentifier::parse("ARM::Device:Startup&RteTest Startup@2.0.3");
		assert_eq!((id.vendor.as_str(), id.class.as_str(), id.group.as_str()), ("ARM", "Device", "Startup"));
		assert_eq!((id.sub.as_str(), id.variant.as_str(), id.version.as_str()), ("", "RteTest Startup", "2.0.3"));

		let id = ComponentIdentifier::parse("ARM::RteTest:Dependency:Variant&Compatible@0.9.9");
		assert_eq!((id.group.as_str(), id.sub.as_str(), id.variant.as_str()), ("Dependency", "Variant", "Compatible"));

		let id = ComponentIdentifier::parse("CMSIS&Bundle:RTOS2:Keil RTX5&Library@>=5.0.0");
		assert_eq!((id.class.as_str(), id.bundle.as_str(), id.version.as_str()), ("CMSIS", "Bundle", ">=5.0.0"));
	}

	#[test]
	fn identifiers_round_trip() {
		for id in [
			"ARM::Device:Startup&RteTest Startup@2.0.3",
			"ARM::RteTest:Dependency:Variant&Compatible@0.9.9",
			"Device:Test variant",
			"RteTest:CORE",
			"ARM::CMSIS&Bundle:RTOS2:Keil RTX5&Library",
		] {
			assert_eq!(ComponentIdentifier::parse(id).to_string(), id);
		}
	}
}
