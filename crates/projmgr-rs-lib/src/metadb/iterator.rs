use super::*;

/// Catalog items carrying a version.
pub trait Versioned {
	fn version(&self) -> &Version;
}

impl Versioned for PackInfo {
	fn version(&self) -> &Version { &self.version }
}

impl Versioned for ComponentInfo {
	fn version(&self) -> &Version { &self.version }
}

pub struct VersionMatches<'a, T, I>
where
	T: Versioned + 'a,
	I: Iterator<Item = &'a T>,
{
	bounds: VersionRange,
	underlying: I,
}

impl<'a, T, I> Iterator for VersionMatches<'a, T, I>
where
	T: Versioned + 'a,
	I: Iterator<Item = &'a T>,
{
	type Item = I::Item;

	fn next(&mut self) -> Option<Self::Item> {
		self.underlying.by_ref().find(|item| self.bounds.is_version_within(item.version()))
	}
}

pub trait VersionMatchesExt<'a, T: Versioned + 'a>: Iterator<Item = &'a T>
{
	/// Filters the iterator to items matching the requirements of `bounds`
	fn version_matches(self, bounds: VersionRange) -> VersionMatches<'a, T, Self>
	where
		Self: Sized,
	{
		VersionMatches { underlying: self, bounds }
	}
}

impl<'a, T: Versioned + 'a, I: Iterator<Item = &'a T>> VersionMatchesExt<'a, T> for I {}


pub struct DeviceVisible<'a, 'd, I>
where
	I: Iterator<Item = &'a ComponentInfo>,
{
	attributes: &'d DeviceAttributes,
	underlying: I,
}

impl<'a, 'd, I> Iterator for DeviceVisible<'a, 'd, I>
where
	I: Iterator<Item = &'a ComponentInfo>,
{
	type Item = I::Item;

	fn next(&mut self) -> Option<Self::Item> {
		self.underlying.by_ref().find(|component| component.is_visible_for(self.attributes))
	}
}

pub trait DeviceVisibleExt<'a>: Iterator<Item = &'a ComponentInfo>
{
	/// Filters the iterator to components whose condition accepts `attributes`
	fn visible_for<'d>(self, attributes: &'d DeviceAttributes) -> DeviceVisible<'a, 'd, Self>
	where
		Self: Sized,
	{
		DeviceVisible { underlying: self, attributes }
	}
}

impl<'a, I: Iterator<Item = &'a ComponentInfo>> DeviceVisibleExt<'a> for I {}

#[cfg(test)]
mod test {
	use super::*;

	fn component(group: &str, version: &str, condition: &[(&str, &str)]) -> ComponentInfo {
		ComponentInfo {
			vendor: "ARM".to_string(),
			class: "RteTest".to_string(),
			bundle: String::new(),
			group: group.to_string(),
			sub: String::new(),
			variant: String::new(),
			version: Version::new(version).unwrap(),
			is_default_variant: false,
			condition: condition.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
			requires: vec![],
			denies: vec![],
			generator: None,
			pack: PackIdentifier::default(),
		}
	}

	#[test]
	fn version_and_device_filters_chain() {
		let components = vec![
			component("A", "1.0.0", &[("Dcore", "Cortex-M0")]),
			component("A", "2.0.0", &[("Dcore", "Cortex-M*")]),
			component("A", "3.0.0", &[("Dcore", "Cortex-M3")]),
		];
		let mut attributes = DeviceAttributes::default();
		attributes.set("Dcore", "Cortex-M0");

		let found: Vec<_> = components.iter()
			.visible_for(&attributes)
			.version_matches(VersionRange::MinOnly(Version::new("2.0.0").unwrap()))
			.map(|c| c.version.to_string())
			.collect();
		assert_eq!(found, vec!["2.0.0"]);
	}
}
