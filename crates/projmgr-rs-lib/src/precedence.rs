//! Field-wise merging of partially specified identifiers.
//!
//! Devices and boards share one grammar, `Vendor::Name:Sub`, where `Sub` is the
//! processor name of a device or the revision of a board.
//! Every field is optional.

use serde::{Serialize, Deserialize};

pub const VENDOR_SEPARATOR: &str = "::";
pub const SUB_SEPARATOR: char = ':';

/// `Vendor::Name:Sub` split into its fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierTriple {
	pub vendor: String,
	pub name: String,
	/// Processor name for devices, revision for boards.
	pub sub: String,
}

impl IdentifierTriple {
	pub fn parse(identifier: &str) -> Self {
		let (vendor, rest) = match identifier.split_once(VENDOR_SEPARATOR) {
			Some((vendor, rest)) => (vendor, rest),
			None => ("", identifier),
		};
		let (name, sub) = rest.split_once(SUB_SEPARATOR).unwrap_or((rest, ""));
		Self {
			vendor: vendor.to_string(),
			name: name.to_string(),
			sub: sub.to_string(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.vendor.is_empty() && self.name.is_empty() && self.sub.is_empty()
	}

	fn fields(&self) -> [(&'static str, &str); 3] {
		[("vendor", &self.vendor), ("name", &self.name), ("sub", &self.sub)]
	}

	fn field_mut(&mut self, field: &str) -> &mut String {
		match field {
			"vendor" => &mut self.vendor,
			"name" => &mut self.name,
			_ => &mut self.sub,
		}
	}
}

impl std::fmt::Display for IdentifierTriple {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if !self.vendor.is_empty() {
			write!(f, "{}{}", self.vendor, VENDOR_SEPARATOR)?;
		}
		write!(f, "{}", self.name)?;
		if !self.sub.is_empty() {
			write!(f, "{}{}", SUB_SEPARATOR, self.sub)?;
		}
		Ok(())
	}
}

/// `Vendor::Name:Pname`
pub fn parse_device_item(device: &str) -> IdentifierTriple {
	IdentifierTriple::parse(device)
}

/// `Vendor::Name:Revision`
pub fn parse_board_item(board: &str) -> IdentifierTriple {
	IdentifierTriple::parse(board)
}

/// Two sources supplied different non-empty values for the same field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("redefinition from '{first}' into '{second}' is not allowed")]
pub struct PrecedenceConflict {
	pub field: String,
	pub first: String,
	pub first_scope: String,
	pub second: String,
	pub second_scope: String,
}

/// Merges identifiers coming from ranked scopes, highest priority first.
///
/// A field is taken from the first scope supplying it, any later scope supplying
/// a different non-empty value for that field is a conflict.
pub fn fold_scopes<'a, S, I>(scopes: I) -> Result<IdentifierTriple, PrecedenceConflict>
where
	S: AsRef<str> + 'a,
	I: IntoIterator<Item = (S, &'a str)>,
{
	let mut merged = IdentifierTriple::default();
	let mut origin: [Option<(String, String)>; 3] = Default::default();

	for (scope, value) in scopes {
		let item = IdentifierTriple::parse(value);
		for (i, (field, v)) in item.fields().into_iter().enumerate() {
			if v.is_empty() {
				continue;
			}
			match &origin[i] {
				None => {
					*merged.field_mut(field) = v.to_string();
					origin[i] = Some((scope.as_ref().to_string(), value.to_string()));
				}
				Some((first_scope, first)) => {
					if merged.fields()[i].1 != v {
						return Err(PrecedenceConflict {
							field: field.to_string(),
							first: first.clone(),
							first_scope: first_scope.clone(),
							second: value.to_string(),
							second_scope: scope.as_ref().to_string(),
						})
					}
				}
			}
		}
	}

	Ok(merged)
}

/// Candidate strings ranked highest priority first, plus the slot receiving the merge.
pub struct StringCollection<'a> {
	pub assign: &'a mut String,
	pub elements: Vec<&'a str>,
}

/// Merges `collection.elements` into `collection.assign`.
///
/// On conflict `assign` is left untouched and `false` returned.
pub fn merge_identifiers(collection: &mut StringCollection) -> bool {
	let scopes = collection.elements.iter().enumerate().map(|(i, e)| (i.to_string(), *e));
	match fold_scopes(scopes) {
		Ok(merged) => {
			*collection.assign = merged.to_string();
			true
		}
		Err(e) => {
			log::debug!("precedence merge failed on {}: {}", e.field, e);
			false
		}
	}
}

/// Checks if every non-empty field of `filter` equals the same field of `target`.
pub fn identifier_matches(filter: &str, target: &str) -> bool {
	let filter = IdentifierTriple::parse(filter);
	let target = IdentifierTriple::parse(target);
	filter.fields().iter().zip(target.fields().iter())
		.all(|((_, f), (_, t))| f.is_empty() || f == t)
}

/// Checks if a layer declared for `for_board`/`for_device` fits the resolved board and device.
pub fn check_board_device_in_layer(board: &str, device: &str, for_board: &str, for_device: &str) -> bool {
	identifier_matches(for_board, board) && identifier_matches(for_device, device)
}

#[cfg(test)]
mod test {
	use super::*;

	fn triple(vendor: &str, name: &str, sub: &str) -> IdentifierTriple {
		IdentifierTriple { vendor: vendor.to_string(), name: name.to_string(), sub: sub.to_string() }
	}

	#[test]
	fn device_items_are_split() {
		let cases = [
			("Vendor::Name:Processor", triple("Vendor", "Name", "Processor")),
			("Name:Processor", triple("", "Name", "Processor")),
			("::Name:Processor", triple("", "Name", "Processor")),
			(":Processor", triple("", "", "Processor")),
			("Vendor::Name:", triple("Vendor", "Name", "")),
			("::Name:", triple("", "Name", "")),
			("::Name", triple("", "Name", "")),
			("Name", triple("", "Name", "")),
		];
		for (input, expected) in cases {
			assert_eq!(parse_device_item(input), expected, "{}", input);
		}
	}

	#[test]
	fn board_items_are_split() {
		assert_eq!(parse_board_item("Vendor::Name"), triple("Vendor", "Name", ""));
		assert_eq!(parse_board_item(""), triple("", "", ""));
		assert_eq!(parse_board_item("Vendor::Name:Revision"), triple("Vendor", "Name", "Revision"));
		assert_eq!(parse_board_item(":Revision"), triple("", "", "Revision"));
	}

	#[test]
	fn canonical_form_reproduces_input() {
		for input in ["Vendor::Name:Processor", "Name:Processor", ":Processor", "Vendor::Name", "Name", ""] {
			assert_eq!(IdentifierTriple::parse(input).to_string(), input);
		}
	}

	#[test]
	fn precedence_merges() {
		let cases = [
			(["name", "", ""], Some("name")),
			(["", "::name", "name"], Some("name")),
			(["name:processor", "", ""], Some("name:processor")),
			([":processor", "vendor::name", ""], Some("vendor::name:processor")),
			([":processor", "::name:processor", "::name"], Some("name:processor")),
			(["vendor::name", ":processor", "name"], Some("vendor::name:processor")),
			([":processor", "vendor::name:processor", "name"], Some("vendor::name:processor")),
			(["", "", ""], Some("")),
			([":processor", "", ""], Some(":processor")),
			(["name:processor", "", "name:processor1"], None),
			([":processor", "vendor::name:processor1", "name"], None),
			([":processor", "vendor::name:processor", "vendor::name:processor2"], None),
		];

		for (elements, expected) in cases {
			let mut out = String::new();
			let mut collection = StringCollection { assign: &mut out, elements: elements.to_vec() };
			assert_eq!(merge_identifiers(&mut collection), expected.is_some(), "{:?}", elements);
			assert_eq!(out, expected.unwrap_or(""), "{:?}", elements);
		}
	}

	#[test]
	fn conflict_names_both_scopes() {
		let err = fold_scopes([("project", "Vendor::A"), ("layer", "Vendor::B")]).unwrap_err();
		assert_eq!(err.field, "name");
		assert_eq!(err.first_scope, "project");
		assert_eq!(err.second_scope, "layer");
		assert_eq!(err.to_string(), "redefinition from 'Vendor::A' into 'Vendor::B' is not allowed");
	}

	#[test]
	fn layer_board_filter() {
		let board = "BoardVendor::BoardName:BoardRevision";
		for valid in ["", "BoardName", "BoardName:BoardRevision", "BoardVendor::BoardName", "BoardVendor::BoardName:BoardRevision"] {
			assert!(check_board_device_in_layer(board, "", valid, ""), "{}", valid);
		}
		for invalid in [
			"InvalidBoardName",
			"InvalidBoardName:BoardRevision",
			"BoardName:InvalidBoardRevision",
			"InvalidBoardVendor::BoardName",
			"BoardVendor::InvalidBoardName",
			"InvalidBoardVendor::BoardName:BoardRevision",
			"BoardVendor::InvalidBoardName:BoardRevision",
			"BoardVendor::BoardName:InvalidBoardRevision",
		] {
			assert!(!check_board_device_in_layer(board, "", invalid, ""), "{}", invalid);
		}
	}

	#[test]
	fn layer_device_filter() {
		let device = "DeviceVendor::DeviceName:DevicePname";
		for valid in ["", ":DevicePname", "DeviceName:DevicePname", "DeviceVendor::DeviceName", "DeviceVendor::DeviceName:DevicePname"] {
			assert!(check_board_device_in_layer("", device, "", valid), "{}", valid);
		}
		for invalid in [
			"InvalidDeviceName:InvalidDevicePname",
			"InvalidDeviceName:DevicePname",
			"DeviceName:InvalidDevicePname",
			"InvalidDeviceVendor::DeviceName",
			"DeviceVendor::InvalidDeviceName:DevicePname",
			"DeviceVendor::DeviceName:InvalidDevicePname",
		] {
			assert!(!check_board_device_in_layer("", device, "", invalid), "{}", invalid);
		}
	}
}
