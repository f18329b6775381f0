use crate::metadb::*;
use crate::precedence::{self, IdentifierTriple};
use crate::selector;

use super::ContextProcessor;

impl<'a, 'db> ContextProcessor<'a, 'db> {
	/// Merges the ranked device, board and compiler values of the description.
	pub fn process_precedences(&mut self) -> crate::Result<()> {
		let description = self.description;

		let device = precedence::fold_scopes(description.device.iter().map(|v| (v.scope.as_str(), v.value.as_str())));
		self.device_item = match device {
			Ok(item) => item,
			Err(e) => return Err(self.fail(crate::Error::Conflict(e.to_string()))),
		};

		let board = precedence::fold_scopes(description.board.iter().map(|v| (v.scope.as_str(), v.value.as_str())));
		self.board_item = match board {
			Ok(item) => item,
			Err(e) => return Err(self.fail(crate::Error::Conflict(e.to_string()))),
		};

		/* a compiler is taken whole, any other non-empty value is a redefinition */
		let mut compilers = description.compiler.iter().filter(|c| !c.value.is_empty());
		if let Some(first) = compilers.next() {
			if let Some(other) = compilers.find(|c| c.value != first.value) {
				let e = crate::Error::Conflict(format!("redefinition from '{}' into '{}' is not allowed", first.value, other.value));
				return Err(self.fail(e))
			}
			self.compiler = first.value.clone();
		}

		log::debug!("context {}: device '{}' board '{}' compiler '{}'", description.name, self.device_item, self.board_item, self.compiler);
		Ok(())
	}

	/// Looks up board, device and processor in the loaded packs and records the device attributes.
	pub fn process_device(&mut self) -> crate::Result<()> {
		if !self.board_item.is_empty() {
			self.process_board()?;
		}

		if self.device_item.name.is_empty() {
			return Err(self.fail(crate::Error::NotFound("missing device requirements".to_string())))
		}

		let item = self.device_item.clone();
		let candidates: Vec<&'db DeviceInfo> = self.packs.iter()
			.flat_map(|p| p.devices.iter())
			.filter(|d| d.name == item.name && (item.vendor.is_empty() || d.vendor_name() == item.vendor))
			.collect();
		if candidates.is_empty() {
			let e = crate::Error::NotFound(format!(
				"specified device '{}' was not found among the installed packs.\nuse 'cpackget' utility to install software packs.\n  cpackget add Vendor.PackName --pack-root ./Path/Packs",
				item.name
			));
			return Err(self.fail(e))
		}
		let filter = IdentifierTriple { sub: String::new(), ..item.clone() }.to_string();
		let device = match selector::select_by_policy("device", &filter, candidates, &VersionRange::Any, |_| true) {
			Ok(device) => device,
			Err(e) => return Err(self.fail(e.into())),
		};

		let default_processor = ProcessorInfo::default();
		let processor = if !item.sub.is_empty() {
			match device.processor(&item.sub) {
				Some(p) => p,
				None => return Err(self.fail(crate::Error::NotFound(format!("processor name '{}' was not found", item.sub)))),
			}
		} else if device.is_multicore() {
			let e = crate::Error::NotFound(format!("processor name for device '{}' is required, one of: {}", device.name, device.pnames().join(", ")));
			return Err(self.fail(e))
		} else {
			device.processors.first().unwrap_or(&default_processor)
		};

		self.context.device_attributes = DeviceAttributes::from_device(device, processor);
		self.context.device = IdentifierTriple {
			vendor: device.vendor_name().to_string(),
			name: device.name.clone(),
			sub: processor.pname.clone(),
		}.to_string();
		self.target_packages.insert(device.pack.to_string(), device.pack.clone());
		self.context.packages = self.target_packages.clone();
		self.device = Some(device);

		log::debug!("context {}: device resolved to {} from {}", self.description.name, self.context.device, device.pack);
		Ok(())
	}

	/// Selects the board and merges its mounted device into the device item.
	fn process_board(&mut self) -> crate::Result<()> {
		let item = self.board_item.clone();
		let candidates: Vec<&'db BoardInfo> = self.packs.iter()
			.flat_map(|p| p.boards.iter())
			.filter(|b| b.name == item.name
				&& (item.vendor.is_empty() || b.vendor == item.vendor)
				&& (item.sub.is_empty() || b.revision == item.sub))
			.collect();
		if candidates.is_empty() {
			return Err(self.fail(crate::Error::NotFound(format!("board '{}' was not found", item))))
		}
		let board = match selector::select_by_policy("board", &item.to_string(), candidates, &VersionRange::Any, |b| b.revision == item.sub) {
			Ok(board) => board,
			Err(e) => return Err(self.fail(e.into())),
		};

		self.context.board = board.identifier();
		self.target_packages.insert(board.pack.to_string(), board.pack.clone());

		if let Some(mounted) = board.mounted_devices.first() {
			let board_device = IdentifierTriple {
				vendor: vendor_name(&mounted.dvendor).to_string(),
				name: mounted.dname.clone(),
				sub: mounted.pname.clone(),
			}.to_string();
			let device = self.device_item.to_string();
			let merged = precedence::fold_scopes([("device", device.as_str()), ("board", board_device.as_str())]);
			self.device_item = match merged {
				Ok(item) => item,
				Err(e) => return Err(self.fail(crate::Error::Conflict(e.to_string()))),
			};
		} else {
			log::debug!("board {} has no mounted device", board.identifier());
		}
		Ok(())
	}
}
