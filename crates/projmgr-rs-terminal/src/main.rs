use std::path::PathBuf;

use projmgr_rs::{ContextDescription, MetaDB, ProjMgrOptions, ProjMgrWorker};

fn main() -> std::process::ExitCode {
	env_logger::init();

	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag("h", "help", "Show help");
		opts.optopt("", "pack-root", "Directory of the installed packs", "DIR");
		opts.optopt("", "compiler-root", "Directory of the toolchain config files", "DIR");
		opts.optmulti("p", "pack", "Pack filter, can be repeated", "FILTER");
		opts.optopt("f", "filter", "Only list entries containing every word of FILTER", "FILTER");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m) => m,
			Err(e) => {
				eprintln!("Unable to parse options: {}", e);
				return std::process::ExitCode::FAILURE
			}
		};

		if parsed_options.opt_present("h") || parsed_options.free.is_empty() {
			eprintln!("{}", opts.usage("Usage: projmgr-rs-terminal [options] resolve <description.json>...\n       projmgr-rs-terminal [options] list <packs|devices|boards|components|toolchains|layers> [description.json]"));
			return std::process::ExitCode::SUCCESS
		}

		parsed_options
	};

	match run(&parsed_options) {
		Ok(()) => std::process::ExitCode::SUCCESS,
		Err(e) => {
			log::error!("{}", e);
			std::process::ExitCode::FAILURE
		}
	}
}

fn options(parsed_options: &getopts::Matches) -> Result<ProjMgrOptions, Error> {
	let mut options = ProjMgrOptions::default();
	if let Some(root) = parsed_options.opt_str("pack-root") {
		if !options.set_pack_root(PathBuf::from(&root)) {
			return Err(Error::InvalidDirectory(root))
		}
	}
	if let Some(root) = parsed_options.opt_str("compiler-root") {
		if !options.set_compiler_root(Some(PathBuf::from(&root))) {
			return Err(Error::InvalidDirectory(root))
		}
	}
	Ok(options)
}

fn run(parsed_options: &getopts::Matches) -> Result<(), Error> {
	let options = options(parsed_options)?;
	let db = MetaDB::load_from_dir(options.pack_root())?;
	let worker = ProjMgrWorker::new(&db, options);

	let command = parsed_options.free[0].as_str();
	let arguments = &parsed_options.free[1..];
	match command {
		"resolve" => resolve(&worker, arguments),
		"list" => {
			let Some(what) = arguments.first() else { return Err(Error::MissingArgument("list")) };
			let filter = parsed_options.opt_str("filter").unwrap_or_default();
			let listed = list(&worker, what, &arguments[1..], &parsed_options.opt_strs("pack"), &filter)?;
			for entry in listed {
				println!("{}", entry);
			}
			Ok(())
		}
		other => Err(Error::UnknownCommand(other.to_string())),
	}
}

fn resolve(worker: &ProjMgrWorker, files: &[String]) -> Result<(), Error> {
	if files.is_empty() {
		return Err(Error::MissingArgument("resolve"))
	}
	let descriptions = files.iter()
		.map(|f| ContextDescription::read_from_file(f.as_ref()))
		.collect::<Result<Vec<_>, _>>()?;

	let resolved = worker.resolve_contexts(&descriptions);

	let mut failed = 0;
	let mut output = vec![];
	for context in resolved {
		for diagnostic in context.diagnostics.iter() {
			eprintln!("{}", diagnostic);
		}
		let (result, error) = match &context.result {
			Ok(c) => (serde_json::to_value(c)?, serde_json::Value::Null),
			Err(e) => {
				failed += 1;
				(serde_json::Value::Null, serde_json::Value::String(e.to_string()))
			}
		};
		output.push(serde_json::json!({
			"name": context.name,
			"context": result,
			"error": error,
		}));
	}
	println!("{}", serde_json::to_string_pretty(&output)?);

	if failed > 0 {
		Err(Error::ContextsFailed(failed))
	} else {
		Ok(())
	}
}

fn list(worker: &ProjMgrWorker, what: &str, arguments: &[String], packs: &[String], filter: &str) -> Result<Vec<String>, Error> {
	Ok(match what {
		"packs" => worker.list_packs(packs, filter)?,
		"devices" => worker.list_devices(filter),
		"boards" => worker.list_boards(filter),
		"components" => worker.list_components(filter),
		"toolchains" => worker.list_toolchains(filter),
		"layers" => {
			let Some(file) = arguments.first() else { return Err(Error::MissingArgument("list layers")) };
			let mut description = ContextDescription::read_from_file(file.as_ref())?;
			description.packs.extend(packs.iter().cloned());
			worker.list_layers(&description, filter)?
		}
		other => return Err(Error::UnknownCommand(format!("list {}", other))),
	})
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("projmgr-rs error: {0}")]
	ProjMgrError(#[from] projmgr_rs::Error),
	#[error("JSON error: {0}")]
	JSON(#[from] serde_json::Error),
	#[error("Missing argument for {0}")]
	MissingArgument(&'static str),
	#[error("Unknown command {0}")]
	UnknownCommand(String),
	#[error("Not a directory: {0}")]
	InvalidDirectory(String),
	#[error("{0} context(s) failed to resolve")]
	ContextsFailed(usize),
}
