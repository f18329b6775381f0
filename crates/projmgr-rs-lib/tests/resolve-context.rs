use std::path::Path;
use pretty_assertions::assert_eq;
use projmgr_rs::context::*;
use projmgr_rs::{MetaDB, ProjMgrWorker};

fn description(name: &str, project: &Path) -> ContextDescription {
	let (project_name, rest) = name.split_once('.').unwrap();
	let (build_type, target_type) = rest.split_once('+').unwrap();
	ContextDescription {
		name: name.to_string(),
		project_name: project_name.to_string(),
		build_type: build_type.to_string(),
		target_type: target_type.to_string(),
		board: vec![ScopedValue::new("project", "RteTest Dummy board")],
		compiler: vec![ScopedValue::new("solution", "AC6")],
		components: vec![
			"Device:Startup".to_string(),
			"RteTest:CORE".to_string(),
			"RteTest:Dependency:Variant".to_string(),
			"Device:RteTest Generated Component:RteTest".to_string(),
		],
		directories: Directories {
			solution: project.parent().unwrap().to_path_buf(),
			project: project.to_path_buf(),
			output: "out".into(),
			rte: "RTE".into(),
		},
		..Default::default()
	}
}

#[test]
fn context_is_fully_resolved() {
	let _ = env_logger::builder().is_test(true).try_init();
	let pack_root = projmgr_rs_test_utils::create_pack_root().unwrap();
	let compiler_root = projmgr_rs_test_utils::create_compiler_root(&[("AC6", "6.18.0"), ("GCC", "11.3.1")]).unwrap();
	let db = MetaDB::load_from_dir(pack_root.path()).unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), Some(&compiler_root)));

	let solution = tempfile::tempdir().unwrap();
	let project = solution.path().join("test");
	std::fs::create_dir(&project).unwrap();

	let resolved = worker.resolve_context(&description("test.Debug+CM0", &project));
	assert_eq!(resolved.name, "test.Debug+CM0");
	assert!(!resolved.diagnostics.has_errors(), "{:?}", resolved.diagnostics);
	let context = resolved.result.unwrap();

	assert_eq!(context.board, "Keil::RteTest Dummy board:1.1.1");
	assert_eq!(context.device, "ARM::RteTest_ARMCM0");
	assert_eq!(context.device_attributes.dfpu, "NO_FPU");
	assert_eq!(context.device_attributes.dclock, "10000000");

	let toolchain = context.toolchain.as_ref().unwrap();
	assert_eq!((toolchain.name.as_str(), toolchain.version.as_str()), ("AC6", "6.18.0"));
	assert_eq!(context.toolchain_attributes.tcompiler, "ARMCC");

	assert_eq!(context.components.keys().collect::<Vec<_>>(), vec![
		"ARM::Device:Startup&RteTest Startup@2.0.3",
		"ARM::RteTest:CORE@0.1.1",
		"ARM::RteTest:Dependency:Variant&Compatible@0.9.9",
		"ARM::Device:RteTest Generated Component:RteTest@1.1.0",
	]);
	assert_eq!(context.packages.keys().collect::<Vec<_>>(), vec![
		"ARM::RteTest@0.1.0",
		"ARM::RteTestGenerator@0.1.0",
		"ARM::RteTest_DFP@0.2.0",
	]);

	assert_eq!(context.variables["Compiler"], "AC6");
	assert_eq!(context.variables["BuildType"], "Debug");
	assert_eq!(context.variables["Dname"], "RteTest_ARMCM0");

	assert_eq!(context.generators["RteTestGeneratorIdentifier"], "generated/RteTestGeneratorIdentifier");

	assert!(context.linker.script.ends_with("ac6_linker_script.sct"));
	assert_eq!(context.linker.regions, "RTE/Device/RteTest_ARMCM0/regions_RteTest_ARMCM0.h");
	assert!(project.join(&context.linker.regions).is_file());
	assert!(resolved.diagnostics.contains("regions header generated successfully"));

	let json = serde_json::to_value(&context).unwrap();
	assert_eq!(json["device-attributes"]["Dcore"], "Cortex-M0");
	assert_eq!(json["toolchain-attributes"]["Tcompiler"], "ARMCC");
}

#[test]
fn contexts_resolve_independently() {
	let _ = env_logger::builder().is_test(true).try_init();
	let db = projmgr_rs_test_utils::get_metadb().unwrap();
	let pack_root = tempfile::tempdir().unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), None));

	let solution = tempfile::tempdir().unwrap();
	let project = solution.path().join("test");
	std::fs::create_dir(&project).unwrap();

	let good = description("test.Debug+CM0", &project);
	let mut bad = description("test.Debug+Unknown", &project);
	bad.board.clear();
	bad.device = vec![ScopedValue::new("target-type", "RteTest_Unknown")];
	let mut cm3 = description("test.Release+CM3", &project);
	cm3.board = vec![ScopedValue::new("project", "RteTest Test board:Rev2")];
	cm3.components.retain(|c| c != "Device:Startup");

	let resolved = worker.resolve_contexts(&[good, bad, cm3]);
	let names: Vec<&str> = resolved.iter().map(|r| r.name.as_str()).collect();
	assert_eq!(names, vec!["test.Debug+CM0", "test.Debug+Unknown", "test.Release+CM3"]);

	assert!(resolved[0].result.is_ok());
	assert!(matches!(resolved[1].result, Err(projmgr_rs::Error::NotFound(_))));
	assert!(resolved[1].diagnostics.contains("specified device 'RteTest_Unknown' was not found among the installed packs."));

	let cm3 = resolved[2].result.as_ref().unwrap();
	assert_eq!(cm3.board, "Keil::RteTest Test board:Rev2");
	assert_eq!(cm3.device, "ARM::RteTest_ARMCM3");
	/* the default variant is restricted to Cortex-M0 */
	assert!(cm3.components.contains_key("ARM::RteTest:Dependency:Variant@0.9.9"));
	/* no toolchain registered, the compiler falls back */
	assert_eq!(cm3.toolchain.as_ref().unwrap().version.as_str(), "0.0.0");
	assert!(resolved[2].diagnostics.contains("no registered toolchain matches compiler 'AC6', using version 0.0.0"));
}

#[test]
fn ambiguous_board_revision() {
	let db = projmgr_rs_test_utils::get_metadb().unwrap();
	let pack_root = tempfile::tempdir().unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), None));
	let project = tempfile::tempdir().unwrap();

	let mut description = description("test.Debug+CM3", project.path());
	description.board = vec![ScopedValue::new("project", "Keil::RteTest Test board")];
	let resolved = worker.resolve_context(&description);
	assert!(matches!(resolved.result, Err(projmgr_rs::Error::Ambiguity(_))));
	assert!(resolved.diagnostics.contains("multiple boards were found for identifier 'Keil::RteTest Test board'"));
}

#[test]
fn exclusive_components_conflict() {
	let db = projmgr_rs_test_utils::get_metadb().unwrap();
	let pack_root = tempfile::tempdir().unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), None));
	let project = tempfile::tempdir().unwrap();

	let mut description = description("test.Debug+CM0", project.path());
	description.components = vec!["RteTest:ApiExclusive:S1".to_string(), "RteTest:ApiExclusive:S2".to_string()];
	let resolved = worker.resolve_context(&description);
	let Err(projmgr_rs::Error::Validation(results)) = resolved.result else { panic!("validation must fail") };
	assert_eq!(results.len(), 2);
	assert!(results.iter().all(|r| r.outcome == projmgr_rs::dependency::ValidationOutcome::Conflict));
	assert!(resolved.diagnostics.contains("deny RteTest:ApiExclusive:S2"));
}

#[test]
fn component_versions() {
	let db = projmgr_rs_test_utils::get_metadb().unwrap();
	let pack_root = tempfile::tempdir().unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), None));
	let project = tempfile::tempdir().unwrap();

	let cases = [
		("RteTest:TestVersion", Some("ARM::RteTest:TestVersion@3.3.3")),
		("RteTest:TestVersion@2.2.2", Some("ARM::RteTest:TestVersion@2.2.2")),
		("RteTest:TestVersion@>=1.0.0", Some("ARM::RteTest:TestVersion@3.3.3")),
		("RteTest:TestVersion@:2.5.0", Some("ARM::RteTest:TestVersion@2.2.2")),
		("RteTest:TestVersion@2.0.0", None),
		("RteTest:TestVersion@>=4.0.0", None),
	];
	for (request, expected) in cases {
		let mut description = description("test.Debug+CM0", project.path());
		description.components = vec![request.to_string()];
		let resolved = worker.resolve_context(&description);
		match expected {
			Some(key) => assert!(resolved.result.unwrap().components.contains_key(key), "{}", request),
			None => assert!(matches!(resolved.result, Err(projmgr_rs::Error::NotFound(_))), "{}", request),
		}
	}
}
