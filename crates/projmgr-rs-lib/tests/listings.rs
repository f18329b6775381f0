use pretty_assertions::assert_eq;
use projmgr_rs::context::*;
use projmgr_rs::{Diagnostics, MetaDB, ProjMgrWorker};

#[test]
fn catalog_listings() {
	let db = projmgr_rs_test_utils::get_metadb().unwrap();
	let compiler_root = projmgr_rs_test_utils::create_compiler_root(&[("GCC", "11.3.1"), ("AC6", "6.18.0"), ("AC6", "6.19.0")]).unwrap();
	let pack_root = tempfile::tempdir().unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), Some(&compiler_root)));

	assert_eq!(worker.list_devices(""), vec![
		"ARM::RteTest_ARMCM0",
		"ARM::RteTest_ARMCM0_Dual",
		"ARM::RteTest_ARMCM0_Dual:cm0_core0",
		"ARM::RteTest_ARMCM0_Dual:cm0_core1",
		"ARM::RteTest_ARMCM3",
	]);
	assert_eq!(worker.list_devices("Dual core1"), vec!["ARM::RteTest_ARMCM0_Dual:cm0_core1"]);

	assert_eq!(worker.list_boards(""), vec![
		"Keil::RteTest Dummy board:1.1.1",
		"Keil::RteTest Test board:Rev1",
		"Keil::RteTest Test board:Rev2",
	]);
	assert_eq!(worker.list_components("TestVersion"), vec![
		"ARM::RteTest:TestVersion@1.1.1",
		"ARM::RteTest:TestVersion@2.2.2",
		"ARM::RteTest:TestVersion@3.3.3",
	]);
	assert_eq!(worker.list_toolchains(""), vec!["AC6@6.18.0", "AC6@6.19.0", "GCC@11.3.1"]);
	assert_eq!(worker.list_toolchains("AC6 19"), vec!["AC6@6.19.0"]);

	assert_eq!(worker.list_packs(&[], "").unwrap(), vec![
		"ARM::RteTest@0.1.0",
		"ARM::RteTestGenerator@0.1.0",
		"ARM::RteTest_DFP@0.2.0",
	]);
	assert_eq!(worker.list_packs(&["ARM::RteTest_DFP@0.1.1".to_string()], "").unwrap(), vec!["ARM::RteTest_DFP@0.1.1"]);
	assert!(worker.list_packs(&["ARM::RteTest_Unknown".to_string()], "").is_err());
}

#[test]
fn layers_shipped_in_packs() {
	let pack_root = projmgr_rs_test_utils::create_pack_root().unwrap();
	let db = MetaDB::load_from_dir(pack_root.path()).unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), None));

	let mut diags = Diagnostics::default();
	let layers = worker.collect_layers_from_packs(&[], &mut diags).unwrap();
	let types: Vec<(&str, &str)> = layers.iter().map(|l| (l.layer_type.as_str(), l.for_board.as_str())).collect();
	assert_eq!(types, vec![("Board", "Keil::RteTest Dummy board"), ("Board", "RteTest Test board")]);
	assert_eq!(layers[0].components, vec!["RteTest:CORE"]);
	assert!(diags.contains("layer 'Shield' of pack 'ARM::RteTest@0.1.0' was not found"));

	let project = tempfile::tempdir().unwrap();
	let description = ContextDescription {
		name: "layers.Debug+CM0".to_string(),
		board: vec![ScopedValue::new("project", "RteTest Dummy board")],
		directories: Directories { project: project.path().to_path_buf(), ..Default::default() },
		..Default::default()
	};
	let listed = worker.list_layers(&description, "").unwrap();
	assert_eq!(listed.len(), 1);
	assert!(listed[0].ends_with("ARM/RteTest_DFP/0.2.0/Layers/dummy_board.clayer.json"), "{}", listed[0]);
}

#[test]
fn connections_choose_the_board_layer() {
	let pack_root = projmgr_rs_test_utils::create_pack_root().unwrap();
	let db = MetaDB::load_from_dir(pack_root.path()).unwrap();
	let worker = ProjMgrWorker::new(&db, projmgr_rs_test_utils::options(pack_root.path(), None));

	let mut diags = Diagnostics::default();
	let project = tempfile::tempdir().unwrap();
	let description = ContextDescription {
		name: "layers.Debug+CM3".to_string(),
		board: vec![ScopedValue::new("project", "RteTest Test board:Rev1")],
		compiler: vec![ScopedValue::new("project", "GCC")],
		connections: vec![projmgr_rs::layer_resolver::ConnectItem {
			connect: "app".to_string(),
			consumes: vec![("CORE".to_string(), String::new())],
			..Default::default()
		}],
		candidate_layers: worker.collect_layers_from_packs(&[], &mut diags).unwrap(),
		directories: Directories { project: project.path().to_path_buf(), ..Default::default() },
		..Default::default()
	};

	let resolved = worker.resolve_context(&description);
	let context = resolved.result.unwrap();
	assert_eq!(context.layers.len(), 1);
	assert!(context.layers[0].ends_with("Layers/test_board.clayer.json"));
	assert!(context.variables["Board-Layer"].ends_with("Layers/test_board.clayer.json"));
	assert!(context.components.contains_key("ARM::RteTest:CORE@0.1.1"));
	assert!(resolved.diagnostics.contains("layer skipped"));
}
