mod common;

use std::fs;
use std::time::{Duration, Instant};

use apu_core::project::Project;
use apu_core::storage::{JsonStore, ProjectStore, SaveOutcome, SaveScheduler};
use apu_core::utils::tmp_path;
use common::sample_project;
use tempfile::tempdir;

#[test]
fn failed_save_preserves_original_file() {
    let temp = tempdir().expect("temp dir");
    let store = JsonStore::new(temp.path(), Some(2)).expect("store");
    let mut project = sample_project();
    store.save("obra", &project).expect("initial save");
    let path = store.document_path("obra");
    let original = fs::read_to_string(&path).expect("read original");

    // A directory where the temp file should go makes the write fail.
    fs::create_dir_all(tmp_path(&path)).expect("block tmp path");
    project.settings.gg = 99.0;
    assert!(store.save("obra", &project).is_err());

    let current = fs::read_to_string(&path).expect("read after failure");
    assert_eq!(current, original);
}

#[test]
fn document_keeps_stored_field_names() {
    let temp = tempdir().expect("temp dir");
    let store = JsonStore::new(temp.path(), None).expect("store");
    store.save("obra", &sample_project()).expect("save");
    let json = fs::read_to_string(store.document_path("obra")).expect("read");
    for key in ["\"database\"", "\"itemBank\"", "\"projectItems\"", "\"materiales\"", "\"mano_obra\"", "\"moduleId\""] {
        assert!(json.contains(key), "missing {key}");
    }
}

#[test]
fn loading_repairs_orphan_items() {
    let temp = tempdir().expect("temp dir");
    let store = JsonStore::new(temp.path(), None).expect("store");
    let mut project = sample_project();
    project.items[1].module_id = "mod_gone".into();
    project.active_module_id = Some("mod_gone".into());
    store.save("obra", &project).expect("save");

    let loaded = store.load("obra").expect("load");
    let first = loaded.modules[0].id.clone();
    assert!(loaded.items.iter().all(|item| item.module_id == first));
    assert_eq!(loaded.active_module_id.as_deref(), Some(first.as_str()));
}

#[test]
fn legacy_documents_with_loose_numbers_load() {
    let temp = tempdir().expect("temp dir");
    let store = JsonStore::new(temp.path(), None).expect("store");
    let legacy = r#"{
        "settings": {"social": "55", "gg": 12, "decimals_total": 3, "numberFormat": "euro"},
        "projectItems": [{
            "id": 1700000000000.0, "description": "Muro", "unit": "m2",
            "quantity": "12,5", "moduleId": "mod_1",
            "materiales": [{"desc": "Ladrillo", "unit": "u", "qty": "60", "price": 0.9}]
        }],
        "modules": [{"id": "mod_1", "name": "General"}]
    }"#;
    fs::write(store.document_path("legacy"), legacy).expect("seed legacy file");
    let project = store.load("legacy").expect("load legacy");
    assert_eq!(project.items[0].id, 1_700_000_000_000);
    assert_eq!(project.settings.precision.total, 3);
    assert_eq!(project.catalog.materials.len(), 3);
    assert_eq!(project.items[0].resources.materials[0].qty, 60.0);
}

#[test]
fn restore_brings_back_a_backup() {
    let temp = tempdir().expect("temp dir");
    let store = JsonStore::new(temp.path(), Some(3)).expect("store");
    let mut project = Project::new();
    project.settings.util = 8.0;
    store.save("obra", &project).expect("first save");
    project.settings.util = 15.0;
    store.save("obra", &project).expect("second save");

    let backups = store.list_backups("obra").expect("backups");
    assert_eq!(backups.len(), 1);
    let restored = store.restore("obra", &backups[0]).expect("restore");
    assert_eq!(restored.settings.util, 8.0);
    assert!(store.restore("obra", "missing.json").is_err());
}

#[test]
fn scheduler_writes_once_after_quiet_period() {
    let temp = tempdir().expect("temp dir");
    let store = JsonStore::new(temp.path(), None).expect("store");
    let project = sample_project();
    let mut scheduler = SaveScheduler::default();
    let start = Instant::now();

    scheduler.mark_dirty(start);
    scheduler.mark_dirty(start + Duration::from_millis(1000));
    assert_eq!(
        scheduler.flush_if_due(start + Duration::from_millis(2000), &store, "obra", &project),
        SaveOutcome::Pending
    );
    assert!(!store.exists("obra"));
    assert_eq!(
        scheduler.flush_if_due(start + Duration::from_millis(2500), &store, "obra", &project),
        SaveOutcome::Saved
    );
    assert!(store.exists("obra"));
    assert!(store.list_backups("obra").expect("backups").is_empty());
}
