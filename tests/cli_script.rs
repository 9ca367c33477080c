mod common;

use apu_core::storage::{JsonStore, ProjectStore};
use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn script(home: &TempDir, input: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("apu_core_cli").expect("binary");
    cmd.env("APU_CORE_CLI_SCRIPT", "1")
        .env("APU_CORE_HOME", home.path())
        .env("NO_COLOR", "1")
        .write_stdin(input.to_string())
        .assert()
        .success()
}

#[test]
fn new_project_is_saved_with_settings() {
    let home = TempDir::new().expect("temp home");
    script(&home, "new obra\nset gg 12\nsettings\nsave\nexit\n")
        .stdout(contains("Project `obra` created."))
        .stdout(contains("gg = 12"))
        .stdout(contains("Project saved to"));

    let store = JsonStore::new(home.path().join("projects"), None).expect("store");
    let project = store.load("obra").expect("saved project");
    assert_eq!(project.settings.gg, 12.0);
}

#[test]
fn pending_changes_are_flushed_on_exit() {
    let home = TempDir::new().expect("temp home");
    script(&home, "new borrador\nset util 7\n");
    let store = JsonStore::new(home.path().join("projects"), None).expect("store");
    assert_eq!(store.load("borrador").expect("flushed").settings.util, 7.0);
}

#[test]
fn reports_and_catalog_sync_on_stored_project() {
    let home = TempDir::new().expect("temp home");
    let store = JsonStore::new(home.path().join("projects"), None).expect("store");
    store.save("obra", &common::sample_project()).expect("seed project");

    script(&home, "open obra\nsummary\ninsumos materials\nsync-budget\nexit\n")
        .stdout(contains("Opened project `obra` (2 item(s))."))
        .stdout(contains("Grand total:"))
        .stdout(contains("Cemento portland"))
        .stdout(contains("conflict:"))
        .stdout(contains("Updated 1 line(s) across 1 item(s)."));

    let project = store.load("obra").expect("reload");
    assert_eq!(project.items[1].resources.materials[0].price, 1.26);
}

#[test]
fn apu_sheet_prints_unit_price() {
    let home = TempDir::new().expect("temp home");
    let store = JsonStore::new(home.path().join("projects"), None).expect("store");
    store.save("obra", &common::sample_project()).expect("seed project");

    script(&home, "open obra\napu 101\napu bank 201\napu 5\nexit\n")
        .stdout(contains("Item 101 [m3]"))
        .stdout(contains("Contrapiso [m2]"))
        .stdout(contains("Unit price:"))
        .stdout(contains("no such item or template"));
}

#[test]
fn unknown_commands_get_suggestions() {
    let home = TempDir::new().expect("temp home");
    script(&home, "sumary\nexit\n")
        .stdout(contains("Unknown command `sumary`"))
        .stdout(contains("Suggestion: `summary`?"));
}

#[test]
fn commands_without_a_project_report_it() {
    let home = TempDir::new().expect("temp home");
    script(&home, "summary\nexit\n").stdout(contains("No project open"));
}

#[test]
fn last_module_delete_is_rejected() {
    let home = TempDir::new().expect("temp home");
    script(&home, "new casa\nmodules delete General\nmodules add Exterior\nmodules\nexit\n")
        .stdout(contains("at least one module must exist"))
        .stdout(contains("Module `Exterior` added"))
        .stdout(contains("Exterior"));
}

#[test]
fn version_and_help_render() {
    let home = TempDir::new().expect("temp home");
    script(&home, "version\nhelp\nhelp insumos\nexit\n")
        .stdout(contains("APU Core"))
        .stdout(contains("Available commands"))
        .stdout(contains("insumos [materials|labor|equipment]"));
}
