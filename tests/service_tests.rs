mod common;

use apu_core::core::services::{
    AddLineOutcome, ApuRef, BankService, CatalogService, ImportRow, ImportService, InsumoService,
    ItemService, LineField, LineService, ModuleService, ServiceError,
};
use apu_core::errors::Confirmation;
use apu_core::project::{Project, ResourceKind, ResourceLine};
use common::{close, sample_project};

#[test]
fn sole_module_cannot_be_deleted() {
    let mut project = Project::new();
    let only = project.modules[0].id.clone();
    let result = ModuleService::delete(&mut project, &only, Confirmation::Confirmed);
    assert!(matches!(result, Err(ServiceError::Rejected(_))));
    assert_eq!(project.modules.len(), 1);
    assert_eq!(project.active_module_id.as_deref(), Some(only.as_str()));
}

#[test]
fn deleting_a_populated_module_needs_confirmation() {
    let mut project = sample_project();
    let first = project.modules[0].id.clone();
    ModuleService::add(&mut project, "Instalaciones").expect("add module");

    let pending = ModuleService::delete(&mut project, &first, Confirmation::Pending);
    assert!(matches!(pending, Err(ServiceError::ConfirmationRequired(_))));
    assert_eq!(project.items.len(), 2);

    assert!(ModuleService::delete(&mut project, &first, Confirmation::Confirmed).expect("delete"));
    assert!(project.items.is_empty());
    assert!(project.items.iter().all(|item| project.module(&item.module_id).is_some()));
}

#[test]
fn cloned_module_gets_fresh_item_ids() {
    let mut project = sample_project();
    let source = project.modules[0].id.clone();
    let copy = ModuleService::clone(&mut project, &source, "").expect("clone");
    assert_eq!(project.module(&copy).map(|m| m.name.as_str()), Some("Copia de General"));
    assert_eq!(project.module_items(&copy).count(), 2);
    let mut ids: Vec<u64> = project.items.iter().map(|item| item.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn bank_round_trip_through_budget() {
    let mut project = sample_project();
    let (bank_id, code) = ItemService::save_to_bank(&mut project, 101).expect("save to bank");
    assert_eq!(code, 2);
    let added = ItemService::add_from_bank(&mut project, &[bank_id, 999]);
    assert_eq!(added.len(), 1);
    let item = project.item(added[0]).expect("added item");
    assert!(close(item.quantity, 1.0));
    assert_eq!(item.resources.materials.len(), 2);
    assert_eq!(BankService::search(&project, "item 101").len(), 1);
}

#[test]
fn item_quantity_accepts_expressions() {
    let mut project = sample_project();
    assert!(ItemService::update_quantity(&mut project, 102, "=2*(3+1.5)"));
    assert!(close(project.item(102).map(|i| i.quantity).unwrap_or_default(), 9.0));
    assert!(ItemService::update_quantity(&mut project, 102, "abc"));
    assert_eq!(project.item(102).map(|i| i.quantity), Some(0.0));
    assert!(!ItemService::update_quantity(&mut project, 7, "1"));
}

#[test]
fn duplicate_lines_are_reported_not_added() {
    let mut project = sample_project();
    let target = ApuRef::Budget(101);
    let outcome = LineService::add_line(
        &mut project,
        target,
        ResourceKind::Materials,
        ResourceLine::new("CEMENTO PORTLAND", "bolsa", 0.02, 63.0),
    );
    assert_eq!(outcome, Some(AddLineOutcome::Duplicate(0)));
    assert!(LineService::replace_duplicate(
        &mut project,
        target,
        ResourceKind::Materials,
        0,
        &ResourceLine::new("CEMENTO PORTLAND", "bolsa", 0.02, 63.0),
    ));
    let line = &project.item(101).expect("item").resources.materials[0];
    assert_eq!(line.unit, "bolsa");
    assert!(close(line.price, 63.0));

    assert!(LineService::update_line_field(
        &mut project,
        target,
        ResourceKind::Materials,
        1,
        LineField::Qty,
        "0.5/10"
    ));
    assert!(close(project.item(101).expect("item").resources.materials[1].qty, 0.05));
}

#[test]
fn insumo_price_edit_resolves_conflict() {
    let mut project = sample_project();
    let list = InsumoService::collect(&project, ResourceKind::Materials);
    let updated = InsumoService::apply_price(&mut project, ResourceKind::Materials, &list.entries[0], 1.3);
    assert_eq!(updated, 2);
    assert_eq!(InsumoService::collect(&project, ResourceKind::Materials).conflict_count(), 0);
}

#[test]
fn catalog_merge_is_guarded() {
    let mut project = Project::new();
    project.catalog.push(ResourceKind::Labor, "albañil ", "HR", 22.0);
    assert!(CatalogService::merge_duplicates(&mut project, Confirmation::Pending).is_err());
    assert_eq!(project.catalog.labor.len(), 3);
    let removed = CatalogService::merge_duplicates(&mut project, Confirmation::Confirmed).expect("merge");
    assert_eq!(removed, 1);
    assert!(close(project.catalog.labor[0].price, 22.0));
}

#[test]
fn imported_rows_land_in_active_module() {
    let mut project = sample_project();
    let second = ModuleService::add(&mut project, "Obra gruesa").expect("add module");
    let rows = vec![ImportRow {
        code: "2.1".into(),
        description: "Contrapiso de hormigón".into(),
        unit: "m2".into(),
        quantity: "40".into(),
    }];
    let summary = ImportService::import_budget_rows(&mut project, &rows);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.matched, 1);
    let imported = project.module_items(&second).next().expect("imported item");
    assert_eq!(imported.description, "Contrapiso de hormigón");
    assert_eq!(imported.resources.materials.len(), 1);
}

#[test]
fn clearing_the_budget_resets_modules() {
    let mut project = sample_project();
    ModuleService::add(&mut project, "Extra").expect("add module");
    assert!(ItemService::clear_budget(&mut project, Confirmation::Pending).is_err());
    assert_eq!(ItemService::clear_budget(&mut project, Confirmation::Confirmed).expect("clear"), 2);
    assert_eq!(project.modules.len(), 1);
    assert_eq!(project.modules[0].name, "General");
    assert_eq!(project.bank.len(), 1);
}
