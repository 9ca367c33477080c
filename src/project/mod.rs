//! The budget document: settings, catalog, bank, modules, and live items.

pub mod catalog;
pub mod ids;
pub mod item;
pub mod module;
pub mod resource;
pub mod settings;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use catalog::{Catalog, CatalogEntry, SortDirection, SortField};
pub use item::{next_bank_code, Apu, BankItem, BudgetItem};
pub use module::{Module, DEFAULT_MODULE_NAME};
pub use resource::{match_key, ResourceKind, ResourceLine, ResourceSet};
pub use settings::{SettingField, Settings};

use crate::number::NumberPolicy;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub settings: Settings,
    #[serde(rename = "database", default = "Catalog::seeded")]
    pub catalog: Catalog,
    #[serde(rename = "itemBank", default)]
    pub bank: Vec<BankItem>,
    #[serde(rename = "projectItems", default)]
    pub items: Vec<BudgetItem>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(rename = "activeModuleId", default)]
    pub active_module_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Project::schema_version_default")]
    pub schema_version: u8,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// A fresh document with the seed catalog and a single "General" module.
    pub fn new() -> Self {
        let now = Utc::now();
        let module = Module::new(ids::next_module_id(|_| false), DEFAULT_MODULE_NAME);
        Self {
            id: Uuid::new_v4(),
            settings: Settings::default(),
            catalog: Catalog::seeded(),
            bank: Vec::new(),
            items: Vec::new(),
            active_module_id: Some(module.id.clone()),
            modules: vec![module],
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn number_policy(&self) -> NumberPolicy {
        self.settings.number_policy()
    }

    /// Restores structural invariants of a loaded document and reports each
    /// repair performed.
    pub fn repair(&mut self) -> Vec<String> {
        let mut notes = Vec::new();

        if self.modules.is_empty() {
            let module = Module::new(ids::next_module_id(|_| false), DEFAULT_MODULE_NAME);
            notes.push(format!("created default module `{}`", module.name));
            self.modules.push(module);
        }

        let active_ok = self
            .active_module_id
            .as_deref()
            .map(|id| self.module(id).is_some())
            .unwrap_or(false);
        if !active_ok {
            let first = self.modules[0].id.clone();
            notes.push(format!("active module reset to `{first}`"));
            self.active_module_id = Some(first);
        }

        let module_ids: HashSet<String> = self.modules.iter().map(|m| m.id.clone()).collect();
        let fallback = self.modules[0].id.clone();
        let mut orphans = 0;
        for item in &mut self.items {
            if !module_ids.contains(&item.module_id) {
                item.module_id = fallback.clone();
                orphans += 1;
            }
        }
        if orphans > 0 {
            notes.push(format!("{orphans} item(s) moved to module `{fallback}`"));
        }

        let fixed = reassign_ids(self.items.iter_mut().map(|item| &mut item.id));
        if fixed > 0 {
            notes.push(format!("{fixed} budget item id(s) regenerated"));
        }
        let fixed = reassign_ids(self.bank.iter_mut().map(|item| &mut item.id));
        if fixed > 0 {
            notes.push(format!("{fixed} bank template id(s) regenerated"));
        }
        let mut fixed = 0;
        for kind in ResourceKind::ALL {
            fixed += reassign_ids(self.catalog.list_mut(kind).iter_mut().map(|entry| &mut entry.id));
        }
        if fixed > 0 {
            notes.push(format!("{fixed} catalog id(s) regenerated"));
        }
        self.catalog.recode_all();

        notes
    }

    pub fn active_module(&self) -> Option<&Module> {
        self.active_module_id
            .as_deref()
            .and_then(|id| self.module(id))
    }

    /// Id of the active module, falling back to the first module.
    pub fn current_module_id(&self) -> String {
        self.active_module()
            .or_else(|| self.modules.first())
            .map(|module| module.id.clone())
            .unwrap_or_default()
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn module_items<'a>(&'a self, module_id: &'a str) -> impl Iterator<Item = &'a BudgetItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.module_id == module_id)
    }

    pub fn item(&self, id: u64) -> Option<&BudgetItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_mut(&mut self, id: u64) -> Option<&mut BudgetItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn bank_item(&self, id: u64) -> Option<&BankItem> {
        self.bank.iter().find(|item| item.id == id)
    }

    pub fn bank_item_mut(&mut self, id: u64) -> Option<&mut BankItem> {
        self.bank.iter_mut().find(|item| item.id == id)
    }

    pub fn new_item_id(&self) -> u64 {
        ids::next_id(|candidate| self.items.iter().any(|item| item.id == candidate))
    }

    pub fn new_bank_id(&self) -> u64 {
        ids::next_id(|candidate| self.bank.iter().any(|item| item.id == candidate))
    }

    pub fn new_module_id(&self) -> String {
        ids::next_module_id(|candidate| self.modules.iter().any(|module| module.id == candidate))
    }
}

/// Gives a fresh id to every zero or repeated id in the sequence.
fn reassign_ids<'a>(targets: impl Iterator<Item = &'a mut u64>) -> usize {
    let mut slots: Vec<&mut u64> = targets.collect();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut needs_new = Vec::new();
    for (idx, slot) in slots.iter().enumerate() {
        if **slot == 0 || !seen.insert(**slot) {
            needs_new.push(idx);
        }
    }
    let count = needs_new.len();
    for idx in needs_new {
        let id = ids::next_id(|candidate| seen.contains(&candidate));
        seen.insert(id);
        *slots[idx] = id;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_has_general_module() {
        let project = Project::new();
        assert_eq!(project.modules.len(), 1);
        assert_eq!(project.modules[0].name, DEFAULT_MODULE_NAME);
        assert_eq!(
            project.active_module_id.as_deref(),
            Some(project.modules[0].id.as_str())
        );
        assert_eq!(project.catalog.len(), 7);
    }

    #[test]
    fn empty_document_loads_with_defaults() {
        let mut project: Project = serde_json::from_str("{}").expect("parse project");
        let notes = project.repair();
        assert_eq!(project.modules.len(), 1);
        assert!(!notes.is_empty());
        assert_eq!(project.catalog.materials.len(), 3);
        assert!((project.settings.social - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repair_fixes_orphans_and_duplicate_ids() {
        let json = r#"{
            "modules": [{"id": "mod_a", "name": "Obra gruesa"}],
            "activeModuleId": "mod_missing",
            "projectItems": [
                {"id": 7, "description": "A", "unit": "m2", "quantity": 1, "moduleId": "mod_a"},
                {"id": 7, "description": "B", "unit": "m2", "quantity": 1, "moduleId": "gone"}
            ]
        }"#;
        let mut project: Project = serde_json::from_str(json).expect("parse project");
        project.repair();
        assert_eq!(project.active_module_id.as_deref(), Some("mod_a"));
        assert!(project.items.iter().all(|item| item.module_id == "mod_a"));
        assert_ne!(project.items[0].id, project.items[1].id);
        assert_eq!(project.items[0].id, 7);
    }

    #[test]
    fn document_keys_round_trip() {
        let project = Project::new();
        let json = serde_json::to_value(&project).expect("serialize project");
        for key in ["database", "itemBank", "projectItems", "modules", "activeModuleId", "settings"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert!(json["settings"].get("numberFormat").is_some());
        assert!(json["settings"].get("decimals_yield").is_some());
    }
}
