use std::str::FromStr;

use tracing::{debug, info};

use crate::errors::Confirmation;
use crate::project::{next_bank_code, BankItem, BudgetItem, Project};

use super::module_service::ModuleService;
use super::{move_element, ServiceResult};

pub const NEW_ITEM_DESCRIPTION: &str = "Nuevo Ítem";
pub const NEW_ITEM_UNIT: &str = "glb";

/// Editable scalar fields of an APU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Unit,
    Quantity,
    ProjectCode,
}

impl FromStr for ItemField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "description" | "desc" => Ok(ItemField::Description),
            "unit" => Ok(ItemField::Unit),
            "quantity" | "qty" => Ok(ItemField::Quantity),
            "code" | "project_code" | "projectcode" => Ok(ItemField::ProjectCode),
            other => Err(format!("unknown item field `{other}`")),
        }
    }
}

pub struct ItemService;

impl ItemService {
    /// Appends a placeholder item to the active module.
    pub fn create_empty(project: &mut Project) -> u64 {
        let id = project.new_item_id();
        let module = project.current_module_id();
        project.items.push(BudgetItem::new(
            id,
            NEW_ITEM_DESCRIPTION,
            NEW_ITEM_UNIT,
            1.0,
            module,
        ));
        project.touch();
        debug!(item = id, "budget item created");
        id
    }

    /// Inserts a deep copy right after the source item.
    pub fn duplicate(project: &mut Project, id: u64) -> Option<u64> {
        let index = project.items.iter().position(|item| item.id == id)?;
        let mut copy = project.items[index].clone();
        copy.id = project.new_item_id();
        let new_id = copy.id;
        project.items.insert(index + 1, copy);
        project.touch();
        debug!(source = id, item = new_id, "budget item duplicated");
        Some(new_id)
    }

    pub fn delete(project: &mut Project, id: u64, confirmation: Confirmation) -> ServiceResult<bool> {
        if project.item(id).is_none() {
            return Ok(false);
        }
        confirmation.require("delete budget item")?;
        project.items.retain(|item| item.id != id);
        project.touch();
        debug!(item = id, "budget item deleted");
        Ok(true)
    }

    /// Sets one header field from user text. Quantities go through the
    /// project's number policy.
    pub fn update(project: &mut Project, id: u64, field: ItemField, text: &str) -> bool {
        let policy = project.number_policy();
        let Some(item) = project.item_mut(id) else {
            return false;
        };
        match field {
            ItemField::Description => item.description = text.to_string(),
            ItemField::Unit => item.unit = text.to_string(),
            ItemField::Quantity => item.quantity = policy.evaluate(text),
            ItemField::ProjectCode => item.project_code = text.to_string(),
        }
        project.touch();
        true
    }

    pub fn update_description(project: &mut Project, id: u64, text: &str) -> bool {
        Self::update(project, id, ItemField::Description, text)
    }

    pub fn update_unit(project: &mut Project, id: u64, text: &str) -> bool {
        Self::update(project, id, ItemField::Unit, text)
    }

    pub fn update_quantity(project: &mut Project, id: u64, text: &str) -> bool {
        Self::update(project, id, ItemField::Quantity, text)
    }

    /// Reorders items of one module. `from` and `to` are positions within
    /// the module; items of other modules keep their slots.
    pub fn move_within_module(project: &mut Project, module_id: &str, from: usize, to: usize) -> bool {
        let slots: Vec<usize> = project
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.module_id == module_id)
            .map(|(idx, _)| idx)
            .collect();
        let mut ordered: Vec<BudgetItem> = slots.iter().map(|&idx| project.items[idx].clone()).collect();
        if !move_element(&mut ordered, from, to) {
            return false;
        }
        for (slot, item) in slots.into_iter().zip(ordered) {
            project.items[slot] = item;
        }
        project.touch();
        true
    }

    /// Copies bank templates into the active module with quantity 1.
    /// Unknown ids are skipped.
    pub fn add_from_bank(project: &mut Project, bank_ids: &[u64]) -> Vec<u64> {
        let module = project.current_module_id();
        let mut added = Vec::new();
        for bank_id in bank_ids {
            let Some(template) = project.bank_item(*bank_id).cloned() else {
                continue;
            };
            let id = project.new_item_id();
            project
                .items
                .push(BudgetItem::from_template(&template, id, module.clone()));
            added.push(id);
        }
        if !added.is_empty() {
            project.touch();
        }
        info!(added = added.len(), "bank templates added to budget");
        added
    }

    /// Stores a copy of a budget item in the bank and returns its id and
    /// display code.
    pub fn save_to_bank(project: &mut Project, id: u64) -> Option<(u64, u32)> {
        let item = project.item(id)?.clone();
        let bank_id = project.new_bank_id();
        let code = next_bank_code(&project.bank);
        project
            .bank
            .push(BankItem::from_budget_item(&item, bank_id, code));
        project.touch();
        debug!(item = id, bank = bank_id, code, "budget item saved to bank");
        Some((bank_id, code))
    }

    /// Drops every budget item and resets modules to a single "General".
    /// The bank and catalog are kept.
    pub fn clear_budget(project: &mut Project, confirmation: Confirmation) -> ServiceResult<usize> {
        confirmation.require("clear budget")?;
        let removed = project.items.len();
        project.items.clear();
        ModuleService::reset(project);
        project.touch();
        info!(removed, "budget cleared");
        Ok(removed)
    }
}
