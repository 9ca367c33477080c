use tracing::debug;

use crate::errors::Confirmation;
use crate::project::{next_bank_code, BankItem, Project};

use super::item_service::ItemField;
use super::ServiceResult;

pub const NEW_TEMPLATE_DESCRIPTION: &str = "Nuevo APU";
pub const NEW_TEMPLATE_UNIT: &str = "m3";

pub struct BankService;

impl BankService {
    pub fn create(project: &mut Project) -> u64 {
        let id = project.new_bank_id();
        let code = next_bank_code(&project.bank);
        project.bank.push(BankItem::new(
            id,
            code,
            NEW_TEMPLATE_DESCRIPTION,
            NEW_TEMPLATE_UNIT,
        ));
        project.touch();
        debug!(template = id, code, "bank template created");
        id
    }

    pub fn delete(project: &mut Project, id: u64, confirmation: Confirmation) -> ServiceResult<bool> {
        if project.bank_item(id).is_none() {
            return Ok(false);
        }
        confirmation.require("delete bank template")?;
        project.bank.retain(|item| item.id != id);
        project.touch();
        debug!(template = id, "bank template deleted");
        Ok(true)
    }

    /// Only description and unit exist on a template header.
    pub fn update(project: &mut Project, id: u64, field: ItemField, text: &str) -> bool {
        let Some(template) = project.bank_item_mut(id) else {
            return false;
        };
        match field {
            ItemField::Description => template.description = text.to_string(),
            ItemField::Unit => template.unit = text.to_string(),
            ItemField::Quantity | ItemField::ProjectCode => return false,
        }
        project.touch();
        true
    }

    /// Templates whose description contains `term` (case-insensitive) or whose
    /// code contains it, sorted by description.
    pub fn search<'a>(project: &'a Project, term: &str) -> Vec<&'a BankItem> {
        let term = term.trim().to_lowercase();
        let mut found: Vec<&BankItem> = project
            .bank
            .iter()
            .filter(|item| {
                item.description.to_lowercase().contains(&term)
                    || item.code.to_string().contains(&term)
            })
            .collect();
        found.sort_by_key(|item| item.description.to_lowercase());
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_sequential_codes() {
        let mut project = Project::new();
        let first = BankService::create(&mut project);
        let second = BankService::create(&mut project);
        assert_eq!(project.bank_item(first).map(|t| t.code), Some(1));
        assert_eq!(project.bank_item(second).map(|t| t.code), Some(2));
        assert_eq!(project.bank[0].description, NEW_TEMPLATE_DESCRIPTION);
        assert_eq!(project.bank[0].unit, NEW_TEMPLATE_UNIT);
    }

    #[test]
    fn search_matches_description_or_code() {
        let mut project = Project::new();
        for name in ["Zapata", "muro de ladrillo", "Contrapiso"] {
            let id = BankService::create(&mut project);
            BankService::update(&mut project, id, ItemField::Description, name);
        }
        let names: Vec<&str> = BankService::search(&project, "")
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(names, vec!["Contrapiso", "muro de ladrillo", "Zapata"]);
        assert_eq!(BankService::search(&project, "MURO").len(), 1);
        assert_eq!(BankService::search(&project, "3")[0].description, "Contrapiso");
    }

    #[test]
    fn delete_is_guarded() {
        let mut project = Project::new();
        let id = BankService::create(&mut project);
        assert!(BankService::delete(&mut project, id, Confirmation::Pending).is_err());
        assert!(BankService::delete(&mut project, id, Confirmation::Confirmed).expect("delete"));
        assert!(project.bank.is_empty());
    }
}
