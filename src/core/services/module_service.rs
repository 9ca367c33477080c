use tracing::{debug, info};

use crate::errors::Confirmation;
use crate::project::{BudgetItem, Module, Project, DEFAULT_MODULE_NAME};

use super::{ServiceError, ServiceResult};

pub struct ModuleService;

impl ModuleService {
    /// Adds a module and makes it active.
    pub fn add(project: &mut Project, name: &str) -> ServiceResult<String> {
        let name = Self::validate_name(name)?;
        let id = project.new_module_id();
        project.modules.push(Module::new(id.clone(), name));
        project.active_module_id = Some(id.clone());
        project.touch();
        debug!(module = %id, "module added");
        Ok(id)
    }

    /// Blank names and unknown ids are ignored.
    pub fn rename(project: &mut Project, id: &str, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        let Some(module) = project.modules.iter_mut().find(|module| module.id == id) else {
            return false;
        };
        module.name = name.to_string();
        project.touch();
        true
    }

    /// Deep copies every item of `source_id` into a new active module. A
    /// blank name becomes `Copia de <source>`.
    pub fn clone(project: &mut Project, source_id: &str, name: &str) -> Option<String> {
        let source = project.module(source_id)?.clone();
        let name = if name.trim().is_empty() {
            format!("Copia de {}", source.name)
        } else {
            name.to_string()
        };
        let new_id = project.new_module_id();
        project.modules.push(Module::new(new_id.clone(), name));

        let originals: Vec<BudgetItem> = project.module_items(&source.id).cloned().collect();
        let copied = originals.len();
        for original in originals {
            let mut copy = original;
            copy.id = project.new_item_id();
            copy.module_id = new_id.clone();
            project.items.push(copy);
        }
        project.active_module_id = Some(new_id.clone());
        project.touch();
        info!(source = %source.id, module = %new_id, items = copied, "module cloned");
        Some(new_id)
    }

    /// Removes a module together with its items. The last module can never
    /// be deleted, and a module that still owns items needs confirmation.
    pub fn delete(
        project: &mut Project,
        id: &str,
        confirmation: Confirmation,
    ) -> ServiceResult<bool> {
        if project.modules.len() <= 1 {
            return Err(ServiceError::Rejected(
                "at least one module must exist".to_string(),
            ));
        }
        if project.module(id).is_none() {
            return Ok(false);
        }
        let owned = project.module_items(id).count();
        if owned > 0 {
            confirmation.require(&format!("delete module with {owned} item(s)"))?;
            project.items.retain(|item| item.module_id != id);
        }
        project.modules.retain(|module| module.id != id);
        project.active_module_id = project.modules.last().map(|module| module.id.clone());
        project.touch();
        info!(module = %id, items = owned, "module deleted");
        Ok(true)
    }

    pub fn switch(project: &mut Project, id: &str) -> bool {
        if project.module(id).is_none() {
            return false;
        }
        project.active_module_id = Some(id.to_string());
        project.touch();
        true
    }

    /// Resolves a module by id or by case-insensitive name.
    pub fn find<'a>(project: &'a Project, needle: &str) -> Option<&'a Module> {
        let wanted = needle.trim().to_lowercase();
        project.module(needle.trim()).or_else(|| {
            project
                .modules
                .iter()
                .find(|module| module.name.trim().to_lowercase() == wanted)
        })
    }

    fn validate_name(candidate: &str) -> ServiceResult<&str> {
        if candidate.trim().is_empty() {
            Err(ServiceError::Rejected("module name cannot be blank".into()))
        } else {
            Ok(candidate)
        }
    }

    pub(crate) fn reset(project: &mut Project) {
        let id = project.new_module_id();
        project.modules = vec![Module::new(id.clone(), DEFAULT_MODULE_NAME)];
        project.active_module_id = Some(id);
    }
}
