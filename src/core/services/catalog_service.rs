use std::str::FromStr;

use tracing::info;

use crate::catalog_sync::{merge_duplicate_catalog_entries, sync_catalog_to_lines, SyncReport};
use crate::errors::Confirmation;
use crate::project::{CatalogEntry, Project, ResourceKind, SortDirection, SortField};

use super::ServiceResult;

pub const NEW_ROW_UNIT: &str = "u";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
    Desc,
    Unit,
    Price,
}

impl FromStr for CatalogField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" | "description" => Ok(CatalogField::Desc),
            "unit" => Ok(CatalogField::Unit),
            "price" => Ok(CatalogField::Price),
            other => Err(format!("unknown catalog field `{other}`")),
        }
    }
}

pub struct CatalogService;

impl CatalogService {
    /// Appends a blank row priced at zero.
    pub fn add_row(project: &mut Project, kind: ResourceKind) -> u64 {
        let id = project.catalog.push(kind, "", NEW_ROW_UNIT, 0.0);
        project.touch();
        id
    }

    pub fn update_field(
        project: &mut Project,
        kind: ResourceKind,
        id: u64,
        field: CatalogField,
        text: &str,
    ) -> bool {
        let policy = project.number_policy();
        let Some(entry) = project
            .catalog
            .list_mut(kind)
            .iter_mut()
            .find(|entry| entry.id == id)
        else {
            return false;
        };
        match field {
            CatalogField::Desc => entry.desc = text.to_string(),
            CatalogField::Unit => entry.unit = text.to_string(),
            CatalogField::Price => entry.price = policy.evaluate(text),
        }
        project.touch();
        true
    }

    pub fn delete(
        project: &mut Project,
        kind: ResourceKind,
        id: u64,
        confirmation: Confirmation,
    ) -> ServiceResult<bool> {
        let Some(index) = project.catalog.position_by_id(kind, id) else {
            return Ok(false);
        };
        confirmation.require("delete catalog entry")?;
        project.catalog.list_mut(kind).remove(index);
        project.catalog.recode(kind);
        project.touch();
        Ok(true)
    }

    pub fn sort_by(
        project: &mut Project,
        kind: ResourceKind,
        field: SortField,
        direction: SortDirection,
    ) {
        project.catalog.sort_by(kind, field, direction);
        project.touch();
    }

    /// Entries whose description or code contains `term`, case-insensitive.
    pub fn search<'a>(project: &'a Project, kind: ResourceKind, term: &str) -> Vec<&'a CatalogEntry> {
        let term = term.trim().to_lowercase();
        project
            .catalog
            .list(kind)
            .iter()
            .filter(|entry| {
                entry.desc.to_lowercase().contains(&term) || entry.code.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn merge_duplicates(project: &mut Project, confirmation: Confirmation) -> ServiceResult<usize> {
        confirmation.require("merge duplicate catalog entries")?;
        let removed = merge_duplicate_catalog_entries(&mut project.catalog);
        if removed > 0 {
            project.touch();
        }
        Ok(removed)
    }

    /// First pass of a catalog sync: bank templates.
    pub fn sync_to_bank(project: &mut Project, confirmation: Confirmation) -> ServiceResult<SyncReport> {
        confirmation.require("update bank prices from catalog")?;
        let report = sync_catalog_to_lines(&project.catalog, &mut project.bank);
        if !report.is_empty() {
            project.touch();
        }
        info!(updated = report.updated_count, "bank synced to catalog");
        Ok(report)
    }

    /// Optional second pass: the live budget.
    pub fn sync_to_budget(project: &mut Project, confirmation: Confirmation) -> ServiceResult<SyncReport> {
        confirmation.require("update budget prices from catalog")?;
        let report = sync_catalog_to_lines(&project.catalog, &mut project.items);
        if !report.is_empty() {
            project.touch();
        }
        info!(updated = report.updated_count, "budget synced to catalog");
        Ok(report)
    }
}
