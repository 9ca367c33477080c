use crate::consolidation::{self, ConsolidatedEntry, ConsolidatedList};
use crate::errors::Confirmation;
use crate::project::{Project, ResourceKind};

use super::ServiceResult;

/// Consolidated resource views over the live budget.
pub struct InsumoService;

impl InsumoService {
    pub fn collect(project: &Project, kind: ResourceKind) -> ConsolidatedList {
        consolidation::collect_across_items(&project.items, kind)
    }

    pub fn apply_price(
        project: &mut Project,
        kind: ResourceKind,
        entry: &ConsolidatedEntry,
        new_price: f64,
    ) -> usize {
        let updated = consolidation::apply_edited_price(&mut project.items, kind, entry, new_price);
        if updated > 0 {
            project.touch();
        }
        updated
    }

    pub fn apply_prices(project: &mut Project, kind: ResourceKind, entries: &[ConsolidatedEntry]) -> usize {
        let updated = consolidation::apply_edited_prices(&mut project.items, kind, entries);
        if updated > 0 {
            project.touch();
        }
        updated
    }

    pub fn unify(
        project: &mut Project,
        kind: ResourceKind,
        selected: &[ConsolidatedEntry],
        master_index: usize,
        confirmation: Confirmation,
    ) -> ServiceResult<usize> {
        let rewritten =
            consolidation::unify(&mut project.items, kind, selected, master_index, confirmation)?;
        if rewritten > 0 {
            project.touch();
        }
        Ok(rewritten)
    }
}
