use std::str::FromStr;

use tracing::debug;

use crate::errors::Confirmation;
use crate::project::{Project, ResourceKind, ResourceLine};

use super::{move_element, ApuRef, ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddLineOutcome {
    Added,
    /// A line with the same description already sits at this index.
    Duplicate(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineField {
    Desc,
    Unit,
    Qty,
    Price,
}

impl FromStr for LineField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" | "description" => Ok(LineField::Desc),
            "unit" => Ok(LineField::Unit),
            "qty" | "yield" => Ok(LineField::Qty),
            "price" => Ok(LineField::Price),
            other => Err(format!("unknown line field `{other}`")),
        }
    }
}

/// Edits the resource lists of budget items and bank templates alike.
pub struct LineService;

impl LineService {
    /// Appends `line` unless a line with the same (case-insensitive)
    /// description exists, in which case nothing changes and the existing
    /// index is reported. `None` when the target does not exist.
    pub fn add_line(
        project: &mut Project,
        target: ApuRef,
        kind: ResourceKind,
        line: ResourceLine,
    ) -> Option<AddLineOutcome> {
        let apu = target.resolve_mut(project)?;
        let lines = apu.lines_mut(kind);
        let wanted = line.desc.to_lowercase();
        if let Some(existing) = lines.iter().position(|l| l.desc.to_lowercase() == wanted) {
            return Some(AddLineOutcome::Duplicate(existing));
        }
        lines.push(line);
        project.touch();
        Some(AddLineOutcome::Added)
    }

    /// Resolves a duplicate by copying the incoming price and unit onto the
    /// existing row.
    pub fn replace_duplicate(
        project: &mut Project,
        target: ApuRef,
        kind: ResourceKind,
        index: usize,
        line: &ResourceLine,
    ) -> bool {
        let Some(apu) = target.resolve_mut(project) else {
            return false;
        };
        let Some(existing) = apu.lines_mut(kind).get_mut(index) else {
            return false;
        };
        existing.price = line.price;
        existing.unit = line.unit.clone();
        project.touch();
        true
    }

    /// Numeric fields are evaluated through the project's number policy.
    pub fn update_line_field(
        project: &mut Project,
        target: ApuRef,
        kind: ResourceKind,
        index: usize,
        field: LineField,
        text: &str,
    ) -> bool {
        let policy = project.number_policy();
        let Some(apu) = target.resolve_mut(project) else {
            return false;
        };
        let Some(line) = apu.lines_mut(kind).get_mut(index) else {
            return false;
        };
        match field {
            LineField::Desc => line.desc = text.to_string(),
            LineField::Unit => line.unit = text.to_string(),
            LineField::Qty => line.qty = policy.evaluate(text),
            LineField::Price => line.price = policy.evaluate(text),
        }
        project.touch();
        true
    }

    pub fn remove_line(
        project: &mut Project,
        target: ApuRef,
        kind: ResourceKind,
        index: usize,
        confirmation: Confirmation,
    ) -> ServiceResult<bool> {
        let exists = target
            .resolve(project)
            .map(|apu| index < apu.lines(kind).len())
            .unwrap_or(false);
        if !exists {
            return Ok(false);
        }
        confirmation.require("remove resource line")?;
        if let Some(apu) = target.resolve_mut(project) {
            apu.lines_mut(kind).remove(index);
        }
        project.touch();
        Ok(true)
    }

    pub fn move_line(
        project: &mut Project,
        target: ApuRef,
        kind: ResourceKind,
        from: usize,
        to: usize,
    ) -> bool {
        let Some(apu) = target.resolve_mut(project) else {
            return false;
        };
        if !move_element(apu.lines_mut(kind), from, to) {
            return false;
        }
        project.touch();
        true
    }

    /// Creates a catalog entry and adds it to the target with yield 1.
    /// Returns the catalog id, or `None` when the target does not exist.
    pub fn quick_create(
        project: &mut Project,
        target: ApuRef,
        kind: ResourceKind,
        desc: &str,
        unit: &str,
        price_text: &str,
    ) -> ServiceResult<Option<u64>> {
        if desc.trim().is_empty() {
            return Err(ServiceError::Rejected(
                "resource description cannot be blank".into(),
            ));
        }
        if target.resolve(project).is_none() {
            return Ok(None);
        }
        let price = project.number_policy().evaluate(price_text);
        let (desc, unit) = (desc.trim(), unit.trim());
        let catalog_id = project.catalog.push(kind, desc, unit, price);
        if let Some(apu) = target.resolve_mut(project) {
            apu.lines_mut(kind)
                .push(ResourceLine::new(desc, unit, 1.0, price));
        }
        project.touch();
        debug!(kind = %kind, desc, catalog = catalog_id, "resource quick-created");
        Ok(Some(catalog_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::{BankService, ItemService};

    fn project_with_item() -> (Project, ApuRef) {
        let mut project = Project::new();
        let id = ItemService::create_empty(&mut project);
        (project, ApuRef::Budget(id))
    }

    #[test]
    fn duplicate_description_is_reported_not_added() {
        let (mut project, target) = project_with_item();
        let line = ResourceLine::new("Arena fina", "m3", 0.5, 150.0);
        assert_eq!(
            LineService::add_line(&mut project, target, ResourceKind::Materials, line),
            Some(AddLineOutcome::Added)
        );
        let again = ResourceLine::new("ARENA FINA", "m3", 0.7, 155.0);
        assert_eq!(
            LineService::add_line(&mut project, target, ResourceKind::Materials, again.clone()),
            Some(AddLineOutcome::Duplicate(0))
        );
        assert!(LineService::replace_duplicate(
            &mut project,
            target,
            ResourceKind::Materials,
            0,
            &again
        ));
        let line = &project.items[0].resources.materials[0];
        assert_eq!(line.price, 155.0);
        assert_eq!(line.qty, 0.5);
        assert_eq!(line.desc, "Arena fina");
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let mut project = Project::new();
        let line = ResourceLine::new("Grava", "m3", 1.0, 1.0);
        assert_eq!(
            LineService::add_line(&mut project, ApuRef::Bank(1), ResourceKind::Materials, line),
            None
        );
    }

    #[test]
    fn field_updates_use_number_policy() {
        let (mut project, target) = project_with_item();
        LineService::add_line(
            &mut project,
            target,
            ResourceKind::Labor,
            ResourceLine::new("Albañil", "hr", 1.0, 20.0),
        );
        project.settings.number_format = crate::number::NumberFormat::Euro;
        assert!(LineService::update_line_field(
            &mut project,
            target,
            ResourceKind::Labor,
            0,
            LineField::Price,
            "1.250,5"
        ));
        assert_eq!(project.items[0].resources.labor[0].price, 1250.5);
        assert!(!LineService::update_line_field(
            &mut project,
            target,
            ResourceKind::Labor,
            3,
            LineField::Qty,
            "2"
        ));
    }

    #[test]
    fn remove_and_move_lines() {
        let (mut project, target) = project_with_item();
        for desc in ["A", "B", "C"] {
            LineService::add_line(
                &mut project,
                target,
                ResourceKind::Equipment,
                ResourceLine::new(desc, "hr", 1.0, 1.0),
            );
        }
        assert!(LineService::move_line(&mut project, target, ResourceKind::Equipment, 2, 0));
        let pending = LineService::remove_line(
            &mut project,
            target,
            ResourceKind::Equipment,
            0,
            Confirmation::Pending,
        );
        assert!(pending.is_err());
        assert!(LineService::remove_line(
            &mut project,
            target,
            ResourceKind::Equipment,
            0,
            Confirmation::Confirmed
        )
        .expect("remove"));
        let descs: Vec<&str> = project.items[0]
            .resources
            .equipment
            .iter()
            .map(|line| line.desc.as_str())
            .collect();
        assert_eq!(descs, vec!["A", "B"]);
    }

    #[test]
    fn quick_create_feeds_catalog_and_template() {
        let mut project = Project::new();
        let bank_id = BankService::create(&mut project);
        let target = ApuRef::Bank(bank_id);
        let catalog_id = LineService::quick_create(
            &mut project,
            target,
            ResourceKind::Materials,
            " Yeso ",
            "kg",
            "2,5",
        )
        .expect("quick create")
        .expect("target exists");
        let entry = project
            .catalog
            .materials
            .iter()
            .find(|entry| entry.id == catalog_id)
            .expect("catalog entry");
        assert_eq!(entry.desc, "Yeso");
        assert_eq!(entry.code, "4");
        let template = project.bank_item(bank_id).expect("template");
        assert_eq!(template.resources.materials[0].qty, 1.0);
        assert_eq!(template.resources.materials[0].price, 2.5);
    }
}
