use serde::{Deserialize, Serialize};

use super::resource::{ResourceKind, ResourceLine, ResourceSet};
use crate::number::lenient;

/// Shared view over anything that owns a priced resource breakdown.
pub trait Apu {
    fn id(&self) -> u64;
    fn description(&self) -> &str;
    fn unit(&self) -> &str;
    /// Volume the breakdown is multiplied by; bank templates report `1`.
    fn quantity(&self) -> f64;
    fn resources(&self) -> &ResourceSet;
    fn resources_mut(&mut self) -> &mut ResourceSet;

    fn lines(&self, kind: ResourceKind) -> &[ResourceLine] {
        self.resources().lines(kind)
    }

    fn lines_mut(&mut self, kind: ResourceKind) -> &mut Vec<ResourceLine> {
        self.resources_mut().lines_mut(kind)
    }
}

/// A priced activity inside the live budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetItem {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantity: f64,
    /// Free-text code carried over from an imported spreadsheet.
    #[serde(rename = "projectCode", default)]
    pub project_code: String,
    #[serde(rename = "moduleId", default)]
    pub module_id: String,
    #[serde(flatten)]
    pub resources: ResourceSet,
}

impl BudgetItem {
    pub fn new(
        id: u64,
        description: impl Into<String>,
        unit: impl Into<String>,
        quantity: f64,
        module_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            unit: unit.into(),
            quantity,
            project_code: String::new(),
            module_id: module_id.into(),
            resources: ResourceSet::default(),
        }
    }

    /// Deep copy of a bank template placed into `module_id`.
    pub fn from_template(template: &BankItem, id: u64, module_id: impl Into<String>) -> Self {
        Self {
            id,
            description: template.description.clone(),
            unit: template.unit.clone(),
            quantity: 1.0,
            project_code: String::new(),
            module_id: module_id.into(),
            resources: template.resources.clone(),
        }
    }

    pub fn with_lines(mut self, kind: ResourceKind, lines: Vec<ResourceLine>) -> Self {
        *self.resources.lines_mut(kind) = lines;
        self
    }
}

impl Apu for BudgetItem {
    fn id(&self) -> u64 {
        self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn quantity(&self) -> f64 {
        self.quantity
    }

    fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    fn resources_mut(&mut self) -> &mut ResourceSet {
        &mut self.resources
    }
}

/// A reusable APU template in the bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankItem {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub id: u64,
    /// Sequential display number; never an identity.
    #[serde(default, deserialize_with = "lenient::u32")]
    pub code: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    #[serde(flatten)]
    pub resources: ResourceSet,
}

impl BankItem {
    pub fn new(id: u64, code: u32, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id,
            code,
            description: description.into(),
            unit: unit.into(),
            resources: ResourceSet::default(),
        }
    }

    pub fn from_budget_item(item: &BudgetItem, id: u64, code: u32) -> Self {
        Self {
            id,
            code,
            description: item.description.clone(),
            unit: item.unit.clone(),
            resources: item.resources.clone(),
        }
    }

    pub fn with_lines(mut self, kind: ResourceKind, lines: Vec<ResourceLine>) -> Self {
        *self.resources.lines_mut(kind) = lines;
        self
    }
}

impl Apu for BankItem {
    fn id(&self) -> u64 {
        self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn quantity(&self) -> f64 {
        1.0
    }

    fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    fn resources_mut(&mut self) -> &mut ResourceSet {
        &mut self.resources
    }
}

/// Next bank display code: one past the largest existing code.
pub fn next_bank_code(bank: &[BankItem]) -> u32 {
    bank.iter().map(|item| item.code).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_item_reads_document_shape() {
        let json = r#"{
            "id": 1700000000123.45,
            "description": "Hormigón simple",
            "unit": "m3",
            "quantity": "12.5",
            "moduleId": "mod_1",
            "materiales": [{"desc": "Cemento portland", "unit": "kg", "qty": 300, "price": 1.26}],
            "mano_obra": []
        }"#;
        let item: BudgetItem = serde_json::from_str(json).expect("parse item");
        assert_eq!(item.id, 1_700_000_000_123);
        assert_eq!(item.module_id, "mod_1");
        assert!((item.quantity - 12.5).abs() < f64::EPSILON);
        assert_eq!(item.resources.materials.len(), 1);
        assert!(item.resources.equipment.is_empty());
    }

    #[test]
    fn next_code_is_one_past_max() {
        let bank = vec![
            BankItem::new(1, 4, "A", "m2"),
            BankItem::new(2, 9, "B", "m2"),
        ];
        assert_eq!(next_bank_code(&bank), 10);
        assert_eq!(next_bank_code(&[]), 1);
    }
}
