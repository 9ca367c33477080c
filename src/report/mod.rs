//! Plain row data handed to export and display collaborators.

use serde::Serialize;

use crate::consolidation::ConsolidatedList;
use crate::number::{round_to, Category};
use crate::pricing::{self, line_partial, PriceBreakdown};
use crate::project::{Apu, Project, ResourceKind, Settings};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetRow {
    pub item_id: u64,
    pub module_id: String,
    /// 1-based position inside the module.
    pub number: usize,
    pub code: String,
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    /// Rounded to the total precision, as used for the line total.
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModuleSummary {
    pub module_id: String,
    pub name: String,
    pub item_count: usize,
    pub total: f64,
}

/// Budget rows grouped by module, in module order. `module_id` limits the
/// output to one module.
pub fn budget_rows(project: &Project, module_id: Option<&str>) -> Vec<BudgetRow> {
    let settings = &project.settings;
    let mut rows = Vec::new();
    for module in &project.modules {
        if module_id.is_some_and(|wanted| wanted != module.id) {
            continue;
        }
        for (idx, item) in project.module_items(&module.id).enumerate() {
            let unit_price = round_to(
                pricing::compute_unit_price(&item.resources, settings),
                settings.precision.digits(Category::Total),
            );
            rows.push(BudgetRow {
                item_id: item.id,
                module_id: module.id.clone(),
                number: idx + 1,
                code: item.project_code.clone(),
                description: item.description.clone(),
                unit: item.unit.clone(),
                quantity: item.quantity,
                unit_price,
                total: pricing::line_total(item, settings),
            });
        }
    }
    rows
}

pub fn module_summaries(project: &Project) -> Vec<ModuleSummary> {
    project
        .modules
        .iter()
        .map(|module| ModuleSummary {
            module_id: module.id.clone(),
            name: module.name.clone(),
            item_count: project.module_items(&module.id).count(),
            total: pricing::module_total(&project.items, &module.id, &project.settings),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApuLineRow {
    pub desc: String,
    pub unit: String,
    pub qty: f64,
    pub price: f64,
    pub partial: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApuSection {
    pub kind: ResourceKind,
    pub rows: Vec<ApuLineRow>,
    pub subtotal: f64,
}

/// Everything an APU analysis sheet shows.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApuSheet {
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub sections: Vec<ApuSection>,
    pub breakdown: PriceBreakdown,
}

pub fn apu_sheet<A: Apu + ?Sized>(apu: &A, settings: &Settings) -> ApuSheet {
    let sections = ResourceKind::ALL
        .iter()
        .map(|&kind| {
            let rows: Vec<ApuLineRow> = apu
                .lines(kind)
                .iter()
                .map(|line| ApuLineRow {
                    desc: line.desc.clone(),
                    unit: line.unit.clone(),
                    qty: line.qty,
                    price: line.price,
                    partial: line_partial(line),
                })
                .collect();
            let subtotal = rows.iter().map(|row| row.partial).sum();
            ApuSection {
                kind,
                rows,
                subtotal,
            }
        })
        .collect();
    ApuSheet {
        description: apu.description().to_string(),
        unit: apu.unit().to_string(),
        quantity: apu.quantity(),
        sections,
        breakdown: pricing::breakdown(apu.resources(), settings),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InsumoRow {
    pub desc: String,
    pub unit: String,
    pub total_quantity: f64,
    pub unit_price: f64,
    pub total_cost: f64,
    pub has_price_conflict: bool,
    pub prices_seen: Vec<f64>,
    pub occurrences: usize,
}

/// Consolidated resources sorted by description.
pub fn insumo_rows(list: &ConsolidatedList) -> Vec<InsumoRow> {
    list.sorted_by_description()
        .into_iter()
        .map(|entry| InsumoRow {
            desc: entry.desc.clone(),
            unit: entry.unit.clone(),
            total_quantity: entry.total_quantity,
            unit_price: entry.unit_price,
            total_cost: entry.total_cost,
            has_price_conflict: entry.has_price_conflict,
            prices_seen: entry.prices_seen.clone(),
            occurrences: entry.occurrences.len(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalculatorRow {
    pub kind: ResourceKind,
    pub desc: String,
    pub unit: String,
    pub yield_qty: f64,
    pub factor: f64,
    /// `yield × input ÷ factor`, or the undivided amount when the factor is 0.
    pub result: f64,
    /// Purchase unit shown next to the result, empty when the factor is 1.
    pub label: &'static str,
}

/// Conversion factor the calculator proposes for a resource.
pub fn default_conversion_factor(kind: ResourceKind, desc: &str) -> f64 {
    match kind {
        ResourceKind::Materials if is_bagged(desc) => 50.0,
        ResourceKind::Materials => 1.0,
        ResourceKind::Labor | ResourceKind::Equipment => 8.0,
    }
}

fn is_bagged(desc: &str) -> bool {
    let desc = desc.to_lowercase();
    desc.contains("cemento") || desc.contains("yeso")
}

fn conversion_label(kind: ResourceKind, desc: &str, factor: f64) -> &'static str {
    if factor == 0.0 || factor == 1.0 {
        return "";
    }
    match kind {
        ResourceKind::Materials if is_bagged(desc) => "Bolsas",
        ResourceKind::Materials => "",
        ResourceKind::Labor | ResourceKind::Equipment => "Días",
    }
}

/// Quantity calculator: how much of each resource an `input_qty` of the APU
/// consumes, converted to purchase units.
pub fn calculator_rows<A: Apu + ?Sized>(apu: &A, input_qty: f64) -> Vec<CalculatorRow> {
    calculator_rows_with(apu, input_qty, default_conversion_factor)
}

/// As [`calculator_rows`], with caller-chosen conversion factors.
pub fn calculator_rows_with<A, F>(apu: &A, input_qty: f64, factor_for: F) -> Vec<CalculatorRow>
where
    A: Apu + ?Sized,
    F: Fn(ResourceKind, &str) -> f64,
{
    let mut rows = Vec::new();
    for kind in ResourceKind::ALL {
        for line in apu.lines(kind) {
            let factor = factor_for(kind, &line.desc);
            let base = line.qty * input_qty;
            let result = if factor != 0.0 { base / factor } else { base };
            rows.push(CalculatorRow {
                kind,
                desc: line.desc.clone(),
                unit: line.unit.clone(),
                yield_qty: line.qty,
                factor,
                result,
                label: conversion_label(kind, &line.desc, factor),
            });
        }
    }
    rows
}
