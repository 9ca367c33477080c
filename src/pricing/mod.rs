//! Unit price and total computation.
//!
//! Everything here is a pure function of the current resource lists and
//! settings. Nothing derived is cached or stored.

use serde::Serialize;

use crate::number::{round_to, Category};
use crate::project::{Apu, BudgetItem, ResourceLine, ResourceSet, Settings};

/// Every intermediate of the overhead chain for one APU.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct PriceBreakdown {
    pub materials: f64,
    pub base_labor: f64,
    pub social_charges: f64,
    pub labor_tax: f64,
    pub loaded_labor: f64,
    pub base_equipment: f64,
    pub tools: f64,
    pub loaded_equipment: f64,
    pub direct_cost: f64,
    pub general_expenses: f64,
    pub profit: f64,
    pub transaction_tax: f64,
    pub unit_price: f64,
}

pub fn line_partial(line: &ResourceLine) -> f64 {
    line.qty * line.price
}

fn sum_partials(lines: &[ResourceLine]) -> f64 {
    lines.iter().map(line_partial).sum()
}

fn pct(rate: f64) -> f64 {
    rate / 100.0
}

/// Runs the fixed overhead chain. The order and compounding of each step
/// are part of the contract.
pub fn breakdown(resources: &ResourceSet, settings: &Settings) -> PriceBreakdown {
    let materials = sum_partials(&resources.materials);

    let base_labor = sum_partials(&resources.labor);
    let social_charges = base_labor * pct(settings.social);
    let labor_tax = (base_labor + social_charges) * pct(settings.iva_mo);
    let loaded_labor = base_labor + social_charges + labor_tax;

    let base_equipment = sum_partials(&resources.equipment);
    let tools = loaded_labor * pct(settings.tools);
    let loaded_equipment = base_equipment + tools;

    let direct_cost = materials + loaded_labor + loaded_equipment;
    let general_expenses = direct_cost * pct(settings.gg);
    let profit = (direct_cost + general_expenses) * pct(settings.util);
    let transaction_tax = (direct_cost + general_expenses + profit) * pct(settings.it);
    let unit_price = direct_cost + general_expenses + profit + transaction_tax;

    PriceBreakdown {
        materials,
        base_labor,
        social_charges,
        labor_tax,
        loaded_labor,
        base_equipment,
        tools,
        loaded_equipment,
        direct_cost,
        general_expenses,
        profit,
        transaction_tax,
        unit_price,
    }
}

pub fn compute_unit_price(resources: &ResourceSet, settings: &Settings) -> f64 {
    breakdown(resources, settings).unit_price
}

/// Rounded unit price times rounded quantity.
pub fn line_total<A: Apu + ?Sized>(item: &A, settings: &Settings) -> f64 {
    let unit_price = round_to(
        compute_unit_price(item.resources(), settings),
        settings.precision.digits(Category::Total),
    );
    let quantity = round_to(
        item.quantity(),
        settings.precision.digits(Category::Quantity),
    );
    unit_price * quantity
}

pub fn module_total(items: &[BudgetItem], module_id: &str, settings: &Settings) -> f64 {
    items
        .iter()
        .filter(|item| item.module_id == module_id)
        .map(|item| line_total(item, settings))
        .sum()
}

pub fn grand_total(items: &[BudgetItem], settings: &Settings) -> f64 {
    items.iter().map(|item| line_total(item, settings)).sum()
}
