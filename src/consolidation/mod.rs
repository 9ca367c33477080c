//! Aggregation and re-pricing of repeated resources across budget items.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{Confirmation, GuardError};
use crate::project::{match_key, Apu, ResourceKind};

/// Prices closer than this are considered equal.
pub const PRICE_TOLERANCE: f64 = 0.001;

/// One use of a consolidated resource inside a specific item.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Occurrence {
    pub item_id: u64,
    pub item_description: String,
    #[serde(rename = "yield")]
    pub yield_qty: f64,
    pub item_quantity: f64,
    pub total_quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConsolidatedEntry {
    pub desc: String,
    pub unit: String,
    pub total_quantity: f64,
    pub unit_price: f64,
    pub total_cost: f64,
    pub has_price_conflict: bool,
    /// Every distinct price seen, first price included.
    pub prices_seen: Vec<f64>,
    pub occurrences: Vec<Occurrence>,
}

impl ConsolidatedEntry {
    fn key(&self) -> (String, &str) {
        (self.desc.to_lowercase(), self.unit.as_str())
    }

    /// Sets a new price and re-derives the display total. Lines are not
    /// touched until the entry is applied.
    pub fn set_unit_price(&mut self, price: f64) {
        self.unit_price = price;
        self.total_cost = self.total_quantity * price;
    }

    fn matches_line(&self, desc: &str, unit: &str) -> bool {
        let (key_desc, key_unit) = self.key();
        desc.to_lowercase() == key_desc && unit == key_unit
    }
}

/// Consolidated resources of one kind, in first-seen order.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ConsolidatedList {
    pub kind: Option<ResourceKind>,
    pub entries: Vec<ConsolidatedEntry>,
}

impl ConsolidatedList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn grand_total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.total_cost).sum()
    }

    pub fn conflict_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.has_price_conflict)
            .count()
    }

    /// Display order: case-insensitive by description.
    pub fn sorted_by_description(&self) -> Vec<&ConsolidatedEntry> {
        let mut sorted: Vec<&ConsolidatedEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.desc.to_lowercase());
        sorted
    }
}

/// Aggregates every `kind` line across `items` keyed by lowercase description
/// and exact unit.
pub fn collect_across_items<A: Apu>(items: &[A], kind: ResourceKind) -> ConsolidatedList {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut entries: Vec<ConsolidatedEntry> = Vec::new();

    for item in items {
        for line in item.lines(kind) {
            let total_quantity = line.qty * item.quantity();
            let total_price = total_quantity * line.price;
            let occurrence = Occurrence {
                item_id: item.id(),
                item_description: item.description().to_string(),
                yield_qty: line.qty,
                item_quantity: item.quantity(),
                total_quantity,
                unit_price: line.price,
                total_price,
            };
            match index.get(&line.consolidation_key()) {
                Some(&slot) => {
                    let entry = &mut entries[slot];
                    entry.total_quantity += total_quantity;
                    entry.total_cost += total_price;
                    if (entry.unit_price - line.price).abs() > PRICE_TOLERANCE {
                        entry.has_price_conflict = true;
                        if !entry.prices_seen.contains(&line.price) {
                            entry.prices_seen.push(line.price);
                        }
                    }
                    entry.occurrences.push(occurrence);
                }
                None => {
                    index.insert(line.consolidation_key(), entries.len());
                    entries.push(ConsolidatedEntry {
                        desc: line.desc.clone(),
                        unit: line.unit.clone(),
                        total_quantity,
                        unit_price: line.price,
                        total_cost: total_price,
                        has_price_conflict: false,
                        prices_seen: vec![line.price],
                        occurrences: vec![occurrence],
                    });
                }
            }
        }
    }

    debug!(kind = %kind, entries = entries.len(), "resources consolidated");
    ConsolidatedList {
        kind: Some(kind),
        entries,
    }
}

/// Writes `new_price` into every `kind` line matching the entry's key and
/// returns how many lines changed hands.
pub fn apply_edited_price<A: Apu>(
    items: &mut [A],
    kind: ResourceKind,
    entry: &ConsolidatedEntry,
    new_price: f64,
) -> usize {
    let mut updated = 0;
    for item in items.iter_mut() {
        for line in item.lines_mut(kind).iter_mut() {
            if entry.matches_line(&line.desc, &line.unit) {
                line.price = new_price;
                updated += 1;
            }
        }
    }
    updated
}

/// Applies each entry's current `unit_price` back onto the lines.
pub fn apply_edited_prices<A: Apu>(
    items: &mut [A],
    kind: ResourceKind,
    entries: &[ConsolidatedEntry],
) -> usize {
    let updated: usize = entries
        .iter()
        .map(|entry| apply_edited_price(items, kind, entry, entry.unit_price))
        .sum();
    info!(kind = %kind, updated, "edited prices applied");
    updated
}

/// Rewrites every line whose trimmed, case-insensitive key matches one of the
/// non-master entries to the master's description, unit, and price.
///
/// Rejected without mutation when fewer than two entries are selected, the
/// master index is out of range, or the caller has not confirmed.
pub fn unify<A: Apu>(
    items: &mut [A],
    kind: ResourceKind,
    selected: &[ConsolidatedEntry],
    master_index: usize,
    confirmation: Confirmation,
) -> Result<usize, GuardError> {
    if selected.len() < 2 {
        return Err(GuardError::Rejected(
            "select at least two resources to unify".to_string(),
        ));
    }
    let master = selected.get(master_index).ok_or_else(|| {
        GuardError::Rejected(format!("master index {master_index} is out of range"))
    })?;
    confirmation.require("unify resources")?;

    let victims: Vec<(String, String)> = selected
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != master_index)
        .map(|(_, entry)| match_key(&entry.desc, &entry.unit))
        .collect();

    let mut rewritten = 0;
    for item in items.iter_mut() {
        for line in item.lines_mut(kind).iter_mut() {
            if victims.contains(&line.match_key()) {
                line.desc = master.desc.clone();
                line.unit = master.unit.clone();
                line.price = master.unit_price;
                rewritten += 1;
            }
        }
    }
    info!(kind = %kind, rewritten, master = %master.desc, "resources unified");
    Ok(rewritten)
}
