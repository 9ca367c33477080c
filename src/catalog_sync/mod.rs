//! Reconciliation between the catalog and the lines embedded in items.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::consolidation::PRICE_TOLERANCE;
use crate::project::{Apu, Catalog, CatalogEntry, ResourceKind, ResourceLine};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub updated_count: usize,
    pub affected_item_count: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.updated_count == 0
    }
}

type PriceKey = (ResourceKind, String, String);

fn price_map(catalog: &Catalog) -> HashMap<PriceKey, f64> {
    let mut map = HashMap::new();
    for kind in ResourceKind::ALL {
        for entry in catalog.list(kind) {
            let (desc, unit) = entry.match_key();
            // Later rows win, matching the order a reader scans the list.
            map.insert((kind, desc, unit), entry.price);
        }
    }
    map
}

/// Copies catalog prices onto every line of `targets` whose kind, trimmed
/// description, and trimmed unit match an entry and whose price differs.
pub fn sync_catalog_to_lines<A: Apu>(catalog: &Catalog, targets: &mut [A]) -> SyncReport {
    let prices = price_map(catalog);
    let mut report = SyncReport::default();
    for target in targets.iter_mut() {
        let mut touched = false;
        for kind in ResourceKind::ALL {
            for line in target.lines_mut(kind).iter_mut() {
                let (desc, unit) = line.match_key();
                if let Some(&price) = prices.get(&(kind, desc, unit)) {
                    if (line.price - price).abs() > PRICE_TOLERANCE {
                        line.price = price;
                        report.updated_count += 1;
                        touched = true;
                    }
                }
            }
        }
        if touched {
            report.affected_item_count += 1;
        }
    }
    info!(
        updated = report.updated_count,
        affected = report.affected_item_count,
        "catalog prices synced"
    );
    report
}

/// Collapses catalog entries that share a trimmed, case-insensitive
/// `(desc, unit)` into the first entry of each group, keeping the highest
/// price. Rows blank in both description and unit are left in place.
/// Returns the number of entries removed.
pub fn merge_duplicate_catalog_entries(catalog: &mut Catalog) -> usize {
    let mut removed = 0;
    for kind in ResourceKind::ALL {
        let list = catalog.list_mut(kind);
        let mut first_index: HashMap<(String, String), usize> = HashMap::new();
        let mut merged: Vec<CatalogEntry> = Vec::with_capacity(list.len());
        for entry in list.drain(..) {
            if entry.is_blank() {
                merged.push(entry);
                continue;
            }
            match first_index.get(&entry.match_key()) {
                Some(&slot) => {
                    let keeper = &mut merged[slot];
                    if entry.price > keeper.price {
                        keeper.price = entry.price;
                    }
                    removed += 1;
                }
                None => {
                    first_index.insert(entry.match_key(), merged.len());
                    merged.push(entry);
                }
            }
        }
        *list = merged;
        catalog.recode(kind);
    }
    info!(removed, "duplicate catalog entries merged");
    removed
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    New,
    Updated,
    Exists,
}

/// Adds an imported resource to the catalog, or refreshes the price of the
/// matching entry when the incoming price is positive and different.
pub fn upsert_imported_resource(
    catalog: &mut Catalog,
    kind: ResourceKind,
    line: &ResourceLine,
) -> UpsertOutcome {
    match catalog.find(kind, &line.desc, &line.unit) {
        Some(idx) => {
            let entry = &mut catalog.list_mut(kind)[idx];
            if line.price > 0.0 && (entry.price - line.price).abs() > PRICE_TOLERANCE {
                debug!(desc = %entry.desc, from = entry.price, to = line.price, "catalog price refreshed");
                entry.price = line.price;
                UpsertOutcome::Updated
            } else {
                UpsertOutcome::Exists
            }
        }
        None => {
            catalog.push(kind, line.desc.trim(), line.unit.trim(), line.price);
            UpsertOutcome::New
        }
    }
}
