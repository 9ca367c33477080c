use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::next_id;
use super::resource::{match_key, ResourceKind};
use crate::number::{lenient, parse_leading_float};

/// A priced resource in the reference catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub id: u64,
    /// Row number, recomputed after every sort, insert, or delete.
    #[serde(default, deserialize_with = "code_text")]
    pub code: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price: f64,
}

fn code_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl CatalogEntry {
    pub fn new(id: u64, desc: impl Into<String>, unit: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            code: String::new(),
            desc: desc.into(),
            unit: unit.into(),
            price,
        }
    }

    pub fn match_key(&self) -> (String, String) {
        match_key(&self.desc, &self.unit)
    }

    pub fn is_blank(&self) -> bool {
        self.desc.trim().is_empty() && self.unit.trim().is_empty()
    }
}

/// Column a catalog list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Code,
    Desc,
    Unit,
    Price,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(SortField::Code),
            "desc" | "description" => Ok(SortField::Desc),
            "unit" => Ok(SortField::Unit),
            "price" => Ok(SortField::Price),
            other => Err(format!("unknown sort field `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Per-kind reference lists of priced resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Catalog {
    #[serde(rename = "materiales", default)]
    pub materials: Vec<CatalogEntry>,
    #[serde(rename = "mano_obra", default)]
    pub labor: Vec<CatalogEntry>,
    #[serde(rename = "equipos", default)]
    pub equipment: Vec<CatalogEntry>,
}

impl Catalog {
    /// Starter catalog for a fresh project.
    pub fn seeded() -> Self {
        let mut catalog = Catalog::default();
        let seed: [(ResourceKind, &[(&str, &str, f64)]); 3] = [
            (
                ResourceKind::Materials,
                &[
                    ("Cemento portland", "kg", 1.26),
                    ("Arena fina", "m3", 150.0),
                    ("Grava", "m3", 160.0),
                ],
            ),
            (
                ResourceKind::Labor,
                &[("Albañil", "hr", 20.0), ("Ayudante", "hr", 15.0)],
            ),
            (
                ResourceKind::Equipment,
                &[("Mezcladora", "hr", 28.67), ("Vibradora", "hr", 21.0)],
            ),
        ];
        for (kind, rows) in seed {
            for (desc, unit, price) in rows {
                catalog.push(kind, desc, unit, *price);
            }
        }
        catalog
    }

    pub fn list(&self, kind: ResourceKind) -> &[CatalogEntry] {
        match kind {
            ResourceKind::Materials => &self.materials,
            ResourceKind::Labor => &self.labor,
            ResourceKind::Equipment => &self.equipment,
        }
    }

    pub fn list_mut(&mut self, kind: ResourceKind) -> &mut Vec<CatalogEntry> {
        match kind {
            ResourceKind::Materials => &mut self.materials,
            ResourceKind::Labor => &mut self.labor,
            ResourceKind::Equipment => &mut self.equipment,
        }
    }

    pub fn len(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.list(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_id(&self, id: u64) -> bool {
        ResourceKind::ALL
            .iter()
            .any(|kind| self.list(*kind).iter().any(|entry| entry.id == id))
    }

    /// Appends an entry with a fresh id and the next positional code.
    pub fn push(&mut self, kind: ResourceKind, desc: &str, unit: &str, price: f64) -> u64 {
        let id = next_id(|candidate| self.contains_id(candidate));
        let mut entry = CatalogEntry::new(id, desc, unit, price);
        let list = self.list_mut(kind);
        entry.code = (list.len() + 1).to_string();
        list.push(entry);
        id
    }

    /// Index of the entry matching `(desc, unit)` after trimming and
    /// lowercasing both sides.
    pub fn find(&self, kind: ResourceKind, desc: &str, unit: &str) -> Option<usize> {
        let key = match_key(desc, unit);
        self.list(kind)
            .iter()
            .position(|entry| entry.match_key() == key)
    }

    pub fn position_by_id(&self, kind: ResourceKind, id: u64) -> Option<usize> {
        self.list(kind).iter().position(|entry| entry.id == id)
    }

    /// Rewrites every code of `kind` to its 1-based row number.
    pub fn recode(&mut self, kind: ResourceKind) {
        for (idx, entry) in self.list_mut(kind).iter_mut().enumerate() {
            entry.code = (idx + 1).to_string();
        }
    }

    pub fn recode_all(&mut self) {
        for kind in ResourceKind::ALL {
            self.recode(kind);
        }
    }

    /// Stable sort followed by a recode. Codes compare numerically when both
    /// parse; descriptions put blank rows first regardless of direction.
    pub fn sort_by(&mut self, kind: ResourceKind, field: SortField, direction: SortDirection) {
        self.list_mut(kind)
            .sort_by(|a, b| compare_entries(a, b, field, direction));
        self.recode(kind);
    }
}

fn compare_entries(
    a: &CatalogEntry,
    b: &CatalogEntry,
    field: SortField,
    direction: SortDirection,
) -> Ordering {
    match field {
        SortField::Code => {
            match (
                parse_leading_float(a.code.trim()),
                parse_leading_float(b.code.trim()),
            ) {
                (Some(x), Some(y)) => direction.apply(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
                _ => direction.apply(a.code.to_lowercase().cmp(&b.code.to_lowercase())),
            }
        }
        SortField::Desc => {
            let (x, y) = (a.desc.to_lowercase(), b.desc.to_lowercase());
            match (x.is_empty(), y.is_empty()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => direction.apply(x.cmp(&y)),
            }
        }
        SortField::Unit => direction.apply(a.unit.to_lowercase().cmp(&b.unit.to_lowercase())),
        SortField::Price => {
            direction.apply(a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
        }
    }
}
