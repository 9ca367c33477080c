use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::number::lenient;

/// The three resource families an APU consumes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    #[serde(rename = "materiales")]
    Materials,
    #[serde(rename = "mano_obra")]
    Labor,
    #[serde(rename = "equipos")]
    Equipment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Materials,
        ResourceKind::Labor,
        ResourceKind::Equipment,
    ];

    /// Key used in stored documents.
    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::Materials => "materiales",
            ResourceKind::Labor => "mano_obra",
            ResourceKind::Equipment => "equipos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Materials => "Materiales",
            ResourceKind::Labor => "Mano de Obra",
            ResourceKind::Equipment => "Equipos",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "materiales" | "materials" | "mat" => Ok(ResourceKind::Materials),
            "mano_obra" | "labor" | "mo" => Ok(ResourceKind::Labor),
            "equipos" | "equipment" | "eq" => Ok(ResourceKind::Equipment),
            other => Err(format!("unknown resource kind `{other}`")),
        }
    }
}

/// One consumed resource per unit of the owning item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResourceLine {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub unit: String,
    /// Yield: quantity consumed per unit of the parent item.
    #[serde(default, deserialize_with = "lenient::f64")]
    pub qty: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price: f64,
}

impl ResourceLine {
    pub fn new(desc: impl Into<String>, unit: impl Into<String>, qty: f64, price: f64) -> Self {
        Self {
            desc: desc.into(),
            unit: unit.into(),
            qty,
            price,
        }
    }

    /// Identity used when consolidating across items: lowercase description,
    /// unit as written.
    pub fn consolidation_key(&self) -> (String, String) {
        (self.desc.to_lowercase(), self.unit.clone())
    }

    /// Trimmed, case-insensitive identity used for catalog matching and
    /// unification.
    pub fn match_key(&self) -> (String, String) {
        match_key(&self.desc, &self.unit)
    }
}

pub fn match_key(desc: &str, unit: &str) -> (String, String) {
    (desc.trim().to_lowercase(), unit.trim().to_lowercase())
}

/// The three line lists owned by an item or bank template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResourceSet {
    #[serde(rename = "materiales", default)]
    pub materials: Vec<ResourceLine>,
    #[serde(rename = "mano_obra", default)]
    pub labor: Vec<ResourceLine>,
    #[serde(rename = "equipos", default)]
    pub equipment: Vec<ResourceLine>,
}

impl ResourceSet {
    pub fn lines(&self, kind: ResourceKind) -> &[ResourceLine] {
        match kind {
            ResourceKind::Materials => &self.materials,
            ResourceKind::Labor => &self.labor,
            ResourceKind::Equipment => &self.equipment,
        }
    }

    pub fn lines_mut(&mut self, kind: ResourceKind) -> &mut Vec<ResourceLine> {
        match kind {
            ResourceKind::Materials => &mut self.materials,
            ResourceKind::Labor => &mut self.labor,
            ResourceKind::Equipment => &mut self.equipment,
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL
            .iter()
            .all(|kind| self.lines(*kind).is_empty())
    }

    pub fn line_count(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.lines(*kind).len())
            .sum()
    }
}
