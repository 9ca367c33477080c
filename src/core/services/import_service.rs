use serde::{Deserialize, Serialize};
use tracing::info;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::catalog_sync::{upsert_imported_resource, UpsertOutcome};
use crate::errors::ApuError;
use crate::project::{next_bank_code, BankItem, BudgetItem, Project, ResourceKind};

use super::ServiceResult;

/// Lowest score a bank template needs to seed an imported budget row.
pub const MATCH_THRESHOLD: f64 = 0.4;

/// One spreadsheet row of a budget: raw cell text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub quantity: String,
}

/// One spreadsheet row of a catalog list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub price: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BudgetImportSummary {
    pub added: usize,
    pub matched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BankImportSummary {
    pub templates: usize,
    pub new_resources: usize,
    pub updated_resources: usize,
}

pub struct ImportService;

impl ImportService {
    /// Turns budget rows into items of the active module. Each row is seeded
    /// from the best-matching bank template when one scores high enough;
    /// rows with a blank description are skipped.
    pub fn import_budget_rows(project: &mut Project, rows: &[ImportRow]) -> BudgetImportSummary {
        let policy = project.number_policy();
        let module = project.current_module_id();
        let mut summary = BudgetImportSummary::default();
        for row in rows {
            let description = row.description.trim();
            if description.is_empty() {
                continue;
            }
            let unit = match row.unit.trim() {
                "" => "glb",
                unit => unit,
            };
            let template = find_best_match(&project.bank, description, unit).cloned();
            let id = project.new_item_id();
            let mut item = match &template {
                Some(template) => BudgetItem::from_template(template, id, module.clone()),
                None => BudgetItem::new(id, "", "", 0.0, module.clone()),
            };
            if template.is_some() {
                summary.matched += 1;
            }
            item.description = description.to_string();
            item.unit = unit.to_string();
            item.quantity = policy.parse(&row.quantity);
            item.project_code = row.code.trim().to_string();
            project.items.push(item);
            summary.added += 1;
        }
        if summary.added > 0 {
            project.touch();
        }
        info!(added = summary.added, matched = summary.matched, "budget rows imported");
        summary
    }

    /// Appends catalog rows of one kind. Blank descriptions are skipped and a
    /// blank unit becomes `u`.
    pub fn import_catalog_rows(project: &mut Project, kind: ResourceKind, rows: &[CatalogRow]) -> usize {
        let policy = project.number_policy();
        let mut added = 0;
        for row in rows {
            let desc = row.desc.trim();
            if desc.is_empty() {
                continue;
            }
            let unit = match row.unit.trim() {
                "" => "u",
                unit => unit,
            };
            project.catalog.push(kind, desc, unit, policy.parse(&row.price));
            added += 1;
        }
        if added > 0 {
            project.touch();
        }
        info!(kind = %kind, added, "catalog rows imported");
        added
    }

    /// Adds templates to the bank with fresh ids and codes, upserting every
    /// line they carry into the catalog.
    pub fn import_bank_templates(project: &mut Project, templates: Vec<BankItem>) -> BankImportSummary {
        let mut summary = BankImportSummary::default();
        for mut template in templates {
            template.id = project.new_bank_id();
            template.code = next_bank_code(&project.bank);
            for kind in ResourceKind::ALL {
                for line in template.resources.lines(kind) {
                    match upsert_imported_resource(&mut project.catalog, kind, line) {
                        UpsertOutcome::New => summary.new_resources += 1,
                        UpsertOutcome::Updated => summary.updated_resources += 1,
                        UpsertOutcome::Exists => {}
                    }
                }
            }
            project.bank.push(template);
            summary.templates += 1;
        }
        if summary.templates > 0 {
            project.touch();
        }
        info!(
            templates = summary.templates,
            new_resources = summary.new_resources,
            "bank templates imported"
        );
        summary
    }

    /// Parses an exported bank (a JSON array of templates) and imports it.
    pub fn import_bank_json(project: &mut Project, json: &str) -> ServiceResult<BankImportSummary> {
        let templates: Vec<BankItem> = serde_json::from_str(json).map_err(ApuError::from)?;
        Ok(Self::import_bank_templates(project, templates))
    }

    pub fn export_bank_json(project: &Project) -> ServiceResult<String> {
        let json = serde_json::to_string_pretty(&project.bank).map_err(ApuError::from)?;
        Ok(json)
    }
}

/// Scores every template against `(desc, unit)` and returns the best one at
/// or above [`MATCH_THRESHOLD`]. Ties keep the earliest template.
pub fn find_best_match<'a>(bank: &'a [BankItem], desc: &str, unit: &str) -> Option<&'a BankItem> {
    let target_desc = normalize_text(desc);
    let target_unit = normalize_text(unit);
    let mut best: Option<(&BankItem, f64)> = None;
    for template in bank {
        let score = match_score(
            &normalize_text(&template.description),
            &normalize_text(&template.unit),
            &target_desc,
            &target_unit,
        );
        let better = best.map_or(true, |(_, top)| score > top);
        if score >= MATCH_THRESHOLD && better {
            best = Some((template, score));
        }
    }
    best.map(|(template, _)| template)
}

fn match_score(bank_desc: &str, bank_unit: &str, target_desc: &str, target_unit: &str) -> f64 {
    let mut score = 0.0;
    if bank_unit == target_unit {
        score += 0.3;
    } else if target_unit.chars().count() > 1
        && (bank_unit.contains(target_unit) || target_unit.contains(bank_unit))
    {
        score += 0.15;
    }
    if bank_desc == target_desc {
        score += 0.7;
    } else {
        let words: Vec<&str> = target_desc
            .split(' ')
            .filter(|word| word.chars().count() > 2)
            .collect();
        if !words.is_empty() {
            let hits = words.iter().filter(|word| bank_desc.contains(*word)).count();
            score += hits as f64 / words.len() as f64 * 0.7;
        }
    }
    score
}

/// Lowercases, strips combining marks after canonical decomposition, and
/// collapses whitespace.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
