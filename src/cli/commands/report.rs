use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{print_table, section as output_section, Align};
use crate::cli::registry::CommandEntry;
use crate::core::services::{ApuRef, InsumoService, ModuleService};
use crate::number::{Category, NumberPolicy};
use crate::pricing;
use crate::project::ResourceKind;
use crate::report::{self, ApuSheet};

use super::required;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            "Budget rows and totals per module",
            "summary [module]",
            cmd_summary,
        ),
        CommandEntry::new(
            "apu",
            "Unit price analysis of an item or bank template",
            "apu <item-id> | apu bank <template-id>",
            cmd_apu,
        ),
        CommandEntry::new(
            "insumos",
            "Resources consolidated across the budget",
            "insumos [materials|labor|equipment]",
            cmd_insumos,
        ),
    ]
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let project = context.project()?;
    let policy = project.number_policy();
    let module_id = match args.first() {
        Some(needle) => Some(
            ModuleService::find(project, needle)
                .map(|module| module.id.clone())
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!("module `{needle}` not found"))
                })?,
        ),
        None => None,
    };
    let rows = report::budget_rows(project, module_id.as_deref());

    for summary in report::module_summaries(project) {
        if module_id.as_ref().is_some_and(|wanted| *wanted != summary.module_id) {
            continue;
        }
        output_section(format!("{} ({} item(s))", summary.name, summary.item_count));
        let table: Vec<Vec<String>> = rows
            .iter()
            .filter(|row| row.module_id == summary.module_id)
            .map(|row| {
                vec![
                    row.number.to_string(),
                    row.item_id.to_string(),
                    row.description.clone(),
                    row.unit.clone(),
                    policy.format(row.quantity, Category::Quantity),
                    policy.format(row.unit_price, Category::Total),
                    policy.format(row.total, Category::Total),
                ]
            })
            .collect();
        if !table.is_empty() {
            print_table(
                &[
                    ("#", Align::Right),
                    ("Id", Align::Left),
                    ("Description", Align::Left),
                    ("Unit", Align::Left),
                    ("Qty", Align::Right),
                    ("Unit price", Align::Right),
                    ("Total", Align::Right),
                ],
                &table,
            );
        }
        io::print_info(format!(
            "Module total: {}",
            policy.format(summary.total, Category::Total)
        ));
    }
    if module_id.is_none() {
        let total = pricing::grand_total(&project.items, &project.settings);
        io::print_success(format!(
            "Grand total: {}",
            policy.format(total, Category::Total)
        ));
    }
    Ok(())
}

fn cmd_apu(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "apu <item-id> | apu bank <template-id>";
    let project = context.project()?;
    let target = match required(args, 0, usage)? {
        "bank" => ApuRef::Bank(parse_id(required(args, 1, usage)?)?),
        raw => ApuRef::Budget(parse_id(raw)?),
    };
    let apu = target
        .resolve(project)
        .ok_or_else(|| CommandError::InvalidArguments("no such item or template".into()))?;
    print_sheet(&report::apu_sheet(apu, &project.settings), &project.number_policy());
    Ok(())
}

fn parse_id(raw: &str) -> Result<u64, CommandError> {
    raw.trim()
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not an id")))
}

fn print_sheet(sheet: &ApuSheet, policy: &NumberPolicy) {
    output_section(format!("{} [{}]", sheet.description, sheet.unit));
    for section in &sheet.sections {
        if section.rows.is_empty() {
            continue;
        }
        io::print_info(format!("{}:", section.kind.label()));
        let rows: Vec<Vec<String>> = section
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.desc.clone(),
                    row.unit.clone(),
                    policy.format(row.qty, Category::Yield),
                    policy.format(row.price, Category::Price),
                    policy.format(row.partial, Category::Partial),
                ]
            })
            .collect();
        print_table(
            &[
                ("Description", Align::Left),
                ("Unit", Align::Left),
                ("Yield", Align::Right),
                ("Price", Align::Right),
                ("Partial", Align::Right),
            ],
            &rows,
        );
    }

    let b = &sheet.breakdown;
    let lines = [
        ("Materials", b.materials),
        ("Labor", b.base_labor),
        ("Social charges", b.social_charges),
        ("Labor tax", b.labor_tax),
        ("Loaded labor", b.loaded_labor),
        ("Equipment", b.base_equipment),
        ("Tools", b.tools),
        ("Loaded equipment", b.loaded_equipment),
        ("Direct cost", b.direct_cost),
        ("General expenses", b.general_expenses),
        ("Profit", b.profit),
        ("Transaction tax", b.transaction_tax),
    ];
    for (label, value) in lines {
        io::print_info(format!("  {label:<18} {}", policy.format(value, Category::Partial)));
    }
    io::print_success(format!(
        "Unit price: {}",
        policy.format(b.unit_price, Category::Total)
    ));
}

fn cmd_insumos(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = match args.first() {
        Some(raw) => raw
            .parse::<ResourceKind>()
            .map_err(CommandError::InvalidArguments)?,
        None => ResourceKind::Materials,
    };
    let project = context.project()?;
    let policy = project.number_policy();
    let list = InsumoService::collect(project, kind);
    output_section(format!("{} ({} resource(s))", kind.label(), list.len()));
    let rows: Vec<Vec<String>> = report::insumo_rows(&list)
        .into_iter()
        .map(|row| {
            let note = if row.has_price_conflict {
                let prices: Vec<String> = row
                    .prices_seen
                    .iter()
                    .map(|price| policy.format(*price, Category::Price))
                    .collect();
                format!("conflict: {}", prices.join(" / "))
            } else {
                String::new()
            };
            vec![
                row.desc,
                row.unit,
                policy.format(row.total_quantity, Category::Quantity),
                policy.format(row.unit_price, Category::Price),
                policy.format(row.total_cost, Category::Total),
                note,
            ]
        })
        .collect();
    if !rows.is_empty() {
        print_table(
            &[
                ("Description", Align::Left),
                ("Unit", Align::Left),
                ("Quantity", Align::Right),
                ("Price", Align::Right),
                ("Total", Align::Right),
                ("", Align::Left),
            ],
            &rows,
        );
    }
    io::print_info(format!(
        "Total: {}",
        policy.format(list.grand_total(), Category::Total)
    ));
    if list.conflict_count() > 0 {
        io::print_warning(format!(
            "{} resource(s) with differing prices.",
            list.conflict_count()
        ));
    }
    Ok(())
}
