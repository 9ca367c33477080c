use crate::catalog_sync::SyncReport;
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::core::services::CatalogService;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "sync-bank",
            "Copy catalog prices onto bank template lines",
            "sync-bank",
            cmd_sync_bank,
        ),
        CommandEntry::new(
            "sync-budget",
            "Copy catalog prices onto budget item lines",
            "sync-budget",
            cmd_sync_budget,
        ),
        CommandEntry::new(
            "merge-catalog",
            "Merge catalog entries sharing description and unit",
            "merge-catalog",
            cmd_merge_catalog,
        ),
    ]
}

fn cmd_sync_bank(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.project()?;
    let confirmation = context.confirm("Update bank template prices from the catalog?")?;
    let report = CatalogService::sync_to_bank(context.project_mut()?, confirmation)?;
    finish_sync(context, report, "template");
    Ok(())
}

fn cmd_sync_budget(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.project()?;
    let confirmation = context.confirm("Update budget item prices from the catalog?")?;
    let report = CatalogService::sync_to_budget(context.project_mut()?, confirmation)?;
    finish_sync(context, report, "item");
    Ok(())
}

fn finish_sync(context: &mut ShellContext, report: SyncReport, noun: &str) {
    if report.is_empty() {
        io::print_info("All prices already match the catalog.");
        return;
    }
    context.mark_dirty();
    io::print_success(format!(
        "Updated {} line(s) across {} {noun}(s).",
        report.updated_count, report.affected_item_count
    ));
}

fn cmd_merge_catalog(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.project()?;
    let confirmation = context.confirm("Merge duplicate catalog entries?")?;
    let removed = CatalogService::merge_duplicates(context.project_mut()?, confirmation)?;
    if removed > 0 {
        context.mark_dirty();
    }
    io::print_success(format!("Merged {removed} duplicate catalog entries."));
    Ok(())
}
