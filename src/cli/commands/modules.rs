use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{print_table, section as output_section, Align};
use crate::cli::registry::CommandEntry;
use crate::core::services::ModuleService;
use crate::errors::Confirmation;
use crate::number::Category;
use crate::report;

use super::required;

const USAGE: &str = "modules [add <name> | rename <module> <name> | switch <module> | \
                     clone <module> [name] | delete <module>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "modules",
        "List or manage budget modules",
        USAGE,
        cmd_modules,
    )]
}

fn cmd_modules(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(action) = args.first() else {
        return list_modules(context);
    };
    match action.to_lowercase().as_str() {
        "add" => {
            let name = args[1..].join(" ");
            let id = ModuleService::add(context.project_mut()?, &name)?;
            context.mark_dirty();
            io::print_success(format!("Module `{name}` added ({id})."));
        }
        "rename" => {
            let id = resolve(context, required(args, 1, USAGE)?)?;
            let name = args[2..].join(" ");
            if ModuleService::rename(context.project_mut()?, &id, &name) {
                context.mark_dirty();
                io::print_success(format!("Module renamed to `{name}`."));
            } else {
                io::print_warning("Module names cannot be blank.");
            }
        }
        "switch" => {
            let id = resolve(context, required(args, 1, USAGE)?)?;
            ModuleService::switch(context.project_mut()?, &id);
            context.mark_dirty();
            io::print_success(format!("Active module: {id}."));
        }
        "clone" => {
            let id = resolve(context, required(args, 1, USAGE)?)?;
            let name = args[2..].join(" ");
            let new_id = ModuleService::clone(context.project_mut()?, &id, &name)
                .ok_or_else(|| CommandError::InvalidArguments(format!("module `{id}` not found")))?;
            context.mark_dirty();
            io::print_success(format!("Module cloned into {new_id}."));
        }
        "delete" => {
            let id = resolve(context, required(args, 1, USAGE)?)?;
            let owned = context.project()?.module_items(&id).count();
            let confirmation = if owned > 0 {
                context.confirm(&format!("Delete module and its {owned} item(s)?"))?
            } else {
                Confirmation::Pending
            };
            if ModuleService::delete(context.project_mut()?, &id, confirmation)? {
                context.mark_dirty();
                io::print_success(format!("Module {id} deleted."));
            }
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown modules action `{other}`; usage: {USAGE}"
            )))
        }
    }
    Ok(())
}

fn resolve(context: &ShellContext, needle: &str) -> Result<String, CommandError> {
    ModuleService::find(context.project()?, needle)
        .map(|module| module.id.clone())
        .ok_or_else(|| CommandError::InvalidArguments(format!("module `{needle}` not found")))
}

fn list_modules(context: &ShellContext) -> CommandResult {
    let project = context.project()?;
    let policy = project.number_policy();
    let active = project.current_module_id();
    output_section("Modules");
    let rows: Vec<Vec<String>> = report::module_summaries(project)
        .into_iter()
        .map(|summary| {
            let marker = if summary.module_id == active { "*" } else { "" };
            vec![
                marker.to_string(),
                summary.module_id,
                summary.name,
                summary.item_count.to_string(),
                policy.format(summary.total, Category::Total),
            ]
        })
        .collect();
    print_table(
        &[
            ("", Align::Left),
            ("Id", Align::Left),
            ("Name", Align::Left),
            ("Items", Align::Right),
            ("Total", Align::Right),
        ],
        &rows,
    );
    Ok(())
}
