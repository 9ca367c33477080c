use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::project::Project;
use crate::storage::ProjectStore;

use super::required;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("new", "Create an empty project", "new <name>", cmd_new),
        CommandEntry::new(
            "open",
            "Open a stored project, or list them",
            "open [name]",
            cmd_open,
        ),
        CommandEntry::new("save", "Write the open project now", "save", cmd_save),
    ]
}

fn cmd_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = required(args, 0, "new <name>")?;
    let mut project = Project::new();
    project.settings.number_format = context.config.number_format();
    let key = context.install_project(name, project);
    context.mark_dirty();
    io::print_success(format!("Project `{key}` created."));
    Ok(())
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(name) = args.first() else {
        let keys = context.store.list()?;
        output_section("Stored projects");
        if keys.is_empty() {
            io::print_info("No projects yet. Use `new <name>` to start one.");
        }
        for key in keys {
            io::print_info(format!("  {key}"));
        }
        return Ok(());
    };
    if !context.store.exists(name) {
        return Err(CommandError::InvalidArguments(format!(
            "project `{name}` not found"
        )));
    }
    let project = context.store.load(name)?;
    let items = project.items.len();
    let key = context.install_project(name, project);
    io::print_success(format!("Opened project `{key}` ({items} item(s))."));
    Ok(())
}

fn cmd_save(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let path = context.save_now()?;
    io::print_success(format!("Project saved to {}.", path.display()));
    Ok(())
}
