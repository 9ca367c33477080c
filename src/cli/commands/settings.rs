use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::project::SettingField;

use super::required;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "settings",
            "Show rates, precisions, and number format",
            "settings",
            cmd_settings,
        ),
        CommandEntry::new("set", "Change one setting", "set <field> <value>", cmd_set),
    ]
}

fn cmd_settings(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let settings = &context.project()?.settings;
    output_section("Settings");
    for field in SettingField::ALL {
        io::print_info(format!("  {:<17} {}", field.key(), settings.value_text(field)));
    }
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "set <field> <value>";
    let field: SettingField = required(args, 0, usage)?
        .parse()
        .map_err(CommandError::InvalidArguments)?;
    required(args, 1, usage)?;
    let value = args[1..].join(" ");
    let project = context.project_mut()?;
    project
        .settings
        .apply_input(field, &value)
        .map_err(CommandError::InvalidArguments)?;
    project.touch();
    let shown = project.settings.value_text(field);
    context.mark_dirty();
    io::print_success(format!("{field} = {shown}"));
    Ok(())
}
