pub mod catalog;
pub mod modules;
pub mod project;
pub mod report;
pub mod settings;
pub mod system;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandEntry;

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(project::definitions());
    commands.extend(report::definitions());
    commands.extend(catalog::definitions());
    commands.extend(settings::definitions());
    commands.extend(modules::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn required<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))
}
