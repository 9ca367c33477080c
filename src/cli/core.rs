//! Shell context, dispatch, and CLI error types.

use std::{io, path::PathBuf, time::Instant};

use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;

use crate::{
    config::{AppConfig, ConfigManager},
    core::services::ServiceError,
    errors::{ApuError, Confirmation},
    project::Project,
    storage::{canonical_key, JsonStore, ProjectStore, SaveOutcome, SaveScheduler},
};

use super::commands;
use super::io as cli_io;
use super::registry::{CommandEntry, CommandRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ApuError),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Command(String),
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No project open. Use `new <name>` or `open <name>` first.")]
    ProjectNotLoaded,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Core(#[from] ApuError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<ServiceError> for CommandError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Apu(err) => CommandError::Core(err),
            ServiceError::ConfirmationRequired(action) => {
                CommandError::Message(format!("Cancelled: {action}."))
            }
            ServiceError::Rejected(reason) => CommandError::InvalidArguments(reason),
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: AppConfig,
    pub store: JsonStore,
    pub scheduler: SaveScheduler,
    pub project: Option<Project>,
    pub project_key: Option<String>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_config_manager(mode, ConfigManager::new()?)
    }

    /// Builds a context over the data directory `config_manager` points at.
    pub fn with_config_manager(
        mode: CliMode,
        config_manager: ConfigManager,
    ) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        let store = JsonStore::new(config_manager.projects_dir(), Some(config.backup_retention))?;
        let scheduler = SaveScheduler::new(config.save_debounce());
        let mut context = Self {
            mode,
            registry: CommandRegistry::with_entries(commands::all_definitions()),
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            store,
            scheduler,
            project: None,
            project_key: None,
            last_command: None,
            running: true,
        };
        context.auto_load_last();
        Ok(context)
    }

    /// Reopens the last project in interactive sessions. Scripts always
    /// start empty.
    fn auto_load_last(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let Some(key) = self.config.last_project.clone() else {
            return;
        };
        if !self.store.exists(&key) {
            return;
        }
        match self.store.load(&key) {
            Ok(project) => {
                self.project = Some(project);
                self.project_key = Some(key.clone());
                cli_io::print_success(format!("Automatically opened last project `{key}`."));
            }
            Err(err) => cli_io::print_warning(format!("Could not reopen `{key}`: {err}")),
        }
    }

    pub fn project(&self) -> Result<&Project, CommandError> {
        self.project.as_ref().ok_or(CommandError::ProjectNotLoaded)
    }

    pub fn project_mut(&mut self) -> Result<&mut Project, CommandError> {
        self.project.as_mut().ok_or(CommandError::ProjectNotLoaded)
    }

    /// Makes `project` the open document under `name`, flushing whatever was
    /// open before.
    pub(crate) fn install_project(&mut self, name: &str, project: Project) -> String {
        self.flush_pending();
        let key = canonical_key(name);
        self.project = Some(project);
        self.project_key = Some(key.clone());
        self.config.last_project = Some(key.clone());
        if let Err(err) = self.config_manager.save(&self.config) {
            cli_io::print_warning(format!("Could not update configuration: {err}"));
        }
        key
    }

    /// Records a mutation and writes it once the debounce window allows.
    pub(crate) fn mark_dirty(&mut self) {
        let now = Instant::now();
        self.scheduler.mark_dirty(now);
        self.save_if_due(now);
    }

    fn save_if_due(&mut self, now: Instant) {
        let (Some(project), Some(key)) = (self.project.as_ref(), self.project_key.as_deref()) else {
            return;
        };
        let outcome = self.scheduler.flush_if_due(now, &self.store, key, project);
        report_save(outcome);
    }

    /// Writes pending changes immediately, if any.
    pub(crate) fn flush_pending(&mut self) {
        let (Some(project), Some(key)) = (self.project.as_ref(), self.project_key.as_deref()) else {
            return;
        };
        let outcome = self.scheduler.flush(&self.store, key, project);
        report_save(outcome);
    }

    /// Forces a write of the open project and returns its path.
    pub(crate) fn save_now(&mut self) -> Result<PathBuf, CommandError> {
        let project = self.project.as_ref().ok_or(CommandError::ProjectNotLoaded)?;
        let key = self
            .project_key
            .as_deref()
            .ok_or(CommandError::ProjectNotLoaded)?;
        self.scheduler.mark_dirty(Instant::now());
        match self.scheduler.flush(&self.store, key, project) {
            SaveOutcome::Failed(message) => Err(CommandError::Message(format!(
                "Save failed: {message}"
            ))),
            _ => Ok(self.store.document_path(key)),
        }
    }

    /// Scripts are pre-approved; interactive sessions ask.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<Confirmation, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(Confirmation::Confirmed);
        }
        cli_io::confirm_action(&self.theme, prompt, false).map(Confirmation::from)
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn prompt(&self) -> String {
        match &self.project_key {
            Some(key) => format!("apu [{key}]> "),
            None => "apu> ".to_string(),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, input), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{name}`?"));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", true)?)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_info("Use `help <command>` for usage details.");
            }
            other => cli_io::print_error(other),
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        // Edits that went quiet since the previous line are written first.
        self.save_if_due(Instant::now());
        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                cli_io::print_warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());
        match self.dispatch(&command, raw, &args)? {
            LoopControl::Exit => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            LoopControl::Continue => Ok(LoopControl::Continue),
        }
    }
}

fn report_save(outcome: SaveOutcome) {
    if let SaveOutcome::Failed(message) = outcome {
        cli_io::print_warning(format!(
            "Could not save ({message}). Changes are kept in memory."
        ));
    }
}
