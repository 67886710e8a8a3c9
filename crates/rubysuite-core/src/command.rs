use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::host::Session;

/// Signature every suite command implements.
///
/// The returned integer is the command's exit code.
pub type Handler = fn(&mut Session<'_>, &[String]) -> anyhow::Result<i32>;

/// A named operation surfaced to the command line.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub handler: Handler,
    pub usage: String,
}

impl Command {
    pub fn new(name: impl Into<String>, handler: Handler, usage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler,
            usage: usage.into(),
        }
    }
}

impl Debug for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
}

/// The commands a suite contributes to the host dispatcher.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// Registers `command`, replacing any command with the same name.
    ///
    /// Returns the replaced command so callers can tell an overwrite happened.
    pub fn register(&mut self, command: Command) -> Option<Command> {
        let previous = self.commands.insert(command.name.clone(), command);
        if let Some(prev) = &previous {
            warn!("command '{}' registered twice, keeping the latest", prev.name);
        }
        previous
    }

    /// Registers every command in `commands`, in order.
    pub fn update(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.register(command);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invokes the command called `name` with `args`.
    ///
    /// # Errors
    /// Returns [`CommandError::Unknown`] for unregistered names; handler
    /// failures propagate unchanged.
    #[instrument(skip(self, session))]
    pub fn dispatch(
        &self,
        name: &str,
        session: &mut Session<'_>,
        args: &[String],
    ) -> anyhow::Result<i32> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;
        debug!("dispatching '{}' with {} argument(s)", command.name, args.len());
        (command.handler)(session, args)
    }
}
