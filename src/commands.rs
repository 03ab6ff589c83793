//! Named device-state commands.
//!
//! Pipeline state that is not a resource (blending and friends) is changed by
//! wrapping draws in a command scope. The registry of available commands is
//! fixed when the context is built, so a scope can never observe a command
//! appearing or disappearing mid-frame.

use crate::backends::Device;
use crate::errors::{Error, Result};
use crate::utils::prelude::FastHashMap;

/// A device-state hook. Plain function pointers keep commands copyable and
/// free of captured state.
pub type CommandHook = fn(&mut dyn Device) -> Result<()>;

/// A named pair of state hooks bracketing a scope of draws.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    /// Runs before the scope body.
    pub on_before: CommandHook,
    /// Runs after the scope body, even when the body fails.
    pub on_after: Option<CommandHook>,
}

impl Command {
    pub fn new<T>(name: T, on_before: CommandHook, on_after: Option<CommandHook>) -> Self
    where
        T: Into<String>,
    {
        Command {
            name: name.into(),
            on_before,
            on_after,
        }
    }
}

pub(crate) struct CommandRegistry {
    commands: FastHashMap<String, Command>,
}

impl CommandRegistry {
    /// Builds the registry from the built-in commands plus `commands`. A user
    /// command with a built-in name replaces the built-in.
    pub fn new(commands: Vec<Command>) -> Self {
        let mut registry = FastHashMap::default();

        for command in builtins().into_iter().chain(commands) {
            registry.insert(command.name.clone(), command);
        }

        CommandRegistry { commands: registry }
    }

    pub fn get(&self, name: &str) -> Result<&Command> {
        self.commands
            .get(name)
            .ok_or_else(|| Error::CommandUnknown(name.to_owned()))
    }
}

fn builtins() -> Vec<Command> {
    vec![Command::new("blend", enable_blend, Some(disable_blend))]
}

/// Standard alpha blending over a scope of draws.
fn enable_blend(device: &mut dyn Device) -> Result<()> {
    unsafe { device.set_blend(true) }
}

fn disable_blend(device: &mut dyn Device) -> Result<()> {
    unsafe { device.set_blend(false) }
}
