//! Built-in slash commands.
//!
//! Handlers only see the [`Services`] facade and return a [`Reply`]; sending
//! it is the gateway's job.

mod help;
mod settings;


pub use help::HelpCommand;
pub use settings::SettingsCommand;

use crate::service::Services;
use async_trait::async_trait;
use polyglot_core::command::{CommandDefinition, Invocation, Reply};
use std::sync::Arc;

/// A command the bot registers and answers.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// The definition registered with the platform; its name is the routing key.
    fn definition(&self) -> &CommandDefinition;

    /// Produce the single reply for an invocation.
    async fn execute(&self, services: &dyn Services, invocation: &Invocation) -> Reply;
}

/// Every built-in command, with definitions localized in the default language.
pub fn builtin(services: &dyn Services) -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(HelpCommand::new(services)),
        Arc::new(SettingsCommand::new(services)),
    ]
}
