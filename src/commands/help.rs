//! `/help`: localized overview of the available commands.

use super::CommandHandler;
use crate::service::Services;
use async_trait::async_trait;
use polyglot_core::command::{CommandDefinition, Invocation, Reply};

pub struct HelpCommand {
    definition: CommandDefinition,
}

impl HelpCommand {
    pub const NAME: &'static str = "help";

    pub fn new(services: &dyn Services) -> Self {
        let lang = services.default_language();
        Self {
            definition: CommandDefinition::new(
                Self::NAME,
                services.translate(&lang, "cmd_help_desc"),
            ),
        }
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    async fn execute(&self, services: &dyn Services, invocation: &Invocation) -> Reply {
        let lang = services.effective_language(&invocation.tenant_id).await;
        Reply::embed(
            services.translate(&lang, "help_title"),
            services.translate(&lang, "help_description"),
        )
    }
}
