//! `/settings`: show, set, or reset the guild language.
//!
//! Sub-commands: `lang <code>` and `reset`. Without one, the current
//! effective language is shown.

use super::CommandHandler;
use crate::service::Services;
use async_trait::async_trait;
use polyglot_core::{
    command::{CommandDefinition, CommandOption, Invocation, Reply},
    error::PolyglotError,
};
use tracing::{info, warn};

const SUB_LANG: &str = "lang";
const SUB_RESET: &str = "reset";
const ARG_LANG: &str = "lang";

pub struct SettingsCommand {
    definition: CommandDefinition,
}

impl SettingsCommand {
    pub const NAME: &'static str = "settings";

    pub fn new(services: &dyn Services) -> Self {
        let lang = services.default_language();
        let t = |key: &str| services.translate(&lang, key);

        let arg = services.supported_languages().into_iter().fold(
            CommandOption::string(ARG_LANG, t("cmd_settings_lang_arg_desc")).required(),
            |arg, code| arg.choice(services.language_name(&code), code),
        );

        let definition = CommandDefinition::new(Self::NAME, t("cmd_settings_desc"))
            .option(CommandOption::sub_command(SUB_LANG, t("cmd_settings_lang_desc")).option(arg))
            .option(CommandOption::sub_command(
                SUB_RESET,
                t("cmd_settings_reset_desc"),
            ));

        Self { definition }
    }
}

#[async_trait]
impl CommandHandler for SettingsCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    async fn execute(&self, services: &dyn Services, invocation: &Invocation) -> Reply {
        if invocation.is_direct() {
            let lang = services.default_language();
            return Reply::text(services.translate(&lang, "settings_guild_only")).ephemeral();
        }

        match invocation.sub_command() {
            Some(sub) if sub.name == SUB_LANG => match sub.value_of(ARG_LANG) {
                Some(code) => set_language(services, invocation, code).await,
                None => show_current(services, &invocation.tenant_id).await,
            },
            Some(sub) if sub.name == SUB_RESET => reset_language(services, invocation).await,
            _ => show_current(services, &invocation.tenant_id).await,
        }
    }
}

/// "English (en)"
fn display(services: &dyn Services, code: &str) -> String {
    format!("{} ({code})", services.language_name(code))
}

/// The current language, marked as automatic when no override is stored.
async fn show_current(services: &dyn Services, tenant_id: &str) -> Reply {
    let lang = services.effective_language(tenant_id).await;
    let key = match services.stored_language(tenant_id).await {
        Some(_) => "settings_current_lang",
        None => "settings_current_lang_auto",
    };
    Reply::text(services.render(&lang, key, &[&display(services, &lang)]))
}

async fn set_language(services: &dyn Services, invocation: &Invocation, code: &str) -> Reply {
    let tenant_id = &invocation.tenant_id;
    match services.set_language(tenant_id, code).await {
        Ok(()) => {
            info!("guild {tenant_id} language set to {code}");
            // Confirm in the newly selected language.
            Reply::text(services.render(
                code,
                "settings_lang_changed",
                &[&display(services, code)],
            ))
        }
        Err(PolyglotError::UnsupportedLanguage(_)) => {
            let lang = services.effective_language(tenant_id).await;
            let available = services.supported_languages().join(", ");
            Reply::text(services.render(&lang, "settings_unknown_lang", &[code, &available]))
                .ephemeral()
        }
        Err(PolyglotError::GuildOnly) => {
            let lang = services.default_language();
            Reply::text(services.translate(&lang, "settings_guild_only")).ephemeral()
        }
        Err(e) => {
            warn!("failed to save language for guild {tenant_id}: {e}");
            let lang = services.effective_language(tenant_id).await;
            Reply::text(services.translate(&lang, "settings_save_failed")).ephemeral()
        }
    }
}

async fn reset_language(services: &dyn Services, invocation: &Invocation) -> Reply {
    let tenant_id = &invocation.tenant_id;
    match services.clear_language(tenant_id).await {
        Ok(true) => {
            info!("guild {tenant_id} language override removed");
            let lang = services.effective_language(tenant_id).await;
            Reply::text(services.render(
                &lang,
                "settings_lang_reset",
                &[&display(services, &lang)],
            ))
        }
        Ok(false) => {
            let lang = services.effective_language(tenant_id).await;
            Reply::text(services.translate(&lang, "settings_lang_not_set")).ephemeral()
        }
        Err(e) => {
            warn!("failed to reset language for guild {tenant_id}: {e}");
            let lang = services.effective_language(tenant_id).await;
            Reply::text(services.translate(&lang, "settings_save_failed")).ephemeral()
        }
    }
}
