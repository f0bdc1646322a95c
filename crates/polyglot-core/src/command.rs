//! Command definitions, inbound invocations, and outbound replies.
//!
//! These types are platform-neutral: adapters translate them to and from
//! their own wire formats.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A remotely-invocable command as registered with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandDefinition {
    /// Create a definition with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
        }
    }

    /// Append an option.
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Kind of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    SubCommand,
    String,
}

/// One option (or sub-command) of a command definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub choices: Vec<OptionChoice>,
    /// Nested options, only meaningful for sub-commands.
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    /// A sub-command with no options yet.
    pub fn sub_command(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: OptionKind::SubCommand,
            name: name.into(),
            description: description.into(),
            required: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    /// An optional free-form string argument.
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: OptionKind::String,
            ..Self::sub_command(name, description)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.choices.push(OptionChoice {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }
}

/// An enumerated value offered for a string option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: String,
}

/// Platform-issued identifier of a registered command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationHandle(pub String);

impl fmt::Display for RegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inbound command invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invocation {
    /// Platform interaction id, echoed back when responding.
    pub id: String,
    /// Short-lived token authorising the response.
    pub token: String,
    pub command: String,
    /// Guild id; empty for direct messages.
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub user_id: String,
    /// Locale of the invoking user's client, if reported.
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub options: Vec<InvocationOption>,
}

impl Invocation {
    /// Whether the invocation came from a direct message.
    pub fn is_direct(&self) -> bool {
        self.tenant_id.is_empty()
    }

    /// First top-level option, which is the sub-command when one is used.
    pub fn sub_command(&self) -> Option<&InvocationOption> {
        self.options.first()
    }
}

/// A supplied option value; sub-commands carry their own nested options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub options: Vec<InvocationOption>,
}

impl InvocationOption {
    /// Look up a nested option value by exact name.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_deref())
    }
}

/// A rich embed with a title and a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
}

/// The single response produced for an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    /// Visible only to the invoking user.
    #[serde(default)]
    pub ephemeral: bool,
}

impl Reply {
    /// Plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Embed-only reply.
    pub fn embed(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            embed: Some(Embed {
                title: title.into(),
                description: description.into(),
            }),
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}
