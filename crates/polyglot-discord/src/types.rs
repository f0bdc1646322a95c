//! Discord API (de)serialization types and conversions to the core model.

use polyglot_core::command::{
    CommandDefinition, CommandOption, Invocation, InvocationOption, OptionKind, Reply,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// `APPLICATION_COMMAND` interaction type.
const INTERACTION_APPLICATION_COMMAND: u8 = 2;
/// `CHANNEL_MESSAGE_WITH_SOURCE` callback type.
const CALLBACK_CHANNEL_MESSAGE: u8 = 4;
/// `EPHEMERAL` message flag.
const FLAG_EPHEMERAL: u64 = 1 << 6;

/// Gateway frame envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcHello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcApplication {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcCreatedCommand {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcGuild {
    #[serde(default)]
    pub preferred_locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcInteraction {
    pub id: String,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub data: Option<DcCommandData>,
    pub guild_id: Option<String>,
    pub member: Option<DcMember>,
    pub user: Option<DcUser>,
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcCommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<DcOption>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcOption {
    pub name: String,
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<DcOption>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcMember {
    pub user: Option<DcUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DcUser {
    pub id: String,
}

impl DcInteraction {
    /// Convert an application-command interaction; other kinds yield `None`.
    pub fn into_invocation(self) -> Option<Invocation> {
        if self.kind != INTERACTION_APPLICATION_COMMAND {
            return None;
        }
        let data = self.data?;
        let user_id = self
            .member
            .and_then(|m| m.user)
            .or(self.user)
            .map(|u| u.id)
            .unwrap_or_default();
        Some(Invocation {
            id: self.id,
            token: self.token,
            command: data.name,
            tenant_id: self.guild_id.unwrap_or_default(),
            user_id,
            locale: self.locale,
            options: data.options.into_iter().map(DcOption::into_core).collect(),
        })
    }
}

impl DcOption {
    fn into_core(self) -> InvocationOption {
        InvocationOption {
            name: self.name,
            value: self.value.map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            }),
            options: self.options.into_iter().map(DcOption::into_core).collect(),
        }
    }
}

/// Body for `POST /applications/{id}/commands`.
pub(crate) fn command_payload(def: &CommandDefinition) -> Value {
    let mut body = Map::new();
    body.insert("name".into(), json!(def.name));
    body.insert("description".into(), json!(def.description));
    if !def.options.is_empty() {
        body.insert(
            "options".into(),
            Value::Array(def.options.iter().map(option_payload).collect()),
        );
    }
    Value::Object(body)
}

fn option_payload(opt: &CommandOption) -> Value {
    let kind = match opt.kind {
        OptionKind::SubCommand => 1,
        OptionKind::String => 3,
    };
    let mut body = Map::new();
    body.insert("type".into(), json!(kind));
    body.insert("name".into(), json!(opt.name));
    body.insert("description".into(), json!(opt.description));
    if opt.required {
        body.insert("required".into(), json!(true));
    }
    if !opt.choices.is_empty() {
        body.insert(
            "choices".into(),
            Value::Array(
                opt.choices
                    .iter()
                    .map(|c| json!({ "name": c.name, "value": c.value }))
                    .collect(),
            ),
        );
    }
    if !opt.options.is_empty() {
        body.insert(
            "options".into(),
            Value::Array(opt.options.iter().map(option_payload).collect()),
        );
    }
    Value::Object(body)
}

/// Body for `POST /interactions/{id}/{token}/callback`.
pub(crate) fn reply_payload(reply: &Reply) -> Value {
    let mut data = Map::new();
    if let Some(ref content) = reply.content {
        data.insert("content".into(), json!(content));
    }
    if let Some(ref embed) = reply.embed {
        data.insert(
            "embeds".into(),
            json!([{ "title": embed.title, "description": embed.description }]),
        );
    }
    if reply.ephemeral {
        data.insert("flags".into(), json!(FLAG_EPHEMERAL));
    }
    json!({ "type": CALLBACK_CHANNEL_MESSAGE, "data": Value::Object(data) })
}
