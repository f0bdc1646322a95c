use crate::gateway::Backoff;
use crate::types::{command_payload, reply_payload, DcInteraction, GatewayPayload};
use polyglot_core::command::{CommandDefinition, CommandOption, Reply};
use serde_json::json;

#[test]
fn test_command_payload_without_options() {
    let def = CommandDefinition::new("help", "Show help information");
    let body = command_payload(&def);
    assert_eq!(
        body,
        json!({ "name": "help", "description": "Show help information" })
    );
}

#[test]
fn test_command_payload_nested_sub_command() {
    let def = CommandDefinition::new("settings", "Server settings").option(
        CommandOption::sub_command("lang", "Set server language").option(
            CommandOption::string("lang", "Language code")
                .required()
                .choice("English", "en")
                .choice("Русский", "ru"),
        ),
    );
    let body = command_payload(&def);
    let sub = &body["options"][0];
    assert_eq!(sub["type"], 1);
    assert_eq!(sub["name"], "lang");
    assert!(sub.get("required").is_none());
    let arg = &sub["options"][0];
    assert_eq!(arg["type"], 3);
    assert_eq!(arg["required"], true);
    assert_eq!(arg["choices"][1], json!({ "name": "Русский", "value": "ru" }));
}

#[test]
fn test_reply_payload_embed_and_flags() {
    let body = reply_payload(&Reply::embed("Help", "Commands"));
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["embeds"][0]["title"], "Help");
    assert!(body["data"].get("flags").is_none());

    let body = reply_payload(&Reply::text("Failed").ephemeral());
    assert_eq!(body["data"]["content"], "Failed");
    assert_eq!(body["data"]["flags"], 64);
}

#[test]
fn test_interaction_to_invocation() {
    let raw = json!({
        "id": "111",
        "token": "tok",
        "type": 2,
        "guild_id": "g1",
        "locale": "ru",
        "member": { "user": { "id": "u1" } },
        "data": {
            "name": "settings",
            "options": [{
                "name": "lang",
                "type": 1,
                "options": [{ "name": "lang", "type": 3, "value": "ru" }]
            }]
        }
    });
    let interaction: DcInteraction = serde_json::from_value(raw).unwrap();
    let inv = interaction.into_invocation().unwrap();
    assert_eq!(inv.command, "settings");
    assert_eq!(inv.tenant_id, "g1");
    assert_eq!(inv.user_id, "u1");
    assert_eq!(inv.locale.as_deref(), Some("ru"));
    let sub = inv.sub_command().unwrap();
    assert_eq!(sub.name, "lang");
    assert_eq!(sub.value_of("lang"), Some("ru"));
}

#[test]
fn test_direct_message_interaction_has_empty_tenant() {
    let raw = json!({
        "id": "1",
        "token": "t",
        "type": 2,
        "user": { "id": "u9" },
        "data": { "name": "help" }
    });
    let interaction: DcInteraction = serde_json::from_value(raw).unwrap();
    let inv = interaction.into_invocation().unwrap();
    assert!(inv.is_direct());
    assert_eq!(inv.user_id, "u9");
}

#[test]
fn test_non_command_interaction_is_skipped() {
    let raw = json!({ "id": "1", "token": "t", "type": 3, "data": { "name": "button" } });
    let interaction: DcInteraction = serde_json::from_value(raw).unwrap();
    assert!(interaction.into_invocation().is_none());
}

#[test]
fn test_gateway_payload_parses_hello() {
    let frame = r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
    let payload: GatewayPayload = serde_json::from_str(frame).unwrap();
    assert_eq!(payload.op, 10);
    assert_eq!(payload.d["heartbeat_interval"], 41250);
    assert!(payload.s.is_none());
}

#[test]
fn test_reconnect_backoff_doubles_to_cap_and_resets() {
    let mut backoff = Backoff::default();
    let secs: Vec<u64> = (0..8).map(|_| backoff.next_delay().as_secs()).collect();
    assert_eq!(secs, vec![1, 2, 4, 8, 16, 32, 60, 60]);

    backoff.reset();
    assert_eq!(backoff.next_delay().as_secs(), 1);
    assert_eq!(backoff.next_delay().as_secs(), 2);
}
