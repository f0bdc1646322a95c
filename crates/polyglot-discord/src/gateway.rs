//! Gateway websocket reader.
//!
//! Keeps one connection open, heartbeats, and forwards application-command
//! interactions. Sessions are not resumed: on any disconnect a fresh session
//! is identified after an exponential backoff.

use super::types::{DcHello, DcInteraction, GatewayPayload};
use super::DiscordPlatform;
use futures_util::{SinkExt, StreamExt};
use polyglot_core::command::Invocation;
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// `GUILDS` intent; interactions need no privileged intents.
const INTENTS: u64 = 1;

/// How a session ended.
enum SessionEnd {
    /// `stop()` was called or the receiver was dropped.
    Shutdown,
    /// The server asked for, or forced, a new connection.
    Reconnect,
}

/// Delay before every reconnect: 1s, doubling up to 60s. Reset once a
/// session reaches `READY`.
#[derive(Debug)]
pub(crate) struct Backoff {
    secs: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { secs: 1 }
    }
}

impl Backoff {
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(self.secs);
        self.secs = (self.secs * 2).min(60);
        delay
    }

    pub(crate) fn reset(&mut self) {
        self.secs = 1;
    }
}

impl DiscordPlatform {
    pub(super) fn spawn_gateway(&self) -> mpsc::Receiver<Invocation> {
        let (tx, rx) = mpsc::channel(64);
        let url = self.config.gateway_url.clone();
        let token = self.config.token.clone();
        let mut shutdown = self.shutdown.subscribe();

        info!("Discord gateway connecting...");

        tokio::spawn(async move {
            let mut backoff = Backoff::default();
            loop {
                let mut ready = false;
                let end = run_session(&url, &token, &tx, &mut shutdown, &mut ready).await;
                if ready {
                    backoff.reset();
                }
                let delay = backoff.next_delay();
                match end {
                    Ok(SessionEnd::Shutdown) => break,
                    Ok(SessionEnd::Reconnect) => {
                        info!("discord gateway reconnecting in {}s", delay.as_secs());
                    }
                    Err(e) => {
                        error!("discord gateway error (retry in {}s): {e}", delay.as_secs());
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => break,
                }
                if *shutdown.borrow() {
                    break;
                }
            }
            info!("Discord gateway closed");
        });

        rx
    }
}

async fn run_session(
    url: &str,
    token: &str,
    tx: &mpsc::Sender<Invocation>,
    shutdown: &mut watch::Receiver<bool>,
    ready: &mut bool,
) -> Result<SessionEnd, String> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| format!("connect failed: {e}"))?;
    let (mut sink, mut stream) = ws.split();

    let hello = match stream.next().await {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<GatewayPayload>(&text)
            .map_err(|e| format!("invalid hello: {e}"))?,
        other => return Err(format!("expected hello, got {other:?}")),
    };
    if hello.op != OP_HELLO {
        return Err(format!("expected hello, got op {}", hello.op));
    }
    let hello: DcHello =
        serde_json::from_value(hello.d).map_err(|e| format!("invalid hello: {e}"))?;

    let identify = json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": { "os": std::env::consts::OS, "browser": "polyglot", "device": "polyglot" },
        },
    });
    sink.send(Message::Text(identify.to_string()))
        .await
        .map_err(|e| format!("identify failed: {e}"))?;

    let mut heartbeat = tokio::time::interval(Duration::from_millis(hello.heartbeat_interval));
    let mut seq: Option<u64> = None;
    let mut acked = true;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(SessionEnd::Shutdown);
            }
            _ = heartbeat.tick() => {
                if !acked {
                    warn!("discord heartbeat not acknowledged, reconnecting");
                    return Ok(SessionEnd::Reconnect);
                }
                acked = false;
                sink.send(Message::Text(json!({ "op": OP_HEARTBEAT, "d": seq }).to_string()))
                    .await
                    .map_err(|e| format!("heartbeat failed: {e}"))?;
            }
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(close))) => {
                        return Err(format!("closed by server: {close:?}"));
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(format!("read failed: {e}")),
                    None => return Err("stream ended".to_string()),
                };
                let payload: GatewayPayload = match serde_json::from_str(&text) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("discord: unparseable gateway frame: {e}");
                        continue;
                    }
                };
                if payload.s.is_some() {
                    seq = payload.s;
                }
                match payload.op {
                    OP_DISPATCH => {
                        if payload.t.as_deref() == Some("READY") {
                            info!("Discord session ready");
                            *ready = true;
                        } else if payload.t.as_deref() == Some("INTERACTION_CREATE") {
                            forward_interaction(payload.d, tx).await;
                            if tx.is_closed() {
                                return Ok(SessionEnd::Shutdown);
                            }
                        }
                    }
                    OP_HEARTBEAT => {
                        sink.send(Message::Text(json!({ "op": OP_HEARTBEAT, "d": seq }).to_string()))
                            .await
                            .map_err(|e| format!("heartbeat failed: {e}"))?;
                    }
                    OP_HEARTBEAT_ACK => acked = true,
                    OP_RECONNECT | OP_INVALID_SESSION => return Ok(SessionEnd::Reconnect),
                    other => debug!("discord: ignoring gateway op {other}"),
                }
            }
        }
    }
}

async fn forward_interaction(d: serde_json::Value, tx: &mpsc::Sender<Invocation>) {
    let interaction: DcInteraction = match serde_json::from_value(d) {
        Ok(i) => i,
        Err(e) => {
            warn!("discord: unparseable interaction: {e}");
            return;
        }
    };
    if let Some(invocation) = interaction.into_invocation() {
        debug!(
            "discord: /{} from guild '{}'",
            invocation.command, invocation.tenant_id
        );
        let _ = tx.send(invocation).await;
    }
}
