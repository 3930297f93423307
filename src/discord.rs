//! Discord collaborators: a REST reply sink and a gateway connection with an
//! explicit connect / next_message / close lifecycle.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const REST_BASE: &str = "https://discord.com/api/v10";

/// GUILD_MESSAGES | MESSAGE_CONTENT.
pub const MESSAGE_INTENTS: u64 = (1 << 9) | (1 << 15);

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
struct GatewayFrame {
    op: u8,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    d: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Hello {
    heartbeat_interval: u64, // millis
}

#[derive(Debug, Deserialize)]
struct Ready {
    user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// A MESSAGE_CREATE dispatch, reduced to what the command layer needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub channel_id: String,
    pub content: String,
    pub author: User,
}

/// One gateway session. Reconnection is the caller's job: on `Err` or
/// `Ok(None)` drop the value and `connect` again.
pub struct Gateway {
    ws: Ws,
    heartbeat: Interval,
    seq: Option<u64>,
}

impl Gateway {
    /// Open the socket, wait for HELLO, identify.
    pub async fn connect(token: &str, intents: u64) -> Result<Self> {
        let (mut ws, _) = connect_async(GATEWAY_URL)
            .await
            .context("gateway connect")?;

        let hello = read_text_frame(&mut ws)
            .await?
            .ok_or_else(|| anyhow!("gateway closed before HELLO"))?;
        if hello.op != 10 {
            bail!("expected HELLO, got op {}", hello.op);
        }
        let hello: Hello = serde_json::from_value(hello.d).context("HELLO payload")?;

        let identify = json!({
            "op": 2,
            "d": {
                "token": token,
                "intents": intents,
                "properties": { "os": "linux", "browser": "aramtally", "device": "aramtally" },
            }
        });
        ws.send(Message::Text(identify.to_string()))
            .await
            .context("IDENTIFY send")?;

        let mut heartbeat = interval(Duration::from_millis(hello.heartbeat_interval));
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            ws,
            heartbeat,
            seq: None,
        })
    }

    /// Next MESSAGE_CREATE, driving heartbeats while waiting.
    /// `Ok(None)` means the server closed the stream.
    pub async fn next_message(&mut self) -> Result<Option<ChatMessage>> {
        loop {
            tokio::select! {
                _ = self.heartbeat.tick() => self.send_heartbeat().await?,
                frame = self.ws.next() => {
                    let msg = match frame {
                        Some(m) => m.context("gateway read")?,
                        None => return Ok(None),
                    };
                    let txt = match msg {
                        Message::Text(t) => t,
                        Message::Ping(payload) => {
                            self.ws.send(Message::Pong(payload)).await.context("pong send")?;
                            continue;
                        }
                        Message::Close(frame) => {
                            debug!("gateway close frame: {:?}", frame);
                            return Ok(None);
                        }
                        _ => continue,
                    };
                    let frame: GatewayFrame = match serde_json::from_str(&txt) {
                        Ok(f) => f,
                        Err(e) => {
                            warn!("unparseable gateway frame: {}", e);
                            continue;
                        }
                    };
                    if let Some(s) = frame.s {
                        self.seq = Some(s);
                    }
                    match frame.op {
                        0 => match frame.t.as_deref() {
                            Some("MESSAGE_CREATE") => {
                                match serde_json::from_value::<ChatMessage>(frame.d) {
                                    Ok(m) => return Ok(Some(m)),
                                    Err(e) => warn!("malformed MESSAGE_CREATE: {}", e),
                                }
                            }
                            Some("READY") => {
                                if let Ok(ready) = serde_json::from_value::<Ready>(frame.d) {
                                    info!("logged in as {}", ready.user.username);
                                }
                            }
                            _ => {}
                        },
                        1 => self.send_heartbeat().await?, // immediate beat requested
                        7 => return Err(anyhow!("gateway requested reconnect")),
                        9 => return Err(anyhow!("gateway session invalidated")),
                        11 => debug!("heartbeat ack"),
                        op => debug!("ignoring gateway op {}", op),
                    }
                }
            }
        }
    }

    async fn send_heartbeat(&mut self) -> Result<()> {
        let beat = json!({ "op": 1, "d": self.seq });
        self.ws
            .send(Message::Text(beat.to_string()))
            .await
            .context("heartbeat send")
    }

    /// Clean close; the server drops the session shortly after.
    pub async fn close(&mut self) -> Result<()> {
        self.ws.close(None).await.context("gateway close")
    }
}

async fn read_text_frame(ws: &mut Ws) -> Result<Option<GatewayFrame>> {
    while let Some(msg) = ws.next().await {
        if let Message::Text(txt) = msg.context("gateway read")? {
            return Ok(Some(serde_json::from_str(&txt).context("gateway frame")?));
        }
    }
    Ok(None)
}

/// Reply sink over the Discord REST API.
#[derive(Clone)]
pub struct Rest {
    http: reqwest::Client,
    token: String,
}

impl Rest {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    /// Deliver a reply to the originating channel. A non-2xx response is
    /// logged, not propagated; a failed reply must not take the bot down.
    pub async fn create_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/channels/{}/messages", REST_BASE, channel_id);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&json!({ "content": text }))
            .send()
            .await
            .context("create_message send")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!("create_message failed: {} {}", status, body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_frame_parses() {
        let raw = r#"{"op":10,"d":{"heartbeat_interval":41250,"_trace":["gateway-prd"]}}"#;
        let frame: GatewayFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.op, 10);
        let hello: Hello = serde_json::from_value(frame.d).unwrap();
        assert_eq!(hello.heartbeat_interval, 41250);
    }

    #[test]
    fn message_create_frame_parses() {
        let raw = r#"{
            "op": 0,
            "s": 42,
            "t": "MESSAGE_CREATE",
            "d": {
                "id": "999",
                "channel_id": "111",
                "content": "!금칼 히든#KR1",
                "author": { "id": "222", "username": "tester", "discriminator": "0" }
            }
        }"#;
        let frame: GatewayFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.op, 0);
        assert_eq!(frame.s, Some(42));
        assert_eq!(frame.t.as_deref(), Some("MESSAGE_CREATE"));

        let msg: ChatMessage = serde_json::from_value(frame.d).unwrap();
        assert_eq!(msg.channel_id, "111");
        assert_eq!(msg.content, "!금칼 히든#KR1");
        assert_eq!(msg.author.id, "222");
        assert!(!msg.author.bot); // absent flag defaults to a human author
    }
}
