//! Push Channel
//!
//! Subscribes to the backend's coin topic over STOMP-on-WebSocket and forwards
//! every `MESSAGE` body (a `/currency`-shaped coin list) into the live update
//! driver. The connection is re-established after `reconnect_delay` whenever it
//! drops, until the channel is stopped.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

use crate::error::ClientError;
use crate::jobs::live_update::LiveUpdateHandle;
use crate::models::coin::CoinRecord;
use crate::services::stomp::StompFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct PushConfig {
    /// WebSocket URL, e.g. `ws://host/ws/websocket`
    pub ws_url: String,
    /// STOMP destination carrying coin lists
    pub topic: String,
    pub reconnect_delay: Duration,
}

pub struct PushChannel {
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PushChannel {
    /// Start the subscription loop in the background.
    pub fn start(config: PushConfig, driver: LiveUpdateHandle) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let task = tokio::spawn(async move {
            info!("Starting push channel on {} ({})", config.ws_url, config.topic);

            loop {
                if !flag.load(Ordering::SeqCst) || driver.is_closed() {
                    break;
                }

                match run_connection(&config, &driver, &flag).await {
                    Ok(()) => {
                        if !flag.load(Ordering::SeqCst) || driver.is_closed() {
                            break;
                        }
                        warn!("Push channel closed, reconnecting in {:?}...", config.reconnect_delay);
                    }
                    Err(e) => {
                        error!("Push channel failed: {}, reconnecting in {:?}...", e, config.reconnect_delay);
                    }
                }

                tokio::time::sleep(config.reconnect_delay).await;
            }

            info!("Push channel stopped");
        });

        Self { running, task }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_connection(
    config: &PushConfig,
    driver: &LiveUpdateHandle,
    running: &AtomicBool,
) -> Result<(), ClientError> {
    let (ws_stream, _) = connect_async(config.ws_url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    let host = host_of(&config.ws_url);
    write.send(Message::Text(StompFrame::connect(&host).encode())).await?;

    let subscription_id = format!("sub-{}", uuid::Uuid::new_v4());
    let mut subscribed = false;

    while let Some(msg) = read.next().await {
        if !running.load(Ordering::SeqCst) {
            let _ = write.send(Message::Text(StompFrame::disconnect().encode())).await;
            return Ok(());
        }

        let text = match msg? {
            Message::Text(text) => text,
            Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Message::Ping(payload) => {
                write.send(Message::Pong(payload)).await?;
                continue;
            }
            Message::Close(_) => return Ok(()),
            _ => continue,
        };

        let frame = match StompFrame::decode(&text) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                trace!("Push channel heart-beat");
                continue;
            }
            Err(e) => {
                warn!("Ignoring undecodable frame: {}", e);
                continue;
            }
        };

        match frame.command.as_str() {
            "CONNECTED" => {
                debug!("STOMP session established, subscribing to {}", config.topic);
                write
                    .send(Message::Text(StompFrame::subscribe(&subscription_id, &config.topic).encode()))
                    .await?;
                subscribed = true;
            }
            "MESSAGE" if subscribed => match parse_coins(&frame) {
                Ok(coins) => {
                    debug!("Pushed {} coins", coins.len());
                    driver.push(coins);
                }
                Err(e) => warn!("Ignoring malformed push payload: {}", e),
            },
            "ERROR" => {
                let message = frame.get("message").unwrap_or(&frame.body).to_string();
                return Err(ClientError::PushChannel(message));
            }
            other => trace!("Ignoring {} frame", other),
        }
    }

    Ok(())
}

fn parse_coins(frame: &StompFrame) -> Result<Vec<CoinRecord>, ClientError> {
    Ok(serde_json::from_str(&frame.body)?)
}

/// Host part of a ws:// URL, used for the STOMP `host` header.
fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split(['/', '?'])
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string()
}
