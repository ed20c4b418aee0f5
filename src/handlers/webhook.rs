use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::EventHandler;
use crate::chains::{label, title};
use crate::config::HandlersConfig;
use crate::error::Result;
use crate::events::{event_to_entity, CWEvent, EntityEventKind};

#[derive(Debug, Serialize)]
struct EventEmbed {
    title: String,
    description: String,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct WebhookBody {
    embeds: Vec<EventEmbed>,
}

/// Plain text: labels carry addresses and names that break Telegram's markdown parser.
#[derive(Debug, Serialize)]
struct TelegramMessage {
    chat_id: String,
    text: String,
}

/// Posts a human-readable summary of each event to a Discord-style webhook and,
/// when configured, a Telegram chat. Identical messages inside the cooldown are dropped.
pub struct WebhookHandler {
    client: Client,
    config: HandlersConfig,
    last_sent: Mutex<HashMap<String, Instant>>,
    cooldown: Duration,
}

impl WebhookHandler {
    pub fn new(config: HandlersConfig) -> Self {
        let cooldown = Duration::from_secs(config.cooldown_secs);
        Self {
            client: Client::new(),
            config,
            last_sent: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    async fn should_send(&self, key: &str) -> bool {
        let mut history = self.last_sent.lock().await;
        if let Some(last) = history.get(key) {
            if last.elapsed() < self.cooldown {
                return false;
            }
        }
        history.insert(key.to_string(), Instant::now());
        true
    }

    fn webhook_body(event: &CWEvent) -> WebhookBody {
        let chain = event.chain.as_deref().unwrap_or(event.network.as_str());
        let title = title(event.kind());
        let label = label(chain, event);

        let color = match event_to_entity(event.kind()).map(|(_, role)| role) {
            Some(EntityEventKind::Create) => 0x3498DB,
            Some(EntityEventKind::Vote) => 0xF1C40F,
            Some(EntityEventKind::Update) => 0xE67E22,
            Some(EntityEventKind::Complete) => 0x2ECC71,
            None => 0x95A5A6,
        };

        WebhookBody {
            embeds: vec![EventEmbed {
                title: label.heading,
                description: label.label,
                color,
                url: label.link_url,
                fields: vec![
                    EmbedField {
                        name: "Event",
                        value: title.title,
                    },
                    EmbedField {
                        name: "Chain",
                        value: chain.to_string(),
                    },
                    EmbedField {
                        name: "Block",
                        value: event.block_number.to_string(),
                    },
                ],
            }],
        }
    }

    async fn send_webhook(&self, payload: &WebhookBody) {
        if self.config.webhook_url.is_empty() {
            return;
        }

        if let Err(e) = self
            .client
            .post(&self.config.webhook_url)
            .json(payload)
            .send()
            .await
        {
            error!("Failed to send webhook notification: {}", e);
        } else {
            info!("Webhook notification sent");
        }
    }

    async fn send_telegram(&self, event: &CWEvent, message: &str) {
        let token = match &self.config.telegram_bot_token {
            Some(t) if !t.is_empty() => t,
            _ => return,
        };
        let chat_id = match &self.config.telegram_chat_id {
            Some(id) if !id.is_empty() => id,
            _ => return,
        };

        let payload = TelegramMessage {
            chat_id: chat_id.clone(),
            text: format!(
                "{} ({} #{})\n\n{}",
                title(event.kind()).title,
                event.chain.as_deref().unwrap_or(event.network.as_str()),
                event.block_number,
                message
            ),
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);

        if let Err(e) = self.client.post(&url).json(&payload).send().await {
            error!("Failed to send Telegram notification: {}", e);
        } else {
            info!("Telegram notification sent");
        }
    }
}

#[async_trait]
impl EventHandler for WebhookHandler {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn handle(&self, event: &CWEvent, previous: Option<Value>) -> Result<Option<Value>> {
        let payload = Self::webhook_body(event);
        let message = payload
            .embeds
            .first()
            .map(|e| e.description.clone())
            .unwrap_or_default();

        let key = format!("{}:{}", event.chain.as_deref().unwrap_or_default(), message);
        if !self.should_send(&key).await {
            warn!("Notification suppressed (cooldown): {}", message);
            return Ok(previous);
        }

        self.send_webhook(&payload).await;
        self.send_telegram(event, &message).await;
        Ok(previous)
    }
}
