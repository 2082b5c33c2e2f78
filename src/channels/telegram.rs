//! Telegram channel: long-polls the Bot API for updates.
//!
//! Native Rust Telegram Bot API implementation. Updates are mapped to
//! [`InboundEvent`]s by [`parse_update`]; keyboards are rendered to
//! `reply_markup` by [`keyboard_markup`].

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::channels::{
    Channel, ChatId, EventStream, InboundEvent, Keyboard, MessageId, OutgoingMessage, Sender,
    SharedContact, UserId,
};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Telegram channel: connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    client: reqwest::Client,
    poll_timeout: Duration,
}

impl TelegramChannel {
    /// `request_timeout` bounds every HTTP call and must exceed `poll_timeout`.
    pub fn new(
        bot_token: SecretString,
        poll_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            bot_token,
            client,
            poll_timeout,
        })
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// POST a Bot API method and return its `result`.
    ///
    /// Errors carry a reason string; callers pick the error variant.
    async fn call(&self, method: &str, body: &Value) -> Result<Value, String> {
        call(&self.client, &self.api_url(method), body).await
    }

    /// Send a single message chunk (≤4096 chars).
    async fn send_chunk(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError> {
        let mut body = json!({
            "chat_id": chat_id.0,
            "text": text,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = keyboard_markup(keyboard);
        }

        let result = self
            .call("sendMessage", &body)
            .await
            .map_err(|reason| ChannelError::SendFailed {
                name: "telegram".into(),
                reason,
            })?;

        result
            .get("message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| ChannelError::InvalidResponse {
                name: "telegram".into(),
                reason: "sendMessage result has no message_id".into(),
            })
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        self.health_check().await?;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let client = self.client.clone();
        let poll_secs = self.poll_timeout.as_secs();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = json!({
                    "offset": offset,
                    "timeout": poll_secs,
                    "allowed_updates": ["message", "callback_query"]
                });

                let updates = match call(&client, &url, &body).await {
                    Ok(result) => result,
                    Err(reason) => {
                        tracing::warn!(%reason, "Telegram poll failed");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let Some(updates) = updates.as_array() else {
                    tracing::warn!("Telegram getUpdates result is not an array");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                };

                for update in updates {
                    // Advance offset past this update even if we skip it
                    if let Some(update_id) = update.get("update_id").and_then(Value::as_i64) {
                        offset = update_id + 1;
                    }

                    let Some(event) = parse_update(update) else {
                        tracing::debug!(offset, "Skipping unsupported Telegram update");
                        continue;
                    };

                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    /// Long texts are split; the keyboard rides on the last chunk.
    async fn send(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> Result<MessageId, ChannelError> {
        let chunks = split_message(&message.text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len() - 1;

        let mut sent = MessageId(0);
        for (i, chunk) in chunks.iter().enumerate() {
            let keyboard = if i == last {
                message.keyboard.as_ref()
            } else {
                None
            };
            sent = self.send_chunk(chat_id, chunk, keyboard).await?;
        }

        tracing::debug!(chat_id = %chat_id, message_id = %sent, "Telegram message sent");
        Ok(sent)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChannelError> {
        let body = json!({
            "chat_id": chat_id.0,
            "message_id": message_id.0,
            "text": text,
        });
        self.call("editMessageText", &body)
            .await
            .map(|_| ())
            .map_err(|reason| ChannelError::EditFailed {
                name: "telegram".into(),
                reason,
            })
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let body = json!({ "callback_query_id": callback_id });
        self.call("answerCallbackQuery", &body)
            .await
            .map(|_| ())
            .map_err(|reason| ChannelError::SendFailed {
                name: "telegram".into(),
                reason,
            })
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let me = self
            .call("getMe", &json!({}))
            .await
            .map_err(|reason| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason,
            })?;

        let username = me.get("username").and_then(Value::as_str).unwrap_or("unknown");
        tracing::info!(bot = username, "Telegram bot authenticated");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(bot_token: &SecretString, method: &str) -> String {
    format!(
        "https://api.telegram.org/bot{}/{method}",
        bot_token.expose_secret()
    )
}

async fn call(client: &reqwest::Client, url: &str, body: &Value) -> Result<Value, String> {
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        // Strip the URL, it contains the bot token
        .map_err(|e| e.without_url().to_string())?;

    let status = resp.status();
    let data: Value = resp
        .json()
        .await
        .map_err(|e| format!("unreadable response ({status}): {}", e.without_url()))?;

    if data.get("ok").and_then(Value::as_bool) != Some(true) {
        let description = data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description");
        return Err(format!("{status}: {description}"));
    }

    data.get("result")
        .cloned()
        .ok_or_else(|| "response has no result".to_string())
}

fn parse_sender(from: &Value) -> Option<Sender> {
    let id = from.get("id").and_then(Value::as_i64)?;
    let first_name = from.get("first_name").and_then(Value::as_str).unwrap_or("");

    let mut sender = Sender::new(UserId(id), first_name);
    if let Some(last_name) = from.get("last_name").and_then(Value::as_str) {
        sender = sender.with_last_name(last_name);
    }
    if let Some(username) = from.get("username").and_then(Value::as_str) {
        sender = sender.with_username(username);
    }
    Some(sender)
}

fn chat_id_of(message: &Value) -> Option<ChatId> {
    message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)
        .map(ChatId)
}

/// Map one getUpdates entry to an event. Returns `None` for updates the bot
/// does not handle (stickers, edits, channel posts, ...).
pub fn parse_update(update: &Value) -> Option<InboundEvent> {
    if let Some(message) = update.get("message") {
        let chat_id = chat_id_of(message)?;
        let sender = parse_sender(message.get("from")?)?;

        if let Some(contact) = message.get("contact") {
            let phone_number = contact.get("phone_number").and_then(Value::as_str)?;
            return Some(InboundEvent::Contact {
                chat_id,
                sender,
                contact: SharedContact {
                    phone_number: phone_number.to_string(),
                    owner: contact.get("user_id").and_then(Value::as_i64).map(UserId),
                },
            });
        }

        let text = message.get("text").and_then(Value::as_str)?;
        return Some(InboundEvent::Text {
            chat_id,
            sender,
            text: text.to_string(),
        });
    }

    if let Some(query) = update.get("callback_query") {
        let callback_id = query.get("id").and_then(Value::as_str)?;
        let sender = parse_sender(query.get("from")?)?;
        let message = query.get("message")?;
        return Some(InboundEvent::Callback {
            callback_id: callback_id.to_string(),
            chat_id: chat_id_of(message)?,
            sender,
            message_id: MessageId(message.get("message_id").and_then(Value::as_i64)?),
            message_text: message
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            data: query
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    None
}

/// Render a keyboard as a Bot API `reply_markup` object.
pub fn keyboard_markup(keyboard: &Keyboard) -> Value {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| {
                            if button.request_contact {
                                json!({ "text": button.label, "request_contact": true })
                            } else {
                                json!({ "text": button.label })
                            }
                        })
                        .collect()
                })
                .collect();
            json!({ "keyboard": rows, "resize_keyboard": true })
        }
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| json!({ "text": button.label, "callback_data": button.data }))
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": rows })
        }
        Keyboard::Remove => json!({ "remove_keyboard": true }),
    }
}

/// Split a message into chunks of at most `max_chars` characters.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    loop {
        // Byte offset of the first character past the limit
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        let chunk = &remaining[..limit];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(limit);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { limit } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
        if remaining.is_empty() {
            break;
        }
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
