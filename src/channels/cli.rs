//! CLI channel: stdin/stdout REPL for local testing.
//!
//! Plain lines are text messages. `/share <phone>` shares a contact and
//! `/press <message-id> <data>` presses an inline button on a printed
//! message. The local user is usually configured as the operator too, so
//! the whole intake flow runs offline.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;

use crate::channels::{
    Channel, ChatId, EventStream, InboundEvent, Keyboard, MessageId, OutgoingMessage, Sender,
    SharedContact, UserId,
};
use crate::error::ChannelError;

/// Texts of printed messages, so `/press` can report what it pressed on.
type SentTexts = Arc<RwLock<HashMap<MessageId, String>>>;

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    user: UserId,
    sent: SentTexts,
    next_id: AtomicI64,
}

impl CliChannel {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            sent: Arc::default(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let user = self.user;
        let sent = Arc::clone(&self.sent);

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprintln!("Type /start to begin. /share <phone> shares a contact.");
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let texts = sent.read().await;
                        let Some(event) = parse_line(&line, user, |id| texts.get(&id).cloned())
                        else {
                            eprintln!("Usage: /share <phone> | /press <message-id> <data>");
                            eprint!("> ");
                            continue;
                        };
                        drop(texts);
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> Result<MessageId, ChannelError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sent.write().await.insert(id, message.text.clone());

        println!("\n{}", render_message(id, chat_id, self.user, &message));
        eprint!("> ");
        Ok(id)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChannelError> {
        let mut sent = self.sent.write().await;
        let Some(existing) = sent.get_mut(&message_id) else {
            return Err(ChannelError::EditFailed {
                name: "cli".into(),
                reason: format!("no message #{message_id}"),
            });
        };
        *existing = text.to_string();

        println!("\n[#{message_id} in chat {chat_id} edited]\n{text}\n");
        eprint!("> ");
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}

fn local_sender(user: UserId) -> Sender {
    Sender::new(user, "Local").with_username("local")
}

/// Turn an input line into an event. `lookup` returns the text of a printed
/// message. Returns `None` for a malformed `/share` or `/press`.
fn parse_line<F>(line: &str, user: UserId, lookup: F) -> Option<InboundEvent>
where
    F: Fn(MessageId) -> Option<String>,
{
    let chat_id = ChatId::from(user);
    let sender = local_sender(user);

    if let Some(rest) = line.strip_prefix("/share") {
        let phone_number = rest.trim();
        if phone_number.is_empty() {
            return None;
        }
        return Some(InboundEvent::Contact {
            chat_id,
            sender,
            contact: SharedContact {
                phone_number: phone_number.to_string(),
                owner: Some(user),
            },
        });
    }

    if let Some(rest) = line.strip_prefix("/press") {
        let mut parts = rest.split_whitespace();
        let message_id = MessageId(parts.next()?.trim_start_matches('#').parse().ok()?);
        let data = parts.next()?.to_string();
        let message_text = lookup(message_id)?;
        return Some(InboundEvent::Callback {
            callback_id: format!("cli-{message_id}"),
            chat_id,
            sender,
            message_id,
            message_text,
            data,
        });
    }

    Some(InboundEvent::Text {
        chat_id,
        sender,
        text: line.to_string(),
    })
}

fn render_message(
    id: MessageId,
    chat_id: ChatId,
    user: UserId,
    message: &OutgoingMessage,
) -> String {
    let mut out = if chat_id == ChatId::from(user) {
        format!("[#{id}]\n{}\n", message.text)
    } else {
        format!("[#{id} to chat {chat_id}]\n{}\n", message.text)
    };

    match &message.keyboard {
        Some(Keyboard::Reply(rows)) => {
            for row in rows {
                let buttons: Vec<String> = row
                    .iter()
                    .map(|button| {
                        if button.request_contact {
                            format!("[{} → /share <phone>]", button.label)
                        } else {
                            format!("[{}]", button.label)
                        }
                    })
                    .collect();
                out.push_str(&buttons.join(" "));
                out.push('\n');
            }
        }
        Some(Keyboard::Inline(rows)) => {
            for row in rows {
                let buttons: Vec<String> = row
                    .iter()
                    .map(|button| format!("[{} → /press {id} {}]", button.label, button.data))
                    .collect();
                out.push_str(&buttons.join(" "));
                out.push('\n');
            }
        }
        Some(Keyboard::Remove) | None => {}
    }
    out
}
