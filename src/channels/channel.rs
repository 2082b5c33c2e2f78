//! Transport contract shared by every channel.
//!
//! A channel turns platform updates into [`InboundEvent`]s and delivers
//! [`OutgoingMessage`]s back. It knows nothing about the dialogue.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Stable identity of a chatting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation a message is sent to. Private chats share the user's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl From<UserId> for ChatId {
    fn from(user: UserId) -> Self {
        Self(user.0)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a message already delivered to a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who sent an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// First and last name joined by a space.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// A phone number shared through the platform's contact button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedContact {
    pub phone_number: String,
    /// The user the contact belongs to, when the platform reports it.
    pub owner: Option<UserId>,
}

/// Something that happened on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Plain text typed or sent through a reply keyboard button.
    Text {
        chat_id: ChatId,
        sender: Sender,
        text: String,
    },
    /// A contact card shared by the user.
    Contact {
        chat_id: ChatId,
        sender: Sender,
        contact: SharedContact,
    },
    /// An inline button press.
    Callback {
        callback_id: String,
        chat_id: ChatId,
        sender: Sender,
        message_id: MessageId,
        /// Text of the message the button was attached to.
        message_text: String,
        data: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Text { sender, .. }
            | Self::Contact { sender, .. }
            | Self::Callback { sender, .. } => sender,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Text { chat_id, .. }
            | Self::Contact { chat_id, .. }
            | Self::Callback { chat_id, .. } => *chat_id,
        }
    }
}

/// A button on a reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyButton {
    pub label: String,
    /// Pressing the button shares the user's phone number.
    pub request_contact: bool,
}

impl ReplyButton {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_contact: false,
        }
    }

    pub fn contact(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            request_contact: true,
        }
    }
}

/// A button attached to a single message; pressing it yields a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

/// Selectable options sent along with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    Reply(Vec<Vec<ReplyButton>>),
    Inline(Vec<Vec<InlineButton>>),
    /// Hide any reply keyboard currently shown.
    Remove,
}

/// A message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Stream of inbound events produced by [`Channel::start`].
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A chat transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name (e.g. "telegram", "cli").
    fn name(&self) -> &str;

    /// Begin receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Deliver a message. Returns the id of the (last) delivered message.
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage)
    -> Result<MessageId, ChannelError>;

    /// Replace the text of a message sent earlier.
    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a callback so the client stops its progress indicator.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
