//! End-to-end intake flows.
//!
//! Each test drives a real `IntakeBot` over a JSON store in a temp dir,
//! with a recording channel standing in for Telegram.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use taxi_intake::bot::IntakeBot;
use taxi_intake::channels::{
    Channel, ChatId, EventStream, InboundEvent, Keyboard, MessageId, OutgoingMessage, Sender,
    SharedContact, UserId,
};
use taxi_intake::dialogue::DialogueState;
use taxi_intake::error::ChannelError;
use taxi_intake::records::{DriverStatus, JsonFileStore, RecordStore, TripStatus};

const OPERATOR: UserId = UserId(6723737087);
const CLIENT: UserId = UserId(555);

/// Channel stub: replays scripted events and records everything sent.
#[derive(Default)]
struct RecordingChannel {
    script: Mutex<Vec<InboundEvent>>,
    sent: Mutex<Vec<(ChatId, MessageId, OutgoingMessage)>>,
    edits: Mutex<Vec<(ChatId, MessageId, String)>>,
}

impl RecordingChannel {
    fn scripted(events: Vec<InboundEvent>) -> Self {
        Self {
            script: Mutex::new(events),
            ..Self::default()
        }
    }

    fn sent_to(&self, chat_id: ChatId) -> Vec<(MessageId, OutgoingMessage)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(chat, _, _)| *chat == chat_id)
            .map(|(_, id, message)| (*id, message.clone()))
            .collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let events = std::mem::take(&mut *self.script.lock().unwrap());
        Ok(Box::pin(futures::stream::iter(events)))
    }

    async fn send(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> Result<MessageId, ChannelError> {
        let mut sent = self.sent.lock().unwrap();
        let id = MessageId(sent.len() as i64 + 1);
        sent.push((chat_id, id, message));
        Ok(id)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.edits
            .lock()
            .unwrap()
            .push((chat_id, message_id, text.to_string()));
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}

struct Harness {
    dir: TempDir,
    channel: Arc<RecordingChannel>,
    store: Arc<JsonFileStore>,
    bot: Arc<IntakeBot>,
}

fn harness(channel: RecordingChannel) -> Harness {
    let dir = TempDir::new().unwrap();
    let channel = Arc::new(channel);
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let bot = Arc::new(IntakeBot::new(
        channel.clone(),
        store.clone(),
        OPERATOR,
        5,
    ));
    Harness {
        dir,
        channel,
        store,
        bot,
    }
}

fn client() -> Sender {
    Sender::new(CLIENT, "Aziz")
        .with_last_name("Karimov")
        .with_username("aziz")
}

fn text(body: &str) -> InboundEvent {
    InboundEvent::Text {
        chat_id: ChatId::from(CLIENT),
        sender: client(),
        text: body.to_string(),
    }
}

fn contact(phone: &str) -> InboundEvent {
    InboundEvent::Contact {
        chat_id: ChatId::from(CLIENT),
        sender: client(),
        contact: SharedContact {
            phone_number: phone.to_string(),
            owner: Some(CLIENT),
        },
    }
}

fn client_flow() -> Vec<InboundEvent> {
    vec![
        text("/start"),
        text("📝 New request"),
        text("👤 Client"),
        text("Tashkent to Samarkand tomorrow 9am"),
        text("2 people"),
        text("150000"),
        contact("+998901234567"),
    ]
}

async fn drive(bot: &IntakeBot, events: Vec<InboundEvent>) {
    for event in events {
        bot.handle_event(event).await;
    }
}

#[tokio::test]
async fn client_request_is_stored_and_announced() {
    let h = harness(RecordingChannel::scripted(client_flow()));
    h.bot.clone().run().await.unwrap();

    let trips = h.store.load_trip_requests().await;
    assert_eq!(trips.len(), 1);
    let trip = &trips[0];
    assert_eq!(trip.sequence_number, 1);
    assert_eq!(trip.user_id, CLIENT);
    assert_eq!(trip.display_name, "Aziz Karimov");
    assert_eq!(trip.handle.as_deref(), Some("aziz"));
    assert_eq!(trip.route_description, "Tashkent to Samarkand tomorrow 9am");
    assert_eq!(trip.passenger_count, "2 people");
    assert_eq!(trip.price_offer, "150000");
    assert_eq!(trip.phone_number, "+998901234567");
    assert_eq!(trip.status, TripStatus::Pending);

    let to_operator = h.channel.sent_to(ChatId::from(OPERATOR));
    assert_eq!(to_operator.len(), 1);
    let (_, notification) = &to_operator[0];
    assert!(notification.text.contains("Tashkent to Samarkand tomorrow 9am"));
    assert!(notification.text.contains("+998901234567"));
    assert!(notification.text.contains("2 people"));
    let Some(Keyboard::Inline(rows)) = &notification.keyboard else {
        panic!("operator notification should carry accept/reject buttons");
    };
    assert_eq!(rows[0][0].data, "accept_555");
    assert_eq!(rows[0][1].data, "reject_555");

    let to_client = h.channel.sent_to(ChatId::from(CLIENT));
    let (_, confirmation) = to_client.last().unwrap();
    assert!(confirmation.text.contains("#1"));

    assert!(h.bot.sessions().snapshot(CLIENT).await.is_none());
}

#[tokio::test]
async fn restart_before_price_stores_nothing() {
    let h = harness(RecordingChannel::default());
    let mut events = client_flow();
    events.truncate(5);
    events.push(text("/start"));
    drive(&h.bot, events).await;

    assert!(h.store.load_trip_requests().await.is_empty());
    assert!(h.channel.sent_to(ChatId::from(OPERATOR)).is_empty());
    assert!(h.bot.sessions().snapshot(CLIENT).await.is_none());
}

#[tokio::test]
async fn failed_save_still_notifies_operator_and_user() {
    let h = harness(RecordingChannel::default());
    let orders = h.dir.path().join("orders.json");
    std::fs::write(&orders, "{ not a list").unwrap();

    drive(&h.bot, client_flow()).await;

    let to_operator = h.channel.sent_to(ChatId::from(OPERATOR));
    assert_eq!(to_operator.len(), 1);
    assert!(to_operator[0].1.text.contains("Tashkent to Samarkand tomorrow 9am"));
    assert!(to_operator[0].1.text.contains("+998901234567"));

    let (_, confirmation) = h.channel.sent_to(ChatId::from(CLIENT)).pop().unwrap();
    assert!(confirmation.text.contains("Your request has been received"));

    assert_eq!(std::fs::read_to_string(&orders).unwrap(), "{ not a list");
    assert!(h.store.load_trip_requests().await.is_empty());
}

#[tokio::test]
async fn driver_registration_has_no_operator_actions() {
    let h = harness(RecordingChannel::default());
    drive(
        &h.bot,
        vec![
            text("📝 New request"),
            text("🚗 Driver"),
            text("Name: X, Car: Y"),
            contact("+998907654321"),
        ],
    )
    .await;

    assert!(h.store.load_trip_requests().await.is_empty());
    let drivers = h.store.load_driver_registrations().await;
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0].status, DriverStatus::Active);
    assert_eq!(drivers[0].free_text_info, "Name: X, Car: Y");
    assert_eq!(drivers[0].phone_number, "+998907654321");

    let to_operator = h.channel.sent_to(ChatId::from(OPERATOR));
    assert_eq!(to_operator.len(), 1);
    assert!(to_operator[0].1.text.contains("Name: X, Car: Y"));
    assert_eq!(to_operator[0].1.keyboard, None);
}

#[tokio::test]
async fn operator_accept_edits_message_but_not_record() {
    let h = harness(RecordingChannel::default());
    drive(&h.bot, client_flow()).await;

    let (message_id, notification) = h.channel.sent_to(ChatId::from(OPERATOR)).remove(0);
    h.bot
        .handle_event(InboundEvent::Callback {
            callback_id: "cbq-1".into(),
            chat_id: ChatId::from(OPERATOR),
            sender: Sender::new(OPERATOR, "Operator"),
            message_id,
            message_text: notification.text.clone(),
            data: "accept_555".into(),
        })
        .await;

    let edits = h.channel.edits.lock().unwrap().clone();
    assert_eq!(edits.len(), 1);
    let (chat_id, edited_id, edited_text) = &edits[0];
    assert_eq!(*chat_id, ChatId::from(OPERATOR));
    assert_eq!(*edited_id, message_id);
    assert!(edited_text.starts_with(&notification.text));
    assert!(edited_text.ends_with("ACCEPTED"));

    let trips = h.store.load_trip_requests().await;
    assert_eq!(trips[0].status, TripStatus::Pending);
}

#[tokio::test]
async fn typing_at_phone_prompt_reprompts_once() {
    let h = harness(RecordingChannel::default());
    let mut events = client_flow();
    events.pop();
    drive(&h.bot, events).await;
    let before = h.channel.sent_to(ChatId::from(CLIENT)).len();

    h.bot.handle_event(text("+998901234567")).await;

    let after = h.channel.sent_to(ChatId::from(CLIENT));
    assert_eq!(after.len(), before + 1);
    assert!(after.last().unwrap().1.text.contains("Share phone number"));
    let session = h.bot.sessions().snapshot(CLIENT).await.unwrap();
    assert_eq!(session.state, DialogueState::PhoneInput);
    assert!(h.store.load_trip_requests().await.is_empty());
}

#[tokio::test]
async fn my_requests_lists_only_own_newest_first() {
    let h = harness(RecordingChannel::default());
    for route in ["first trip", "second trip"] {
        drive(
            &h.bot,
            vec![
                text("📝 New request"),
                text("👤 Client"),
                text(route),
                text("1 person"),
                text("negotiable"),
                contact("+998901234567"),
            ],
        )
        .await;
    }

    let other = Sender::new(UserId(777), "Other");
    for event in [
        "📝 New request",
        "👤 Client",
        "someone else's trip",
        "3 people",
        "",
    ] {
        h.bot
            .handle_event(InboundEvent::Text {
                chat_id: ChatId(777),
                sender: other.clone(),
                text: event.to_string(),
            })
            .await;
    }
    h.bot
        .handle_event(InboundEvent::Contact {
            chat_id: ChatId(777),
            sender: other,
            contact: SharedContact {
                phone_number: "+998900000000".into(),
                owner: Some(UserId(777)),
            },
        })
        .await;

    let trips = h.store.load_trip_requests().await;
    assert_eq!(trips.len(), 3);
    assert_eq!(trips[2].price_offer, "negotiable");

    h.bot.handle_event(text("📊 My requests")).await;
    let (_, listing) = h.channel.sent_to(ChatId::from(CLIENT)).pop().unwrap();
    let second = listing.text.find("second trip").unwrap();
    let first = listing.text.find("first trip").unwrap();
    assert!(second < first);
    assert!(!listing.text.contains("someone else's trip"));
}
