//! Rendering prompts, listings, and operator messages for the transport.

use crate::channels::{InlineButton, Keyboard, OutgoingMessage, ReplyButton, Sender};
use crate::dialogue::Prompt;
use crate::notify::{
    ActionTag, OperatorAction, ROUTE_PREVIEW_CHARS, format_timestamp, truncate_chars,
};
use crate::records::TripRequest;

use super::labels;

const RULE_WIDTH: usize = 35;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn reply_rows(rows: &[&[&str]]) -> Keyboard {
    Keyboard::Reply(
        rows.iter()
            .map(|row| row.iter().map(|label| ReplyButton::text(*label)).collect())
            .collect(),
    )
}

/// The full main menu.
pub fn main_menu_keyboard() -> Keyboard {
    reply_rows(&[
        &[labels::NEW_REQUEST],
        &[labels::MY_REQUESTS, labels::HELP],
        &[labels::CONTACT, labels::PRICES],
    ])
}

/// The shorter menu attached to a submission confirmation.
pub fn compact_menu_keyboard() -> Keyboard {
    reply_rows(&[&[labels::NEW_REQUEST], &[labels::MY_REQUESTS, labels::HELP]])
}

fn back_keyboard() -> Keyboard {
    reply_rows(&[&[labels::BACK]])
}

/// Render a dialogue prompt for `sender`.
pub fn render(prompt: Prompt, sender: &Sender) -> OutgoingMessage {
    match prompt {
        Prompt::Welcome => OutgoingMessage::new(format!(
            "Hello, {}! 👋\n\n\
             🚖 Welcome to the taxi bot!\n\n\
             Here you can:\n\
             ✅ Order a ride quickly\n\
             ✅ Register as a driver\n\
             ✅ Keep track of your requests\n\n\
             Choose a section:",
            sender.first_name
        ))
        .with_keyboard(main_menu_keyboard()),

        Prompt::MainMenu => {
            OutgoingMessage::new("Choose a section:").with_keyboard(main_menu_keyboard())
        }

        Prompt::RoleSelect => OutgoingMessage::new("Are you a client or a driver?")
            .with_keyboard(reply_rows(&[&[labels::CLIENT, labels::DRIVER], &[labels::BACK]])),

        Prompt::Route => OutgoingMessage::new(
            "🚕 Client section\n\n\
             📝 Write your route and time, for example:\n\n\
             📌 From Namangan to Qarshi today at 15:00\n\n\
             Please enter the details:",
        )
        .with_keyboard(back_keyboard()),

        Prompt::PassengerCount => {
            let [one, two, three, four, five] = labels::PASSENGER_PICKS;
            OutgoingMessage::new("👥 How many people are travelling?").with_keyboard(reply_rows(
                &[&[one, two, three], &[four, five], &[labels::BACK]],
            ))
        }

        Prompt::Price => OutgoingMessage::new(
            "💰 Do you have a price offer?\n\n\
             For example: 150 000 so'm\n\n\
             Or write 'negotiable':",
        )
        .with_keyboard(back_keyboard()),

        Prompt::DriverInfo => OutgoingMessage::new(
            "🚗 Driver section\n\n\
             Enter your details, for example:\n\n\
             Name: Sardor Karimov\n\
             Car: Nexia 3\n\
             Colour: White\n\
             Plate: 01 A 123 BC\n\
             Route: Tashkent-Namangan",
        )
        .with_keyboard(back_keyboard()),

        Prompt::Phone => OutgoingMessage::new("📱 Please share your phone number:").with_keyboard(
            Keyboard::Reply(vec![
                vec![ReplyButton::contact(labels::SHARE_PHONE)],
                vec![ReplyButton::text(labels::BACK)],
            ]),
        ),

        Prompt::PhoneRetry => OutgoingMessage::new(format!(
            "❌ Please press the '{}' button!",
            labels::SHARE_PHONE
        )),

        Prompt::Help => OutgoingMessage::new(format!(
            "ℹ️ HELP\n{}\n\n\
             📝 NEW REQUEST:\n\
             1. Press '{}'\n\
             2. Choose client or driver\n\
             3. Answer the questions one by one\n\
             4. Share your phone number\n\n\
             📊 MY REQUESTS:\n\
             See your 5 most recent requests\n\n\
             📞 CONTACT:\n\
             For any other questions\n\n\
             ⭐ PRICES:\n\
             See approximate fares\n\n\
             🔄 Start over: /start",
            rule(),
            labels::NEW_REQUEST
        )),

        Prompt::ContactInfo => OutgoingMessage::new(format!(
            "📞 CONTACT\n{}\n\n\
             ☎️ Phone: +998 XX XXX XX XX\n\
             📧 Email: info@taxibot.uz\n\
             🌐 Website: www.taxibot.uz\n\n\
             ⏰ Working hours: 24/7\n\n\
             Always at your service! 🚖",
            rule()
        )),

        Prompt::Prices => OutgoingMessage::new(format!(
            "⭐ APPROXIMATE PRICES\n{}\n\n\
             Tashkent → Namangan: 150 000 so'm\n\
             Tashkent → Andijan: 180 000 so'm\n\
             Tashkent → Fergana: 160 000 so'm\n\
             Tashkent → Samarkand: 120 000 so'm\n\
             Tashkent → Bukhara: 150 000 so'm\n\
             Namangan → Qarshi: 200 000 so'm\n\
             Namangan → Tashkent: 150 000 so'm\n\n\
             💡 Prices are approximate.\n\
             Place a request for an exact fare.",
            rule()
        )),

        Prompt::Cancelled => {
            OutgoingMessage::new("Cancelled. Press /start.").with_keyboard(Keyboard::Remove)
        }
    }
}

/// The user's recent trip requests, already filtered and ordered.
pub fn render_request_list(requests: &[TripRequest]) -> OutgoingMessage {
    if requests.is_empty() {
        return OutgoingMessage::new(format!(
            "📊 You have no requests yet.\n\n\
             Press '{}' to place one.",
            labels::NEW_REQUEST
        ));
    }

    let separator = "-".repeat(RULE_WIDTH);
    let mut text = format!("📊 YOUR REQUESTS\n{}\n\n", rule());
    for request in requests {
        text.push_str(&format!(
            "📝 Request #{}\n\
             📍 {}\n\
             👥 {}\n\
             💰 {}\n\
             🕐 {}\n\
             📊 {}\n\
             {separator}\n\n",
            request.sequence_number,
            truncate_chars(&request.route_description, ROUTE_PREVIEW_CHARS),
            request.passenger_count,
            request.price_offer,
            format_timestamp(&request.created_at),
            request.status,
        ));
    }
    OutgoingMessage::new(text)
}

/// Generic failure message shown when finalization cannot build a record.
pub fn render_failure(error: &dyn std::error::Error) -> OutgoingMessage {
    OutgoingMessage::new(format!(
        "❌ Something went wrong!\n\n\
         Error: {error}\n\n\
         Please press /start and try again."
    ))
}

/// Operator notification with its accept/reject buttons, if any.
pub fn render_operator_message(text: &str, actions: &[ActionTag]) -> OutgoingMessage {
    let message = OutgoingMessage::new(text);
    if actions.is_empty() {
        return message;
    }
    let row = actions
        .iter()
        .map(|tag| InlineButton {
            label: match tag.action {
                OperatorAction::Accept => labels::ACCEPT.to_string(),
                OperatorAction::Reject => labels::REJECT.to_string(),
            },
            data: tag.encode(),
        })
        .collect();
    message.with_keyboard(Keyboard::Inline(vec![row]))
}
