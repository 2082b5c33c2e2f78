//! Pure transition table: (state, input) → (next session, effects).
//!
//! Every reachable pair is listed explicitly. The "back" rows are not
//! uniform on purpose: route and driver-info step back to role selection,
//! passenger count and price also land on role selection with a full
//! reset, role selection and phone input fall back to the main menu.

use crate::records::NEGOTIABLE;

use super::effect::{Effect, FinalizeRequest, Prompt};
use super::input::{Input, MenuChoice};
use super::state::{DialogueState, Role, Session};

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_prompt(self, prompt: Prompt) -> Self {
        self.with_effect(Effect::Prompt(prompt))
    }
}

/// Pure transition function. No I/O; the caller executes the effects.
pub fn transition(session: &Session, input: Input) -> Transition {
    use DialogueState::*;

    match (session.state, input) {
        // ── Global commands ────────────────────────────────────────
        (_, Input::Restart) => {
            Transition::new(session.reset_to(MainMenu)).with_prompt(Prompt::Welcome)
        }

        (_, Input::Cancel) => {
            Transition::new(session.reset_to(MainMenu)).with_prompt(Prompt::Cancelled)
        }

        // ── Main menu ──────────────────────────────────────────────
        (MainMenu, Input::Menu(MenuChoice::NewRequest)) => {
            Transition::new(session.reset_to(RoleSelect)).with_prompt(Prompt::RoleSelect)
        }
        (MainMenu, Input::Menu(MenuChoice::MyRequests)) => {
            Transition::new(session.clone()).with_effect(Effect::ListOwnRequests)
        }
        (MainMenu, Input::Menu(MenuChoice::Help)) => {
            Transition::new(session.clone()).with_prompt(Prompt::Help)
        }
        (MainMenu, Input::Menu(MenuChoice::Contact)) => {
            Transition::new(session.clone()).with_prompt(Prompt::ContactInfo)
        }
        (MainMenu, Input::Menu(MenuChoice::Prices)) => {
            Transition::new(session.clone()).with_prompt(Prompt::Prices)
        }
        (MainMenu, _) => Transition::new(session.clone()).with_prompt(Prompt::MainMenu),

        // ── Role selection ─────────────────────────────────────────
        (RoleSelect, Input::ChooseRole(Role::Client)) => {
            let mut next = session.reset_to(RouteInput);
            next.role = Some(Role::Client);
            Transition::new(next).with_prompt(Prompt::Route)
        }
        (RoleSelect, Input::ChooseRole(Role::Driver)) => {
            let mut next = session.reset_to(DriverInfoInput);
            next.role = Some(Role::Driver);
            Transition::new(next).with_prompt(Prompt::DriverInfo)
        }
        (RoleSelect, Input::Back) => {
            Transition::new(session.reset_to(MainMenu)).with_prompt(Prompt::MainMenu)
        }
        (RoleSelect, _) => Transition::new(session.clone()).with_prompt(Prompt::RoleSelect),

        // ── Back from the form ─────────────────────────────────────
        (RouteInput | DriverInfoInput | PassengerCountInput | PriceInput, Input::Back) => {
            Transition::new(session.reset_to(RoleSelect)).with_prompt(Prompt::RoleSelect)
        }
        (PhoneInput, Input::Back) => {
            Transition::new(session.reset_to(MainMenu)).with_prompt(Prompt::MainMenu)
        }

        // ── Contacts are not form answers ──────────────────────────
        (RouteInput, Input::Contact(_)) => {
            Transition::new(session.clone()).with_prompt(Prompt::Route)
        }
        (PassengerCountInput, Input::Contact(_)) => {
            Transition::new(session.clone()).with_prompt(Prompt::PassengerCount)
        }
        (PriceInput, Input::Contact(_)) => {
            Transition::new(session.clone()).with_prompt(Prompt::Price)
        }
        (DriverInfoInput, Input::Contact(_)) => {
            Transition::new(session.clone()).with_prompt(Prompt::DriverInfo)
        }

        // ── Client answers ─────────────────────────────────────────
        (RouteInput, input) => {
            let mut next = session.with_state(PassengerCountInput);
            next.fields.route = Some(answer_text(input));
            Transition::new(next).with_prompt(Prompt::PassengerCount)
        }
        (PassengerCountInput, input) => {
            let mut next = session.with_state(PriceInput);
            next.fields.passengers = Some(answer_text(input));
            Transition::new(next).with_prompt(Prompt::Price)
        }
        (PriceInput, input) => {
            let price = answer_text(input);
            let mut next = session.with_state(PhoneInput);
            next.fields.price = Some(if price.trim().is_empty() {
                NEGOTIABLE.to_string()
            } else {
                price
            });
            Transition::new(next).with_prompt(Prompt::Phone)
        }

        // ── Driver answers ─────────────────────────────────────────
        (DriverInfoInput, input) => {
            let mut next = session.with_state(PhoneInput);
            next.fields.driver_info = Some(answer_text(input));
            Transition::new(next).with_prompt(Prompt::Phone)
        }

        // ── Phone ──────────────────────────────────────────────────
        (PhoneInput, Input::Contact(contact)) => {
            Transition::new(session.reset_to(MainMenu)).with_effect(Effect::Finalize(
                FinalizeRequest {
                    role: session.role,
                    fields: session.fields.clone(),
                    contact,
                },
            ))
        }
        (PhoneInput, _) => Transition::new(session.clone()).with_prompt(Prompt::PhoneRetry),
    }
}

/// Free-text states take whatever arrives as the answer.
fn answer_text(input: Input) -> String {
    match input {
        Input::Text(text) => text,
        // Contacts, menu and role inputs never reach free-text states.
        Input::Contact(_)
        | Input::Menu(_)
        | Input::ChooseRole(_)
        | Input::Back
        | Input::Restart
        | Input::Cancel => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{SharedContact, UserId};
    use crate::dialogue::state::FormFields;

    fn at(state: DialogueState) -> Session {
        Session::new(UserId(42)).with_state(state)
    }

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn contact() -> Input {
        Input::Contact(SharedContact {
            phone_number: "+998901234567".into(),
            owner: Some(UserId(42)),
        })
    }

    fn run(session: Session, inputs: Vec<Input>) -> (Session, Vec<Effect>) {
        let mut session = session;
        let mut effects = Vec::new();
        for input in inputs {
            let t = transition(&session, input);
            session = t.session;
            effects.extend(t.effects);
        }
        (session, effects)
    }

    #[test]
    fn new_request_enters_role_select() {
        let t = transition(&at(DialogueState::MainMenu), Input::Menu(MenuChoice::NewRequest));
        assert_eq!(t.session.state, DialogueState::RoleSelect);
        assert_eq!(t.effects, vec![Effect::Prompt(Prompt::RoleSelect)]);
    }

    #[test]
    fn read_only_menu_actions_stay_at_menu() {
        let cases = [
            (MenuChoice::MyRequests, Effect::ListOwnRequests),
            (MenuChoice::Help, Effect::Prompt(Prompt::Help)),
            (MenuChoice::Contact, Effect::Prompt(Prompt::ContactInfo)),
            (MenuChoice::Prices, Effect::Prompt(Prompt::Prices)),
        ];
        for (choice, effect) in cases {
            let session = at(DialogueState::MainMenu);
            let t = transition(&session, Input::Menu(choice));
            assert_eq!(t.session, session, "{choice:?} must not mutate the session");
            assert_eq!(t.effects, vec![effect]);
        }
    }

    #[test]
    fn unknown_text_at_menu_reshows_menu() {
        let t = transition(&at(DialogueState::MainMenu), text("hello"));
        assert_eq!(t.session.state, DialogueState::MainMenu);
        assert_eq!(t.effects, vec![Effect::Prompt(Prompt::MainMenu)]);
    }

    #[test]
    fn role_choice_sets_role_and_branch() {
        let t = transition(&at(DialogueState::RoleSelect), Input::ChooseRole(Role::Client));
        assert_eq!(t.session.state, DialogueState::RouteInput);
        assert_eq!(t.session.role, Some(Role::Client));

        let t = transition(&at(DialogueState::RoleSelect), Input::ChooseRole(Role::Driver));
        assert_eq!(t.session.state, DialogueState::DriverInfoInput);
        assert_eq!(t.session.role, Some(Role::Driver));
    }

    #[test]
    fn role_select_rejects_free_text() {
        let session = at(DialogueState::RoleSelect);
        let t = transition(&session, text("maybe"));
        assert_eq!(t.session, session);
        assert_eq!(t.effects, vec![Effect::Prompt(Prompt::RoleSelect)]);
    }

    #[test]
    fn back_from_role_select_returns_to_menu() {
        let t = transition(&at(DialogueState::RoleSelect), Input::Back);
        assert_eq!(t.session.state, DialogueState::MainMenu);
        assert_eq!(t.effects, vec![Effect::Prompt(Prompt::MainMenu)]);
    }

    #[test]
    fn back_from_route_clears_role() {
        let (session, _) = run(
            at(DialogueState::RoleSelect),
            vec![Input::ChooseRole(Role::Client), Input::Back],
        );
        assert_eq!(session.state, DialogueState::RoleSelect);
        assert_eq!(session.role, None);

        // A new role must be chosen; free text does not resume the old branch.
        let t = transition(&session, text("Tashkent"));
        assert_eq!(t.session.state, DialogueState::RoleSelect);
    }

    #[test]
    fn back_from_later_client_steps_resets_fully() {
        for inputs in [
            vec![Input::ChooseRole(Role::Client), text("route"), Input::Back],
            vec![Input::ChooseRole(Role::Client), text("route"), text("2"), Input::Back],
        ] {
            let (session, effects) = run(at(DialogueState::RoleSelect), inputs);
            assert_eq!(session.state, DialogueState::RoleSelect);
            assert_eq!(session.role, None);
            assert!(session.fields.is_empty());
            assert_eq!(effects.last(), Some(&Effect::Prompt(Prompt::RoleSelect)));
        }
    }

    #[test]
    fn back_from_driver_info_returns_to_role_select() {
        let (session, _) = run(
            at(DialogueState::RoleSelect),
            vec![Input::ChooseRole(Role::Driver), Input::Back],
        );
        assert_eq!(session.state, DialogueState::RoleSelect);
        assert_eq!(session.role, None);
    }

    #[test]
    fn back_from_phone_returns_to_menu() {
        let (session, effects) = run(
            at(DialogueState::RoleSelect),
            vec![Input::ChooseRole(Role::Driver), text("Car: Cobalt"), Input::Back],
        );
        assert_eq!(session, Session::new(UserId(42)));
        assert_eq!(effects.last(), Some(&Effect::Prompt(Prompt::MainMenu)));
    }

    #[test]
    fn free_text_states_accept_anything() {
        let (session, _) = run(
            at(DialogueState::RoleSelect),
            vec![
                Input::ChooseRole(Role::Client),
                text(""),
                text("a lot of people, maybe seven"),
                text("whatever you think"),
            ],
        );
        assert_eq!(session.state, DialogueState::PhoneInput);
        assert_eq!(session.fields.route.as_deref(), Some(""));
        assert_eq!(
            session.fields.passengers.as_deref(),
            Some("a lot of people, maybe seven")
        );
    }

    #[test]
    fn contact_in_free_text_state_reprompts() {
        let cases = [
            (DialogueState::RouteInput, Role::Client, Prompt::Route),
            (DialogueState::PassengerCountInput, Role::Client, Prompt::PassengerCount),
            (DialogueState::PriceInput, Role::Client, Prompt::Price),
            (DialogueState::DriverInfoInput, Role::Driver, Prompt::DriverInfo),
        ];
        for (state, role, prompt) in cases {
            let mut session = at(state);
            session.role = Some(role);
            session.fields.route = (role == Role::Client).then(|| "route".to_string());

            let t = transition(&session, contact());
            assert_eq!(t.session, session, "{state}");
            assert_eq!(t.effects, vec![Effect::Prompt(prompt)], "{state}");
        }

        let (session, _) = run(
            at(DialogueState::RoleSelect),
            vec![Input::ChooseRole(Role::Client), contact()],
        );
        assert_eq!(session.state, DialogueState::RouteInput);
        assert_eq!(session.fields.route, None);
    }

    #[test]
    fn blank_price_becomes_negotiable() {
        let mut session = at(DialogueState::PriceInput);
        session.role = Some(Role::Client);
        let t = transition(&session, text("   "));
        assert_eq!(t.session.fields.price.as_deref(), Some(NEGOTIABLE));
    }

    #[test]
    fn phone_input_reprompts_once_on_text() {
        let mut session = at(DialogueState::PhoneInput);
        session.role = Some(Role::Client);
        session.fields.route = Some("route".into());

        let t = transition(&session, text("+998901234567"));
        assert_eq!(t.session, session);
        assert_eq!(t.effects, vec![Effect::Prompt(Prompt::PhoneRetry)]);
    }

    #[test]
    fn client_flow_finalizes_with_answers() {
        let (session, effects) = run(
            at(DialogueState::MainMenu),
            vec![
                Input::Menu(MenuChoice::NewRequest),
                Input::ChooseRole(Role::Client),
                text("Tashkent to Samarkand tomorrow 9am"),
                text("2 people"),
                text("150000"),
                contact(),
            ],
        );
        assert_eq!(session, Session::new(UserId(42)));

        let Some(Effect::Finalize(request)) = effects.last() else {
            panic!("expected finalize effect, got {effects:?}");
        };
        assert_eq!(request.role, Some(Role::Client));
        assert_eq!(
            request.fields,
            FormFields {
                route: Some("Tashkent to Samarkand tomorrow 9am".into()),
                passengers: Some("2 people".into()),
                price: Some("150000".into()),
                driver_info: None,
            }
        );
        assert_eq!(request.contact.phone_number, "+998901234567");
    }

    #[test]
    fn driver_flow_finalizes_with_info() {
        let (_, effects) = run(
            at(DialogueState::MainMenu),
            vec![
                Input::Menu(MenuChoice::NewRequest),
                Input::ChooseRole(Role::Driver),
                text("Name: X, Car: Y"),
                contact(),
            ],
        );
        let Some(Effect::Finalize(request)) = effects.last() else {
            panic!("expected finalize effect");
        };
        assert_eq!(request.role, Some(Role::Driver));
        assert_eq!(request.fields.driver_info.as_deref(), Some("Name: X, Car: Y"));
        assert_eq!(request.fields.route, None);
    }

    #[test]
    fn restart_resets_from_any_state() {
        use DialogueState::*;
        for state in [
            MainMenu,
            RoleSelect,
            RouteInput,
            PassengerCountInput,
            PriceInput,
            DriverInfoInput,
            PhoneInput,
        ] {
            let mut session = at(state);
            session.role = Some(Role::Client);
            session.fields.route = Some("route".into());
            let t = transition(&session, Input::Restart);
            assert_eq!(t.session, Session::new(UserId(42)), "restart from {state}");
            assert_eq!(t.effects, vec![Effect::Prompt(Prompt::Welcome)]);
        }
    }

    #[test]
    fn cancel_clears_and_acknowledges() {
        let mut session = at(DialogueState::PassengerCountInput);
        session.role = Some(Role::Client);
        let t = transition(&session, Input::Cancel);
        assert_eq!(t.session, Session::new(UserId(42)));
        assert_eq!(t.effects, vec![Effect::Prompt(Prompt::Cancelled)]);
    }

    #[test]
    fn restart_before_price_stores_nothing() {
        let (session, effects) = run(
            at(DialogueState::MainMenu),
            vec![
                Input::Menu(MenuChoice::NewRequest),
                Input::ChooseRole(Role::Client),
                text("route"),
                text("2"),
                Input::Restart,
            ],
        );
        assert_eq!(session.state, DialogueState::MainMenu);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Finalize(_))));
    }
}
