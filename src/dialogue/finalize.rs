//! Turning a finished dialogue into a record.

use chrono::{DateTime, Utc};

use crate::channels::Sender;
use crate::error::FlowError;
use crate::records::{
    DriverRegistration, DriverStatus, NEGOTIABLE, NOT_PROVIDED, Submission, TripRequest,
    TripStatus,
};

use super::effect::FinalizeRequest;
use super::state::Role;

/// Assemble the record for `request`. Unanswered fields get sentinels;
/// the trip sequence number is left at 0 for the store to assign.
pub fn assemble(
    request: FinalizeRequest,
    sender: &Sender,
    now: DateTime<Utc>,
) -> Result<Submission, FlowError> {
    let FinalizeRequest {
        role,
        fields,
        contact,
    } = request;

    match role {
        Some(Role::Client) => Ok(Submission::Trip(TripRequest {
            sequence_number: 0,
            user_id: sender.id,
            display_name: sender.display_name(),
            handle: sender.username.clone(),
            phone_number: contact.phone_number,
            route_description: fields.route.unwrap_or_else(|| NOT_PROVIDED.to_string()),
            passenger_count: fields
                .passengers
                .unwrap_or_else(|| NOT_PROVIDED.to_string()),
            price_offer: fields.price.unwrap_or_else(|| NEGOTIABLE.to_string()),
            created_at: now,
            status: TripStatus::Pending,
        })),
        Some(Role::Driver) => Ok(Submission::Driver(DriverRegistration {
            user_id: sender.id,
            display_name: sender.display_name(),
            handle: sender.username.clone(),
            phone_number: contact.phone_number,
            free_text_info: fields
                .driver_info
                .unwrap_or_else(|| NOT_PROVIDED.to_string()),
            created_at: now,
            status: DriverStatus::Active,
        })),
        None => Err(FlowError::UnknownRole("unset".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{SharedContact, UserId};
    use crate::dialogue::state::FormFields;

    fn sender() -> Sender {
        Sender::new(UserId(7), "Aziz")
            .with_last_name("Karimov")
            .with_username("aziz_k")
    }

    fn request(role: Option<Role>, fields: FormFields) -> FinalizeRequest {
        FinalizeRequest {
            role,
            fields,
            contact: SharedContact {
                phone_number: "+998901234567".into(),
                owner: Some(UserId(7)),
            },
        }
    }

    #[test]
    fn client_answers_are_copied_verbatim() {
        let fields = FormFields {
            route: Some("Tashkent to Samarkand tomorrow 9am".into()),
            passengers: Some("2 people".into()),
            price: Some("150000".into()),
            driver_info: None,
        };
        let now = Utc::now();
        let Submission::Trip(trip) =
            assemble(request(Some(Role::Client), fields), &sender(), now).unwrap()
        else {
            panic!("expected trip request");
        };
        assert_eq!(trip.route_description, "Tashkent to Samarkand tomorrow 9am");
        assert_eq!(trip.passenger_count, "2 people");
        assert_eq!(trip.price_offer, "150000");
        assert_eq!(trip.phone_number, "+998901234567");
        assert_eq!(trip.display_name, "Aziz Karimov");
        assert_eq!(trip.handle.as_deref(), Some("aziz_k"));
        assert_eq!(trip.created_at, now);
        assert_eq!(trip.status, TripStatus::Pending);
    }

    #[test]
    fn missing_client_answers_get_sentinels() {
        let Submission::Trip(trip) = assemble(
            request(Some(Role::Client), FormFields::default()),
            &sender(),
            Utc::now(),
        )
        .unwrap() else {
            panic!("expected trip request");
        };
        assert_eq!(trip.price_offer, NEGOTIABLE);
        assert_eq!(trip.route_description, NOT_PROVIDED);
        assert_eq!(trip.passenger_count, NOT_PROVIDED);
    }

    #[test]
    fn driver_registration_is_active() {
        let fields = FormFields {
            driver_info: Some("Name: X, Car: Y".into()),
            ..FormFields::default()
        };
        let Submission::Driver(driver) =
            assemble(request(Some(Role::Driver), fields), &sender(), Utc::now()).unwrap()
        else {
            panic!("expected driver registration");
        };
        assert_eq!(driver.free_text_info, "Name: X, Car: Y");
        assert_eq!(driver.status, DriverStatus::Active);
        assert_eq!(driver.user_id, UserId(7));
    }

    #[test]
    fn missing_driver_info_gets_sentinel() {
        let Submission::Driver(driver) = assemble(
            request(Some(Role::Driver), FormFields::default()),
            &sender(),
            Utc::now(),
        )
        .unwrap() else {
            panic!("expected driver registration");
        };
        assert_eq!(driver.free_text_info, NOT_PROVIDED);
    }

    #[test]
    fn unset_role_is_an_error() {
        let err = assemble(request(None, FormFields::default()), &sender(), Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("Unknown role"));
    }
}
