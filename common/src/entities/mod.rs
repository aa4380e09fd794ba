pub mod events;
pub mod hosts;
pub mod otp_records;
pub mod participants;
pub mod prelude;
pub mod tickets;
pub mod users;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveEnum, Related};

    #[test]
    fn active_enum_serialization_roundtrip() {
        fn assert_roundtrip<T>(value: &T)
        where
            T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + core::fmt::Debug,
        {
            let encoded = serde_json::to_string(value).unwrap();
            let decoded: T = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, *value);
        }

        assert_roundtrip(&events::ApprovalStatus::Pending);
        assert_roundtrip(&events::ApprovalStatus::Approved);
        assert_roundtrip(&events::ApprovalStatus::Rejected);
        assert_roundtrip(&hosts::HostVerification::Unverified);
        assert_roundtrip(&hosts::HostVerification::Verified);
        assert_roundtrip(&tickets::TicketState::Unverified);
        assert_roundtrip(&tickets::TicketState::Verified);
        assert_roundtrip(&otp_records::OwnerType::User);
        assert_roundtrip(&otp_records::OwnerType::Host);
        assert_roundtrip(&otp_records::OtpPurpose::Verification);
        assert_roundtrip(&otp_records::OtpPurpose::PasswordReset);
    }

    #[test]
    fn stored_enum_values_match_legacy_strings() {
        assert_eq!(events::ApprovalStatus::Pending.to_value(), "pending");
        assert_eq!(tickets::TicketState::Verified.to_value(), "verified");
        assert_eq!(
            otp_records::OtpPurpose::PasswordReset.to_value(),
            "password_reset"
        );
        assert_eq!(
            serde_json::to_string(&events::ApprovalStatus::Approved).unwrap(),
            "\"approved\""
        );
    }

    #[test]
    fn relation_definitions_are_accessible() {
        let _ = <events::Entity as Related<hosts::Entity>>::to();
        let _ = <events::Entity as Related<participants::Entity>>::to();
        let _ = <events::Entity as Related<tickets::Entity>>::to();
        let _ = <hosts::Entity as Related<events::Entity>>::to();
        let _ = <hosts::Entity as Related<participants::Entity>>::to();
        let _ = <hosts::Entity as Related<tickets::Entity>>::to();
        let _ = <participants::Entity as Related<events::Entity>>::to();
        let _ = <participants::Entity as Related<users::Entity>>::to();
        let _ = <participants::Entity as Related<tickets::Entity>>::to();
        let _ = <tickets::Entity as Related<participants::Entity>>::to();
        let _ = <tickets::Entity as Related<users::Entity>>::to();
        let _ = <users::Entity as Related<participants::Entity>>::to();
        let _ = <users::Entity as Related<tickets::Entity>>::to();
    }

    #[test]
    fn password_hashes_never_serialize() {
        let now = chrono::Utc::now().naive_utc();
        let user = users::Model {
            id: 1,
            name: "Rafi".to_string(),
            email: "rafi@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            phone_number: "01700000000".to_string(),
            image_url: None,
            created_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "rafi@example.com");
    }
}
