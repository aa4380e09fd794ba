//! Row builders shared by the repository and service tests.

use crate::entities::events::ApprovalStatus;
use crate::entities::{events, hosts, participants, users};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub(crate) async fn seed_host(db: &DatabaseConnection, email: &str) -> hosts::Model {
    hosts::ActiveModel {
        name: Set("Dhaka Events Ltd".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(crate::domain::password::hash_password("host-pass").unwrap()),
        phone_number: Set("01800000000".to_string()),
        division: Set("Dhaka".to_string()),
        district: Set("Dhaka".to_string()),
        upazila_thana: Set("Gulshan".to_string()),
        address: Set("Road 11".to_string()),
        image_url: Set(None),
        verification: Set(hosts::HostVerification::Verified),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub(crate) async fn seed_user(db: &DatabaseConnection, email: &str) -> users::Model {
    users::ActiveModel {
        name: Set("Nusrat".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(crate::domain::password::hash_password("user-pass").unwrap()),
        phone_number: Set("01700000000".to_string()),
        image_url: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Category "Music", price 500.
pub(crate) async fn seed_event(
    db: &DatabaseConnection,
    host_id: i32,
    title: &str,
    event_date: NaiveDate,
    total_seat: i32,
    status: ApprovalStatus,
) -> events::Model {
    events::ActiveModel {
        host_id: Set(host_id),
        title: Set(title.to_string()),
        banner_url: Set(None),
        location: Set("Bashundhara".to_string()),
        description: Set(None),
        event_date: Set(event_date),
        event_time: Set("7:00 PM".to_string()),
        price: Set(500.0),
        total_seat: Set(total_seat),
        filled_seat: Set(0),
        category: Set("Music".to_string()),
        approval_status: Set(status),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub(crate) async fn seed_participant(
    db: &DatabaseConnection,
    event: &events::Model,
    user_id: i32,
    total_booked: i32,
    payment_date: Option<NaiveDateTime>,
) -> participants::Model {
    participants::ActiveModel {
        host_id: Set(event.host_id),
        event_id: Set(event.id),
        user_id: Set(user_id),
        total_booked: Set(total_booked),
        payment: Set(event.price * f64::from(total_booked)),
        due: Set(0.0),
        payment_date: Set(payment_date),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub(crate) fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 12, 31).unwrap()
}
