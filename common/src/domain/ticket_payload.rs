//! The text encoded into every ticket QR code.
//!
//! Wire format is a run of `key:*value*` fields:
//! `uid:*1*uname:*Rafi*eid:*4*ename:*Jazz Night*ticket:*12.1*uemail:*rafi@example.com*`

use std::collections::HashMap;
use thiserror::Error;

const REQUIRED_KEYS: [&str; 6] = ["uid", "uname", "eid", "ename", "ticket", "uemail"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a valid id: {value:?}")]
    InvalidId { field: &'static str, value: String },
    #[error("malformed ticket code: {0:?}")]
    MalformedTicketCode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPayload {
    pub user_id: i32,
    pub user_name: String,
    pub event_id: i32,
    pub event_name: String,
    pub ticket_code: String,
    pub user_email: String,
}

/// `"{participant_id}.{unit}"`, unit counted from 1.
pub fn ticket_code(participant_id: i32, unit: i32) -> String {
    format!("{}.{}", participant_id, unit)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '*' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Every `key:*value*` pair in `text`; later duplicates win.
fn scan_fields(text: &str) -> HashMap<&str, &str> {
    let mut fields = HashMap::new();
    let mut rest = text;

    while let Some(idx) = rest.find(":*") {
        let prefix = &rest[..idx];
        let key = &prefix[prefix.trim_end_matches(is_word_char).len()..];
        let after = &rest[idx + 2..];

        if key.is_empty() {
            rest = &rest[idx + 1..];
            continue;
        }

        match after.find('*') {
            Some(end) => {
                fields.insert(key, after[..end].trim());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }

    fields
}

impl TicketPayload {
    pub fn encode(&self) -> String {
        format!(
            "uid:*{}*uname:*{}*eid:*{}*ename:*{}*ticket:*{}*uemail:*{}*",
            self.user_id,
            sanitize(&self.user_name),
            self.event_id,
            sanitize(&self.event_name),
            sanitize(&self.ticket_code),
            sanitize(&self.user_email),
        )
    }

    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let fields = scan_fields(text);

        for key in REQUIRED_KEYS {
            if !fields.contains_key(key) {
                return Err(PayloadError::MissingField(key));
            }
        }

        let parse_id = |field: &'static str| -> Result<i32, PayloadError> {
            let value = fields[field];
            value.parse::<i32>().map_err(|_| PayloadError::InvalidId {
                field,
                value: value.to_string(),
            })
        };

        let payload = Self {
            user_id: parse_id("uid")?,
            user_name: fields["uname"].to_string(),
            event_id: parse_id("eid")?,
            event_name: fields["ename"].to_string(),
            ticket_code: fields["ticket"].to_string(),
            user_email: fields["uemail"].to_string(),
        };

        if payload.participant_id().is_none() {
            return Err(PayloadError::MalformedTicketCode(payload.ticket_code));
        }

        Ok(payload)
    }

    pub fn participant_id(&self) -> Option<i32> {
        let (participant, unit) = self.ticket_code.split_once('.')?;
        unit.parse::<i32>().ok()?;
        participant.parse::<i32>().ok()
    }
}
