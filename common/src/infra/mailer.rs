use crate::config::MailSettings;
use crate::entities::otp_records::OtpPurpose;
use async_trait::async_trait;
use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("invalid content type: {0}")]
    ContentType(String),
}

/// Everything printed on one emailed ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketEmail {
    pub to: String,
    pub user_name: String,
    pub event_title: String,
    pub event_location: String,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub ticket_no: i32,
    pub ticket_code: String,
    pub qr_png: Vec<u8>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_ticket(&self, ticket: TicketEmail) -> Result<(), MailError>;

    async fn send_otp(
        &self,
        to: &str,
        name: &str,
        otp: &str,
        purpose: OtpPurpose,
    ) -> Result<(), MailError>;

    async fn send_event_approved(
        &self,
        to: &str,
        host_name: &str,
        event_title: &str,
        event_date: NaiveDate,
    ) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_settings(settings: &MailSettings) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
            .port(settings.smtp_port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(
                Some(settings.from_name.clone()),
                settings.from_email.parse()?,
            ),
        })
    }

    fn html_message(&self, to: &str, subject: &str, html: String) -> Result<Message, MailError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?)
    }

    fn ticket_message(&self, ticket: &TicketEmail) -> Result<Message, MailError> {
        let png_type =
            ContentType::parse("image/png").map_err(|e| MailError::ContentType(e.to_string()))?;
        let qr_part = Attachment::new_inline("qrimage".to_string())
            .body(ticket.qr_png.clone(), png_type);

        Ok(Message::builder()
            .from(self.from.clone())
            .to(ticket.to.parse()?)
            .subject(format!(
                "{} - Your Ticket #{}",
                ticket.event_title, ticket.ticket_no
            ))
            .multipart(
                MultiPart::related()
                    .singlepart(SinglePart::html(ticket_html(ticket)))
                    .singlepart(qr_part),
            )?)
    }

    async fn deliver(&self, message: Message) -> Result<(), MailError> {
        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_ticket(&self, ticket: TicketEmail) -> Result<(), MailError> {
        let message = self.ticket_message(&ticket)?;
        self.deliver(message).await?;
        tracing::info!(to = %ticket.to, ticket = %ticket.ticket_code, "ticket email sent");
        Ok(())
    }

    async fn send_otp(
        &self,
        to: &str,
        name: &str,
        otp: &str,
        purpose: OtpPurpose,
    ) -> Result<(), MailError> {
        let (subject, html) = otp_content(name, otp, purpose);
        let message = self.html_message(to, subject, html)?;
        self.deliver(message).await
    }

    async fn send_event_approved(
        &self,
        to: &str,
        host_name: &str,
        event_title: &str,
        event_date: NaiveDate,
    ) -> Result<(), MailError> {
        let html = approval_html(host_name, event_title, event_date);
        let message =
            self.html_message(to, &format!("Your event \"{}\" is approved", event_title), html)?;
        self.deliver(message).await
    }
}

/// Used when `mail.enabled` is false: nothing leaves the process.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_ticket(&self, ticket: TicketEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %ticket.to,
            ticket = %ticket.ticket_code,
            qr_bytes = ticket.qr_png.len(),
            "mail disabled, ticket email skipped"
        );
        Ok(())
    }

    async fn send_otp(
        &self,
        to: &str,
        _name: &str,
        otp: &str,
        purpose: OtpPurpose,
    ) -> Result<(), MailError> {
        tracing::info!(to, ?purpose, otp, "mail disabled, otp email skipped");
        Ok(())
    }

    async fn send_event_approved(
        &self,
        to: &str,
        _host_name: &str,
        event_title: &str,
        _event_date: NaiveDate,
    ) -> Result<(), MailError> {
        tracing::info!(to, event_title, "mail disabled, approval email skipped");
        Ok(())
    }
}

/// Escapes text interpolated into the mail bodies.
fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn ticket_html(ticket: &TicketEmail) -> String {
    format!(
        r#"<html>
<body style="font-family: 'Segoe UI', Arial, sans-serif; background-color: #f4f6f9; color: #333;">
  <div style="background-color: #fff; border: 2px solid #007bff; border-radius: 15px; padding: 25px; margin: 30px auto; width: 600px;">
    <div style="text-align: center; color: #007bff; font-size: 24px; font-weight: bold;">{title} - Ticket Confirmation</div>
    <div style="text-align: center; font-size: 16px;">
      <p>Hi <b>{name}</b>,</p>
      <p>Thank you for booking! Here is your <b>Ticket #{no}</b> ({code}).</p>
      <p><b>Location:</b> {location}<br><b>Date:</b> {date}<br><b>Time:</b> {time}</p>
    </div>
    <div style="text-align: center; margin: 20px 0;">
      <img src="cid:qrimage" alt="QR Code Ticket {no}" width="200" height="200"/>
    </div>
    <div style="text-align: center; font-size: 14px; color: #666;">Please show this ticket at the event entrance.</div>
  </div>
</body>
</html>"#,
        title = escape_html(&ticket.event_title),
        name = escape_html(&ticket.user_name),
        no = ticket.ticket_no,
        code = escape_html(&ticket.ticket_code),
        location = escape_html(&ticket.event_location),
        date = ticket.event_date.format("%B %d, %Y"),
        time = escape_html(&ticket.event_time),
    )
}

fn otp_content(name: &str, otp: &str, purpose: OtpPurpose) -> (&'static str, String) {
    let (subject, intro) = match purpose {
        OtpPurpose::Verification => (
            "Verify your Eventisa host account",
            "Use this code to verify your host account.",
        ),
        OtpPurpose::PasswordReset => (
            "Reset your Eventisa password",
            "Use this code to reset your password.",
        ),
    };

    let name = escape_html(name);
    let otp = escape_html(otp);
    let html = format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <p>Hi {name},</p>
  <p>{intro}</p>
  <p style="font-size: 28px; font-weight: bold; letter-spacing: 6px;">{otp}</p>
  <p style="color: #666; font-size: 14px;">The code expires in a few minutes. If you did not request it, ignore this email.</p>
</body>
</html>"#
    );

    (subject, html)
}

fn approval_html(host_name: &str, event_title: &str, event_date: NaiveDate) -> String {
    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <p>Hi {host_name},</p>
  <p>Your event <b>{event_title}</b> on {date} has been approved and is now visible to attendees.</p>
</body>
</html>"#,
        host_name = escape_html(host_name),
        event_title = escape_html(event_title),
        date = event_date.format("%B %d, %Y"),
    )
}
