pub use super::events::Entity as Events;
pub use super::hosts::Entity as Hosts;
pub use super::otp_records::Entity as OtpRecords;
pub use super::participants::Entity as Participants;
pub use super::tickets::Entity as Tickets;
pub use super::users::Entity as Users;
