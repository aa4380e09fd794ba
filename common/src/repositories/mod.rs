pub mod events;
pub mod hosts;
pub mod otp;
pub mod participants;
pub mod tickets;
pub mod users;

pub use events::{EventLookup, EventRepository, EventRepositoryImpl, NewEvent};
pub use hosts::{HostRepository, HostRepositoryImpl, NewHost};
pub use otp::{OtpRepository, OtpRepositoryImpl};
pub use participants::{
    BookingOutcome, ParticipantField, ParticipantRepository, ParticipantRepositoryImpl,
    SalesScope,
};
pub use tickets::{NewTicket, TicketRepository, TicketRepositoryImpl};
pub use users::{NewUser, UserRepository, UserRepositoryImpl};
