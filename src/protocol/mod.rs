//! Wire protocol: a structured text envelope carrying tagged client/server messages.

pub mod envelope;
pub mod messages;

pub use envelope::{decode, encode, Envelope};
pub use messages::{
    ClientMessage, MembershipAction, RoomMessageView, RoomView, ServerMessage, UserSummary,
};
