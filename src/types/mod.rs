mod ids;
mod invite;
mod message;
mod room;
mod sync;
mod time;
mod user;

pub use ids::{ConnectionId, Identifier, InviteId, MessageId, RoomId, UserId};
pub use invite::{
    Invite, InviteCode, InviteCreate, InviteKind, InvitePreview, InviteStatus, InviteTarget,
};
pub use message::Message;
pub use room::{Room, RoomCreate, RoomMember, RoomSnapshot};
pub use sync::{MessageClient, MessageServer};
pub use time::Time;
pub use user::{Identity, User};
