/// room names: unique, `[A-Za-z0-9 _-]`
pub const ROOM_NAME_MIN: u64 = 3;
pub const ROOM_NAME_MAX: u64 = 30;

/// the maximum length of a room description
pub const ROOM_DESCRIPTION_MAX: u64 = 200;

/// the maximum length of a message after trimming
pub const MESSAGE_MAX_LEN: usize = 1000;

/// how many persisted messages a joining session is replayed
pub const MESSAGE_HISTORY_LIMIT: u32 = 50;

/// invite expiry bounds, in hours; out-of-range requests are clamped
pub const INVITE_EXPIRES_HOURS_MIN: i64 = 1;
pub const INVITE_EXPIRES_HOURS_MAX: i64 = 168;

/// invite usage bounds; out-of-range requests are clamped
pub const INVITE_USAGE_MIN: u32 = 1;
pub const INVITE_USAGE_MAX: u32 = 100;

/// the maximum length of an invite message
pub const INVITE_MESSAGE_MAX: u64 = 200;

/// the room that always exists and is never deactivated
pub const GENERAL_ROOM_NAME: &str = "general";
