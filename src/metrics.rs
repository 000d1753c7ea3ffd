use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge, Opts};

macro_rules! register_gauge {
    ($NAME:ident, $help:expr) => {
        pub static $NAME: Lazy<IntGauge> = Lazy::new(|| {
            register_int_gauge!(Opts::new(stringify!($NAME), $help).namespace("hearth"))
                .unwrap_or_else(|e| panic!("Failed to register gauge {}: {}", stringify!($NAME), e))
        });
    };
}

macro_rules! register_counter {
    ($NAME:ident, $help:expr) => {
        pub static $NAME: Lazy<IntCounter> = Lazy::new(|| {
            register_int_counter!(Opts::new(stringify!($NAME), $help).namespace("hearth"))
                .unwrap_or_else(|e| {
                    panic!("Failed to register counter {}: {}", stringify!($NAME), e)
                })
        });
    };
}

register_gauge!(CONNECTIONS_LIVE, "Number of live websocket connections");
register_gauge!(SESSIONS_ONLINE, "Number of users with a live session");
register_gauge!(ROOM_COUNT_ACTIVE, "Number of active rooms");

register_counter!(MESSAGES_ACCEPTED_TOTAL, "Messages accepted by the pipeline");
register_counter!(INVITES_ISSUED_TOTAL, "Invitations issued");
register_counter!(INVITES_REDEEMED_TOTAL, "Invitations redeemed");
