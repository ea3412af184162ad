pub mod advise;
pub mod auth;
pub mod events;
pub mod pull;
pub mod push;
pub mod remote;
pub mod status;

/// Days of Google Calendar shown by `agenda remote`.
pub const DISPLAY_DAYS: i64 = 30;
