//! Mapping between the local colour palette and Google Calendar colour ids.
//!
//! Both directions are derived from [`PALETTE`], so every palette entry
//! survives a local → remote → local round trip.

/// Hex colour used when an event has none, and for unknown remote ids.
pub const DEFAULT_HEX: &str = "#4285f4";

/// Remote colour id used for hex values outside the palette.
pub const DEFAULT_REMOTE_ID: &str = "1";

/// A palette entry: local hex value, remote colour id, display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub hex: &'static str,
    pub remote_id: &'static str,
    pub name: &'static str,
}

pub static PALETTE: [Swatch; 10] = [
    Swatch { hex: "#4285f4", remote_id: "1", name: "Blue" },
    Swatch { hex: "#dc2127", remote_id: "11", name: "Red" },
    Swatch { hex: "#f4b400", remote_id: "5", name: "Yellow" },
    Swatch { hex: "#0f9d58", remote_id: "10", name: "Green" },
    Swatch { hex: "#ff6d00", remote_id: "6", name: "Orange" },
    Swatch { hex: "#7986cb", remote_id: "9", name: "Lavender" },
    Swatch { hex: "#33b679", remote_id: "2", name: "Sage" },
    Swatch { hex: "#8e24aa", remote_id: "3", name: "Grape" },
    Swatch { hex: "#e67c73", remote_id: "4", name: "Flamingo" },
    Swatch { hex: "#616161", remote_id: "8", name: "Graphite" },
];

/// Look up a palette entry by hex value (case-insensitive).
pub fn swatch(hex: &str) -> Option<&'static Swatch> {
    PALETTE.iter().find(|s| s.hex.eq_ignore_ascii_case(hex.trim()))
}

/// Local hex → remote colour id, `"1"` when the hex is unknown.
pub fn to_remote_id(hex: &str) -> &'static str {
    swatch(hex).map(|s| s.remote_id).unwrap_or(DEFAULT_REMOTE_ID)
}

/// Remote colour id → local hex, primary blue when the id is unknown.
pub fn to_local_hex(remote_id: &str) -> &'static str {
    PALETTE
        .iter()
        .find(|s| s.remote_id == remote_id.trim())
        .map(|s| s.hex)
        .unwrap_or(DEFAULT_HEX)
}

/// Resolve a colour given by hex value or palette name ("sage", "Grape").
pub fn resolve(input: &str) -> Option<&'static str> {
    swatch(input)
        .or_else(|| PALETTE.iter().find(|s| s.name.eq_ignore_ascii_case(input.trim())))
        .map(|s| s.hex)
}
