use serde::Serialize;
use serde_json::Value;

/// Upstream lyrics payload, forwarded shape-as-is to the caller.
#[derive(Serialize, Clone, Debug)]
pub struct LyricsPayload {
    pub status: Value,
    pub data: Value,
}

/// One detected verse in a set of timestamped lyric lines.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Verse {
    pub index: usize,
    pub start_time: f64,
    pub first_line: String,
}
