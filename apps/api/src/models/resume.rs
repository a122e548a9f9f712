use serde::Serialize;
use serde_json::Value;

/// Body of a successful résumé response.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeResponse {
    pub message: String,
    /// UTC, ISO-8601 with microseconds and a trailing `Z`.
    pub timestamp: String,
    /// `-1` when the counter could not be read.
    #[serde(rename = "visitorCount")]
    pub visitor_count: i64,
    /// The shaped document, or the sliced `work` array when paginated.
    pub data: Value,
}
