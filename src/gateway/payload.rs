use serde::{Deserialize, Serialize};

/// Body accepted by the processing endpoint.
///
/// The gateway forwards bodies byte-for-byte; this type only documents the
/// contract and lets the forwarder log what kind of source is being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub source_type: String,
}

/// Best-effort `source_type` lookup; `None` if the body is not a processing request.
pub fn extract_source_type(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ProcessingRequest>(body)
        .ok()
        .map(|req| req.source_type)
        .filter(|source_type| !source_type.is_empty())
}
