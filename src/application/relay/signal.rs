//! WebRTC signal payload validation.
//!
//! The relay never inspects SDP or candidate contents. It only forwards
//! payloads that are recognisably one of the three negotiation messages.

use serde_json::Value;

/// Recognised shape of a signaling payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    /// Classify a payload, or `None` if it matches no accepted shape.
    ///
    /// - SDP: object with `type` of `"offer"` or `"answer"` and a string `sdp`
    /// - ICE: object with a `candidate` member that is a string or an object
    pub fn classify(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;

        if let Some(kind) = object.get("type").and_then(Value::as_str) {
            let has_sdp = object.get("sdp").map(Value::is_string).unwrap_or(false);
            match kind {
                "offer" if has_sdp => return Some(Self::Offer),
                "answer" if has_sdp => return Some(Self::Answer),
                _ => {}
            }
        }

        match object.get("candidate") {
            Some(Value::String(_)) | Some(Value::Object(_)) => Some(Self::IceCandidate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "candidate",
        }
    }
}

/// Short description of a rejected payload for log fields.
pub fn describe(payload: &Value) -> &'static str {
    match payload {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(o) if o.is_empty() => "empty object",
        Value::Object(_) => "object",
    }
}
