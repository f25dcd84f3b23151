use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::PortfolioError;
use crate::models::LoanRecord;

/// Upper bound on the encoded share-link payload, in characters. Keeps the
/// payload embeddable in a URL query parameter.
pub const MAX_LINK_PAYLOAD: usize = 8 * 1024;

/// Serialize the record set as a plain JSON array - the file export and
/// clipboard format.
pub fn encode_json(records: &[LoanRecord]) -> Result<String, PortfolioError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Decode a JSON array of records. All-or-nothing: the payload is rejected
/// before any deserialization is applied when the top level is not an
/// array or any entry is missing a string `id`.
pub fn decode_json(payload: &str) -> Result<Vec<LoanRecord>, PortfolioError> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| PortfolioError::Decode(format!("not valid JSON: {e}")))?;

    let entries = value
        .as_array()
        .ok_or_else(|| PortfolioError::Decode("top-level value is not an array".to_string()))?;

    for (idx, entry) in entries.iter().enumerate() {
        let id = entry.get("id").and_then(|v| v.as_str()).unwrap_or("");
        if id.is_empty() {
            return Err(PortfolioError::Decode(format!(
                "entry {idx} is missing an id"
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| PortfolioError::Decode(e.to_string()))
}

/// Encode the record set for embedding in a share link: URL-safe unpadded
/// base64 over the JSON array, bounded by MAX_LINK_PAYLOAD.
pub fn encode_link(records: &[LoanRecord]) -> Result<String, PortfolioError> {
    let json = serde_json::to_string(records)?;
    let encoded = URL_SAFE_NO_PAD.encode(json.as_bytes());

    if encoded.len() > MAX_LINK_PAYLOAD {
        return Err(PortfolioError::Decode(format!(
            "portfolio too large for a share link ({} > {} chars)",
            encoded.len(),
            MAX_LINK_PAYLOAD
        )));
    }
    Ok(encoded)
}

/// Decode a share-link payload back into a record set.
pub fn decode_link(payload: &str) -> Result<Vec<LoanRecord>, PortfolioError> {
    if payload.len() > MAX_LINK_PAYLOAD {
        return Err(PortfolioError::Decode(
            "share link payload exceeds the size bound".to_string(),
        ));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim())
        .map_err(|e| PortfolioError::Decode(format!("not valid base64: {e}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| PortfolioError::Decode(format!("not valid UTF-8: {e}")))?;

    decode_json(&json)
}
