//! `{Message, Data}` response envelope
//!
//! Every platform endpoint answers with
//!
//! ```json
//! {"Message": "ok", "Data": ...}
//! ```
//!
//! `Data` absent or `null` is an empty success, not an error. Field names
//! match case-insensitively, an exact match taking precedence.

use bytes::Bytes;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, DeserializeOwned},
};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Uniform response wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    /// Human-readable status message
    #[serde(rename = "Message")]
    pub message: String,
    /// Payload
    #[serde(rename = "Data")]
    pub data: Option<T>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;

        let message = match field(&fields, "Message") {
            None | Some(Value::Null) => String::new(),
            Some(value) => String::deserialize(value).map_err(<D::Error as de::Error>::custom)?,
        };
        let data = match field(&fields, "Data") {
            None | Some(Value::Null) => None,
            Some(value) => Some(T::deserialize(value).map_err(<D::Error as de::Error>::custom)?),
        };

        Ok(Self { message, data })
    }
}

fn field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).or_else(|| {
        fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

impl<T> Envelope<T> {
    /// Create an envelope
    pub fn new(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }

    /// Take the payload
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Decode a response body
///
/// # Errors
///
/// Returns `Error::Decode` on invalid JSON or a payload that does not match `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<Envelope<T>> {
    serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))
}

/// Encode a request payload
///
/// # Errors
///
/// Returns `Error::Json` if `payload` cannot be serialized.
pub fn encode_payload<P: Serialize + ?Sized>(payload: &P) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(payload)?))
}
