//! Binance authentication and request signing
//!
//! HMAC-SHA256 over the URL-encoded parameter string, in insertion order,
//! rendered as lowercase hex.

use crate::types::ParameterSet;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Binance API credentials. The secret never appears in Debug output.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: Vec<u8>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl AsRef<[u8]>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.as_ref().to_vec(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Both parts non-empty
    pub fn is_valid(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Sign `params` and append the signature as the final field
    pub fn append_signature(&self, params: ParameterSet) -> ParameterSet {
        append_signature(params, &self.api_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Signature over `params` exactly as they will be transmitted.
pub fn sign(params: &ParameterSet, secret: &[u8]) -> String {
    sign_payload(&params.to_query_string(), secret)
}

/// HMAC-SHA256 of a raw payload as lowercase hex
pub fn sign_payload(payload: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Append the signature as the final field
pub fn append_signature(mut params: ParameterSet, secret: &[u8]) -> ParameterSet {
    let signature = sign(&params, secret);
    params.push("signature", signature);
    params
}
