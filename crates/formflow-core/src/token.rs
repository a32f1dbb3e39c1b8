//! Session token and its transport codec
//!
//! The token is carried opaquely by the caller (usually in a cookie) and maps
//! each in-progress form to the id of its session record. Decoding is
//! best-effort: anything that cannot be read back yields an empty token, which
//! the session manager treats exactly like a first visit.
//!
//! Wire format: `base64url(json)` optionally followed by `.` and a
//! `base64url(HMAC-SHA256)` signature over the encoded payload.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::{Error, FormId, RecordId, Result};

type HmacSha256 = Hmac<Sha256>;

/// Mapping from form id to session record id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken {
    forms: BTreeMap<FormId, RecordId>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, form_id: &FormId) -> Option<&RecordId> {
        self.forms.get(form_id)
    }

    /// Return a copy of this token with `form_id` mapped to `record_id`
    pub fn with_mapping(&self, form_id: FormId, record_id: RecordId) -> Self {
        let mut next = self.clone();
        next.forms.insert(form_id, record_id);
        next
    }

    /// Return a copy of this token without a mapping for `form_id`
    pub fn without(&self, form_id: &FormId) -> Self {
        let mut next = self.clone();
        next.forms.remove(form_id);
        next
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FormId, &RecordId)> {
        self.forms.iter()
    }
}

impl FromIterator<(FormId, RecordId)> for SessionToken {
    fn from_iter<T: IntoIterator<Item = (FormId, RecordId)>>(iter: T) -> Self {
        Self {
            forms: iter.into_iter().collect(),
        }
    }
}

/// Encodes and decodes session tokens, optionally signing them
#[derive(Clone)]
pub struct TokenCodec {
    mac: Option<HmacSha256>,
}

impl TokenCodec {
    /// Codec without a signature; suitable for tests and trusted transports
    pub fn unsigned() -> Self {
        Self { mac: None }
    }

    /// Codec that signs every token with HMAC-SHA256 under `secret`
    ///
    /// # Errors
    /// - `Error::Config` if the secret is empty
    pub fn signed(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::Config("token signing secret must not be empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| Error::Config(format!("invalid token signing secret: {}", e)))?;
        Ok(Self { mac: Some(mac) })
    }

    pub fn is_signed(&self) -> bool {
        self.mac.is_some()
    }

    /// Serialize a token to its transportable form
    pub fn encode(&self, token: &SessionToken) -> Result<String> {
        let json = serde_json::to_vec(token)?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        match &self.mac {
            Some(mac) => {
                let mut mac = mac.clone();
                mac.update(payload.as_bytes());
                let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
                Ok(format!("{}.{}", payload, signature))
            }
            None => Ok(payload),
        }
    }

    /// Parse a raw token; malformed, tampered or absent input yields an empty token
    pub fn decode(&self, raw: Option<&str>) -> SessionToken {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return SessionToken::new();
        };

        match self.try_decode(raw) {
            Some(token) => token,
            None => {
                debug!("Discarding unreadable session token");
                SessionToken::new()
            }
        }
    }

    fn try_decode(&self, raw: &str) -> Option<SessionToken> {
        let payload = match (&self.mac, raw.split_once('.')) {
            (Some(mac), Some((payload, signature))) => {
                let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
                let mut mac = mac.clone();
                mac.update(payload.as_bytes());
                mac.verify_slice(&signature).ok()?;
                payload
            }
            (Some(_), None) => return None,
            (None, Some(_)) => return None,
            (None, None) => raw,
        };

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("signed", &self.is_signed())
            .finish()
    }
}
