//! Session cookie transport

use axum::http::{HeaderMap, HeaderValue, header};

use crate::config::CookieConfig;

/// Attributes of the session cookie
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_seconds: Option<u64>,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self::from(&CookieConfig::default())
    }
}

impl From<&CookieConfig> for CookieSettings {
    fn from(config: &CookieConfig) -> Self {
        Self {
            name: config.name.clone(),
            secure: config.secure,
            max_age_seconds: config.max_age_seconds,
        }
    }
}

impl CookieSettings {
    /// Value of this cookie in the request's `Cookie` headers, if present
    pub fn read<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim_matches('"'))
    }

    /// `Set-Cookie` header carrying `value`
    pub fn to_header(&self, value: &str) -> Option<HeaderValue> {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", self.name, value);
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(max_age) = self.max_age_seconds {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        HeaderValue::from_str(&cookie).ok()
    }
}
