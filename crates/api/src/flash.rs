//! One-shot flash messages.
//!
//! A message is stored in the `flash` cookie as `level|text` and removed by
//! the next page that reads it. The cookie jar percent-encodes the value on
//! the wire.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

/// Name of the flash cookie.
pub const FLASH_COOKIE: &str = "flash";

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "info" => Some(Self::Info),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A message shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    fn encode(&self) -> String {
        format!("{}|{}", self.level.as_str(), self.message)
    }

    fn decode(value: &str) -> Option<Self> {
        let (level, message) = value.split_once('|')?;
        Some(Self {
            level: FlashLevel::parse(level)?,
            message: message.to_string(),
        })
    }
}

/// Add a flash message to the jar.
#[must_use]
pub fn set_flash(jar: CookieJar, level: FlashLevel, message: impl Into<String>) -> CookieJar {
    let flash = Flash {
        level,
        message: message.into(),
    };
    let cookie = Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Read and clear the pending flash message.
#[must_use]
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(value) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, Flash::decode(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_survives_encoding() {
        let flash = Flash {
            level: FlashLevel::Error,
            message: "Can't find account | try again, 100%".to_string(),
        };
        assert_eq!(Flash::decode(&flash.encode()), Some(flash));
    }

    #[test]
    fn test_malformed_flash_is_ignored() {
        assert_eq!(Flash::decode("no-separator"), None);
        assert_eq!(Flash::decode("fatal|boom"), None);
    }

    #[test]
    fn test_take_flash_clears_cookie() {
        let jar = set_flash(CookieJar::new(), FlashLevel::Success, "Saved");
        let (jar, flash) = take_flash(jar);

        assert_eq!(flash.unwrap().message, "Saved");
        assert!(jar.get(FLASH_COOKIE).is_none());

        let (_, again) = take_flash(jar);
        assert!(again.is_none());
    }

    #[test]
    fn test_flash_round_trips_through_headers() {
        use axum::{
            http::{HeaderMap, HeaderValue, header},
            response::IntoResponse,
        };

        let response = set_flash(
            CookieJar::new(),
            FlashLevel::Error,
            "Username already taken.",
        )
        .into_response();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        assert!(!pair.contains("%25"), "value encoded twice: {pair}");

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        let (_, flash) = take_flash(CookieJar::from_headers(&headers));

        assert_eq!(
            flash,
            Some(Flash {
                level: FlashLevel::Error,
                message: "Username already taken.".to_string(),
            })
        );
    }
}
