use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

const COOKIE: &str = "flash";

// Bytes a cookie value cannot carry as they are, plus `%` itself.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FlashKind {
    Notice,
    Error,
}

/// A one-shot message shown on the page a redirect lands on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    fn encode(&self) -> Option<String> {
        let json = serde_json::to_string(self).ok()?;
        Some(utf8_percent_encode(&json, COOKIE_VALUE).to_string())
    }

    fn decode(value: &str) -> Option<Self> {
        let json = percent_decode_str(value).decode_utf8().ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Stores the flash in `jar` and redirects to `location`.
    pub fn redirect(self, jar: CookieJar, location: &str) -> Response {
        let jar = match self.encode() {
            Some(value) => jar.add(Cookie::build((COOKIE, value)).path("/").http_only(true)),
            None => jar,
        };

        (jar, Redirect::to(location)).into_response()
    }

    /// Reads the pending flash, if any, and clears the cookie even when it
    /// does not decode.
    pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
        let Some(cookie) = jar.get(COOKIE) else {
            return (jar, None);
        };

        let flash = Flash::decode(cookie.value());
        (jar.remove(Cookie::build(COOKIE).path("/")), flash)
    }
}
