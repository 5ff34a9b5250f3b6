//! Response helpers.

use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::flash::{Flash, FlashLevel, set_flash, take_flash};

/// Page view model plus the flash message pending for it.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
    #[serde(flatten)]
    pub data: T,
}

/// Render a page view model, consuming any pending flash.
pub fn page<T: Serialize>(jar: CookieJar, data: T) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, Json(Page { flash, data })).into_response()
}

/// Redirect after setting a flash message.
pub fn redirect_with_flash(
    jar: CookieJar,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    (set_flash(jar, level, message), Redirect::to(to)).into_response()
}

/// Plain redirect.
#[must_use]
pub fn redirect(to: &str) -> Response {
    Redirect::to(to).into_response()
}
