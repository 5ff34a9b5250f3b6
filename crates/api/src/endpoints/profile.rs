//! Profile endpoints.

use anifeed_common::{AppError, AppResult};
use anifeed_core::{EditProfileInput, ImageUpload};
use axum::{
    Router,
    extract::{Multipart, State, multipart::Field},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;

use crate::{
    extractors::AuthUser,
    flash::FlashLevel,
    middleware::AppState,
    response::{page, redirect_with_flash},
};

const PROFILE_PATH: &str = "/profile";

async fn profile_page(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    let view = state.profile_service.page(&user).await?;
    Ok(page(jar, view))
}

fn bad_part(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(e.to_string())
}

async fn text_part(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(bad_part)
}

/// Read a file part; parts without content are treated as absent.
async fn image_part(field: Field<'_>) -> AppResult<Option<ImageUpload>> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field.bytes().await.map_err(bad_part)?;

    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type,
        data: data.to_vec(),
    }))
}

/// Collect the multipart edit form.
async fn read_edit_form(mut multipart: Multipart) -> AppResult<EditProfileInput> {
    let mut input = EditProfileInput::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "display_name" => input.display_name = Some(text_part(field).await?),
            "username" => input.username = Some(text_part(field).await?),
            "location" => input.location = Some(text_part(field).await?),
            "bio" => input.bio = Some(text_part(field).await?),
            "show_email" => input.show_email = text_part(field).await? == "on",
            "profile_picture" => input.profile_picture = image_part(field).await?,
            "cover_image" => input.cover_image = image_part(field).await?,
            _ => {}
        }
    }

    Ok(input)
}

/// Apply the edit form and return to the profile page.
async fn edit_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = read_edit_form(multipart).await?;

    match state.profile_service.edit(user, input).await {
        Ok(()) => Ok(redirect_with_flash(
            jar,
            FlashLevel::Success,
            "Profile updated successfully!",
            PROFILE_PATH,
        )),
        Err(AppError::Conflict(message) | AppError::Validation(message)) => Ok(
            redirect_with_flash(jar, FlashLevel::Error, message, PROFILE_PATH),
        ),
        Err(e) => Err(e),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile_page))
        .route("/edit-profile", post(edit_profile))
}
