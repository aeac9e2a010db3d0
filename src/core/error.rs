// Centralized error handling for the profile media service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use std::time::Duration;
use thiserror::Error;

/// Failures of a single fetch -> decode -> resize -> encode -> write run
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid target dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    #[error("Image source returned status {0}")]
    Status(u16),

    #[error("Timed out fetching image after {0:?}")]
    Timeout(Duration),

    #[error("Image larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to write image: {0}")]
    Write(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User {0} not found")]
    NotFound(u32),

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Account store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a profile image update that did not complete
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Malformed update form: {0}")]
    MalformedForm(String),

    #[error("Invalid {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("No image URL provided")]
    NothingToUpdate,

    #[error("User {0} not found")]
    UserNotFound(u32),

    #[error("Avatar processing failed: {0}")]
    AvatarProcessingFailed(#[source] IngestError),

    #[error("Banner processing failed: {0}")]
    BannerProcessingFailed(#[source] IngestError),

    #[error("Failed to update account: {0}")]
    Persistence(#[source] StoreError),
}

impl UpdateError {
    /// Plain-text status shown on the profile page
    pub fn user_message(&self) -> &'static str {
        match self {
            UpdateError::MalformedForm(_) => "Error updating profile images",
            UpdateError::InvalidUrl { .. } => "Invalid image URL",
            UpdateError::NothingToUpdate => "No image URL provided",
            UpdateError::UserNotFound(_) => "User not found",
            UpdateError::AvatarProcessingFailed(_) => "Error processing avatar image",
            UpdateError::BannerProcessingFailed(_) => "Error processing banner image",
            UpdateError::Persistence(_) => "Error updating profile",
        }
    }
}

/// Errors surfaced by the profile endpoints
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Not logged in")]
    Unauthorized,

    #[error("User not found")]
    NotFound,
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        use crate::models::profile::ErrorResponse;

        let status = match &self {
            ProfileError::Unauthorized => return Redirect::to("/login").into_response(),
            ProfileError::NotFound => StatusCode::NOT_FOUND,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
