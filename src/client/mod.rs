//! Typed backend client.
//!
//! [`ApiClient`] speaks the backend's JSON contract over any [`Relay`](crate::relay::Relay)
//! and turns every failure into an [`ApiError`]. [`UploadCoordinator`]
//! drives batches of file uploads on top of it.

pub mod api;
pub mod error;
pub mod multipart;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, Connection, RequestOptions};
pub use error::{codes, ApiError, ErrorPayload, HTTP_ERROR, NETWORK_ERROR};
pub use multipart::MultipartForm;
pub use types::*;
pub use upload::{
    TransitionError, UploadCoordinator, UploadFile, UploadItem, UploadOutcome, UploadReport, UploadState,
    ALLOWED_EXTENSIONS, UPLOAD_PATH,
};
