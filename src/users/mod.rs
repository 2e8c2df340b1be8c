use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};
use tracing::debug;

use crate::config::Config;
use crate::types::ApiError;

pub mod models;
pub mod token;

/// The user an incoming request acts as, taken from its `Authorization` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
}

/// Guard for routes that require an authenticated caller; `?` it inside the
/// handler so a missing token answers with 401.
pub type CurrentUser = Result<AuthUser, ApiError>;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let header = match request.headers().get_one("Authorization") {
            Some(header) => header,
            None => return Outcome::Error((Status::Unauthorized, ApiError::Unauthorized)),
        };
        let config = match request.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, ApiError::Internal)),
        };

        let raw = header.trim_start_matches("Token ").trim();
        match token::verify(raw, &config.jwt_secret) {
            Ok(id) => Outcome::Success(AuthUser { id }),
            Err(e) => {
                debug!(error = %e, "rejected authorization header");
                Outcome::Error((Status::Unauthorized, ApiError::Unauthorized))
            }
        }
    }
}
