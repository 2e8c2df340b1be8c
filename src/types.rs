use diesel::result::Error as DieselError;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use tracing::error;

use crate::utils::try_respond;

pub trait Validate
where
    Self: Sized,
{
    type Error;
    fn validate(self) -> Result<Self, Self::Error>;
}

#[derive(Debug)]
pub enum ApiError {
    Diesel(DieselError),
    Validation(ValidationError),
    NotFound,
    Forbidden,
    Unauthorized,
    SlugExhausted { attempts: u32 },
    Inconsistent { article_id: i32, count: i32, favorited_by: i64 },
    Internal,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Diesel(e) => write!(f, "database error: {}", e),
            ApiError::Validation(e) => write!(f, "validation failed on {} field(s)", e.len()),
            ApiError::NotFound => f.write_str("entity not found"),
            ApiError::Forbidden => f.write_str("forbidden"),
            ApiError::Unauthorized => f.write_str("unauthorized"),
            ApiError::SlugExhausted { attempts } => {
                write!(f, "no free slug after {} attempts", attempts)
            }
            ApiError::Inconsistent {
                article_id,
                count,
                favorited_by,
            } => write!(
                f,
                "article {} has favorites_count {} but {} favoriting users",
                article_id, count, favorited_by
            ),
            ApiError::Internal => f.write_str("internal error"),
        }
    }
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        match err {
            DieselError::NotFound => ApiError::NotFound,
            other => ApiError::Diesel(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> ApiError {
        ApiError::Validation(err)
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize, Default, PartialEq)]
pub struct ValidationError(HashMap<String, Vec<String>>);

impl ValidationError {
    pub fn add_error<K: Into<String>, V: Into<String>>(&mut self, key: K, val: V) {
        let entry = self.0.entry(key.into()).or_default();
        entry.push(val.into());
    }

    pub fn from<K: Into<String>, V: Into<String>>(key: K, val: V) -> Self {
        let mut error = ValidationError::default();
        error.add_error(key, val);
        error
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self, key: &str) -> &[String] {
        self.0.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationError> {
        if self.empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::NotFound => Status::NotFound,
            ApiError::Forbidden => Status::Forbidden,
            ApiError::Unauthorized => Status::Unauthorized,
            ApiError::Validation(_) => Status::UnprocessableEntity,
            _ => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        match self {
            ApiError::Validation(error) => {
                let body = json!({ "errors": error });
                try_respond(req, &body, status)
            }
            ApiError::NotFound => {
                let body = json!({ "errors": { "body": ["entity not found"] } });
                try_respond(req, &body, status)
            }
            ApiError::Forbidden => {
                let body = json!({ "errors": { "body": ["you are not the author of this article"] } });
                try_respond(req, &body, status)
            }
            ApiError::Unauthorized => {
                let body = json!({ "errors": { "status": ["401 Unauthorized"] } });
                try_respond(req, &body, status)
            }
            other => {
                error!(error = %other, path = %req.uri(), "request failed");
                let body = json!({ "errors": { "body": ["internal server error"] } });
                try_respond(req, &body, status)
            }
        }
    }
}

impl<T> Validate for Json<T>
where
    T: Validate,
{
    type Error = <T as Validate>::Error;
    fn validate(self) -> Result<Self, Self::Error> {
        let inner = self.into_inner();
        let validated = inner.validate()?;
        Ok(Json(validated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_becomes_not_found() {
        let err: ApiError = DieselError::NotFound.into();
        assert_eq!(err.status(), Status::NotFound);
    }

    #[test]
    fn opaque_errors_map_to_500() {
        let errors = vec![
            ApiError::Internal,
            ApiError::SlugExhausted { attempts: 5 },
            ApiError::Inconsistent {
                article_id: 1,
                count: 2,
                favorited_by: 1,
            },
        ];
        for err in errors {
            assert_eq!(err.status(), Status::InternalServerError);
        }
    }
}
