use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::auth::AuthError;
use crate::application::categories::CategoryError;
use crate::application::error::ErrorReport;
use crate::application::images::ImageError;
use crate::application::menu::MenuError;
use crate::application::news::NewsError;
use crate::application::repos::RepoError;
use crate::domain::entities::BlockingItem;

const SOURCE: &str = "infra::http::error";

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INTEGRITY: &str = "integrity_error";
    pub const CATEGORY_IN_USE: &str = "category_in_use";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const UPLOAD: &str = "upload_error";
    pub const STORAGE: &str = "storage_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking: Option<Vec<BlockingItem>>,
}

/// JSON error response; never exposes internal detail for 5xx statuses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    blocking: Option<Vec<BlockingItem>>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            blocking: None,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn invalid_input(message: &'static str, error: &dyn StdError) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            message,
            Some(error.to_string()),
        )
    }

    /// The same response for every authentication failure.
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Unauthorized",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn category_in_use(blocking: Vec<BlockingItem>) -> Self {
        let mut error = Self::new(
            StatusCode::CONFLICT,
            codes::CATEGORY_IN_USE,
            "Category is still used by menu items",
            None,
        );
        error.blocking = Some(blocking);
        error
    }

    /// Opaque server error; the cause chain only reaches the logs.
    pub fn internal(code: &'static str, message: &'static str, error: &dyn StdError) -> Self {
        let mut api = Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message, None);
        api.report = Some(ErrorReport::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            error,
        ));
        api
    }

    /// Keep the underlying cause for the logs without showing it to the client.
    pub fn with_cause(mut self, error: &dyn StdError) -> Self {
        self.report = Some(ErrorReport::from_error(SOURCE, self.status, error));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
                blocking: self.blocking,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        err @ RepoError::Persistence(_) => {
            ApiError::internal(codes::INTERNAL, "Internal server error", &err)
        }
    }
}

pub(crate) fn image_to_api(err: ImageError) -> ApiError {
    match err {
        ImageError::NotAnImage { .. } | ImageError::TooLarge { .. } => {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::UPLOAD,
                "Rejected image upload",
                Some(err.to_string()),
            )
        }
        ImageError::Store(_) | ImageError::Delete { .. } => {
            ApiError::internal(codes::STORAGE, "Image storage failed", &err)
        }
    }
}

pub(crate) fn category_to_api(err: CategoryError) -> ApiError {
    match err {
        CategoryError::InvalidName(inner) => ApiError::invalid_input("Invalid category name", &inner),
        CategoryError::NotFound => ApiError::not_found("Category not found"),
        CategoryError::InUse { blocking } => ApiError::category_in_use(blocking),
        CategoryError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn menu_to_api(err: MenuError) -> ApiError {
    match err {
        MenuError::Invalid(inner) => ApiError::invalid_input("Invalid menu item", &inner),
        MenuError::NotFound => ApiError::not_found("Menu item not found"),
        MenuError::Category(inner) => category_to_api(inner),
        MenuError::Images(inner) => image_to_api(inner),
        MenuError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn news_to_api(err: NewsError) -> ApiError {
    match err {
        NewsError::Invalid(inner) => ApiError::invalid_input("Invalid news post", &inner),
        NewsError::NotFound => ApiError::not_found("News post not found"),
        NewsError::Images(inner) => image_to_api(inner),
        NewsError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken(_) | AuthError::WrongRole => {
            ApiError::unauthorized().with_cause(&err)
        }
        AuthError::Signing(_) => ApiError::internal(codes::INTERNAL, "Could not issue token", &err),
    }
}
