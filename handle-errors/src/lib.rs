use argon2::Error as ArgonError;
use warp::{
    Rejection, Reply,
    filters::{body::BodyDeserializeError, cors::CorsForbidden},
    http::StatusCode,
    reject::{MissingHeader, Reject},
    reply::Response,
};

use tracing::{Level, event, instrument};

mod validation;

pub use validation::{FieldError, ValidationErrors};

#[derive(Debug)]
pub enum Error {
    ParseError(std::num::ParseIntError),
    MissingParameters,
    ValidationError(ValidationErrors),
    QuestionNotFound,
    TagNotFound,
    WrongPassword,
    CannotDecryptToken,
    CannotIssueToken,
    Unauthorized,
    ArgonLibraryError(ArgonError),
    DatabaseQueryError(sqlx::Error),
    MigrationError(sqlx::migrate::MigrateError),
    ConfigError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ParseError(err) => {
                write!(f, "Cannot parse parameter: {}", err)
            }
            Error::MissingParameters => {
                write!(f, "Missing parameters")
            }
            Error::ValidationError(errors) => {
                write!(f, "Invalid input: {}", errors)
            }
            Error::QuestionNotFound => {
                write!(f, "Question not found")
            }
            Error::TagNotFound => {
                write!(f, "Tag not found")
            }
            Error::WrongPassword => {
                write!(f, "Wrong password")
            }
            Error::CannotDecryptToken => {
                write!(f, "Cannot decrypt token")
            }
            Error::CannotIssueToken => {
                write!(f, "Cannot issue token")
            }
            Error::Unauthorized => {
                write!(f, "No permission to change the underlying resource")
            }
            Error::ArgonLibraryError(_) => {
                write!(f, "Cannot verify password")
            }
            Error::DatabaseQueryError(_) => {
                write!(f, "Cannot update, invalid data.")
            }
            Error::MigrationError(err) => {
                write!(f, "Cannot migrate data: {}", err)
            }
            Error::ConfigError(err) => {
                write!(f, "Invalid configuration: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Reject for Error {}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::ValidationError(errors)
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn database_error_code(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(err) => err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// True when the query failed because a UNIQUE constraint rejected the row.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    database_error_code(error).as_deref() == Some(UNIQUE_VIOLATION)
}

/// True when the query referenced a parent row that does not exist.
pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    database_error_code(error).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

fn text(message: impl Into<String>, status: StatusCode) -> Response {
    warp::reply::with_status(message.into(), status).into_response()
}

#[instrument]
pub async fn return_error(r: Rejection) -> Result<Response, Rejection> {
    if let Some(Error::DatabaseQueryError(e)) = r.find() {
        event!(Level::ERROR, "Database query error: {}", e);
        if is_unique_violation(e) {
            Ok(text("Resource already exists", StatusCode::CONFLICT))
        } else if is_foreign_key_violation(e) {
            Ok(text(
                "Referenced resource does not exist",
                StatusCode::UNPROCESSABLE_ENTITY,
            ))
        } else {
            Ok(text("Cannot update data", StatusCode::UNPROCESSABLE_ENTITY))
        }
    } else if let Some(Error::ValidationError(errors)) = r.find() {
        event!(Level::INFO, "Rejected invalid input: {}", errors);
        Ok(warp::reply::with_status(
            warp::reply::json(errors),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .into_response())
    } else if let Some(error @ (Error::QuestionNotFound | Error::TagNotFound)) = r.find() {
        event!(Level::WARN, "{}", error);
        Ok(text(error.to_string(), StatusCode::NOT_FOUND))
    } else if let Some(Error::Unauthorized) = r.find() {
        event!(Level::ERROR, "Not matching profile id");
        Ok(text(
            "No permission to change underlying resource",
            StatusCode::UNAUTHORIZED,
        ))
    } else if let Some(Error::WrongPassword) = r.find() {
        event!(Level::ERROR, "Entered wrong password");
        Ok(text(
            "Wrong username/password combination",
            StatusCode::UNAUTHORIZED,
        ))
    } else if let Some(Error::CannotDecryptToken) = r.find() {
        event!(Level::WARN, "Rejected invalid token");
        Ok(text("Invalid token", StatusCode::UNAUTHORIZED))
    } else if let Some(error) = r.find::<MissingHeader>() {
        event!(Level::WARN, "Missing header: {}", error.name());
        Ok(text("Authentication required", StatusCode::UNAUTHORIZED))
    } else if let Some(error @ (Error::ArgonLibraryError(_) | Error::CannotIssueToken)) = r.find()
    {
        event!(Level::ERROR, "{}", error);
        Ok(text(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(error) = r.find::<CorsForbidden>() {
        event!(Level::ERROR, "CORS forbidden error: {}", error);
        Ok(text(error.to_string(), StatusCode::FORBIDDEN))
    } else if let Some(error) = r.find::<BodyDeserializeError>() {
        event!(Level::ERROR, "Cannot deserialize request body: {}", error);
        Ok(text(error.to_string(), StatusCode::UNPROCESSABLE_ENTITY))
    } else if let Some(error) = r.find::<Error>() {
        event!(Level::ERROR, "{}", error);
        Ok(text(error.to_string(), StatusCode::UNPROCESSABLE_ENTITY))
    } else {
        event!(Level::WARN, "Requested route was not found");
        Ok(text("Route not found", StatusCode::NOT_FOUND))
    }
}
