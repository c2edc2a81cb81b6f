use actix_web::http::StatusCode;
use std::fmt;

/// The half of an error the client gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalError {
    pub cause: Cause,
    /// Safe to show anyone. Never put row contents or SQL in here.
    pub text: &'static str,
}

/// What went wrong, in terms a client can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    ServerError,
    /// The request clashes with existing data, e.g. a taken group slug.
    UserConflict,
    UserInvalidField,
    NotFound,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant name, so bodies read "NotFound: Post not found".
        write!(f, "{:?}", self)
    }
}

/// Only the HTTP layer needs status codes; the datastore and feeds speak in `Cause`s.
impl From<Cause> for StatusCode {
    fn from(cause: Cause) -> StatusCode {
        match cause {
            Cause::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Cause::UserConflict => StatusCode::CONFLICT,
            Cause::UserInvalidField => StatusCode::BAD_REQUEST,
            Cause::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cause, self.text)
    }
}

impl Default for ExternalError {
    fn default() -> Self {
        Self {
            cause: Cause::ServerError,
            text: "Internal server error",
        }
    }
}
