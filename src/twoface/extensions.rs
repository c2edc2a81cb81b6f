//! Extension traits that attach a user-facing description to errors and missing rows.
use crate::twoface::{ExternalError, TfError};

pub trait Describe {
    /// Keep `self` as the private half of a `TfError` and show `external` to the client.
    fn describe(self, external: ExternalError) -> TfError;
}

impl<Internal: Into<anyhow::Error>> Describe for Internal {
    fn describe(self, external: ExternalError) -> TfError {
        TfError {
            internal: self.into(),
            external,
        }
    }
}

/// Errors from diesel, r2d2, IO and friends become a generic `ServerError` with `?`. Call
/// `describe` instead when the client deserves a better explanation.
impl<Internal: Into<anyhow::Error>> From<Internal> for TfError {
    fn from(internal: Internal) -> TfError {
        internal.describe(ExternalError::default())
    }
}

pub trait DescribeErr<T> {
    /// `describe` the error of a `Result`, e.g. `fs::write(..).describe_err(WRITE_FAILED)?`.
    fn describe_err(self, external: ExternalError) -> Result<T, TfError>;
}

impl<T, E> DescribeErr<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn describe_err(self, external: ExternalError) -> Result<T, TfError> {
        self.map_err(|e| e.describe(external))
    }
}

pub trait OrNotFound<T> {
    /// Lookups return `None` for a missing row; handlers need a 404 instead.
    fn or_not_found(self, text: &'static str) -> Result<T, TfError>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, text: &'static str) -> Result<T, TfError> {
        self.ok_or_else(|| TfError::not_found(text))
    }
}
