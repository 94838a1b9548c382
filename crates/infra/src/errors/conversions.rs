//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use restorekit_domain::RestoreKitError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RestoreKitError);

impl From<InfraError> for RestoreKitError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RestoreKitError> for InfraError {
    fn from(value: RestoreKitError) -> Self {
        InfraError(value)
    }
}

trait IntoRestoreKitError {
    fn into_restorekit(self) -> RestoreKitError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RestoreKitError */
/* -------------------------------------------------------------------------- */

impl IntoRestoreKitError for HttpError {
    fn into_restorekit(self) -> RestoreKitError {
        if self.is_timeout() {
            return RestoreKitError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RestoreKitError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return RestoreKitError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return RestoreKitError::Internal(format!("malformed response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => RestoreKitError::Auth(message),
                404 => RestoreKitError::NotFound(message),
                429 => RestoreKitError::Network(message),
                400..=499 => RestoreKitError::InvalidInput(message),
                _ => RestoreKitError::Network(message),
            };
        }

        RestoreKitError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_restorekit())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → RestoreKitError */
/* -------------------------------------------------------------------------- */

impl IntoRestoreKitError for UrlError {
    fn into_restorekit(self) -> RestoreKitError {
        RestoreKitError::Config(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_restorekit())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
