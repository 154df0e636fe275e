//! Conversions from external infrastructure errors into domain errors.

use fieldsync_domain::FieldSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FieldSyncError);

impl From<InfraError> for FieldSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FieldSyncError> for InfraError {
    fn from(value: FieldSyncError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoFieldSyncError {
    fn into_fieldsync(self) -> FieldSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → FieldSyncError */
/* -------------------------------------------------------------------------- */

impl IntoFieldSyncError for SqlError {
    fn into_fieldsync(self) -> FieldSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        FieldSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        FieldSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        FieldSyncError::InvalidInput("mutation id already queued".into())
                    }
                    (ErrorCode::DiskFull, _) => {
                        FieldSyncError::Database("storage quota exhausted".into())
                    }
                    _ => FieldSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => FieldSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                FieldSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                FieldSyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => FieldSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => FieldSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_fieldsync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → FieldSyncError */
/* -------------------------------------------------------------------------- */

impl IntoFieldSyncError for r2d2::Error {
    fn into_fieldsync(self) -> FieldSyncError {
        FieldSyncError::Database(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(value.into_fieldsync())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FieldSyncError */
/* -------------------------------------------------------------------------- */

impl IntoFieldSyncError for HttpError {
    fn into_fieldsync(self) -> FieldSyncError {
        if self.is_timeout() {
            return FieldSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return FieldSyncError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return FieldSyncError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => FieldSyncError::Auth(message),
                404 => FieldSyncError::NotFound(message),
                400..=499 => FieldSyncError::InvalidInput(message),
                _ => FieldSyncError::Network(message),
            };
        }

        FieldSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_fieldsync())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → FieldSyncError */
/* -------------------------------------------------------------------------- */

impl IntoFieldSyncError for std::io::Error {
    fn into_fieldsync(self) -> FieldSyncError {
        FieldSyncError::Database(format!("queue file I/O failed: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_fieldsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
