//! Conversions from external infrastructure errors into domain errors.

use featuregate_domain::FeatureGateError;
use r2d2::Error as PoolError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FeatureGateError);

impl From<InfraError> for FeatureGateError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FeatureGateError> for InfraError {
    fn from(value: FeatureGateError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoFeatureGateError {
    fn into_feature_gate(self) -> FeatureGateError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → FeatureGateError */
/* -------------------------------------------------------------------------- */

// Extended result codes from sqlite3.h
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

impl IntoFeatureGateError for SqlError {
    fn into_feature_gate(self) -> FeatureGateError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        FeatureGateError::Storage("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        FeatureGateError::Storage("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, SQLITE_CONSTRAINT_UNIQUE) => {
                        FeatureGateError::Storage(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, SQLITE_CONSTRAINT_FOREIGNKEY) => {
                        FeatureGateError::Storage("foreign key constraint violation".into())
                    }
                    (ErrorCode::NotADatabase, _) => {
                        FeatureGateError::Storage("file is not a database".into())
                    }
                    _ => FeatureGateError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            // Missing features are reported by the repository, never by SQL.
            RE::QueryReturnedNoRows => {
                FeatureGateError::Storage("query unexpectedly returned no rows".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                FeatureGateError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                FeatureGateError::Storage(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => FeatureGateError::Storage("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidPath(path) => FeatureGateError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => FeatureGateError::Storage("invalid SQL query".into()),
            other => FeatureGateError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_feature_gate())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → FeatureGateError */
/* -------------------------------------------------------------------------- */

impl IntoFeatureGateError for PoolError {
    fn into_feature_gate(self) -> FeatureGateError {
        FeatureGateError::Storage(format!("connection pool: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_feature_gate())
    }
}

/* -------------------------------------------------------------------------- */
/* JoinError (spawn_blocking) → FeatureGateError */
/* -------------------------------------------------------------------------- */

/// Map a `JoinError` from `spawn_blocking` to a domain error.
pub fn map_join_error(err: JoinError) -> FeatureGateError {
    if err.is_cancelled() {
        FeatureGateError::Internal("blocking task cancelled".into())
    } else {
        FeatureGateError::Internal(format!("blocking task failed: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
