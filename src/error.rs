// FastMoney - Store & Auth Errors
// Every failure the record store or the admin gate can report.

use thiserror::Error;

/// Errors surfaced by the record store, the repository layer and the auth gate.
///
/// The listing engine itself never fails; these only come from loading or
/// writing records and from admin access checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("network error: {message}")]
    Network { message: String },

    /// The store rejected the operation (constraint violation, bad row, I/O).
    #[error("store error: {message}")]
    Store { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("authentication required")]
    AuthRequired,
}

impl StoreError {
    pub fn store(message: impl Into<String>) -> Self {
        StoreError::Store {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Store {
                    message: format!(
                        "constraint violation: {}",
                        msg.unwrap_or_else(|| code.to_string())
                    ),
                }
            }
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::CannotOpen =>
            {
                StoreError::Network {
                    message: code.to_string(),
                }
            }
            other => StoreError::Store {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("web result", "abc");
        assert_eq!(err.to_string(), "web result not found: abc");
    }

    #[test]
    fn test_constraint_violation_maps_to_store_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id TEXT PRIMARY KEY)", []).unwrap();
        conn.execute("INSERT INTO t (id) VALUES ('a')", []).unwrap();

        let err: StoreError = conn
            .execute("INSERT INTO t (id) VALUES ('a')", [])
            .unwrap_err()
            .into();

        match err {
            StoreError::Store { message } => assert!(message.contains("constraint")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
