use sea_orm::{DbErr, SqlErr};

/// Creation call-sites regenerate the tracking number and retry when the
/// unique index rejects a collision.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
