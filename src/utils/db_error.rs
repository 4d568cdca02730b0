//! Helpers for classifying sqlx errors.

/// Returns true if `e` is a unique-constraint violation on the short code key.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), None | Some("short_urls_pkey"))
}
