//! SQL display cleanup.
//!
//! Collapses the projection of a SELECT so that statements differing only in
//! their column lists render (and group) identically. This is a display aid,
//! not a SQL parser.

use crate::utils::config::SQL_PLACEHOLDER;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

// First "SELECT " up to the nearest following " FROM ", across newlines
static SELECT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)SELECT .*? FROM ").expect("select-list pattern is valid"));

/// Replace the selected-column list of a SELECT statement with a placeholder
///
/// Statements that are not shaped like `SELECT … FROM …` come back unchanged.
/// Applying it twice gives the same result as applying it once.
pub fn sanitize(sql: &str) -> String {
    let replacement = format!("SELECT {} FROM ", SQL_PLACEHOLDER);
    SELECT_LIST
        .replacen(sql, 1, NoExpand(&replacement))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_select() {
        assert_eq!(
            sanitize("SELECT a, b FROM t WHERE x=1"),
            "SELECT .. FROM t WHERE x=1"
        );
    }

    #[test]
    fn test_sanitize_non_select_unchanged() {
        assert_eq!(sanitize("UPDATE t SET x=1"), "UPDATE t SET x=1");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_is_lazy_and_first_only() {
        let sql = "SELECT a FROM t WHERE id IN (SELECT b FROM u)";
        assert_eq!(
            sanitize(sql),
            "SELECT .. FROM t WHERE id IN (SELECT b FROM u)"
        );
    }

    #[test]
    fn test_sanitize_multiline_projection() {
        let sql = "SELECT \"book\".\"id\",\n \"book\".\"title\" FROM \"book\"";
        assert_eq!(sanitize(sql), "SELECT .. FROM \"book\"");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for sql in [
            "SELECT a, b FROM t WHERE x=1",
            "UPDATE t SET x=1",
            "SELECT a FROM t JOIN (SELECT b FROM u) v",
            "select lower FROM t",
        ] {
            let once = sanitize(sql);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_sanitize_case_sensitive() {
        assert_eq!(sanitize("select a from t"), "select a from t");
    }
}
