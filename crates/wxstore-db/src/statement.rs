//! Statement kinds declared by callers and checked against the SQL text

use std::fmt;

use crate::{DbError, DbResult};

/// What a caller intends a statement to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl StatementKind {
    /// Classify a statement by its leading keyword.
    ///
    /// Leading whitespace and SQL comments are skipped. Words later in the
    /// statement (identifiers, literals) are never inspected.
    pub fn classify(sql: &str) -> Option<Self> {
        let keyword = leading_keyword(sql)?;
        match keyword.to_ascii_uppercase().as_str() {
            "INSERT" | "REPLACE" => Some(StatementKind::Insert),
            "UPDATE" => Some(StatementKind::Update),
            "DELETE" => Some(StatementKind::Delete),
            "SELECT" | "VALUES" | "WITH" => Some(StatementKind::Select),
            _ => None,
        }
    }

    /// Reject `sql` unless it classifies as `self`
    pub fn check(self, sql: &str) -> DbResult<()> {
        match Self::classify(sql) {
            Some(kind) if kind == self => Ok(()),
            Some(kind) => Err(DbError::Validation(format!(
                "expected {self} statement, got {kind}"
            ))),
            None => Err(DbError::Validation(format!(
                "expected {self} statement, got unrecognized statement"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Select => "select",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn leading_keyword(sql: &str) -> Option<&str> {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_leading_keyword() {
        assert_eq!(
            StatementKind::classify("insert into t values (?1)"),
            Some(StatementKind::Insert)
        );
        assert_eq!(
            StatementKind::classify("  UPDATE t SET a = 1"),
            Some(StatementKind::Update)
        );
        assert_eq!(
            StatementKind::classify("-- purge\nDelete FROM t"),
            Some(StatementKind::Delete)
        );
        assert_eq!(
            StatementKind::classify("/* latest */ select * from t"),
            Some(StatementKind::Select)
        );
        assert_eq!(StatementKind::classify("CREATE TABLE t (a)"), None);
        assert_eq!(StatementKind::classify(""), None);
        assert_eq!(StatementKind::classify("-- only a comment"), None);
    }

    #[test]
    fn test_keywords_inside_identifiers_ignored() {
        // Column names that contain other keywords do not change the kind
        assert_eq!(
            StatementKind::classify("SELECT inserted_at, deleted FROM t"),
            Some(StatementKind::Select)
        );
        assert_eq!(
            StatementKind::classify("UPDATE t SET note = 'delete me'"),
            Some(StatementKind::Update)
        );
    }

    #[test]
    fn test_check_mismatch() {
        assert!(StatementKind::Delete.check("DELETE FROM t").is_ok());
        let err = StatementKind::Delete
            .check("SELECT * FROM t WHERE note = 'DELETE'")
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(msg) if msg.contains("got select")));
    }
}
