//! Filter-expression builder for `get` commands.
//!
//! Filters travel inside the command string as parenthesized
//! `(field op value)` fragments with JSON-encoded values, combined with
//! `and`/`or`. The session engine treats the whole expression as opaque
//! text; only the server interprets it.

use std::fmt;

use serde::Serialize;

/// A filter expression fragment, e.g. `(id = 17)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter(String);

impl Filter {
    /// Wrap an already-formatted expression verbatim.
    #[must_use]
    pub fn raw(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// `(field = value)`
    #[must_use]
    pub fn eq(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, "=", &value)
    }

    /// `(field != value)`
    #[must_use]
    pub fn neq(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, "!=", &value)
    }

    /// `(field > value)`
    #[must_use]
    pub fn gt(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, ">", &value)
    }

    /// `(field >= value)`
    #[must_use]
    pub fn gte(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, ">=", &value)
    }

    /// `(field < value)`
    #[must_use]
    pub fn lt(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, "<", &value)
    }

    /// `(field <= value)`
    #[must_use]
    pub fn lte(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, "<=", &value)
    }

    /// `(field ~ value)` — fuzzy string match.
    #[must_use]
    pub fn like(field: &str, value: impl Serialize) -> Self {
        Self::binary(field, "~", &value)
    }

    /// Both expressions must hold.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self(format!("({} and {})", self.0, other.0))
    }

    /// Either expression may hold.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self(format!("({} or {})", self.0, other.0))
    }

    /// The rendered expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn binary(field: &str, op: &str, value: &impl Serialize) -> Self {
        let value = serde_json::to_string(value).unwrap_or_default();
        Self(format!("({field} {op} {value})"))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparison() {
        assert_eq!(Filter::eq("id", 17).as_str(), "(id = 17)");
        assert_eq!(Filter::gte("released", 2010).as_str(), "(released >= 2010)");
    }

    #[test]
    fn string_values_are_json_quoted() {
        assert_eq!(
            Filter::like("search", "fate").as_str(),
            "(search ~ \"fate\")"
        );
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        assert_eq!(
            Filter::eq("title", "say \"hello\"").as_str(),
            "(title = \"say \\\"hello\\\"\")"
        );
    }

    #[test]
    fn array_values() {
        assert_eq!(Filter::eq("id", [7, 17, 93]).as_str(), "(id = [7,17,93])");
    }

    #[test]
    fn and_or_nest_with_parentheses() {
        let expr = Filter::eq("id", 17)
            .and(Filter::like("search", "fate"))
            .or(Filter::eq("id", 7));
        assert_eq!(
            expr.as_str(),
            "(((id = 17) and (search ~ \"fate\")) or (id = 7))"
        );
    }

    #[test]
    fn raw_passes_through() {
        assert_eq!(Filter::raw("(id = 1)").as_str(), "(id = 1)");
    }
}
