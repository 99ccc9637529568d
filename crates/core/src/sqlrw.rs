// crates/core/src/sqlrw.rs
//! Textual `ORDER BY` / `LIMIT OFFSET` rewriting for server-driven sort and
//! pagination.
//!
//! Known limitation, kept deliberately: the clause matching assumes a simple
//! single-statement query. It finds the *first* `ORDER BY` and the next
//! `LIMIT` after it, so a subquery that follows the top-level clause region
//! and carries its own `ORDER BY` can be mis-rewritten. The correct fix is a
//! minimal SQL tokenizer that skips parenthesized subqueries; until then,
//! server-mode pagination should only be enabled on flat queries.

use std::sync::LazyLock;

use regex_lite::Regex;

use houseview_types::SortDirection;

static RE_ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("valid order-by pattern"));
static RE_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\b").expect("valid limit pattern"));
static RE_TRAILING_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLIMIT\s+\d+(\s+OFFSET\s+\d+)?\s*$").expect("valid trailing-limit pattern")
});

/// Byte range of the first `ORDER BY` clause: from the keyword up to the
/// next `LIMIT` keyword or the end of the string.
fn order_by_region(sql: &str) -> Option<(usize, usize)> {
    let start = RE_ORDER_BY.find(sql)?.start();
    let after = &sql[start..];
    let end = RE_LIMIT
        .find(after)
        .map(|m| start + m.start())
        .unwrap_or(sql.len());
    Some((start, end))
}

fn splice(sql: &str, start: usize, end: usize, replacement: &str) -> String {
    let head = sql[..start].trim_end();
    let tail = sql[end..].trim_start();
    match (replacement.is_empty(), tail.is_empty()) {
        (true, true) => head.to_string(),
        (true, false) => format!("{head} {tail}"),
        (false, true) => format!("{head} {replacement}"),
        (false, false) => format!("{head} {replacement} {tail}"),
    }
}

/// Replace, insert, or strip the query's `ORDER BY` clause.
///
/// With both `column` and `direction` set, an existing clause is replaced in
/// place; otherwise the new clause lands immediately before a `LIMIT` clause
/// if one exists, else at the end. With either argument `None`, any existing
/// clause is stripped.
pub fn replace_order_by(
    sql: &str,
    column: Option<&str>,
    direction: Option<SortDirection>,
) -> String {
    let sql = sql.trim();
    let region = order_by_region(sql);

    let (Some(column), Some(direction)) = (column, direction) else {
        return match region {
            Some((start, end)) => splice(sql, start, end, ""),
            None => sql.to_string(),
        };
    };

    let clause = format!("ORDER BY {} {}", column, direction.as_sql());
    match region {
        Some((start, end)) => splice(sql, start, end, &clause),
        None => match RE_LIMIT.find(sql) {
            Some(m) => splice(sql, m.start(), m.start(), &clause),
            None => format!("{sql} {clause}"),
        },
    }
}

/// Replace a trailing `LIMIT n [OFFSET m]` clause, or append one.
pub fn apply_limit_offset(sql: &str, limit: u64, offset: u64) -> String {
    let sql = sql.trim();
    let clause = format!("LIMIT {limit} OFFSET {offset}");
    match RE_TRAILING_LIMIT.find(sql) {
        Some(m) => splice(sql, m.start(), m.end(), &clause),
        None => format!("{sql} {clause}"),
    }
}
