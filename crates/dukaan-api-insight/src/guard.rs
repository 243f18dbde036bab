//! Static guards applied to model-generated SQL.
//!
//! Two layers before anything touches the database: a case-insensitive
//! keyword deny-list, and an unconditional rewrite that scopes every
//! known table reference to one store. The deny-list is best-effort
//! screening, not a parser; the scope rewrite is the actual tenant
//! boundary and runs on every statement that passes validation.

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

/// Sentinel the model returns when the question is out of scope.
pub const CANNOT_ANSWER: &str = "CANNOT_ANSWER";

/// Hard cap on rows any generated query may return.
pub const ROW_CAP: usize = 100;

/// Tables the model may query. Anything else stays invisible to the
/// rewrite and therefore unreachable through this engine.
pub const KNOWN_TABLES: [&str; 7] = [
    "sales_vouchers",
    "sales_voucher_items",
    "purchase_vouchers",
    "purchase_voucher_items",
    "stock_items",
    "ledger_entries",
    "payment_entries",
];

/// Column list shown to the model. Counterparty-identifying columns and
/// `store_id` are deliberately absent.
pub const SCHEMA_PROMPT: &str = "\
Tables available (store data is pre-filtered - do NOT add WHERE store_id clauses):

sales_vouchers(id, voucher_number, voucher_date, total_amount, cgst_amount, sgst_amount, igst_amount)
sales_voucher_items(id, voucher_id, item_name, quantity, unit, rate, amount, gst_rate)
purchase_vouchers(id, voucher_number, voucher_date, total_amount, cgst_amount, sgst_amount, igst_amount)
purchase_voucher_items(id, voucher_id, item_name, quantity, unit, rate, amount)
stock_items(id, item_name, item_group, unit, closing_qty, closing_rate, closing_value, snapshot_date)
ledger_entries(id, ledger_group, closing_balance, snapshot_date)
payment_entries(id, voucher_number, voucher_date, payment_type, bank_or_cash, amount)
";

pub const SAFETY_RULES: &str = "\
Rules:
- Return ONLY a valid PostgreSQL SELECT statement, nothing else
- No semicolons, no multiple statements
- LIMIT results to 100 rows maximum
- No INSERT, UPDATE, DELETE, DROP, ALTER, TRUNCATE, CREATE, GRANT
- If the question cannot be answered with the available tables, return exactly: CANNOT_ANSWER
";

static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|DROP|ALTER|TRUNCATE|CREATE|GRANT|EXEC|EXECUTE)\b")
        .unwrap()
});

static TABLE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_TABLES
        .iter()
        .map(|table| (*table, Regex::new(&format!(r"(?i)\b{table}\b")).unwrap()))
        .collect()
});

/// Returns true when the statement contains none of the forbidden
/// keywords.
#[must_use]
pub fn validate_sql(sql: &str) -> bool {
    !FORBIDDEN.is_match(sql)
}

/// Replaces every whole-word occurrence of a known table with a
/// store-scoped subquery aliased back to the table name. The store id
/// is a typed [`Uuid`] rendered canonically, so the interpolation
/// cannot carry SQL.
#[must_use]
pub fn scope_to_store(sql: &str, store_id: Uuid) -> String {
    let mut result = sql.to_string();
    for (table, pattern) in TABLE_PATTERNS.iter() {
        let replacement =
            format!("(SELECT * FROM {table} WHERE store_id = '{store_id}') AS {table}");
        result = pattern.replace_all(&result, replacement.as_str()).into_owned();
    }
    result
}

/// Wraps the statement in a mechanical outer row cap, independent of
/// whatever LIMIT the model chose to emit.
#[must_use]
pub fn apply_row_cap(sql: &str) -> String {
    format!(
        "SELECT * FROM ({}) AS capped LIMIT {ROW_CAP}",
        sql.trim().trim_end_matches(';')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutating_keywords_are_rejected_case_insensitively() {
        for sql in [
            "DROP TABLE sales_vouchers",
            "drop table sales_vouchers",
            "SELECT 1; DELETE FROM stock_items",
            "update ledger_entries set closing_balance = 0",
            "SELECT * FROM sales_vouchers; TRUNCATE payment_entries",
        ] {
            assert!(!validate_sql(sql), "should reject: {sql}");
        }
    }

    #[test]
    fn plain_selects_pass_validation() {
        assert!(validate_sql(
            "SELECT SUM(total_amount) FROM sales_vouchers WHERE voucher_date >= '2025-03-01'"
        ));
        // Column names that merely contain a keyword as a substring are fine.
        assert!(validate_sql("SELECT created_at FROM sales_vouchers"));
    }

    #[test]
    fn scope_rewrites_every_known_table_reference() {
        let store_id = Uuid::new_v4();
        let sql = "SELECT v.total_amount FROM sales_vouchers v \
                   JOIN sales_voucher_items i ON i.voucher_id = v.id";
        let scoped = scope_to_store(sql, store_id);
        assert!(scoped.contains(&format!(
            "(SELECT * FROM sales_vouchers WHERE store_id = '{store_id}') AS sales_vouchers"
        )));
        assert!(scoped.contains(&format!(
            "(SELECT * FROM sales_voucher_items WHERE store_id = '{store_id}') AS sales_voucher_items"
        )));
        assert!(!scoped.contains(" FROM sales_vouchers v"));
    }

    #[test]
    fn scope_leaves_unknown_words_alone() {
        let store_id = Uuid::new_v4();
        let scoped = scope_to_store("SELECT * FROM pg_tables", store_id);
        assert_eq!(scoped, "SELECT * FROM pg_tables");
    }

    #[test]
    fn row_cap_wraps_and_strips_trailing_semicolon() {
        let capped = apply_row_cap("SELECT * FROM stock_items;");
        assert_eq!(
            capped,
            "SELECT * FROM (SELECT * FROM stock_items) AS capped LIMIT 100"
        );
    }
}
