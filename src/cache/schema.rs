//! Database schema definitions

/// Name of the customer table
pub const CUSTOMER_TABLE: &str = "kunde";

/// SQL to drop the customer table before a full import
pub const DROP_CUSTOMER_TABLE: &str = "DROP TABLE IF EXISTS kunde";

/// SQL to create the customer table. Column names match the cache view.
pub const CREATE_CUSTOMER_TABLE: &str = r#"
CREATE TABLE kunde (
    nr INTEGER PRIMARY KEY,
    name TEXT,
    ort TEXT
)
"#;

/// Bound parameters per customer row
pub const CUSTOMER_COLUMNS: usize = 3;

/// Rows per multi-row insert, so one statement stays under SQLite's
/// lowest bind-parameter limit (999)
pub const MAX_INSERT_ROWS: usize = 999 / CUSTOMER_COLUMNS;

/// SQL to insert `rows` customer rows in one statement
pub fn insert_customers(rows: usize) -> String {
    let values = vec!["(?, ?, ?)"; rows].join(", ");
    format!("INSERT INTO kunde (nr, name, ort) VALUES {}", values)
}

/// SQL to read every customer row
pub const SELECT_CUSTOMERS: &str = "SELECT * FROM kunde";

pub const COUNT_CUSTOMERS: &str = "SELECT COUNT(*) FROM kunde";

/// SQL to check whether the customer table exists
pub const CUSTOMER_TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";

