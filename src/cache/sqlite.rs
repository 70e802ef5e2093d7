//! SQLite customer cache with chunked bulk import

use super::{copy_default_into_place, schema};
use crate::model::{Customer, CustomerColumns, Shared};
use crate::{Error, Result};
use rusqlite::{params_from_iter, Connection, Row, ToSql};
use std::ops::Range;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows per transaction unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// A step of the bulk import, reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkStep {
    PragmaQuery,
    PragmaSet,
    DropTable,
    CreateTable,
    BeginTransaction,
    BatchInsert,
    Commit,
}

impl BulkStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkStep::PragmaQuery => "pragma query",
            BulkStep::PragmaSet => "pragma set",
            BulkStep::DropTable => "drop table",
            BulkStep::CreateTable => "create table",
            BulkStep::BeginTransaction => "begin transaction",
            BulkStep::BatchInsert => "batch insert",
            BulkStep::Commit => "commit",
        }
    }
}

impl fmt::Display for BulkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub chunks: usize,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Customer Import:")?;
        writeln!(f, "  Rows: {}", self.rows)?;
        writeln!(f, "  Chunks: {}", self.chunks)
    }
}

/// Current durability settings of the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PragmaModes {
    pub journal_mode: String,
    pub synchronous: i64,
}

impl PragmaModes {
    pub fn synchronous_name(&self) -> &'static str {
        match self.synchronous {
            0 => "OFF",
            1 => "NORMAL",
            2 => "FULL",
            3 => "EXTRA",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for PragmaModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "journal_mode={} synchronous={}",
            self.journal_mode,
            self.synchronous_name()
        )
    }
}

fn step(step: BulkStep) -> impl FnOnce(rusqlite::Error) -> Error {
    move |source| Error::BulkImport { step, source }
}

fn read_pragmas(conn: &Connection) -> rusqlite::Result<PragmaModes> {
    let journal_mode = conn.pragma_query_value(None, "journal_mode", |row| row.get::<_, String>(0))?;
    let synchronous = conn.pragma_query_value(None, "synchronous", |row| row.get::<_, i64>(0))?;
    Ok(PragmaModes {
        journal_mode: journal_mode.to_lowercase(),
        synchronous,
    })
}

/// Fast, non-durable pragma settings for the lifetime of the guard.
/// Dropping it restores `journal_mode = DELETE` and `synchronous = FULL`.
struct FastImportMode<'a> {
    conn: &'a Connection,
}

impl<'a> FastImportMode<'a> {
    fn enter(conn: &'a Connection) -> Result<Self> {
        let before = read_pragmas(conn).map_err(step(BulkStep::PragmaQuery))?;
        debug!("Pragmas before import: {}", before);

        let guard = Self { conn };
        let mode = conn
            .pragma_update_and_check(None, "journal_mode", "MEMORY", |row| row.get::<_, String>(0))
            .map_err(step(BulkStep::PragmaSet))?;
        conn.pragma_update(None, "synchronous", 0)
            .map_err(step(BulkStep::PragmaSet))?;
        debug!("Import journal_mode={}", mode);
        Ok(guard)
    }
}

impl Drop for FastImportMode<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .conn
            .pragma_update_and_check(None, "journal_mode", "DELETE", |row| row.get::<_, String>(0))
        {
            warn!("Failed to restore journal_mode: {}", e);
        }
        if let Err(e) = self.conn.pragma_update(None, "synchronous", 2) {
            warn!("Failed to restore synchronous: {}", e);
        }
    }
}

/// Column positions of the customer table, looked up once per scan
struct CustomerColumnIndex {
    nr: usize,
    name: usize,
    ort: usize,
}

impl Customer {
    fn from_row(row: &Row<'_>, index: &CustomerColumnIndex) -> rusqlite::Result<Self> {
        Ok(Self {
            nr: row.get(index.nr)?,
            name: row.get::<_, Option<String>>(index.name)?.unwrap_or_default(),
            ort: row.get::<_, Option<String>>(index.ort)?.unwrap_or_default(),
        })
    }
}

/// Row-major parameters for a multi-row insert, read from the column vectors
fn column_params(columns: &CustomerColumns, rows: Range<usize>) -> Vec<&dyn ToSql> {
    let mut values: Vec<&dyn ToSql> = Vec::with_capacity(rows.len() * schema::CUSTOMER_COLUMNS);
    for i in rows {
        values.push(&columns.nr[i]);
        values.push(&columns.name[i]);
        values.push(&columns.ort[i]);
    }
    values
}

/// SQLite-backed customer cache
pub struct SqlCache {
    conn: Connection,
    chunk_size: usize,
}

impl SqlCache {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!("Opened SQLite cache {}", path.display());
        Ok(Self {
            conn,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Open a database file, seeding it from a bundled default if it does not exist
    pub fn open_with_default(path: &Path, default: &Path) -> Result<Self> {
        copy_default_into_place(path, default)?;
        Self::open(path)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Rows per transaction; zero is treated as one
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
    }

    pub fn pragma_modes(&self) -> Result<PragmaModes> {
        Ok(read_pragmas(&self.conn)?)
    }

    /// Replace the customer table with these customers.
    ///
    /// Each chunk is committed on its own. A failure stops the import;
    /// chunks committed before it stay in the table.
    pub fn import_customers(&self, customers: &[Shared<Customer>]) -> Result<ImportReport> {
        let _fast = FastImportMode::enter(&self.conn)?;

        self.conn
            .execute(schema::DROP_CUSTOMER_TABLE, [])
            .map_err(step(BulkStep::DropTable))?;
        self.conn
            .execute(schema::CREATE_CUSTOMER_TABLE, [])
            .map_err(step(BulkStep::CreateTable))?;

        let mut report = ImportReport { rows: 0, chunks: 0 };
        for chunk in customers.chunks(self.chunk_size) {
            let mut columns = CustomerColumns::with_capacity(chunk.len());
            for customer in chunk {
                customer.borrow().push_columns(&mut columns);
            }

            let tx = self
                .conn
                .unchecked_transaction()
                .map_err(step(BulkStep::BeginTransaction))?;
            let mut start = 0;
            while start < columns.len() {
                let end = (start + schema::MAX_INSERT_ROWS).min(columns.len());
                let mut stmt = tx
                    .prepare_cached(&schema::insert_customers(end - start))
                    .map_err(step(BulkStep::BatchInsert))?;
                stmt.execute(params_from_iter(column_params(&columns, start..end)))
                    .map_err(step(BulkStep::BatchInsert))?;
                start = end;
            }
            tx.commit().map_err(step(BulkStep::Commit))?;

            report.rows += columns.len();
            report.chunks += 1;
            debug!("Committed chunk {} ({} rows)", report.chunks, columns.len());
        }

        info!("Imported {} customers in {} chunks", report.rows, report.chunks);
        Ok(report)
    }

    /// Read every customer row in one forward pass.
    /// A database without the customer table yields no customers.
    pub fn load_customers(&self) -> Result<Vec<Customer>> {
        if !self.has_customer_table()? {
            info!("No {} table, starting with no customers", schema::CUSTOMER_TABLE);
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(schema::SELECT_CUSTOMERS)?;
        let index = CustomerColumnIndex {
            nr: stmt.column_index("nr")?,
            name: stmt.column_index("name")?,
            ort: stmt.column_index("ort")?,
        };

        let customers = stmt
            .query_map([], |row| Customer::from_row(row, &index))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Loaded {} customers from SQLite", customers.len());
        Ok(customers)
    }

    pub fn count_customers(&self) -> Result<usize> {
        if !self.has_customer_table()? {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row(schema::COUNT_CUSTOMERS, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn has_customer_table(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            schema::CUSTOMER_TABLE_EXISTS,
            [schema::CUSTOMER_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn customers(nrs: impl IntoIterator<Item = i64>) -> Vec<Shared<Customer>> {
        nrs.into_iter()
            .map(|nr| Rc::new(RefCell::new(Customer::new(nr, format!("Kunde {}", nr), "Wien"))))
            .collect()
    }

    #[test]
    fn test_chunked_import() {
        let mut cache = SqlCache::open_in_memory().unwrap();
        cache.set_chunk_size(10);

        let report = cache.import_customers(&customers(1..=25)).unwrap();
        assert_eq!(report, ImportReport { rows: 25, chunks: 3 });
        assert_eq!(cache.count_customers().unwrap(), 25);

        let loaded = cache.load_customers().unwrap();
        let nrs: Vec<i64> = loaded.iter().map(|c| c.nr).collect();
        assert_eq!(nrs, (1..=25).collect::<Vec<_>>());
        assert_eq!(loaded[4].name, "Kunde 5");
    }

    #[test]
    fn test_chunk_larger_than_one_statement() {
        let mut cache = SqlCache::open_in_memory().unwrap();
        cache.set_chunk_size(1_000);

        let report = cache.import_customers(&customers(1..=700)).unwrap();
        assert_eq!(report, ImportReport { rows: 700, chunks: 1 });
        let loaded = cache.load_customers().unwrap();
        assert_eq!(loaded.len(), 700);
        assert_eq!(loaded[699], Customer::new(700, "Kunde 700", "Wien"));
    }

    #[test]
    fn test_insert_sql_has_one_group_per_row() {
        let sql = schema::insert_customers(2);
        assert_eq!(sql, "INSERT INTO kunde (nr, name, ort) VALUES (?, ?, ?), (?, ?, ?)");
        assert!(schema::MAX_INSERT_ROWS * schema::CUSTOMER_COLUMNS <= 999);
    }

    #[test]
    fn test_import_replaces_table() {
        let cache = SqlCache::open_in_memory().unwrap();
        cache.import_customers(&customers(1..=5)).unwrap();
        let report = cache.import_customers(&customers(10..=11)).unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(cache.count_customers().unwrap(), 2);
    }

    #[test]
    fn test_empty_import() {
        let cache = SqlCache::open_in_memory().unwrap();
        let report = cache.import_customers(&[]).unwrap();
        assert_eq!(report, ImportReport { rows: 0, chunks: 0 });
        assert!(cache.load_customers().unwrap().is_empty());
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let mut cache = SqlCache::open_in_memory().unwrap();
        cache.set_chunk_size(0);
        assert_eq!(cache.chunk_size(), 1);
        let report = cache.import_customers(&customers(1..=3)).unwrap();
        assert_eq!(report.chunks, 3);
    }

    #[test]
    fn test_missing_table_loads_nothing() {
        let cache = SqlCache::open_in_memory().unwrap();
        assert!(cache.load_customers().unwrap().is_empty());
        assert_eq!(cache.count_customers().unwrap(), 0);
    }

    #[test]
    fn test_null_text_columns() {
        let cache = SqlCache::open_in_memory().unwrap();
        cache.conn.execute(schema::CREATE_CUSTOMER_TABLE, []).unwrap();
        cache
            .conn
            .execute("INSERT INTO kunde (nr) VALUES (4)", [])
            .unwrap();
        let loaded = cache.load_customers().unwrap();
        assert_eq!(loaded, vec![Customer::new(4, "", "")]);
    }

    #[test]
    fn test_failed_import_restores_pragmas() {
        let dir = TempDir::new().unwrap();
        let mut cache = SqlCache::open(&dir.path().join("sqlcache.db")).unwrap();
        cache.set_chunk_size(3);

        // duplicate key inside the second chunk
        let batch = customers([1, 2, 3, 4, 4, 5]);
        let err = cache.import_customers(&batch).unwrap_err();
        assert!(matches!(
            err,
            Error::BulkImport {
                step: BulkStep::BatchInsert,
                ..
            }
        ));

        assert_eq!(cache.count_customers().unwrap(), 3);
        let modes = cache.pragma_modes().unwrap();
        assert_eq!(modes.journal_mode, "delete");
        assert_eq!(modes.synchronous, 2);
    }

    #[test]
    fn test_open_with_default_copies_database() {
        let dir = TempDir::new().unwrap();
        let default = dir.path().join("assets").join("sqlcache.db");
        std::fs::create_dir_all(default.parent().unwrap()).unwrap();
        {
            let seed = SqlCache::open(&default).unwrap();
            seed.import_customers(&customers(1..=2)).unwrap();
        }

        let target = dir.path().join("data").join("sqlcache.db");
        let cache = SqlCache::open_with_default(&target, &default).unwrap();
        assert_eq!(cache.count_customers().unwrap(), 2);
    }
}
