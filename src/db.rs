// 🗄️ Entry store - SQLite persistence for ledger entries
//
// Free functions operate on a bare `Connection`; `Ledger` wraps one
// connection behind a mutex and is the handle the rest of the crate uses.

use chrono::{DateTime, Datelike, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::entry::{Entry, Kind, NewEntry};
use crate::error::{LedgerError, Result};
use crate::month::{from_storage, to_storage};
use crate::validation::validate_new_entry;

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery; FULL sync so a commit is on disk
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "FULL")?;

    // ==========================================================================
    // Entries Table
    // AUTOINCREMENT keeps ids from ever being reused after a delete
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK(kind IN ('expense', 'income')),
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries(created_at)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const ENTRY_COLUMNS: &str = "id, kind, amount, category, note, created_at";

/// Raw column values as SQLite hands them back.
struct EntryRow {
    id: i64,
    kind: String,
    amount: String,
    category: String,
    note: Option<String>,
    created_at: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(EntryRow {
            id: row.get(0)?,
            kind: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
            note: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl TryFrom<EntryRow> for Entry {
    type Error = LedgerError;

    fn try_from(row: EntryRow) -> Result<Entry> {
        let corrupt = |reason: String| LedgerError::CorruptRecord { id: row.id, reason };

        let kind = Kind::from_str(&row.kind).map_err(|_| corrupt(format!("kind `{}`", row.kind)))?;
        let amount = Decimal::from_str(&row.amount)
            .map_err(|_| corrupt(format!("amount `{}`", row.amount)))?;
        let created_at = from_storage(&row.created_at)
            .ok_or_else(|| corrupt(format!("created_at `{}`", row.created_at)))?;

        Ok(Entry {
            id: row.id,
            kind,
            amount,
            category: row.category,
            note: row.note,
            created_at,
        })
    }
}

fn collect_entries(stmt: &mut rusqlite::Statement<'_>, params: impl rusqlite::Params) -> Result<Vec<Entry>> {
    let rows = stmt
        .query_map(params, EntryRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(Entry::try_from).collect()
}

// ============================================================================
// QUERIES
// ============================================================================

/// Insert an already validated entry, stamping it with `created_at`.
pub fn insert_entry(conn: &Connection, new: &NewEntry, created_at: DateTime<Utc>) -> Result<Entry> {
    conn.execute(
        "INSERT INTO entries (kind, amount, category, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.kind.as_str(),
            new.amount.to_string(),
            new.category,
            new.note,
            to_storage(created_at),
        ],
    )?;

    Ok(Entry {
        id: conn.last_insert_rowid(),
        kind: new.kind,
        amount: new.amount,
        category: new.category.clone(),
        note: new.note.clone(),
        created_at,
    })
}

/// All entries, newest id first.
pub fn get_all_entries(conn: &Connection) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY id DESC"
    ))?;

    collect_entries(&mut stmt, [])
}

/// Entries with `start <= created_at < end`, newest id first.
pub fn get_entries_between(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries
         WHERE created_at >= ?1 AND (?2 IS NULL OR created_at < ?2)
         ORDER BY id DESC"
    ))?;

    collect_entries(&mut stmt, params![to_storage(start), upper_bound(end)])
}

/// Exclusive upper bound as bound text, or `None` for "no bound".
///
/// Years past 9999 render as `+10000-...`, which sorts before every stored
/// four-digit year, so such an end bounds nothing.
fn upper_bound(end: DateTime<Utc>) -> Option<String> {
    (end.year() <= 9999).then(|| to_storage(end))
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<Entry>> {
    let row = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
            params![id],
            EntryRow::from_row,
        )
        .optional()?;

    row.map(Entry::try_from).transpose()
}

/// Returns true when a row was removed.
pub fn delete_entry(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM entries WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// LEDGER HANDLE
// ============================================================================

/// The entry store: one connection, one exclusive section per operation.
///
/// Every call takes the connection lock exactly once, and `add`/`delete`
/// commit a SQLite transaction before releasing it, so readers never see a
/// half-applied mutation.
pub struct Ledger {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Open (creating if needed) a ledger database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened ledger database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Ledger {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used to stamp `created_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock drops any open transaction, which
        // rolls it back, so the connection is still consistent.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Validate and persist a new entry.
    pub fn add(&self, kind: Kind, amount: Decimal, category: &str, note: Option<&str>) -> Result<Entry> {
        let mut new = NewEntry::new(kind, amount, category);
        new.note = note.map(str::to_string);
        self.add_entry(new)
    }

    pub fn add_entry(&self, new: NewEntry) -> Result<Entry> {
        if let Err(e) = validate_new_entry(&new) {
            warn!(kind = %new.kind, amount = %new.amount, error = %e, "rejected entry");
            return Err(e.into());
        }

        // Storage keeps microseconds; truncate so the returned entry matches
        let created_at = self.clock.now().trunc_subsecs(6);

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let entry = insert_entry(&tx, &new, created_at)?;
        tx.commit()?;

        info!(
            id = entry.id,
            kind = %entry.kind,
            amount = %entry.amount,
            category = %entry.category,
            "added entry"
        );
        Ok(entry)
    }

    pub fn list(&self) -> Result<Vec<Entry>> {
        let conn = self.lock();
        let entries = get_all_entries(&conn)?;
        debug!(count = entries.len(), "listed entries");
        Ok(entries)
    }

    pub fn list_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Entry>> {
        let conn = self.lock();
        get_entries_between(&conn, start, end)
    }

    pub fn get(&self, id: i64) -> Result<Option<Entry>> {
        let conn = self.lock();
        get_entry(&conn, id)
    }

    /// Remove an entry. A missing id is a normal outcome and yields `false`.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let removed = delete_entry(&tx, id)?;
        tx.commit()?;

        if removed {
            info!(id, "deleted entry");
        } else {
            debug!(id, "delete of unknown id");
        }
        Ok(removed)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock();
        verify_count(&conn)
    }
}
