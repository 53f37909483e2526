// crates/tracevault-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Trace Store
// Description: Store handle, configuration, and open/create/compatibility flow.
// Purpose: Own one engine connection and gate access by schema version.
// Dependencies: tracevault-core, rusqlite, serde
// ============================================================================

//! ## Overview
//! A [`Store`] owns exactly one `SQLite` connection; mutating operations
//! take `&mut self` and cross-process coordination is delegated entirely to
//! the engine's file locking. Opening is version-gated: `open` accepts only
//! the expected schema version, `open_any_version` accepts any recognized
//! historical version for migration tooling, and `create` initializes a
//! fresh store at the expected version. The version stamp is read from the
//! store file itself, never cached across calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use serde::Deserialize;
use tracevault_core::Compatibility;
use tracevault_core::RetentionPolicy;
use tracevault_core::StoreError;

use crate::migration::Migrator;
use crate::schema;
use crate::schema::EXPECTED_SCHEMA_VERSION;
use crate::stats::OpStats;
use crate::stats::OpStatsSnapshot;
use crate::transaction::TransactionScope;
use crate::transaction::run_transaction;
use crate::transaction::transaction_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl JournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Tuning configuration for a trace store.
///
/// # Invariants
/// - `busy_timeout_ms` is interpreted as milliseconds and bounds how long a
///   blocked operation waits on another writer before failing.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// Retention thresholds applied by [`Store::enforce_retention`].
    #[serde(default)]
    pub retention: RetentionPolicy,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: JournalMode::default(),
            sync_mode: SyncMode::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Path Validation
// ============================================================================

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::Path("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Path("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Path("store path contains an overlong component".to_string()));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(StoreError::Path("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Path("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent)
        .map_err(|err| StoreError::Path(format!("cannot create store directory: {err}")))
}

// ============================================================================
// SECTION: Connection Helpers
// ============================================================================

/// Opens an `SQLite` connection, optionally allowing file creation.
fn open_connection(
    path: &Path,
    config: &StoreConfig,
    create: bool,
) -> Result<Connection, StoreError> {
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    if create {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }
    let connection = Connection::open_with_flags(path, flags)
        .map_err(|err| StoreError::Path(format!("cannot open store file: {err}")))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Maps engine failures on unrecognized files to path errors.
///
/// Any other failure keeps its transaction classification.
fn unreadable_file_error(error: &rusqlite::Error) -> StoreError {
    match error {
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::NotADatabase => {
            StoreError::Path("file is not a trace store".to_string())
        }
        _ => transaction_error(error),
    }
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(connection: &Connection, config: &StoreConfig) -> Result<(), StoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| unreadable_file_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| unreadable_file_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| unreadable_file_error(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| transaction_error(&err))?;
    Ok(())
}

/// Reads the version stamp, mapping unreadable files to path errors.
///
/// `Ok(None)` means the file is a database without a version stamp.
fn read_stamp_checked(connection: &Connection) -> Result<Option<i64>, StoreError> {
    schema::read_stamp(connection).map_err(|err| unreadable_file_error(&err))
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed trace-event store.
///
/// # Invariants
/// - Owns exactly one connection; mutating operations take `&mut self`.
/// - The stamped schema version was validated when the handle was opened.
pub struct Store {
    /// Path of the store file.
    path: PathBuf,
    /// Tuning configuration applied to the connection.
    config: StoreConfig,
    /// Owned engine connection.
    connection: Connection,
    /// Operation counters for diagnostics.
    stats: OpStats,
}

impl Store {
    /// Creates a fresh store at the expected schema version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] when the file already exists or the
    /// location is unwritable, and [`StoreError::Transaction`] when schema
    /// initialization fails.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        Self::create_with(path, StoreConfig::default())
    }

    /// Creates a fresh store with explicit tuning configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] when the file already exists or the
    /// location is unwritable, and [`StoreError::Transaction`] when schema
    /// initialization fails.
    pub fn create_with(path: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        validate_store_path(path)?;
        if path.exists() {
            return Err(StoreError::Path(format!(
                "store file already exists: {}",
                path.display()
            )));
        }
        ensure_parent_dir(path)?;
        let mut connection = open_connection(path, &config, true)?;
        run_transaction(&mut connection, |scope| schema::create_current_schema(scope))?;
        Ok(Self {
            path: path.to_path_buf(),
            config,
            connection,
            stats: OpStats::default(),
        })
    }

    /// Opens an existing store stamped at the expected schema version.
    ///
    /// Never migrates; see [`crate::migration::Migrator`] for moving a store
    /// between versions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] when the file is missing or not a trace
    /// store, and [`StoreError::IncompatibleVersion`] when the stamp differs
    /// from the expected version.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with(path, StoreConfig::default())
    }

    /// Opens an existing store with explicit tuning configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] when the file is missing or not a trace
    /// store, and [`StoreError::IncompatibleVersion`] when the stamp differs
    /// from the expected version.
    pub fn open_with(path: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        let store = Self::open_any_version_with(path, config)?;
        let version = store.current_version()?;
        if version != EXPECTED_SCHEMA_VERSION {
            return Err(StoreError::IncompatibleVersion(format!(
                "store version {version} does not match expected version \
                 {EXPECTED_SCHEMA_VERSION}"
            )));
        }
        Ok(store)
    }

    /// Opens a store stamped at any recognized historical version.
    ///
    /// Used by migration tooling; normal readers and writers use
    /// [`Store::open`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] when the file is missing or not a trace
    /// store, and [`StoreError::IncompatibleVersion`] when the stamp lies
    /// outside the recognized version range.
    pub fn open_any_version(path: &Path) -> Result<Self, StoreError> {
        Self::open_any_version_with(path, StoreConfig::default())
    }

    /// Opens a store at any recognized version with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] when the file is missing or not a trace
    /// store, and [`StoreError::IncompatibleVersion`] when the stamp lies
    /// outside the recognized version range.
    pub fn open_any_version_with(path: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        validate_store_path(path)?;
        if !path.exists() {
            return Err(StoreError::Path(format!(
                "store file does not exist: {}",
                path.display()
            )));
        }
        let connection = open_connection(path, &config, false)?;
        let Some(stamp) = read_stamp_checked(&connection)? else {
            return Err(StoreError::Path("store file carries no schema version stamp".to_string()));
        };
        let version = schema::stamp_to_version(stamp)?;
        if !(schema::MIN_SCHEMA_VERSION ..= schema::MAX_KNOWN_SCHEMA_VERSION).contains(&version) {
            return Err(StoreError::IncompatibleVersion(format!(
                "store version {version} is outside the recognized range {} ..= {}",
                schema::MIN_SCHEMA_VERSION,
                schema::MAX_KNOWN_SCHEMA_VERSION
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            config,
            connection,
            stats: OpStats::default(),
        })
    }

    /// Opens the store at `path`, creating it first when absent.
    ///
    /// An existing empty database file is initialized in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] for unusable paths or unrecognized
    /// files, and [`StoreError::IncompatibleVersion`] when an existing store
    /// is stamped at a different version.
    pub fn open_or_create(path: &Path) -> Result<Self, StoreError> {
        Self::open_or_create_with(path, StoreConfig::default())
    }

    /// Opens or creates the store with explicit tuning configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] for unusable paths or unrecognized
    /// files, and [`StoreError::IncompatibleVersion`] when an existing store
    /// is stamped at a different version.
    pub fn open_or_create_with(path: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        validate_store_path(path)?;
        if !path.exists() {
            return Self::create_with(path, config);
        }
        let mut connection = open_connection(path, &config, false)?;
        match read_stamp_checked(&connection)? {
            Some(stamp) => {
                let version = schema::stamp_to_version(stamp)?;
                if version != EXPECTED_SCHEMA_VERSION {
                    return Err(StoreError::IncompatibleVersion(format!(
                        "store version {version} does not match expected version \
                         {EXPECTED_SCHEMA_VERSION}"
                    )));
                }
            }
            None => {
                let tables =
                    schema::table_count(&connection).map_err(|err| transaction_error(&err))?;
                if tables != 0 {
                    return Err(StoreError::Path(
                        "file is a database but not a trace store".to_string(),
                    ));
                }
                run_transaction(&mut connection, |scope| schema::create_current_schema(scope))?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            config,
            connection,
            stats: OpStats::default(),
        })
    }

    /// Probes whether `path` names a readable trace store file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Path`] describing why the file is not usable.
    pub fn check_store_path(path: &Path) -> Result<(), StoreError> {
        validate_store_path(path)?;
        if !path.exists() {
            return Err(StoreError::Path(format!(
                "store file does not exist: {}",
                path.display()
            )));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(path, flags)
            .map_err(|err| StoreError::Path(format!("cannot open store file: {err}")))?;
        let Some(stamp) = read_stamp_checked(&connection)? else {
            return Err(StoreError::Path("store file carries no schema version stamp".to_string()));
        };
        schema::stamp_to_version(stamp)?;
        Ok(())
    }

    /// Returns whether `path` names a readable trace store file.
    #[must_use]
    pub fn is_valid_path(path: &Path) -> bool {
        Self::check_store_path(path).is_ok()
    }

    /// Reads the stamped schema version from the store file.
    ///
    /// The stamp is re-read on every call; it is never cached across
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] when the stamp is missing or
    /// malformed, and [`StoreError::Transaction`] when the read fails.
    pub fn current_version(&self) -> Result<i32, StoreError> {
        let stamp = schema::read_stamp(&self.connection)
            .map_err(|err| transaction_error(&err))?
            .ok_or_else(|| StoreError::Corrupt("schema version stamp missing".to_string()))?;
        schema::stamp_to_version(stamp)
    }

    /// Classifies the store's stamped version against this build's.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the stamp cannot be read.
    pub fn check_compatibility(&self) -> Result<Compatibility, StoreError> {
        let version = self.current_version()?;
        Ok(Migrator::new().classify(version))
    }

    /// Runs `operation` inside one transaction scope.
    ///
    /// The transaction commits when `operation` returns `Ok` and rolls back
    /// on any error or early exit.
    ///
    /// # Errors
    ///
    /// Returns the error from `operation`, or [`StoreError::Transaction`]
    /// when beginning or committing the transaction fails.
    pub fn with_transaction<T, F>(&mut self, operation: F) -> Result<T, StoreError>
    where
        F: FnOnce(&TransactionScope<'_>) -> Result<T, StoreError>,
    {
        let result = run_transaction(&mut self.connection, operation);
        if let Err(error) = &result {
            self.stats.record_failure(error);
        }
        result
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the tuning configuration the store was opened with.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn op_stats(&self) -> OpStatsSnapshot {
        self.stats.snapshot()
    }

    /// Clears the operation counters.
    pub fn reset_op_stats(&mut self) {
        self.stats.reset();
    }

    /// Returns the owned connection for read-side helpers.
    pub(crate) const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the owned connection for transaction construction.
    pub(crate) const fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    /// Returns the mutable operation counters.
    pub(crate) const fn stats_mut(&mut self) -> &mut OpStats {
        &mut self.stats
    }
}
