// crates/tracevault-store-sqlite/src/events.rs
// ============================================================================
// Module: Event Writer and Reader
// Description: Typed append and retrieval of trace entries and dependents.
// Purpose: Implement the ingestion and read contracts on the store handle.
// Dependencies: tracevault-core, rusqlite
// ============================================================================

//! ## Overview
//! Appending an entry interns its process, thread, path, function, group,
//! and trace-point rows, then writes the entry row and all dependents in one
//! transaction; a failure anywhere leaves nothing behind. Reads reconstruct
//! typed values from stored integer codes and fail with a corruption error
//! when a stored code is unrecognized. Multi-statement reads run inside a
//! read transaction so they observe one consistent snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Params;
use rusqlite::Row;
use rusqlite::params;
use tracevault_core::EntryId;
use tracevault_core::EntryKind;
use tracevault_core::EventSink;
use tracevault_core::ProcessId;
use tracevault_core::ProcessShutdownEvent;
use tracevault_core::StackFrame;
use tracevault_core::StoreError;
use tracevault_core::ThreadId;
use tracevault_core::Timestamp;
use tracevault_core::TraceEntry;
use tracevault_core::TraceKey;
use tracevault_core::TraceReader;
use tracevault_core::TracedApplicationInfo;
use tracevault_core::Variable;
use tracevault_core::VariableKind;

use crate::store::Store;
use crate::transaction::TransactionScope;
use crate::transaction::transaction_error;

// ============================================================================
// SECTION: Column Codecs
// ============================================================================

/// Stores an unsigned counter in an INTEGER column, preserving the bit
/// pattern so every value round-trips.
const fn encode_u64(value: u64) -> i64 {
    i64::from_le_bytes(value.to_le_bytes())
}

/// Restores an unsigned counter from its stored bit pattern.
const fn decode_u64(value: i64) -> u64 {
    u64::from_le_bytes(value.to_le_bytes())
}

/// Reads a stored unsigned 32-bit column value.
fn decode_u32(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("stored {column} out of range: {value}")))
}

/// Resolves a stored trace-point type code.
fn decode_entry_kind(value: i64) -> Result<EntryKind, StoreError> {
    let code = decode_u32(value, "trace point type")?;
    EntryKind::from_code(code)
        .ok_or_else(|| StoreError::Corrupt(format!("unrecognized trace point type code: {code}")))
}

/// Resolves a stored variable type code.
fn decode_variable_kind(value: i64) -> Result<VariableKind, StoreError> {
    let code = decode_u32(value, "variable type")?;
    VariableKind::from_code(code)
        .ok_or_else(|| StoreError::Corrupt(format!("unrecognized variable type code: {code}")))
}

// ============================================================================
// SECTION: Interning
// ============================================================================

/// Looks up a row in a name-interning table, inserting it when absent.
fn intern_named_row(
    scope: &TransactionScope<'_>,
    select_sql: &'static str,
    insert_sql: &'static str,
    name: &str,
) -> Result<i64, StoreError> {
    if let Some(id) = scope.query_row_optional(select_sql, params![name], |row| row.get(0))? {
        return Ok(id);
    }
    scope.insert(insert_sql, params![name])
}

/// Interns a source path name.
fn intern_path(scope: &TransactionScope<'_>, name: &str) -> Result<i64, StoreError> {
    intern_named_row(
        scope,
        "SELECT id FROM path_name WHERE name = ?1",
        "INSERT INTO path_name (name) VALUES (?1)",
        name,
    )
}

/// Interns a function name.
fn intern_function(scope: &TransactionScope<'_>, name: &str) -> Result<i64, StoreError> {
    intern_named_row(
        scope,
        "SELECT id FROM function_name WHERE name = ?1",
        "INSERT INTO function_name (name) VALUES (?1)",
        name,
    )
}

/// Interns a trace-point group name.
fn intern_group(scope: &TransactionScope<'_>, name: &str) -> Result<i64, StoreError> {
    intern_named_row(
        scope,
        "SELECT id FROM trace_point_group WHERE name = ?1",
        "INSERT INTO trace_point_group (name) VALUES (?1)",
        name,
    )
}

/// Interns a trace-key name.
fn intern_trace_key(scope: &TransactionScope<'_>, name: &str) -> Result<i64, StoreError> {
    intern_named_row(
        scope,
        "SELECT id FROM trace_key WHERE name = ?1",
        "INSERT INTO trace_key (name) VALUES (?1)",
        name,
    )
}

/// Looks up a process instance row, inserting it when absent.
///
/// The stored name is written on first sight of the instance and not
/// rewritten afterwards.
fn intern_process(
    scope: &TransactionScope<'_>,
    pid: ProcessId,
    start_time: Timestamp,
    name: &str,
) -> Result<i64, StoreError> {
    let existing = scope.query_row_optional(
        "SELECT id FROM process WHERE pid = ?1 AND start_time = ?2",
        params![i64::from(pid.get()), start_time.unix_millis()],
        |row| row.get(0),
    )?;
    if let Some(id) = existing {
        return Ok(id);
    }
    scope.insert(
        "INSERT INTO process (name, pid, start_time, end_time) VALUES (?1, ?2, ?3, NULL)",
        params![name, i64::from(pid.get()), start_time.unix_millis()],
    )
}

/// Looks up a thread row within a process instance, inserting it when absent.
fn intern_thread(
    scope: &TransactionScope<'_>,
    process_id: i64,
    tid: ThreadId,
) -> Result<i64, StoreError> {
    let existing = scope.query_row_optional(
        "SELECT id FROM traced_thread WHERE process_id = ?1 AND tid = ?2",
        params![process_id, i64::from(tid.get())],
        |row| row.get(0),
    )?;
    if let Some(id) = existing {
        return Ok(id);
    }
    scope.insert(
        "INSERT INTO traced_thread (process_id, tid) VALUES (?1, ?2)",
        params![process_id, i64::from(tid.get())],
    )
}

/// Looks up a trace-point row by its full identity, inserting it when
/// absent.
///
/// `IS` comparison keeps the group lookup NULL-safe for ungrouped points.
fn intern_trace_point(
    scope: &TransactionScope<'_>,
    kind: EntryKind,
    path_id: i64,
    line: u32,
    function_id: i64,
    group_id: Option<i64>,
) -> Result<i64, StoreError> {
    let existing = scope.query_row_optional(
        "SELECT id FROM trace_point WHERE type = ?1 AND path_id = ?2 AND line = ?3 AND \
         function_id = ?4 AND group_id IS ?5",
        params![i64::from(kind.code()), path_id, i64::from(line), function_id, group_id],
        |row| row.get(0),
    )?;
    if let Some(id) = existing {
        return Ok(id);
    }
    scope.insert(
        "INSERT INTO trace_point (type, path_id, line, function_id, group_id) VALUES (?1, ?2, \
         ?3, ?4, ?5)",
        params![i64::from(kind.code()), path_id, i64::from(line), function_id, group_id],
    )
}

// ============================================================================
// SECTION: Write Path
// ============================================================================

/// Appends one entry row with all of its dependents.
fn insert_entry(scope: &TransactionScope<'_>, entry: &TraceEntry) -> Result<EntryId, StoreError> {
    let process_id = intern_process(scope, entry.pid, entry.process_start_time, &entry.process_name)?;
    let thread_id = intern_thread(scope, process_id, entry.tid)?;
    let path_id = intern_path(scope, &entry.path)?;
    let function_id = intern_function(scope, &entry.function)?;
    let group_id = match entry.group_name.as_deref() {
        Some(name) => Some(intern_group(scope, name)?),
        None => None,
    };
    let trace_point_id =
        intern_trace_point(scope, entry.kind, path_id, entry.line, function_id, group_id)?;
    let entry_id = scope.insert(
        "INSERT INTO trace_entry (traced_thread_id, timestamp, trace_point_id, message, \
         stack_position) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            thread_id,
            entry.timestamp.unix_millis(),
            trace_point_id,
            entry.message,
            encode_u64(entry.stack_position)
        ],
    )?;
    for (position, variable) in (0_i64 ..).zip(&entry.variables) {
        scope.execute(
            "INSERT INTO variable (trace_entry_id, position, name, type, value) VALUES (?1, ?2, \
             ?3, ?4, ?5)",
            params![
                entry_id,
                position,
                variable.name,
                i64::from(variable.kind.code()),
                variable.value
            ],
        )?;
    }
    for (depth, frame) in (0_i64 ..).zip(&entry.backtrace) {
        scope.execute(
            "INSERT INTO stackframe (trace_entry_id, depth, module_name, function_name, \
             function_offset, source_file, line) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry_id,
                depth,
                frame.module,
                frame.function,
                encode_u64(frame.function_offset),
                frame.source_file,
                i64::from(frame.line)
            ],
        )?;
    }
    for (position, key) in (0_i64 ..).zip(&entry.trace_keys) {
        let key_id = intern_trace_key(scope, &key.name)?;
        scope.execute(
            "INSERT INTO entry_trace_key (trace_entry_id, trace_key_id, position, enabled) \
             VALUES (?1, ?2, ?3, ?4)",
            params![entry_id, key_id, position, key.enabled],
        )?;
    }
    Ok(EntryId::new(entry_id))
}

/// Stamps the stop time of a process instance, inserting the instance row
/// when the store never saw an entry from it.
fn record_shutdown(
    scope: &TransactionScope<'_>,
    event: &ProcessShutdownEvent,
) -> Result<(), StoreError> {
    let updated = scope.execute(
        "UPDATE process SET end_time = ?1 WHERE pid = ?2 AND start_time = ?3",
        params![
            event.stop_time.unix_millis(),
            i64::from(event.pid.get()),
            event.start_time.unix_millis()
        ],
    )?;
    if updated == 0 {
        scope.execute(
            "INSERT INTO process (name, pid, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.name,
                i64::from(event.pid.get()),
                event.start_time.unix_millis(),
                event.stop_time.unix_millis()
            ],
        )?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Read Path
// ============================================================================

/// Prepares `sql` and collects every mapped row.
fn collect_rows<T, P, F>(
    connection: &Connection,
    sql: &str,
    params: P,
    map: F,
) -> Result<Vec<T>, StoreError>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut statement = connection.prepare(sql).map_err(|err| transaction_error(&err))?;
    let rows = statement.query_map(params, map).map_err(|err| transaction_error(&err))?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row.map_err(|err| transaction_error(&err))?);
    }
    Ok(items)
}

/// Reads the backtrace of an entry, innermost frame first.
fn frames_for_entry(connection: &Connection, id: EntryId) -> Result<Vec<StackFrame>, StoreError> {
    let raw = collect_rows(
        connection,
        "SELECT module_name, function_name, function_offset, source_file, line FROM stackframe \
         WHERE trace_entry_id = ?1 ORDER BY depth",
        params![id.get()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        },
    )?;
    let mut frames = Vec::with_capacity(raw.len());
    for (module, function, function_offset, source_file, line) in raw {
        frames.push(StackFrame {
            module,
            function,
            function_offset: decode_u64(function_offset),
            source_file,
            line: decode_u32(line, "stack frame line")?,
        });
    }
    Ok(frames)
}

/// Reads the captured variables of an entry, in capture order.
fn read_variables(connection: &Connection, id: EntryId) -> Result<Vec<Variable>, StoreError> {
    let raw = collect_rows(
        connection,
        "SELECT name, type, value FROM variable WHERE trace_entry_id = ?1 ORDER BY position",
        params![id.get()],
        |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
        },
    )?;
    let mut variables = Vec::with_capacity(raw.len());
    for (name, kind, value) in raw {
        variables.push(Variable {
            name,
            kind: decode_variable_kind(kind)?,
            value,
        });
    }
    Ok(variables)
}

/// Reads the trace keys recorded for an entry, in capture order.
fn read_trace_keys(connection: &Connection, id: EntryId) -> Result<Vec<TraceKey>, StoreError> {
    collect_rows(
        connection,
        "SELECT k.name, ek.enabled FROM entry_trace_key ek JOIN trace_key k ON k.id = \
         ek.trace_key_id WHERE ek.trace_entry_id = ?1 ORDER BY ek.position",
        params![id.get()],
        |row| {
            Ok(TraceKey {
                name: row.get(0)?,
                enabled: row.get(1)?,
            })
        },
    )
}

/// Raw entry row joined across the interning tables.
struct RawEntry {
    /// Stored process identifier.
    pid: i64,
    /// Stored process instance start time.
    start_time: i64,
    /// Stored process name.
    process_name: String,
    /// Stored thread identifier.
    tid: i64,
    /// Stored capture time.
    timestamp: i64,
    /// Stored trace-point type code.
    kind: i64,
    /// Stored source path.
    path: String,
    /// Stored source line.
    line: i64,
    /// Stored group name, when the trace point is grouped.
    group_name: Option<String>,
    /// Stored function name.
    function: String,
    /// Stored message text.
    message: String,
    /// Stored call depth.
    stack_position: i64,
}

/// Reconstructs one full entry with all dependents from one snapshot.
fn read_entry(connection: &Connection, id: EntryId) -> Result<Option<TraceEntry>, StoreError> {
    let tx = connection.unchecked_transaction().map_err(|err| transaction_error(&err))?;
    let raw = tx
        .query_row(
            "SELECT p.pid, p.start_time, p.name, t.tid, e.timestamp, tp.type, pn.name, tp.line, \
             g.name, f.name, e.message, e.stack_position FROM trace_entry e JOIN traced_thread t \
             ON t.id = e.traced_thread_id JOIN process p ON p.id = t.process_id JOIN trace_point \
             tp ON tp.id = e.trace_point_id JOIN path_name pn ON pn.id = tp.path_id JOIN \
             function_name f ON f.id = tp.function_id LEFT JOIN trace_point_group g ON g.id = \
             tp.group_id WHERE e.id = ?1",
            params![id.get()],
            |row| {
                Ok(RawEntry {
                    pid: row.get(0)?,
                    start_time: row.get(1)?,
                    process_name: row.get(2)?,
                    tid: row.get(3)?,
                    timestamp: row.get(4)?,
                    kind: row.get(5)?,
                    path: row.get(6)?,
                    line: row.get(7)?,
                    group_name: row.get(8)?,
                    function: row.get(9)?,
                    message: row.get(10)?,
                    stack_position: row.get(11)?,
                })
            },
        )
        .optional()
        .map_err(|err| transaction_error(&err))?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let variables = read_variables(&tx, id)?;
    let backtrace = frames_for_entry(&tx, id)?;
    let trace_keys = read_trace_keys(&tx, id)?;
    Ok(Some(TraceEntry {
        pid: ProcessId::new(decode_u32(raw.pid, "process identifier")?),
        process_start_time: Timestamp::from_unix_millis(raw.start_time),
        process_name: raw.process_name,
        tid: ThreadId::new(decode_u32(raw.tid, "thread identifier")?),
        timestamp: Timestamp::from_unix_millis(raw.timestamp),
        kind: decode_entry_kind(raw.kind)?,
        path: raw.path,
        line: decode_u32(raw.line, "trace point line")?,
        group_name: raw.group_name,
        function: raw.function,
        message: raw.message,
        variables,
        backtrace,
        stack_position: decode_u64(raw.stack_position),
        trace_keys,
    }))
}

// ============================================================================
// SECTION: Store Contract Implementations
// ============================================================================

impl EventSink for Store {
    fn write_entry(&mut self, entry: &TraceEntry) -> Result<EntryId, StoreError> {
        let id = self.with_transaction(|scope| insert_entry(scope, entry))?;
        self.stats_mut().record_entry_written();
        Ok(id)
    }

    fn write_shutdown(&mut self, event: &ProcessShutdownEvent) -> Result<(), StoreError> {
        self.with_transaction(|scope| record_shutdown(scope, event))?;
        self.stats_mut().record_shutdown_written();
        Ok(())
    }
}

impl TraceReader for Store {
    fn backtrace_for_entry(&self, id: EntryId) -> Result<Vec<StackFrame>, StoreError> {
        frames_for_entry(self.connection(), id)
    }

    fn seen_group_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        let names = collect_rows(
            self.connection(),
            "SELECT name FROM trace_point_group ORDER BY name",
            params![],
            |row| row.get::<_, String>(0),
        )?;
        Ok(names.into_iter().collect())
    }

    fn traced_applications(&self) -> Result<Vec<TracedApplicationInfo>, StoreError> {
        let raw = collect_rows(
            self.connection(),
            "SELECT pid, start_time, end_time, name FROM process ORDER BY start_time, pid",
            params![],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )?;
        let mut applications = Vec::with_capacity(raw.len());
        for (pid, start_time, end_time, name) in raw {
            applications.push(TracedApplicationInfo {
                pid: ProcessId::new(decode_u32(pid, "process identifier")?),
                start_time: Timestamp::from_unix_millis(start_time),
                stop_time: end_time.map(Timestamp::from_unix_millis),
                name,
            });
        }
        Ok(applications)
    }

    fn entry_by_id(&self, id: EntryId) -> Result<Option<TraceEntry>, StoreError> {
        read_entry(self.connection(), id)
    }

    fn entry_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .connection()
            .query_row("SELECT COUNT(*) FROM trace_entry", params![], |row| row.get(0))
            .map_err(|err| transaction_error(&err))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl Store {
    /// Returns the captured variables of an entry, in capture order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails or a stored variable type
    /// code is unrecognized.
    pub fn variables_for_entry(&self, id: EntryId) -> Result<Vec<Variable>, StoreError> {
        read_variables(self.connection(), id)
    }

    /// Returns the trace keys recorded for an entry, in capture order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    pub fn trace_keys_for_entry(&self, id: EntryId) -> Result<Vec<TraceKey>, StoreError> {
        read_trace_keys(self.connection(), id)
    }
}
