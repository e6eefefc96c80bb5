//! Statement stream codecs: JSON lines, tabular, and compact binary.
//!
//! All three codecs share the same normalization contract. On write,
//! statements are cleaned and assigned an ID when missing. On read, the
//! same applies plus a property-type backfill from the model, so streams
//! produced by older writers that lack the type name stay readable.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};
use crate::model::Model;
use crate::statement::{prop_type_name, Statement};

const COLUMNS: &[&str] = &[
    "id",
    "entity_id",
    "canonical_id",
    "prop",
    "prop_type",
    "schema",
    "value",
    "dataset",
    "lang",
    "original_value",
    "external",
    "first_seen",
    "last_seen",
    "origin",
];

fn normalize(stmt: &mut Statement, model: Option<&Model>) {
    stmt.clean();
    if stmt.id.is_empty() {
        stmt.make_key();
    }
    if stmt.prop_type.is_empty() {
        if let Some(m) = model {
            if let Ok(name) = prop_type_name(m, &stmt.schema, &stmt.prop) {
                stmt.prop_type = name;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

pub fn write_jsonl<W, I>(writer: &mut W, statements: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Statement>,
{
    for mut stmt in statements {
        normalize(&mut stmt, None);
        let line = serde_json::to_string(&stmt).map_err(|e| StatementError::Malformed {
            message: e.to_string(),
        })?;
        writer.write_all(line.as_bytes()).map_err(StatementError::from)?;
        writer.write_all(b"\n").map_err(StatementError::from)?;
    }
    Ok(())
}

/// Read JSON-lines statements, invoking `sink` per record. A malformed
/// line stops the read with an error.
pub fn read_jsonl<R, F>(reader: R, model: Option<&Model>, mut sink: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(Statement) -> Result<()>,
{
    for line in reader.lines() {
        let line = line.map_err(StatementError::from)?;
        if line.trim().is_empty() {
            continue;
        }
        let mut stmt: Statement =
            serde_json::from_str(&line).map_err(|e| StatementError::Malformed {
                message: e.to_string(),
            })?;
        normalize(&mut stmt, model);
        sink(stmt)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tabular (CSV)
// ---------------------------------------------------------------------------

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_fields(stmt: &Statement) -> [&str; 14] {
    [
        &stmt.id,
        &stmt.entity_id,
        &stmt.canonical_id,
        &stmt.prop,
        &stmt.prop_type,
        &stmt.schema,
        &stmt.value,
        &stmt.dataset,
        &stmt.lang,
        &stmt.original_value,
        if stmt.external { "true" } else { "false" },
        &stmt.first_seen,
        &stmt.last_seen,
        &stmt.origin,
    ]
}

pub fn write_csv<W, I>(writer: &mut W, statements: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Statement>,
{
    writeln!(writer, "{}", COLUMNS.join(",")).map_err(StatementError::from)?;
    for mut stmt in statements {
        normalize(&mut stmt, None);
        let row: Vec<String> = csv_fields(&stmt).iter().map(|f| csv_escape(f)).collect();
        writeln!(writer, "{}", row.join(",")).map_err(StatementError::from)?;
    }
    Ok(())
}

/// Split one logical CSV document into records, honoring quoted fields
/// with embedded separators, quotes and newlines.
fn parse_csv(input: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if quoted {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        quoted = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' if field.is_empty() => quoted = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(ch),
        }
    }
    if quoted {
        return Err("unterminated quoted field".to_string());
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

pub fn read_csv<R, F>(mut reader: R, model: Option<&Model>, mut sink: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(Statement) -> Result<()>,
{
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(StatementError::from)?;
    let records = parse_csv(&input).map_err(|message| StatementError::Malformed { message })?;
    let mut rows = records.into_iter();
    let Some(header) = rows.next() else {
        return Ok(());
    };
    let index = |name: &str| header.iter().position(|h| h == name);
    let columns: Vec<Option<usize>> = COLUMNS.iter().map(|c| index(c)).collect();
    let get = |row: &[String], col: usize| -> String {
        columns[col]
            .and_then(|i| row.get(i))
            .cloned()
            .unwrap_or_default()
    };
    for row in rows {
        let mut stmt = Statement {
            id: get(&row, 0),
            entity_id: get(&row, 1),
            canonical_id: get(&row, 2),
            prop: get(&row, 3),
            prop_type: get(&row, 4),
            schema: get(&row, 5),
            value: get(&row, 6),
            dataset: get(&row, 7),
            lang: get(&row, 8),
            original_value: get(&row, 9),
            external: get(&row, 10) == "true",
            first_seen: get(&row, 11),
            last_seen: get(&row, 12),
            origin: get(&row, 13),
        };
        normalize(&mut stmt, model);
        sink(stmt)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Compact binary
// ---------------------------------------------------------------------------

/// Full-field wire form for the binary codec. `Statement`'s own serde
/// derive omits empty optional fields, which the JSON codec wants but a
/// non-self-describing format cannot tolerate: bincode reads fields by
/// position, so every record must carry all of them.
#[derive(Serialize, Deserialize)]
struct CompactRecord {
    id: String,
    entity_id: String,
    canonical_id: String,
    prop: String,
    prop_type: String,
    schema: String,
    value: String,
    dataset: String,
    lang: String,
    original_value: String,
    external: bool,
    first_seen: String,
    last_seen: String,
    origin: String,
}

impl From<Statement> for CompactRecord {
    fn from(s: Statement) -> CompactRecord {
        CompactRecord {
            id: s.id,
            entity_id: s.entity_id,
            canonical_id: s.canonical_id,
            prop: s.prop,
            prop_type: s.prop_type,
            schema: s.schema,
            value: s.value,
            dataset: s.dataset,
            lang: s.lang,
            original_value: s.original_value,
            external: s.external,
            first_seen: s.first_seen,
            last_seen: s.last_seen,
            origin: s.origin,
        }
    }
}

impl From<CompactRecord> for Statement {
    fn from(r: CompactRecord) -> Statement {
        Statement {
            id: r.id,
            entity_id: r.entity_id,
            canonical_id: r.canonical_id,
            prop: r.prop,
            prop_type: r.prop_type,
            schema: r.schema,
            value: r.value,
            dataset: r.dataset,
            lang: r.lang,
            original_value: r.original_value,
            external: r.external,
            first_seen: r.first_seen,
            last_seen: r.last_seen,
            origin: r.origin,
        }
    }
}

pub fn write_compact<W, I>(writer: &mut W, statements: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Statement>,
{
    let batch: Vec<CompactRecord> = statements
        .into_iter()
        .map(|mut stmt| {
            normalize(&mut stmt, None);
            CompactRecord::from(stmt)
        })
        .collect();
    bincode::serialize_into(writer, &batch).map_err(|e| StatementError::Malformed {
        message: e.to_string(),
    })?;
    Ok(())
}

pub fn read_compact<R, F>(reader: R, model: Option<&Model>, mut sink: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(Statement) -> Result<()>,
{
    let batch: Vec<CompactRecord> =
        bincode::deserialize_from(reader).map_err(|e| StatementError::Malformed {
            message: e.to_string(),
        })?;
    for record in batch {
        let mut stmt = Statement::from(record);
        normalize(&mut stmt, model);
        sink(stmt)?;
    }
    Ok(())
}
