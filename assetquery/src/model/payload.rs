//! Exposure payload parsing
//!
//! The `expo` attribute of a geocell is a small table serialized as JSON,
//! one row per building class. Upstream tooling writes it column-oriented
//! (column name -> array of values, or column name -> row-index -> value)
//! and, depending on the dataset's age, either as a nested object or as an
//! encoded string. All three shapes are accepted here.

use serde_json::{Map, Value};
use thiserror::Error;

/// Baseline damage state assigned when a record carries none.
pub const DEFAULT_DAMAGE_STATE: &str = "D0";

/// Column names of the payload table.
const COL_ID: &str = "id";
const COL_REGION: &str = "Region";
const COL_TAXONOMY: &str = "Taxonomy";
const COL_BUILDINGS: &str = "Buildings";
const COL_DWELLINGS: &str = "Dwellings";
const COL_POPULATION: &str = "Population";
const COL_DAMAGE: &str = "Damage";
/// Replacement cost appears under two spellings depending on dataset age.
const COL_REPL_COST: &str = "Repl-cost-USD-bdg";
const COL_REPL_COST_LEGACY: &str = "Repl_cost_USD/bdg";

/// One building-class entry inside a geocell.
///
/// Building counts are floats: upstream disaggregation distributes census
/// totals over cells, so fractional counts are expected.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyRecord {
    /// Record id (opaque; e.g. `AREA # 1234`)
    pub id: String,
    /// Region name, when present
    pub region: Option<String>,
    /// Building-class code keying the property dictionary
    pub taxonomy: String,
    /// Expected number of buildings of this class in the cell
    pub buildings: f64,
    /// Number of dwellings, when present
    pub dwellings: Option<f64>,
    /// Total population, when present
    pub population: Option<f64>,
    /// Replacement cost per building in USD, when present
    pub repl_cost: Option<f64>,
    /// Damage state, defaulting to the undamaged baseline
    pub damage: String,
}

/// Errors that can occur while parsing an exposure payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// String-encoded payload is not valid JSON
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is neither a column table nor a row list
    #[error("payload has unsupported shape: {0}")]
    UnsupportedShape(&'static str),

    /// A required column is absent
    #[error("payload is missing required column '{0}'")]
    MissingColumn(&'static str),

    /// A cell value has the wrong type
    #[error("invalid value in column '{column}' at row {row}")]
    InvalidValue { column: String, row: usize },
}

/// Parses an exposure payload into its ordered record sequence.
///
/// `Null` and the empty string both mean "no exposure data" and yield an
/// empty sequence. Row order of the payload table is preserved.
pub fn parse_payload(payload: &Value) -> Result<Vec<TaxonomyRecord>, PayloadError> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => {
            let decoded: Value = serde_json::from_str(s)?;
            match decoded {
                // One level of string encoding is enough.
                Value::String(_) => Err(PayloadError::UnsupportedShape(
                    "doubly string-encoded payload",
                )),
                other => parse_payload(&other),
            }
        }
        Value::Array(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Object(map) => record_from_row(map, i),
                _ => Err(PayloadError::UnsupportedShape("row list with non-object rows")),
            })
            .collect(),
        Value::Object(columns) => {
            let rows = rows_from_columns(columns)?;
            rows.iter()
                .enumerate()
                .map(|(i, row)| record_from_row(row, i))
                .collect()
        }
        _ => Err(PayloadError::UnsupportedShape("not an object, array or string")),
    }
}

/// Transposes a column-oriented table into row objects.
///
/// Each column is either an array (row order as given) or an object keyed by
/// row index; index keys are ordered numerically so that `"10"` sorts after
/// `"9"`, matching the writer's row order.
fn rows_from_columns(columns: &Map<String, Value>) -> Result<Vec<Map<String, Value>>, PayloadError> {
    let mut row_count: Option<usize> = None;
    let mut extracted: Vec<(&String, Vec<Value>)> = Vec::with_capacity(columns.len());

    for (name, column) in columns {
        let values = match column {
            Value::Array(values) => values.clone(),
            Value::Object(cells) => {
                let mut keyed: Vec<(&String, &Value)> = cells.iter().collect();
                keyed.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => a.cmp(b),
                });
                keyed.into_iter().map(|(_, v)| v.clone()).collect()
            }
            _ => return Err(PayloadError::UnsupportedShape("column is not an array or object")),
        };

        match row_count {
            None => row_count = Some(values.len()),
            Some(n) if n != values.len() => {
                return Err(PayloadError::UnsupportedShape("columns have unequal lengths"))
            }
            Some(_) => {}
        }
        extracted.push((name, values));
    }

    let row_count = row_count.unwrap_or(0);
    let mut rows = vec![Map::new(); row_count];
    for (name, values) in extracted {
        for (row, value) in rows.iter_mut().zip(values) {
            row.insert(name.clone(), value);
        }
    }
    Ok(rows)
}

fn record_from_row(row: &Map<String, Value>, index: usize) -> Result<TaxonomyRecord, PayloadError> {
    let id = required(row, COL_ID, index, as_string)?;
    let taxonomy = required(row, COL_TAXONOMY, index, as_string)?;
    let buildings = required(row, COL_BUILDINGS, index, as_f64)?;

    let repl_cost = match optional(row, COL_REPL_COST, index, as_f64)? {
        Some(v) => Some(v),
        None => optional(row, COL_REPL_COST_LEGACY, index, as_f64)?,
    };

    Ok(TaxonomyRecord {
        id,
        region: optional(row, COL_REGION, index, as_string)?,
        taxonomy,
        buildings,
        dwellings: optional(row, COL_DWELLINGS, index, as_f64)?,
        population: optional(row, COL_POPULATION, index, as_f64)?,
        repl_cost,
        damage: optional(row, COL_DAMAGE, index, as_string)?
            .unwrap_or_else(|| DEFAULT_DAMAGE_STATE.to_string()),
    })
}

fn required<T>(
    row: &Map<String, Value>,
    column: &'static str,
    index: usize,
    convert: fn(&Value) -> Option<T>,
) -> Result<T, PayloadError> {
    let value = row.get(column).ok_or(PayloadError::MissingColumn(column))?;
    convert(value).ok_or_else(|| PayloadError::InvalidValue {
        column: column.to_string(),
        row: index,
    })
}

fn optional<T>(
    row: &Map<String, Value>,
    column: &str,
    index: usize,
    convert: fn(&Value) -> Option<T>,
) -> Result<Option<T>, PayloadError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => convert(value)
            .map(Some)
            .ok_or_else(|| PayloadError::InvalidValue {
                column: column.to_string(),
                row: index,
            }),
    }
}

/// Strings pass through; numeric ids are stringified.
fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers pass through; numeric strings (CSV heritage) are parsed.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
