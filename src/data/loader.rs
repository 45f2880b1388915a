use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::RowError;
use super::layout::ColumnLayout;
use super::model::{Dataset, Gender, Race, Record};

// ---------------------------------------------------------------------------
// Load options and outcome
// ---------------------------------------------------------------------------

/// What to do with a row that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedRows {
    /// Fail the whole load on the first bad row.
    #[default]
    Reject,
    /// Drop the row, log it and count it in [`Loaded::rows_skipped`].
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Column positions used by the CSV loader.
    pub layout: ColumnLayout,
    pub malformed: MalformedRows,
}

/// A populated dataset plus row accounting.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Dataset,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
}

/// Collects parsed rows, applying the malformed-row policy.
struct RowSink<'a> {
    options: &'a LoadOptions,
    rows: Vec<(i32, Record)>,
    skipped: usize,
}

impl<'a> RowSink<'a> {
    fn new(options: &'a LoadOptions) -> Self {
        RowSink {
            options,
            rows: Vec::new(),
            skipped: 0,
        }
    }

    fn accept(
        &mut self,
        label: &str,
        row: usize,
        parsed: Result<(i32, Record), RowError>,
    ) -> Result<()> {
        match parsed {
            Ok(pair) => self.rows.push(pair),
            Err(err) => match self.options.malformed {
                MalformedRows::Reject => {
                    return Err(anyhow::Error::new(err).context(format!("{label} row {row}")));
                }
                MalformedRows::Skip => {
                    log::warn!("skipping {label} row {row}: {err}");
                    self.skipped += 1;
                }
            },
        }
        Ok(())
    }

    fn finish(self) -> Loaded {
        let rows_loaded = self.rows.len();
        Loaded {
            dataset: Dataset::from_rows(self.rows),
            rows_loaded,
            rows_skipped: self.skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a stop-and-frisk dataset with default options. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – positional columns, header row discarded (see [`ColumnLayout`])
/// * `.json`    – `[{ "year": 2011, "description": "...", "arrested": true, ... }, ...]`
/// * `.parquet` – named columns `year`, `description`, `arrested`, `frisked`,
///   `gender`, `race`, `location`
pub fn load_file(path: &Path) -> Result<Dataset> {
    Ok(load_file_with(path, &LoadOptions::default())?.dataset)
}

pub fn load_file_with(path: &Path, options: &LoadOptions) -> Result<Loaded> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            load_csv_from_reader(file, options)?
        }
        "json" => load_json(path, options)?,
        "parquet" | "pq" => load_parquet(path, options)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!(
        "loaded {} records across {} years from {} ({} skipped)",
        loaded.rows_loaded,
        loaded.dataset.len(),
        path.display(),
        loaded.rows_skipped
    );
    Ok(loaded)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse positional CSV text. The first row is a header and is discarded.
pub fn load_csv_from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Loaded> {
    // Flexible so that short rows reach our own column check instead of
    // failing inside the csv crate with a less useful message.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    // Rows are read as bytes so that a cell with invalid UTF-8 is a row error
    // subject to the malformed-row policy rather than a reader failure.
    let mut sink = RowSink::new(options);
    for (idx, result) in reader.byte_records().enumerate() {
        let row = idx + 1;
        let bytes = result.with_context(|| format!("CSV row {row}"))?;
        let parsed = csv::StringRecord::from_byte_record(bytes)
            .map_err(|err| RowError::InvalidUtf8 {
                column: err.utf8_error().field(),
            })
            .and_then(|record| parse_csv_row(&record, &options.layout));
        sink.accept("CSV", row, parsed)?;
    }
    Ok(sink.finish())
}

fn parse_csv_row(
    row: &csv::StringRecord,
    layout: &ColumnLayout,
) -> Result<(i32, Record), RowError> {
    let required = layout.min_columns();
    if row.len() < required {
        return Err(RowError::TooFewColumns {
            found: row.len(),
            required,
        });
    }

    let year = parse_year(&row[layout.year])?;
    let record = Record {
        description: row[layout.description].to_string(),
        arrested: layout.is_marked(&row[layout.arrested]),
        frisked: layout.is_marked(&row[layout.frisked]),
        gender: Gender::from(&row[layout.gender]),
        race: Race::from(&row[layout.race]),
        location: row[layout.location].to_string(),
    };
    Ok((year, record))
}

fn parse_year(s: &str) -> Result<i32, RowError> {
    s.trim().parse::<i32>().map_err(|_| RowError::InvalidYear {
        value: s.to_string(),
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct JsonRow {
    year: i32,
    #[serde(flatten)]
    record: Record,
}

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "year": 2011,
///     "description": "ROBBERY",
///     "arrested": false,
///     "frisked": true,
///     "gender": "M",
///     "race": "B",
///     "location": "BROOKLYN"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path, options: &LoadOptions) -> Result<Loaded> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<JsonValue> =
        serde_json::from_str(&text).context("parsing JSON (expected top-level array)")?;

    let mut sink = RowSink::new(options);
    for (idx, rec) in rows.into_iter().enumerate() {
        let parsed = serde_json::from_value::<JsonRow>(rec)
            .map(|r| (r.year, r.record))
            .map_err(|err| RowError::InvalidJson {
                message: err.to_string(),
            });
        sink.accept("JSON", idx + 1, parsed)?;
    }
    Ok(sink.finish())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

struct ParquetColumns {
    year: usize,
    description: usize,
    arrested: usize,
    frisked: usize,
    gender: usize,
    race: usize,
    location: usize,
}

/// Load a Parquet file with one named column per record field.
///
/// `year` may be Int32, Int64 or Utf8. The flags may be Boolean or Utf8, in
/// which case the layout's marker decides. Every other column is Utf8.
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<Loaded> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut sink = RowSink::new(options);
    let mut row = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let index = |field: &'static str| {
            schema
                .index_of(field)
                .map_err(|_| RowError::MissingField { field })
        };
        let cols = ParquetColumns {
            year: index("year")?,
            description: index("description")?,
            arrested: index("arrested")?,
            frisked: index("frisked")?,
            gender: index("gender")?,
            race: index("race")?,
            location: index("location")?,
        };

        for batch_row in 0..batch.num_rows() {
            row += 1;
            let parsed = parquet_row(batch.columns(), &cols, batch_row, &options.layout);
            if let Err(err @ RowError::UnsupportedType { .. }) = parsed {
                // A column of the wrong type breaks every row, not just this one.
                return Err(anyhow::Error::new(err).context("parquet schema"));
            }
            sink.accept("Parquet", row, parsed)?;
        }
    }

    Ok(sink.finish())
}

fn parquet_row(
    columns: &[ArrayRef],
    cols: &ParquetColumns,
    row: usize,
    layout: &ColumnLayout,
) -> Result<(i32, Record), RowError> {
    let year = year_cell(&columns[cols.year], row)?;
    let record = Record {
        description: string_cell(&columns[cols.description], row, "description")?,
        arrested: flag_cell(&columns[cols.arrested], row, "arrested", layout)?,
        frisked: flag_cell(&columns[cols.frisked], row, "frisked", layout)?,
        gender: Gender::from(string_cell(&columns[cols.gender], row, "gender")?),
        race: Race::from(string_cell(&columns[cols.race], row, "race")?),
        location: string_cell(&columns[cols.location], row, "location")?,
    };
    Ok((year, record))
}

// -- Arrow cell helpers --

fn unsupported(field: &'static str, col: &ArrayRef) -> RowError {
    RowError::UnsupportedType {
        field,
        found: format!("{:?}", col.data_type()),
    }
}

fn year_cell(col: &ArrayRef, row: usize) -> Result<i32, RowError> {
    if col.is_null(row) {
        return Err(RowError::InvalidYear {
            value: "<null>".to_string(),
        });
    }
    match col.data_type() {
        DataType::Int32 => Ok(col.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => {
            let v = col.as_primitive::<Int64Type>().value(row);
            i32::try_from(v).map_err(|_| RowError::InvalidYear {
                value: v.to_string(),
            })
        }
        DataType::Utf8 => parse_year(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => parse_year(col.as_string::<i64>().value(row)),
        _ => Err(unsupported("year", col)),
    }
}

/// Null text cells read as the empty string.
fn string_cell(col: &ArrayRef, row: usize, field: &'static str) -> Result<String, RowError> {
    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            if arr.is_null(row) { "" } else { arr.value(row) }
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            if arr.is_null(row) { "" } else { arr.value(row) }
        }
        _ => return Err(unsupported(field, col)),
    };
    Ok(value.to_string())
}

/// Null flags read as `false`.
fn flag_cell(
    col: &ArrayRef,
    row: usize,
    field: &'static str,
    layout: &ColumnLayout,
) -> Result<bool, RowError> {
    match col.data_type() {
        DataType::Boolean => Ok(!col.is_null(row) && col.as_boolean().value(row)),
        DataType::Utf8 | DataType::LargeUtf8 => {
            Ok(layout.is_marked(&string_cell(col, row, field)?))
        }
        _ => Err(unsupported(field, col)),
    }
}
