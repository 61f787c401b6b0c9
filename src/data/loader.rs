use std::borrow::Cow;
use std::io::Cursor;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data as ExcelData, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::error::LoadError;

use super::model::{
    SalesRow, COL_CUSTOMERS, COL_DEPARTMENT, COL_SALES, COL_SEGMENT, COL_YEAR, REQUIRED_COLUMNS,
};
use super::source::DataFormat;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Decode raw bytes of the given format into sales rows.
///
/// Supported formats:
/// * CSV     – header row naming the columns, one record per line
/// * JSON    – `[{ "Year": 2023, "Department Description": "...", ... }, ...]`
/// * Parquet – flat columns; numeric columns may be integer or float typed
/// * Excel   – `.xlsx` / `.xls` workbook, header in the first row of the first sheet
///
/// Columns other than the six required ones are ignored.
pub fn parse_rows(format: DataFormat, data: Bytes) -> Result<Vec<SalesRow>, LoadError> {
    parse_rows_from_sheet(format, data, None)
}

/// Like [`parse_rows`], but reads the named worksheet of an Excel workbook.
/// `sheet` is ignored by the other formats.
pub fn parse_rows_from_sheet(format: DataFormat, data: Bytes, sheet: Option<&str>) -> Result<Vec<SalesRow>, LoadError> {
    match format {
        DataFormat::Csv => parse_csv(&data),
        DataFormat::Json => parse_json(&data),
        DataFormat::Parquet => parse_parquet(data),
        DataFormat::Excel => parse_excel(data, sheet),
    }
}

// ---------------------------------------------------------------------------
// Cells and schema
// ---------------------------------------------------------------------------

/// One source cell, before it is interpreted for its column.
#[derive(Debug, Clone, PartialEq)]
enum Cell<'a> {
    Null,
    Text(Cow<'a, str>),
    Int(i64),
    Float(f64),
}

/// Positions of the required columns in a header, in `REQUIRED_COLUMNS` order.
fn locate_columns<'h, I>(headers: I) -> Result<[usize; 6], LoadError>
where
    I: IntoIterator<Item = &'h str>,
{
    let headers: Vec<&str> = headers.into_iter().collect();
    let mut positions = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h.trim() == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

fn invalid(row: usize, column: &'static str, problem: impl Into<String>) -> LoadError {
    LoadError::InvalidValue {
        row,
        column,
        problem: problem.into(),
    }
}

fn cell_year(cell: &Cell<'_>, row: usize) -> Result<i32, LoadError> {
    let whole = match cell {
        Cell::Int(i) => *i,
        Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
        Cell::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => match s.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.is_finite() => f as i64,
                    _ => return Err(invalid(row, COL_YEAR, format!("'{s}' is not a year"))),
                },
            }
        }
        Cell::Float(f) => return Err(invalid(row, COL_YEAR, format!("{f} is not a whole year"))),
        Cell::Null => return Err(invalid(row, COL_YEAR, "missing value")),
    };
    i32::try_from(whole).map_err(|_| invalid(row, COL_YEAR, format!("{whole} is out of range")))
}

fn cell_number(cell: &Cell<'_>, row: usize, column: &'static str) -> Result<f64, LoadError> {
    let value = match cell {
        Cell::Int(i) => *i as f64,
        Cell::Float(f) => *f,
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(row, column, format!("'{s}' is not a number")))?,
        Cell::Null => return Err(invalid(row, column, "missing value")),
    };
    // NaN or infinity would poison every sum downstream.
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(row, column, "not a finite number"))
    }
}

fn cell_text(cell: &Cell<'_>, row: usize, column: &'static str) -> Result<String, LoadError> {
    cell_optional_text(cell).ok_or_else(|| invalid(row, column, "missing value"))
}

/// Empty text and nulls both count as absent.
fn cell_optional_text(cell: &Cell<'_>) -> Option<String> {
    match cell {
        Cell::Null => None,
        Cell::Text(s) if s.trim().is_empty() => None,
        Cell::Text(s) => Some(s.trim().to_string()),
        Cell::Int(i) => Some(i.to_string()),
        Cell::Float(f) => Some(f.to_string()),
    }
}

/// Interpret six cells given in `REQUIRED_COLUMNS` order.
fn build_row(row: usize, cells: &[Cell<'_>; 6]) -> Result<SalesRow, LoadError> {
    Ok(SalesRow {
        year: cell_year(&cells[0], row)?,
        department: cell_text(&cells[1], row, COL_DEPARTMENT)?,
        segment: cell_text(&cells[2], row, COL_SEGMENT)?,
        profile: cell_optional_text(&cells[3]),
        sales: cell_number(&cells[4], row, COL_SALES)?,
        customers: cell_number(&cells[5], row, COL_CUSTOMERS)?,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn parse_csv(data: &[u8]) -> Result<Vec<SalesRow>, LoadError> {
    let mut reader = csv::Reader::from_reader(data);
    let positions = locate_columns(reader.headers()?.iter())?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let cells = positions.map(|pos| match record.get(pos) {
            Some(v) if !v.is_empty() => Cell::Text(Cow::Borrowed(v)),
            _ => Cell::Null,
        });
        rows.push(build_row(idx + 1, &cells)?);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented layout, as written by `df.to_json(orient='records')`.
fn parse_json(data: &[u8]) -> Result<Vec<SalesRow>, LoadError> {
    let root: JsonValue = serde_json::from_slice(data)?;
    let records = root.as_array().ok_or_else(|| LoadError::Malformed {
        format: DataFormat::Json,
        message: "expected a top-level array of records".to_string(),
    })?;

    let mut rows = Vec::with_capacity(records.len());
    for (idx, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| LoadError::Malformed {
            format: DataFormat::Json,
            message: format!("record {} is not an object", idx + 1),
        })?;

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !obj.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let cells = REQUIRED_COLUMNS.map(|c| json_cell(&obj[c]));
        rows.push(build_row(idx + 1, &cells)?);
    }
    Ok(rows)
}

fn json_cell(val: &JsonValue) -> Cell<'_> {
    match val {
        JsonValue::Null => Cell::Null,
        JsonValue::String(s) => Cell::Text(Cow::Borrowed(s)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
        },
        JsonValue::Bool(b) => Cell::Text(Cow::Owned(b.to_string())),
        other => Cell::Text(Cow::Owned(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn parse_parquet(data: Bytes) -> Result<Vec<SalesRow>, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let positions = locate_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns: Vec<&ArrayRef> = positions.iter().map(|&pos| batch.column(pos)).collect();

        for i in 0..batch.num_rows() {
            let row_no = rows.len() + 1;
            let mut cells = [Cell::Null, Cell::Null, Cell::Null, Cell::Null, Cell::Null, Cell::Null];
            for (slot, (col, name)) in cells.iter_mut().zip(columns.iter().zip(REQUIRED_COLUMNS)) {
                *slot = arrow_cell(col, i).ok_or_else(|| LoadError::Malformed {
                    format: DataFormat::Parquet,
                    message: format!("column '{name}' has unsupported type {:?}", col.data_type()),
                })?;
            }
            rows.push(build_row(row_no, &cells)?);
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Reads `sheet`, or the first worksheet when none is named.  The first
/// non-empty row is the header; fully blank rows are skipped.
fn parse_excel(data: Bytes, sheet: Option<&str>) -> Result<Vec<SalesRow>, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) if names.iter().any(|n| n == wanted) => wanted.to_string(),
        Some(wanted) => {
            return Err(LoadError::MissingSheet {
                sheet: wanted.to_string(),
                available: names,
            })
        }
        None => names.first().cloned().ok_or_else(|| LoadError::Malformed {
            format: DataFormat::Excel,
            message: "workbook has no worksheets".to_string(),
        })?,
    };
    let range = workbook.worksheet_range(&name)?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Err(LoadError::Malformed {
            format: DataFormat::Excel,
            message: format!("sheet '{name}' is empty"),
        });
    };
    let headers: Vec<String> = header.iter().map(|c| c.to_string()).collect();
    let positions = locate_columns(headers.iter().map(String::as_str))?;

    let mut rows = Vec::new();
    for (idx, cells) in sheet_rows.enumerate() {
        if cells.iter().all(|c| matches!(c, ExcelData::Empty)) {
            continue;
        }
        let row = positions.map(|pos| cells.get(pos).map_or(Cell::Null, excel_cell));
        rows.push(build_row(idx + 1, &row)?);
    }
    Ok(rows)
}

fn excel_cell(val: &ExcelData) -> Cell<'_> {
    match val {
        ExcelData::Empty => Cell::Null,
        ExcelData::String(s) => Cell::Text(Cow::Borrowed(s)),
        ExcelData::Int(i) => Cell::Int(*i),
        ExcelData::Float(f) => Cell::Float(*f),
        ExcelData::DateTime(dt) => Cell::Float(dt.as_f64()),
        ExcelData::DateTimeIso(s) | ExcelData::DurationIso(s) => Cell::Text(Cow::Borrowed(s)),
        other => Cell::Text(Cow::Owned(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Arrow cells
// ---------------------------------------------------------------------------

/// Read one cell from an Arrow column.  `None` for unsupported column types.
fn arrow_cell(col: &ArrayRef, row: usize) -> Option<Cell<'_>> {
    if col.is_null(row) {
        return Some(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::Text(Cow::Borrowed(col.as_string::<i32>().value(row))),
        DataType::LargeUtf8 => Cell::Text(Cow::Borrowed(col.as_string::<i64>().value(row))),
        DataType::Int32 => Cell::Int(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Cell::Int(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Cell::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Null => Cell::Null,
        _ => return None,
    };
    Some(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Year,Department Description,Segment Description,Profile Description,Sales,Customers";

    fn csv(body: &str) -> Bytes {
        Bytes::from(format!("{HEADER}\n{body}"))
    }

    #[test]
    fn csv_rows_are_typed() {
        let rows = parse_rows(
            DataFormat::Csv,
            csv("2023,Boots,Core,Elite,1500.5,12\n2022,Hats,New,,80,4\n"),
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            SalesRow {
                year: 2023,
                department: "Boots".into(),
                segment: "Core".into(),
                profile: Some("Elite".into()),
                sales: 1500.5,
                customers: 12.0,
            }
        );
        assert_eq!(rows[1].profile, None);
    }

    #[test]
    fn csv_column_order_and_extras_do_not_matter() {
        let data = Bytes::from(
            "Region,Sales,Customers,Year,Segment Description,Profile Description,Department Description\n\
             West,10,2,2023.0,Core,Elite,Boots\n",
        );
        let rows = parse_rows(DataFormat::Csv, data).unwrap();
        assert_eq!(rows[0].year, 2023);
        assert_eq!(rows[0].department, "Boots");
        assert_eq!(rows[0].sales, 10.0);
    }

    #[test]
    fn missing_columns_are_all_named() {
        let data = Bytes::from("Year,Department Description,Sales\n2023,Boots,10\n");
        match parse_rows(DataFormat::Csv, data) {
            Err(LoadError::MissingColumns(cols)) => assert_eq!(
                cols,
                vec!["Segment Description", "Profile Description", "Customers"]
            ),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn bad_number_reports_row_and_column() {
        match parse_rows(DataFormat::Csv, csv("2023,Boots,Core,,lots,3\n")) {
            Err(LoadError::InvalidValue { row, column, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, COL_SALES);
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn fractional_year_is_rejected() {
        let err = parse_rows(DataFormat::Csv, csv("2023.5,Boots,Core,,1,1\n")).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { column: COL_YEAR, .. }));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for body in ["2023,Boots,Core,,NaN,4\n", "2023,Boots,Core,,100,inf\n", "2023,Boots,Core,,-Infinity,4\n"] {
            match parse_rows(DataFormat::Csv, csv(body)) {
                Err(LoadError::InvalidValue { row, problem, .. }) => {
                    assert_eq!(row, 1);
                    assert_eq!(problem, "not a finite number");
                }
                other => panic!("expected InvalidValue for {body:?}, got {other:?}"),
            }
        }
        let err = cell_number(&Cell::Float(f64::NAN), 7, COL_SALES).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 7, column: COL_SALES, .. }));
    }

    type SheetRow<'a> = (i32, &'a str, &'a str, Option<&'a str>, f64, f64);

    fn workbook(sheets: &[(&str, Vec<SheetRow<'_>>)]) -> Bytes {
        let mut book = rust_xlsxwriter::Workbook::new();
        for (name, rows) in sheets {
            let ws = book.add_worksheet();
            ws.set_name(*name).unwrap();
            for (col, title) in HEADER.split(',').enumerate() {
                ws.write_string(0, col as u16, title).unwrap();
            }
            for (i, (year, dept, segment, profile, sales, customers)) in rows.iter().enumerate() {
                let r = i as u32 + 1;
                ws.write_number(r, 0, *year).unwrap();
                ws.write_string(r, 1, *dept).unwrap();
                ws.write_string(r, 2, *segment).unwrap();
                if let Some(p) = profile {
                    ws.write_string(r, 3, *p).unwrap();
                }
                ws.write_number(r, 4, *sales).unwrap();
                ws.write_number(r, 5, *customers).unwrap();
            }
        }
        Bytes::from(book.save_to_buffer().unwrap())
    }

    #[test]
    fn excel_first_sheet_is_read_by_default() {
        let data = workbook(&[
            (
                "Sheet1",
                vec![(2023, "Boots", "Core", Some("Elite"), 1500.5, 12.0), (2022, "Hats", "New", None, 80.0, 4.0)],
            ),
            ("Notes", vec![(1999, "Other", "Other", None, 1.0, 1.0)]),
        ]);
        let rows = parse_rows(DataFormat::Excel, data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            SalesRow {
                year: 2023,
                department: "Boots".into(),
                segment: "Core".into(),
                profile: Some("Elite".into()),
                sales: 1500.5,
                customers: 12.0,
            }
        );
        assert_eq!(rows[1].profile, None);
    }

    #[test]
    fn excel_named_sheet_is_selected() {
        let data = workbook(&[
            ("Summary", vec![(2021, "Boots", "Core", None, 1.0, 1.0)]),
            ("Detail", vec![(2023, "Hats", "New", Some("Urban"), 50.0, 5.0)]),
        ]);
        let rows = parse_rows_from_sheet(DataFormat::Excel, data.clone(), Some("Detail")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].department, "Hats");

        match parse_rows_from_sheet(DataFormat::Excel, data, Some("Sheet1")) {
            Err(LoadError::MissingSheet { sheet, available }) => {
                assert_eq!(sheet, "Sheet1");
                assert_eq!(available, vec!["Summary", "Detail"]);
            }
            other => panic!("expected MissingSheet, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_workbook_is_an_excel_error() {
        let err = parse_rows(DataFormat::Excel, Bytes::from_static(b"not a workbook")).unwrap_err();
        assert!(matches!(err, LoadError::Excel(_)));
    }

    #[test]
    fn json_records_with_null_profile() {
        let data = Bytes::from(
            r#"[
                {"Year": 2023, "Department Description": "Boots", "Segment Description": "Core",
                 "Profile Description": null, "Sales": 100, "Customers": 4.0, "Extra": true},
                {"Year": "2022", "Department Description": "Hats", "Segment Description": "New",
                 "Profile Description": "Elite", "Sales": "55.5", "Customers": 5}
            ]"#,
        );
        let rows = parse_rows(DataFormat::Json, data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].profile, None);
        assert_eq!(rows[0].sales, 100.0);
        assert_eq!(rows[1].year, 2022);
        assert_eq!(rows[1].sales, 55.5);
        assert_eq!(rows[1].profile.as_deref(), Some("Elite"));
    }

    #[test]
    fn json_must_be_an_array() {
        let err = parse_rows(DataFormat::Json, Bytes::from(r#"{"Year": 2023}"#)).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { format: DataFormat::Json, .. }));
    }

    #[test]
    fn json_missing_key_is_schema_error() {
        let data = Bytes::from(r#"[{"Year": 2023, "Sales": 1}]"#);
        let err = parse_rows(DataFormat::Json, data).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumns(ref c) if c.len() == 4));
    }
}
