//! Integration tests for the sales dashboard pipeline

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use sales_dashboard::{
    filter_records, load_table, DashboardView, DatasetCache, FileSource, FilterSelection, GrowthYears, LoadError,
};
use tempfile::NamedTempFile;

const CSV: &str = "Year,Department Description,Segment Description,Profile Description,Sales,Customers\n\
                   2022,Boots,Core,Country Casual,1000,10\n\
                   2022,Hats,Core,,400,8\n\
                   2022,Hats,New,Urban Rider,300,0\n\
                   2023,Boots,Core,Country Casual,1500,12\n\
                   2023,Boots,Elite,Urban Rider,2000,5\n\
                   2023,Hats,New,,200,4\n";

const JSON: &str = r#"[
    {"Year": 2022, "Department Description": "Boots", "Segment Description": "Core", "Profile Description": "Country Casual", "Sales": 1000, "Customers": 10},
    {"Year": 2022, "Department Description": "Hats", "Segment Description": "Core", "Profile Description": null, "Sales": 400, "Customers": 8},
    {"Year": 2022, "Department Description": "Hats", "Segment Description": "New", "Profile Description": "Urban Rider", "Sales": 300, "Customers": 0},
    {"Year": 2023, "Department Description": "Boots", "Segment Description": "Core", "Profile Description": "Country Casual", "Sales": 1500, "Customers": 12},
    {"Year": 2023, "Department Description": "Boots", "Segment Description": "Elite", "Profile Description": "Urban Rider", "Sales": 2000, "Customers": 5},
    {"Year": 2023, "Department Description": "Hats", "Segment Description": "New", "Profile Description": null, "Sales": 200, "Customers": 4}
]"#;

/// Temp file with the given extension, so the loader can pick a format.
fn data_file(suffix: &str) -> NamedTempFile {
    tempfile::Builder::new().suffix(suffix).tempfile().unwrap()
}

fn create_test_csv() -> NamedTempFile {
    let mut file = data_file(".csv");
    write!(file, "{CSV}").unwrap();
    file
}

fn create_test_json() -> NamedTempFile {
    let mut file = data_file(".json");
    write!(file, "{JSON}").unwrap();
    file
}

fn create_test_parquet() -> NamedTempFile {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Year", DataType::Int64, false),
        Field::new("Department Description", DataType::Utf8, false),
        Field::new("Segment Description", DataType::Utf8, false),
        Field::new("Profile Description", DataType::Utf8, true),
        Field::new("Sales", DataType::Float64, false),
        Field::new("Customers", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![2022, 2022, 2022, 2023, 2023, 2023])),
            Arc::new(StringArray::from(vec!["Boots", "Hats", "Hats", "Boots", "Boots", "Hats"])),
            Arc::new(StringArray::from(vec!["Core", "Core", "New", "Core", "Elite", "New"])),
            Arc::new(StringArray::from(vec![
                Some("Country Casual"),
                None,
                Some("Urban Rider"),
                Some("Country Casual"),
                Some("Urban Rider"),
                None,
            ])),
            Arc::new(Float64Array::from(vec![1000.0, 400.0, 300.0, 1500.0, 2000.0, 200.0])),
            Arc::new(Int64Array::from(vec![10, 8, 0, 12, 5, 4])),
        ],
    )
    .unwrap();

    let file = data_file(".parquet");
    let mut writer = ArrowWriter::try_new(file.as_file().try_clone().unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    file
}

fn create_test_xlsx() -> NamedTempFile {
    let rows: [(f64, &str, &str, Option<&str>, f64, f64); 6] = [
        (2022.0, "Boots", "Core", Some("Country Casual"), 1000.0, 10.0),
        (2022.0, "Hats", "Core", None, 400.0, 8.0),
        (2022.0, "Hats", "New", Some("Urban Rider"), 300.0, 0.0),
        (2023.0, "Boots", "Core", Some("Country Casual"), 1500.0, 12.0),
        (2023.0, "Boots", "Elite", Some("Urban Rider"), 2000.0, 5.0),
        (2023.0, "Hats", "New", None, 200.0, 4.0),
    ];

    let mut book = rust_xlsxwriter::Workbook::new();
    let sheet = book.add_worksheet();
    sheet.set_name("Sheet1").unwrap();
    let header = CSV.lines().next().unwrap();
    for (col, title) in header.split(',').enumerate() {
        sheet.write_string(0, col as u16, title).unwrap();
    }
    for (i, (year, dept, segment, profile, sales, customers)) in rows.into_iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_number(r, 0, year).unwrap();
        sheet.write_string(r, 1, dept).unwrap();
        sheet.write_string(r, 2, segment).unwrap();
        if let Some(profile) = profile {
            sheet.write_string(r, 3, profile).unwrap();
        }
        sheet.write_number(r, 4, sales).unwrap();
        sheet.write_number(r, 5, customers).unwrap();
    }

    let file = data_file(".xlsx");
    book.save(file.path()).unwrap();
    file
}

#[test]
fn test_all_formats_load_the_same_table() {
    let csv = create_test_csv();
    let json = create_test_json();
    let parquet = create_test_parquet();

    let from_csv = load_table(&FileSource::new(csv.path())).unwrap();
    let from_json = load_table(&FileSource::new(json.path())).unwrap();
    let from_parquet = load_table(&FileSource::new(parquet.path())).unwrap();

    assert_eq!(from_csv.len(), 6);
    assert_eq!(from_csv.records, from_json.records);
    assert_eq!(from_csv.records, from_parquet.records);
    assert_eq!(from_csv.years, BTreeSet::from([2022, 2023]));
}

#[test]
fn test_excel_workbook_matches_csv() {
    let csv = create_test_csv();
    let xlsx = create_test_xlsx();

    let from_csv = load_table(&FileSource::new(csv.path())).unwrap();
    let from_first_sheet = load_table(&FileSource::new(xlsx.path())).unwrap();
    let from_named_sheet = load_table(&FileSource::new(xlsx.path()).with_sheet(Some("Sheet1".into()))).unwrap();

    assert_eq!(from_csv.records, from_first_sheet.records);
    assert_eq!(from_csv.records, from_named_sheet.records);

    let err = load_table(&FileSource::new(xlsx.path()).with_sheet(Some("2023".into()))).unwrap_err();
    assert!(matches!(err, LoadError::MissingSheet { .. }));
}

#[test]
fn test_derived_columns() {
    let csv = create_test_csv();
    let table = load_table(&FileSource::new(csv.path())).unwrap();

    assert_eq!(table.records[0].sales_per_customer, Some(100.0));
    assert_eq!(table.records[0].segment_profile, "Core - Country Casual");
    assert_eq!(table.records[1].segment_profile, "Core - All Profiles");
    // Zero customers leaves the ratio undefined instead of infinite.
    assert_eq!(table.records[2].sales_per_customer, None);
}

#[test]
fn test_end_to_end_dashboard() {
    let csv = create_test_csv();
    let cache = DatasetCache::new(Box::new(FileSource::new(csv.path())));
    let table = cache.get().unwrap();

    let selection = FilterSelection::all(&table).unwrap();
    assert_eq!(selection.year, 2023);

    let view = DashboardView::compute(&table, &selection, None);

    // KPIs over the three 2023 records.
    assert_eq!(view.kpis.record_count, 3);
    assert!((view.kpis.total_sales_millions - 0.0037).abs() < 1e-12);
    assert!((view.kpis.total_customers_thousands - 0.021).abs() < 1e-12);
    assert!((view.kpis.avg_spend.unwrap() - 3700.0 / 21.0).abs() < 1e-9);
    assert_eq!(view.kpis.top_department.as_deref(), Some("Boots"));
    assert_eq!(view.kpis.display_total_sales(), "$0.00M");

    // Growth compares the whole table, 2022 → 2023.
    assert_eq!(view.growth_years, Some(GrowthYears { earlier: 2022, later: 2023 }));
    let boots = view.growth.iter().find(|g| g.department == "Boots").unwrap();
    assert!((boots.growth_percent.unwrap() - 250.0).abs() < 1e-9);
    let hats = view.growth.iter().find(|g| g.department == "Hats").unwrap();
    assert!((hats.growth_percent.unwrap() + (500.0 / 700.0) * 100.0).abs() < 1e-9);

    // Only profiled records reach the spend matrix.
    assert_eq!(view.spend_matrix.get("Country Casual", "Boots"), Some(125.0));
    assert_eq!(view.spend_matrix.get("Urban Rider", "Boots"), Some(400.0));
    assert_eq!(view.spend_matrix.get("Country Casual", "Hats"), None);
}

#[test]
fn test_explicit_growth_years_and_empty_selection() {
    let json = create_test_json();
    let table = load_table(&FileSource::new(json.path())).unwrap();

    let mut selection = FilterSelection::all(&table).unwrap();
    selection.segments.clear();
    assert!(filter_records(&table, &selection).is_empty());

    let years = GrowthYears::new(2022, 2023).unwrap();
    let view = DashboardView::compute(&table, &selection, Some(years));
    assert!(view.is_empty());
    assert!(view.dept_year_sales.is_empty());
    assert!(view.spend_matrix.is_empty());
    assert_eq!(view.kpis.top_department, None);
    assert_eq!(view.kpis.avg_spend, None);
    // Growth ignores the selection.
    assert_eq!(view.growth.len(), 2);
}

#[test]
fn test_non_finite_sales_fail_the_load() {
    let mut file = data_file(".csv");
    write!(
        file,
        "Year,Department Description,Segment Description,Profile Description,Sales,Customers\n\
         2023,Boots,Core,,NaN,4\n\
         2023,Hats,Core,,100,5\n"
    )
    .unwrap();
    let cache = DatasetCache::new(Box::new(FileSource::new(file.path())));
    match cache.get() {
        Err(LoadError::InvalidValue { row: 1, column: "Sales", .. }) => {}
        other => panic!("expected InvalidValue for the NaN sales cell, got {other:?}"),
    }
    assert!(!cache.is_loaded());
}

#[test]
fn test_missing_file_reports_io_error() {
    let cache = DatasetCache::new(Box::new(FileSource::new("/definitely/not/here.parquet")));
    assert!(matches!(cache.get(), Err(LoadError::Io { .. })));
}

#[test]
fn test_unsupported_extension() {
    let file = data_file(".ods");
    let err = load_table(&FileSource::new(file.path())).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(_)));
}
