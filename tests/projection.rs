use chrono::NaiveDate;
use sheet_nodes::projection::{project_sheet, CellRange, HeaderMode, ProjectionOptions, RowRange};
use sheet_nodes::types::{CellValue, Record, Sheet};

fn s(v: &str) -> CellValue {
    CellValue::from(v)
}

fn n(v: f64) -> CellValue {
    CellValue::Number(v)
}

fn people() -> Sheet {
    Sheet::new(
        (0, 0),
        vec![
            vec![s("name"), s("age"), s("city")],
            vec![s("Ada"), n(36.0), s("London")],
            vec![s("Grace"), CellValue::Empty, s("Arlington")],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
            vec![s("Linus"), n(28.5), CellValue::Empty],
        ],
    )
}

fn keys(record: &Record) -> Vec<&str> {
    record.keys().collect()
}

#[test]
fn first_row_supplies_keys_and_blank_rows_are_skipped() {
    let records = project_sheet(&people(), &ProjectionOptions::default());
    assert_eq!(records.len(), 3);
    assert_eq!(keys(&records[0]), vec!["name", "age", "city"]);
    assert_eq!(records[0].get("age"), Some(&n(36.0)));
    // Empty cells are left out without a defval.
    assert_eq!(keys(&records[1]), vec!["name", "city"]);
    assert_eq!(records[2].get("name"), Some(&s("Linus")));
}

#[test]
fn defval_fills_empty_cells() {
    let opts = ProjectionOptions {
        defval: Some(s("")),
        ..Default::default()
    };
    let records = project_sheet(&people(), &opts);
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].get("age"), Some(&s("")));
    assert_eq!(records[2].get("city"), Some(&s("")));
}

#[test]
fn null_defval_keeps_keys_with_empty_values() {
    let opts = ProjectionOptions {
        defval: Some(CellValue::Empty),
        ..Default::default()
    };
    let records = project_sheet(&people(), &opts);
    assert_eq!(keys(&records[1]), vec!["name", "age", "city"]);
    assert_eq!(records[1].get("age"), Some(&CellValue::Empty));
    let json = serde_json::to_value(&records[1]).unwrap();
    assert_eq!(json["age"], serde_json::Value::Null);
}

#[test]
fn blank_rows_can_be_kept() {
    let opts = ProjectionOptions {
        blank_rows: Some(true),
        ..Default::default()
    };
    let records = project_sheet(&people(), &opts);
    assert_eq!(records.len(), 4);
    assert!(records[2].is_empty());
}

#[test]
fn non_raw_renders_text() {
    let sheet = Sheet::new(
        (0, 0),
        vec![
            vec![s("n"), s("flag"), s("when")],
            vec![
                n(3.0),
                CellValue::Bool(true),
                CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()),
            ],
            vec![
                n(0.25),
                CellValue::Bool(false),
                CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(13, 5, 0).unwrap()),
            ],
        ],
    );
    let opts = ProjectionOptions {
        raw: Some(false),
        ..Default::default()
    };
    let records = project_sheet(&sheet, &opts);
    assert_eq!(records[0].get("n"), Some(&s("3")));
    assert_eq!(records[0].get("flag"), Some(&s("TRUE")));
    assert_eq!(records[0].get("when"), Some(&s("2024-01-02")));
    assert_eq!(records[1].get("n"), Some(&s("0.25")));
    assert_eq!(records[1].get("when"), Some(&s("2024-01-02 13:05:00")));

    let opts = ProjectionOptions {
        raw: Some(false),
        date_format: Some("%d/%m/%Y".to_string()),
        ..Default::default()
    };
    let records = project_sheet(&sheet, &opts);
    assert_eq!(records[1].get("when"), Some(&s("02/01/2024")));
}

#[test]
fn letter_keys_follow_the_sheet_origin() {
    let sheet = Sheet::new((4, 2), vec![vec![s("x"), n(1.0)], vec![s("y"), n(2.0)]]);
    let opts = ProjectionOptions {
        header: HeaderMode::Letters,
        ..Default::default()
    };
    let records = project_sheet(&sheet, &opts);
    assert_eq!(records.len(), 2);
    assert_eq!(keys(&records[0]), vec!["C", "D"]);
    assert_eq!(records[1].get("D"), Some(&n(2.0)));
}

#[test]
fn explicit_keys_ignore_extra_columns() {
    let opts = ProjectionOptions {
        header: HeaderMode::Keys(vec!["who".to_string(), "years".to_string()]),
        ..Default::default()
    };
    let records = project_sheet(&people(), &opts);
    // The header row is data in this mode.
    assert_eq!(records.len(), 4);
    assert_eq!(keys(&records[0]), vec!["who", "years"]);
    assert_eq!(records[1].get("who"), Some(&s("Ada")));
    assert_eq!(records[1].get("city"), None);
}

#[test]
fn start_row_moves_the_header() {
    let sheet = Sheet::new(
        (0, 0),
        vec![
            vec![s("Quarterly report")],
            vec![s("region"), s("total")],
            vec![s("North"), n(10.0)],
        ],
    );
    let opts = ProjectionOptions {
        range: Some(RowRange::StartRow(1)),
        ..Default::default()
    };
    let records = project_sheet(&sheet, &opts);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("region"), Some(&s("North")));
    assert_eq!(records[0].get("total"), Some(&n(10.0)));
}

#[test]
fn cell_range_selects_a_rectangle() {
    let range: CellRange = "B1:C3".parse().unwrap();
    let opts = ProjectionOptions {
        range: Some(RowRange::Cells(range)),
        ..Default::default()
    };
    let records = project_sheet(&people(), &opts);
    assert_eq!(records.len(), 2);
    assert_eq!(keys(&records[0]), vec!["age", "city"]);
    assert_eq!(records[1].get("city"), Some(&s("Arlington")));
}

#[test]
fn range_outside_the_sheet_yields_nothing() {
    let opts = ProjectionOptions {
        range: Some(RowRange::Cells("Z100:Z200".parse().unwrap())),
        ..Default::default()
    };
    assert!(project_sheet(&people(), &opts).is_empty());
    assert!(project_sheet(&Sheet::default(), &ProjectionOptions::default()).is_empty());
}

#[test]
fn header_only_sheet_has_no_records() {
    let sheet = Sheet::new((0, 0), vec![vec![s("a"), s("b")]]);
    assert!(project_sheet(&sheet, &ProjectionOptions::default()).is_empty());
}

#[test]
fn repeated_explicit_keys_collapse_to_the_last_value() {
    let sheet = Sheet::new(
        (0, 0),
        vec![
            vec![n(1.0), n(2.0), s("z")],
            vec![n(3.0), CellValue::Empty, s("w")],
        ],
    );
    let opts = ProjectionOptions {
        header: HeaderMode::Keys(vec!["x".to_string(), "x".to_string(), "y".to_string()]),
        ..Default::default()
    };
    let records = project_sheet(&sheet, &opts);
    assert_eq!(records.len(), 2);
    assert_eq!(keys(&records[0]), vec!["x", "y"]);
    assert_eq!(records[0].get("x"), Some(&n(2.0)));
    // An empty later column does not overwrite without a defval.
    assert_eq!(records[1].get("x"), Some(&n(3.0)));

    let with_defval = ProjectionOptions {
        defval: Some(CellValue::Empty),
        ..opts
    };
    let records = project_sheet(&sheet, &with_defval);
    assert_eq!(records[1].get("x"), Some(&CellValue::Empty));
    assert_eq!(records[1].len(), 2);
}
