use std::path::PathBuf;

use chrono::NaiveDate;
use sheet_nodes::graph::{FileNode, MemoryHost, NodeKind};
use sheet_nodes::ingestion::{decode_workbook, on_create_node, IngestionOptions};
use sheet_nodes::types::CellValue;
use sheet_nodes::IngestionError;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn date(y: i32, m: u32, d: u32) -> CellValue {
    CellValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
}

#[test]
fn spreadsheet_xml_sheets_and_typed_cells() {
    let bytes = std::fs::read(fixture("inventory.xml")).unwrap();
    let wb = decode_workbook(&bytes, "xml").unwrap();
    assert_eq!(wb.sheet_names(), ["Stock".to_string(), "Notes".to_string()]);

    let stock = wb.sheet("Stock").unwrap();
    assert_eq!(stock.origin, (0, 0));
    assert_eq!(stock.cell(1, 0), &CellValue::from("A-1 & B"));
    assert_eq!(stock.cell(1, 1), &CellValue::Number(12.0));
    assert_eq!(stock.cell(1, 2), &date(2024, 2, 29));
    assert_eq!(stock.cell(1, 3), &CellValue::Bool(true));
    // ss:Index jumps over the empty cells.
    assert_eq!(stock.cell(2, 1), &CellValue::Empty);
    assert_eq!(stock.cell(2, 3), &CellValue::Bool(false));

    let notes = wb.sheet("Notes").unwrap();
    assert_eq!(notes.origin, (1, 1));
    assert_eq!(notes.cell(2, 1), &CellValue::from("check counts"));
}

#[test]
fn spreadsheet_xml_end_to_end() {
    let host = MemoryHost::new();
    let file = FileNode::from_path("file-1", fixture("inventory.xml"));
    on_create_node(&file, &host, &IngestionOptions::default()).unwrap();

    let graph = host.snapshot();
    let sheets = graph.nodes_of_kind(NodeKind::Worksheet);
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].name.as_deref(), Some("Stock"));
    assert_eq!(sheets[1].name.as_deref(), Some("Notes"));

    let stock_rows = graph.children_of(&sheets[0].id);
    assert_eq!(stock_rows.len(), 2);
    assert_eq!(stock_rows[0].field("sku"), Some(&CellValue::from("A-1 & B")));
    assert_eq!(stock_rows[0].field("restocked"), Some(&date(2024, 2, 29)));
    assert_eq!(stock_rows[1].field("qty"), None);
    assert_eq!(stock_rows[1].field("active"), Some(&CellValue::Bool(false)));

    let note_rows = graph.children_of(&sheets[1].id);
    assert_eq!(note_rows.len(), 1);
    assert_eq!(note_rows[0].field("note"), Some(&CellValue::from("check counts")));
}

#[test]
fn flat_ods_expands_repeats_and_keeps_empty_sheets() {
    let bytes = std::fs::read(fixture("budget.fods")).unwrap();
    let wb = decode_workbook(&bytes, "fods").unwrap();
    assert_eq!(wb.sheet_names(), ["Budget".to_string(), "Empty".to_string()]);

    let budget = wb.sheet("Budget").unwrap();
    // Trailing repeated empty rows and cells are not materialized.
    assert_eq!(budget.height(), 4);
    assert_eq!(budget.width(), 3);
    assert_eq!(budget.cell(1, 1), &CellValue::Number(1200.5));
    assert_eq!(budget.cell(2, 2), &CellValue::Bool(true));
    assert_eq!(budget.cell(3, 0), &CellValue::from("trip\nto Oslo"));
    assert_eq!(budget.cell(3, 1), &date(2024, 5, 17));

    assert!(wb.sheet("Empty").unwrap().is_empty());
}

#[test]
fn flat_ods_end_to_end() {
    let host = MemoryHost::new();
    let file = FileNode::from_path("file-1", fixture("budget.fods"));
    on_create_node(&file, &host, &IngestionOptions::default()).unwrap();

    let graph = host.snapshot();
    let sheets = graph.nodes_of_kind(NodeKind::Worksheet);
    assert_eq!(sheets.len(), 2);
    assert!(sheets[1].children.is_empty());

    let rows = graph.children_of(&sheets[0].id);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].field("item"), Some(&CellValue::from("rent")));
    assert_eq!(rows[1].field("cost"), Some(&CellValue::Number(1200.5)));
    assert_eq!(rows[2].field("paid"), None);
    assert_ne!(rows[0].id, rows[1].id);
    assert_eq!(rows[0].content_digest(), rows[1].content_digest());
}

#[test]
fn malformed_xml_is_an_error() {
    let err = decode_workbook(b"<Workbook><Worksheet ss:Name=\"A\"><Table></Worksheet>", "xml").unwrap_err();
    assert!(matches!(err, IngestionError::Xml(_)));
}

#[test]
fn xml_without_sheets_is_a_decode_error() {
    let err = decode_workbook(b"<?xml version=\"1.0\"?><Workbook/>", "xml").unwrap_err();
    assert!(matches!(err, IngestionError::Decode { .. }));
}

#[test]
fn duplicate_sheet_names_are_rejected() {
    let xml = br#"<Workbook><Worksheet ss:Name="A"/><Worksheet ss:Name="A"/></Workbook>"#;
    let err = decode_workbook(xml, "xml").unwrap_err();
    assert!(matches!(err, IngestionError::Decode { .. }));
}

#[test]
fn cell_comments_do_not_leak_into_values() {
    let xml = br#"<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet"
 xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
 <Worksheet ss:Name="Audit">
  <Table>
   <Row>
    <Cell><Data ss:Type="Number">42</Data><Comment ss:Author="qa"><ss:Data>check me</ss:Data></Comment></Cell>
    <Cell><Comment><ss:Data><B>only</B> a note</ss:Data></Comment></Cell>
    <Cell><Data ss:Type="String">after</Data></Cell>
   </Row>
  </Table>
 </Worksheet>
</Workbook>"#;
    let wb = decode_workbook(xml, "xml").unwrap();
    let audit = wb.sheet("Audit").unwrap();
    assert_eq!(audit.cell(0, 0), &CellValue::Number(42.0));
    assert_eq!(audit.cell(0, 1), &CellValue::Empty);
    assert_eq!(audit.cell(0, 2), &CellValue::from("after"));
}

#[test]
fn repeated_wide_rows_are_capped_before_materializing() {
    let fods = br#"<office:document xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
 xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0"
 xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0">
 <office:body><office:spreadsheet>
  <table:table table:name="Huge">
   <table:table-row table:number-rows-repeated="1048575">
    <table:table-cell table:number-columns-repeated="1024" office:value-type="string"><text:p>x</text:p></table:table-cell>
   </table:table-row>
  </table:table>
 </office:spreadsheet></office:body>
</office:document>"#;
    let err = decode_workbook(fods, "fods").unwrap_err();
    match err {
        IngestionError::Decode { message } => assert!(message.contains("cells"), "{message}"),
        other => panic!("expected Decode, got {other:?}"),
    }
}
