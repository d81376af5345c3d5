//! Round-trips catalogs through real `.xlsx` bytes.
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use rust_xlsxwriter::{Format, Workbook};
use std::io::Cursor;

use nfkit_core::{
    CORRECTIONS_SHEET, Cell, DocumentShapeError, PipelineConfig, RowSubset, SheetLayout,
    VIOLATIONS_SHEET, columns, process,
};
use nfkit_excel::{
    ImportError, read_section_from_bytes, write_catalog, write_corrections, write_violations,
};

// ── helpers ──────────────────────────────────────────────────────────────────

const HEADER: [&str; 14] = [
    columns::INTERNAL_CODE,
    columns::PRODUCT_NAME,
    columns::BARCODE,
    columns::PRODUCT_GROUP,
    columns::UNIT_TYPE,
    columns::PRICE,
    columns::NCM,
    columns::CFOP,
    columns::CST,
    columns::CEST,
    columns::CST_PIS,
    columns::ALIQ_PIS,
    columns::CST_COFINS,
    columns::ALIQ_COFINS,
];

/// Builds a `PRODUTOS` workbook with a five-row preamble, the header on row 6
/// and two items: one valid after correction, one with a short NCM.
fn source_workbook(sheet: &str) -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(sheet).expect("name");
    ws.write_string(0, 0, "CADASTRO DE PRODUTOS").expect("write");
    ws.write_string(1, 0, "Loja").expect("write");
    ws.write_string(1, 1, "Centro").expect("write");
    for (c, h) in HEADER.iter().enumerate() {
        let col = u16::try_from(c).expect("col");
        ws.write_string(5, col, *h).expect("write");
    }

    let items: [[&str; 14]; 2] = [
        [
            "1", "Arroz", "", "Mercearia", "UN", "", "10063021", "5102", "060", "", "01",
            "1,65", "01", "7,6",
        ],
        [
            "2", "Feijao", "", "Mercearia", "UN", "8,00", "123", "5102", "060", "", "01",
            "1,65", "01", "7,6",
        ],
    ];
    for (r, item) in items.iter().enumerate() {
        let row = u32::try_from(6 + r).expect("row");
        for (c, value) in item.iter().enumerate() {
            if !value.is_empty() {
                let col = u16::try_from(c).expect("col");
                ws.write_string(row, col, *value).expect("write");
            }
        }
    }
    // Barcode as a number, price with three decimals.
    ws.write_number(6, 2, 7_891_000_100_103.0).expect("write");
    ws.write_number(6, 5, 4.999).expect("write");
    ws.write_number(7, 2, 7_891_000_100_104.0).expect("write");

    wb.save_to_buffer().expect("save")
}

fn sheet_rows(bytes: &[u8], sheet: &str) -> Vec<Vec<Data>> {
    let mut wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("open");
    let range = wb.worksheet_range(sheet).expect("sheet");
    range.rows().map(<[Data]>::to_vec).collect()
}

fn text(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Empty
        | Data::Bool(_)
        | Data::DateTime(_)
        | Data::DateTimeIso(_)
        | Data::DurationIso(_)
        | Data::Error(_) => String::new(),
    }
}

// ── import ───────────────────────────────────────────────────────────────────

#[test]
fn reads_section_case_insensitively() {
    let bytes = source_workbook("Produtos");
    let section = read_section_from_bytes(&bytes, &SheetLayout::default()).expect("read");
    assert_eq!(section.name, "Produtos");
    assert_eq!(section.grid.len(), 8);
    assert_eq!(
        section.grid.get(6, 2),
        Some(&Cell::number(7_891_000_100_103.0))
    );
}

#[test]
fn missing_section_lists_found_sheets() {
    let bytes = source_workbook("Planilha1");
    let err = read_section_from_bytes(&bytes, &SheetLayout::default()).expect_err("no section");
    match err {
        ImportError::Shape(DocumentShapeError::MissingSection { expected, found }) => {
            assert_eq!(expected, "PRODUTOS");
            assert_eq!(found, vec!["Planilha1".to_owned()]);
        }
        other => panic!("expected MissingSection, got {other:?}"),
    }
}

#[test]
fn corrupt_bytes_are_a_read_error() {
    let err = read_section_from_bytes(b"not a zip", &SheetLayout::default()).expect_err("corrupt");
    assert!(matches!(err, ImportError::ExcelRead { .. }));
}

#[test]
fn numeric_barcode_becomes_identifier_text() {
    let bytes = source_workbook("PRODUTOS");
    let section = read_section_from_bytes(&bytes, &SheetLayout::default()).expect("read");
    let processed = process(&section, &PipelineConfig::default()).expect("process");
    assert_eq!(
        processed.original_rows[0].text(columns::BARCODE),
        "7891000100103"
    );
    assert_eq!(processed.corrected_rows[0].text(columns::PRICE), "5,00");
}

#[test]
fn zero_padded_number_formats_keep_leading_zeros() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("PRODUTOS").expect("name");
    for (c, h) in HEADER.iter().enumerate() {
        let col = u16::try_from(c).expect("col");
        ws.write_string(5, col, *h).expect("write");
    }
    let item = [
        (0, "1"),
        (1, "Leite"),
        (3, "Laticinios"),
        (4, "UN"),
        (5, "4,50"),
        (7, "5102"),
        (10, "01"),
        (11, "1,65"),
        (12, "01"),
        (13, "7,6"),
    ];
    for (col, value) in item {
        ws.write_string(6, col, value).expect("write");
    }
    // NCM and CST typed as numbers, shown padded through their formats.
    let ncm = Format::new().set_num_format("00000000");
    let cst = Format::new().set_num_format("000");
    ws.write_number_with_format(6, 6, 1_012_100.0, &ncm).expect("write");
    ws.write_number_with_format(6, 8, 60.0, &cst).expect("write");
    let bytes = wb.save_to_buffer().expect("save");

    let section = read_section_from_bytes(&bytes, &SheetLayout::default()).expect("read");
    assert_eq!(section.grid.get(6, 6).map(Cell::display), Some("01012100"));
    assert_eq!(section.grid.get(6, 8).map(Cell::display), Some("060"));

    let processed = process(&section, &PipelineConfig::default()).expect("process");
    assert_eq!(processed.corrected_rows[0].text(columns::NCM), "01012100");
    assert_eq!(processed.corrected_rows[0].text(columns::CST), "060");
    assert!(processed.after.is_clean());
}

// ── export ───────────────────────────────────────────────────────────────────

#[test]
fn catalog_export_keeps_preamble_and_layout() {
    let bytes = source_workbook("PRODUTOS");
    let section = read_section_from_bytes(&bytes, &SheetLayout::default()).expect("read");
    let processed = process(&section, &PipelineConfig::default()).expect("process");
    let export = nfkit_core::catalog_export(&processed, RowSubset::Valid);

    let mut out = Vec::new();
    write_catalog(&export, &mut out).expect("write");

    let rows = sheet_rows(&out, "PRODUTOS");
    assert_eq!(rows.len(), 7);
    assert_eq!(text(&rows[0][0]), "CADASTRO DE PRODUTOS");
    assert_eq!(text(&rows[1][1]), "Centro");
    assert_eq!(text(&rows[5][0]), columns::INTERNAL_CODE);
    assert_eq!(text(&rows[6][0]), "1");
    assert_eq!(rows[6][2], Data::String("7891000100103".to_owned()));
    assert_eq!(rows[6][5], Data::String("5,00".to_owned()));

    // The exported file reads back as a valid catalog.
    let again = read_section_from_bytes(&out, &SheetLayout::default()).expect("reread");
    let reprocessed = process(&again, &PipelineConfig::default()).expect("process");
    assert!(reprocessed.corrections.is_empty());
    assert!(reprocessed.after.is_clean());
}

#[test]
fn correction_table_has_fixed_headers() {
    let bytes = source_workbook("PRODUTOS");
    let section = read_section_from_bytes(&bytes, &SheetLayout::default()).expect("read");
    let processed = process(&section, &PipelineConfig::default()).expect("process");
    let records = nfkit_core::correction_records(&processed.corrections);

    let mut out = Vec::new();
    write_corrections(&records, &mut out).expect("write");

    let rows = sheet_rows(&out, CORRECTIONS_SHEET);
    let header: Vec<String> = rows[0].iter().map(text).collect();
    assert_eq!(header, ["Linha", "Coluna", "Antes", "Depois"]);
    assert_eq!(rows.len(), records.len() + 1);
    assert_eq!(rows[1][0], Data::Float(7.0));
    assert_eq!(text(&rows[1][1]), columns::PRICE);
    assert_eq!(text(&rows[1][3]), "5,00");
}

#[test]
fn violation_table_has_one_row_per_violation() {
    let bytes = source_workbook("PRODUTOS");
    let section = read_section_from_bytes(&bytes, &SheetLayout::default()).expect("read");
    let processed = process(&section, &PipelineConfig::default()).expect("process");
    let records = nfkit_core::violation_records(&processed.after);
    assert_eq!(records.len(), 1);

    let mut out = Vec::new();
    write_violations(&records, &mut out).expect("write");

    let rows = sheet_rows(&out, VIOLATIONS_SHEET);
    assert_eq!(rows.len(), 2);
    assert_eq!(text(&rows[0][4]), "Valor Atual");
    assert_eq!(rows[1][0], Data::Float(8.0));
    assert_eq!(text(&rows[1][1]), "2");
    assert_eq!(text(&rows[1][2]), "Feijao");
    assert_eq!(text(&rows[1][3]), columns::NCM);
    assert_eq!(text(&rows[1][4]), "\"123\"");
    assert_eq!(text(&rows[1][5]), "deve conter exatamente 8 dígitos");
}
