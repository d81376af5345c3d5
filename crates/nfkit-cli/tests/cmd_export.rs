//! Integration tests for `nfkit export`.
#![allow(clippy::expect_used)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use rust_xlsxwriter::Workbook;

/// Path to the compiled `nfkit` binary.
fn nfkit_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("nfkit");
    path
}

const HEADER: [&str; 14] = [
    "Código Interno",
    "Nome Produto",
    "Código Barra",
    "Grupo Produto",
    "Tipo Unidade",
    "Preço",
    "NFCeNCM",
    "NFCeCFOP",
    "NFCeCST",
    "NFCeCEST",
    "NFCeCSTPIS",
    "NFCeAliqPIS",
    "NFCeCSTCOFINS",
    "NFCeAliqCOFINS",
];

/// A `Produtos` workbook with three items: one clean, one needing a name
/// correction, one with a short NCM. Barcodes are numeric cells.
fn catalog_workbook() -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Produtos").expect("name");
    ws.write_string(0, 0, "CADASTRO DE PRODUTOS").expect("write");
    ws.write_string(2, 0, "Filial").expect("write");
    ws.write_string(2, 1, "Centro").expect("write");
    for (c, h) in HEADER.iter().enumerate() {
        let col = u16::try_from(c).expect("col");
        ws.write_string(5, col, *h).expect("write");
    }

    let items: [(&str, &str, f64, &str); 3] = [
        ("1", "Arroz", 7_891_000_100_103.0, "10063021"),
        ("2", "Pão Francês", 7_891_000_100_110.0, "19052090"),
        ("3", "Feijao", 7_891_000_100_127.0, "123"),
    ];
    for (r, (code, name, barcode, ncm)) in items.iter().enumerate() {
        let row = u32::try_from(6 + r).expect("row");
        let fixed = [
            (0, *code),
            (1, *name),
            (3, "Mercearia"),
            (4, "UN"),
            (5, "10,50"),
            (6, *ncm),
            (7, "5102"),
            (8, "060"),
            (10, "01"),
            (11, "1,65"),
            (12, "01"),
            (13, "7,6"),
        ];
        for (col, value) in fixed {
            ws.write_string(row, col, value).expect("write");
        }
        ws.write_number(row, 2, *barcode).expect("write");
    }
    wb.save_to_buffer().expect("save")
}

fn sheet_rows(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let bytes = std::fs::read(path).expect("read output");
    let mut wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("open");
    let range = wb.worksheet_range(sheet).expect("sheet");
    range.rows().map(<[Data]>::to_vec).collect()
}

fn text(cell: &Data) -> String {
    cell.to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(nfkit_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("NFKIT_SECTION")
        .output()
        .expect("run nfkit export")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

fn fixture(dir: &Path) -> PathBuf {
    let path = dir.join("cadastro.xlsx");
    std::fs::write(&path, catalog_workbook()).expect("write fixture");
    path
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn export_writes_all_four_workbooks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = fixture(dir.path());
    let out_dir = dir.path().join("saida").join("lote1");

    let out = run(&["export", path_str(&input), "--out-dir", path_str(&out_dir)]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.matches("wrote ").count(), 4, "stdout: {stdout}");
    assert!(
        stdout.contains("3 rows, 2 valid, 1 invalid, 0 auto-adjusted, 1 corrections"),
        "stdout: {stdout}"
    );

    for name in [
        "produtos_validos.xlsx",
        "produtos_invalidos.xlsx",
        "detalhes_correcoes.xlsx",
        "inconsistencias_pos_correcao.xlsx",
    ] {
        assert!(out_dir.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn valid_workbook_keeps_layout_and_corrected_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = fixture(dir.path());
    let out_dir = dir.path().join("out");
    let out = run(&["export", path_str(&input), "--out-dir", path_str(&out_dir), "--valid"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let rows = sheet_rows(&out_dir.join("produtos_validos.xlsx"), "Produtos");
    assert_eq!(rows.len(), 8);
    assert_eq!(text(&rows[0][0]), "CADASTRO DE PRODUTOS");
    assert_eq!(text(&rows[2][1]), "Centro");
    assert_eq!(text(&rows[5][5]), "Preço");
    assert_eq!(rows[6][1], Data::String("Arroz".to_owned()));
    assert_eq!(rows[6][2], Data::String("7891000100103".to_owned()));
    assert_eq!(rows[7][1], Data::String("Pao Frances".to_owned()));
    assert!(!out_dir.join("inconsistencias_pos_correcao.xlsx").exists());
}

#[test]
fn invalid_and_violation_workbooks_describe_the_bad_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = fixture(dir.path());
    let out_dir = dir.path().join("out");
    let out = run(&[
        "export",
        path_str(&input),
        "--out-dir",
        path_str(&out_dir),
        "--invalid",
        "--violations",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let invalid = sheet_rows(&out_dir.join("produtos_invalidos.xlsx"), "Produtos");
    assert_eq!(invalid.len(), 7);
    assert_eq!(text(&invalid[6][1]), "Feijao");

    let errors = sheet_rows(&out_dir.join("inconsistencias_pos_correcao.xlsx"), "Erros");
    assert_eq!(errors.len(), 2);
    assert_eq!(text(&errors[0][0]), "Linha");
    assert_eq!(errors[1][0], Data::Float(9.0));
    assert_eq!(text(&errors[1][3]), "NFCeNCM");
    assert_eq!(text(&errors[1][4]), "\"123\"");
    assert!(!out_dir.join("produtos_validos.xlsx").exists());
}

#[test]
fn correction_workbook_lists_before_and_after() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = fixture(dir.path());
    let out_dir = dir.path().join("out");
    let out = run(&[
        "export",
        path_str(&input),
        "--out-dir",
        path_str(&out_dir),
        "--corrections",
        "--quiet",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());

    let rows = sheet_rows(&out_dir.join("detalhes_correcoes.xlsx"), "Correcoes");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], Data::Float(8.0));
    assert_eq!(text(&rows[1][1]), "Nome Produto");
    assert_eq!(text(&rows[1][2]), "Pão Francês");
    assert_eq!(text(&rows[1][3]), "Pao Frances");
}

#[test]
fn json_mode_reports_written_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = fixture(dir.path());
    let out_dir = dir.path().join("out");
    let out = run(&[
        "export",
        path_str(&input),
        "--out-dir",
        path_str(&out_dir),
        "--valid",
        "--format",
        "json",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let first: serde_json::Value =
        serde_json::from_str(stdout.lines().next().expect("line")).expect("json");
    let written = first["written"].as_str().expect("written path");
    assert!(written.ends_with("produtos_validos.xlsx"), "{written}");
}

#[test]
fn rejected_document_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("curto.xml");
    std::fs::write(&input, "<Planilha><Linha><Coluna>x</Coluna></Linha></Planilha>")
        .expect("write");
    let out_dir = dir.path().join("out");
    let out = run(&["export", path_str(&input), "--out-dir", path_str(&out_dir)]);
    assert_eq!(out.status.code(), Some(2));
    assert!(!out_dir.exists());
}
