#![allow(clippy::expect_used)]

use super::*;
use crate::grid::Cell;
use crate::rules::Rule;

// ── helpers ──────────────────────────────────────────────────────────────────

/// A row that passes every catalog rule.
fn valid_row(index: usize, code: &str, name: &str, barcode: &str) -> Row {
    let line = u32::try_from(index + 7).expect("line");
    Row::new(index, line)
        .with(columns::INTERNAL_CODE, code)
        .with(columns::PRODUCT_NAME, name)
        .with(columns::BARCODE, barcode)
        .with(columns::PRODUCT_GROUP, "Mercearia")
        .with(columns::UNIT_TYPE, "UN")
        .with(columns::PRICE, "10,50")
        .with(columns::NCM, "10063021")
        .with(columns::CFOP, "5102")
        .with(columns::CST, "060")
        .with(columns::CEST, "")
        .with(columns::CST_PIS, "01")
        .with(columns::ALIQ_PIS, "1,65")
        .with(columns::CST_COFINS, "01")
        .with(columns::ALIQ_COFINS, "7,6")
}

fn set(mut row: Row, column: &str, value: impl Into<Cell>) -> Row {
    row.insert(column, value.into());
    row
}

// ── basic behaviour ──────────────────────────────────────────────────────────

#[test]
fn valid_rows_produce_clean_result() {
    let rows = vec![
        valid_row(0, "1", "Arroz", "7890000000001"),
        valid_row(1, "2", "Feijao", "7890000000002"),
    ];
    let result = validate(&rows, &RuleTable::catalog());
    assert!(result.is_clean(), "{result:?}");
}

#[test]
fn blank_rows_are_ignored() {
    let blank = Row::new(0, 7)
        .with(columns::INTERNAL_CODE, "")
        .with(columns::PRICE, "  ");
    let result = validate(&[blank], &RuleTable::catalog());
    assert!(result.is_clean());
}

#[test]
fn one_cell_can_fail_several_predicates() {
    let row = set(
        valid_row(0, "1", "Arroz", "1"),
        columns::CST_PIS,
        "0",
    );
    let result = validate(&[row], &RuleTable::catalog());
    let checks: Vec<Check> = result.violations().map(|v| v.check).collect();
    assert_eq!(checks, vec![Check::Required, Check::Digits, Check::Min]);
    let first = result.violations().next().expect("violation");
    assert_eq!(first.value, "\"0\"");
    assert_eq!(first.message, "é obrigatório");
}

#[test]
fn blank_value_is_displayed_as_vazio() {
    let row = set(valid_row(0, "1", "Arroz", "1"), columns::UNIT_TYPE, "");
    let result = validate(&[row], &RuleTable::catalog());
    let v = result.violations().next().expect("violation");
    assert_eq!(v.column, columns::UNIT_TYPE);
    assert_eq!(v.value, "vazio");
    assert_eq!(v.to_string(), "linha 7 Tipo Unidade: vazio é obrigatório");
}

#[test]
fn row_group_carries_identifiers() {
    let row = set(valid_row(0, "A-1", "Arroz", "1"), columns::NCM, "123");
    let result = validate(&[row], &RuleTable::catalog());
    let group = result.for_line(7).expect("row 7");
    assert_eq!(group.internal_code.as_deref(), Some("A-1"));
    assert_eq!(group.product_name.as_deref(), Some("Arroz"));
    assert_eq!(
        group.violations[0].message,
        "deve conter exatamente 8 dígitos"
    );
}

// ── conditional requirement ──────────────────────────────────────────────────

#[test]
fn cest_required_when_cst_is_110() {
    let row = set(valid_row(0, "1", "Arroz", "1"), columns::CST, "110");
    let result = validate(&[row], &RuleTable::catalog());
    let violations: Vec<&Violation> = result.violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].column, columns::CEST);
    assert_eq!(violations[0].check, Check::RequiredIf);
    assert_eq!(violations[0].message, "é obrigatório para este CST");
}

#[test]
fn cest_not_required_for_other_cst() {
    for cst in ["060", "111", "010"] {
        let row = set(valid_row(0, "1", "Arroz", "1"), columns::CST, cst);
        let result = validate(&[row], &RuleTable::catalog());
        assert!(result.is_clean(), "cst {cst}: {result:?}");
    }
}

#[test]
fn cest_present_with_cst_110_is_valid() {
    let row = set(valid_row(0, "1", "Arroz", "1"), columns::CST, "110");
    let row = set(row, columns::CEST, "0300100");
    assert!(validate(&[row], &RuleTable::catalog()).is_clean());
}

// ── uniqueness ───────────────────────────────────────────────────────────────

#[test]
fn shared_barcode_flags_both_rows_with_both_lines() {
    let rows = vec![
        valid_row(0, "1", "Arroz", "7890000000001"),
        valid_row(1, "2", "Feijao", "7890000000009"),
        valid_row(2, "3", "Milho", " 7890000000001 "),
    ];
    let result = validate(&rows, &RuleTable::catalog());
    let dups: Vec<&Violation> = result.by_check(Check::Unique).collect();
    assert_eq!(dups.len(), 2);
    for v in &dups {
        assert_eq!(v.column, columns::BARCODE);
        assert_eq!(v.duplicate_lines, vec![7, 9]);
        assert_eq!(v.message, "duplicado nas linhas 7, 9");
        assert_eq!(v.value, "\"7890000000001\"");
    }
    assert_eq!(result.invalid_indices().into_iter().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn duplicates_follow_row_violations_and_rows_sort_by_line() {
    let rows = vec![
        set(valid_row(0, "1", "Arroz", "9"), columns::UNIT_TYPE, "U"),
        valid_row(1, "2", "Feijao", "8"),
        valid_row(2, "3", "Milho", "9"),
    ];
    let result = validate(&rows, &RuleTable::catalog());
    let lines: Vec<u32> = result.rows.iter().map(|r| r.row.line).collect();
    assert_eq!(lines, vec![7, 9]);
    let first = &result.rows[0].violations;
    assert_eq!(first[0].check, Check::Length);
    assert_eq!(first[1].check, Check::Unique);
}

#[test]
fn blank_values_are_never_duplicates() {
    let rows = vec![
        valid_row(0, "1", "Arroz", ""),
        valid_row(1, "2", "Feijao", " "),
    ];
    let result = validate(&rows, &RuleTable::catalog());
    assert!(result.is_clean());
}

// ── other predicates ─────────────────────────────────────────────────────────

#[test]
fn product_name_over_forty_chars() {
    let long = "x".repeat(41);
    let row = valid_row(0, "1", &long, "1");
    let result = validate(&[row], &RuleTable::catalog());
    let v = result.violations().next().expect("violation");
    assert_eq!(v.check, Check::MaxLength);
    assert_eq!(v.message, "ultrapassa 40 caracteres");
}

#[test]
fn group_with_spaces_fails_pattern() {
    let row = set(valid_row(0, "1", "Arroz", "1"), columns::PRODUCT_GROUP, "Cama e Banho");
    let result = validate(&[row], &RuleTable::catalog());
    let v = result.violations().next().expect("violation");
    assert_eq!(v.check, Check::Pattern);
    assert_eq!(v.message, "possui caracteres inválidos");
}

#[test]
fn price_below_minimum() {
    let row = set(valid_row(0, "1", "Arroz", "1"), columns::PRICE, "0,001");
    let result = validate(&[row], &RuleTable::catalog());
    let v = result.violations().next().expect("violation");
    assert_eq!(v.check, Check::Min);
    assert_eq!(v.message, "inválido (mínimo 0.01)");
}

#[test]
fn relaxed_variant_accepts_zero_padded_cst_below_one() {
    let row = set(valid_row(0, "1", "Arroz", "1"), columns::CST_PIS, "00");
    let standard = validate(std::slice::from_ref(&row), &RuleTable::catalog());
    let relaxed = validate(&[row], &RuleTable::catalog_without_cst_minimum());
    assert!(standard.by_check(Check::Min).count() == 1);
    assert!(relaxed.by_check(Check::Min).count() == 0);
    // "00" is still zero, so Required fires under both variants.
    assert_eq!(relaxed.by_check(Check::Required).count(), 1);
}

#[test]
fn custom_table_is_honoured() {
    let table = RuleTable::new(vec![Rule::new("Cor", vec![Predicate::Required])]);
    let row = Row::new(0, 7).with("Cor", "").with("Outro", "x");
    let result = validate(&[row], &table);
    assert_eq!(result.violation_count(), 1);
}

#[test]
fn validation_is_deterministic() {
    let rows = vec![
        valid_row(0, "1", "Arroz", "5"),
        set(valid_row(1, "1", "Arroz", "5"), columns::NCM, ""),
        valid_row(2, "1", "Milho", "5"),
    ];
    let a = validate(&rows, &RuleTable::catalog());
    let b = validate(&rows, &RuleTable::catalog());
    assert_eq!(a, b);
}
