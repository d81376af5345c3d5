/// Per-cell predicate evaluation.
///
/// Messages are the pt-BR strings shown to catalog operators.
use crate::number::coerce_decimal;
use crate::row::Row;
use crate::rules::Predicate;

/// Message for [`Predicate::Required`].
pub const REQUIRED_MESSAGE: &str = "é obrigatório";

/// Message for [`Predicate::RequiredIf`].
pub const REQUIRED_IF_MESSAGE: &str = "é obrigatório para este CST";

/// Evaluates one predicate against `column` of `row`.
///
/// Returns the violation message, or `None` when the predicate holds.
/// [`Predicate::Unique`] always returns `None`: it is a cross-row check
/// handled by the caller.
pub fn evaluate(predicate: &Predicate, row: &Row, column: &str) -> Option<String> {
    let raw = row.text(column);
    let trimmed = raw.trim();
    let blank = trimmed.is_empty();

    match predicate {
        Predicate::Required => is_absent(trimmed).then(|| REQUIRED_MESSAGE.to_owned()),
        Predicate::RequiredIf {
            column: gate,
            equals,
        } => (row.trimmed(gate) == equals && is_absent(trimmed))
            .then(|| REQUIRED_IF_MESSAGE.to_owned()),
        Predicate::Unique => None,
        Predicate::Digits { count } => {
            let ok = trimmed.bytes().all(|b| b.is_ascii_digit()) && trimmed.len() == *count;
            (!blank && !ok).then(|| format!("deve conter exatamente {count} dígitos"))
        }
        Predicate::Length { count } => (!blank && trimmed.chars().count() != *count)
            .then(|| format!("deve ter exatamente {count} caracteres")),
        Predicate::MaxLength { count } => (!blank && trimmed.chars().count() > *count)
            .then(|| format!("ultrapassa {count} caracteres")),
        Predicate::Min { threshold } => {
            if blank {
                // Blankness is reported by Required.
                return None;
            }
            match coerce_decimal(trimmed) {
                Some(n) if n >= *threshold => None,
                Some(_) | None => Some(format!("inválido (mínimo {threshold})")),
            }
        }
        Predicate::Pattern { regex } => (!blank && !regex.is_match(raw))
            .then(|| "possui caracteres inválidos".to_owned()),
    }
}

/// Blank, or numerically zero.
///
/// Zero counts as absent on purpose: the required columns hold tax codes and
/// amounts, and `0` is never a legitimate value for any of them.
pub fn is_absent(trimmed: &str) -> bool {
    trimmed.is_empty() || coerce_decimal(trimmed) == Some(0.0)
}

/// `duplicado nas linhas 7, 9`.
pub fn duplicate_message(lines: &[u32]) -> String {
    let joined: Vec<String> = lines.iter().map(u32::to_string).collect();
    format!("duplicado nas linhas {}", joined.join(", "))
}
