//! Header names of the `PRODUTOS` catalog layout.
//!
//! Headers are matched after trimming and NFC normalization, so a workbook
//! that stores `Código` in decomposed form still maps onto these constants.

/// Internal product code; unique per catalog.
pub const INTERNAL_CODE: &str = "Código Interno";
/// Product description; unique, at most [`PRODUCT_NAME_MAX_CHARS`] characters.
pub const PRODUCT_NAME: &str = "Nome Produto";
/// EAN/GTIN barcode; kept as exact text.
pub const BARCODE: &str = "Código Barra";
/// Product group; alphanumeric only.
pub const PRODUCT_GROUP: &str = "Grupo Produto";
/// Two-letter unit of measure.
pub const UNIT_TYPE: &str = "Tipo Unidade";
/// Sale price.
pub const PRICE: &str = "Preço";
/// Mercosur nomenclature code (8 digits).
pub const NCM: &str = "NFCeNCM";
/// Fiscal operation code (4 digits).
pub const CFOP: &str = "NFCeCFOP";
/// ICMS tax-situation code (3 digits).
pub const CST: &str = "NFCeCST";
/// Tax-substitution specifier code (7 digits).
pub const CEST: &str = "NFCeCEST";
/// PIS tax-situation code.
pub const CST_PIS: &str = "NFCeCSTPIS";
/// PIS rate.
pub const ALIQ_PIS: &str = "NFCeAliqPIS";
/// COFINS tax-situation code.
pub const CST_COFINS: &str = "NFCeCSTCOFINS";
/// COFINS rate.
pub const ALIQ_COFINS: &str = "NFCeAliqCOFINS";

/// Maximum product name length, in characters.
pub const PRODUCT_NAME_MAX_CHARS: usize = 40;

/// ICMS situation code that makes [`CEST`] mandatory.
pub const CST_WITH_SUBSTITUTION: &str = "110";

/// Columns whose numeric cells are identifiers and must be captured as
/// exact integer text.
pub const IDENTIFIER_COLUMNS: &[&str] = &[BARCODE];

/// Decimal-rate columns rewritten with a comma separator.
pub const RATE_COLUMNS: &[&str] = &[ALIQ_PIS, ALIQ_COFINS];

/// Columns written as text (`@` number format) on export.
pub const TEXT_EXPORT_COLUMNS: &[&str] = &[BARCODE, PRODUCT_GROUP, PRICE];
