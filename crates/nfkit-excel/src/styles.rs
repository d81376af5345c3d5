/// Number formats of worksheet cells, read from the raw `.xlsx` package.
///
/// calamine decodes cell values but not their number formats. Codes stored
/// as numbers with a zero-padded format (`00000000` for an NCM, `000` for a
/// CST) only show their leading zeros through that format, so the format
/// code of every styled cell is resolved here: the sheet part is located via
/// `xl/workbook.xml` and its relationships, and `s=` style indices are mapped
/// through `cellXfs` and `numFmts` in `xl/styles.xml`.
use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// Errors while resolving cell formats.
#[derive(Debug, thiserror::Error)]
pub enum StylesError {
    /// The package is not a readable ZIP.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A package part is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// A part could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The workbook part does not name the sheet, or its part is missing.
    #[error("no worksheet part for sheet {0:?}")]
    MissingSheet(String),
}

impl From<quick_xml::events::attributes::AttrError> for StylesError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::InvalidAttr(e))
    }
}

/// Format codes of the styled cells of one worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellFormats {
    codes: HashMap<(u32, u32), String>,
}

impl CellFormats {
    /// Format code of the cell at zero-based `(row, col)`, if it has one
    /// other than `General`.
    pub fn get(&self, row: u32, col: u32) -> Option<&str> {
        self.codes.get(&(row, col)).map(String::as_str)
    }

    /// Number of cells with a format code.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` when no cell has a format code.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Resolves the number format of every styled cell of `sheet`.
///
/// # Errors
///
/// [`StylesError`] when the package or one of the parts involved cannot be
/// read.
pub fn read_cell_formats(bytes: &[u8], sheet: &str) -> Result<CellFormats, StylesError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook = read_part(&mut archive, WORKBOOK_PART)?;
    let rel_id = sheet_rel_id(&workbook, sheet)?
        .ok_or_else(|| StylesError::MissingSheet(sheet.to_owned()))?;
    let rels = read_part(&mut archive, WORKBOOK_RELS_PART)?;
    let target = rel_target(&rels, &rel_id)?
        .ok_or_else(|| StylesError::MissingSheet(sheet.to_owned()))?;
    let sheet_xml = read_part(&mut archive, &part_path(&target))?;

    // Workbooks written without any styling have no styles part.
    let style_codes = if archive.file_names().any(|name| name == STYLES_PART) {
        style_codes(&read_part(&mut archive, STYLES_PART)?)?
    } else {
        Vec::new()
    };

    let codes = cell_codes(&sheet_xml, &style_codes)?;
    tracing::debug!(sheet, cells = codes.len(), "resolved cell number formats");
    Ok(CellFormats { codes })
}

/// Renders `value` with a zero-padded format code such as `000` or
/// `00000000.00`.
///
/// Only the first section of the code is considered. Returns `None` for
/// negative or non-finite values and for every other kind of format, which
/// leaves the default rendering in place.
pub fn format_number(value: f64, code: &str) -> Option<String> {
    let section = code.split(';').next().unwrap_or(code).trim();
    let (int_part, frac_part) = section.split_once('.').unwrap_or((section, ""));
    let zeros = |s: &str| s.bytes().all(|b| b == b'0');
    if int_part.is_empty() || !zeros(int_part) || !zeros(frac_part) {
        return None;
    }
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let decimals = frac_part.len();
    let width = int_part.len() + if decimals > 0 { decimals + 1 } else { 0 };
    Some(format!("{value:0width$.decimals$}"))
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, StylesError> {
    let mut file = archive.by_name(name)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// `Target` values are relative to `xl/` unless they start with `/`.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None => format!("xl/{target}"),
    }
}

/// Built-in format codes that [`format_number`] can render.
fn builtin_code(id: u32) -> Option<&'static str> {
    match id {
        1 => Some("0"),
        2 => Some("0.00"),
        _ => None,
    }
}

fn attr(
    e: &BytesStart<'_>,
    local: &[u8],
    reader: &Reader<&[u8]>,
) -> Result<Option<String>, StylesError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == local {
            return Ok(Some(a.decode_and_unescape_value(reader)?.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship id of the `<sheet>` named `sheet`.
fn sheet_rel_id(xml: &str, sheet: &str) -> Result<Option<String>, StylesError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if attr(&e, b"name", &reader)?.as_deref() == Some(sheet) {
                    return attr(&e, b"id", &reader);
                }
            }
            Event::Eof => return Ok(None),
            Event::Start(_)
            | Event::Empty(_)
            | Event::End(_)
            | Event::Text(_)
            | Event::CData(_)
            | Event::Comment(_)
            | Event::Decl(_)
            | Event::PI(_)
            | Event::DocType(_) => {}
        }
    }
}

/// `Target` of the relationship with `Id == id`.
fn rel_target(xml: &str, id: &str) -> Result<Option<String>, StylesError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr(&e, b"Id", &reader)?.as_deref() == Some(id) {
                    return attr(&e, b"Target", &reader);
                }
            }
            Event::Eof => return Ok(None),
            Event::Start(_)
            | Event::Empty(_)
            | Event::End(_)
            | Event::Text(_)
            | Event::CData(_)
            | Event::Comment(_)
            | Event::Decl(_)
            | Event::PI(_)
            | Event::DocType(_) => {}
        }
    }
}

/// Format code per `cellXfs` index; `None` for `General` and unknown ids.
fn style_codes(xml: &str) -> Result<Vec<Option<String>>, StylesError> {
    let mut reader = Reader::from_str(xml);
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr(&e, b"numFmtId", &reader)?.and_then(|v| v.parse().ok());
                    let code = attr(&e, b"formatCode", &reader)?;
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id = attr(&e, b"numFmtId", &reader)?
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    xf_ids.push(id);
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Eof => break,
            Event::End(_)
            | Event::Text(_)
            | Event::CData(_)
            | Event::Comment(_)
            | Event::Decl(_)
            | Event::PI(_)
            | Event::DocType(_) => {}
        }
    }

    Ok(xf_ids
        .into_iter()
        .map(|id| {
            custom
                .get(&id)
                .cloned()
                .or_else(|| builtin_code(id).map(str::to_owned))
        })
        .collect())
}

/// Format codes of the `<c r=".." s="..">` cells of a worksheet part.
fn cell_codes(
    xml: &str,
    style_codes: &[Option<String>],
) -> Result<HashMap<(u32, u32), String>, StylesError> {
    let mut reader = Reader::from_str(xml);
    let mut codes = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let style = attr(&e, b"s", &reader)?.and_then(|v| v.parse::<usize>().ok());
                let Some(code) = style.and_then(|s| style_codes.get(s)).and_then(Option::as_ref)
                else {
                    continue;
                };
                if let Some(pos) = attr(&e, b"r", &reader)?.as_deref().and_then(cell_position) {
                    codes.insert(pos, code.clone());
                }
            }
            Event::Eof => break,
            Event::Start(_)
            | Event::Empty(_)
            | Event::End(_)
            | Event::Text(_)
            | Event::CData(_)
            | Event::Comment(_)
            | Event::Decl(_)
            | Event::PI(_)
            | Event::DocType(_) => {}
        }
    }
    Ok(codes)
}

/// Zero-based `(row, col)` of an `A1` reference.
fn cell_position(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add(u32::from(c) - u32::from('A') + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}
