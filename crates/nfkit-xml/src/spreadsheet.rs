/// Grid reader for spreadsheet-shaped XML.
///
/// Two layouts are understood:
///
/// - the plain export layout, `<Planilha><Linha><Coluna>text</Coluna>..`,
///   which holds a single unnamed grid;
/// - Excel 2003 SpreadsheetML, `<Workbook><Worksheet ss:Name=".."><Table>
///   <Row><Cell><Data ss:Type="..">`, with sparse `ss:Index` positions on rows
///   and cells.
///
/// Namespace prefixes are ignored; elements are matched by local name.
/// Values are trimmed the way the export tool trims them.
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use nfkit_core::{Cell, Grid, Section, SheetLayout, find_section};

use crate::error::XmlError;

/// Largest `ss:Index` honoured on a row (Excel's row limit).
const MAX_ROW_INDEX: usize = 1_048_576;
/// Largest `ss:Index` honoured on a cell (Excel's column limit).
const MAX_COL_INDEX: usize = 16_384;

/// Reads the catalog section of a spreadsheet XML document.
///
/// A `Planilha` document has exactly one grid, which is returned under the
/// layout's section name. A SpreadsheetML workbook is searched for a worksheet
/// whose `ss:Name` matches the section, case-insensitively.
///
/// # Errors
///
/// - [`XmlError::Parse`] for malformed XML or an out-of-range `ss:Index`.
/// - [`XmlError::UnsupportedLayout`] for any other root element.
/// - [`XmlError::Shape`] when no worksheet matches the section name.
pub fn read_xml_grid(xml: &str, layout: &SheetLayout) -> Result<Section, XmlError> {
    let doc = parse(xml)?;
    match doc.root {
        Root::Planilha => {
            let grid = doc
                .sheets
                .into_iter()
                .next()
                .map(|(_, grid)| grid)
                .unwrap_or_default();
            Ok(Section::new(layout.section.clone(), grid))
        }
        Root::Workbook => {
            let mut sheets = doc.sheets;
            let names: Vec<&str> = sheets.iter().map(|(name, _)| name.as_str()).collect();
            let index = find_section(&names, layout)?;
            let (name, grid) = sheets.swap_remove(index);
            tracing::debug!(sheet = %name, rows = grid.len(), "decoded XML worksheet");
            Ok(Section::new(name, grid))
        }
    }
}

// ---------------------------------------------------------------------------
// Event-driven parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Planilha,
    Workbook,
}

struct Document {
    root: Root,
    sheets: Vec<(String, Grid)>,
}

#[derive(Default)]
struct PendingCell {
    text: String,
    number: bool,
}

impl PendingCell {
    /// Numeric data keeps the text as written so long codes survive.
    fn finish(self) -> Cell {
        if self.number {
            let text = self.text.trim();
            if let Ok(value) = text.parse::<f64>() {
                return Cell::Number {
                    value,
                    text: text.to_owned(),
                };
            }
        }
        Cell::from(self.text)
    }
}

#[derive(Default)]
struct Builder {
    root: Option<Root>,
    sheets: Vec<(String, Grid)>,
    sheet_name: String,
    rows: Vec<Vec<Cell>>,
    row: Option<Vec<Cell>>,
    cell: Option<PendingCell>,
    capture: bool,
    comment_depth: usize,
}

fn parse(xml: &str) -> Result<Document, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut b = Builder::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => b.open(&e, false, &reader)?,
            Event::Empty(e) => b.open(&e, true, &reader)?,
            Event::End(e) => b.close(e.local_name().as_ref()),
            Event::Text(t) => {
                if b.capture {
                    let text = t.unescape()?;
                    b.push_text(&text);
                }
            }
            Event::CData(t) => {
                if b.capture {
                    let raw = t.into_inner();
                    b.push_text(&String::from_utf8_lossy(&raw));
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    let root = b.root.ok_or_else(|| XmlError::UnsupportedLayout {
        root: String::new(),
    })?;
    if root == Root::Planilha && b.sheets.is_empty() {
        b.end_sheet();
    }
    Ok(Document {
        root,
        sheets: b.sheets,
    })
}

impl Builder {
    fn open(
        &mut self,
        e: &BytesStart<'_>,
        empty: bool,
        reader: &Reader<&[u8]>,
    ) -> Result<(), XmlError> {
        let name = e.local_name();
        let name = name.as_ref();

        let Some(root) = self.root else {
            self.root = Some(match name {
                b"Planilha" => Root::Planilha,
                b"Workbook" => Root::Workbook,
                other => {
                    return Err(XmlError::UnsupportedLayout {
                        root: String::from_utf8_lossy(other).into_owned(),
                    });
                }
            });
            return Ok(());
        };

        if self.comment_depth > 0 {
            if !empty {
                self.comment_depth += 1;
            }
            return Ok(());
        }

        match (root, name) {
            (Root::Workbook, b"Worksheet") => {
                self.rows.clear();
                self.sheet_name = attr(e, b"Name", reader)?.unwrap_or_default();
                if empty {
                    self.end_sheet();
                }
            }
            (Root::Workbook, b"Row") | (Root::Planilha, b"Linha") => {
                if let Some(index) = index_attr(e, MAX_ROW_INDEX, reader)? {
                    pad(&mut self.rows, index);
                }
                self.row = Some(Vec::new());
                if empty {
                    self.end_row();
                }
            }
            (Root::Workbook, b"Cell") | (Root::Planilha, b"Coluna") => {
                let Some(row) = self.row.as_mut() else {
                    return Ok(());
                };
                if let Some(index) = index_attr(e, MAX_COL_INDEX, reader)? {
                    pad(row, index);
                }
                if empty {
                    row.push(Cell::Empty);
                } else {
                    self.cell = Some(PendingCell::default());
                    self.capture = root == Root::Planilha;
                }
            }
            (Root::Workbook, b"Data") => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.number = attr(e, b"Type", reader)?.as_deref() == Some("Number");
                    self.capture = !empty;
                }
            }
            (Root::Workbook, b"Comment") => {
                if !empty {
                    self.comment_depth = 1;
                    self.capture = false;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        if self.comment_depth > 0 {
            self.comment_depth -= 1;
            return;
        }
        match name {
            b"Worksheet" | b"Planilha" => self.end_sheet(),
            b"Row" | b"Linha" => self.end_row(),
            b"Cell" | b"Coluna" => {
                self.capture = false;
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(cell.finish());
                }
            }
            b"Data" => self.capture = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push_str(text);
        }
    }

    fn end_row(&mut self) {
        if let Some(mut row) = self.row.take() {
            while row.last().is_some_and(|c| matches!(c, Cell::Empty)) {
                row.pop();
            }
            self.rows.push(row);
        }
    }

    fn end_sheet(&mut self) {
        let rows = std::mem::take(&mut self.rows);
        let name = std::mem::take(&mut self.sheet_name);
        self.sheets.push((name, Grid::new(rows)));
    }
}

/// Value of the attribute whose local name is `local`, if present.
fn attr(
    e: &BytesStart<'_>,
    local: &[u8],
    reader: &Reader<&[u8]>,
) -> Result<Option<String>, XmlError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == local {
            return Ok(Some(a.decode_and_unescape_value(reader)?.into_owned()));
        }
    }
    Ok(None)
}

/// One-based `ss:Index`, validated against `max`.
fn index_attr(
    e: &BytesStart<'_>,
    max: usize,
    reader: &Reader<&[u8]>,
) -> Result<Option<usize>, XmlError> {
    let Some(raw) = attr(e, b"Index", reader)? else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(index) if (1..=max).contains(&index) => Ok(Some(index)),
        Ok(_) | Err(_) => Err(XmlError::Parse {
            detail: format!("invalid ss:Index {raw:?}"),
        }),
    }
}

/// Extends `items` so that the next push lands at one-based `index`.
fn pad<T: Default + Clone>(items: &mut Vec<T>, index: usize) {
    if items.len() < index - 1 {
        items.resize(index - 1, T::default());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn layout() -> SheetLayout {
        SheetLayout::default()
    }

    #[test]
    fn planilha_rows_and_columns() {
        let xml = r#"<?xml version="1.0"?>
            <Planilha>
              <Linha><Coluna> Cadastro </Coluna></Linha>
              <Linha><Coluna>Código Interno</Coluna><Coluna>Preço</Coluna></Linha>
              <Linha><Coluna>1</Coluna><Coluna/><Coluna>R$ 1,00</Coluna></Linha>
            </Planilha>"#;
        let section = read_xml_grid(xml, &layout()).expect("grid");
        assert_eq!(section.name, "PRODUTOS");
        assert_eq!(section.grid.len(), 3);
        assert_eq!(section.grid.get(0, 0), Some(&Cell::text("Cadastro")));
        assert_eq!(section.grid.get(2, 1), Some(&Cell::Empty));
        assert_eq!(section.grid.get(2, 2), Some(&Cell::text("R$ 1,00")));
    }

    #[test]
    fn spreadsheetml_honours_index_and_types() {
        let xml = r#"<?xml version="1.0"?>
            <ss:Workbook xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
              <ss:Worksheet ss:Name="Resumo"><ss:Table/></ss:Worksheet>
              <ss:Worksheet ss:Name="Produtos">
                <ss:Table>
                  <ss:Row><ss:Cell><ss:Data ss:Type="String">Cadastro</ss:Data></ss:Cell></ss:Row>
                  <ss:Row ss:Index="3">
                    <ss:Cell ss:Index="2"><ss:Data ss:Type="Number">10.5</ss:Data></ss:Cell>
                    <ss:Cell><ss:Data ss:Type="String">x</ss:Data>
                      <ss:Comment><ss:Data>note</ss:Data></ss:Comment></ss:Cell>
                  </ss:Row>
                </ss:Table>
              </ss:Worksheet>
            </ss:Workbook>"#;
        let section = read_xml_grid(xml, &layout()).expect("grid");
        assert_eq!(section.name, "Produtos");
        assert_eq!(section.grid.len(), 3);
        assert!(section.grid.rows()[1].is_empty());
        assert_eq!(section.grid.get(2, 0), Some(&Cell::Empty));
        assert_eq!(section.grid.get(2, 1), Some(&Cell::number(10.5)));
        assert_eq!(section.grid.get(2, 2), Some(&Cell::text("x")));
    }

    #[test]
    fn missing_worksheet_is_a_shape_error() {
        let xml = r#"<Workbook><Worksheet ss:Name="Plan1"><Table/></Worksheet></Workbook>"#;
        let err = read_xml_grid(xml, &layout()).expect_err("no section");
        assert!(matches!(err, XmlError::Shape(_)));
    }

    #[test]
    fn unknown_root_is_rejected() {
        let err = read_xml_grid("<nfeProc/>", &layout()).expect_err("not a grid");
        assert!(matches!(err, XmlError::UnsupportedLayout { root } if root == "nfeProc"));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = read_xml_grid("<Planilha><Linha></Planilha>", &layout()).expect_err("bad");
        assert!(matches!(err, XmlError::Parse { .. }));
    }

    #[test]
    fn absurd_index_is_rejected() {
        let xml = r#"<Workbook><Worksheet ss:Name="PRODUTOS"><Table>
            <Row ss:Index="99999999"/></Table></Worksheet></Workbook>"#;
        let err = read_xml_grid(xml, &layout()).expect_err("index");
        assert!(matches!(err, XmlError::Parse { .. }));
    }

    #[test]
    fn escaped_attribute_values_are_decoded() {
        let xml = r#"<Workbook><Worksheet ss:Name="Produtos &amp; Servicos"><Table>
            <Row><Cell><Data ss:Type="String">a</Data></Cell></Row></Table></Worksheet></Workbook>"#;
        let layout = SheetLayout {
            section: "produtos & servicos".to_owned(),
            ..SheetLayout::default()
        };
        let section = read_xml_grid(xml, &layout).expect("grid");
        assert_eq!(section.name, "Produtos & Servicos");
    }

    #[test]
    fn numeric_data_keeps_its_written_text() {
        let xml = r#"<Workbook><Worksheet ss:Name="PRODUTOS"><Table><Row>
            <Cell><Data ss:Type="Number"> 7891000100103 </Data></Cell>
            <Cell><Data ss:Type="Number">1.50</Data></Cell>
            <Cell><Data ss:Type="Number">abc</Data></Cell>
            </Row></Table></Worksheet></Workbook>"#;
        let section = read_xml_grid(xml, &layout()).expect("grid");
        assert_eq!(
            section.grid.get(0, 0),
            Some(&Cell::Number {
                value: 7_891_000_100_103.0,
                text: "7891000100103".to_owned(),
            })
        );
        assert_eq!(section.grid.get(0, 1).map(Cell::display), Some("1.50"));
        assert_eq!(section.grid.get(0, 2), Some(&Cell::text("abc")));
    }
}
