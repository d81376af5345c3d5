/// Identifying fields of NF-e and CT-e documents.
///
/// Each field is the text of the first element with a given local name,
/// anywhere in the document. NF-e and CT-e spell some fields differently, so
/// every field lists its candidate tags in priority order; a candidate whose
/// first occurrence is empty falls through to the next.
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;

use crate::error::XmlError;

/// Period folder for documents without an issue date.
pub const NO_DATE: &str = "SEM-DATA";

/// Folder for documents without a nature of operation.
pub const NO_NAT_OP: &str = "SEM-NATOP";

const TAGS: [&[u8]; 8] = [
    b"chNFe", b"chCTe", b"nNF", b"nCT", b"dhEmi", b"dEmi", b"natOp", b"CNPJ",
];

/// Fields extracted from one fiscal document; empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FiscalFields {
    /// 44-digit access key (`chNFe` or `chCTe`).
    pub access_key: String,
    /// Document number (`nNF` or `nCT`).
    pub number: String,
    /// Issue timestamp as written (`dhEmi` or `dEmi`).
    pub issued_at: String,
    /// Nature of operation (`natOp`).
    pub nat_op: String,
    /// First CNPJ in the document, normally the issuer's.
    pub issuer_cnpj: String,
}

impl FiscalFields {
    /// Extracts the fields from an XML document.
    ///
    /// # Errors
    ///
    /// [`XmlError::Parse`] if the document is not well-formed up to the point
    /// where every field has been seen.
    pub fn from_xml(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut first: [Option<String>; TAGS.len()] = Default::default();
        let mut open: Option<(usize, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if open.is_none() {
                        if let Some(slot) = slot_for(e.local_name().as_ref(), &first) {
                            open = Some((slot, String::new()));
                        }
                    }
                }
                Event::Empty(e) => {
                    if open.is_none() {
                        if let Some(slot) = slot_for(e.local_name().as_ref(), &first) {
                            first[slot] = Some(String::new());
                        }
                    }
                }
                Event::Text(t) => {
                    if let Some((_, text)) = open.as_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let Some((_, text)) = open.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::End(e) => {
                    if let Some((slot, _)) = open.as_ref() {
                        if TAGS[*slot] == e.local_name().as_ref() {
                            if let Some((slot, text)) = open.take() {
                                first[slot] = Some(text);
                            }
                        }
                    }
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            if first.iter().all(Option::is_some) {
                break;
            }
        }

        let pick = |a: usize, b: usize| {
            [a, b]
                .into_iter()
                .filter_map(|i| first[i].as_deref())
                .find(|v| !v.is_empty())
                .unwrap_or_default()
                .to_owned()
        };
        Ok(Self {
            access_key: pick(0, 1),
            number: pick(2, 3),
            issued_at: pick(4, 5),
            nat_op: pick(6, 6),
            issuer_cnpj: pick(7, 7),
        })
    }

    /// `YYYY-MM` of the issue date, or [`NO_DATE`].
    ///
    /// Takes the first seven characters, so `2024/03/15` also yields
    /// `2024-03`.
    pub fn period(&self) -> String {
        let date = self.issued_at.trim();
        if date.is_empty() {
            return NO_DATE.to_owned();
        }
        let head: String = date.chars().take(7).collect();
        head.replacen('/', "-", 1)
    }

    /// Folder name for the nature of operation, or [`NO_NAT_OP`].
    ///
    /// Path separators inside the value are replaced so the folder stays a
    /// single path component.
    pub fn nat_op_folder(&self) -> String {
        let nat_op = self.nat_op.trim();
        if nat_op.is_empty() {
            NO_NAT_OP.to_owned()
        } else {
            nat_op.replace(['/', '\\'], "-")
        }
    }
}

/// Index into [`TAGS`] for `name`, if the tag has not been seen yet.
fn slot_for(name: &[u8], first: &[Option<String>]) -> Option<usize> {
    TAGS.iter()
        .position(|t| *t == name)
        .filter(|&i| first[i].is_none())
}
