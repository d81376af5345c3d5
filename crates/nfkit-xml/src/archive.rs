/// Batch handling of fiscal XML files delivered as (nested) ZIP archives.
///
/// [`walk_zip`] flattens an archive into [`Entry`] values, descending into
/// nested `.zip` entries and attaching [`FiscalFields`] to every `.xml`
/// entry. The remaining functions operate on those entries: key filtering,
/// minification, re-packing into a `natOp/period/` folder tree, and a size
/// summary.
///
/// Reads are bounded by [`ArchiveLimits`] so that a hostile archive cannot
/// exhaust memory.
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::{Cursor, Read, Seek, Write};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::XmlError;
use crate::fiscal::FiscalFields;
use crate::minify::minify;

/// Default file name of the organized archive.
pub const ORGANIZED_ARCHIVE: &str = "xml_organizados.zip";

/// Extension bucket for names without a dot.
pub const NO_EXTENSION: &str = "sem-extensao";

/// Number of files listed in [`Summary::largest`].
const LARGEST_COUNT: usize = 5;

static KEY_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s,;]+").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Resource limits applied while reading archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Maximum nesting of archives inside archives (the outer one is depth 0).
    pub max_depth: usize,
    /// Maximum number of collected entries.
    pub max_entries: usize,
    /// Maximum decompressed size of a single entry, in bytes.
    pub max_entry_size: u64,
    /// Maximum decompressed size of everything read, in bytes.
    pub max_total_size: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_entries: 10_000,
            max_entry_size: 104_857_600,   // 100 MiB
            max_total_size: 1_073_741_824, // 1 GiB
        }
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One file taken out of an archive (or given directly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Base name, without any folder.
    pub name: String,
    /// File content.
    pub data: Vec<u8>,
    /// Fiscal fields; present for `.xml` entries only.
    pub fiscal: Option<FiscalFields>,
}

impl Entry {
    /// Builds an entry from a path, keeping only its base name.
    ///
    /// `.xml` entries get their fiscal fields extracted; a document that fails
    /// to parse gets empty fields.
    pub fn new(path: &str, data: Vec<u8>) -> Self {
        let name = base_name(path).to_owned();
        let fiscal = has_extension(&name, "xml").then(|| fiscal_fields(&name, &data));
        Self { name, data, fiscal }
    }

    /// Content size in bytes.
    pub fn size(&self) -> u64 {
        u64::try_from(self.data.len()).unwrap_or(u64::MAX)
    }

    /// Lower-cased extension, or [`NO_EXTENSION`].
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            Some(_) | None => NO_EXTENSION.to_owned(),
        }
    }

    /// Returns `true` for `.xml` entries.
    pub fn is_xml(&self) -> bool {
        has_extension(&self.name, "xml")
    }
}

fn fiscal_fields(name: &str, data: &[u8]) -> FiscalFields {
    FiscalFields::from_xml(&String::from_utf8_lossy(data)).unwrap_or_else(|e| {
        tracing::warn!(entry = %name, error = %e, "unreadable fiscal XML, fields left empty");
        FiscalFields::default()
    })
}

/// Last path component of `path`.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Turns one input file into entries.
///
/// `.xml` files become a single entry, `.zip` files are walked, anything else
/// yields nothing.
///
/// # Errors
///
/// Propagates [`walk_zip`] errors.
pub fn collect_input(
    name: &str,
    bytes: Vec<u8>,
    limits: &ArchiveLimits,
) -> Result<Vec<Entry>, XmlError> {
    if has_extension(name, "xml") {
        Ok(vec![Entry::new(name, bytes)])
    } else if has_extension(name, "zip") {
        walk_zip(&bytes, limits)
    } else {
        tracing::debug!(file = %name, "skipping input that is neither XML nor ZIP");
        Ok(Vec::new())
    }
}

/// Collects every file of the archive in `bytes`, descending into nested
/// archives.
///
/// Folders are dropped from names; nested `.zip` entries are replaced by
/// their contents.
///
/// # Errors
///
/// - [`XmlError::Zip`] for a corrupt archive at any depth.
/// - [`XmlError::TooDeep`], [`XmlError::TooManyEntries`] or
///   [`XmlError::TooLarge`] when a limit is exceeded.
pub fn walk_zip(bytes: &[u8], limits: &ArchiveLimits) -> Result<Vec<Entry>, XmlError> {
    let mut out = Vec::new();
    let mut total = 0u64;
    walk(bytes, limits, 0, &mut out, &mut total)?;
    tracing::info!(entries = out.len(), bytes = total, "archive walked");
    Ok(out)
}

fn walk(
    bytes: &[u8],
    limits: &ArchiveLimits,
    depth: usize,
    out: &mut Vec<Entry>,
    total: &mut u64,
) -> Result<(), XmlError> {
    if depth > limits.max_depth {
        return Err(XmlError::TooDeep {
            max: limits.max_depth,
        });
    }
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.len() > limits.max_entries {
        return Err(XmlError::TooManyEntries {
            max: limits.max_entries,
        });
    }

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let path = file.name().to_owned();
        let data = read_limited(&mut file, &path, limits.max_entry_size)?;

        *total = total.saturating_add(u64::try_from(data.len()).unwrap_or(u64::MAX));
        if *total > limits.max_total_size {
            return Err(XmlError::TooLarge {
                name: path,
                max: limits.max_total_size,
            });
        }

        if has_extension(&path, "zip") {
            tracing::debug!(entry = %path, depth, "descending into nested archive");
            walk(&data, limits, depth + 1, out, total)?;
            continue;
        }
        if out.len() >= limits.max_entries {
            return Err(XmlError::TooManyEntries {
                max: limits.max_entries,
            });
        }
        out.push(Entry::new(&path, data));
    }
    Ok(())
}

/// Reads at most `max` bytes of `reader`, failing if there is more.
fn read_limited<R: Read>(reader: &mut R, name: &str, max: u64) -> Result<Vec<u8>, XmlError> {
    let mut data = Vec::new();
    reader.take(max.saturating_add(1)).read_to_end(&mut data)?;
    if u64::try_from(data.len()).unwrap_or(u64::MAX) > max {
        return Err(XmlError::TooLarge {
            name: name.to_owned(),
            max,
        });
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// Transformations
// ---------------------------------------------------------------------------

/// Splits a key list on whitespace, `,` and `;`.
pub fn parse_keys(keys: &str) -> Vec<String> {
    KEY_SEPARATORS
        .split(keys)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Keeps entries whose name contains at least one of `keys`.
pub fn filter_by_keys(entries: Vec<Entry>, keys: &[String]) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|e| keys.iter().any(|k| e.name.contains(k.as_str())))
        .collect()
}

/// Minifies every `.xml` entry and drops the rest; fiscal fields are kept.
pub fn minify_entries(entries: Vec<Entry>) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(Entry::is_xml)
        .map(|mut e| {
            e.data = minify(&String::from_utf8_lossy(&e.data)).into_bytes();
            e
        })
        .collect()
}

/// Writes every entry with fiscal fields into a new archive under
/// `<natOp>/<period>/<name>`.
///
/// Entries without fiscal fields are skipped. Colliding paths get a ` (n)`
/// suffix before the extension. Returns the number of files written.
///
/// # Errors
///
/// [`XmlError::Zip`] or [`XmlError::Io`] if the archive cannot be written.
pub fn organize<W: Write + Seek>(entries: &[Entry], writer: W) -> Result<usize, XmlError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();

    for entry in entries {
        let Some(fiscal) = entry.fiscal.as_ref() else {
            continue;
        };
        let path = format!(
            "{}/{}/{}",
            fiscal.nat_op_folder(),
            fiscal.period(),
            entry.name
        );
        let path = unique_path(path, &mut used);
        zip.start_file(path, options)?;
        zip.write_all(&entry.data)?;
    }
    zip.finish()?;

    tracing::info!(files = used.len(), "organized archive written");
    Ok(used.len())
}

fn unique_path(path: String, used: &mut HashSet<String>) -> String {
    if used.insert(path.clone()) {
        return path;
    }
    let (stem, ext) = match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.ends_with('/') && !ext.contains('/') => (stem.to_owned(), format!(".{ext}")),
        Some(_) | None => (path.clone(), String::new()),
    };
    let mut n = 2usize;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Name and size of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSize {
    /// Base name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Counts and sizes of a set of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of entries.
    pub total_files: usize,
    /// Sum of entry sizes in bytes.
    pub total_size: u64,
    /// Entry count per lower-cased extension.
    pub by_extension: BTreeMap<String, usize>,
    /// The largest entries, biggest first; ties keep input order.
    pub largest: Vec<FileSize>,
}

/// Summarizes `entries`.
pub fn summarize(entries: &[Entry]) -> Summary {
    let mut by_extension: BTreeMap<String, usize> = BTreeMap::new();
    for e in entries {
        *by_extension.entry(e.extension()).or_default() += 1;
    }
    let mut largest: Vec<FileSize> = entries
        .iter()
        .map(|e| FileSize {
            name: e.name.clone(),
            size: e.size(),
        })
        .collect();
    largest.sort_by(|a, b| b.size.cmp(&a.size));
    largest.truncate(LARGEST_COUNT);

    Summary {
        total_files: entries.len(),
        total_size: entries.iter().map(Entry::size).sum(),
        by_extension,
        largest,
    }
}

#[allow(clippy::cast_precision_loss)]
fn kib(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total de arquivos: {}", self.total_files)?;
        writeln!(f, "Tamanho total: {}", kib(self.total_size))?;
        writeln!(f)?;
        writeln!(f, "Tipos de arquivo:")?;
        for (ext, count) in &self.by_extension {
            writeln!(f, " - {ext}: {count}")?;
        }
        writeln!(f)?;
        writeln!(f, "Top {LARGEST_COUNT} maiores arquivos:")?;
        for file in &self.largest {
            writeln!(f, " - {} ({})", file.name, kib(file.size))?;
        }
        Ok(())
    }
}
