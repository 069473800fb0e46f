use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use super::encoding::TextEncoding;
use super::model::Dataset;
use crate::error::DatasetLoadError;

/// Local file header signature of a zip archive.
const ZIP_MAGIC: &[u8] = b"PK";

/// Upper bound on the buffer reserved up front for an archive entry.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Extension of the delimited-text entry looked up inside an archive.
const TABLE_EXTENSION: &str = ".csv";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the trending dataset from `path`.
///
/// The file may be a raw CSV or a zip archive holding one. Zip entries go
/// through the full encoding ladder; raw files get a single UTF-8 attempt.
/// Both end in a lenient Latin-1 pass that skips malformed rows.
pub fn load_file(path: &Path) -> Result<Dataset, DatasetLoadError> {
    if !path.exists() {
        return Err(DatasetLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut dataset = if is_zip(path)? {
        load_zip(path)?
    } else {
        let bytes = std::fs::read(path)?;
        parse_with_ladder(&bytes, &[TextEncoding::Utf8Sig], &path.display().to_string())?
    };

    if dataset.derive_category_name() {
        log::info!("Derived category_name from categoryId");
    }

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names(),
        path.display()
    );
    Ok(dataset)
}

fn is_zip(path: &Path) -> Result<bool, DatasetLoadError> {
    let mut head = [0u8; 4];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(head[..filled].starts_with(ZIP_MAGIC))
}

// ---------------------------------------------------------------------------
// Zip container
// ---------------------------------------------------------------------------

fn load_zip(path: &Path) -> Result<Dataset, DatasetLoadError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let index = select_entry(&mut archive)?;

    let mut entry = archive.by_index(index)?;
    let name = entry.name().to_string();
    let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
    entry.read_to_end(&mut bytes)?;

    log::info!("Reading {name} from archive {}", path.display());
    parse_with_ladder(&bytes, &TextEncoding::LADDER, &name)
}

/// Preallocation for an entry of declared size `declared`; the declared
/// size comes from the archive and is not trusted beyond a cap.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

/// Index of the first `.csv` file entry, or of the first file entry when no
/// name matches. Directory entries are never selected.
fn select_entry<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<usize, DatasetLoadError> {
    let mut first_file = None;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.is_dir() {
            continue;
        }
        if entry.name().to_ascii_lowercase().ends_with(TABLE_EXTENSION) {
            return Ok(i);
        }
        first_file.get_or_insert(i);
    }

    match first_file {
        Some(i) => {
            log::warn!("Archive has no {TABLE_EXTENSION} entry, using its first file");
            Ok(i)
        }
        None => Err(DatasetLoadError::EmptyArchive),
    }
}

// ---------------------------------------------------------------------------
// Encoding ladder
// ---------------------------------------------------------------------------

fn parse_with_ladder(
    bytes: &[u8],
    ladder: &[TextEncoding],
    entry: &str,
) -> Result<Dataset, DatasetLoadError> {
    for &encoding in ladder {
        let Some(text) = encoding.decode(bytes) else {
            log::debug!("{entry}: not valid {encoding}");
            continue;
        };
        match parse_table(&text, ParseMode::Strict) {
            Ok(parsed) => {
                log::debug!("{entry}: parsed as {encoding}");
                return Ok(parsed.dataset);
            }
            Err(e) => log::debug!("{entry}: {encoding} parse failed: {e}"),
        }
    }

    let encoding = TextEncoding::FALLBACK;
    log::warn!("{entry}: strict parsing failed, retrying as {encoding} skipping bad rows");
    let text = encoding.decode(bytes).ok_or_else(|| DatasetLoadError::Parse {
        entry: entry.to_string(),
        message: format!("not valid {encoding}"),
    })?;
    let parsed = parse_table(&text, ParseMode::Lenient).map_err(|message| {
        DatasetLoadError::Parse {
            entry: entry.to_string(),
            message,
        }
    })?;
    if parsed.skipped > 0 {
        log::warn!("{entry}: skipped {} malformed rows", parsed.skipped);
    }
    Ok(parsed.dataset)
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    /// A row with too many fields, or unreadable, fails the whole parse.
    Strict,
    /// Such rows are dropped and counted.
    Lenient,
}

struct ParsedTable {
    dataset: Dataset,
    skipped: usize,
}

/// Parse comma-delimited text with a header row.
fn parse_table(text: &str, mode: ParseMode) -> Result<ParsedTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("reading CSV headers: {e}"))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err("no header row".to_string());
    }

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (row_no, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) if record.len() <= headers.len() => record,
            Ok(record) => match mode {
                ParseMode::Strict => {
                    return Err(format!(
                        "CSV row {row_no}: expected {} fields, found {}",
                        headers.len(),
                        record.len()
                    ))
                }
                ParseMode::Lenient => {
                    skipped += 1;
                    continue;
                }
            },
            Err(e) => match mode {
                ParseMode::Strict => return Err(format!("CSV row {row_no}: {e}")),
                ParseMode::Lenient => {
                    skipped += 1;
                    continue;
                }
            },
        };

        // short rows are padded with missing cells
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(ParsedTable {
        dataset: Dataset::from_rows(headers, rows),
        skipped,
    })
}
