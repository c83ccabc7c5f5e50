//! TSV reading and writing for record sets.
//!
//! Input files carry a header row whose names are ignored: the two columns
//! are taken positionally as `source` and `target`. Split files are written
//! without a header. Quoting is disabled in both directions since IPA
//! transcriptions may legitimately contain `"`.

use crate::error::{PhonesError, Result};
use crate::types::{Record, RecordSet, SplitKind};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SOURCE_COLUMN: &str = "source";
pub const TARGET_COLUMN: &str = "target";

fn read_table(path: &Path, has_header: bool) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PhonesError::MissingResource(path.to_path_buf()));
    }
    if fs::metadata(path)?.len() == 0 {
        return Ok(DataFrame::empty());
    }

    // a schema length of 0 reads every column as a string
    let df = CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(b'\t')
                .with_quote_char(None),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(|e| ragged_row(path).unwrap_or_else(|| PhonesError::Polars(e)))?;

    debug!("Read {:?} from {}", df.shape(), path.display());
    Ok(df)
}

/// Shape error for the first line whose field count differs from the first
/// line's, if any. Polars only reports ragged rows as a parse failure.
fn ragged_row(path: &Path) -> Option<PhonesError> {
    let text = fs::read_to_string(path).ok()?;
    let mut lines = text.lines().filter(|line| !line.is_empty());
    let expected = lines.next()?.split('\t').count();

    lines
        .map(|line| line.split('\t').collect::<Vec<_>>())
        .find(|fields| fields.len() != expected)
        .map(|fields| PhonesError::ColumnShape {
            found: fields.len(),
            columns: fields.into_iter().map(str::to_string).collect(),
        })
}

/// Read an input TSV (with header) into records.
pub fn read_records(path: &Path) -> Result<RecordSet> {
    records_from_frame(&read_table(path, true)?)
}

/// Read a headerless split file written by [`write_records`].
///
/// An empty file is an empty split.
pub fn read_split(path: &Path) -> Result<RecordSet> {
    let df = read_table(path, false)?;
    if df.width() == 0 {
        return Ok(Vec::new());
    }
    records_from_frame(&df)
}

/// Convert a two-column frame into records.
///
/// Fails if the frame does not have exactly two columns or if any row has
/// an empty source or target.
pub fn records_from_frame(df: &DataFrame) -> Result<RecordSet> {
    if df.width() != 2 {
        return Err(PhonesError::ColumnShape {
            found: df.width(),
            columns: df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
        });
    }

    let columns = df.get_columns();
    let source = columns[0].cast(&DataType::String)?;
    let target = columns[1].cast(&DataType::String)?;
    let source = source.str()?;
    let target = target.str()?;

    let mut records = Vec::with_capacity(df.height());
    for (i, (src, tgt)) in source.into_iter().zip(target.into_iter()).enumerate() {
        let row = i + 1;
        let src = match src {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(PhonesError::MissingField {
                    row,
                    column: SOURCE_COLUMN.to_string(),
                });
            }
        };
        let tgt = match tgt {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(PhonesError::MissingField {
                    row,
                    column: TARGET_COLUMN.to_string(),
                });
            }
        };
        records.push(Record::new(src, tgt));
    }

    Ok(records)
}

/// Build a `source`/`target` frame from records.
pub fn frame_from_records(records: &[Record]) -> Result<DataFrame> {
    let sources: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();
    let targets: Vec<&str> = records.iter().map(|r| r.target.as_str()).collect();

    Ok(DataFrame::new(vec![
        Column::new(SOURCE_COLUMN.into(), sources),
        Column::new(TARGET_COLUMN.into(), targets),
    ])?)
}

/// Write records as a headerless TSV, creating parent directories.
///
/// Refuses records with an empty field, which [`read_split`] could not read
/// back.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        let column = if record.source.is_empty() {
            SOURCE_COLUMN
        } else if record.target.is_empty() {
            TARGET_COLUMN
        } else {
            continue;
        };
        return Err(PhonesError::MissingField {
            row: i + 1,
            column: column.to_string(),
        });
    }

    let mut df = frame_from_records(records)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file)
        .include_header(false)
        .with_separator(b'\t')
        .with_quote_style(QuoteStyle::Never)
        .finish(&mut df)?;

    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// `<dir>/<split>/<lang>_<split>.tsv`
pub fn split_path(dir: &Path, language: &str, kind: SplitKind) -> PathBuf {
    dir.join(kind.as_str()).join(kind.file_name(language))
}

/// Sorted subdirectories of `dir`.
///
/// Symlinks are not followed and an unreadable directory has no children.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.path())
        .collect();
    children.sort();
    children
}

/// Find the first directory named `language` below `root`, breadth first.
///
/// Datasets are grouped by family (`tsv/slavic/rus`, `tsv/romance/spa`), so
/// callers usually only know the data root.
pub fn locate_language_dir(root: &Path, language: &str) -> Result<PathBuf> {
    let mut queue = vec![root.to_path_buf()];

    while !queue.is_empty() {
        let mut next = Vec::new();
        for dir in queue {
            let children = subdirectories(&dir);
            if let Some(found) = children
                .iter()
                .find(|path| path.file_name().is_some_and(|name| name == language))
            {
                return Ok(found.clone());
            }
            next.extend(children);
        }
        queue = next;
    }

    Err(PhonesError::LanguageDirNotFound {
        language: language.to_string(),
        root: root.to_path_buf(),
    })
}

/// Every `*.tsv` file inside a directory named after `kind`, at any depth
/// below `root` (`root` itself included), in sorted path order.
pub fn find_split_files(root: &Path, kind: SplitKind) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if dir.file_name().is_some_and(|name| name == kind.as_str()) {
            if let Ok(entries) = fs::read_dir(&dir) {
                files.extend(
                    entries
                        .filter_map(|entry| entry.ok())
                        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
                        .map(|entry| entry.path())
                        .filter(|path| path.extension().is_some_and(|ext| ext == "tsv")),
                );
            }
        }
        stack.extend(subdirectories(&dir));
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_read_records_renames_columns_positionally() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.tsv");
        fs::write(&path, "word\tipa\nкот\tk o t\nдом\td o m\n").unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(
            records,
            vec![Record::new("кот", "k o t"), Record::new("дом", "d o m")]
        );
    }

    #[test]
    fn test_read_records_rejects_three_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.tsv");
        fs::write(&path, "source\ttarget\textra\na\tb\tc\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, PhonesError::ColumnShape { found: 3, .. }));
    }

    #[test]
    fn test_read_records_rejects_single_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.tsv");
        fs::write(&path, "source\na\nb\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_SHAPE");
    }

    #[test]
    fn test_read_records_missing_file() {
        let err = read_records(Path::new("/nonexistent/words.tsv")).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_RESOURCE");
    }

    #[test]
    fn test_quotes_are_literal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("split.tsv");
        let records = vec![Record::new("\"quoted\"", "k \" t")];

        write_records(&path, &records).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "\"quoted\"\tk \" t\n");
        assert_eq!(read_split(&path).unwrap(), records);
    }

    #[test]
    fn test_write_is_headerless_and_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = split_path(dir.path(), "rus", SplitKind::Train);
        write_records(&path, &[Record::new("кот", "k o t")]).unwrap();

        assert!(path.ends_with("train/rus_train.tsv"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "кот\tk o t\n");
    }

    #[test]
    fn test_empty_split_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = split_path(dir.path(), "eng", SplitKind::Val);
        write_records(&path, &[]).unwrap();
        assert!(read_split(&path).unwrap().is_empty());
    }

    #[test]
    fn test_empty_input_is_a_shape_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.tsv");
        fs::write(&path, "").unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, PhonesError::ColumnShape { found: 0, .. }));
    }

    #[test]
    fn test_ragged_row_is_a_shape_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.tsv");
        fs::write(&path, "source\ttarget\nкот\tk o t\nдом\td o m\textra\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, PhonesError::ColumnShape { found: 3, .. }));
    }

    #[test]
    fn test_write_rejects_empty_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("split.tsv");
        let records = vec![Record::new("a", "a"), Record::new("x", "")];

        let err = write_records(&path, &records).unwrap_err();
        assert!(matches!(err, PhonesError::MissingField { row: 2, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_find_split_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_records(&split_path(&root.join("rus"), "rus", SplitKind::Train), &[]).unwrap();
        write_records(&split_path(&root.join("ukr"), "ukr", SplitKind::Train), &[]).unwrap();
        write_records(&split_path(&root.join("ukr"), "ukr", SplitKind::Test), &[]).unwrap();
        fs::write(root.join("ukr/train/notes.txt"), "").unwrap();

        assert_eq!(
            find_split_files(root, SplitKind::Train),
            vec![
                root.join("rus/train/rus_train.tsv"),
                root.join("ukr/train/ukr_train.tsv"),
            ]
        );
        assert!(find_split_files(root, SplitKind::Val).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_language_dir_ignores_symlink_cycles() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("slavic")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("slavic/loop")).unwrap();

        let err = locate_language_dir(dir.path(), "deu").unwrap_err();
        assert_eq!(err.error_code(), "LANGUAGE_DIR_NOT_FOUND");
    }

    #[test]
    fn test_locate_language_dir_missing_root() {
        let err = locate_language_dir(Path::new("/nonexistent/tsv"), "rus").unwrap_err();
        assert_eq!(err.error_code(), "LANGUAGE_DIR_NOT_FOUND");
    }

    #[test]
    fn test_locate_language_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("slavic/rus/train")).unwrap();
        fs::create_dir_all(dir.path().join("romance/spa")).unwrap();

        let found = locate_language_dir(dir.path(), "rus").unwrap();
        assert_eq!(found, dir.path().join("slavic/rus"));

        let err = locate_language_dir(dir.path(), "deu").unwrap_err();
        assert_eq!(err.error_code(), "LANGUAGE_DIR_NOT_FOUND");
    }
}
