//! Input discovery: format detection, decompression, and expansion of a
//! path argument (file, directory, or glob pattern) into input files.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Declared shape of an input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            _ => Err(format!("Unknown input format: {}. Valid options: csv, json", s)),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Csv => write!(f, "csv"),
            InputFormat::Json => write!(f, "json"),
        }
    }
}

impl InputFormat {
    /// Detect format from a file path, looking through compression suffixes
    /// (`orders.csv.gz` is CSV)
    pub fn from_path(path: &Path) -> Option<Self> {
        let mut path = path.to_path_buf();
        if Compression::from_path(&path) != Compression::None {
            path.set_extension("");
        }
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("csv") => Some(InputFormat::Csv),
            Some("json") => Some(InputFormat::Json),
            _ => None,
        }
    }
}

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// One schema export to ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// `None` when the format could not be detected
    pub format: Option<InputFormat>,
    pub compression: Compression,
}

impl InputFile {
    /// Describe a file, using `format` when given and detection otherwise
    pub fn new(path: impl Into<PathBuf>, format: Option<InputFormat>) -> Self {
        let path = path.into();
        let format = format.or_else(|| InputFormat::from_path(&path));
        let compression = Compression::from_path(&path);
        Self {
            path,
            format,
            compression,
        }
    }

    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Open the file with decompression applied
    pub fn open(&self) -> Result<Box<dyn Read>> {
        let file = File::open(&self.path)?;
        self.compression.wrap_reader(Box::new(file))
    }
}

/// Check if a path string contains glob pattern characters.
pub fn is_glob_pattern(path: &str) -> bool {
    path.contains('*') || path.contains('?') || path.contains('[')
}

fn is_schema_export(path: &Path) -> bool {
    path.is_file() && InputFormat::from_path(path).is_some()
}

/// Expand a file, directory, or glob pattern into the files to ingest.
///
/// Directories contribute the `.csv`/`.json` files (optionally compressed)
/// directly inside them. Results are sorted so the ingestion order, and
/// with it the model order, is reproducible.
///
/// # Errors
///
/// Returns an error if:
/// - The glob pattern is invalid
/// - Nothing matches
/// - A literal path doesn't exist
pub fn expand_inputs(pattern: &Path, format: Option<InputFormat>) -> Result<Vec<InputFile>> {
    let pattern_str = pattern.to_string_lossy();

    let mut files: Vec<PathBuf> = if is_glob_pattern(&pattern_str) {
        glob::glob(&pattern_str)
            .map_err(|e| Error::InvalidInputDocument {
                source_name: pattern_str.to_string(),
                reason: format!("invalid glob pattern: {}", e),
            })?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect()
    } else if pattern.is_dir() {
        std::fs::read_dir(pattern)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| (format.is_some() && p.is_file()) || is_schema_export(p))
            .collect()
    } else if pattern.is_file() {
        vec![pattern.to_path_buf()]
    } else {
        Vec::new()
    };

    if files.is_empty() {
        return Err(Error::NoInputFiles(pattern.to_path_buf()));
    }

    files.sort();
    Ok(files
        .into_iter()
        .map(|path| InputFile::new(path, format))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            InputFormat::from_path(Path::new("a/orders.csv")),
            Some(InputFormat::Csv)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("orders.JSON")),
            Some(InputFormat::Json)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("orders.csv.gz")),
            Some(InputFormat::Csv)
        );
        assert_eq!(InputFormat::from_path(Path::new("orders.txt")), None);
        assert_eq!(InputFormat::from_path(Path::new("orders.gz")), None);
    }

    #[test]
    fn test_compression_detection() {
        assert_eq!(Compression::from_path(Path::new("a.csv.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("a.json.zst")), Compression::Zstd);
        assert_eq!(Compression::from_path(Path::new("a.csv")), Compression::None);
    }

    #[test]
    fn test_expand_directory_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(dir.path().join("a.csv"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = expand_inputs(dir.path(), None).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.json"]);
        assert_eq!(files[0].format, Some(InputFormat::Csv));
    }

    #[test]
    fn test_expand_glob() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.csv"), "x").unwrap();
        fs::write(dir.path().join("two.csv"), "x").unwrap();
        fs::write(dir.path().join("three.json"), "x").unwrap();

        let files = expand_inputs(&dir.path().join("*.csv"), None).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_expand_missing_path() {
        let err = expand_inputs(Path::new("/nonexistent/schema.csv"), None).unwrap_err();
        assert!(matches!(err, Error::NoInputFiles(_)));
    }

    #[test]
    fn test_format_override() {
        let file = InputFile::new("export.txt", Some(InputFormat::Json));
        assert_eq!(file.format, Some(InputFormat::Json));
    }

    #[test]
    fn test_open_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.csv.gz");
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"table_name,column_name,data_type\n").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let input = InputFile::new(&path, None);
        let mut content = String::new();
        input.open().unwrap().read_to_string(&mut content).unwrap();
        assert!(content.starts_with("table_name"));
    }
}
