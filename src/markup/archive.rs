//! Reading markup documents from disk and from ZIP archives.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::constants::{MARKUP_EXTENSION, MAX_ENTRY_PREALLOC};
use crate::error::AnalysisError;

/// Raw contents of one markup document awaiting import.
#[derive(Debug)]
pub struct MarkupSource {
    /// File or archive entry name, used for reporting
    pub name: String,
    /// File contents, or why they could not be read
    pub data: Result<Vec<u8>, AnalysisError>,
}

impl MarkupSource {
    /// A source whose contents are already in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: Ok(data),
        }
    }

    fn failed(name: impl Into<String>, error: AnalysisError) -> Self {
        Self {
            name: name.into(),
            data: Err(error),
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Check if a path is a ZIP file.
pub fn is_zip_path(path: &Path) -> bool {
    has_extension(path, "zip")
}

/// Check if an archive entry name is a markup document.
fn is_markup_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    // Skip hidden files and macOS metadata
    if lower.contains("__macosx") || lower.contains("/.") || lower.starts_with('.') {
        return false;
    }
    has_extension(Path::new(&lower), MARKUP_EXTENSION)
}

/// Buffer to reserve for an entry whose header declares `declared` bytes.
fn entry_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_ENTRY_PREALLOC, |size| size.min(MAX_ENTRY_PREALLOC))
}

/// Extract markup documents from a ZIP archive reader.
///
/// Entries come back sorted by name. An archive without any markup entry
/// is an error.
fn extract_markup_from_archive<R: Read + Seek>(
    reader: R,
    archive_name: &str,
) -> Result<Vec<MarkupSource>, AnalysisError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut sources = Vec::new();

    log::debug!("ZIP '{}' contains {} entries", archive_name, archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();

        if file.is_dir() || !is_markup_entry(&name) {
            log::trace!("Skipping ZIP entry: {}", name);
            continue;
        }

        let mut data = Vec::with_capacity(entry_capacity(file.size()));
        let source = match file.read_to_end(&mut data) {
            Ok(_) => {
                log::debug!("Extracted markup '{}' ({} bytes)", name, data.len());
                MarkupSource::from_bytes(name, data)
            }
            Err(e) => {
                let path = Path::new(archive_name).join(&name);
                MarkupSource::failed(name, AnalysisError::io(path, e))
            }
        };
        sources.push(source);
    }

    if sources.is_empty() {
        return Err(AnalysisError::malformed(format!(
            "No markup files found in ZIP archive '{}'",
            archive_name
        )));
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    log::info!(
        "Extracted {} markup files from ZIP '{}'",
        sources.len(),
        archive_name
    );
    Ok(sources)
}

/// Extract markup documents from a ZIP file on disk.
pub fn extract_markup_from_zip_file(path: &Path) -> Result<Vec<MarkupSource>, AnalysisError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.zip");

    log::info!("Opening ZIP file: {:?}", path);
    let file = std::fs::File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    extract_markup_from_archive(file, filename)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Read markup sources from files and ZIP archives.
///
/// A file or archive that cannot be read becomes a single failed source, so
/// one bad path never hides the others.
pub fn read_sources(paths: &[PathBuf]) -> Vec<MarkupSource> {
    let mut sources = Vec::new();
    for path in paths {
        if is_zip_path(path) {
            match extract_markup_from_zip_file(path) {
                Ok(extracted) => sources.extend(extracted),
                Err(e) => sources.push(MarkupSource::failed(display_name(path), e)),
            }
            continue;
        }
        let data = std::fs::read(path).map_err(|e| AnalysisError::io(path, e));
        sources.push(MarkupSource {
            name: display_name(path),
            data,
        });
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_is_zip_path() {
        assert!(is_zip_path(&PathBuf::from("archive.zip")));
        assert!(is_zip_path(&PathBuf::from("archive.ZIP")));
        assert!(!is_zip_path(&PathBuf::from("markup.json")));
        assert!(!is_zip_path(&PathBuf::from("zipfile.txt")));
    }

    #[test]
    fn test_is_markup_entry() {
        assert!(is_markup_entry("scan.json"));
        assert!(is_markup_entry("folder/scan.JSON"));
        assert!(!is_markup_entry("__MACOSX/._scan.json"));
        assert!(!is_markup_entry(".hidden.json"));
        assert!(!is_markup_entry("folder/.hidden.json"));
        assert!(!is_markup_entry("scan.png"));
    }

    #[test]
    fn test_entry_capacity_is_capped() {
        assert_eq!(entry_capacity(1024), 1024);
        assert_eq!(entry_capacity(u64::MAX), MAX_ENTRY_PREALLOC);
    }

    #[test]
    fn test_extract_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.zip");
        write_zip(
            &path,
            &[
                ("b.json", "{}"),
                ("__MACOSX/._b.json", "junk"),
                ("notes.txt", "hello"),
                ("a.json", "[]"),
            ],
        );

        let sources = extract_markup_from_zip_file(&path).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
        assert_eq!(sources[0].data.as_ref().unwrap(), b"[]");
    }

    #[test]
    fn test_archive_without_markup_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        write_zip(&path, &[("readme.txt", "nothing here")]);
        assert!(extract_markup_from_zip_file(&path).is_err());
    }

    #[test]
    fn test_read_sources_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, "{}").unwrap();
        let missing = dir.path().join("missing.json");
        let broken_zip = dir.path().join("broken.zip");
        std::fs::write(&broken_zip, "not a zip").unwrap();

        let sources = read_sources(&[good, missing, broken_zip]);
        assert_eq!(sources.len(), 3);
        assert!(sources[0].data.is_ok());
        assert!(matches!(sources[1].data, Err(AnalysisError::Io { .. })));
        assert_eq!(sources[2].name, "broken.zip");
        assert!(matches!(sources[2].data, Err(AnalysisError::Zip(_))));
    }
}
