//! Reading class bytes from a content URL
//!
//! `file:` URLs are read from disk; `jar:` URLs open the archive and read a
//! single entry. Every file handle is scoped to one call.

use crate::location::ARCHIVE_SEPARATOR;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors that can occur while reading module content
#[derive(Debug, Error)]
pub enum ContentError {
    /// I/O failure on the file or archive
    #[error("Failed to read {url}: {source}")]
    Io {
        url: Url,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or lacks the entry
    #[error("Failed to read archive entry {url}: {source}")]
    Archive {
        url: Url,
        #[source]
        source: zip::result::ZipError,
    },

    /// The URL does not denote a local file or archive entry
    #[error("Cannot read content from {0}")]
    UnsupportedUrl(Url),
}

/// Read the bytes behind a `file:` or `jar:file:` URL
pub fn read_content(url: &Url) -> Result<Vec<u8>, ContentError> {
    match url.scheme() {
        "file" => {
            let path = local_path(url, url)?;
            std::fs::read(&path).map_err(|source| ContentError::Io {
                url: url.clone(),
                source,
            })
        }
        "jar" => read_archive_entry(url),
        _ => Err(ContentError::UnsupportedUrl(url.clone())),
    }
}

fn local_path(file_url: &Url, reported: &Url) -> Result<PathBuf, ContentError> {
    if file_url.scheme() != "file" {
        return Err(ContentError::UnsupportedUrl(reported.clone()));
    }
    file_url
        .to_file_path()
        .map_err(|()| ContentError::UnsupportedUrl(reported.clone()))
}

fn read_archive_entry(url: &Url) -> Result<Vec<u8>, ContentError> {
    let (archive, entry) = url
        .path()
        .split_once(ARCHIVE_SEPARATOR)
        .ok_or_else(|| ContentError::UnsupportedUrl(url.clone()))?;
    let archive_url =
        Url::parse(archive).map_err(|_| ContentError::UnsupportedUrl(url.clone()))?;
    let archive_path = local_path(&archive_url, url)?;
    // The entry path is percent-encoded in the URL; zip entry names are not
    let entry_name = percent_encoding::percent_decode_str(entry)
        .decode_utf8()
        .map_err(|_| ContentError::UnsupportedUrl(url.clone()))?;

    let io_error = |source| ContentError::Io {
        url: url.clone(),
        source,
    };
    let archive_error = |source| ContentError::Archive {
        url: url.clone(),
        source,
    };

    let file = File::open(&archive_path).map_err(io_error)?;
    let mut archive = zip::ZipArchive::new(file).map_err(archive_error)?;
    let mut entry = archive.by_name(&entry_name).map_err(archive_error)?;

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes).map_err(io_error)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_file_url() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Bar.class");
        std::fs::write(&path, b"\xCA\xFE\xBA\xBE").unwrap();

        let url = Url::from_file_path(&path).unwrap();
        assert_eq!(read_content(&url).unwrap(), b"\xCA\xFE\xBA\xBE");
    }

    #[test]
    fn test_read_jar_url() {
        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("lib.jar");
        let mut zip = zip::ZipWriter::new(File::create(&jar).unwrap());
        zip.start_file("com/foo/Bar.class", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"bytes").unwrap();
        zip.finish().unwrap();

        let archive_url = Url::from_file_path(&jar).unwrap();
        let url = Url::parse(&format!("jar:{archive_url}!/com/foo/Bar.class")).unwrap();
        assert_eq!(read_content(&url).unwrap(), b"bytes");

        let missing = Url::parse(&format!("jar:{archive_url}!/com/foo/Gone.class")).unwrap();
        assert!(matches!(
            read_content(&missing),
            Err(ContentError::Archive { .. })
        ));
    }

    #[test]
    fn test_read_jar_url_with_non_ascii_entry() {
        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("lib.jar");
        let mut zip = zip::ZipWriter::new(File::create(&jar).unwrap());
        zip.start_file("com/foo/Café.class", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"accent").unwrap();
        zip.finish().unwrap();

        let archive_url = Url::from_file_path(&jar).unwrap();
        let url = Url::parse(&format!("jar:{archive_url}!/com/foo/Café.class")).unwrap();
        assert!(url.path().ends_with("Caf%C3%A9.class"));
        assert_eq!(read_content(&url).unwrap(), b"accent");
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let url = Url::from_file_path(temp.path().join("Gone.class")).unwrap();
        assert!(matches!(read_content(&url), Err(ContentError::Io { .. })));
    }

    #[test]
    fn test_unsupported_url() {
        let url = Url::parse("http://example.com/Bar.class").unwrap();
        assert!(matches!(
            read_content(&url),
            Err(ContentError::UnsupportedUrl(_))
        ));
    }
}
