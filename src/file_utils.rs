use log::warn;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    /// Append a suffix to the full file name (`out.json` -> `out.json.progress`)
    pub fn sibling_with_suffix<P: AsRef<Path>>(path: P, suffix: &str) -> PathBuf {
        let mut name = path.as_ref().as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Read a file as text.
    ///
    /// Content that is not valid UTF-8 is decoded as Latin-1, which maps every
    /// byte to the code point of the same value and therefore never fails.
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> io::Result<String> {
        let bytes = fs::read(&path)?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    "File {:?} is not valid UTF-8, decoding as Latin-1",
                    path.as_ref()
                );
                Ok(decode_latin1(e.as_bytes()))
            }
        }
    }

    /// Replace a file's content atomically.
    ///
    /// The bytes go to a temporary file in the destination directory, are
    /// synced to disk, and the temporary file is renamed over the target.
    /// Readers see either the old or the new content, never a partial write.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Delete a file, treating "already gone" as success
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> io::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
