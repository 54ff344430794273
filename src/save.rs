//! Writing a response body into the download folder.
//!
//! The body goes into a hidden temp file next to its destination and is only
//! renamed into place once complete. Dropping a [`TransientFile`] before
//! [`TransientFile::persist`] deletes it, so failed or aborted downloads leave
//! nothing behind.

use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Upper bound on `name (n).ext` candidates tried before giving up.
const MAX_DUPLICATES: usize = 1000;

/// A file that made it to disk under its final name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

impl SavedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub struct TransientFile {
    temp: NamedTempFile,
    writer: tokio::fs::File,
    written: u64,
}

impl TransientFile {
    /// Creates the folder if needed and opens a temp file inside it.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let temp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(dir)?;
        let writer = tokio::fs::File::from_std(temp.reopen()?);
        Ok(Self {
            temp,
            writer,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Moves the temp file to `dir/filename`, picking `name (n).ext` when
    /// the name is already taken. Never overwrites.
    pub async fn persist(mut self, dir: &Path, filename: &str) -> io::Result<SavedFile> {
        self.writer.flush().await?;
        self.writer.sync_all().await?;
        drop(self.writer);

        let mut temp = self.temp;
        for n in 0..MAX_DUPLICATES {
            let path = dir.join(numbered_name(filename, n));
            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    return Ok(SavedFile {
                        path,
                        bytes: self.written,
                    });
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => temp = e.file,
                Err(e) => return Err(e.error),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("nenhum nome livre para {filename}"),
        ))
    }
}

/// `clip.mp4`, `clip (1).mp4`, `clip (2).mp4`, ...
fn numbered_name(filename: &str, n: usize) -> String {
    if n == 0 {
        return filename.to_string();
    }
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn numbered_names() {
        assert_eq!(numbered_name("clip.mp4", 0), "clip.mp4");
        assert_eq!(numbered_name("clip.mp4", 2), "clip (2).mp4");
        assert_eq!(numbered_name("README", 1), "README (1)");
    }

    #[tokio::test]
    async fn persist_writes_final_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = TransientFile::create_in(dir.path()).unwrap();
        file.write_chunk(b"abc").await.unwrap();
        file.write_chunk(b"def").await.unwrap();
        let saved = file.persist(dir.path(), "clip.mp4").await.unwrap();

        assert_eq!(saved.bytes, 6);
        assert_eq!(saved.file_name(), "clip.mp4");
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"abcdef");
        assert_eq!(entries(dir.path()), vec!["clip.mp4"]);
    }

    #[tokio::test]
    async fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"old").unwrap();

        let mut file = TransientFile::create_in(dir.path()).unwrap();
        file.write_chunk(b"new").await.unwrap();
        let saved = file.persist(dir.path(), "clip.mp4").await.unwrap();

        assert_eq!(saved.file_name(), "clip (1).mp4");
        assert_eq!(std::fs::read(dir.path().join("clip.mp4")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn dropped_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = TransientFile::create_in(dir.path()).unwrap();
        file.write_chunk(b"partial").await.unwrap();
        let temp_path = file.path().to_path_buf();
        assert!(temp_path.exists());

        drop(file);
        assert!(!temp_path.exists());
        assert!(entries(dir.path()).is_empty());
    }
}
