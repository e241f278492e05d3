//! Randomly named temporary files used as buffers between stages.
//!
//! A [`ScratchFile`] owns its backing file: dropping it (or calling
//! [`ScratchFile::close`]) removes the file from disk. This is what guarantees
//! cleanup on every exit path of a stage, including timeouts that drop the
//! stage future mid-flight.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::config::constants::SCRATCH_PREFIX;

/// Where scratch files get created. Defaults to the system temp directory.
#[derive(Debug, Clone, Default)]
pub struct ScratchSpace {
    dir: Option<PathBuf>,
}

impl ScratchSpace {
    pub fn system() -> Self {
        Self { dir: None }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn create(&self) -> io::Result<ScratchFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let named = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (file, path) = named.into_parts();
        Ok(ScratchFile {
            file: File::from_std(file),
            path,
        })
    }
}

/// An open scratch file, deleted when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    file: File,
    path: TempPath,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush pending writes and position the file at its start
    pub async fn rewind(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }

    pub async fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata().await?.len())
    }

    /// Keep the file at `target` instead of deleting it
    pub async fn persist(mut self, target: &Path) -> io::Result<()> {
        self.file.flush().await?;
        let Self { file, path } = self;
        drop(file);
        path.persist(target).map_err(|e| e.error)
    }

    /// Close the handle and remove the file, reporting removal errors
    pub async fn close(self) -> io::Result<()> {
        let Self { file, path } = self;
        drop(file);
        path.close()
    }
}

impl AsyncRead for ScratchFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl AsyncWrite for ScratchFile {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.file).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_scratch_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::in_dir(dir.path());

        let mut file = scratch.create().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with(SCRATCH_PREFIX));

        file.write_all(b"scratch").await.unwrap();
        file.rewind().await.unwrap();
        assert_eq!(file.size().await.unwrap(), 7);

        let mut content = String::new();
        file.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "scratch");

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_scratch_file_close() {
        let dir = tempfile::tempdir().unwrap();
        let file = ScratchSpace::in_dir(dir.path()).create().unwrap();
        let path = file.path().to_path_buf();
        file.close().await.unwrap();
        assert!(!path.exists());
    }
}
