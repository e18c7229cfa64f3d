//! Per-execution build directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, TempPath};

use crate::error::{Error, Result};

/// A fresh temporary directory holding one source file and, after a
/// successful compile, the binary built from it.
///
/// Both are removed when the workspace is dropped, on every exit path.
/// [`BuildWorkspace::close`] does the same but reports failures.
pub struct BuildWorkspace {
    // Field order matters: the source goes before its directory.
    source: TempPath,
    dir: TempDir,
}

impl BuildWorkspace {
    /// Create a workspace under `parent` and write `program` into it.
    pub fn create(parent: &Path, program: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(".dkernel-")
            .tempdir_in(parent)?;

        let mut file = tempfile::Builder::new()
            .prefix("cell_")
            .suffix(".d")
            .rand_bytes(8)
            .tempfile_in(dir.path())?;
        file.write_all(program.as_bytes())?;
        file.flush()?;

        Ok(Self {
            source: file.into_temp_path(),
            dir,
        })
    }

    /// The temporary directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// The source file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Source file stem, which is also the D module name.
    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Where the compiler puts the binary: named after the source stem.
    pub fn binary(&self) -> PathBuf {
        self.dir
            .path()
            .join(format!("{}{}", self.stem(), std::env::consts::EXE_SUFFIX))
    }

    /// Remove the workspace, reporting a failure to do so.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        let Self { source, dir } = self;
        // A missing source file is fine as long as the directory goes.
        let _ = source.close();
        dir.close().map_err(|source| Error::Cleanup { path, source })
    }
}
