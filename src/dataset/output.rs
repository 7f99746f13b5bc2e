//! JSON dataset files.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination file plus the overwrite switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub force: bool,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            path: path.into(),
            force,
        }
    }

    /// True when the file exists and `force` is off.
    pub fn should_skip(&self) -> bool {
        !self.force && self.path.exists()
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        write_json(&self.path, value)
    }

    pub fn write_text(&self, text: &str) -> Result<()> {
        create_parent(&self.path)?;
        std::fs::write(&self.path, text)?;
        info!(path = %self.path.display(), bytes = text.len(), "wrote text output");
        Ok(())
    }
}

/// Pretty-printed UTF-8 JSON; non-ASCII is written as-is. Parent directories are created.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    info!(path = %path.display(), "wrote dataset");
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path).map_err(|e| crate::Error::from_source_io(path, e))?);
    Ok(serde_json::from_reader(reader)?)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
