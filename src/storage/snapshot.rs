use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_derive::{Deserialize, Serialize};

use crate::error::Result;
use crate::sql::types::Record;

/// The persisted state: every table's records plus the auto-increment counters. The file is
/// rewritten wholesale on every flush.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Record>>,
    #[serde(default, rename = "autoIds")]
    pub auto_ids: BTreeMap<String, i64>,
}

impl Snapshot {
    /// Reads a snapshot file, or returns None if it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Writes the snapshot next to the target, syncs it, then renames it over the target so a
    /// crash mid-write leaves the previous snapshot intact.
    pub fn write(&self, path: &Path) -> Result<()> {
        let temp_path = temp_path(path);
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
