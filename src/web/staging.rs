// Upload staging: directory layout, job tokens and blob writes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use label_forge_types::UploadedAsset;
use uuid::Uuid;

use crate::sys_debug;

/// The four working directories under the data root.
#[derive(Clone, Debug)]
pub struct WorkDirs {
    pub models: PathBuf,
    pub labels: PathBuf,
    pub scripts: PathBuf,
    pub output: PathBuf,
}

impl WorkDirs {
    pub fn under(root: &Path) -> Self {
        Self {
            models: root.join("models"),
            labels: root.join("labels"),
            scripts: root.join("scripts"),
            output: root.join("output"),
        }
    }

    /// Create every directory. Safe to call repeatedly.
    pub fn ensure(&self) -> io::Result<()> {
        for dir in self.all() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn all(&self) -> [&Path; 4] {
        [
            self.models.as_path(),
            self.labels.as_path(),
            self.scripts.as_path(),
            self.output.as_path(),
        ]
    }

    /// Directory behind a download area name, if it is one we serve.
    pub fn download_area(&self, area: &str) -> Option<&Path> {
        match area {
            "scripts" => Some(self.scripts.as_path()),
            "output" => Some(self.output.as_path()),
            _ => None,
        }
    }
}

/// Unique prefix shared by every file of one request: `20261017093015_1a2b3c4d`.
pub fn new_job_token() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Local::now().format("%Y%m%d%H%M%S"), &random[..8])
}

/// Keep only the final path component of a client-supplied file name.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    if last.is_empty() || last == "." || last == ".." {
        "upload".to_string()
    } else {
        last.to_string()
    }
}

/// Write `asset` to `<dir>/<token>_<name>`, creating `dir` if needed.
pub fn stage_asset(dir: &Path, token: &str, asset: &UploadedAsset) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{token}_{}", sanitize_file_name(&asset.name)));
    fs::write(&path, &asset.bytes)?;
    sys_debug!("Staged {} bytes at {}", asset.bytes.len(), path.display());
    Ok(path)
}
