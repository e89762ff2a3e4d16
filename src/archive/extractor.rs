use crate::error::{ProcessingError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

const MACOS_METADATA_DIR: &str = "__MACOSX/";

pub struct TripArchiveExtractor {
    remove_archive: bool,
}

impl TripArchiveExtractor {
    pub fn new() -> Self {
        Self {
            remove_archive: true,
        }
    }

    pub fn with_remove_archive(remove_archive: bool) -> Self {
        Self { remove_archive }
    }

    /// Extract every file entry of `zip_path` into `dest_dir`, returning the
    /// written paths. Directory entries and macOS resource forks are skipped.
    pub fn extract(&self, zip_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
        info!("Extracting: {}", display_name(zip_path));

        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut extracted = Vec::new();

        fs::create_dir_all(dest_dir)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let entry_name = entry.name().to_string();

            if entry.is_dir() || entry_name.starts_with(MACOS_METADATA_DIR) {
                debug!("Skipping archive entry {}", entry_name);
                continue;
            }

            let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Unsafe path '{}' in archive '{}'",
                    entry_name,
                    zip_path.display()
                ))
            })?;

            let dest_path = dest_dir.join(relative);
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut writer = BufWriter::new(File::create(&dest_path)?);
            std::io::copy(&mut entry, &mut writer)?;
            writer.flush()?;

            debug!("Extracted {} ({} bytes)", dest_path.display(), entry.size());
            extracted.push(dest_path);
        }

        if extracted.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Archive '{}' contains no files",
                zip_path.display()
            )));
        }

        if self.remove_archive {
            fs::remove_file(zip_path)?;
            info!("✓ Extracted and removed zip: {}", display_name(zip_path));
        } else {
            info!("✓ Extracted: {}", display_name(zip_path));
        }

        Ok(extracted)
    }
}

impl Default for TripArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
