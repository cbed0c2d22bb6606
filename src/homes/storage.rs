use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{error, info, warn};

use crate::homes::errors::HomeError;
use crate::homes::types::{HomeEntry, Location, PlayerHomeRecord, PlayerId};
use crate::logutil::preview_record;

/// Column headers of the homes file, in order.
pub const HEADER: [&str; 8] = [
    "player id", "home name", "world id", "x", "y", "z", "pitch", "yaw",
];

/// Outcome of reading the homes file.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub homes: Vec<HomeEntry>,
    /// Rows that were malformed and left out.
    pub skipped: usize,
    /// False when there was no file to read.
    pub file_found: bool,
}

/// Flat-file persistence for homes: one CSV row per home.
///
/// Saving moves the current file to the backup path first and restores it if the fresh
/// write fails. A successful save leaves the backup in place.
pub struct HomeStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl HomeStore {
    pub fn new(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "homes.csv".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Hold an exclusive advisory lock for the duration of a save or load.
    fn acquire_lock(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    /// Write every home in `records`, returning how many rows were written.
    pub fn save(&self, records: &[PlayerHomeRecord]) -> Result<usize, HomeError> {
        self.save_with(|path| write_rows(path, records))
    }

    /// Backup, `write` the primary file, then restore on failure.
    pub(crate) fn save_with(
        &self,
        write: impl FnOnce(&Path) -> Result<usize, HomeError>,
    ) -> Result<usize, HomeError> {
        let lock = self
            .acquire_lock()
            .map_err(|e| save_failed(format!("could not lock {}: {}", self.lock_path().display(), e)))?;

        let backed_up = self.path.exists();
        if backed_up {
            fs::rename(&self.path, &self.backup_path).map_err(|e| {
                save_failed(format!(
                    "could not move {} to backup location {}: {}",
                    self.path.display(),
                    self.backup_path.display(),
                    e
                ))
            })?;
        }

        let written = match write(&self.path) {
            Ok(count) => count,
            Err(e) => {
                if backed_up {
                    if let Err(restore) = fs::rename(&self.backup_path, &self.path) {
                        error!(
                            "Could not restore homes file - it should be at: {} ({})",
                            self.backup_path.display(),
                            restore
                        );
                    }
                } else {
                    let _ = fs::remove_file(&self.path);
                }
                let _ = lock.unlock();
                return Err(save_failed(format!(
                    "could not write {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let _ = lock.unlock();
        info!("Homes saved ({} homes) to {}", written, self.path.display());
        Ok(written)
    }

    /// Read the homes file. A missing file is an empty registry, not an error.
    pub fn load(&self) -> Result<LoadReport, HomeError> {
        if !self.path.exists() {
            info!(
                "No existing homes file at {}, so the homes registry is empty.",
                self.path.display()
            );
            return Ok(LoadReport::default());
        }

        let lock = self.acquire_lock()?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut report = LoadReport {
            file_found: true,
            ..LoadReport::default()
        };
        for result in reader.records() {
            let parsed = result
                .map_err(HomeError::from)
                .and_then(|row| parse_row(&row));
            match parsed {
                Ok(home) => report.homes.push(home),
                Err(e) => {
                    warn!("Skipping home record: {}", e);
                    report.skipped += 1;
                }
            }
        }
        let _ = lock.unlock();

        info!(
            "Homes loaded: {} homes, {} malformed rows skipped",
            report.homes.len(),
            report.skipped
        );
        Ok(report)
    }
}

fn write_rows(path: &Path, records: &[PlayerHomeRecord]) -> Result<usize, HomeError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)?;
    writer.write_record(HEADER)?;

    let mut written = 0usize;
    for record in records {
        let player_id = record.owner().to_string();
        for home in record.homes() {
            let location = &home.location;
            let fields = [
                player_id.clone(),
                home.name.clone(),
                location.world_id.clone(),
                location.position.x.to_string(),
                location.position.y.to_string(),
                location.position.z.to_string(),
                location.orientation.pitch.to_string(),
                location.orientation.yaw.to_string(),
            ];
            writer.write_record(&fields)?;
            written += 1;
        }
    }
    let file = writer
        .into_inner()
        .map_err(|e| HomeError::Io(e.into_error()))?;
    let _ = file.sync_all();
    Ok(written)
}

fn save_failed(reason: String) -> HomeError {
    error!("Could not save homes file: {}", reason);
    HomeError::SaveFailed(reason)
}

/// Parse one data row into a home.
pub fn parse_row(row: &csv::StringRecord) -> Result<HomeEntry, HomeError> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| HomeError::MalformedRecord { line, reason };

    if row.len() != HEADER.len() {
        return Err(malformed(format!(
            "expected {} fields, found {}: {}",
            HEADER.len(),
            row.len(),
            preview_record(row)
        )));
    }

    let owner: PlayerId = row[0]
        .trim()
        .parse()
        .map_err(|_| malformed(format!("malformed player ID: {}", preview_record(row))))?;

    let mut numbers = [0f64; 5];
    for (slot, index) in numbers.iter_mut().zip(3..8) {
        *slot = row[index].trim().parse().map_err(|_| {
            malformed(format!(
                "invalid {} value, must be a number: {:?}",
                HEADER[index], &row[index]
            ))
        })?;
    }
    let [x, y, z, pitch, yaw] = numbers;

    Ok(HomeEntry::new(
        owner,
        &row[1],
        Location::new(&row[2], x, y, z, pitch, yaw),
    ))
}
