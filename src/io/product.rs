//! Locate the leader, volume and image files of a PALSAR product directory

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::types::{Polarization, SarError, SarResult};

/// One `IMG-*` file of a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    /// Polarization parsed from the file name, if it follows `IMG-<pol>-<scene>`
    pub polarization: Option<Polarization>,
}

/// Resolved file set of one product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFiles {
    pub directory: PathBuf,
    pub leader: PathBuf,
    pub volume: PathBuf,
    /// One or two image files, sorted by file name
    pub images: Vec<ImageFile>,
}

impl ProductFiles {
    /// Scan `dir` for exactly one `LED-*`, exactly one `VOL-*` and one or two `IMG-*` files
    pub fn discover<P: AsRef<Path>>(dir: P) -> SarResult<Self> {
        let directory = dir.as_ref().to_path_buf();
        if !directory.is_dir() {
            return Err(SarError::ProductStructure(format!(
                "Product directory not found: {}",
                directory.display()
            )));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        let files = Self::from_names(&directory, &names)?;
        log::info!(
            "Discovered product in {}: leader {}, {} image file(s)",
            directory.display(),
            files.leader.display(),
            files.images.len()
        );
        Ok(files)
    }

    /// Same as [`ProductFiles::discover`] over an explicit list of file names
    pub fn from_names(directory: &Path, names: &[String]) -> SarResult<Self> {
        let leader = single(directory, names, "LED-")?;
        let volume = single(directory, names, "VOL-")?;

        let image_pattern = Regex::new(r"^IMG-(HH|HV|VH|VV)-(.+)$")
            .map_err(|e| SarError::ProductStructure(format!("Invalid image name pattern: {}", e)))?;

        let mut images: Vec<ImageFile> = names
            .iter()
            .filter(|n| n.starts_with("IMG-"))
            .map(|n| ImageFile {
                path: directory.join(n),
                polarization: image_pattern
                    .captures(n)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse().ok()),
            })
            .collect();
        images.sort_by(|a, b| a.path.cmp(&b.path));

        match images.len() {
            1 | 2 => {}
            0 => {
                return Err(SarError::ProductStructure(format!(
                    "No IMG- file in {}",
                    directory.display()
                )))
            }
            n => {
                return Err(SarError::ProductStructure(format!(
                    "Expected one or two IMG- files in {}, found {}",
                    directory.display(),
                    n
                )))
            }
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            leader,
            volume,
            images,
        })
    }

    /// Image used when no polarization is requested
    pub fn primary_image(&self) -> SarResult<&ImageFile> {
        self.images.first().ok_or_else(|| {
            SarError::ProductStructure(format!("No IMG- file in {}", self.directory.display()))
        })
    }

    pub fn image(&self, polarization: Polarization) -> SarResult<&ImageFile> {
        self.images
            .iter()
            .find(|img| img.polarization == Some(polarization))
            .ok_or_else(|| {
                SarError::ProductStructure(format!(
                    "No {} image in {}",
                    polarization,
                    self.directory.display()
                ))
            })
    }

    pub fn polarizations(&self) -> Vec<Polarization> {
        self.images.iter().filter_map(|img| img.polarization).collect()
    }

    /// Scene identifier taken from the leader file name
    pub fn scene_id(&self) -> Option<&str> {
        self.leader
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("LED-"))
    }
}

fn single(directory: &Path, names: &[String], prefix: &str) -> SarResult<PathBuf> {
    let mut matches = names.iter().filter(|n| n.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(name), None) => Ok(directory.join(name)),
        (None, _) => Err(SarError::ProductStructure(format!(
            "No {} file in {}",
            prefix,
            directory.display()
        ))),
        (Some(first), Some(second)) => Err(SarError::ProductStructure(format!(
            "Multiple {} files in {}: {}, {}",
            prefix,
            directory.display(),
            first,
            second
        ))),
    }
}
