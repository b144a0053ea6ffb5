//! Definition Loader
//!
//! Discovers one `<id>.yaml` per practice in the base directory, pairs each
//! with a same-named file in the delta directory (if any), merges, assembles,
//! and constraint-checks. Delta files without a base counterpart are loaded
//! as practices in their own right. Any failure aborts the whole load.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::constraints::check_constraints;
use super::definition::{PracticeDefinition, PracticeDelta};
use super::Practice;
use crate::config::EngineConfig;
use crate::errors::DefinitionError;

const DEFINITION_EXT: &str = "yaml";

lazy_static! {
    static ref PRACTICE_FILE_NAME: Regex = Regex::new(r"^[a-z][a-zA-Z0-9]+\.yaml$").unwrap();
}

/// One practice's files on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSource {
    pub id: String,
    pub base: PathBuf,
    pub delta: Option<PathBuf>,
}

/// Loads practice definitions from a base directory and an optional delta directory
#[derive(Debug, Clone)]
pub struct PracticeLoader {
    dir: PathBuf,
    delta_dir: Option<PathBuf>,
    parallel: bool,
}

impl PracticeLoader {
    pub fn new(dir: impl Into<PathBuf>, delta_dir: Option<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            delta_dir,
            parallel: true,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.practices_dir.clone(), config.delta_dir.clone()).parallel(config.parallel)
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Loads every practice, ordered by ID. Practices removed by a delta are absent.
    pub fn load(&self) -> Result<Vec<Practice>, DefinitionError> {
        let sources = self.discover()?;

        let parsed: Vec<Option<Practice>> = if self.parallel {
            sources.par_iter().map(parse_source).collect::<Result<_, _>>()?
        } else {
            sources.iter().map(parse_source).collect::<Result<_, _>>()?
        };

        let mut practices: Vec<Practice> = parsed.into_iter().flatten().collect();
        practices.sort_by(|a, b| a.id.cmp(&b.id));
        info!("Loaded {} practices from {:?}", practices.len(), self.dir);
        Ok(practices)
    }

    /// Pairs every base file with its delta, and adds unmatched delta files
    pub fn discover(&self) -> Result<Vec<PracticeSource>, DefinitionError> {
        let mut by_id: BTreeMap<String, PracticeSource> = BTreeMap::new();

        let deltas: BTreeMap<String, PathBuf> = match &self.delta_dir {
            Some(delta_dir) => yaml_files(delta_dir)?
                .into_iter()
                .map(|path| Ok((practice_id(&path)?, path)))
                .collect::<Result<_, DefinitionError>>()?,
            None => BTreeMap::new(),
        };

        // The delta directory may live inside the base directory
        let delta_root = self.delta_dir.as_deref().and_then(|d| fs::canonicalize(d).ok());
        let in_delta_dir = |path: &Path| match &delta_root {
            Some(root) => fs::canonicalize(path).is_ok_and(|p| p.starts_with(root)),
            None => false,
        };

        for base in yaml_files(&self.dir)? {
            if in_delta_dir(base.as_path()) {
                continue;
            }
            let id = practice_id(&base)?;
            let delta = deltas.get(&id).cloned();
            if delta.is_some() {
                info!("Found delta for practice {}", id);
            }
            insert_source(&mut by_id, PracticeSource { id, base, delta })?;
        }

        for (id, path) in deltas {
            if by_id.contains_key(&id) {
                continue;
            }
            debug!("Delta file {:?} has no base practice, loading it as a practice", path);
            insert_source(
                &mut by_id,
                PracticeSource {
                    id,
                    base: path,
                    delta: None,
                },
            )?;
        }

        Ok(by_id.into_values().collect())
    }
}

/// Loads `base_dir` with deltas from `delta_dir`
pub fn load(base_dir: &Path, delta_dir: Option<&Path>) -> Result<Vec<Practice>, DefinitionError> {
    PracticeLoader::new(base_dir, delta_dir.map(Path::to_path_buf)).load()
}

/// Builds a practice from raw definition text.
///
/// Returns `Ok(None)` when the merged definition is marked `remove`.
pub fn assemble_practice(
    id: &str,
    base_path: &Path,
    base_raw: &str,
    delta: Option<(&Path, &str)>,
) -> Result<Option<Practice>, DefinitionError> {
    let def: PracticeDefinition =
        serde_yaml::from_str(base_raw).map_err(|e| DefinitionError::Malformed {
            path: base_path.to_path_buf(),
            message: e.to_string(),
        })?;
    if !def.id.is_empty() && def.id != id {
        return Err(DefinitionError::IdMismatch {
            path: base_path.to_path_buf(),
            expected: id.to_string(),
            found: def.id,
        });
    }

    let def = match delta {
        Some((delta_path, delta_raw)) => {
            let delta = parse_delta(delta_path, delta_raw)?;
            if let Some(delta_id) = delta.id.as_deref().filter(|d| *d != id) {
                debug!("Delta {:?} carries ID {}, using {}", delta_path, delta_id, id);
            }
            def.merge(id, delta)?
        }
        None => def,
    };

    if def.remove {
        info!("Practice {} removed by delta", id);
        return Ok(None);
    }

    let mut practice = def.into_practice(id)?;
    check_constraints(&mut practice)?;
    Ok(Some(practice))
}

fn parse_delta(path: &Path, raw: &str) -> Result<PracticeDelta, DefinitionError> {
    if raw.trim().is_empty() {
        return Ok(PracticeDelta::default());
    }
    serde_yaml::from_str(raw).map_err(|e| DefinitionError::Malformed {
        path: path.to_path_buf(),
        message: format!("delta: {}", e),
    })
}

fn parse_source(source: &PracticeSource) -> Result<Option<Practice>, DefinitionError> {
    let base_raw = read(&source.base)?;
    let delta_raw = source.delta.as_deref().map(read).transpose()?;
    let delta = source.delta.as_deref().zip(delta_raw.as_deref());
    assemble_practice(&source.id, &source.base, &base_raw, delta)
}

fn read(path: &Path) -> Result<String, DefinitionError> {
    fs::read_to_string(path).map_err(|e| DefinitionError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn insert_source(
    by_id: &mut BTreeMap<String, PracticeSource>,
    source: PracticeSource,
) -> Result<(), DefinitionError> {
    if let Some(existing) = by_id.get(&source.id) {
        return Err(DefinitionError::DuplicatePractice {
            id: source.id.clone(),
            first: existing.base.clone(),
            second: source.base,
        });
    }
    by_id.insert(source.id.clone(), source);
    Ok(())
}

fn practice_id(path: &Path) -> Result<String, DefinitionError> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if !PRACTICE_FILE_NAME.is_match(name) {
        return Err(DefinitionError::BadFileName {
            path: path.to_path_buf(),
        });
    }
    Ok(name.trim_end_matches(".yaml").to_string())
}

/// Every `.yaml` file under `dir`, recursively, in path order
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, DefinitionError> {
    let io_err = |e: std::io::Error| DefinitionError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            files.extend(yaml_files(&path)?);
        } else if path.extension().and_then(|e| e.to_str()) == Some(DEFINITION_EXT) {
            files.push(path);
        }
    }
    Ok(files)
}
