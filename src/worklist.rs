//! Work enumeration and admission filtering.
//!
//! A [`WorkUnit`] pairs one input prompt file with its derived output target.
//! [`enumerate`] lists the units for a run; [`Claims`] decides, per unit,
//! whether it is already done, already claimed by an earlier unit, or
//! admissible. The claim set is owned by the single dispatch loop and never
//! touched concurrently.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::BatchError;

/// Suffix marking an input file as a prompt to process.
pub const PROMPT_SUFFIX: &str = ".prompt";

/// One input artifact and its derived output target. Immutable once
/// enumerated; consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// File name of the input, e.g. "chapter-01.prompt".
    pub name: String,
    /// Full path to the input file.
    pub input_path: PathBuf,
    /// Output path, named by stripping the prompt suffix.
    pub target: PathBuf,
}

impl WorkUnit {
    pub fn new(name: &str, input_dir: &Path, output_dir: &Path) -> Self {
        let stem = name.strip_suffix(PROMPT_SUFFIX).unwrap_or(name);
        Self {
            name: name.to_string(),
            input_path: input_dir.join(name),
            target: output_dir.join(stem),
        }
    }
}

/// List the work units for one run: regular files with the prompt suffix and
/// non-zero size, sorted by name. A directory read failure is fatal for the
/// batch; no jobs are started.
pub fn enumerate(input_dir: &Path, output_dir: &Path) -> Result<Vec<WorkUnit>, BatchError> {
    let entries = std::fs::read_dir(input_dir).map_err(|source| BatchError::InputDir {
        dir: input_dir.display().to_string(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BatchError::InputDir {
            dir: input_dir.display().to_string(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.ends_with(PROMPT_SUFFIX) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() || metadata.len() == 0 {
            continue;
        }
        names.push(name.to_string());
    }

    // Directory iteration order is platform-dependent; sort for a
    // deterministic admission order within one listing.
    names.sort();

    Ok(names
        .iter()
        .map(|name| WorkUnit::new(name, input_dir, output_dir))
        .collect())
}

/// Admission decision for one work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Not done, not claimed: dispatch it.
    Admit,
    /// The output target already exists on disk.
    SkipDone,
    /// An earlier unit this run claimed the same output target.
    SkipDuplicate,
}

/// Output targets already assigned to admitted units. Single-writer: only
/// the dispatch loop calls [`Claims::plan`], so the check-then-claim sequence
/// needs no locking. Entries are never removed during a run.
#[derive(Debug, Default)]
pub struct Claims {
    claimed: HashSet<PathBuf>,
}

impl Claims {
    /// Decide whether `unit` may be admitted, claiming its target if so.
    pub fn plan(&mut self, unit: &WorkUnit) -> Admission {
        if unit.target.exists() {
            return Admission::SkipDone;
        }
        if self.claimed.contains(&unit.target) {
            return Admission::SkipDuplicate;
        }
        self.claimed.insert(unit.target.clone());
        Admission::Admit
    }
}
