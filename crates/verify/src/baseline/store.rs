//! Reference and local baseline directories
//!
//! `reference/` holds the accepted snapshots and is checked in. A run that
//! produces something different writes it to `local/` under the same
//! relative name, where it waits to be reviewed and accepted. A snapshot
//! that became empty is recorded as `<name>.delete` instead.

use crate::diff::unified_diff;
use markcheck_core::{BaselineConfig, Error, Result, ResultExt};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stand-in text for a snapshot with no content
pub const NO_CONTENT: &str = "<no content>";

const DELETE_SUFFIX: &str = ".delete";

/// Whether a run compares against references or rewrites them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineMode {
    #[default]
    Compare,
    Accept,
}

/// A local snapshot waiting to replace (or delete) its reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBaseline {
    /// Path relative to the baseline directories
    pub name: String,
    pub local: PathBuf,
    pub reference: PathBuf,
    pub delete: bool,
}

#[derive(Debug, Clone)]
pub struct BaselineStore {
    reference_dir: PathBuf,
    local_dir: PathBuf,
    mode: BaselineMode,
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::with_context(format!("reading {}", path.display()), e)),
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::with_context(format!("removing {}", path.display()), e)),
    }
}

fn write_creating_dirs(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!("creating {}", parent.display()))?;
    }
    fs::write(path, content).context(format!("writing {}", path.display()))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

impl BaselineStore {
    pub fn new(reference_dir: impl Into<PathBuf>, local_dir: impl Into<PathBuf>, mode: BaselineMode) -> Self {
        Self {
            reference_dir: reference_dir.into(),
            local_dir: local_dir.into(),
            mode,
        }
    }

    pub fn from_config(config: &BaselineConfig) -> Self {
        let mode = if config.accept {
            BaselineMode::Accept
        } else {
            BaselineMode::Compare
        };
        Self::new(&config.reference_dir, &config.local_dir, mode)
    }

    pub fn mode(&self) -> BaselineMode {
        self.mode
    }

    pub fn reference_path(&self, name: &str) -> PathBuf {
        self.reference_dir.join(name)
    }

    pub fn local_path(&self, name: &str) -> PathBuf {
        self.local_dir.join(name)
    }

    /// Compares `actual` with the reference called `name`, or rewrites it in accept mode
    ///
    /// Any local file left by an earlier run under the same name is removed
    /// first, so `local/` only ever holds results of the latest run.
    pub fn run(&self, name: &str, actual: &str) -> Result<()> {
        let actual = if actual.is_empty() { NO_CONTENT } else { actual };
        let reference = self.reference_path(name);
        let local = self.local_path(name);
        remove_if_exists(&local)?;
        remove_if_exists(&with_suffix(&local, DELETE_SUFFIX))?;

        let expected = read_optional(&reference)?;

        if self.mode == BaselineMode::Accept {
            if actual == NO_CONTENT {
                remove_if_exists(&reference)?;
            } else {
                write_creating_dirs(&reference, actual)?;
            }
            info!(baseline = name, "Accepted baseline");
            return Ok(());
        }

        let expected_text = expected.as_deref().unwrap_or(NO_CONTENT);
        if expected_text == actual {
            debug!(baseline = name, "Baseline matches");
            return Ok(());
        }

        if actual == NO_CONTENT && expected.is_some() {
            write_creating_dirs(&with_suffix(&local, DELETE_SUFFIX), "")?;
        } else {
            write_creating_dirs(&local, actual)?;
        }

        if expected.is_none() {
            warn!(baseline = name, "No reference baseline");
            return Err(Error::new_baseline(local.display().to_string()));
        }
        let diff = unified_diff(
            expected_text,
            actual,
            &format!("old.{name}"),
            &format!("new.{name}"),
        );
        Err(Error::baseline_mismatch(name, diff))
    }

    /// Local snapshots written by earlier runs, in path order
    pub fn pending(&self) -> Result<Vec<PendingBaseline>> {
        if !self.local_dir.exists() {
            return Ok(Vec::new());
        }
        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&self.local_dir.to_string_lossy())
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;

        let mut pending = Vec::new();
        for local in entries.flatten().filter(|p| p.is_file()) {
            let Ok(relative) = local.strip_prefix(&self.local_dir) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let (name, delete) = match relative.strip_suffix(DELETE_SUFFIX) {
                Some(name) => (name.to_string(), true),
                None => (relative, false),
            };
            pending.push(PendingBaseline {
                reference: self.reference_path(&name),
                name,
                local,
                delete,
            });
        }
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pending)
    }

    /// Promotes one local snapshot to the reference directory
    pub fn accept(&self, pending: &PendingBaseline) -> Result<()> {
        if pending.delete {
            remove_if_exists(&pending.reference)?;
        } else {
            let content = fs::read_to_string(&pending.local)
                .context(format!("reading {}", pending.local.display()))?;
            write_creating_dirs(&pending.reference, &content)?;
        }
        remove_if_exists(&pending.local)?;
        info!(baseline = %pending.name, delete = pending.delete, "Accepted baseline");
        Ok(())
    }

    pub fn accept_all(&self) -> Result<Vec<PendingBaseline>> {
        let pending = self.pending()?;
        for baseline in &pending {
            self.accept(baseline)?;
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store(dir: &TempDir, mode: BaselineMode) -> BaselineStore {
        BaselineStore::new(dir.path().join("reference"), dir.path().join("local"), mode)
    }

    #[test]
    fn test_missing_reference_creates_local() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, BaselineMode::Compare);
        let err = store.run("hover/x.baseline", "content").unwrap_err();
        assert!(matches!(err, Error::NewBaseline { .. }));
        assert_eq!(
            fs::read_to_string(store.local_path("hover/x.baseline")).expect("local"),
            "content"
        );
    }

    #[test]
    fn test_empty_result_without_reference_passes() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, BaselineMode::Compare);
        store.run("hover/x.baseline", "").expect("no content matches missing reference");
        assert!(store.pending().expect("pending").is_empty());
    }

    #[test]
    fn test_mismatch_carries_diff_and_clears_on_match() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, BaselineMode::Compare);
        write_creating_dirs(&store.reference_path("goToDef/x.baseline.jsonc"), "a\nb\n").expect("seed");

        let err = store.run("goToDef/x.baseline.jsonc", "a\nc\n").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("baseline file goToDef/x.baseline.jsonc has changed"));
        assert!(message.contains("-b\n"));
        assert!(message.contains("+c\n"));
        assert_eq!(store.pending().expect("pending").len(), 1);

        store.run("goToDef/x.baseline.jsonc", "a\nb\n").expect("matches");
        assert!(store.pending().expect("pending").is_empty());
    }

    #[test]
    fn test_accept_promotes_and_deletes() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, BaselineMode::Compare);
        write_creating_dirs(&store.reference_path("hover/gone.baseline"), "old").expect("seed");

        assert!(store.run("hover/new.baseline", "fresh").is_err());
        assert!(store.run("hover/gone.baseline", "").is_err());

        let pending = store.pending().expect("pending");
        let names: Vec<(&str, bool)> = pending.iter().map(|p| (p.name.as_str(), p.delete)).collect();
        assert_eq!(names, vec![("hover/gone.baseline", true), ("hover/new.baseline", false)]);

        store.accept_all().expect("accept");
        assert!(!store.reference_path("hover/gone.baseline").exists());
        assert_eq!(
            fs::read_to_string(store.reference_path("hover/new.baseline")).expect("reference"),
            "fresh"
        );
        assert!(store.pending().expect("pending").is_empty());
    }

    #[test]
    fn test_accept_mode_rewrites_reference() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir, BaselineMode::Accept);
        store.run("findAllRef/x.baseline.jsonc", "snapshot").expect("accept");
        assert_eq!(
            fs::read_to_string(store.reference_path("findAllRef/x.baseline.jsonc")).expect("reference"),
            "snapshot"
        );
        assert!(!store.local_path("findAllRef/x.baseline.jsonc").exists());
    }
}
