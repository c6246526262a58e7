use crate::ini::IniDocument;
use crate::model::{schema_for, ConfigIssue, ConfigUpdate, Configuration};
use redditlens_core::{ConfigError, CoreError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const MASK: &str = "********";

/// Sole reader and writer of the pipeline configuration file.
///
/// Nothing is cached between calls: every operation starts from the file as
/// it currently is on disk, so edits made by other tools are never clobbered
/// with stale values.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Configuration, CoreError> {
        let (_, doc) = self.read_document()?;
        Configuration::from_document(&doc).map_err(|issues| {
            let issue = first_issue(issues, None);
            warn!("Configuration at {} is malformed: {}", self.path.display(), issue);
            CoreError::Config(ConfigError::Malformed {
                section: issue.section,
                key: issue.key,
                reason: issue.reason,
            })
        })
    }

    /// Every problem with the file, for status display. Never fails.
    pub fn check(&self) -> Vec<ConfigIssue> {
        match self.read_document() {
            Ok((_, doc)) => Configuration::from_document(&doc).err().unwrap_or_default(),
            Err(e) => vec![ConfigIssue::new("*", "*", e.to_string())],
        }
    }

    /// Reloads the file, applies `update`, validates the result and replaces
    /// the file in one step. On any failure the file is left untouched.
    pub fn save(&self, update: &ConfigUpdate) -> Result<(), CoreError> {
        let (original, mut doc) = self.read_document()?;

        for (section, key, value) in update.iter() {
            let known = schema_for(section).is_some_and(|schema| schema.knows(key));
            if !known {
                return Err(validation_error(section, key, "unknown configuration key"));
            }
            if value.contains(['\n', '\r']) {
                return Err(validation_error(
                    section,
                    key,
                    "value must fit on a single line",
                ));
            }
            doc.set(section, key, value);
        }

        if let Err(issues) = Configuration::from_document(&doc) {
            let issue = first_issue(issues, Some(update));
            warn!(
                "Rejected configuration update for {}: {}",
                self.path.display(),
                issue
            );
            return Err(validation_error(&issue.section, &issue.key, issue.reason));
        }

        let rendered = doc.render();
        if rendered == original {
            debug!("Configuration update is a no-op, leaving file untouched");
            return Ok(());
        }

        self.write_atomically(&rendered)?;
        info!(
            "Saved configuration to {} ({} key(s) updated)",
            self.path.display(),
            update.iter().count()
        );
        Ok(())
    }

    /// The file text with secrets and passwords masked.
    pub fn redacted_contents(&self) -> Result<String, CoreError> {
        let (_, mut doc) = self.read_document()?;
        doc.mask_values(|key| key.contains("secret") || key.contains("password"), MASK);
        Ok(doc.render())
    }

    fn read_document(&self) -> Result<(String, IniDocument), CoreError> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CoreError::Config(ConfigError::Missing {
                    path: self.path.display().to_string(),
                })
            } else {
                CoreError::Io(e)
            }
        })?;
        let doc = IniDocument::parse(&text)?;
        debug!("Read configuration from {}", self.path.display());
        Ok((text, doc))
    }

    fn write_atomically(&self, contents: &str) -> Result<(), CoreError> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.write_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_error(e))?;

        // The temp file is created owner-only; keep whatever the original allowed.
        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), metadata.permissions())
                .map_err(|e| self.write_error(e))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, e: std::io::Error) -> CoreError {
        CoreError::Config(ConfigError::Write {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn validation_error(section: &str, key: &str, reason: impl Into<String>) -> CoreError {
    CoreError::Config(ConfigError::Validation {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    })
}

/// Prefers an issue on a key the caller just changed.
fn first_issue(issues: Vec<ConfigIssue>, update: Option<&ConfigUpdate>) -> ConfigIssue {
    let position = update
        .and_then(|update| {
            issues
                .iter()
                .position(|issue| update.touches(&issue.section, &issue.key))
        })
        .unwrap_or(0);
    issues
        .into_iter()
        .nth(position)
        .unwrap_or_else(|| ConfigIssue::new("*", "*", "invalid configuration"))
}
