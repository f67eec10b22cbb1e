//! Template Library
//!
//! The name → template mapping that matching reads and learning writes,
//! plus its JSON file format and a lock-guarded handle for embedders that
//! match and learn from different threads.

use super::template::GestureTemplate;
use crate::analysis::ShapeNormalizer;
use crate::geometry::Point;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Current library file format version
pub const LIBRARY_FORMAT_VERSION: &str = "1.0";

/// On-disk form of a library
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LibraryFile {
    format_version: String,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    templates: BTreeMap<String, GestureTemplate>,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Names written to the library (new or replaced)
    pub imported: Vec<String>,
    /// Names whose drawings had no usable shape
    pub skipped: Vec<String>,
}

/// Name → template mapping with unique keys
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, GestureTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template, replacing any template with the same name.
    ///
    /// Returns the replaced template.
    pub fn insert(&mut self, template: GestureTemplate) -> Option<GestureTemplate> {
        self.templates.insert(template.name.clone(), template)
    }

    pub fn get(&self, name: &str) -> Option<&GestureTemplate> {
        self.templates.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<GestureTemplate> {
        let removed = self.templates.remove(name);
        if removed.is_some() {
            info!(name = %name, "Deleted gesture template");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn clear(&mut self) {
        self.templates.clear();
    }

    /// Normalize and insert a batch of raw drawings keyed by name.
    ///
    /// Drawings without a usable shape are skipped and reported.
    pub fn import<I>(&mut self, drawings: I) -> ImportSummary
    where
        I: IntoIterator<Item = (String, Vec<Point>)>,
    {
        let normalizer = ShapeNormalizer::new();
        let mut summary = ImportSummary::default();

        for (name, raw) in drawings {
            let name = name.trim().to_string();
            if name.is_empty() {
                warn!(points = raw.len(), "Skipping unnamed template on import");
                summary.skipped.push(name);
                continue;
            }
            match GestureTemplate::from_sample_with(&normalizer, name.clone(), &raw) {
                Some(template) => {
                    self.insert(template);
                    summary.imported.push(name);
                }
                None => {
                    warn!(name = %name, points = raw.len(), "Skipping degenerate template on import");
                    summary.skipped.push(name);
                }
            }
        }

        info!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            "Imported gesture templates"
        );
        summary
    }

    /// Save the library to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = LibraryFile {
            format_version: LIBRARY_FORMAT_VERSION.to_string(),
            saved_at: Utc::now(),
            templates: self.templates.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a library from a JSON file.
    ///
    /// Logs a warning if the file was saved with a different format version,
    /// but still loads it. Fails if a template is stored under a key that is
    /// not its own name.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: LibraryFile = serde_json::from_str(&content)?;
        if file.format_version != LIBRARY_FORMAT_VERSION {
            warn!(
                path = %path.display(),
                found = %file.format_version,
                expected = LIBRARY_FORMAT_VERSION,
                "Template library has different format version"
            );
        }
        if let Some((key, template)) = file.templates.iter().find(|(k, t)| **k != t.name) {
            return Err(crate::Error::Library(format!(
                "template stored under '{}' is named '{}'",
                key, template.name
            )));
        }
        Ok(Self {
            templates: file.templates,
        })
    }

    /// Load from `path`, or start empty if the file does not exist yet.
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }
}

impl FromIterator<GestureTemplate> for TemplateLibrary {
    fn from_iter<T: IntoIterator<Item = GestureTemplate>>(iter: T) -> Self {
        let mut library = Self::new();
        for template in iter {
            library.insert(template);
        }
        library
    }
}

/// Thread-safe handle to a template library
///
/// Matching takes a read lock for the whole query and learning commits under
/// the write lock, so a reader never observes a half-written template.
#[derive(Debug, Clone, Default)]
pub struct SharedTemplateLibrary {
    inner: Arc<RwLock<TemplateLibrary>>,
}

impl SharedTemplateLibrary {
    pub fn new(library: TemplateLibrary) -> Self {
        Self {
            inner: Arc::new(RwLock::new(library)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TemplateLibrary> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TemplateLibrary> {
        self.inner.write()
    }

    /// Owned copy of the current contents
    pub fn snapshot(&self) -> TemplateLibrary {
        self.inner.read().clone()
    }

    pub fn insert(&self, template: GestureTemplate) -> Option<GestureTemplate> {
        self.inner.write().insert(template)
    }

    pub fn remove(&self, name: &str) -> Option<GestureTemplate> {
        self.inner.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
