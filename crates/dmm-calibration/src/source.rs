//! Where calibration documents come from
//!
//! A [`CalibrationSource`] hands out document text by name (without the
//! `.json` extension). A missing document is not an error; the store decides
//! what to fall back to.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::CalibrationError;

/// Supplier of calibration document text
pub trait CalibrationSource: Send + Sync {
    /// Load the document called `name`, or `None` if this source has no such document
    fn load(&self, name: &str) -> Option<String>;
}

/// Documents stored as `<name>.json` in a directory
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    /// Use `root` as the asset directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document would be read from
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    /// Read a document, distinguishing "absent" from "unreadable"
    pub fn read(&self, name: &str) -> Result<Option<String>, CalibrationError> {
        let path = self.path_for(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CalibrationError::Io { path, source }),
        }
    }
}

impl CalibrationSource for AssetDir {
    fn load(&self, name: &str) -> Option<String> {
        match self.read(name) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }
}

/// Documents held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(name.into(), text.into());
    }

    /// Builder-style [`MemorySource::insert`]
    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }
}

impl CalibrationSource for MemorySource {
    fn load(&self, name: &str) -> Option<String> {
        self.docs.get(name).cloned()
    }
}

/// Calibration documents compiled into the binary
const BUILTIN_DOCUMENTS: &[(&str, &str)] = &[
    ("funOl", include_str!("../assets/funOl.json")),
    ("funOl_UT61D+", include_str!("../assets/funOl_UT61D+.json")),
];

/// The calibration documents shipped with this crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl BuiltinSource {
    /// Names of the built-in documents
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN_DOCUMENTS.iter().map(|(name, _)| *name)
    }
}

impl CalibrationSource for BuiltinSource {
    fn load(&self, name: &str) -> Option<String> {
        BUILTIN_DOCUMENTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| text.to_string())
    }
}

/// Several sources searched in order; the first one with the document wins
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn CalibrationSource>>,
}

impl LayeredSource {
    /// Create an empty stack of sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source below the existing ones
    pub fn with_layer(mut self, source: impl CalibrationSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl CalibrationSource for LayeredSource {
    fn load(&self, name: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.load(name))
    }
}
