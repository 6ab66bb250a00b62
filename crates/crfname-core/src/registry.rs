//! # Model Registry
//!
//! Named slots ("person", "company", "generic", ...) holding loaded models.
//! Each slot stores an `Arc<Model>`: a reload builds the new model completely
//! and then swaps the pointer, so callers holding the previous `Arc` keep a
//! valid model until they drop it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::crf::CrfBackend;
use crate::error::{CrfNameError, Result};
use crate::model::{Model, ModelBackend, UNKNOWN_VERSION};
use crate::parser::decoder::decode;
use crate::types::ParseResult;

/// Where model bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        ModelSource::File(path)
    }
}

impl From<&Path> for ModelSource {
    fn from(path: &Path) -> Self {
        ModelSource::File(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ModelSource {
    fn from(bytes: Vec<u8>) -> Self {
        ModelSource::Bytes(bytes)
    }
}

/// Thread-safe collection of named models.
pub struct ModelRegistry {
    backend: Box<dyn ModelBackend>,
    models: RwLock<HashMap<String, Arc<Model>>>,
    default_name: RwLock<Option<String>>,
}

impl ModelRegistry {
    /// Registry that opens blobs with the built-in CRF backend.
    pub fn new() -> Self {
        Self::with_backend(CrfBackend)
    }

    pub fn with_backend(backend: impl ModelBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            models: RwLock::new(HashMap::new()),
            default_name: RwLock::new(None),
        }
    }

    /// Load a model into slot `name` with an unknown version.
    pub fn load(&self, name: &str, source: impl Into<ModelSource>) -> Result<Arc<Model>> {
        self.load_versioned(name, UNKNOWN_VERSION, source)
    }

    /// Load a model into slot `name`, replacing any model already there.
    ///
    /// On failure the slot keeps its previous model.
    ///
    /// # Errors
    ///
    /// * `ModelNotFound` if a source file does not exist
    /// * `OutOfMemory` if the file contents cannot be buffered
    /// * `ModelLoadFailed` if the backend rejects the bytes
    pub fn load_versioned(
        &self,
        name: &str,
        version: &str,
        source: impl Into<ModelSource>,
    ) -> Result<Arc<Model>> {
        let bytes = match source.into() {
            ModelSource::File(path) => read_model_file(&path)?,
            ModelSource::Bytes(bytes) => bytes,
        };

        let opened = self.backend.open(&bytes)?;
        let model = Model::new(name, version, opened);
        if !model.is_loaded() {
            return Err(CrfNameError::ModelLoadFailed(format!(
                "model for '{name}' has an empty label dictionary"
            )));
        }
        info!(
            "loaded model '{}' version {} ({} labels, {} attributes)",
            name,
            version,
            model.labels().len(),
            model.attributes().len()
        );
        Ok(self.insert(model))
    }

    /// Publish an already built model under its own name.
    pub fn insert(&self, model: Model) -> Arc<Model> {
        let model = Arc::new(model);
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        models.insert(model.name().to_string(), Arc::clone(&model));
        model
    }

    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        models.get(name).cloned()
    }

    /// Remove slot `name`. Outstanding handles stay valid.
    pub fn unload(&self, name: &str) -> Option<Arc<Model>> {
        let removed = {
            let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
            models.remove(name)
        };
        if removed.is_some() {
            info!("unloaded model '{name}'");
            let mut default = self.default_name.write().unwrap_or_else(PoisonError::into_inner);
            if default.as_deref() == Some(name) {
                *default = None;
            }
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        models.contains_key(name)
    }

    /// Loaded slot names, sorted.
    pub fn names(&self) -> Vec<String> {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark slot `name` as the active model.
    pub fn set_default(&self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(CrfNameError::ModelNotFound(name.to_string()));
        }
        let mut default = self.default_name.write().unwrap_or_else(PoisonError::into_inner);
        *default = Some(name.to_string());
        Ok(())
    }

    pub fn default_model(&self) -> Option<Arc<Model>> {
        let name = self
            .default_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        self.get(&name)
    }

    /// Decode `text` with the model in slot `name`.
    pub fn decode(&self, name: &str, text: &str) -> Result<ParseResult> {
        let model = self.get(name);
        decode(text, model.as_deref()).map_err(|err| match err {
            CrfNameError::ModelNotLoaded(_) if model.is_none() => {
                CrfNameError::ModelNotLoaded(name.to_string())
            }
            other => other,
        })
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_model_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CrfNameError::ModelNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let len = usize::try_from(file.metadata()?.len()).map_err(|_| {
        CrfNameError::OutOfMemory(format!("{} is too large to buffer", path.display()))
    })?;
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(len).map_err(|e| {
        CrfNameError::OutOfMemory(format!(
            "cannot reserve {len} bytes for {}: {e}",
            path.display()
        ))
    })?;
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
