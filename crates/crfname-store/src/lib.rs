//! # crfname Store
//!
//! SQLite persistence around the core pipeline: a model table that hands
//! blobs to the [`ModelRegistry`], and a cache of parse results keyed by the
//! original input text.

pub mod error;
pub mod store;

use std::sync::Arc;

use crfname_core::{decode, CrfNameError, Model, ModelRegistry, ParseResult, UNKNOWN_VERSION};
use tracing::{debug, info};

pub use error::{Result, StoreError};
pub use store::{ModelStore, StoredModel, CACHE_ENABLED, DEFAULT_CACHE_MAX_AGE};

/// Load a stored model into registry slot `slot`.
///
/// With `name = None` the store's active model is used.
pub fn load_into_registry(
    store: &ModelStore,
    registry: &ModelRegistry,
    slot: &str,
    name: Option<&str>,
) -> Result<Arc<Model>> {
    let stored = match name {
        Some(name) => store.model_by_name(name)?,
        None => store.active_model()?,
    };

    let model = registry.load_versioned(slot, &stored.version, stored.data)?;
    info!(
        "registry slot '{slot}' now holds stored model '{}' ({})",
        stored.name, stored.version
    );
    Ok(model)
}

/// Decode `text` with registry slot `slot`, answering from the cache when it
/// holds a fresh result produced by the same model name and version.
///
/// Models without a known version are never cached.
pub fn decode_cached(
    store: &ModelStore,
    registry: &ModelRegistry,
    slot: &str,
    text: &str,
) -> Result<ParseResult> {
    let model = registry
        .get(slot)
        .ok_or_else(|| CrfNameError::ModelNotLoaded(slot.to_string()))?;
    let cacheable = model.version() != UNKNOWN_VERSION;

    if cacheable {
        if let Some(cached) = store.cached_result(text, model.name(), DEFAULT_CACHE_MAX_AGE)? {
            if cached.model_version == model.version() {
                debug!("cache hit for '{text}' in '{slot}'");
                return Ok(cached);
            }
        }
    }

    let result = decode(text, Some(&*model))?;
    if cacheable {
        store.cache_result(model.name(), &result)?;
    }
    Ok(result)
}
