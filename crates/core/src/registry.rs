//! Registry of loaded inference pipelines
//!
//! Loading a model is expensive, so pipelines are loaded once per model
//! identifier and reused. The registry is an explicit object owned by the
//! service's startup context with explicit teardown; nothing here is a
//! module-level global.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry mapping model identifiers to loaded pipelines.
///
/// `P` is the engine's pipeline handle type; this crate never inspects it.
/// Handles are shared as `Arc<P>` so callers can keep using a pipeline that
/// has since been removed from the registry.
#[derive(Debug)]
pub struct PipelineRegistry<P> {
    pipelines: RwLock<HashMap<String, Arc<P>>>,
}

impl<P> PipelineRegistry<P> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a loaded pipeline.
    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<Arc<P>> {
        self.pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .cloned()
    }

    /// Return the pipeline for `model_id`, loading it if absent.
    ///
    /// The loader runs under the write lock, so concurrent callers asking for
    /// the same model wait for one load instead of racing to duplicate it.
    /// A loader failure leaves the registry unchanged.
    pub fn get_or_try_insert_with<E>(
        &self,
        model_id: &str,
        load: impl FnOnce() -> std::result::Result<P, E>,
    ) -> std::result::Result<Arc<P>, E> {
        if let Some(pipeline) = self.get(model_id) {
            tracing::debug!(model_id, "using already-loaded pipeline");
            return Ok(pipeline);
        }

        let mut pipelines = self
            .pipelines
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Re-check: another caller may have loaded it while we waited.
        if let Some(pipeline) = pipelines.get(model_id) {
            return Ok(Arc::clone(pipeline));
        }

        tracing::info!(model_id, "loading pipeline");
        let pipeline = Arc::new(load()?);
        pipelines.insert(model_id.to_string(), Arc::clone(&pipeline));
        Ok(pipeline)
    }

    /// Drop a single pipeline from the registry.
    pub fn remove(&self, model_id: &str) -> Option<Arc<P>> {
        self.pipelines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(model_id)
    }

    /// Drop all pipelines. Outstanding `Arc` handles stay valid.
    pub fn clear(&self) {
        self.pipelines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of loaded pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the registry holds no pipelines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P> Default for PipelineRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Debug, PartialEq)]
    struct FakePipeline(&'static str);

    #[test]
    fn loads_once_per_model() {
        let registry = PipelineRegistry::new();
        let mut loads = 0;

        for _ in 0..3 {
            let pipeline = registry
                .get_or_try_insert_with::<Infallible>("small", || {
                    loads += 1;
                    Ok(FakePipeline("small"))
                })
                .unwrap();
            assert_eq!(*pipeline, FakePipeline("small"));
        }
        assert_eq!(loads, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn load_failure_leaves_registry_empty() {
        let registry: PipelineRegistry<FakePipeline> = PipelineRegistry::new();
        let result = registry.get_or_try_insert_with("tiny", || Err("model files missing"));
        assert_eq!(result.unwrap_err(), "model files missing");
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let registry = PipelineRegistry::new();
        registry
            .get_or_try_insert_with::<Infallible>("tiny", || Ok(FakePipeline("tiny")))
            .unwrap();
        let held = registry
            .get_or_try_insert_with::<Infallible>("small", || Ok(FakePipeline("small")))
            .unwrap();

        assert!(registry.remove("tiny").is_some());
        assert!(registry.get("tiny").is_none());

        registry.clear();
        assert!(registry.is_empty());
        // Outstanding handles survive teardown.
        assert_eq!(*held, FakePipeline("small"));
    }
}
