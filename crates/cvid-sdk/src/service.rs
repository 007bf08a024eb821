use std::sync::{Arc, Mutex, MutexGuard};

use cvid_cache::WalkCache;
use cvid_graph::{GraphNode, GraphVisitor, StructuralRecord};
use cvid_runtime::ObjectSpace;
use cvid_types::Digest;
use cvid_walk::{GlobalsEnumerator, Walker};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::digest::DigestBuilder;
use crate::error::SdkResult;

/// Compiler-visible identities for the nodes of one object space.
///
/// All walk-cache access is serialized through an internal lock. Records are
/// verified under that lock and replayed after it is released, so visitors
/// may call back into the service.
pub struct IdentityService {
    cache: Mutex<WalkCache>,
    config: SessionConfig,
}

impl IdentityService {
    /// A service over `space` with the default configuration.
    pub fn new(space: Arc<ObjectSpace>) -> Self {
        Self::with_config(space, SessionConfig::default())
    }

    pub fn with_config(space: Arc<ObjectSpace>, config: SessionConfig) -> Self {
        let walker = Walker::with_stable_modules(space, config.stable_modules());
        Self::from_walker(walker, config)
    }

    /// A service that reports compiler-visible globals through `globals`.
    pub fn with_globals_enumerator(
        space: Arc<ObjectSpace>,
        config: SessionConfig,
        globals: Arc<dyn GlobalsEnumerator>,
    ) -> Self {
        let walker = Walker::with_stable_modules(space, config.stable_modules())
            .with_globals_enumerator(globals);
        Self::from_walker(walker, config)
    }

    fn from_walker(walker: Walker, config: SessionConfig) -> Self {
        info!(
            stable_modules = walker.resolver().stable_modules().len(),
            max_reported = config.max_reported_unstable,
            "starting identity session"
        );
        let cache = WalkCache::new(walker)
            .with_max_reported(config.max_reported_unstable)
            .with_column_width(config.diff_column_width);
        Self {
            cache: Mutex::new(cache),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn space(&self) -> Arc<ObjectSpace> {
        Arc::clone(self.cache().walker().space())
    }

    fn cache(&self) -> MutexGuard<'_, WalkCache> {
        self.cache.lock().expect("walk cache lock poisoned")
    }

    /// The content digest of `node` and everything it reaches.
    ///
    /// Every reachable node is verified against the walk cache, so a digest
    /// is only returned if none of them changed since first seen.
    pub fn digest(&self, node: &GraphNode) -> SdkResult<Digest> {
        let mut cache = self.cache();
        let mut builder = DigestBuilder::new(&mut cache);
        let digest = builder.digest(node)?;
        debug!(digest = %digest.short_hex(), memoized = builder.memoized(), "computed digest");
        Ok(digest)
    }

    /// Walk `node` through the cache, streaming the verified record into
    /// `visitor`.
    pub fn visit(&self, node: &GraphNode, visitor: &mut dyn GraphVisitor) -> SdkResult<()> {
        let record = self.cache().verified_record(node)?;
        record.replay(visitor);
        Ok(())
    }

    /// An uncached walk of `node`.
    pub fn record(&self, node: &GraphNode) -> StructuralRecord {
        self.walker_call(|walker| walker.record(node))
    }

    /// An uncached walk of `node`, one rendered entry per line.
    pub fn render(&self, node: &GraphNode) -> String {
        self.walker_call(|walker| walker.render(node))
    }

    pub fn is_simple_constant(&self, node: &GraphNode) -> bool {
        self.walker_call(|walker| walker.is_simple_constant(node))
    }

    /// Re-walk every cached node and fail if any changed.
    pub fn check_for_instability(&self) -> SdkResult<()> {
        self.cache().check_for_instability()?;
        Ok(())
    }

    /// Forget every cached walk, starting a new session boundary.
    pub fn reset_cache(&self) {
        self.cache().reset();
    }

    /// Number of nodes in the walk cache.
    pub fn cached_nodes(&self) -> usize {
        self.cache().len()
    }

    fn walker_call<R>(&self, f: impl FnOnce(&Walker) -> R) -> R {
        f(self.cache().walker())
    }
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("config", &self.config)
            .field("cached_nodes", &self.cached_nodes())
            .finish()
    }
}
