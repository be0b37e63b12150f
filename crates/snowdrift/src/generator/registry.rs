use std::{collections::HashMap, sync::Arc};

use crate::{
    cache::CacheFactory,
    config::GeneratorConfig,
    error::Result,
    generator::SnowflakeGenerator,
    identity::{IdentityAssigner, WorkerSource},
    mutex::{Mutex, lock},
    time::TimeSource,
};

/// Datacenter and worker ids as requested by a caller.
type Request = (Option<u64>, Option<u64>);

/// Datacenter and worker ids after resolution.
type Pair = (u64, u64);

struct Slots<G> {
    /// Where each distinct request resolved to, so an unset id is drawn once.
    requests: HashMap<Request, Pair>,
    generators: HashMap<Pair, Arc<G>>,
}

/// Owns one generator per resolved datacenter/worker pair.
///
/// Generators are built lazily from a base [`GeneratorConfig`] on first
/// request and shared as [`Arc`] handles afterwards. Requests that resolve to
/// the same pair, explicitly or through a drawn datacenter id, share one
/// generator. Construct one registry at startup and pass it to whoever needs
/// identifiers; dropping it drops every generator nobody else holds.
pub struct GeneratorRegistry<T, F> {
    config: GeneratorConfig,
    time: T,
    caches: F,
    slots: Mutex<Slots<SnowflakeGenerator<T>>>,
}

impl<T, F> GeneratorRegistry<T, F>
where
    T: TimeSource<u64> + Clone,
    F: CacheFactory,
{
    pub fn new(config: GeneratorConfig, time: T, caches: F) -> Self {
        Self {
            config,
            time,
            caches,
            slots: Mutex::new(Slots {
                requests: HashMap::new(),
                generators: HashMap::new(),
            }),
        }
    }

    /// Returns the generator for `datacenter` and `worker`, building it on
    /// first use.
    ///
    /// `None` falls back to the base configuration: a random datacenter or
    /// the configured worker source. An unset id is resolved once per
    /// request shape; later calls with the same arguments get the same
    /// generator.
    ///
    /// # Errors
    ///
    /// Whatever [`IdentityAssigner::assign`] or [`GeneratorConfig::build`]
    /// reports. Failed builds are not cached.
    pub fn get(
        &self,
        datacenter: Option<u64>,
        worker: Option<u64>,
    ) -> Result<Arc<SnowflakeGenerator<T>>> {
        let mut slots = lock(&self.slots)?;
        let request = (datacenter, worker);
        let pair = match slots.requests.get(&request) {
            Some(&pair) => pair,
            None => self.resolve(datacenter, worker)?,
        };

        if let Some(generator) = slots.generators.get(&pair) {
            let generator = Arc::clone(generator);
            slots.requests.insert(request, pair);
            return Ok(generator);
        }

        let (datacenter_id, worker_id) = pair;
        let config = GeneratorConfig {
            datacenter_id: Some(datacenter_id),
            worker: WorkerSource::Explicit(worker_id),
            ..self.config.clone()
        };
        let generator = Arc::new(config.build(self.time.clone(), &self.caches)?);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            ?datacenter,
            ?worker,
            identity = ?generator.identity(),
            "registered generator"
        );

        slots.requests.insert(request, pair);
        slots.generators.insert(pair, Arc::clone(&generator));
        Ok(generator)
    }

    fn resolve(&self, datacenter: Option<u64>, worker: Option<u64>) -> Result<Pair> {
        let source = worker.map_or_else(|| self.config.worker.clone(), WorkerSource::Explicit);
        let identity = IdentityAssigner::new(self.config.layout).assign(
            datacenter.or(self.config.datacenter_id),
            &source,
            self.config.origin,
        )?;
        Ok((identity.datacenter, identity.worker))
    }

    /// Number of generators built so far.
    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.slots)?.generators.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}
