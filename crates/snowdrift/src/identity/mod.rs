//! Datacenter and worker id assignment.
mod crc32;

pub use crc32::crc32;

use crate::{
    RandSource, ThreadRandom,
    error::{ConfigurationError, Result},
    id::{BitLayout, Field, Origin},
};

/// Where a generator's worker id comes from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WorkerSource {
    /// Use this id as is. Must fit the worker field.
    Explicit(u64),
    /// Hash this seed into the worker field.
    Seed(String),
    /// Hash the system hostname into the worker field.
    #[default]
    Hostname,
}

/// The resolved, immutable identity encoded into every identifier of one
/// generator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GeneratorIdentity {
    pub datacenter: u64,
    pub worker: u64,
    pub origin: Origin,
}

/// Derives and validates datacenter and worker ids for a [`BitLayout`].
///
/// Derived ids are not coordinated: two processes may end up with the same
/// pair. Assigning distinct ids across a fleet is an operational concern.
#[derive(Clone, Debug)]
pub struct IdentityAssigner<R = ThreadRandom> {
    layout: BitLayout,
    rng: R,
}

impl IdentityAssigner {
    pub fn new(layout: BitLayout) -> Self {
        Self::with_rng(layout, ThreadRandom)
    }
}

impl<R> IdentityAssigner<R>
where
    R: RandSource<u32>,
{
    pub const fn with_rng(layout: BitLayout, rng: R) -> Self {
        Self { layout, rng }
    }

    /// Hashes `seed` with CRC-32 into the worker range. Stable across
    /// processes.
    pub fn resolve_worker_id(&self, seed: &[u8]) -> u64 {
        u64::from(crc32(seed)) % (self.layout.max(Field::Worker) + 1)
    }

    /// Draws a uniformly random datacenter id.
    pub fn resolve_datacenter_id(&self) -> u64 {
        u64::from(self.rng.rand()) % (self.layout.max(Field::Datacenter) + 1)
    }

    /// Resolves the worker id from `source`.
    ///
    /// An unreadable or empty hostname is replaced by eight random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::IdOutOfRange`] if an explicit id does not
    /// fit the worker field.
    pub fn worker(&self, source: &WorkerSource) -> Result<u64> {
        match source {
            WorkerSource::Explicit(id) => self.checked(Field::Worker, *id),
            WorkerSource::Seed(seed) => Ok(self.resolve_worker_id(seed.as_bytes())),
            WorkerSource::Hostname => {
                let hostname = gethostname::gethostname();
                let seed = hostname.as_encoded_bytes();
                if seed.is_empty() {
                    let random = (u64::from(self.rng.rand()) << 32) | u64::from(self.rng.rand());
                    Ok(self.resolve_worker_id(&random.to_le_bytes()))
                } else {
                    Ok(self.resolve_worker_id(seed))
                }
            }
        }
    }

    /// Resolves the datacenter id, drawing a random one if none is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::IdOutOfRange`] if an explicit id does not
    /// fit the datacenter field.
    pub fn datacenter(&self, explicit: Option<u64>) -> Result<u64> {
        explicit.map_or_else(
            || Ok(self.resolve_datacenter_id()),
            |id| self.checked(Field::Datacenter, id),
        )
    }

    /// Resolves a complete identity.
    ///
    /// # Errors
    ///
    /// See [`Self::datacenter`] and [`Self::worker`].
    pub fn assign(
        &self,
        datacenter: Option<u64>,
        worker: &WorkerSource,
        origin: Origin,
    ) -> Result<GeneratorIdentity> {
        Ok(GeneratorIdentity {
            datacenter: self.datacenter(datacenter)?,
            worker: self.worker(worker)?,
            origin,
        })
    }

    fn checked(&self, field: Field, value: u64) -> Result<u64> {
        let max = self.layout.max(field);
        if value > max {
            return Err(ConfigurationError::IdOutOfRange { field, value, max }.into());
        }
        Ok(value)
    }
}
