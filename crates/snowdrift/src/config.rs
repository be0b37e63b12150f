use core::time::Duration;

use crate::{
    cache::CacheFactory,
    codec::{Backend, Codec},
    error::Result,
    generator::{DEFAULT_BACKOFF, SnowflakeGenerator},
    id::{BitLayout, Origin},
    identity::{IdentityAssigner, WorkerSource},
    sequence::{DEFAULT_SEQUENCE_TTL, SequenceSource},
    time::TimeSource,
};

/// Cache namespace generators draw their sequence counters from.
pub const DEFAULT_CACHE_NAMESPACE: &str = "snowflake";

/// Everything needed to build a [`SnowflakeGenerator`].
///
/// ```
/// use snowdrift::{GeneratorConfig, NoCache, SystemClock, WorkerSource};
///
/// let generator = GeneratorConfig {
///     worker: WorkerSource::Seed("web-01".into()),
///     ..GeneratorConfig::default()
/// }
/// .build(SystemClock, NoCache)
/// .unwrap();
/// assert_eq!(generator.identity().worker, 21);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub layout: BitLayout,
    /// Random in range when unset.
    pub datacenter_id: Option<u64>,
    pub worker: WorkerSource,
    pub origin: Origin,
    /// Pause between attempts once a millisecond is exhausted.
    pub backoff: Duration,
    /// Lifetime of per-millisecond counters in the shared cache.
    pub sequence_ttl: Duration,
    /// Arithmetic backend. The target's native width decides when unset.
    pub backend: Option<Backend>,
    pub cache_namespace: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            layout: BitLayout::STANDARD,
            datacenter_id: None,
            worker: WorkerSource::Hostname,
            origin: Origin::Request,
            backoff: DEFAULT_BACKOFF,
            sequence_ttl: DEFAULT_SEQUENCE_TTL,
            backend: None,
            cache_namespace: DEFAULT_CACHE_NAMESPACE.to_owned(),
        }
    }
}

impl GeneratorConfig {
    /// Resolves the identity, picks a sequence resolver from what `caches`
    /// provides and wires a generator reading `time`.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] for an invalid layout or epoch, or an
    ///   explicit id that does not fit its field
    /// - [`Error::PlatformCapability`] if the narrow backend is requested
    ///   without feature `decimal`
    ///
    /// [`Error::Configuration`]: crate::Error::Configuration
    /// [`Error::PlatformCapability`]: crate::Error::PlatformCapability
    pub fn build<T, F>(&self, time: T, caches: F) -> Result<SnowflakeGenerator<T>>
    where
        T: TimeSource<u64>,
        F: CacheFactory,
    {
        let codec = Codec::with_backend(self.layout, self.backend.unwrap_or_default())?;
        let identity = IdentityAssigner::new(self.layout).assign(
            self.datacenter_id,
            &self.worker,
            self.origin,
        )?;
        let resolver = SequenceSource::from_handle(
            caches.create(&self.cache_namespace),
            self.layout.max_sequence(),
            self.sequence_ttl,
        );
        Ok(SnowflakeGenerator::new(codec, identity, resolver, time)?.with_backoff(self.backoff))
    }
}

#[cfg(feature = "clap")]
pub use args::*;

#[cfg(feature = "clap")]
mod args {
    use core::time::Duration;

    use super::{DEFAULT_CACHE_NAMESPACE, GeneratorConfig};
    use crate::{
        codec::Backend,
        error::{ConfigurationError, Error},
        id::{BitLayout, Field, Origin},
        identity::WorkerSource,
    };

    /// Named layouts selectable from the command line.
    #[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
    pub enum LayoutPreset {
        /// 42-bit ms timestamp, 5/5 datacenter/worker, origin, 10-bit sequence.
        Standard,
        /// 41-bit ms timestamp, 5/5 datacenter/worker, 12-bit sequence.
        Legacy,
        /// 31-bit seconds + 10-bit ms, 9-bit server id, origin, 12-bit sequence.
        SplitSeconds,
    }

    impl From<LayoutPreset> for BitLayout {
        fn from(preset: LayoutPreset) -> Self {
            match preset {
                LayoutPreset::Standard => Self::STANDARD,
                LayoutPreset::Legacy => Self::LEGACY,
                LayoutPreset::SplitSeconds => Self::SPLIT_SECONDS,
            }
        }
    }

    /// Generator options for embedding in an application's own `clap`
    /// parser with `#[command(flatten)]`.
    ///
    /// Every option can also be set through a `SNOWDRIFT_*` environment
    /// variable.
    #[derive(clap::Args, Debug, Clone)]
    pub struct GeneratorArgs {
        /// Bit layout of generated identifiers.
        ///
        /// Environment variable: `SNOWDRIFT_LAYOUT`
        #[arg(long, env = "SNOWDRIFT_LAYOUT", value_enum, default_value_t = LayoutPreset::Standard)]
        pub layout: LayoutPreset,

        /// Epoch start in Unix milliseconds, overriding the preset's.
        ///
        /// Environment variable: `SNOWDRIFT_EPOCH_MS`
        #[arg(long, env = "SNOWDRIFT_EPOCH_MS")]
        pub epoch_ms: Option<u64>,

        /// Datacenter id. Drawn at random when unset.
        ///
        /// Environment variable: `SNOWDRIFT_DATACENTER_ID`
        #[arg(long, env = "SNOWDRIFT_DATACENTER_ID")]
        pub datacenter_id: Option<u64>,

        /// Worker id. Derived from the hostname when neither this nor
        /// `--worker-seed` is set.
        ///
        /// Environment variable: `SNOWDRIFT_WORKER_ID`
        #[arg(long, env = "SNOWDRIFT_WORKER_ID", conflicts_with = "worker_seed")]
        pub worker_id: Option<u64>,

        /// Seed hashed into the worker id.
        ///
        /// Environment variable: `SNOWDRIFT_WORKER_SEED`
        #[arg(long, env = "SNOWDRIFT_WORKER_SEED")]
        pub worker_seed: Option<String>,

        /// Execution context encoded into the origin bit.
        ///
        /// Environment variable: `SNOWDRIFT_ORIGIN`
        #[arg(long, env = "SNOWDRIFT_ORIGIN", value_enum, default_value_t = Origin::Request)]
        pub origin: Origin,

        /// Pause between attempts once a millisecond is exhausted, in
        /// microseconds.
        ///
        /// Environment variable: `SNOWDRIFT_BACKOFF_US`
        #[arg(long, env = "SNOWDRIFT_BACKOFF_US", default_value_t = 1)]
        pub backoff_us: u64,

        /// Lifetime of per-millisecond counters in the shared cache, in
        /// milliseconds.
        ///
        /// Environment variable: `SNOWDRIFT_SEQUENCE_TTL_MS`
        #[arg(long, env = "SNOWDRIFT_SEQUENCE_TTL_MS", default_value_t = 50)]
        pub sequence_ttl_ms: u64,

        /// Arithmetic backend. Follows the target's native width when unset.
        ///
        /// Environment variable: `SNOWDRIFT_BACKEND`
        #[arg(long, env = "SNOWDRIFT_BACKEND", value_enum)]
        pub backend: Option<Backend>,

        /// Cache namespace for sequence counters.
        ///
        /// Environment variable: `SNOWDRIFT_CACHE_NAMESPACE`
        #[arg(
            long,
            env = "SNOWDRIFT_CACHE_NAMESPACE",
            default_value_t = String::from(DEFAULT_CACHE_NAMESPACE)
        )]
        pub cache_namespace: String,
    }

    impl TryFrom<GeneratorArgs> for GeneratorConfig {
        type Error = Error;

        fn try_from(args: GeneratorArgs) -> Result<Self, Self::Error> {
            let mut layout = BitLayout::from(args.layout);
            if let Some(epoch_ms) = args.epoch_ms {
                layout = layout.with_epoch(epoch_ms);
            }

            for (field, value) in [
                (Field::Datacenter, args.datacenter_id),
                (Field::Worker, args.worker_id),
            ] {
                let max = layout.max(field);
                if let Some(value) = value.filter(|&value| value > max) {
                    return Err(ConfigurationError::IdOutOfRange { field, value, max }.into());
                }
            }

            if args.sequence_ttl_ms == 0 {
                return Err(ConfigurationError::InvalidOption {
                    option: "SNOWDRIFT_SEQUENCE_TTL_MS",
                    reason: "must be greater than 0",
                }
                .into());
            }

            if args.cache_namespace.is_empty() {
                return Err(ConfigurationError::InvalidOption {
                    option: "SNOWDRIFT_CACHE_NAMESPACE",
                    reason: "must not be empty",
                }
                .into());
            }

            let worker = match (args.worker_id, args.worker_seed) {
                (Some(id), _) => WorkerSource::Explicit(id),
                (None, Some(seed)) => WorkerSource::Seed(seed),
                (None, None) => WorkerSource::Hostname,
            };

            Ok(Self {
                layout,
                datacenter_id: args.datacenter_id,
                worker,
                origin: args.origin,
                backoff: Duration::from_micros(args.backoff_us),
                sequence_ttl: Duration::from_millis(args.sequence_ttl_ms),
                backend: args.backend,
                cache_namespace: args.cache_namespace,
            })
        }
    }
}
