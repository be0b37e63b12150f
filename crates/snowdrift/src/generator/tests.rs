use crate::{
    Backend, BitLayout, CUSTOM_EPOCH_MS, CacheBackedResolver, CacheError, Codec, ConfigurationError,
    Error, GeneratorConfig, GeneratorIdentity, GeneratorRegistry, LocalFallbackResolver,
    MemoryCache, MemoryCacheFactory, MonotonicClock, NoCache, Origin, Poll, RandSource,
    SequenceResolver, SnowflakeGenerator, SnowflakeId, TimeSource, WorkerSource,
};
use core::time::Duration;
use std::{
    cell::Cell,
    collections::HashSet,
    rc::Rc,
    sync::Arc,
    thread,
};

const DAY_MS: u64 = 24 * 60 * 60 * 1000;
const NOW: u64 = CUSTOM_EPOCH_MS + 1_000_000;

#[derive(Clone)]
struct MockTime {
    millis: u64,
}

impl TimeSource<u64> for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// Advances through `values`, one per read, repeating the last one.
struct MockStepTime {
    values: Vec<u64>,
    index: Cell<usize>,
}

impl TimeSource<u64> for MockStepTime {
    fn current_millis(&self) -> u64 {
        let index = self.index.get();
        self.index.set(index + 1);
        self.values[index.min(self.values.len() - 1)]
    }
}

#[derive(Clone)]
struct SharedMockStepTime {
    clock: Rc<MockStepTime>,
}

impl TimeSource<u64> for SharedMockStepTime {
    fn current_millis(&self) -> u64 {
        self.clock.current_millis()
    }
}

/// Replays `sequences`, one per call, repeating the last one.
struct StubResolver {
    sequences: Vec<u64>,
    calls: Cell<usize>,
}

impl StubResolver {
    fn new(sequences: &[u64]) -> Self {
        Self {
            sequences: sequences.to_vec(),
            calls: Cell::new(0),
        }
    }
}

impl SequenceResolver for StubResolver {
    fn is_available(&self) -> bool {
        true
    }

    fn sequence(&self, _timestamp: u64) -> crate::Result<u64> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        Ok(self.sequences[call.min(self.sequences.len() - 1)])
    }
}

struct FaultyResolver {
    calls: Cell<usize>,
}

impl SequenceResolver for FaultyResolver {
    fn is_available(&self) -> bool {
        true
    }

    fn sequence(&self, timestamp: u64) -> crate::Result<u64> {
        self.calls.set(self.calls.get() + 1);
        Err(Error::SequenceResolution {
            timestamp,
            source: CacheError::Unavailable("connection refused".into()),
        })
    }
}

struct FixedRand(u64);

impl RandSource<u64> for FixedRand {
    fn rand(&self) -> u64 {
        self.0
    }
}

fn identity(datacenter: u64, worker: u64, origin: Origin) -> GeneratorIdentity {
    GeneratorIdentity {
        datacenter,
        worker,
        origin,
    }
}

fn backends() -> Vec<Backend> {
    let mut out = vec![Backend::Wide];
    if cfg!(feature = "decimal") {
        out.push(Backend::Narrow);
    }
    out
}

fn codec(backend: Backend) -> Codec {
    Codec::with_backend(BitLayout::STANDARD, backend).unwrap()
}

fn run_ids_are_distinct_and_non_decreasing<T, S>(generator: &SnowflakeGenerator<T, S>, count: usize)
where
    T: TimeSource<u64>,
    S: SequenceResolver,
{
    let ids: Vec<SnowflakeId> = (0..count)
        .map(|_| generator.try_next_id().unwrap())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] <= w[1]), "ids must not decrease");
    let distinct: HashSet<_> = ids.iter().collect();
    assert_eq!(distinct.len(), count);

    for id in &ids {
        let components = generator.codec().decode(id).unwrap();
        assert_eq!(components.datacenter, generator.identity().datacenter);
        assert_eq!(components.worker, generator.identity().worker);
        assert!(components.sequence <= generator.layout().max_sequence());
    }
}

fn run_overflow_triggers_retry(backend: Backend) {
    let max = BitLayout::STANDARD.max_sequence();
    let clock = MockStepTime {
        values: vec![NOW, NOW, NOW + 1],
        index: Cell::new(0),
    };
    let resolver = StubResolver::new(&[max + 1, 5]);
    let generator = SnowflakeGenerator::new(
        codec(backend),
        identity(1, 2, Origin::Request),
        &resolver,
        &clock,
    )
    .unwrap();

    let mut waits = Vec::new();
    let id = generator.try_next_id_with(|backoff| waits.push(backoff)).unwrap();

    assert_eq!(waits, vec![generator.backoff()]);
    assert_eq!(resolver.calls.get(), 2);
    let components = generator.codec().decode(&id).unwrap();
    assert_eq!(components.sequence, 5);
    // The retry read the clock again.
    assert_eq!(components.timestamp, NOW + 1 - CUSTOM_EPOCH_MS);
}

#[test]
fn cache_backed_generator_yields_distinct_non_decreasing_ids() {
    for backend in backends() {
        let resolver = CacheBackedResolver::new(Arc::new(MemoryCache::new()));
        let generator = SnowflakeGenerator::new(
            codec(backend),
            identity(3, 7, Origin::Request),
            resolver,
            MonotonicClock::new(),
        )
        .unwrap();
        run_ids_are_distinct_and_non_decreasing(&generator, 1000);
    }
}

#[test]
fn fallback_generator_yields_distinct_non_decreasing_ids() {
    let generator = GeneratorConfig {
        datacenter_id: Some(0),
        worker: WorkerSource::Explicit(0),
        ..GeneratorConfig::default()
    }
    .build(MonotonicClock::new(), NoCache)
    .unwrap();
    assert!(!generator.resolver().is_available());
    run_ids_are_distinct_and_non_decreasing(&generator, 1000);
}

#[test]
fn fallback_sequences_are_distinct_within_one_millisecond() {
    let generator = SnowflakeGenerator::new(
        codec(Backend::Wide),
        identity(0, 0, Origin::Background),
        LocalFallbackResolver::with_rng(BitLayout::STANDARD.max_sequence(), FixedRand(0)),
        MockTime { millis: NOW },
    )
    .unwrap();

    let sequences: HashSet<u64> = (0..20)
        .map(|_| {
            let id = generator.try_next_id().unwrap();
            generator.codec().decode(&id).unwrap().sequence
        })
        .collect();
    assert_eq!(sequences.len(), 20);
}

#[test]
fn fallback_with_random_seed_never_repeats_within_a_millisecond() {
    for _ in 0..50 {
        let generator = SnowflakeGenerator::new(
            codec(Backend::Wide),
            identity(0, 0, Origin::Request),
            LocalFallbackResolver::new(BitLayout::STANDARD.max_sequence()),
            MockTime { millis: NOW },
        )
        .unwrap();
        let ready: Vec<SnowflakeId> = (0..20)
            .filter_map(|_| match generator.try_poll_id().unwrap() {
                Poll::Ready { id } => Some(id),
                Poll::Pending { .. } => None,
            })
            .collect();
        let distinct: HashSet<_> = ready.iter().collect();
        assert_eq!(distinct.len(), ready.len());
    }
}

#[test]
fn boundary_identity_decodes_exactly() {
    for backend in backends() {
        let generator = SnowflakeGenerator::new(
            codec(backend),
            identity(31, 31, Origin::Background),
            StubResolver::new(&[0]),
            MockTime {
                millis: CUSTOM_EPOCH_MS,
            },
        )
        .unwrap();
        let id = generator.try_next_id().unwrap();
        let components = generator.codec().decode(&id).unwrap();
        assert_eq!(components.timestamp, 0);
        assert_eq!(components.datacenter, 31);
        assert_eq!(components.worker, 31);
        assert_eq!(components.origin, Origin::Background);
        assert_eq!(components.sequence, 0);
    }
}

#[test]
fn overflow_triggers_retry_wide() {
    run_overflow_triggers_retry(Backend::Wide);
}

#[cfg(feature = "decimal")]
#[test]
fn overflow_triggers_retry_narrow() {
    run_overflow_triggers_retry(Backend::Narrow);
}

#[test]
fn blocking_retry_sleeps_then_succeeds() {
    let max = BitLayout::STANDARD.max_sequence();
    let generator = SnowflakeGenerator::new(
        codec(Backend::Wide),
        identity(0, 0, Origin::Request),
        StubResolver::new(&[max + 1, max + 1, 0]),
        MockTime { millis: NOW },
    )
    .unwrap()
    .with_backoff(Duration::from_micros(10));
    let id = generator.try_next_id().unwrap();
    assert_eq!(generator.resolver().calls.get(), 3);
    assert_eq!(generator.codec().decode(&id).unwrap().sequence, 0);
}

#[test]
fn poll_reports_pending_on_exhaustion() {
    let max = BitLayout::STANDARD.max_sequence();
    let generator = SnowflakeGenerator::new(
        codec(Backend::Wide),
        identity(0, 0, Origin::Request),
        StubResolver::new(&[max + 1]),
        MockTime { millis: NOW },
    )
    .unwrap();
    assert_eq!(
        generator.try_poll_id().unwrap(),
        Poll::Pending {
            timestamp: NOW,
            sequence: max + 1
        }
    );
}

#[test]
fn epoch_in_the_future_is_rejected() {
    let layout = BitLayout::STANDARD.with_epoch(NOW + DAY_MS);
    let result = SnowflakeGenerator::new(
        Codec::new(layout).unwrap(),
        identity(0, 0, Origin::Request),
        StubResolver::new(&[0]),
        MockTime { millis: NOW },
    );
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::EpochInFuture { .. }))
    ));
}

#[test]
fn identity_outside_layout_is_rejected() {
    let result = SnowflakeGenerator::new(
        codec(Backend::Wide),
        identity(0, 32, Origin::Request),
        StubResolver::new(&[0]),
        MockTime { millis: NOW },
    );
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::IdOutOfRange { .. }))
    ));
}

#[test]
fn clock_behind_epoch_fails_generation() {
    let clock = SharedMockStepTime {
        clock: Rc::new(MockStepTime {
            values: vec![NOW, CUSTOM_EPOCH_MS - 1],
            index: Cell::new(0),
        }),
    };
    let generator = SnowflakeGenerator::new(
        codec(Backend::Wide),
        identity(0, 0, Origin::Request),
        StubResolver::new(&[0]),
        clock.clone(),
    )
    .unwrap();
    assert!(matches!(
        generator.try_next_id(),
        Err(Error::Configuration(ConfigurationError::EpochInFuture { .. }))
    ));
    assert_eq!(clock.clock.index.get(), 2);
}

#[test]
fn resolver_faults_are_not_retried() {
    let resolver = FaultyResolver {
        calls: Cell::new(0),
    };
    let generator = SnowflakeGenerator::new(
        codec(Backend::Wide),
        identity(0, 0, Origin::Request),
        &resolver,
        MockTime { millis: NOW },
    )
    .unwrap();
    assert!(matches!(
        generator.try_next_id(),
        Err(Error::SequenceResolution { timestamp: NOW, .. })
    ));
    assert_eq!(resolver.calls.get(), 1);
}

#[cfg(feature = "decimal")]
#[test]
fn wide_and_narrow_generators_agree() {
    let build = |backend| {
        SnowflakeGenerator::new(
            codec(backend),
            identity(17, 4, Origin::Background),
            StubResolver::new(&[777]),
            MockTime { millis: NOW },
        )
        .unwrap()
    };
    let wide = build(Backend::Wide).try_next_id().unwrap();
    let narrow = build(Backend::Narrow).try_next_id().unwrap();
    assert!(wide.is_native());
    assert!(!narrow.is_native());
    assert_eq!(wide.to_string(), narrow.to_string());
    assert_eq!(wide, narrow);
}

#[test]
fn shared_generator_is_unique_across_threads() {
    let generator = Arc::new(
        GeneratorConfig {
            datacenter_id: Some(1),
            worker: WorkerSource::Explicit(1),
            ..GeneratorConfig::default()
        }
        .build(MonotonicClock::new(), &MemoryCacheFactory::default())
        .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || {
                (0..250)
                    .map(|_| generator.try_next_id().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate id");
        }
    }
    assert_eq!(seen.len(), 1000);
}

#[test]
fn registry_hands_out_one_generator_per_pair() {
    let registry = GeneratorRegistry::new(
        GeneratorConfig::default(),
        MonotonicClock::new(),
        MemoryCacheFactory::default(),
    );
    let a = registry.get(Some(1), Some(2)).unwrap();
    let b = registry.get(Some(1), Some(2)).unwrap();
    let c = registry.get(Some(1), Some(3)).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(a.identity(), identity(1, 2, Origin::Request));
    assert_eq!(registry.len().unwrap(), 2);

    // Failed builds are not cached.
    assert!(registry.get(Some(99), None).is_err());
    assert_eq!(registry.len().unwrap(), 2);
}

#[test]
fn registry_shares_generator_between_drawn_and_explicit_ids() {
    let registry = GeneratorRegistry::new(
        GeneratorConfig {
            worker: WorkerSource::Seed("web-01".into()),
            ..GeneratorConfig::default()
        },
        MockTime { millis: NOW },
        NoCache,
    );
    let drawn = registry.get(None, None).unwrap();
    let GeneratorIdentity {
        datacenter, worker, ..
    } = drawn.identity();

    let explicit_dc = registry.get(Some(datacenter), None).unwrap();
    let explicit_both = registry.get(Some(datacenter), Some(worker)).unwrap();
    assert!(Arc::ptr_eq(&drawn, &explicit_dc));
    assert!(Arc::ptr_eq(&drawn, &explicit_both));
    assert!(Arc::ptr_eq(&drawn, &registry.get(None, None).unwrap()));
    assert_eq!(registry.len().unwrap(), 1);

    let mut seen = HashSet::new();
    for _ in 0..300 {
        for generator in [&drawn, &explicit_dc] {
            if let Poll::Ready { id } = generator.try_poll_id().unwrap() {
                assert!(seen.insert(id), "duplicate id");
            }
        }
    }
    assert!(!seen.is_empty());
}
