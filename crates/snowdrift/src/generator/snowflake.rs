use core::{fmt, time::Duration};
use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    codec::Codec,
    error::{ConfigurationError, Result},
    generator::Poll,
    id::{BitLayout, Components, Field, SnowflakeId},
    identity::GeneratorIdentity,
    sequence::{SequenceResolver, SequenceSource},
    time::TimeSource,
};

/// Default pause between attempts once a millisecond is exhausted.
pub const DEFAULT_BACKOFF: Duration = Duration::from_micros(1);

/// Produces identifiers for one datacenter/worker pair.
///
/// Each attempt reads the clock, asks the [`SequenceResolver`] for a sequence
/// number at that millisecond and packs the result with its [`Codec`]. When
/// the resolver reports a sequence past the layout's maximum, the attempt is
/// [`Poll::Pending`] and the blocking methods back off and retry with a fresh
/// clock read until the millisecond rolls over.
///
/// The generator holds no state of its own. Shared between threads it is as
/// safe as its resolver; both built-in resolvers are.
pub struct SnowflakeGenerator<T, S = SequenceSource> {
    codec: Codec,
    identity: GeneratorIdentity,
    resolver: S,
    time: T,
    backoff: Duration,
}

impl<T, S> SnowflakeGenerator<T, S>
where
    T: TimeSource<u64>,
    S: SequenceResolver,
{
    /// Creates a generator after checking the layout against the current
    /// time and the identity against the layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// epoch start lies in the future, the elapsed time already exceeds the
    /// timestamp field, or the datacenter or worker id does not fit.
    pub fn new(codec: Codec, identity: GeneratorIdentity, resolver: S, time: T) -> Result<Self> {
        let layout = codec.layout();
        layout.validate(time.current_millis())?;
        for (field, value) in [
            (Field::Datacenter, identity.datacenter),
            (Field::Worker, identity.worker),
        ] {
            let max = layout.max(field);
            if value > max {
                return Err(ConfigurationError::IdOutOfRange { field, value, max }.into());
            }
        }
        Ok(Self {
            codec,
            identity,
            resolver,
            time,
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Sets the pause used by [`Self::try_next_id`].
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub const fn layout(&self) -> &BitLayout {
        self.codec.layout()
    }

    pub const fn codec(&self) -> &Codec {
        &self.codec
    }

    pub const fn identity(&self) -> GeneratorIdentity {
        self.identity
    }

    pub const fn resolver(&self) -> &S {
        &self.resolver
    }

    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Makes a single attempt.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the clock reads before the epoch start
    /// - [`Error::SequenceResolution`] if the shared cache faults
    ///
    /// [`Error::Configuration`]: crate::Error::Configuration
    /// [`Error::SequenceResolution`]: crate::Error::SequenceResolution
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let now = self.time.current_millis();
        let layout = self.codec.layout();
        let timestamp = layout.elapsed(now)?;
        let sequence = self.resolver.sequence(now)?;
        if sequence > layout.max_sequence() {
            return Ok(Self::cold_exhausted(now, sequence));
        }
        let id = self.codec.encode(&Components {
            timestamp,
            datacenter: self.identity.datacenter,
            worker: self.identity.worker,
            origin: self.identity.origin,
            sequence,
        })?;
        Ok(Poll::Ready { id })
    }

    /// Generates an identifier, calling `wait` with the configured backoff
    /// after every exhausted attempt.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`]. Exhaustion is never an error.
    pub fn try_next_id_with(&self, mut wait: impl FnMut(Duration)) -> Result<SnowflakeId> {
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { .. } => wait(self.backoff),
            }
        }
    }

    /// Generates an identifier, sleeping the calling thread between
    /// exhausted attempts.
    ///
    /// The loop has no bound and no cancellation hook. It returns once the
    /// clock reaches a millisecond with free sequence numbers.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    pub fn try_next_id(&self) -> Result<SnowflakeId> {
        self.try_next_id_with(thread::sleep)
    }

    #[cold]
    #[inline(never)]
    fn cold_exhausted(timestamp: u64, sequence: u64) -> Poll {
        #[cfg(feature = "tracing")]
        tracing::debug!(timestamp, sequence, "sequence exhausted, backing off");
        Poll::Pending {
            timestamp,
            sequence,
        }
    }
}

impl<T, S: fmt::Debug> fmt::Debug for SnowflakeGenerator<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("codec", &self.codec)
            .field("identity", &self.identity)
            .field("resolver", &self.resolver)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
