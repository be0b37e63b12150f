use core::fmt;

use crate::error::ConfigurationError;

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH_MS: u64 = 1_735_689_600_000;

/// Split-seconds epoch: Wednesday, October 1, 2025 00:00:00 UTC
pub const SPLIT_SECONDS_EPOCH_MS: u64 = 1_759_276_800_000;

/// Smallest sub-second field that can hold 0..=999 milliseconds.
const MIN_MILLIS_BITS: u8 = 10;

/// The bit fields of an identifier, most significant first.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Datacenter,
    Worker,
    Origin,
    Sequence,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timestamp => "timestamp",
            Self::Datacenter => "datacenter",
            Self::Worker => "worker",
            Self::Origin => "origin",
            Self::Sequence => "sequence",
        })
    }
}

/// How elapsed milliseconds are stored in the timestamp field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimestampEncoding {
    /// The field holds elapsed milliseconds.
    Millis,
    /// The field holds elapsed whole seconds in its upper bits and the
    /// millisecond remainder (0..=999) in the lowest `millis_bits` bits.
    SplitSeconds { millis_bits: u8 },
}

/// Partition of a 63-bit identifier among its fields, plus the epoch the
/// timestamp is measured from.
///
/// ```text
///  Bit Index:  63    62 ......................................................... 0
///              +------+-----------+------------+--------+--------+----------+
///  Field:      | sign | timestamp | datacenter | worker | origin | sequence |
///              +------+-----------+------------+--------+--------+----------+
/// ```
///
/// A layout is plain data. It is checked once, when a generator is built,
/// with [`BitLayout::validate`].
///
/// Note that the elapsed time is only checked against the timestamp field
/// at that point. A process that outlives the field capacity keeps running
/// and its timestamps silently wrap.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout {
    pub timestamp_bits: u8,
    pub datacenter_bits: u8,
    pub worker_bits: u8,
    pub origin_bits: u8,
    pub sequence_bits: u8,
    pub timestamp_encoding: TimestampEncoding,
    /// Epoch start as milliseconds since the Unix epoch.
    pub epoch_ms: u64,
}

impl Default for BitLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BitLayout {
    /// 42-bit millisecond timestamp, 5-bit datacenter, 5-bit worker, origin
    /// flag and a 10-bit sequence (1024 IDs per millisecond per node).
    pub const STANDARD: Self = Self {
        timestamp_bits: 42,
        datacenter_bits: 5,
        worker_bits: 5,
        origin_bits: 1,
        sequence_bits: 10,
        timestamp_encoding: TimestampEncoding::Millis,
        epoch_ms: CUSTOM_EPOCH_MS,
    };

    /// 41-bit millisecond timestamp, 5-bit datacenter, 5-bit worker and a
    /// 12-bit sequence, without origin flag.
    pub const LEGACY: Self = Self {
        timestamp_bits: 41,
        datacenter_bits: 5,
        worker_bits: 5,
        origin_bits: 0,
        sequence_bits: 12,
        timestamp_encoding: TimestampEncoding::Millis,
        epoch_ms: CUSTOM_EPOCH_MS,
    };

    /// 31 bits of seconds and 10 bits of milliseconds, a 9-bit server id in
    /// the worker field, origin flag and a 12-bit sequence.
    pub const SPLIT_SECONDS: Self = Self {
        timestamp_bits: 41,
        datacenter_bits: 0,
        worker_bits: 9,
        origin_bits: 1,
        sequence_bits: 12,
        timestamp_encoding: TimestampEncoding::SplitSeconds { millis_bits: 10 },
        epoch_ms: SPLIT_SECONDS_EPOCH_MS,
    };

    /// Returns a copy of this layout measuring time from `epoch_ms`.
    #[must_use]
    pub const fn with_epoch(mut self, epoch_ms: u64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    /// Sum of all field widths.
    pub const fn total_bits(&self) -> u32 {
        self.timestamp_bits as u32
            + self.datacenter_bits as u32
            + self.worker_bits as u32
            + self.origin_bits as u32
            + self.sequence_bits as u32
    }

    /// Width of `field` in bits.
    pub const fn width(&self, field: Field) -> u8 {
        match field {
            Field::Timestamp => self.timestamp_bits,
            Field::Datacenter => self.datacenter_bits,
            Field::Worker => self.worker_bits,
            Field::Origin => self.origin_bits,
            Field::Sequence => self.sequence_bits,
        }
    }

    /// Position of the least significant bit of `field`.
    pub const fn shift(&self, field: Field) -> u32 {
        let origin = self.sequence_bits as u32;
        let worker = origin + self.origin_bits as u32;
        let datacenter = worker + self.worker_bits as u32;
        let timestamp = datacenter + self.datacenter_bits as u32;
        match field {
            Field::Sequence => 0,
            Field::Origin => origin,
            Field::Worker => worker,
            Field::Datacenter => datacenter,
            Field::Timestamp => timestamp,
        }
    }

    /// Largest value `field` can hold.
    pub const fn max(&self, field: Field) -> u64 {
        mask(self.width(field))
    }

    pub const fn max_sequence(&self) -> u64 {
        self.max(Field::Sequence)
    }

    /// Largest number of elapsed milliseconds the timestamp field represents.
    pub const fn max_timestamp_delta(&self) -> u64 {
        match self.timestamp_encoding {
            TimestampEncoding::Millis => self.max(Field::Timestamp),
            TimestampEncoding::SplitSeconds { millis_bits } => {
                let seconds = mask(self.timestamp_bits.saturating_sub(millis_bits));
                seconds.saturating_mul(1000).saturating_add(999)
            }
        }
    }

    /// Converts elapsed milliseconds into the raw timestamp field.
    ///
    /// Deltas beyond [`Self::max_timestamp_delta`] wrap.
    pub const fn timestamp_field(&self, delta_ms: u64) -> u64 {
        let raw = match self.timestamp_encoding {
            TimestampEncoding::Millis => delta_ms,
            TimestampEncoding::SplitSeconds { millis_bits } => {
                ((delta_ms / 1000) << millis_bits) | (delta_ms % 1000)
            }
        };
        raw & self.max(Field::Timestamp)
    }

    /// Converts a raw timestamp field back into elapsed milliseconds.
    pub const fn timestamp_delta(&self, field: u64) -> u64 {
        match self.timestamp_encoding {
            TimestampEncoding::Millis => field,
            TimestampEncoding::SplitSeconds { millis_bits } => {
                (field >> millis_bits) * 1000 + (field & mask(millis_bits))
            }
        }
    }

    /// Milliseconds elapsed between the epoch start and `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EpochInFuture`] if the epoch lies after
    /// `now_ms`.
    pub const fn elapsed(&self, now_ms: u64) -> Result<u64, ConfigurationError> {
        match now_ms.checked_sub(self.epoch_ms) {
            Some(elapsed) => Ok(elapsed),
            None => Err(ConfigurationError::EpochInFuture {
                epoch_ms: self.epoch_ms,
                now_ms,
            }),
        }
    }

    /// Checks the field widths, independent of any clock.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::LayoutTooWide`] if the fields need more than
    ///   63 bits
    /// - [`ConfigurationError::InvalidWidth`] if the timestamp or sequence is
    ///   empty, the origin flag is wider than one bit, or a split-seconds
    ///   timestamp cannot hold both parts
    pub fn check(&self) -> Result<(), ConfigurationError> {
        let total_bits = self.total_bits();
        if total_bits > 63 {
            return Err(ConfigurationError::LayoutTooWide { total_bits });
        }
        if self.timestamp_bits == 0 {
            return Err(self.invalid(Field::Timestamp));
        }
        if self.sequence_bits == 0 {
            return Err(self.invalid(Field::Sequence));
        }
        if self.origin_bits > 1 {
            return Err(self.invalid(Field::Origin));
        }
        if let TimestampEncoding::SplitSeconds { millis_bits } = self.timestamp_encoding {
            if millis_bits < MIN_MILLIS_BITS || millis_bits >= self.timestamp_bits {
                return Err(self.invalid(Field::Timestamp));
            }
        }
        Ok(())
    }

    /// Checks the layout and that the epoch start is usable at `now_ms`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::check`] reports, plus
    /// [`ConfigurationError::EpochInFuture`] and
    /// [`ConfigurationError::EpochOutOfRange`].
    pub fn validate(&self, now_ms: u64) -> Result<(), ConfigurationError> {
        self.check()?;
        let elapsed_ms = self.elapsed(now_ms)?;
        let max_ms = self.max_timestamp_delta();
        if elapsed_ms > max_ms {
            return Err(ConfigurationError::EpochOutOfRange { elapsed_ms, max_ms });
        }
        Ok(())
    }

    fn invalid(&self, field: Field) -> ConfigurationError {
        ConfigurationError::InvalidWidth {
            field,
            bits: self.width(field),
        }
    }
}

const fn mask(bits: u8) -> u64 {
    if bits == 0 {
        0
    } else if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    #[test]
    fn standard_layout_shifts() {
        let layout = BitLayout::STANDARD;
        assert_eq!(layout.total_bits(), 63);
        assert_eq!(layout.shift(Field::Sequence), 0);
        assert_eq!(layout.shift(Field::Origin), 10);
        assert_eq!(layout.shift(Field::Worker), 11);
        assert_eq!(layout.shift(Field::Datacenter), 16);
        assert_eq!(layout.shift(Field::Timestamp), 21);
        assert_eq!(layout.max(Field::Datacenter), 31);
        assert_eq!(layout.max_sequence(), 1023);
        assert_eq!(layout.max_timestamp_delta(), (1 << 42) - 1);
    }

    #[test]
    fn presets_pass_structural_checks() {
        for layout in [
            BitLayout::STANDARD,
            BitLayout::LEGACY,
            BitLayout::SPLIT_SECONDS,
        ] {
            assert_eq!(layout.check(), Ok(()), "{layout:?}");
        }
    }

    #[test]
    fn validate_rejects_future_epoch() {
        let now = CUSTOM_EPOCH_MS + 1000;
        let layout = BitLayout::STANDARD.with_epoch(now + DAY_MS);
        assert_eq!(
            layout.validate(now),
            Err(ConfigurationError::EpochInFuture {
                epoch_ms: now + DAY_MS,
                now_ms: now,
            })
        );
    }

    #[test]
    fn validate_rejects_elapsed_beyond_field() {
        let layout = BitLayout {
            timestamp_bits: 20,
            ..BitLayout::STANDARD
        }
        .with_epoch(0);
        let now = 1 << 20;
        assert_eq!(
            layout.validate(now),
            Err(ConfigurationError::EpochOutOfRange {
                elapsed_ms: 1 << 20,
                max_ms: (1 << 20) - 1,
            })
        );
        assert_eq!(layout.validate(now - 1), Ok(()));
    }

    #[test]
    fn check_rejects_bad_widths() {
        let wide = BitLayout {
            sequence_bits: 11,
            ..BitLayout::STANDARD
        };
        assert_eq!(
            wide.check(),
            Err(ConfigurationError::LayoutTooWide { total_bits: 64 })
        );

        let origin = BitLayout {
            origin_bits: 2,
            sequence_bits: 9,
            ..BitLayout::STANDARD
        };
        assert_eq!(
            origin.check(),
            Err(ConfigurationError::InvalidWidth {
                field: Field::Origin,
                bits: 2
            })
        );

        let no_sequence = BitLayout {
            sequence_bits: 0,
            ..BitLayout::STANDARD
        };
        assert!(no_sequence.check().is_err());

        let split = BitLayout {
            timestamp_encoding: TimestampEncoding::SplitSeconds { millis_bits: 8 },
            ..BitLayout::SPLIT_SECONDS
        };
        assert!(split.check().is_err());
    }

    #[test]
    fn split_seconds_field_conversion() {
        let layout = BitLayout::SPLIT_SECONDS;
        let delta = 1_091_527_984; // 1_091_527 s, 984 ms
        let field = layout.timestamp_field(delta);
        assert_eq!(field >> 10, 1_091_527);
        assert_eq!(field & 0x3FF, 984);
        assert_eq!(layout.timestamp_delta(field), delta);
        assert_eq!(
            layout.max_timestamp_delta(),
            (u64::from(u32::MAX >> 1)) * 1000 + 999
        );
    }

    #[test]
    fn millis_field_wraps_past_capacity() {
        let layout = BitLayout {
            timestamp_bits: 8,
            ..BitLayout::STANDARD
        };
        assert_eq!(layout.timestamp_field(255), 255);
        assert_eq!(layout.timestamp_field(256), 0);
        assert_eq!(layout.timestamp_field(257), 1);
    }
}
