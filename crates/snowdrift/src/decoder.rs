use crate::{
    codec::{Backend, Codec},
    error::Result,
    id::{BitLayout, DecodedId, SnowflakeId},
};

/// Takes existing identifiers apart for inspection.
///
/// Decoding has no side effects. It must use the layout (and epoch) the
/// identifier was generated with; any other layout yields garbage, not an
/// error.
///
/// ```
/// use snowdrift::{BitLayout, Decoder};
///
/// let decoder = Decoder::new(BitLayout::SPLIT_SECONDS).unwrap();
/// let decoded = decoder.decode_str("4688076898113587").unwrap();
/// assert_eq!(decoded.worker(), 392);
/// assert_eq!(decoded.sequence(), 2099);
/// assert!(decoded.is_background());
/// assert_eq!(decoded.created_at_millis(), 1_760_368_327_984);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoder {
    codec: Codec,
}

impl Decoder {
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// layout fails [`BitLayout::check`].
    pub fn new(layout: BitLayout) -> Result<Self> {
        Codec::new(layout).map(Self::from)
    }

    /// # Errors
    ///
    /// See [`Codec::with_backend`].
    pub fn with_backend(layout: BitLayout, backend: Backend) -> Result<Self> {
        Codec::with_backend(layout, backend).map(Self::from)
    }

    pub const fn layout(&self) -> &BitLayout {
        self.codec.layout()
    }

    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`](crate::Error::MalformedIdentifier)
    /// if the numeral does not fit in 63 bits.
    pub fn decode(&self, id: &SnowflakeId) -> Result<DecodedId> {
        let components = self.codec.decode(id)?;
        Ok(DecodedId::new(components, self.codec.layout()))
    }

    /// Parses and decodes a decimal numeral.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`](crate::Error::MalformedIdentifier)
    /// if `input` is not a non-negative integer numeral below 2^63.
    pub fn decode_str(&self, input: &str) -> Result<DecodedId> {
        self.decode(&SnowflakeId::parse(input)?)
    }

    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`](crate::Error::MalformedIdentifier)
    /// for negative values.
    pub fn decode_i64(&self, value: i64) -> Result<DecodedId> {
        self.decode(&SnowflakeId::from_i64(value)?)
    }
}

impl From<Codec> for Decoder {
    fn from(codec: Codec) -> Self {
        Self { codec }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Origin, SPLIT_SECONDS_EPOCH_MS};

    fn decoders(layout: BitLayout) -> Vec<Decoder> {
        let mut out = vec![Decoder::with_backend(layout, Backend::Wide).unwrap()];
        if cfg!(feature = "decimal") {
            out.push(Decoder::with_backend(layout, Backend::Narrow).unwrap());
        }
        out
    }

    #[test]
    fn split_seconds_creation_times() {
        // (input, created at in Unix ms)
        let vectors = [
            ("4688076898113587", 1_760_368_327_984),
            ("9223372036854775807", 3_906_760_448_023),
            ("9223372036754112511", 3_906_760_447_999),
            ("9223372032559808512", 3_906_760_447_000),
            ("4190109696", 1_759_276_800_999),
            ("0", SPLIT_SECONDS_EPOCH_MS),
        ];
        for decoder in decoders(BitLayout::SPLIT_SECONDS) {
            for (input, created_at) in vectors {
                let decoded = decoder.decode_str(input).unwrap();
                assert_eq!(decoded.created_at_millis(), created_at, "{input}");
            }
        }
    }

    #[test]
    fn split_seconds_reference_id() {
        for decoder in decoders(BitLayout::SPLIT_SECONDS) {
            let decoded = decoder.decode_i64(4_688_076_898_113_587).unwrap();
            assert_eq!(decoded.seconds(), 1_091_527);
            assert_eq!(decoded.milliseconds(), 984);
            assert!((decoded.created_at() - 1_760_368_327.984).abs() < 1e-5);
            assert_eq!(decoded.worker(), 392);
            assert_eq!(decoded.datacenter(), 0);
            assert_eq!(decoded.origin(), Origin::Background);
            assert_eq!(decoded.sequence(), 2099);
        }
    }

    #[test]
    fn standard_layout_views() {
        // timestamp delta 5000 ms, datacenter 3, worker 7, request, sequence 9
        let raw = (5000_i64 << 21) | (3 << 16) | (7 << 11) | 9;
        for decoder in decoders(BitLayout::STANDARD) {
            let decoded = decoder.decode_i64(raw).unwrap();
            assert_eq!(decoded.timestamp_delta(), 5000);
            assert_eq!(decoded.datacenter(), 3);
            assert_eq!(decoded.worker(), 7);
            assert!(!decoded.is_background());
            assert_eq!(decoded.sequence(), 9);
            assert_eq!(decoded.created_at_millis(), crate::CUSTOM_EPOCH_MS + 5000);
        }
    }

    #[test]
    fn rejects_non_numerals() {
        let decoder = Decoder::new(BitLayout::STANDARD).unwrap();
        for input in ["", "abc", "-1", "1e5", "92233720368547758070"] {
            assert!(
                matches!(decoder.decode_str(input), Err(Error::MalformedIdentifier { .. })),
                "{input:?}"
            );
        }
        assert!(decoder.decode_i64(-1).is_err());
    }

    #[test]
    fn backends_agree_on_rejected_and_accepted_inputs() {
        for decoder in decoders(BitLayout::STANDARD) {
            assert!(matches!(
                decoder.decode_i64(-1),
                Err(Error::MalformedIdentifier { .. })
            ));
            assert!(matches!(
                decoder.decode_i64(i64::MIN),
                Err(Error::MalformedIdentifier { .. })
            ));
            assert!(matches!(
                decoder.decode_str("12a"),
                Err(Error::MalformedIdentifier { .. })
            ));

            let held = decoder.decode_i64(7).unwrap();
            let padded = decoder.decode_str("007").unwrap();
            assert_eq!(held, padded);
            assert_eq!(padded.sequence(), 7);
        }
    }
}
