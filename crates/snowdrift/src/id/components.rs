use crate::id::BitLayout;

/// Execution context an identifier was minted in.
///
/// Request handlers and background jobs may draw sequence numbers from
/// different counter pools, so the flag keeps their identifiers apart.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// A live, interactive request.
    #[default]
    Request,
    /// A background job or command-line process.
    Background,
}

impl Origin {
    pub const fn is_background(self) -> bool {
        matches!(self, Self::Background)
    }

    pub const fn bit(self) -> u64 {
        self.is_background() as u64
    }

    pub const fn from_bit(bit: u64) -> Self {
        if bit & 1 == 1 {
            Self::Background
        } else {
            Self::Request
        }
    }
}

impl From<bool> for Origin {
    /// `true` means background.
    fn from(background: bool) -> Self {
        if background {
            Self::Background
        } else {
            Self::Request
        }
    }
}

/// The raw field values packed into one identifier.
///
/// `timestamp` is the number of milliseconds since the layout's epoch start,
/// not the encoded field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Components {
    pub timestamp: u64,
    pub datacenter: u64,
    pub worker: u64,
    pub origin: Origin,
    pub sequence: u64,
}

/// An identifier taken apart by a [`Decoder`](crate::Decoder).
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodedId {
    components: Components,
    epoch_ms: u64,
}

impl DecodedId {
    pub(crate) const fn new(components: Components, layout: &BitLayout) -> Self {
        Self {
            components,
            epoch_ms: layout.epoch_ms,
        }
    }

    pub const fn components(&self) -> Components {
        self.components
    }

    /// Milliseconds since the epoch start.
    pub const fn timestamp_delta(&self) -> u64 {
        self.components.timestamp
    }

    pub const fn datacenter(&self) -> u64 {
        self.components.datacenter
    }

    pub const fn worker(&self) -> u64 {
        self.components.worker
    }

    pub const fn origin(&self) -> Origin {
        self.components.origin
    }

    pub const fn is_background(&self) -> bool {
        self.components.origin.is_background()
    }

    pub const fn sequence(&self) -> u64 {
        self.components.sequence
    }

    /// Whole seconds elapsed since the epoch start.
    pub const fn seconds(&self) -> u64 {
        self.components.timestamp / 1000
    }

    /// Millisecond part of the creation time.
    pub const fn milliseconds(&self) -> u64 {
        self.components.timestamp % 1000
    }

    /// Creation time as milliseconds since the Unix epoch.
    pub const fn created_at_millis(&self) -> u64 {
        self.epoch_ms.saturating_add(self.components.timestamp)
    }

    /// Creation time as seconds since the Unix epoch, with fractional
    /// milliseconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn created_at(&self) -> f64 {
        self.epoch_ms as f64 / 1000.0 + self.components.timestamp as f64 / 1000.0
    }
}
