//! # snowdrift
//!
//! Time-sortable, coordination-light Snowflake identifiers.
//!
//! Every identifier packs, from most to least significant bit:
//!
//! ```text
//!  +-----+-----------------+----------------+------------+------------+--------------+
//!  | 0   | timestamp delta | datacenter id  | worker id  | origin     | sequence     |
//!  +-----+-----------------+----------------+------------+------------+--------------+
//!  sign   ms since epoch                                   background   per-ms counter
//! ```
//!
//! The widths are described by a [`BitLayout`]; the default
//! [`BitLayout::STANDARD`] uses 42/5/5/1/10 bits.
//!
//! The per-millisecond sequence comes from a [`SequenceResolver`]. When a
//! shared cache with atomic increments is available ([`CacheHandle::Atomic`])
//! all processes on a host draw from the same counter; otherwise each
//! generator falls back to a locally reseeded counter.
//!
//! Identifiers are produced by a [`SnowflakeGenerator`] and inspected by a
//! [`Decoder`]. Both go through a [`Codec`] that either packs with native
//! 64-bit shifts or, on narrow targets, with decimal-numeral arithmetic.
//!
//! ```
//! use snowdrift::{
//!     BitLayout, Decoder, GeneratorConfig, MemoryCacheFactory, Origin, SystemClock,
//!     WorkerSource,
//! };
//!
//! let config = GeneratorConfig {
//!     datacenter_id: Some(3),
//!     worker: WorkerSource::Explicit(7),
//!     origin: Origin::Request,
//!     ..GeneratorConfig::default()
//! };
//!
//! let generator = config.build(SystemClock, &MemoryCacheFactory::default()).unwrap();
//! let id = generator.try_next_id().unwrap();
//!
//! let decoder = Decoder::new(BitLayout::STANDARD).unwrap();
//! let decoded = decoder.decode(&id).unwrap();
//! assert_eq!(decoded.datacenter(), 3);
//! assert_eq!(decoded.worker(), 7);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod codec;
mod config;
mod decoder;
mod error;
pub mod generator;
pub mod id;
pub mod identity;
mod mutex;
pub mod rand;
pub mod sequence;
#[cfg(feature = "serde")]
mod serde;
pub mod time;

pub use crate::cache::*;
pub use crate::codec::{Backend, Codec};
pub use crate::config::*;
pub use crate::decoder::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::identity::*;
pub use crate::rand::*;
pub use crate::sequence::*;
pub use crate::time::*;
#[cfg(feature = "serde")]
pub use crate::serde::as_native;
