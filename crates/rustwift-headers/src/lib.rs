//! Typed header model for Swift resources.
//!
//! Swift reports almost all resource state through HTTP headers. This crate
//! provides:
//!
//! - [`Headers`]: a case-insensitive, single-valued header map. Keys are
//!   canonicalised on insertion and lookup (`x-object-meta-foo` and
//!   `X-Object-Meta-Foo` are the same key).
//! - [`Field`]: a typed view onto one key of a [`Headers`] map, for strings,
//!   unsigned integers and UNIX timestamps. A field borrowed immutably is
//!   read-only; a field borrowed mutably can also be set, deleted or cleared.
//! - [`Metadata`]: a view onto all keys sharing a prefix such as
//!   `X-Container-Meta-`.
//! - [`AccountHeaders`], [`ContainerHeaders`] and [`ObjectHeaders`]: header
//!   sets with accessors for the well-known fields of each resource level.
//!
//! # Delete semantics
//!
//! Swift is inconsistent about how a key is removed on the server:
//!
//! - For accounts and containers, a key is removed by sending it with an
//!   empty value. Omitting it leaves the server-side value untouched. Use
//!   [`Field::clear`] for this.
//! - Object metadata is replaced as a whole on every PUT/POST, so a key is
//!   removed by omitting it. [`ObjectHeaders::to_header_map`] therefore drops
//!   empty `X-Object-Meta-*` entries, making `clear` and `del` equivalent.
//!
//! # Examples
//!
//! ```
//! use rustwift_headers::ContainerHeaders;
//!
//! let mut hdr = ContainerHeaders::new();
//! hdr.object_count_quota_mut().set(100);
//! hdr.metadata_mut().set("Owner", "alice");
//!
//! assert_eq!(hdr.object_count_quota().get(), Some(100));
//! assert_eq!(hdr.get("x-container-meta-owner"), Some("alice"));
//! ```

#[macro_use]
mod macros;

mod account;
mod container;
mod error;
mod field;
mod headers;
mod metadata;
mod object;

pub use account::AccountHeaders;
pub use container::ContainerHeaders;
pub use error::HeaderError;
pub use field::{Field, FieldKind, Text, UnixSeconds, UnixTime, Unsigned};
pub use headers::{Headers, canonical_key};
pub use metadata::Metadata;
pub use object::ObjectHeaders;
