//! A sparse, dynamically growing bitmap for small integers, written in pure
//! Rust. `no_std` + `alloc`, no `unsafe`.
//!
//! Designed for membership tracking over small integer keys (IDs, enum
//! discriminants, sequence numbers) where the population is sparse and the
//! upper bound is modest.
//!
//! [`Bitmap`] is the main struct in this library. Its [features](#features)
//! are listed below.
//!
//! # Examples
//! ```
//! use sparse_bitmap::{Bitmap, Cursor};
//!
//! let mut bitmap = Bitmap::new(); // no allocation yet
//! bitmap.set(3)?;
//! bitmap.set(1000)?; // grows on demand, zero-filling
//! assert!(bitmap.is_set(3));
//!
//! let mut cursor = Cursor::START;
//! assert_eq!(bitmap.next_member(&mut cursor), Some(3));
//! assert_eq!(bitmap.next_member(&mut cursor), Some(1000));
//! assert_eq!(bitmap.next_member(&mut cursor), None);
//! # Ok::<(), sparse_bitmap::Error>(())
//! ```
//!
//! # Use Cases
//!
//! - Tracking which IDs out of a small numeric space have been seen
//! - Replacing `HashSet<u16>`-shaped sets with something flat and compact
//! - Code that must survive allocation failure: growth reports
//!   [`Error::OutOfMemory`] instead of aborting
//! - Not suited for large or unbounded keys; members are capped at
//!   [`MAX_MEMBER`] on purpose
//!
//! # Features
//!
//! - `#![no_std]` compatible (requires `alloc`)
//! - Lazily allocated, dynamically growing word storage
//! - Fallible mutation: [`Bitmap::set`] and [`Bitmap::try_clone`] report
//!   [`Error::OutOfMemory`] / [`Error::OutOfRange`] rather than panicking
//! - Resumable iteration through a caller-held [`Cursor`], plus a plain
//!   [`Iterator`] over members via [`Bitmap::iter_members`]
//! - Structural equality that ignores trailing zero words left by growth
//! - [`BitmapSlot`] extension trait treating `Option<Bitmap>` as a
//!   nullable handle that reads as an empty set

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;

mod bitmap;

pub use bitmap::{Bitmap, BitmapSlot, Cursor, Error, MAX_MEMBER, Members};
