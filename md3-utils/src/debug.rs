//! `Debug` formatting helpers for large collections.
//!
//! Decoded models carry per-frame vertex arrays with thousands of entries.
//! With the `trimmed-debug-output` feature enabled, fields formatted through
//! [`trimmed_collection_fmt`] only print their first few elements followed by
//! a count of the omitted ones.

use std::fmt;

/// Number of elements printed before the output is trimmed
pub const FIRST_N_ELEMENTS: usize = 3;

/// Collections that can be printed in trimmed form
pub trait Trimmable {
    type Item: fmt::Debug;

    fn as_items(&self) -> &[Self::Item];
}

impl<T: fmt::Debug> Trimmable for Vec<T> {
    type Item = T;

    fn as_items(&self) -> &[T] {
        self
    }
}

impl<T: fmt::Debug> Trimmable for [T] {
    type Item = T;

    fn as_items(&self) -> &[T] {
        self
    }
}

impl<T: fmt::Debug, const N: usize> Trimmable for [T; N] {
    type Item = T;

    fn as_items(&self) -> &[T] {
        self
    }
}

/// Write `items` as a debug list, keeping at most `keep` elements
pub fn write_trimmed<T: fmt::Debug>(
    items: &[T],
    keep: usize,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let shown = &items[..items.len().min(keep)];
    let omitted = items.len() - shown.len();

    if omitted == 0 {
        f.debug_list().entries(shown).finish()
    } else {
        f.debug_list().entries(shown).finish()?;
        write!(f, " + {omitted} elements")
    }
}

#[cfg(feature = "trimmed-debug-output")]
pub fn trimmed_collection_fmt<C: Trimmable + ?Sized>(
    collection: &C,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    write_trimmed(collection.as_items(), FIRST_N_ELEMENTS, f)
}

#[cfg(not(feature = "trimmed-debug-output"))]
pub fn trimmed_collection_fmt<C: Trimmable + ?Sized>(
    collection: &C,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_list().entries(collection.as_items()).finish()
}
