// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::{cmp::Ordering, ops};
use num_traits::{CheckedAdd, CheckedSub, SaturatingSub};

/// A counter for quantities that must never silently wrap.
///
/// Addition and subtraction are checked; a failed operation indicates a
/// caller contract violation (e.g. acknowledging bytes that were never
/// reported sent) and callers are expected to fail fast with `expect` rather
/// than continue with corrupted accounting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter<T>(T);

/// The operation would have overflowed or underflowed the counter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Error;

impl<T: CheckedAdd + CheckedSub + Copy> Counter<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Adds `value` to the counter, erroring if the result would overflow
    /// or if `value` does not fit in `T`.
    #[inline]
    pub fn try_add<V: TryInto<T>>(&mut self, value: V) -> Result<(), Error> {
        let value = value.try_into().map_err(|_| Error)?;
        self.0 = self.0.checked_add(&value).ok_or(Error)?;
        Ok(())
    }

    /// Subtracts `value` from the counter, erroring if the result would
    /// underflow or if `value` does not fit in `T`.
    #[inline]
    pub fn try_sub<V: TryInto<T>>(&mut self, value: V) -> Result<(), Error> {
        let value = value.try_into().map_err(|_| Error)?;
        self.0 = self.0.checked_sub(&value).ok_or(Error)?;
        Ok(())
    }
}

impl<T> ops::Deref for Counter<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: SaturatingSub> ops::SubAssign<T> for Counter<T> {
    #[inline]
    fn sub_assign(&mut self, rhs: T) {
        self.0 = self.0.saturating_sub(&rhs);
    }
}

impl<T: PartialEq> PartialEq<T> for Counter<T> {
    #[inline]
    fn eq(&self, other: &T) -> bool {
        self.0.eq(other)
    }
}

impl<T: PartialOrd> PartialOrd<T> for Counter<T> {
    #[inline]
    fn partial_cmp(&self, other: &T) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_add_and_sub() {
        let mut counter = Counter::new(0u64);
        counter.try_add(100u32).unwrap();
        assert_eq!(*counter, 100);
        counter.try_sub(40u32).unwrap();
        assert_eq!(*counter, 60);
    }

    #[test]
    fn underflow_errors() {
        let mut counter = Counter::new(10u64);
        assert_eq!(counter.try_sub(11u32), Err(Error));
        // the counter is unchanged after a failed operation
        assert_eq!(*counter, 10);
    }

    #[test]
    fn overflow_errors() {
        let mut counter = Counter::new(u64::MAX);
        assert_eq!(counter.try_add(1u32), Err(Error));
    }

    #[test]
    fn sub_assign_saturates() {
        let mut counter = Counter::new(10u64);
        counter -= 25;
        assert_eq!(*counter, 0);
    }
}
