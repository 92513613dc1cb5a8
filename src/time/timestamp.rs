// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
    time::Duration,
};

/// An instant in time, measured against an unspecified epoch chosen by the
/// caller's [`Clock`](crate::time::Clock).
///
/// Every operation in this crate takes its timestamps as explicit arguments
/// and never reads a wall clock, which keeps all state transitions
/// deterministic and replayable in tests and simulations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// Creates a `Timestamp` from a `Duration` since the clock's epoch.
    ///
    /// # Safety
    ///
    /// The caller must derive all timestamps handed to a given component
    /// from the same epoch; mixing epochs produces nonsensical elapsed
    /// times.
    #[inline]
    pub const unsafe fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Returns the `Duration` since the clock's epoch.
    #[inline]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Returns the amount of time elapsed from `earlier` to `self`, or zero
    /// if `earlier` is after `self`.
    #[inline]
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns true if this timestamp is at or before `deadline`
    #[inline]
    pub fn has_elapsed(self, deadline: Self) -> bool {
        self <= deadline
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Timestamp({:?})", self.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<Duration> for Timestamp {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl SubAssign<Duration> for Timestamp {
    #[inline]
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 -= rhs;
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// Returns the elapsed time between two timestamps.
    ///
    /// Panics if `rhs` is after `self`; use
    /// [`saturating_duration_since`](Self::saturating_duration_since) when
    /// the ordering is not guaranteed.
    #[inline]
    fn sub(self, rhs: Timestamp) -> Self::Output {
        self.0 - rhs.0
    }
}
