// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::time::Timestamp;
use core::time::Duration;

/// A `Clock` is a source of [`Timestamp`]s.
pub trait Clock {
    /// Returns the current [`Timestamp`]
    fn get_time(&self) -> Timestamp;
}

/// A clock which always returns a Timestamp of value 1us
#[derive(Clone, Copy, Debug)]
pub struct NoopClock;

impl Clock for NoopClock {
    fn get_time(&self) -> Timestamp {
        unsafe { Timestamp::from_duration(Duration::from_micros(1)) }
    }
}

impl Clock for Timestamp {
    #[inline]
    fn get_time(&self) -> Timestamp {
        *self
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use crate::time::Timestamp;
    use core::time::Duration;

    /// A manually advanced clock for tests and simulations
    #[derive(Clone, Copy, Debug)]
    pub struct Clock(Timestamp);

    impl Default for Clock {
        fn default() -> Self {
            Self(unsafe { Timestamp::from_duration(Duration::from_millis(1)) })
        }
    }

    impl Clock {
        /// Advances the clock by `duration`
        pub fn inc_by(&mut self, duration: Duration) {
            self.0 += duration;
        }
    }

    impl super::Clock for Clock {
        fn get_time(&self) -> Timestamp {
            self.0
        }
    }
}
