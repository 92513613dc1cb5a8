// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;

/// The default maximum datagram size (path MSS) in bytes
pub const DEFAULT_MAX_DATAGRAM_SIZE: u16 = 1200;

//= https://www.rfc-editor.org/rfc/rfc9002#section-7.2
//# Endpoints SHOULD use an initial congestion
//# window of ten times the maximum datagram size (max_datagram_size)
pub const DEFAULT_INITIAL_WINDOW_IN_MSS: u16 = 10;

//= https://www.rfc-editor.org/rfc/rfc9002#section-7.2
//# The minimum congestion window is the smallest value the congestion
//# window can attain in response to loss, an increase in the peer-
//# reported ECN-CE count, or persistent congestion.  The RECOMMENDED
//# value is 2 * max_datagram_size.
pub const DEFAULT_MINIMUM_WINDOW_IN_MSS: u16 = 2;

/// The default cap applied to late-timer pacing compensation, in packets
pub const DEFAULT_MAX_BURST_PACKETS: u64 = 10;

/// The default number of packets a caller may write in one burst when the
/// path cannot be paced
pub const DEFAULT_UNPACED_BURST_LIMIT: u64 = 5;

/// The default lower bound on the interval between paced bursts
pub const DEFAULT_MINIMAL_PACING_INTERVAL: Duration = Duration::from_millis(1);

/// Tuning knobs for the congestion controller and pacer.
///
/// A `Settings` value is assembled with the consuming `with_*` methods and
/// handed to the controller at construction; it is immutable afterwards.
/// The only runtime-mutable knobs are the ones the controller exposes
/// directly (`set_minimal_pacing_interval`, `set_connection_emulation`,
/// `set_app_idle`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    max_datagram_size: u16,
    initial_window_in_mss: u16,
    minimum_window_in_mss: u16,
    initial_slow_start_threshold: u64,
    max_burst_packets: u64,
    unpaced_burst_limit: u64,
    minimal_pacing_interval: Duration,
    spread_across_rtt: bool,
    fast_convergence: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            initial_window_in_mss: DEFAULT_INITIAL_WINDOW_IN_MSS,
            minimum_window_in_mss: DEFAULT_MINIMUM_WINDOW_IN_MSS,
            initial_slow_start_threshold: u64::MAX,
            max_burst_packets: DEFAULT_MAX_BURST_PACKETS,
            unpaced_burst_limit: DEFAULT_UNPACED_BURST_LIMIT,
            minimal_pacing_interval: DEFAULT_MINIMAL_PACING_INTERVAL,
            spread_across_rtt: false,
            fast_convergence: false,
        }
    }
}

impl Settings {
    pub fn with_max_datagram_size(mut self, max_datagram_size: u16) -> Self {
        debug_assert!(max_datagram_size > 0);
        self.max_datagram_size = max_datagram_size;
        self
    }

    pub fn with_initial_window_in_mss(mut self, initial_window_in_mss: u16) -> Self {
        self.initial_window_in_mss = initial_window_in_mss;
        self
    }

    pub fn with_minimum_window_in_mss(mut self, minimum_window_in_mss: u16) -> Self {
        debug_assert!(minimum_window_in_mss > 0);
        self.minimum_window_in_mss = minimum_window_in_mss;
        self
    }

    pub fn with_initial_slow_start_threshold(mut self, threshold: u64) -> Self {
        self.initial_slow_start_threshold = threshold;
        self
    }

    pub fn with_max_burst_packets(mut self, max_burst_packets: u64) -> Self {
        self.max_burst_packets = max_burst_packets;
        self
    }

    pub fn with_unpaced_burst_limit(mut self, unpaced_burst_limit: u64) -> Self {
        self.unpaced_burst_limit = unpaced_burst_limit;
        self
    }

    pub fn with_minimal_pacing_interval(mut self, interval: Duration) -> Self {
        self.minimal_pacing_interval = interval;
        self
    }

    /// Spreads pacing bursts evenly across one RTT instead of releasing at
    /// the minimal interval, trading a coarser interval for fewer, larger
    /// bursts
    pub fn with_spread_across_rtt(mut self, spread_across_rtt: bool) -> Self {
        self.spread_across_rtt = spread_across_rtt;
        self
    }

    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.6
    //# To speed up this bandwidth release by
    //# existing flows, the following mechanism called "fast convergence"
    //# SHOULD be implemented.
    pub fn with_fast_convergence(mut self, fast_convergence: bool) -> Self {
        self.fast_convergence = fast_convergence;
        self
    }

    /// The path MSS in bytes
    pub fn max_datagram_size(&self) -> u16 {
        self.max_datagram_size
    }

    /// The initial congestion window in bytes
    pub fn initial_window(&self) -> u64 {
        self.initial_window_in_mss as u64 * self.max_datagram_size as u64
    }

    /// The congestion window floor in bytes
    pub fn minimum_window(&self) -> u64 {
        self.minimum_window_in_mss as u64 * self.max_datagram_size as u64
    }

    pub fn initial_slow_start_threshold(&self) -> u64 {
        self.initial_slow_start_threshold
    }

    pub fn max_burst_packets(&self) -> u64 {
        self.max_burst_packets
    }

    pub fn unpaced_burst_limit(&self) -> u64 {
        self.unpaced_burst_limit
    }

    pub fn minimal_pacing_interval(&self) -> Duration {
        self.minimal_pacing_interval
    }

    pub fn spread_across_rtt(&self) -> bool {
        self.spread_across_rtt
    }

    pub fn fast_convergence(&self) -> bool {
        self.fast_convergence
    }
}
