// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{recovery::settings::Settings, time::Timestamp};
use core::time::Duration;
#[cfg(not(feature = "std"))]
use num_traits::Float as _;

// The congestion window is underutilized while it grows exponentially, so
// packets are released at twice the steady rate during slow start, as done
// in Linux:
// https://github.com/torvalds/linux/blob/fc02cb2b37fe2cbf1d3334b9f0f0eab9431766c4/net/ipv4/tcp_input.c#L905-L906
pub(super) const HYSTART_PACING_GAIN: f32 = 2.0;

//= https://www.rfc-editor.org/rfc/rfc9002#section-7.7
//# Using a value for "N" that is small, but at least 1 (for example, 1.25)
//# ensures that variations in RTT do not result in underutilization of the
//# congestion window.
pub(super) const RECOVERY_PACING_GAIN: f32 = 1.25;

pub(super) const STEADY_PACING_GAIN: f32 = 1.0;

/// Derives an advisory send rate and inter-burst interval from the current
/// congestion window and RTT.
///
/// The pacer owns no timer. It caches a rate and interval whenever the
/// window, per-state gain, RTT, or pacing configuration changes; queries
/// read the cached values, optionally applying a one-shot late-timer
/// compensation.
#[derive(Clone, Debug)]
pub(super) struct Pacer {
    minimal_pacing_interval: Duration,
    spread_across_rtt: bool,
    max_burst_packets: u64,
    unpaced_burst_limit: u64,
    max_datagram_size: u16,
    smoothed_rtt: Duration,
    congestion_window: u64,
    pacing_gain: f32,
    interval: Duration,
    burst_size: u64,
    scheduled_pacer_timeout: Option<Timestamp>,
}

impl Pacer {
    pub fn new(settings: &Settings) -> Self {
        let mut pacer = Self {
            minimal_pacing_interval: settings.minimal_pacing_interval(),
            spread_across_rtt: settings.spread_across_rtt(),
            max_burst_packets: settings.max_burst_packets(),
            unpaced_burst_limit: settings.unpaced_burst_limit(),
            max_datagram_size: settings.max_datagram_size(),
            smoothed_rtt: Duration::ZERO,
            congestion_window: settings.initial_window(),
            pacing_gain: HYSTART_PACING_GAIN,
            interval: Duration::ZERO,
            burst_size: settings.unpaced_burst_limit(),
            scheduled_pacer_timeout: None,
        };
        pacer.recalculate();
        pacer
    }

    /// Recomputes the cached rate and interval for the given window,
    /// per-state pacing gain and smoothed RTT
    #[inline]
    pub fn update(&mut self, congestion_window: u64, pacing_gain: f32, smoothed_rtt: Duration) {
        self.congestion_window = congestion_window;
        self.pacing_gain = pacing_gain;
        self.smoothed_rtt = smoothed_rtt;
        self.recalculate();
    }

    pub fn set_minimal_pacing_interval(&mut self, interval: Duration) {
        self.minimal_pacing_interval = interval;
        self.recalculate();
    }

    /// Returns false when the RTT is too short to be subdivided by the
    /// minimal pacing interval
    pub fn can_be_paced(&self) -> bool {
        !self.minimal_pacing_interval.is_zero() && self.minimal_pacing_interval <= self.smoothed_rtt
    }

    /// The advisory interval between bursts; zero when pacing is disabled
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Records the time at which the caller's pacing timer was scheduled to
    /// fire. The next [`rate`](Self::rate) call consumes this record.
    pub fn mark_pacer_timeout_scheduled(&mut self, now: Timestamp) {
        self.scheduled_pacer_timeout = Some(now);
    }

    /// Returns the number of packets releasable in the next burst.
    ///
    /// If a pacer timeout was marked and `now` is past it, the rate is
    /// inflated by the number of full intervals the timer was late, capped
    /// at the configured maximum burst. The compensation is consumed by
    /// this call whether or not it applied.
    pub fn rate(&mut self, now: Timestamp) -> u64 {
        let scheduled = self.scheduled_pacer_timeout.take();

        if self.interval.is_zero() {
            return self.burst_size;
        }

        if let Some(scheduled) = scheduled {
            if now > scheduled {
                let late_intervals = ((now - scheduled).as_nanos() / self.interval.as_nanos()) as u64;
                let compensated = self
                    .burst_size
                    .saturating_mul(late_intervals.saturating_add(1));
                return compensated.min(self.max_burst_packets);
            }
        }

        self.burst_size
    }

    fn recalculate(&mut self) {
        if !self.can_be_paced() {
            // The RTT cannot be subdivided; hand the whole budget to the
            // caller's unpaced burst cap.
            self.interval = Duration::ZERO;
            self.burst_size = self.unpaced_burst_limit;
            return;
        }

        let window_in_mss = self.congestion_window as f32 / self.max_datagram_size as f32;
        // Whole intervals only; can_be_paced guarantees at least one fits
        let intervals_per_rtt =
            (self.smoothed_rtt.as_nanos() / self.minimal_pacing_interval.as_nanos()) as f32;
        let rate = ((window_in_mss * self.pacing_gain) / intervals_per_rtt)
            .ceil()
            .max(1.0) as u64;

        if self.spread_across_rtt {
            // Stretch the interval so roughly one gained window's worth of
            // packets is released evenly across each RTT.
            let bursts_per_rtt = ((window_in_mss * self.pacing_gain) / rate as f32)
                .ceil()
                .max(1.0) as u32;
            self.interval = self.smoothed_rtt / bursts_per_rtt;
        } else {
            self.interval = self.minimal_pacing_interval;
        }
        self.burst_size = rate;
    }
}
