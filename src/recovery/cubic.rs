// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    counter::Counter,
    event::{self, api},
    recovery::{
        congestion_controller::{AckEvent, CongestionController, LossEvent, SentPacket},
        pacing::{self, Pacer},
        rtt_estimator::RttEstimator,
        settings::Settings,
    },
    time::Timestamp,
};
use core::time::Duration;
#[cfg(not(feature = "std"))]
use num_traits::Float as _;

//= https://www.rfc-editor.org/rfc/rfc8312#section-5.1
//# Based on these observations and our experiments, we find C=0.4
//# gives a good balance between TCP-friendliness and aggressiveness
//# of window increase.  Therefore, C SHOULD be set to 0.4.
const C: f32 = 0.4;

//= https://www.rfc-editor.org/rfc/rfc8312#section-4.5
//# Parameter beta_cubic SHOULD be set to 0.7.
const BETA_CUBIC: f32 = 0.7;

//= https://www.rfc-editor.org/rfc/rfc9002#section-7.3
//#                 New Path or      +------------+
//#            persistent congestion |   Slow     |
//#        (O)---------------------->|   Start    |
//#                                  +------------+
//#                                        |
//#                                Loss or |
//#                        ECN-CE increase |
//#                                        v
//# +------------+     Loss or       +------------+
//# | Congestion |  ECN-CE increase  |  Recovery  |
//# | Avoidance  |------------------>|   Period   |
//# +------------+                   +------------+
//#           ^                            |
//#           |                            |
//#          +----------------------------+
//#              Acknowledgment of packet
//#                sent during recovery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Hystart,
    Steady,
    FastRecovery {
        /// The highest packet number sent when the most recent loss was
        /// processed; recovery holds until a later packet is acked
        end_of_recovery: u64,
    },
}

impl State {
    fn tag(&self) -> CubicState {
        match self {
            State::Hystart => CubicState::Hystart,
            State::Steady => CubicState::Steady,
            State::FastRecovery { .. } => CubicState::FastRecovery,
        }
    }
}

/// The externally observable congestion-control state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubicState {
    /// Slow-start-like exponential growth
    Hystart,
    /// Congestion avoidance governed by the cubic growth function
    Steady,
    /// Post-loss hold; the window does not grow until recovery completes
    FastRecovery,
}

/// A congestion controller implementing "CUBIC for Fast Long-Distance
/// Networks" as specified in <https://tools.ietf.org/html/rfc8312>, with the
/// pacing and app-idle behavior of a QUIC-style transport.
///
/// The controller is a synchronous state machine: the caller supplies every
/// timestamp, serializes all calls, and owns the pacing timer. Telemetry is
/// emitted to the injected [`event::Subscriber`].
#[derive(Clone, Debug)]
pub struct CubicCongestionController<Sub: event::Subscriber = ()> {
    cubic: Cubic,
    pacer: Pacer,
    settings: Settings,
    state: State,
    congestion_window: u64,
    slow_start_threshold: u64,
    bytes_in_flight: BytesInFlight,
    /// The highest packet number passed to `on_packet_sent`
    largest_sent_packet_number: Option<u64>,
    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
    //# W_max is the window size just before the window is
    //# reduced in the last congestion event.
    last_max_cwnd: Option<u64>,
    /// The time of the last window reduction, rebased when an idle period
    /// ends and cleared on persistent congestion
    last_reduction_time: Option<Timestamp>,
    emulated_connections: u32,
    app_idle: bool,
    last_idle_toggle: Option<Timestamp>,
    subscriber: Sub,
}

type BytesInFlight = Counter<u64>;

impl CubicCongestionController {
    pub fn new(settings: Settings) -> Self {
        Self::with_subscriber(settings, ())
    }
}

impl<Sub: event::Subscriber> CubicCongestionController<Sub> {
    pub fn with_subscriber(settings: Settings, subscriber: Sub) -> Self {
        Self {
            cubic: Cubic::new(settings.max_datagram_size(), settings.fast_convergence()),
            pacer: Pacer::new(&settings),
            state: State::Hystart,
            congestion_window: settings.initial_window(),
            slow_start_threshold: settings.initial_slow_start_threshold(),
            bytes_in_flight: Counter::new(0),
            largest_sent_packet_number: None,
            last_max_cwnd: None,
            last_reduction_time: None,
            emulated_connections: 1,
            app_idle: false,
            last_idle_toggle: None,
            settings,
            subscriber,
        }
    }

    /// Returns the current state tag
    pub fn state(&self) -> CubicState {
        self.state.tag()
    }

    /// Returns the current slow start threshold in bytes
    pub fn slow_start_threshold(&self) -> u64 {
        self.slow_start_threshold
    }

    /// Returns the injected telemetry subscriber
    pub fn subscriber(&self) -> &Sub {
        &self.subscriber
    }

    fn pacing_gain(&self) -> f32 {
        match self.state {
            State::Hystart => pacing::HYSTART_PACING_GAIN,
            State::FastRecovery { .. } => pacing::RECOVERY_PACING_GAIN,
            State::Steady => pacing::STEADY_PACING_GAIN,
        }
    }

    fn emit(&mut self, event: api::CongestionEvent) {
        self.subscriber.on_congestion_metrics(&api::CongestionMetrics {
            bytes_in_flight: *self.bytes_in_flight,
            congestion_window: self.congestion_window,
            event,
            state: self.state.tag(),
            recovery_state: "",
        });
    }

    fn on_packet_loss(&mut self, loss: &LossEvent) {
        debug_assert!(loss.lost_bytes() > 0);

        self.bytes_in_flight
            .try_sub(loss.lost_bytes())
            .expect("lost bytes must have been reported sent");
        self.emit(api::CongestionEvent::RemoveInflight);

        // Multiplicative decrease and (re-)entry into fast recovery. A loss
        // inside recovery reduces again and re-arms the recovery marker.
        let end_of_recovery = self
            .largest_sent_packet_number
            .expect("a loss implies at least one sent packet");
        let (reduced_window, w_max) = self
            .cubic
            .multiplicative_decrease(self.congestion_window, self.settings.minimum_window());
        self.last_max_cwnd = Some(w_max);
        self.congestion_window = reduced_window;
        self.slow_start_threshold = reduced_window;
        self.last_reduction_time = Some(loss.loss_time());
        self.state = State::FastRecovery { end_of_recovery };
        self.emit(api::CongestionEvent::CubicLoss);

        if loss.persistent_congestion {
            //= https://www.rfc-editor.org/rfc/rfc9002#section-7.6.2
            //# When persistent congestion is declared, the sender's congestion
            //# window MUST be reduced to the minimum congestion window
            //# (kMinimumWindow), similar to a TCP sender's response on an RTO
            //# [RFC5681].
            // Evaluated strictly after the ordinary decrease; the slow start
            // threshold keeps the value the reduction just computed.
            self.congestion_window = self.settings.minimum_window();
            self.state = State::Hystart;
            self.last_max_cwnd = None;
            self.last_reduction_time = None;
            self.cubic.reset();
            self.emit(api::CongestionEvent::PersistentCongestion);
        }
    }

    fn on_packet_acked(&mut self, ack: &AckEvent) {
        self.bytes_in_flight
            .try_sub(ack.acked_bytes)
            .expect("acked bytes must have been reported sent");

        if self.app_idle {
            //= https://www.rfc-editor.org/rfc/rfc8312#section-5.8
            //# CUBIC does not raise its congestion window size if the flow is
            //# currently limited by the application instead of the congestion
            //# window.
            self.emit(api::CongestionEvent::CongestionPacketAck);
            return;
        }

        match self.state {
            State::Hystart => {
                //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.1
                //# While a sender is in slow start, the congestion window increases by
                //# the number of bytes acknowledged when each acknowledgment is
                //# processed.  This results in exponential growth of the congestion
                //# window.
                let increment =
                    (ack.acked_bytes as u64).saturating_mul(self.emulated_connections as u64);
                self.congestion_window = self.congestion_window.saturating_add(increment);

                if self.congestion_window >= self.slow_start_threshold {
                    self.state = State::Steady;
                }
            }
            State::FastRecovery { end_of_recovery } => {
                //= https://www.rfc-editor.org/rfc/rfc9002#section-7.3.2
                //# A recovery period ends and the sender enters congestion avoidance
                //# when a packet sent during the recovery period is acknowledged.
                if ack.largest_acked_packet_number > end_of_recovery {
                    self.state = State::Steady;
                }
                // The window itself does not grow on this ack.
            }
            State::Steady => self.on_ack_in_steady(ack),
        }

        self.emit(api::CongestionEvent::CongestionPacketAck);
    }

    fn on_ack_in_steady(&mut self, ack: &AckEvent) {
        if self.last_max_cwnd.is_none() {
            //= https://www.rfc-editor.org/rfc/rfc8312#section-4.8
            //# In this special case, CUBIC switches to congestion
            //# avoidance and increases its congestion window size using Eq. 1, where
            //# t is the elapsed time since the beginning of the current congestion
            //# avoidance, K is set to 0, and W_max is set to the congestion window
            //# size at the beginning of the current congestion avoidance.
            self.last_max_cwnd = Some(self.congestion_window);
            self.cubic.reset_time_to_origin();
            self.emit(api::CongestionEvent::ResetTimeToOrigin);
        }
        if self.last_reduction_time.is_none() {
            self.last_reduction_time = Some(ack.ack_time);
            self.emit(api::CongestionEvent::ResetLastReductionTime);
        }

        let w_max = self.last_max_cwnd.expect("initialized above");
        let last_reduction_time = self.last_reduction_time.expect("initialized above");

        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
        //# t is the elapsed time from the beginning of the current congestion
        //# avoidance
        let t = ack.ack_time.saturating_duration_since(last_reduction_time);
        let target = self.cubic.w_cubic(t, w_max);

        if target > self.congestion_window {
            self.congestion_window = target;
            self.emit(api::CongestionEvent::CubicSteadyCwnd);
        } else {
            // A no-change outcome is externally observable, distinct from
            // growth.
            self.emit(api::CongestionEvent::CubicSteadyCwnd);
            self.emit(api::CongestionEvent::CwndNoChange);
        }
    }
}

impl<Sub: event::Subscriber> CongestionController for CubicCongestionController<Sub> {
    #[inline]
    fn on_packet_sent(&mut self, packet: &SentPacket) {
        self.bytes_in_flight
            .try_add(packet.bytes)
            .expect("bytes in flight should not exceed u64::MAX");
        self.largest_sent_packet_number = Some(
            self.largest_sent_packet_number
                .map_or(packet.packet_number, |largest| {
                    largest.max(packet.packet_number)
                }),
        );
    }

    fn on_packet_ack_or_loss(
        &mut self,
        ack: Option<AckEvent>,
        loss: Option<LossEvent>,
        rtt_estimator: &RttEstimator,
    ) {
        assert!(
            ack.is_some() || loss.is_some(),
            "at least one of ack and loss must be present"
        );

        // Loss effects apply before ACK growth effects so a batch containing
        // both cannot double-count in-flight bytes.
        if let Some(loss) = &loss {
            self.on_packet_loss(loss);
        }
        if let Some(ack) = &ack {
            self.on_packet_acked(ack);
        }

        self.pacer.update(
            self.congestion_window,
            self.pacing_gain(),
            rtt_estimator.smoothed_rtt(),
        );
    }

    #[inline]
    fn writable_bytes(&self) -> u64 {
        self.congestion_window.saturating_sub(*self.bytes_in_flight)
    }

    #[inline]
    fn congestion_window(&self) -> u64 {
        self.congestion_window
    }

    #[inline]
    fn bytes_in_flight(&self) -> u64 {
        *self.bytes_in_flight
    }

    #[inline]
    fn can_be_paced(&self) -> bool {
        self.pacer.can_be_paced()
    }

    #[inline]
    fn pacing_rate(&mut self, now: Timestamp) -> u64 {
        self.pacer.rate(now)
    }

    #[inline]
    fn pacing_interval(&self) -> Duration {
        self.pacer.interval()
    }

    #[inline]
    fn mark_pacer_timeout_scheduled(&mut self, now: Timestamp) {
        self.pacer.mark_pacer_timeout_scheduled(now);
    }

    fn set_app_idle(&mut self, idle: bool, now: Timestamp) {
        // Every call is logged, including ones that do not change the flag.
        self.subscriber.on_app_idle_update(&api::AppIdleUpdate {
            event: api::CongestionEvent::AppIdle,
            idle,
        });

        if self.app_idle && !idle {
            //= https://www.rfc-editor.org/rfc/rfc8312#section-5.8
            //# In case of long periods when cwnd has not been updated due
            //# to the application rate limit, such as idle periods, t in Eq. 1 MUST
            //# NOT include these periods; otherwise, W_cubic(t) might be very high
            //# after restarting from these periods.
            // Shift the cubic origin forward by the idle duration so the
            // quiescent time is not credited as congestion-avoidance growth.
            if let (Some(idle_start), Some(reduction_time)) =
                (self.last_idle_toggle, self.last_reduction_time)
            {
                self.last_reduction_time = Some(reduction_time + (now - idle_start));
            }
        }

        self.app_idle = idle;
        self.last_idle_toggle = Some(now);
    }

    #[inline]
    fn is_app_limited(&self) -> bool {
        self.app_idle
    }

    fn set_minimal_pacing_interval(&mut self, interval: Duration) {
        self.pacer.set_minimal_pacing_interval(interval);
    }

    fn set_connection_emulation(&mut self, connections: u32) {
        self.emulated_connections = connections.max(1);
    }
}

/// Core window arithmetic of RFC 8312. All window sizes are computed in
/// units of packets of `max_datagram_size` bytes to stay aligned with the
/// specification and are converted to bytes at the edges.
#[derive(Clone, Debug)]
struct Cubic {
    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.6
    //# a flow remembers the last value of W_max before it
    //# updates W_max for the current congestion event.
    //# Let us call the last value of W_max to be W_last_max.
    w_last_max: f32,
    // k is the time until the window is expected to reach w_max again
    k: Duration,
    max_datagram_size: u16,
    fast_convergence: bool,
}

impl Cubic {
    fn new(max_datagram_size: u16, fast_convergence: bool) -> Self {
        Self {
            w_last_max: 0.0,
            k: Duration::ZERO,
            max_datagram_size,
            fast_convergence,
        }
    }

    /// Reset to the original state, clearing any reduction history
    fn reset(&mut self) {
        self.w_last_max = 0.0;
        self.k = Duration::ZERO;
    }

    /// The window is already at its asymptote; zero seconds to reach it
    fn reset_time_to_origin(&mut self) {
        self.k = Duration::ZERO;
    }

    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
    //# CUBIC uses the following window increase function:
    //#
    //#    W_cubic(t) = C*(t-K)^3 + W_max (Eq. 1)
    /// Returns the target window in bytes for the elapsed time `t` since
    /// the last reduction, given the recorded `w_max` in bytes
    fn w_cubic(&self, t: Duration, w_max: u64) -> u64 {
        let w_max = self.bytes_to_packets(w_max as f32);
        let target = C * (t.as_secs_f32() - self.k.as_secs_f32()).powi(3) + w_max;

        self.packets_to_bytes(target.max(0.0)) as u64
    }

    //= https://www.rfc-editor.org/rfc/rfc8312#section-4.5
    //# W_max = cwnd;                 // save window size before reduction
    //# ssthresh = cwnd * beta_cubic; // new slow-start threshold
    //# cwnd = cwnd * beta_cubic;     // window reduction
    /// Applies a multiplicative decrease to `cwnd`, floored at
    /// `minimum_window`. Returns the reduced window and the recorded `W_max`
    /// in bytes, and derives the new time to origin `K`.
    fn multiplicative_decrease(&mut self, cwnd: u64, minimum_window: u64) -> (u64, u64) {
        let mut w_max = self.bytes_to_packets(cwnd as f32);

        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.6
        //# if (W_max < W_last_max){ // should we make room for others
        //#    W_last_max = W_max;             // remember the last W_max
        //#    W_max = W_max*(1.0+beta_cubic)/2.0; // further reduce W_max
        //# } else {
        //#    W_last_max = W_max              // remember the last W_max
        //# }
        if self.fast_convergence && w_max < self.w_last_max {
            self.w_last_max = w_max;
            w_max = w_max * (1.0 + BETA_CUBIC) / 2.0;
        } else {
            self.w_last_max = w_max;
        }

        let reduced_window = ((cwnd as f32 * BETA_CUBIC).round() as u64).max(minimum_window);

        //= https://www.rfc-editor.org/rfc/rfc8312#section-4.1
        //#    K = cubic_root(W_max*(1-beta_cubic)/C) (Eq. 2)
        // Expressed via the actual post-reduction window, which may sit at
        // the configured floor rather than at beta * W_max.
        let distance =
            (w_max - self.bytes_to_packets(reduced_window as f32)).max(0.0);
        self.k = Duration::from_secs_f32((distance / C).cbrt());

        (reduced_window, self.packets_to_bytes(w_max) as u64)
    }

    #[inline]
    fn packets_to_bytes(&self, packets: f32) -> f32 {
        packets * self.max_datagram_size as f32
    }

    #[inline]
    fn bytes_to_packets(&self, bytes: f32) -> f32 {
        bytes / self.max_datagram_size as f32
    }
}
