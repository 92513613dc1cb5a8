// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{recovery::RttEstimator, time::Timestamp};
use core::time::Duration;

/// A packet as seen by the congestion controller.
///
/// The record is owned by the caller's retransmission machinery; the
/// controller only ever borrows it and never inspects packet contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SentPacket {
    /// Monotonically increasing sequence number assigned at send time
    pub packet_number: u64,
    /// Size of the packet in bytes
    pub bytes: u32,
    /// Total bytes sent on the connection when this packet was sent,
    /// inclusive of this packet
    pub total_bytes_sent: u64,
    /// The time the packet was sent
    pub time_sent: Timestamp,
}

/// An acknowledgement determination handed in by the loss/ACK detector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckEvent {
    /// The largest packet number newly acknowledged
    pub largest_acked_packet_number: u64,
    /// The number of bytes newly acknowledged
    pub acked_bytes: u32,
    /// The send time of the newest acknowledged packet
    pub time_sent: Timestamp,
    /// The time the acknowledgement was received
    pub ack_time: Timestamp,
}

/// A loss determination handed in by the loss/ACK detector.
///
/// Accumulates one or more lost packets; the controller applies a single
/// multiplicative decrease per event, however many packets it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LossEvent {
    loss_time: Timestamp,
    lost_bytes: u64,
    largest_lost_packet_number: Option<u64>,
    /// Set when the detector has declared persistent congestion for the
    /// period covered by the lost packets
    pub persistent_congestion: bool,
}

impl LossEvent {
    pub fn new(loss_time: Timestamp) -> Self {
        Self {
            loss_time,
            lost_bytes: 0,
            largest_lost_packet_number: None,
            persistent_congestion: false,
        }
    }

    pub fn add_lost_packet(&mut self, packet: &SentPacket) {
        self.lost_bytes += packet.bytes as u64;
        self.largest_lost_packet_number = Some(
            self.largest_lost_packet_number
                .map_or(packet.packet_number, |largest| {
                    largest.max(packet.packet_number)
                }),
        );
    }

    pub fn loss_time(&self) -> Timestamp {
        self.loss_time
    }

    pub fn lost_bytes(&self) -> u64 {
        self.lost_bytes
    }

    pub fn largest_lost_packet_number(&self) -> Option<u64> {
        self.largest_lost_packet_number
    }
}

/// The seam between the transport's loss/ACK detector, its scheduler, and a
/// congestion control algorithm.
///
/// All timestamps are supplied by the caller; implementations never read a
/// clock, block, or schedule work of their own. Callers are responsible for
/// serializing access to an implementation.
pub trait CongestionController {
    /// Called on every packet transmission. Sending is never rejected here;
    /// admission control is the scheduler's responsibility.
    fn on_packet_sent(&mut self, packet: &SentPacket);

    /// Processes an ACK and/or loss determination.
    ///
    /// At least one of `ack` and `loss` must be present; passing neither is
    /// a contract violation and panics. Loss effects are applied before ACK
    /// growth effects so that a batch containing both cannot double-count
    /// in-flight bytes. Callers must not re-submit packets that were already
    /// acked or declared lost.
    fn on_packet_ack_or_loss(
        &mut self,
        ack: Option<AckEvent>,
        loss: Option<LossEvent>,
        rtt_estimator: &RttEstimator,
    );

    /// The budget currently available for new sends:
    /// `congestion_window - bytes_in_flight`, clamped at zero
    fn writable_bytes(&self) -> u64;

    /// The current congestion window in bytes
    fn congestion_window(&self) -> u64;

    /// Bytes sent but not yet acked or declared lost
    fn bytes_in_flight(&self) -> u64;

    /// Returns false when the RTT is too short for the configured minimal
    /// pacing interval to subdivide it
    fn can_be_paced(&self) -> bool;

    /// The number of packets that may be released in the next burst.
    ///
    /// Consumes any late-timer compensation recorded by
    /// [`mark_pacer_timeout_scheduled`](Self::mark_pacer_timeout_scheduled).
    fn pacing_rate(&mut self, now: Timestamp) -> u64;

    /// The advisory interval between bursts; zero when pacing is disabled
    fn pacing_interval(&self) -> Duration;

    /// Records when the caller's pacing timer was scheduled to fire, so the
    /// next [`pacing_rate`](Self::pacing_rate) call can compensate for a
    /// late timer
    fn mark_pacer_timeout_scheduled(&mut self, now: Timestamp);

    /// Updates the application idle flag. Every call emits a telemetry
    /// event, including calls that do not change the flag.
    fn set_app_idle(&mut self, idle: bool, now: Timestamp);

    /// Returns the current application idle flag
    fn is_app_limited(&self) -> bool;

    fn set_minimal_pacing_interval(&mut self, interval: Duration);

    /// Scales additive window increase as if `connections` parallel flows
    /// shared this controller
    fn set_connection_emulation(&mut self, connections: u32);
}

#[cfg(test)]
mod fuzz_target;
