// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::{
    recovery::{CubicCongestionController, Settings},
    time::{Clock, NoopClock},
};
use bolero::{check, generator::*};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, TypeGenerator)]
enum Operation {
    IncrementTime { millis: u16 },
    PacketSent { bytes: u16 },
    RttUpdated { millis: u16 },
    AckReceived { count: u8 },
    PacketLost { persistent_congestion: bool },
    AppIdle { idle: bool },
}

struct Model {
    subject: CubicCongestionController,
    rtt: RttEstimator,
    sent: VecDeque<SentPacket>,
    now: Timestamp,
    next_packet_number: u64,
    total_bytes_sent: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            subject: CubicCongestionController::new(Settings::default()),
            rtt: RttEstimator::default(),
            sent: VecDeque::new(),
            now: NoopClock.get_time(),
            next_packet_number: 0,
            total_bytes_sent: 0,
        }
    }
}

impl Model {
    fn apply(&mut self, operation: Operation) {
        match operation {
            Operation::IncrementTime { millis } => {
                self.now += Duration::from_millis(millis as u64);
            }
            Operation::PacketSent { bytes } => {
                let bytes = (bytes as u32).max(1);
                self.total_bytes_sent += bytes as u64;
                let packet = SentPacket {
                    packet_number: self.next_packet_number,
                    bytes,
                    total_bytes_sent: self.total_bytes_sent,
                    time_sent: self.now,
                };
                self.next_packet_number += 1;
                self.sent.push_back(packet);
                self.subject.on_packet_sent(&packet);
            }
            Operation::RttUpdated { millis } => {
                self.rtt
                    .update_rtt(Duration::from_millis((millis as u64).max(1)), self.now);
            }
            Operation::AckReceived { count } => {
                let mut acked_bytes = 0u32;
                let mut newest = None;
                for _ in 0..count {
                    if let Some(packet) = self.sent.pop_front() {
                        acked_bytes += packet.bytes;
                        newest = Some(packet);
                    }
                }
                if let Some(newest) = newest {
                    self.subject.on_packet_ack_or_loss(
                        Some(AckEvent {
                            largest_acked_packet_number: newest.packet_number,
                            acked_bytes,
                            time_sent: newest.time_sent,
                            ack_time: self.now,
                        }),
                        None,
                        &self.rtt,
                    );
                }
            }
            Operation::PacketLost {
                persistent_congestion,
            } => {
                if let Some(packet) = self.sent.pop_front() {
                    let mut loss = LossEvent::new(self.now);
                    loss.add_lost_packet(&packet);
                    loss.persistent_congestion = persistent_congestion;
                    self.subject.on_packet_ack_or_loss(None, Some(loss), &self.rtt);
                }
            }
            Operation::AppIdle { idle } => {
                self.subject.set_app_idle(idle, self.now);
            }
        }

        self.invariants();
    }

    fn invariants(&mut self) {
        let in_flight: u64 = self.sent.iter().map(|packet| packet.bytes as u64).sum();
        assert_eq!(self.subject.bytes_in_flight(), in_flight);

        assert_eq!(
            self.subject.writable_bytes(),
            self.subject
                .congestion_window()
                .saturating_sub(self.subject.bytes_in_flight())
        );

        assert!(self.subject.congestion_window() >= Settings::default().minimum_window());

        assert!(self.subject.pacing_rate(self.now) >= 1);
        if !self.subject.can_be_paced() {
            assert_eq!(self.subject.pacing_interval(), Duration::ZERO);
        }
    }
}

#[test]
fn model_test() {
    check!()
        .with_type::<Vec<Operation>>()
        .for_each(|operations| {
            let mut model = Model::default();
            for operation in operations {
                model.apply(*operation);
            }
        });
}
