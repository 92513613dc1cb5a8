// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub use congestion_controller::{AckEvent, CongestionController, LossEvent, SentPacket};
pub use cubic::{CubicCongestionController, CubicState};
pub use rtt_estimator::*;
pub use settings::*;

pub mod congestion_controller;
pub mod cubic;
mod pacing;
mod rtt_estimator;
mod settings;
