// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! CUBIC congestion control and pacing for loss/ACK-driven transports.
//!
//! The crate is a pure state machine: the embedding transport supplies every
//! timestamp, RTT sample, and ACK/loss determination, and owns the pacing
//! timer. Nothing here reads a clock, allocates on the hot path, or blocks,
//! so the controller runs unchanged in `no_std` environments, simulations,
//! and deterministic tests.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod counter;
pub mod event;
pub mod recovery;
pub mod time;
