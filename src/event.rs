// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Structured telemetry emitted by the congestion controller.
//!
//! Events are delivered to an injected [`Subscriber`] as a side channel:
//! emission is best-effort and synchronous, and a subscriber must never
//! block, since it runs inside the controller's state transitions. The unit
//! type `()` is the disabled subscriber.

pub mod api {
    use crate::recovery::CubicState;

    pub trait Event {
        const NAME: &'static str;
    }

    /// Identifies which transition of the congestion state machine produced
    /// a [`CongestionMetrics`] event
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum CongestionEvent {
        /// Lost or acked bytes were removed from the in-flight count
        RemoveInflight,
        /// A loss triggered a multiplicative decrease
        CubicLoss,
        /// Persistent congestion collapsed the window to the minimum
        PersistentCongestion,
        /// An ACK finished processing
        CongestionPacketAck,
        /// Steady state began without a prior reduction; the cubic origin
        /// was re-derived from the current window
        ResetTimeToOrigin,
        /// Steady state began without a prior reduction time; the current
        /// ACK time was adopted
        ResetLastReductionTime,
        /// The steady-state cubic target was evaluated
        CubicSteadyCwnd,
        /// The cubic target did not exceed the current window
        CwndNoChange,
        /// The application idle flag was updated
        AppIdle,
    }

    /// A congestion-window metrics update
    #[derive(Clone, Debug, PartialEq, Eq)]
    #[non_exhaustive]
    pub struct CongestionMetrics {
        pub bytes_in_flight: u64,
        pub congestion_window: u64,
        pub event: CongestionEvent,
        pub state: CubicState,
        /// Recovery-specific context; empty outside recovery-specific
        /// contexts
        pub recovery_state: &'static str,
    }

    impl Event for CongestionMetrics {
        const NAME: &'static str = "recovery:congestion_metrics";
    }

    /// The application idle flag was toggled or re-asserted
    #[derive(Clone, Debug, PartialEq, Eq)]
    #[non_exhaustive]
    pub struct AppIdleUpdate {
        pub event: CongestionEvent,
        pub idle: bool,
    }

    impl Event for AppIdleUpdate {
        const NAME: &'static str = "recovery:app_idle_update";
    }
}

/// Receives telemetry events from the congestion controller.
///
/// Every method has a no-op default so subscribers only implement the events
/// they care about.
pub trait Subscriber {
    fn on_congestion_metrics(&mut self, event: &api::CongestionMetrics) {
        let _ = event;
    }

    fn on_app_idle_update(&mut self, event: &api::AppIdleUpdate) {
        let _ = event;
    }
}

/// The disabled subscriber
impl Subscriber for () {}

/// Fans events out to a pair of subscribers
impl<A: Subscriber, B: Subscriber> Subscriber for (A, B) {
    fn on_congestion_metrics(&mut self, event: &api::CongestionMetrics) {
        self.0.on_congestion_metrics(event);
        self.1.on_congestion_metrics(event);
    }

    fn on_app_idle_update(&mut self, event: &api::AppIdleUpdate) {
        self.0.on_app_idle_update(event);
        self.1.on_app_idle_update(event);
    }
}

#[cfg(feature = "event-tracing")]
pub mod tracing {
    use super::api;

    /// Emits congestion events as `tracing` events
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Subscriber;

    impl super::Subscriber for Subscriber {
        fn on_congestion_metrics(&mut self, event: &api::CongestionMetrics) {
            tracing::event!(
                target: "congestion_metrics",
                tracing::Level::DEBUG,
                bytes_in_flight = event.bytes_in_flight,
                congestion_window = event.congestion_window,
                event = tracing::field::debug(event.event),
                state = tracing::field::debug(event.state),
            );
        }

        fn on_app_idle_update(&mut self, event: &api::AppIdleUpdate) {
            tracing::event!(
                target: "app_idle_update",
                tracing::Level::DEBUG,
                event = tracing::field::debug(event.event),
                idle = event.idle,
            );
        }
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::api;

    /// Records every event for later inspection in tests
    #[derive(Clone, Debug, Default)]
    pub struct Subscriber {
        pub congestion_metrics: Vec<api::CongestionMetrics>,
        pub app_idle_updates: Vec<api::AppIdleUpdate>,
    }

    impl super::Subscriber for Subscriber {
        fn on_congestion_metrics(&mut self, event: &api::CongestionMetrics) {
            self.congestion_metrics.push(event.clone());
        }

        fn on_app_idle_update(&mut self, event: &api::AppIdleUpdate) {
            self.app_idle_updates.push(event.clone());
        }
    }
}
