//! Observability and Metrics
//!
//! Counters for session churn and packet traffic seen by a host.
//!
//! Uses atomic counters so a snapshot can be taken from another thread while
//! the polling loop runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::core::packet::ProcessOutcome;

/// Metrics collector for one host
#[derive(Debug)]
pub struct Metrics {
    /// Sessions bound on connect
    pub connections_accepted: AtomicU64,
    /// Connects refused because the session table was full
    pub connections_rejected: AtomicU64,
    /// Currently bound sessions
    pub connections_active: AtomicU64,
    /// Message events received from bound peers
    pub messages_received: AtomicU64,
    /// Payload bytes received from bound peers
    pub bytes_received: AtomicU64,
    /// Payloads dropped for exceeding the size limit
    pub oversized_payloads: AtomicU64,
    /// Payloads that did not decode into a packet
    pub decode_failures: AtomicU64,
    /// Packets processed with a `Success` outcome
    pub packets_succeeded: AtomicU64,
    /// Packets processed with a `Failure` outcome
    pub packets_failed: AtomicU64,
    /// Packets processed with an `Error` outcome
    pub packets_errored: AtomicU64,
    /// Packets handed to the transport
    pub packets_sent: AtomicU64,
    /// Bytes handed to the transport
    pub bytes_sent: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_accepted: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            oversized_payloads: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            packets_succeeded: AtomicU64::new(0),
            packets_failed: AtomicU64::new(0),
            packets_errored: AtomicU64::new(0),
            packets_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        // Saturate instead of wrapping if a release is ever double counted
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn message_received(&self, byte_count: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn oversized_payload(&self) {
        self.oversized_payloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of processing one packet
    pub fn packet_processed(&self, outcome: ProcessOutcome) {
        let counter = match outcome {
            ProcessOutcome::Success => &self.packets_succeeded,
            ProcessOutcome::Failure => &self.packets_failed,
            ProcessOutcome::Error => &self.packets_errored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_sent(&self, byte_count: u64) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            oversized_payloads: self.oversized_payloads.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            packets_succeeded: self.packets_succeeded.load(Ordering::Relaxed),
            packets_failed: self.packets_failed.load(Ordering::Relaxed),
            packets_errored: self.packets_errored.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log a one-line summary at info level
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            accepted = s.connections_accepted,
            rejected = s.connections_rejected,
            active = s.connections_active,
            received = s.messages_received,
            decode_failures = s.decode_failures,
            errored = s.packets_errored,
            sent = s.packets_sent,
            uptime_secs = s.uptime_secs,
            "Host metrics"
        );
    }
}

/// Point-in-time copy of [`Metrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_rejected: u64,
    pub connections_active: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub oversized_payloads: u64,
    pub decode_failures: u64,
    pub packets_succeeded: u64,
    pub packets_failed: u64,
    pub packets_errored: u64,
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub uptime_secs: u64,
}

impl MetricsSnapshot {
    /// Packets that decoded and were processed, whatever the outcome
    pub fn packets_processed(&self) -> u64 {
        self.packets_succeeded + self.packets_failed + self.packets_errored
    }
}
