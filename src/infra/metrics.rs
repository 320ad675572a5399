//! Lock-free session counters and periodic reporting
//!
//! All counter updates are lock-free; reporting swaps the per-interval
//! counters to zero and keeps the totals.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only. Do NOT use them for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

#[derive(Debug)]
pub struct Metrics {
    links_opened_total: AtomicU64,
    bookings_confirmed_total: AtomicU64,
    bookings_since_report: AtomicU64,
    tracker_ticks_total: AtomicU64,
    tracker_ticks_since_report: AtomicU64,
    tracker_init_failures: AtomicU64,
    auth_ok_total: AtomicU64,
    auth_failures_total: AtomicU64,
    contact_rejected_total: AtomicU64,
    flow_rejected_total: AtomicU64,
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            links_opened_total: AtomicU64::new(0),
            bookings_confirmed_total: AtomicU64::new(0),
            bookings_since_report: AtomicU64::new(0),
            tracker_ticks_total: AtomicU64::new(0),
            tracker_ticks_since_report: AtomicU64::new(0),
            tracker_init_failures: AtomicU64::new(0),
            auth_ok_total: AtomicU64::new(0),
            auth_failures_total: AtomicU64::new(0),
            contact_rejected_total: AtomicU64::new(0),
            flow_rejected_total: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_link_opened(&self) {
        self.links_opened_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_booking_confirmed(&self) {
        self.bookings_confirmed_total.fetch_add(1, Ordering::Relaxed);
        self.bookings_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tracker_tick(&self) {
        self.tracker_ticks_total.fetch_add(1, Ordering::Relaxed);
        self.tracker_ticks_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tracker_init_failure(&self) {
        self.tracker_init_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_auth_result(&self, ok: bool) {
        if ok {
            self.auth_ok_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.auth_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_contact_rejected(&self) {
        self.contact_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flow_rejected(&self) {
        self.flow_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn links_opened(&self) -> u64 {
        self.links_opened_total.load(Ordering::Relaxed)
    }

    pub fn bookings_confirmed(&self) -> u64 {
        self.bookings_confirmed_total.load(Ordering::Relaxed)
    }

    pub fn tracker_ticks(&self) -> u64 {
        self.tracker_ticks_total.load(Ordering::Relaxed)
    }

    pub fn auth_failures(&self) -> u64 {
        self.auth_failures_total.load(Ordering::Relaxed)
    }

    /// Snapshot totals and reset the per-interval counters
    pub fn report(&self, tracker_active: bool) -> MetricsSummary {
        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let secs = last.elapsed().as_secs_f64();
            *last = Instant::now();
            secs
        };
        let ticks_since = self.tracker_ticks_since_report.swap(0, Ordering::Relaxed);

        MetricsSummary {
            links_opened: self.links_opened(),
            bookings_confirmed: self.bookings_confirmed(),
            bookings_since_report: self.bookings_since_report.swap(0, Ordering::Relaxed),
            tracker_ticks: self.tracker_ticks(),
            tracker_ticks_per_min: if elapsed_secs > 0.0 {
                ticks_since as f64 * 60.0 / elapsed_secs
            } else {
                0.0
            },
            tracker_init_failures: self.tracker_init_failures.load(Ordering::Relaxed),
            tracker_active,
            auth_ok: self.auth_ok_total.load(Ordering::Relaxed),
            auth_failures: self.auth_failures(),
            contact_rejected: self.contact_rejected_total.load(Ordering::Relaxed),
            flow_rejected: self.flow_rejected_total.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub links_opened: u64,
    pub bookings_confirmed: u64,
    pub bookings_since_report: u64,
    pub tracker_ticks: u64,
    pub tracker_ticks_per_min: f64,
    pub tracker_init_failures: u64,
    pub tracker_active: bool,
    pub auth_ok: u64,
    pub auth_failures: u64,
    pub contact_rejected: u64,
    pub flow_rejected: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            links_opened = %self.links_opened,
            bookings_confirmed = %self.bookings_confirmed,
            bookings_since_report = %self.bookings_since_report,
            tracker_ticks = %self.tracker_ticks,
            tracker_ticks_per_min = format!("{:.1}", self.tracker_ticks_per_min),
            tracker_active = %self.tracker_active,
            tracker_init_failures = %self.tracker_init_failures,
            auth_ok = %self.auth_ok,
            auth_failures = %self.auth_failures,
            contact_rejected = %self.contact_rejected,
            flow_rejected = %self.flow_rejected,
            "metrics"
        );
    }
}
