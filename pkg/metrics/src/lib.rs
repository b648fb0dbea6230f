//! Governance counters rendered in Prometheus text exposition format.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

pub const ADMISSION_ALLOWED: &str = "ovim_admission_allowed_total";
pub const ADMISSION_DENIED: &str = "ovim_admission_denied_total";
pub const ADMISSION_DECODE_ERRORS: &str = "ovim_admission_decode_errors_total";
pub const PLACEMENT_ACCEPTED: &str = "ovim_placement_accepted_total";
pub const PLACEMENT_DENIED: &str = "ovim_placement_denied_total";
pub const ZONES: &str = "ovim_zones";

struct Counter {
    value: AtomicU64,
    help: &'static str,
}

struct Gauge {
    value: AtomicI64,
    help: &'static str,
}

/// Thread-safe registry of named counters and gauges.
///
/// Updates to a name that was never registered are ignored.
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<&'static str, Counter>>,
    gauges: RwLock<BTreeMap<&'static str, Gauge>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registry with every governance metric registered.
    pub fn governance() -> Self {
        let registry = Self::new();
        registry.register_counter(ADMISSION_ALLOWED, "Admission requests allowed");
        registry.register_counter(ADMISSION_DENIED, "Admission requests denied by policy");
        registry.register_counter(
            ADMISSION_DECODE_ERRORS,
            "Admission requests rejected as undecodable",
        );
        registry.register_counter(PLACEMENT_ACCEPTED, "VDC placements accepted");
        registry.register_counter(PLACEMENT_DENIED, "VDC placements denied");
        registry.register_gauge(ZONES, "Registered zones");
        registry
    }

    pub fn register_counter(&self, name: &'static str, help: &'static str) {
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        counters.entry(name).or_insert_with(|| Counter {
            value: AtomicU64::new(0),
            help,
        });
    }

    pub fn register_gauge(&self, name: &'static str, help: &'static str) {
        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        gauges.entry(name).or_insert_with(|| Gauge {
            value: AtomicI64::new(0),
            help,
        });
    }

    pub fn counter_inc(&self, name: &str) {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(c) = counters.get(name) {
            c.value.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn counter_get(&self, name: &str) -> u64 {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(name)
            .map(|c| c.value.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn gauge_set(&self, name: &str, val: i64) {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(g) = gauges.get(name) {
            g.value.store(val, Ordering::Relaxed);
        }
    }

    pub fn gauge_get(&self, name: &str) -> i64 {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        gauges
            .get(name)
            .map(|g| g.value.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut output = String::new();

        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        for (name, counter) in counters.iter() {
            let _ = writeln!(output, "# HELP {} {}", name, counter.help);
            let _ = writeln!(output, "# TYPE {} counter", name);
            let _ = writeln!(output, "{} {}", name, counter.value.load(Ordering::Relaxed));
        }

        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        for (name, gauge) in gauges.iter() {
            let _ = writeln!(output, "# HELP {} {}", name, gauge.help);
            let _ = writeln!(output, "# TYPE {} gauge", name);
            let _ = writeln!(output, "{} {}", name, gauge.value.load(Ordering::Relaxed));
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn governance_registry_renders_all_metrics() {
        let metrics = MetricsRegistry::governance();
        metrics.counter_inc(PLACEMENT_DENIED);
        metrics.counter_inc(PLACEMENT_DENIED);
        metrics.gauge_set(ZONES, 3);

        let text = metrics.render();
        assert!(text.contains("# TYPE ovim_placement_denied_total counter"));
        assert!(text.contains("ovim_placement_denied_total 2\n"));
        assert!(text.contains("ovim_admission_allowed_total 0\n"));
        assert!(text.contains("# TYPE ovim_zones gauge"));
        assert!(text.contains("ovim_zones 3\n"));
    }

    #[test]
    fn unregistered_names_are_ignored() {
        let metrics = MetricsRegistry::new();
        metrics.counter_inc("nope");
        metrics.gauge_set("nope", 5);
        assert_eq!(metrics.counter_get("nope"), 0);
        assert_eq!(metrics.gauge_get("nope"), 0);
        assert!(metrics.render().is_empty());
    }
}
