//! Labelled counters, gauges and a microsecond histogram backed by `DashMap`.
//!
//! Label sets are sorted before use as keys so `[("a",..),("b",..)]` and
//! `[("b",..),("a",..)]` hit the same series.

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}{{{}}} {val}", render_labels(r.key()));
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0))
            .store(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}{{{}}} {val}", render_labels(r.key()));
        }
    }
}

// 10us .. 1s; module walks are in-process and usually sub-millisecond
const BUCKETS_MICROS: [u64; 9] = [10, 50, 100, 500, 1_000, 5_000, 10_000, 100_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Record one observation into every cumulative bucket it fits.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= le {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let labels = render_labels(r.key());
            let hist = r.value();
            let prefix = if labels.is_empty() {
                String::new()
            } else {
                format!("{labels},")
            };
            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let n = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {n}");
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_sum{{{labels}}} {sum}");
            let _ = writeln!(out, "{name}_count{{{labels}}} {count}");
        }
    }
}

#[derive(Default)]
pub struct RouterMetrics {
    /// labels: category, result (compliant | not_compliant)
    pub queries: CounterVec,
    /// labels: category, outcome (see `Outcome::label`)
    pub module_outcomes: CounterVec,
    /// labels: op (register_general | register_jurisdiction | remove), result (ok | error code)
    pub mutations: CounterVec,
    /// labels: category
    pub registered_modules: GaugeVec,
    /// labels: category
    pub query_duration: HistogramVec,
    draining: AtomicBool,
}

impl RouterMetrics {
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of every series.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.queries.render("verity_queries_total", &mut out);
        self.module_outcomes.render("verity_module_outcomes_total", &mut out);
        self.mutations.render("verity_registry_mutations_total", &mut out);
        self.registered_modules.render("verity_registered_modules", &mut out);
        self.query_duration.render("verity_query_duration_micros", &mut out);
        let _ = writeln!(
            out,
            "# TYPE verity_draining gauge\nverity_draining {}",
            u8::from(self.is_draining())
        );
        out
    }
}
