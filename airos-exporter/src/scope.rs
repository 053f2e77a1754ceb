//! Metric samples grouped by label schema.
//!
//! Prometheus requires every series of a metric family to carry the same
//! label names. A [`MetricScope`] owns one label set and stamps it on every
//! sample it holds, so differently-labeled groups (the device and each
//! remote station) live in separate scopes and never mix under one family.

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    /// Get the TYPE comment string for Prometheus exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Ordered label key-value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(Vec<(String, String)>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, replacing any existing value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a label, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Look up a label value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single metric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub labels: LabelSet,
    pub value: f64,
}

/// Samples sharing one label schema.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScope {
    labels: LabelSet,
    samples: Vec<MetricSample>,
}

impl MetricScope {
    /// Create an empty scope whose samples all carry `labels`.
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            samples: Vec::new(),
        }
    }

    /// The label set stamped on every sample.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Record a gauge sample.
    pub fn gauge(&mut self, name: &str, help: &str, value: f64) {
        self.push(name, help, MetricKind::Gauge, value);
    }

    /// Record a counter sample.
    pub fn counter(&mut self, name: &str, help: &str, value: f64) {
        self.push(name, help, MetricKind::Counter, value);
    }

    fn push(&mut self, name: &str, help: &str, kind: MetricKind, value: f64) {
        self.samples.push(MetricSample {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            labels: self.labels.clone(),
            value,
        });
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// Find the first sample with the given metric name.
    pub fn get(&self, name: &str) -> Option<&MetricSample> {
        self.samples.iter().find(|s| s.name == name)
    }

    /// Value of the first sample with the given metric name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|s| s.value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
