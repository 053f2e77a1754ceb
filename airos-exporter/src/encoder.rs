//! Prometheus text exposition (format 0.0.4) for metric scopes.

use std::collections::HashMap;
use std::io::Write;

use crate::scope::{LabelSet, MetricSample, MetricScope};

/// Content type of the encoded payload.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encode one scope into a text block.
pub fn encode(scope: &MetricScope) -> Vec<u8> {
    encode_scopes(std::slice::from_ref(scope))
}

/// Encode every scope of one payload.
///
/// Families are written in first-seen order. Each family gets one `# HELP`
/// and `# TYPE` header followed by its samples from every scope, so the
/// series of one family stay grouped even when several remote scopes share
/// family names.
pub fn encode_scopes(scopes: &[MetricScope]) -> Vec<u8> {
    let samples: usize = scopes.iter().map(MetricScope::len).sum();
    let mut output = Vec::with_capacity(samples * 100);

    for (name, series) in group_by_family(scopes.iter().flat_map(|s| s.samples())) {
        let first = series[0];
        writeln!(output, "# HELP {} {}", name, escape_help(&first.help)).ok();
        writeln!(output, "# TYPE {} {}", name, first.kind.as_str()).ok();

        for sample in series {
            writeln!(
                output,
                "{}{} {}",
                sample.name,
                format_labels(&sample.labels),
                format_value(sample.value)
            )
            .ok();
        }
    }

    output
}

/// Group samples by metric name, keeping first-appearance order.
fn group_by_family<'a>(
    samples: impl IntoIterator<Item = &'a MetricSample>,
) -> Vec<(&'a str, Vec<&'a MetricSample>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut families: Vec<(&str, Vec<&MetricSample>)> = Vec::new();

    for sample in samples {
        let name = sample.name.as_str();
        match index.get(name) {
            Some(&i) => families[i].1.push(sample),
            None => {
                index.insert(name, families.len());
                families.push((name, vec![sample]));
            }
        }
    }
    families
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape special characters in HELP text.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for Prometheus exposition format.
fn format_labels(labels: &LabelSet) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}
