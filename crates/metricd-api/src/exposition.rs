//! Text renderings of the full store: Prometheus exposition and an HTML listing.

use std::collections::HashSet;

use metricd_core::{Metric, MetricValue};
use tracing::warn;

/// Render stored metrics in the Prometheus text exposition format.
///
/// Metric ids are sanitized into valid Prometheus names. When two ids
/// sanitize to the same name, only the first in input order is exported.
pub fn render_prometheus(metrics: &[Metric]) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    for m in metrics {
        let name = prometheus_name(&m.id);
        if !seen.insert(name.clone()) {
            warn!(id = %m.id, %name, "metric name collides after sanitizing, skipped");
            continue;
        }
        out.push_str(&format!("# TYPE {name} {}\n", m.kind()));
        match m.value {
            MetricValue::Counter(total) => out.push_str(&format!("{name} {total}\n")),
            MetricValue::Gauge(value) => out.push_str(&format!("{name} {value}\n")),
        }
    }
    out
}

/// Render stored metrics as a minimal HTML page.
pub fn render_html(metrics: &[Metric]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html><head><title>metrics</title></head><body>\n<ul>\n",
    );
    for m in metrics {
        out.push_str(&format!(
            "<li>{} ({}): {}</li>\n",
            escape_html(&m.id),
            m.kind(),
            m.render_value()
        ));
    }
    out.push_str("</ul>\n</body></html>\n");
    out
}

fn prometheus_name(id: &str) -> String {
    let mut name: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
