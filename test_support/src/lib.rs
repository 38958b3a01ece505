//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Unique metric namespaces and exposition text lookups for all crates

use std::sync::atomic::{AtomicUsize, Ordering};

static NAMESPACE_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A namespace no other test in this process has used, for tests on the global registry
pub fn unique_namespace(prefix: &str) -> String {
    format!("{}{}", prefix, NAMESPACE_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Value of the sample whose series matches `series`
///
/// Names must be equal; labels must be the same set, in any order.
///
/// ```
/// let text = "usage{le=\"1\",instance=\"db\"} 3\nusage_total 1\n";
/// assert_eq!(
///     test_support::sample_value(text, "usage{instance=\"db\",le=\"1\"}"),
///     Some(3.0)
/// );
/// assert_eq!(test_support::sample_value(text, "usage"), None);
/// ```
pub fn sample_value(exposition: &str, series: &str) -> Option<f64> {
    let wanted = Series::parse(series);
    samples(exposition)
        .find(|(found, _)| *found == wanted)
        .map(|(_, value)| value)
}

/// Number of samples whose metric name is exactly `name`
pub fn series_count(exposition: &str, name: &str) -> usize {
    samples(exposition)
        .filter(|(series, _)| series.name == name)
        .count()
}

/// Whether two floats are equal within `1e-9`
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[derive(Debug, PartialEq)]
struct Series<'a> {
    name: &'a str,
    labels: Vec<String>,
}

impl<'a> Series<'a> {
    fn parse(series: &'a str) -> Self {
        let Some((name, rest)) = series.split_once('{') else {
            return Self {
                name: series,
                labels: Vec::new(),
            };
        };

        let body = rest.strip_suffix('}').unwrap_or(rest);
        let mut labels: Vec<String> = Vec::new();
        if !body.is_empty() {
            let parts: Vec<&str> = body.split("\",").collect();
            let last = parts.len() - 1;
            for (i, part) in parts.into_iter().enumerate() {
                if i == last {
                    labels.push(part.to_string());
                } else {
                    labels.push(format!("{}\"", part));
                }
            }
        }
        labels.sort();

        Self { name, labels }
    }
}

fn samples(exposition: &str) -> impl Iterator<Item = (Series<'_>, f64)> {
    exposition.lines().filter_map(|line| {
        if line.starts_with('#') {
            return None;
        }

        let head = line.split(' ').next()?;
        let (series, rest) = if head.contains('{') {
            let close = line.find("} ")?;
            (&line[..=close], &line[close + 2..])
        } else {
            line.split_once(' ')?
        };

        // Drop an optional timestamp or exemplar after the value
        let value = rest.split_whitespace().next()?.parse().ok()?;
        Some((Series::parse(series), value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_namespace_differs() {
        assert_ne!(unique_namespace("ns"), unique_namespace("ns"));
    }

    #[test]
    fn test_sample_value_matches_whole_series() {
        let text = "# TYPE a counter\na_total{x=\"1\"} 4\na_total{x=\"10\"} 9\n# EOF\n";

        assert_eq!(sample_value(text, "a_total{x=\"1\"}"), Some(4.0));
        assert_eq!(sample_value(text, "a_total{x=\"10\"}"), Some(9.0));
        assert_eq!(sample_value(text, "a_total"), None);
    }

    #[test]
    fn test_sample_value_ignores_label_order() {
        let text = "h_bucket{le=\"0.1\",instance=\"testdb\",command=\"insert\"} 0\n\
                    h_bucket{le=\"0.2\",instance=\"testdb\",command=\"insert\"} 1\n";

        assert_eq!(
            sample_value(text, "h_bucket{instance=\"testdb\",command=\"insert\",le=\"0.2\"}"),
            Some(1.0)
        );
        assert_eq!(
            sample_value(text, "h_bucket{command=\"insert\",le=\"0.1\",instance=\"testdb\"}"),
            Some(0.0)
        );
        // A subset of the labels is a different series
        assert_eq!(sample_value(text, "h_bucket{le=\"0.1\"}"), None);
    }

    #[test]
    fn test_sample_value_skips_exemplars() {
        let text = "h_bucket{le=\"1.0\"} 1 # {user_id=\"42\"} 1.0\nplain 2 # {a=\"b\"} 1.0\n";

        assert_eq!(sample_value(text, "h_bucket{le=\"1.0\"}"), Some(1.0));
        assert_eq!(sample_value(text, "plain"), Some(2.0));
    }

    #[test]
    fn test_series_count() {
        let text = "# TYPE h histogram\nh_sum 1\nh_count 2\nh_bucket{le=\"0.5\"} 1\nh_bucket{le=\"+Inf\"} 2\n";

        assert_eq!(series_count(text, "h_bucket"), 2);
        assert_eq!(series_count(text, "h_sum"), 1);
        assert_eq!(series_count(text, "h"), 0);
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.1 + 0.2, 0.3));
        assert!(!approx_eq(0.2, 0.3));
    }
}
