use std::collections::BTreeMap;

use crate::report::types::Pivot;

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the median of a slice of values. For an even count this is the
/// mean of the two middle values. Returns `None` for empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Fraction of `part` in `total`. Returns 0.0 when `total` is zero.
pub fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn count_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key.to_string()).or_default() += 1;
    }
    counts
}

pub fn group_values<'a>(
    pairs: impl IntoIterator<Item = (&'a str, f64)>,
) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (key, value) in pairs {
        groups.entry(key.to_string()).or_default().push(value);
    }
    groups
}

/// Mean per key. Keys only appear if they have at least one value.
pub fn mean_by_key<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> BTreeMap<String, f64> {
    group_values(pairs)
        .into_iter()
        .filter_map(|(key, values)| mean(&values).map(|m| (key, m)))
        .collect()
}

/// Median per key. Keys only appear if they have at least one value.
pub fn median_by_key<'a>(
    pairs: impl IntoIterator<Item = (&'a str, f64)>,
) -> BTreeMap<String, f64> {
    group_values(pairs)
        .into_iter()
        .filter_map(|(key, values)| median(&values).map(|m| (key, m)))
        .collect()
}

/// Row × column occurrence counts, like a `count` pivot table.
pub fn pivot<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Pivot {
    let mut table: Pivot = BTreeMap::new();
    for (row, column) in pairs {
        *table
            .entry(row.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default() += 1;
    }
    table
}

/// Sorts `(key, count)` pairs by count descending, then key ascending.
pub fn ranked(counts: BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
