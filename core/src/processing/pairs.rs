use crate::model::MeasurementTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Two images sharing control points; `first` sorts before `second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub first: String,
    pub second: String,
    pub shared_points: usize,
}

/// Image pairs that share control points, most shared first.
///
/// Ties are broken by the pair's lexicographic order.
pub fn find_pairs(table: &MeasurementTable) -> Vec<ImagePair> {
    let mut serials_by_point: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in table {
        serials_by_point
            .entry(row.point_id.as_str())
            .or_default()
            .insert(row.serial_number.as_str());
    }

    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for serials in serials_by_point.values() {
        let serials: Vec<&str> = serials.iter().copied().collect();
        for (i, first) in serials.iter().enumerate() {
            for second in &serials[i + 1..] {
                *counts.entry((*first, *second)).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<ImagePair> = counts
        .into_iter()
        .map(|((first, second), shared_points)| ImagePair {
            first: first.to_string(),
            second: second.to_string(),
            shared_points,
        })
        .collect();
    // Stable sort keeps the BTreeMap's lexicographic order within equal counts.
    pairs.sort_by(|a, b| b.shared_points.cmp(&a.shared_points));
    pairs
}
