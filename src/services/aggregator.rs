// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Category breakdown of matched stations (chart data).

use crate::models::feature::Feature;
use crate::models::query::CategoryCounts;

/// Groups matched stations by `fclass`.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Count stations per category. Stations without a category are skipped.
    pub fn aggregate<'a, I>(matched: I) -> CategoryCounts
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut counts = CategoryCounts::new();
        for fclass in matched
            .into_iter()
            .filter_map(|f| f.attributes.fclass.as_deref())
        {
            *counts.entry(fclass.to_string()).or_insert(0) += 1;
        }
        counts
    }
}
