use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::rect::Rect;

/// How per-image boxes fold into the one rect every image is cropped to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    /// Envelope of all boxes. Every image keeps all of its opaque pixels and
    /// the batch stays pixel-aligned after cropping.
    #[default]
    Union,
    /// The single box with the largest perimeter, broadcast to every image.
    Largest,
}

impl std::fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationPolicy::Union => write!(f, "union"),
            AggregationPolicy::Largest => write!(f, "largest"),
        }
    }
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "union" => Ok(AggregationPolicy::Union),
            "largest" => Ok(AggregationPolicy::Largest),
            other => Err(format!(
                "Aggregation policy must be 'union' or 'largest', got '{other}'"
            )),
        }
    }
}

/// Folds per-image rects into one batch target.
///
/// Empty rects carry no opaque pixels and are skipped. Returns `None` when
/// nothing usable remains.
pub fn aggregate<'a, I>(rects: I, policy: AggregationPolicy) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    let mut usable = rects.into_iter().filter(|r| !r.is_empty());
    let first = *usable.next()?;

    let folded = match policy {
        AggregationPolicy::Union => usable.fold(first, |acc, r| acc.union(r)),
        AggregationPolicy::Largest => usable.fold(first, |best, r| {
            if r.is_larger_than(&best) {
                *r
            } else {
                best
            }
        }),
    };
    Some(folded)
}

/// Aggregates and optionally applies even parity to the result.
pub fn aggregate_target<'a, I>(rects: I, policy: AggregationPolicy, even: bool) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    let target = aggregate(rects, policy)?;
    Some(if even {
        target.with_even_parity()
    } else {
        target
    })
}
