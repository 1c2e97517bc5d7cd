//! Sorted band tables with a single `lookup(key) -> value` contract.
//!
//! A table is an ascending list of bands, each closed at its upper bound.
//! Band `i` covers `(upper[i-1], upper[i]]`; the first band starts at the
//! table floor (inclusive) and the last band may be unbounded above. Keys
//! that land in no band (below the floor, or above a bounded last band)
//! resolve to the table's fallback.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AutoLoanError;
use crate::AutoLoanResult;

/// A single band: every key up to and including `upper` that the previous band did not claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band<V> {
    /// Inclusive upper bound. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Decimal>,
    pub value: V,
}

impl<V> Band<V> {
    pub fn upto(upper: Decimal, value: V) -> Self {
        Band {
            upper: Some(upper),
            value,
        }
    }

    pub fn unbounded(value: V) -> Self {
        Band { upper: None, value }
    }
}

/// What a lookup returns when no band contains the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback<V> {
    LastBand,
    Value(V),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandedTable<V> {
    floor: Decimal,
    bands: Vec<Band<V>>,
    fallback: Fallback<V>,
}

impl<V> BandedTable<V> {
    /// Build a table, checking that bands are non-empty, strictly ascending,
    /// start above the floor and that only the last band is unbounded.
    pub fn new(floor: Decimal, bands: Vec<Band<V>>, fallback: Fallback<V>) -> AutoLoanResult<Self> {
        if bands.is_empty() {
            return Err(AutoLoanError::InvalidInput {
                field: "bands".into(),
                reason: "A rate table needs at least one band".into(),
            });
        }

        let mut previous = floor;
        for (i, band) in bands.iter().enumerate() {
            match band.upper {
                Some(upper) => {
                    // The first band may be a single point at the floor.
                    if upper < previous || (i > 0 && upper == previous) {
                        return Err(AutoLoanError::InvalidInput {
                            field: format!("bands[{i}].upper"),
                            reason: format!(
                                "Band upper bound {upper} must exceed the previous bound {previous}"
                            ),
                        });
                    }
                    previous = upper;
                }
                None if i + 1 != bands.len() => {
                    return Err(AutoLoanError::InvalidInput {
                        field: format!("bands[{i}].upper"),
                        reason: "Only the last band may be unbounded".into(),
                    });
                }
                None => {}
            }
        }

        Ok(BandedTable {
            floor,
            bands,
            fallback,
        })
    }

    /// Build from static data whose ordering is covered by the canonical table tests.
    pub(crate) fn from_sorted(floor: Decimal, bands: Vec<Band<V>>, fallback: Fallback<V>) -> Self {
        debug_assert!(!bands.is_empty());
        BandedTable {
            floor,
            bands,
            fallback,
        }
    }

    /// Index of the band containing `key`, if any.
    pub fn band_index(&self, key: Decimal) -> Option<usize> {
        if key < self.floor {
            return None;
        }
        // Bands are ascending, so the first upper bound >= key is the owner.
        self.bands.iter().position(|band| match band.upper {
            Some(upper) => key <= upper,
            None => true,
        })
    }

    pub fn lookup(&self, key: Decimal) -> &V {
        match self.band_index(key) {
            Some(i) => &self.bands[i].value,
            None => self.fallback_value(),
        }
    }

    fn fallback_value(&self) -> &V {
        match &self.fallback {
            Fallback::Value(v) => v,
            // new() guarantees at least one band
            Fallback::LastBand => &self.bands[self.bands.len() - 1].value,
        }
    }

    /// Inclusive lower edge of band `i`: the floor for the first band,
    /// otherwise the previous upper bound (exclusive in the lookup).
    pub fn lower_bound(&self, i: usize) -> Option<Decimal> {
        match i {
            0 => Some(self.floor),
            _ => self.bands.get(i - 1).and_then(|b| b.upper),
        }
    }

    /// Every value a lookup can return: each band's, then the fallback's.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        let fallback = match &self.fallback {
            Fallback::Value(v) => Some(v),
            Fallback::LastBand => None,
        };
        self.bands.iter().map(|b| &b.value).chain(fallback)
    }

    pub fn bands(&self) -> &[Band<V>] {
        &self.bands
    }

    pub fn floor(&self) -> Decimal {
        self.floor
    }

    /// True when the last band is unbounded, i.e. every key >= floor has an owner.
    pub fn covers_to_infinity(&self) -> bool {
        self.bands.last().is_some_and(|b| b.upper.is_none())
    }
}
