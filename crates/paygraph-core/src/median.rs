//! Rolling median over the multiset of vertex degrees.
//!
//! The multiset is split into two halves, each an ordered map from degree
//! to multiplicity:
//!
//! ```text
//! low:  every value <= every value in high
//! high: |len(low) - len(high)| <= 1
//! ```
//!
//! The median is read from the boundary elements (max of `low`, min of
//! `high`). Every mutation changes one half's size by exactly one, so a
//! single boundary move restores balance. All operations are `O(log D)`
//! where `D` is the number of distinct degrees present.

use std::collections::BTreeMap;

/// Errors raised by [`DegreeMedian`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MedianError {
    /// The median of an empty multiset was requested.
    #[error("median queried on an empty degree structure")]
    EmptyStructureQuery,

    /// A degree was removed that the multiset does not hold.
    #[error("degree {degree} is not present in the degree structure")]
    DegreeNotPresent {
        /// The degree that was asked for.
        degree: u32,
    },

    /// A half's element counter would leave the `usize` range.
    #[error("degree structure size overflow")]
    SizeOverflow,
}

/// Which half of the structure an element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Low,
    High,
}

/// Multiset of degrees answering median queries in constant time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegreeMedian {
    /// Lower half: degree -> multiplicity.
    low: BTreeMap<u32, usize>,
    /// Upper half: degree -> multiplicity.
    high: BTreeMap<u32, usize>,
    /// Number of elements in `low`, counting multiplicity.
    low_len: usize,
    /// Number of elements in `high`, counting multiplicity.
    high_len: usize,
}

impl DegreeMedian {
    /// Create an empty structure.
    pub const fn new() -> Self {
        Self {
            low: BTreeMap::new(),
            high: BTreeMap::new(),
            low_len: 0,
            high_len: 0,
        }
    }

    /// Total number of degrees held, counting multiplicity.
    pub const fn len(&self) -> usize {
        self.low_len.saturating_add(self.high_len)
    }

    /// Return whether no degree is held.
    pub const fn is_empty(&self) -> bool {
        self.low_len == 0 && self.high_len == 0
    }

    /// Add one occurrence of `degree`.
    ///
    /// # Errors
    ///
    /// Returns [`MedianError::SizeOverflow`] if a half cannot grow.
    pub fn insert(&mut self, degree: u32) -> Result<(), MedianError> {
        let half = self.side_for(degree).unwrap_or(Half::Low);
        self.push(half, degree)?;
        self.rebalance()
    }

    /// Remove one occurrence of `degree`.
    ///
    /// # Errors
    ///
    /// Returns [`MedianError::DegreeNotPresent`] if `degree` is not held.
    pub fn remove(&mut self, degree: u32) -> Result<(), MedianError> {
        let half = self
            .side_for(degree)
            .ok_or(MedianError::DegreeNotPresent { degree })?;
        self.take(half, degree)?;
        self.rebalance()
    }

    /// Current median degree.
    ///
    /// With an odd element count this is the boundary element of the larger
    /// half; with an even count it is the mean of both boundary elements.
    ///
    /// # Errors
    ///
    /// Returns [`MedianError::EmptyStructureQuery`] if nothing is held.
    pub fn median(&self) -> Result<f64, MedianError> {
        let low_max = self.low.last_key_value().map(|(d, _)| f64::from(*d));
        let high_min = self.high.first_key_value().map(|(d, _)| f64::from(*d));

        match self.low_len.cmp(&self.high_len) {
            std::cmp::Ordering::Less => high_min.ok_or(MedianError::EmptyStructureQuery),
            std::cmp::Ordering::Greater => low_max.ok_or(MedianError::EmptyStructureQuery),
            std::cmp::Ordering::Equal => match (low_max, high_min) {
                (Some(lo), Some(hi)) => Ok(lo.midpoint(hi)),
                _ => Err(MedianError::EmptyStructureQuery),
            },
        }
    }

    /// Every held degree with its multiplicity, in ascending order.
    pub fn counts(&self) -> BTreeMap<u32, usize> {
        let mut merged = self.low.clone();
        for (degree, count) in &self.high {
            let slot = merged.entry(*degree).or_insert(0);
            *slot = slot.saturating_add(*count);
        }
        merged
    }

    /// Pick the half consistent with the ordering invariant for `degree`.
    ///
    /// Compares against `max(low)` when `low` is non-empty, else against
    /// `min(high)`. Returns `None` when both halves are empty.
    fn side_for(&self, degree: u32) -> Option<Half> {
        if let Some((&low_max, _)) = self.low.last_key_value() {
            return Some(if degree <= low_max { Half::Low } else { Half::High });
        }
        self.high.first_key_value().map(|(&high_min, _)| {
            if degree >= high_min {
                Half::High
            } else {
                Half::Low
            }
        })
    }

    fn push(&mut self, half: Half, degree: u32) -> Result<(), MedianError> {
        let (map, len) = match half {
            Half::Low => (&mut self.low, &mut self.low_len),
            Half::High => (&mut self.high, &mut self.high_len),
        };
        *len = len.checked_add(1).ok_or(MedianError::SizeOverflow)?;
        let count = map.entry(degree).or_insert(0);
        *count = count.saturating_add(1);
        Ok(())
    }

    fn take(&mut self, half: Half, degree: u32) -> Result<(), MedianError> {
        let (map, len) = match half {
            Half::Low => (&mut self.low, &mut self.low_len),
            Half::High => (&mut self.high, &mut self.high_len),
        };
        let count = map
            .get_mut(&degree)
            .ok_or(MedianError::DegreeNotPresent { degree })?;
        if *count > 1 {
            *count = count.saturating_sub(1);
        } else {
            map.remove(&degree);
        }
        *len = len.saturating_sub(1);
        Ok(())
    }

    /// Move one boundary element if the halves differ in size by more than one.
    fn rebalance(&mut self) -> Result<(), MedianError> {
        if self.low_len.saturating_sub(self.high_len) > 1 {
            if let Some((&degree, _)) = self.low.last_key_value() {
                self.take(Half::Low, degree)?;
                self.push(Half::High, degree)?;
            }
        } else if self.high_len.saturating_sub(self.low_len) > 1
            && let Some((&degree, _)) = self.high.first_key_value()
        {
            self.take(Half::High, degree)?;
            self.push(Half::Low, degree)?;
        }
        Ok(())
    }
}
