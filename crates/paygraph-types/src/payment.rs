//! The payment event and its wire form.

use serde::Serialize;

use crate::time::{Epoch, TimestampError, format_timestamp};

/// One payment between two actors, normalized for the graph.
///
/// A payment is an undirected fact for degree purposes: a payment from
/// `actor` to `target` and one from `target` to `actor` occupy the same
/// edge slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payment {
    /// Creation time in epoch seconds.
    pub epoch: Epoch,
    /// The paying actor.
    pub actor: String,
    /// The paid actor.
    pub target: String,
}

impl Payment {
    /// Create a payment from its parts.
    pub fn new(epoch: Epoch, actor: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            epoch,
            actor: actor.into(),
            target: target.into(),
        }
    }

    /// Convert to the wire form.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] if the epoch cannot be
    /// formatted as a date-time.
    pub fn to_record(&self) -> Result<PaymentRecord, TimestampError> {
        Ok(PaymentRecord {
            created_time: format_timestamp(self.epoch)?,
            target: self.target.clone(),
            actor: self.actor.clone(),
        })
    }
}

/// The wire form of a payment: one JSON-like object per line.
///
/// Field order here is the order the generator writes keys in. Readers
/// must not depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    /// Timestamp such as `2014-03-01T00:00:59Z`.
    pub created_time: String,
    /// The paid actor.
    pub target: String,
    /// The paying actor.
    pub actor: String,
}
