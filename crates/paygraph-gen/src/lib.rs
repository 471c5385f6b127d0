//! Synthetic payment streams for exercising the rolling median.
//!
//! A generated stream starts at `2014-03-01T00:00:59Z` and advances a
//! clock by a random step below `density` seconds per payment. In
//! out-of-order mode the clock steps backwards instead with probability
//! 4/10, producing late and reordered records. Each payment joins two
//! distinct names drawn uniformly from a pool.

use std::io::Write;

use paygraph_types::{Epoch, Payment, TimestampError};
use rand::Rng;

/// Epoch of the first generated payment, `2014-03-01T00:00:59Z`.
pub const START_EPOCH: Epoch = 1_393_632_059;

/// Probability that an out-of-order step moves the clock backwards.
pub const BACKWARD_STEP_PROBABILITY: f64 = 0.4;

const FIRST_NAMES: [&str; 16] = [
    "Jordan", "Jamie", "Maryann", "Ying", "Raffi", "Charlotte", "Caroline", "Connor",
    "Nick", "Amber", "Kevin", "Ryan", "Mina", "Pedro", "Lucia", "Tomas",
];

const LAST_NAMES: [&str; 16] = [
    "Gruber", "Korn", "Berry", "Mo", "Antilian", "Macfarlane", "Kaiser", "Roy",
    "Beatty", "Sand", "Kanter", "Li", "Okafor", "Silva", "Novak", "Haddad",
];

/// Errors raised while generating a stream.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Fewer than two names were requested, so no pair can be formed.
    #[error("at least two names are needed, got {0}")]
    TooFewNames(usize),

    /// More names were requested than the pool provides.
    #[error("requested {requested} names but only {available} are available")]
    NotEnoughNames {
        /// Names asked for.
        requested: usize,
        /// Names in the pool.
        available: usize,
    },

    /// The clock left the representable date range.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters of one generated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of payments to produce.
    pub count: usize,
    /// Number of distinct actors to draw from.
    pub names: usize,
    /// Exclusive upper bound of a clock step, in seconds.
    pub density: Epoch,
    /// Whether the clock may step backwards.
    pub out_of_order: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 100,
            names: 20,
            density: 5,
            out_of_order: false,
        }
    }
}

/// The built-in name pool: every `First-Last` combination.
pub fn builtin_names() -> Vec<String> {
    LAST_NAMES
        .iter()
        .flat_map(|last| FIRST_NAMES.iter().map(move |first| format!("{first}-{last}")))
        .collect()
}

/// Turn `First Last` lines into `First-Last` names, skipping blank lines.
pub fn names_from_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::split_whitespace)
        .map(|parts| parts.collect::<Vec<_>>().join("-"))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Generate `config.count` payments over the first `config.names` names of
/// `pool`.
///
/// # Errors
///
/// Returns [`GeneratorError::TooFewNames`] or
/// [`GeneratorError::NotEnoughNames`] if the pool cannot supply two
/// distinct actors.
pub fn generate(
    config: &GeneratorConfig,
    pool: &[String],
    rng: &mut impl Rng,
) -> Result<Vec<Payment>, GeneratorError> {
    if config.names < 2 {
        return Err(GeneratorError::TooFewNames(config.names));
    }
    let names = pool.get(..config.names).ok_or(GeneratorError::NotEnoughNames {
        requested: config.names,
        available: pool.len(),
    })?;

    let mut payments = Vec::with_capacity(config.count);
    let mut clock = START_EPOCH;
    while payments.len() < config.count {
        let actor = rng.random_range(0..names.len());
        let target = rng.random_range(0..names.len());
        if actor == target {
            continue;
        }
        let (Some(actor), Some(target)) = (names.get(actor), names.get(target)) else {
            continue;
        };

        if !payments.is_empty() {
            let step = if config.density > 0 {
                rng.random_range(0..config.density)
            } else {
                0
            };
            clock = if config.out_of_order && rng.random_bool(BACKWARD_STEP_PROBABILITY) {
                clock.saturating_sub(step)
            } else {
                clock.saturating_add(step)
            };
        }
        payments.push(Payment::new(clock, actor.as_str(), target.as_str()));
    }
    Ok(payments)
}

/// Write payments as one JSON record per line.
///
/// # Errors
///
/// Returns [`GeneratorError`] if a timestamp cannot be formatted or the
/// writer fails.
pub fn write_records<W: Write>(payments: &[Payment], mut out: W) -> Result<(), GeneratorError> {
    for payment in payments {
        let record = payment.to_record()?;
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
