//! Synthetic payment record generator.
//!
//! ```text
//! paygraph-gen OUTPUT [COUNT] [NAMES] [DENSITY] [--out-of-order] [--seed N] [--names-file PATH]
//! ```
//!
//! Writes `COUNT` records (default 100) over `NAMES` actors (default 20),
//! stepping the clock by up to `DENSITY - 1` seconds (default 5) per
//! record. `--names-file` reads `First Last` lines instead of the
//! built-in pool.

mod error;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use paygraph_gen::{GeneratorConfig, builtin_names, generate, names_from_lines, write_records};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::GenError;

/// Parsed command line.
struct Options {
    output: PathBuf,
    config: GeneratorConfig,
    seed: Option<u64>,
    names_file: Option<PathBuf>,
}

/// Application entry point.
///
/// # Errors
///
/// Returns [`GenError`] on bad arguments, an unreadable names file, or an
/// unwritable output file.
fn main() -> Result<(), GenError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args(std::env::args().skip(1))?;

    let pool = match &options.names_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| GenError::ReadNames {
                path: path.clone(),
                source,
            })?;
            names_from_lines(&text)
        }
        None => builtin_names(),
    };

    let mut rng = match options.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let wrap = |source| GenError::Generate {
        path: options.output.clone(),
        source,
    };
    let payments = generate(&options.config, &pool, &mut rng).map_err(wrap)?;
    let file = File::create(&options.output).map_err(|source| GenError::CreateOutput {
        path: options.output.clone(),
        source,
    })?;
    write_records(&payments, BufWriter::new(file)).map_err(wrap)?;

    info!(
        output = %options.output.display(),
        records = payments.len(),
        names = options.config.names,
        density = options.config.density,
        out_of_order = options.config.out_of_order,
        "payment records written"
    );
    Ok(())
}

/// Split flags from positional arguments.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, GenError> {
    let mut config = GeneratorConfig::default();
    let mut seed = None;
    let mut names_file = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-of-order" => config.out_of_order = true,
            "--seed" => seed = Some(number(args.next(), "--seed")?),
            "--names-file" => {
                let path = args.next().ok_or(GenError::MissingValue { what: "--names-file" })?;
                names_file = Some(PathBuf::from(path));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let output = positional.next().ok_or(GenError::MissingValue { what: "OUTPUT" })?;
    if let Some(count) = positional.next() {
        config.count = number(Some(count), "COUNT")?;
    }
    if let Some(names) = positional.next() {
        config.names = number(Some(names), "NAMES")?;
    }
    if let Some(density) = positional.next() {
        config.density = number(Some(density), "DENSITY")?;
    }
    if let Some(extra) = positional.next() {
        return Err(GenError::Usage(format!(
            "unexpected argument {extra:?}; expected paygraph-gen OUTPUT [COUNT] [NAMES] [DENSITY]"
        )));
    }

    Ok(Options {
        output: PathBuf::from(output),
        config,
        seed,
        names_file,
    })
}

/// Parse a numeric argument, naming it in the error.
fn number<T: std::str::FromStr>(value: Option<String>, what: &'static str) -> Result<T, GenError>
where
    T::Err: std::fmt::Display,
{
    let value = value.ok_or(GenError::MissingValue { what })?;
    value.parse().map_err(|e: T::Err| GenError::InvalidNumber {
        what,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn positional_and_flags() {
        let list = ["out.txt", "50", "10", "3", "--out-of-order", "--seed", "9"];
        let options = parse_args(args(&list)).unwrap();
        assert_eq!(options.output, PathBuf::from("out.txt"));
        assert_eq!(
            options.config,
            GeneratorConfig {
                count: 50,
                names: 10,
                density: 3,
                out_of_order: true,
            }
        );
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.names_file, None);
    }

    #[test]
    fn output_is_required() {
        assert!(matches!(
            parse_args(args(&[])),
            Err(GenError::MissingValue { what: "OUTPUT" })
        ));
    }

    #[test]
    fn bad_number_is_reported_with_its_argument() {
        assert!(matches!(
            parse_args(args(&["out.txt", "x"])),
            Err(GenError::InvalidNumber { what: "COUNT", ref value, .. }) if value == "x"
        ));
        assert!(matches!(
            parse_args(args(&["out.txt", "--seed"])),
            Err(GenError::MissingValue { what: "--seed" })
        ));
    }

    #[test]
    fn names_file_needs_a_path() {
        assert!(matches!(
            parse_args(args(&["out.txt", "--names-file"])),
            Err(GenError::MissingValue { what: "--names-file" })
        ));
        let options = parse_args(args(&["out.txt", "--names-file", "names.txt"])).unwrap();
        assert_eq!(options.names_file, Some(PathBuf::from("names.txt")));
    }

    #[test]
    fn extra_positional_is_a_usage_error() {
        assert!(matches!(
            parse_args(args(&["out.txt", "1", "2", "3", "4"])),
            Err(GenError::Usage(_))
        ));
    }
}
