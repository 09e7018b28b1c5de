use std::process::ExitCode;
use std::time::Instant;

use chain_hash::HashTable;
use clap::Parser;

/// Runs the insert/update/lookup/erase self test against tables of several
/// sizes. Exits non-zero on the first violated expectation.
#[derive(Parser, Debug)]
struct Args {
    /// Table capacities to exercise.
    #[arg(
        short = 's',
        long = "sizes",
        value_delimiter = ',',
        default_values_t = [10u64, 99, 837, 48329, 384933]
    )]
    sizes: Vec<u64>,
}

macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            eprintln!("check failed: {}: {}", stringify!($cond), format_args!($($arg)+));
            return Err(());
        }
    };
}

/// Returns the bucket count of the exercised table on success.
fn general_test(size: u64) -> Result<usize, ()> {
    let mut h = HashTable::with_capacity(size as usize);

    for i in 0..size {
        ensure!(h.insert(i, 42), "insert {i}");
    }
    for i in 0..size {
        ensure!(!h.insert(i, i), "update {i}");
    }
    for i in 0..size {
        ensure!(h.lookup(i).map(|e| e.value()) == Some(i), "lookup {i}");
    }

    for i in (0..size / 2).step_by(3) {
        ensure!(h.erase(i), "erase {i}");
    }
    for i in (0..size / 2).step_by(3) {
        ensure!(!h.erase(i), "erase twice {i}");
    }
    for i in 0..size / 2 {
        let value = h.lookup(i).map(|e| e.value());
        if i % 3 == 0 {
            ensure!(value.is_none(), "lookup erased {i}");
        } else {
            ensure!(value == Some(i), "lookup kept {i}");
        }
    }

    for i in 0..size / 2 {
        ensure!(h.erase(i) == (i % 3 != 0), "erase more {i}");
    }
    for i in 0..size / 2 {
        ensure!(h.lookup(i).is_none(), "final lookup {i}");
    }

    Ok(h.bucket_count())
}

fn main() -> ExitCode {
    let args = Args::parse();

    for size in args.sizes {
        let start = Instant::now();
        let Ok(bucket_count) = general_test(size) else {
            eprintln!("self test failed for size {size}");
            return ExitCode::FAILURE;
        };
        let elapsed = start.elapsed();
        println!("size {size:>8}: ok ({bucket_count} buckets, {elapsed:.2?})");
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_bucket_count_of_exercised_table() {
        assert_eq!(general_test(10), Ok(16));
        assert_eq!(general_test(64), Ok(128));
        assert_eq!(general_test(837), Ok(1024));
    }

    #[test]
    fn default_sizes() {
        let args = Args::parse_from(["self_test"]);
        assert_eq!(args.sizes, [10, 99, 837, 48329, 384933]);

        let args = Args::parse_from(["self_test", "--sizes", "3,5"]);
        assert_eq!(args.sizes, [3, 5]);
    }
}
