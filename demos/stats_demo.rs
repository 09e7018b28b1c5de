use chain_hash::HashTable;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Number of keys to insert, as a multiple of the requested capacity.
    #[arg(short = 'l', long = "load", default_value_t = 1.0)]
    load: f64,
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let mut table = HashTable::with_capacity(args.target_capacity);

    println!("Bucket count: {}", table.bucket_count());
    println!("Filling table with u64 keys...");

    let num_values = (args.target_capacity as f64 * args.load) as u64;
    for key in 0..num_values {
        if !table.insert(key, key) {
            panic!("Key already exists in table: {}", key);
        }
    }

    println!("Inserted {} keys into table", table.len());
    println!(
        "Final load factor: {:.2}",
        table.len() as f64 / table.bucket_count() as f64
    );

    table.chain_histogram().print();
    table.debug_stats().print();
}
