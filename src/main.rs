use clap::Parser;
use ipcount::{CancelToken, Config, IpCounter, StorePolicy};
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ipcount", about = "Count distinct IPv4 addresses in a file")]
struct Args {
    /// File with one address per record
    path: PathBuf,

    /// Maximum number of reader threads [default: available cores]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Record separator, a single ASCII character
    #[arg(short, long, default_value_t = '\n')]
    separator: char,

    /// Give up after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Dedup strategy: auto, bitset, sorted or hashed
    #[arg(long, default_value_t = StorePolicy::Auto)]
    store: StorePolicy,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if !args.separator.is_ascii() {
        return Err(format!("separator {:?} is not a single byte", args.separator).into());
    }

    let mut config = Config::default()
        .with_separator(args.separator as u8)
        .with_store(args.store);
    if let Some(workers) = args.workers {
        config = config.with_max_workers(workers);
    }
    let counter = IpCounter::new(config)?;
    let cancel = match args.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    let start = Instant::now();
    let tally = counter.count_ipv4(&cancel, &args.path)?;
    info!(
        elapsed = ?start.elapsed(),
        records = tally.records,
        malformed = tally.malformed,
        "finished {}",
        args.path.display()
    );
    println!("{}", tally.unique);
    Ok(())
}
