use std::error::Error;
use std::time::{Duration, Instant};

use clap::Parser;
use segmented_bitonic::{DEFAULT_SEGMENT_SIZE, SortConfig, SortType, WaitPolicy, sort};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// `Original` sorts element by element; past this size it only adds noise.
const ORIGINAL_MAX_LG_SIZE: usize = 16;

/// Benchmark the segmented bitonic sort strategies on random `u64` data
#[derive(Debug, Parser)]
#[command(name = "segmented-bitonic")]
struct Cli {
    /// Strategies to run; all of them when none are given
    sort_types: Vec<SortType>,

    /// Worker threads, capped at the segment count (default: machine parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Elements per segment
    #[arg(short, long, default_value_t = DEFAULT_SEGMENT_SIZE)]
    segment_size: usize,

    /// What waiting threads do between polls
    #[arg(short, long, default_value_t = WaitPolicy::default())]
    wait_policy: WaitPolicy,
}

fn benchmark(name: &str, repeats: usize, mut f: impl FnMut()) {
    // Warmup.
    for _ in 0..repeats {
        f();
    }
    let start = Instant::now();
    for _ in 0..repeats {
        f();
    }
    info!("  {}: {}", name, human_time(repeats, start.elapsed()));
}

fn human_time(repeats: usize, duration: Duration) -> String {
    let nanos = duration.as_nanos() as f64 / repeats as f64;
    let (value, unit) = match nanos {
        n if n < 1e3 => (n, "ns"),
        n if n < 1e6 => (n / 1e3, "us"),
        n if n < 1e9 => (n / 1e6, "ms"),
        n => (n / 1e9, "s"),
    };
    format!("{value:.1}{unit}")
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let sort_types = if cli.sort_types.is_empty() { SortType::ALL.to_vec() } else { cli.sort_types };
    let max_threads = cli.threads.unwrap_or_else(|| SortConfig::default().num_threads);

    let mut rng = fastrand::Rng::with_seed(0);
    for lg_size in [10usize, 15, 20, 22] {
        let mut data = vec![0u64; 1 << lg_size];
        // Keep a small but nonzero number of duplicates.
        let mask = (1u64 << lg_size) - 1;
        for d in &mut data {
            *d = rng.u64(..) & mask;
        }
        let mut expected = data.clone();
        expected.sort_unstable();

        let repeats = 1usize << 22usize.saturating_sub(lg_size);
        let num_segments = data.len() / cli.segment_size.max(1);
        let num_threads = max_threads.min(num_segments);
        info!(
            "size: {}KiB, segments: {}, threads: {}",
            std::mem::size_of::<u64>() * data.len() / 1024,
            num_segments,
            num_threads
        );

        for &sort_type in &sort_types {
            if sort_type == SortType::Original && lg_size > ORIGINAL_MAX_LG_SIZE {
                continue;
            }
            let config = SortConfig::new(sort_type)
                .with_threads(num_threads)
                .with_segment_size(cli.segment_size)
                .with_wait_policy(cli.wait_policy);

            let mut sorted = data.clone();
            if let Err(err) = sort(&mut sorted, &config) {
                warn!(%err, %sort_type, lg_size, "skipping");
                continue;
            }
            if sorted != expected {
                error!(%sort_type, lg_size, "output differs from sort_unstable");
                continue;
            }

            let mut scratch = data.clone();
            benchmark(sort_type.name(), repeats, || {
                scratch.copy_from_slice(&data);
                if let Err(err) = sort(&mut scratch, &config) {
                    error!(%err, %sort_type, "sort failed");
                }
            });
        }
    }
    Ok(())
}
