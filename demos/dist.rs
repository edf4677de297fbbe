use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use itertools::Itertools;
use tracing::{info, trace};

use stream_mash::{
    BottomSketch, DEFAULT_SEED, FrozenSketch, KmerHasher, MashHasher, Murmur3Hasher,
    ParallelSketcher, Xxh64Hasher,
};

#[derive(clap::Parser, Debug)]
struct Args {
    /// FASTA/FASTQ files (or directories of them) to sketch.
    paths: Vec<PathBuf>,

    /// k-mer length
    #[clap(short, default_value_t = 21)]
    k: usize,

    /// Sketch size
    #[clap(short, default_value_t = 10000)]
    m: usize,

    /// Hash seed
    #[clap(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Hash function: murmur3, xxh64 or mash-murmur3
    #[clap(long, default_value = "mash-murmur3")]
    hasher: String,
}

fn main() {
    init_trace();

    let args = Args::parse();
    let paths = collect_paths(args.paths);
    let q = paths.len();

    let hasher: Arc<dyn KmerHasher> = match args.hasher.as_str() {
        "murmur3" => Arc::new(Murmur3Hasher),
        "xxh64" => Arc::new(Xxh64Hasher),
        _ => Arc::new(MashHasher),
    };

    let k = args.k;
    let m = args.m;
    let seed = args.seed;
    let sketcher =
        ParallelSketcher::new(|| BottomSketch::new(k, m, hasher.clone(), seed).unwrap());

    let mut sketches: Vec<FrozenSketch> = vec![];
    let start = std::time::Instant::now();

    for path in paths {
        trace!("Sketching {path:?}");
        let mut records: Vec<Vec<u8>> = vec![];
        let mut reader = needletail::parse_fastx_file(path).unwrap();
        let start = std::time::Instant::now();
        while let Some(record) = reader.next() {
            records.push(record.unwrap().seq().into_owned());
        }
        trace!("Reading took {:?}", start.elapsed());
        let start = std::time::Instant::now();
        let sketch = sketcher.sketch_parallel(&records).unwrap();
        sketches.push(sketch.freeze());
        trace!("Sketching itself took {:?}", start.elapsed());
    }
    let t = start.elapsed();
    info!("Sketching {q} files took {t:?} ({:?} avg)", t / q.max(1) as u32);

    let start = std::time::Instant::now();
    let dists = sketches
        .iter()
        .tuple_combinations()
        .map(|(a, b)| a.jaccard_similarity(b).unwrap())
        .collect_vec();
    let t = start.elapsed();
    let cnt = q * (q - 1) / 2;
    info!(
        "Computing {cnt} dists took {t:?} ({:?} avg)",
        t / cnt.max(1) as u32
    );
    for dist in dists {
        println!("{dist}");
    }
}

fn init_trace() {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

fn collect_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut res = vec![];
    for path in paths {
        if path.is_dir() {
            res.extend(path.read_dir().unwrap().map(|entry| entry.unwrap().path()));
        } else {
            res.push(path);
        }
    }
    res
}
