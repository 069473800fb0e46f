use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zip::write::SimpleFileOptions;

/// Write a synthetic trending-video dataset for local runs.
#[derive(Debug, Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output path. A `.zip` extension wraps the CSV in an archive.
    #[arg(long, short, default_value = "sample_trending.csv")]
    output: PathBuf,

    #[arg(long, default_value_t = 5_000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// (categoryId, name, typical log10 views)
const CATEGORIES: [(u32, &str, f64); 8] = [
    (1, "Film & Animation", 5.6),
    (10, "Music", 6.1),
    (17, "Sports", 5.4),
    (20, "Gaming", 5.2),
    (22, "People & Blogs", 5.0),
    (23, "Comedy", 5.5),
    (24, "Entertainment", 5.9),
    (25, "News & Politics", 4.9),
];

const HEADERS: [&str; 10] = [
    "video_id",
    "categoryId",
    "publishedAt",
    "view_count",
    "likes",
    "dislikes",
    "comment_count",
    "like_ratio",
    "publish_hour",
    "title",
];

/// Box-Muller transform for a standard normal draw
fn gauss(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn sample_row(rng: &mut StdRng, index: usize) -> Vec<String> {
    let (id, name, log_views) = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];

    let views = 10f64.powf(log_views + 0.6 * gauss(rng)).round().max(1.0);
    let likes = (views * rng.gen_range(0.005..0.12)).round();
    let dislikes = (likes * rng.gen_range(0.0..0.08)).round();
    let comments = (likes * rng.gen_range(0.01..0.2)).round();
    let like_ratio = likes / views;

    // Evening-heavy upload times.
    let hour = ((17.0 + 4.0 * gauss(rng)).round() as i64).rem_euclid(24);
    let day = rng.gen_range(1..=28);

    // Sprinkle gaps so missing-value handling gets exercised.
    let gap = |rng: &mut StdRng, value: String| {
        if rng.gen_bool(0.01) {
            String::new()
        } else {
            value
        }
    };

    vec![
        format!("v{index:06}"),
        id.to_string(),
        format!("2024-03-{day:02}T{hour:02}:00:00Z"),
        format!("{views}"),
        gap(rng, format!("{likes}")),
        gap(rng, format!("{dislikes}")),
        gap(rng, format!("{comments}")),
        format!("{like_ratio:.6}"),
        hour.to_string(),
        format!("{name} upload #{index}"),
    ]
}

fn write_csv<W: Write>(out: W, rows: usize, seed: u64) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADERS)?;
    for i in 0..rows {
        writer.write_record(sample_row(&mut rng, i))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let zipped = args
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));

    if zipped {
        let entry = args
            .output
            .with_extension("csv")
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trending.csv".to_string());
        let mut archive = zip::ZipWriter::new(file);
        archive.start_file(
            entry,
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated),
        )?;
        write_csv(&mut archive, args.rows, args.seed)?;
        archive.finish()?;
    } else {
        write_csv(file, args.rows, args.seed)?;
    }

    println!("Wrote {} rows to {}", args.rows, args.output.display());
    Ok(())
}
