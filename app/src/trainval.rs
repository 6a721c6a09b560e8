use std::error::Error;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use rand::seq::SliceRandom;

use ri_exporter::dataset::versioned_dir;

#[derive(Parser, Debug)]
#[command(
    name = "Train/Val Splitter",
    about = "Writes all/train/val scan lists for each dataset directory of stored range images",
    version = "0.1.0"
)]
struct Cli {
    /// Directory holding one subdirectory per dataset of .npy files
    #[arg(short, long, required = true, value_name = "DIR")]
    input: String,

    /// Name of the list directory created inside each dataset
    #[arg(long, default_value = "list")]
    outdir: String,

    /// Percentage of scans assigned to the training set
    #[arg(long, default_value_t = 80)]
    train: u8,
}

fn main() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .init();

    let args = Cli::parse();

    log::info!("input folder: {}", args.input);
    log::info!("train percentage: {}", args.train);

    let start = std::time::Instant::now();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }

    log::info!("Elapsed: {:?}", start.elapsed());
}

fn run(args: &Cli) -> Result<(), Box<dyn Error>> {
    let base = Path::new(&args.input);
    let mut dataset_dirs: Vec<PathBuf> = fs::read_dir(base)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dataset_dirs.sort();
    if dataset_dirs.is_empty() {
        return Err(format!("no dataset directories under {}", base.display()).into());
    }

    for dir in dataset_dirs {
        let stems = npy_stems(&dir)?;
        if stems.is_empty() {
            log::warn!("skipping {}: no .npy files", dir.display());
            continue;
        }

        let list_dir = versioned_dir(&dir, &args.outdir, None)?;
        write_list(&list_dir.join("all.txt"), &stems)?;

        let mut shuffled = stems.clone();
        shuffled.shuffle(&mut rand::thread_rng());
        let cut = split_index(shuffled.len(), args.train);
        write_list(&list_dir.join("train.txt"), &shuffled[..cut])?;
        write_list(&list_dir.join("val.txt"), &shuffled[cut..])?;

        log::info!(
            "{}: {} scans, {} train / {} val",
            dir.display(),
            shuffled.len(),
            cut,
            shuffled.len() - cut
        );
    }
    Ok(())
}

fn npy_stems(dir: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(OsStr::to_str) == Some("npy") {
            if let Some(stem) = path.file_stem().and_then(OsStr::to_str) {
                stems.push(stem.to_string());
            }
        }
    }
    stems.sort();
    Ok(stems)
}

fn split_index(count: usize, train_percent: u8) -> usize {
    count * train_percent as usize / 100
}

fn write_list(path: &Path, stems: &[String]) -> Result<(), Box<dyn Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    for stem in stems {
        writeln!(writer, "{}", stem)?;
    }
    writer.flush()?;
    Ok(())
}
