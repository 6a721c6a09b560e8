use std::error::Error;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, ValueEnum};
use env_logger::Builder;
use glob::glob;
use indicatif::ProgressBar;
use log::LevelFilter;
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};

use ri_exporter::dataset::versioned_dir;
use ri_exporter::npy::write_npy;
use ri_exporter::text::{write_colored_text, write_text, DEFAULT_CLASS_COLORS};
use ri_parser::parsers::npy::NpyParserProvider;
use ri_parser::parsers::text::TextParserProvider;
use ri_parser::parsers::{Parser as _, ParserProvider as _};
use ri_transformer::runner::RangeImageTransformer;
use ri_transformer::transform::downsample::{RingDownsample, DOWNSAMPLE_VARIANTS};
use ri_transformer::transform::merge::LabelMerge;
use ri_transformer::transform::upsample::{RingUpsample, UPSAMPLE_VARIANT};
use ri_transformer::Transformer as _;

#[derive(Parser, Debug)]
#[command(
    name = "Range Image Converter",
    about = "Converts LiDAR range-image datasets between text and array form and resamples them across beam counts",
    version = "0.1.0"
)]
struct Cli {
    #[arg(short, long, value_enum)]
    mode: Mode,

    #[arg(short, long, required = true, value_name = "DIR")]
    input: String,

    #[arg(short, long, required = true, value_name = "DIR")]
    output: String,

    /// Name of the output dataset directory (versioned per run)
    #[arg(long, default_value = "vlp64")]
    outdir: String,

    /// Azimuth buckets per ring
    #[arg(long, default_value_t = 512)]
    azimuths: usize,

    /// Sensor rings expected in each input file
    #[arg(long, default_value_t = 64)]
    rings: usize,

    /// Class id kept when merging labels
    #[arg(long, default_value_t = 2)]
    keep_class: u32,

    /// Class id rewritten into --keep-class
    #[arg(long, default_value_t = 3)]
    merge_class: u32,

    /// Dataset label tag: "g" annotated with ground, "ng" without
    #[arg(long, default_value = "g")]
    tag: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Text point clouds to npy range images
    ToArray,
    /// Npy range images to flat text
    ToText,
    /// 64-ring images to the 32-ring and three 16-ring views
    Downsample,
    /// 16-ring images to interpolated 32-ring images
    Upsample,
    /// Rewrite one label class into another
    MergeLabels,
    /// Npy predictions to color-annotated text
    ExportPredictions,
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

    log::info!("mode: {:?}", args.mode);
    log::info!("input folder: {}", args.input);
    log::info!("output folder: {}", args.output);
    log::info!(
        "grid shape: {} rings x {} azimuths",
        args.rings,
        args.azimuths
    );

    let start = std::time::Instant::now();

    let result = match args.mode {
        Mode::ToArray => run_to_array(&args),
        Mode::ToText => run_to_text(&args),
        Mode::Downsample => run_downsample(&args),
        Mode::Upsample => run_upsample(&args),
        Mode::MergeLabels => run_merge_labels(&args),
        Mode::ExportPredictions => run_export_predictions(&args),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }

    log::info!("Elapsed: {:?}", start.elapsed());
}

fn run_to_array(args: &Cli) -> Result<(), Box<dyn Error>> {
    let files = list_input_files(Path::new(&args.input), "txt")?;
    let out_dir = versioned_dir(Path::new(&args.output), &args.outdir, Some(&args.tag))?;
    log::info!(
        "converting {} text files into {}",
        files.len(),
        out_dir.display()
    );

    let parser = TextParserProvider {
        rings: args.rings,
        azimuths: args.azimuths,
    }
    .get_parser();

    process_files(&files, |path| {
        let image = parser.parse(path)?;
        write_npy(&out_dir.join(format!("{}.npy", file_stem(path)?)), &image)?;
        Ok(())
    });
    Ok(())
}

fn run_to_text(args: &Cli) -> Result<(), Box<dyn Error>> {
    let files = list_input_files(Path::new(&args.input), "npy")?;
    let out_dir = versioned_dir(Path::new(&args.output), &args.outdir, Some(&args.tag))?;
    log::info!(
        "converting {} array files into {}",
        files.len(),
        out_dir.display()
    );

    let parser = NpyParserProvider {
        expected_shape: None,
    }
    .get_parser();

    process_files(&files, |path| {
        let image = parser.parse(path)?;
        write_text(&out_dir.join(format!("{}.txt", file_stem(path)?)), &image)?;
        Ok(())
    });
    Ok(())
}

fn run_downsample(args: &Cli) -> Result<(), Box<dyn Error>> {
    let files = list_input_files(Path::new(&args.input), "npy")?;
    let variant_dirs = DOWNSAMPLE_VARIANTS
        .iter()
        .map(|variant| versioned_dir(Path::new(&args.output), variant.dir, Some(&args.tag)))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("downsampling {} point clouds", files.len());

    let parser = NpyParserProvider {
        expected_shape: Some((args.rings, args.azimuths)),
    }
    .get_parser();
    let transformer = RangeImageTransformer::new(Box::new(RingDownsample));

    process_files(&files, |path| {
        let stem = file_stem(path)?;
        let outputs = transformer.execute(parser.parse(path)?);
        for ((variant, dir), image) in
            DOWNSAMPLE_VARIANTS.iter().zip(&variant_dirs).zip(&outputs)
        {
            write_npy(&dir.join(format!("{}{}.npy", variant.prefix, stem)), image)?;
        }
        Ok(())
    });
    Ok(())
}

fn run_upsample(args: &Cli) -> Result<(), Box<dyn Error>> {
    let files = list_input_files(Path::new(&args.input), "npy")?;
    let out_dir = versioned_dir(Path::new(&args.output), UPSAMPLE_VARIANT.dir, Some(&args.tag))?;
    log::info!(
        "interpolating {} point clouds from {} to {} rings into {}",
        files.len(),
        args.rings,
        args.rings * 2,
        out_dir.display()
    );

    let parser = NpyParserProvider {
        expected_shape: Some((args.rings, args.azimuths)),
    }
    .get_parser();
    let transformer = RangeImageTransformer::new(Box::new(RingUpsample));

    process_files(&files, |path| {
        let stem = file_stem(path)?;
        for image in transformer.execute(parser.parse(path)?) {
            write_npy(
                &out_dir.join(format!("{}{}.npy", UPSAMPLE_VARIANT.prefix, stem)),
                &image,
            )?;
        }
        Ok(())
    });
    Ok(())
}

fn run_merge_labels(args: &Cli) -> Result<(), Box<dyn Error>> {
    let files = list_input_files(Path::new(&args.input), "txt")?;
    let out_dir = versioned_dir(Path::new(&args.output), &args.outdir, Some(&args.tag))?;
    log::info!(
        "merging class {} into class {} across {} files",
        args.merge_class,
        args.keep_class,
        files.len()
    );

    let parser = TextParserProvider {
        rings: args.rings,
        azimuths: args.azimuths,
    }
    .get_parser();
    let transformer = RangeImageTransformer::new(Box::new(LabelMerge {
        keep: args.keep_class,
        merge_from: args.merge_class,
    }));

    process_files(&files, |path| {
        let stem = file_stem(path)?;
        for image in transformer.execute(parser.parse(path)?) {
            write_text(&out_dir.join(format!("{}.txt", stem)), &image)?;
        }
        Ok(())
    });
    Ok(())
}

fn run_export_predictions(args: &Cli) -> Result<(), Box<dyn Error>> {
    let files = list_input_files(Path::new(&args.input), "npy")?;
    let out_dir = versioned_dir(Path::new(&args.output), &args.outdir, Some(&args.tag))?;
    log::info!(
        "exporting {} prediction files into {}",
        files.len(),
        out_dir.display()
    );

    let parser = NpyParserProvider {
        expected_shape: None,
    }
    .get_parser();

    process_files(&files, |path| {
        let image = parser.parse(path)?;
        write_colored_text(
            &out_dir.join(format!("{}.txt", file_stem(path)?)),
            &image,
            &DEFAULT_CLASS_COLORS,
        )?;
        Ok(())
    });
    Ok(())
}

fn list_input_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let pattern = dir.join(format!("*.{}", extension));
    let pattern = pattern
        .to_str()
        .ok_or_else(|| format!("input path {} is not valid UTF-8", dir.display()))?;

    let mut files: Vec<PathBuf> = glob(pattern)?.filter_map(Result::ok).collect();
    files.sort();
    if files.is_empty() {
        return Err(format!("no .{} files found in {}", extension, dir.display()).into());
    }
    Ok(files)
}

fn file_stem(path: &Path) -> Result<String, Box<dyn Error>> {
    Ok(path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| format!("cannot derive a file name from {}", path.display()))?
        .to_string())
}

/// Runs one closure per file on the rayon pool, ticking a progress bar.
/// A failing file is logged and skipped; the batch continues.
fn process_files<F>(files: &[PathBuf], process: F)
where
    F: Fn(&Path) -> Result<(), Box<dyn Error>> + Sync,
{
    let bar = ProgressBar::new(files.len() as u64);
    let failures: usize = files
        .par_iter()
        .map(|path| {
            let outcome = process(path);
            bar.inc(1);
            match outcome {
                Ok(()) => 0,
                Err(e) => {
                    log::error!("skipping {}: {}", path.display(), e);
                    1
                }
            }
        })
        .sum();
    bar.finish_and_clear();

    if failures > 0 {
        log::warn!("{} file(s) failed and were skipped", failures);
    }
}
