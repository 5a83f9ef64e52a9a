//! designs4u command-line tool
//!
//! `remove-bg` cuts product photos out of their backgrounds, `upload`
//! pushes catalog images through the size limit into a bucket directory
//! and `checkout` turns an order file into the checkout deep link.

use super::config::CliConfigBuilder;
use crate::{
    cart::Cart,
    error::StoreError,
    processor::{BackgroundRemovalProcessor, ImageSource},
    services::{
        create_cli_progress_reporter, upload_image, upload_removal_result, LocalObjectStore,
        OutputFormatHandler, ProgressTracker,
    },
    tracing_config::{events, init_cli_tracing, spans},
    types::RemovalResult,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Deserialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Instrument;

/// Storefront tooling: product photo cutouts, uploads and checkout links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "designs4u")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log detail (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove near-uniform backgrounds from product photos
    RemoveBg(RemoveBgArgs),
    /// Downscale oversized catalog images and store them in a bucket
    Upload(UploadArgs),
    /// Build the checkout message and deep link for an order file
    Checkout(CheckoutArgs),
}

#[derive(Args, Debug)]
pub struct RemoveBgArgs {
    /// Image files, directories or http(s) URLs ("-" reads stdin)
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory (batch). "-" writes to stdout.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Output format [default: png]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// Color distance at or below which pixels become transparent [default: 60]
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Width of the alpha ramp above the threshold [default: 20]
    #[arg(long)]
    pub feather: Option<f64>,

    /// Side of the corner patches used to estimate the background [default: 10]
    #[arg(long)]
    pub sample_size: Option<u32>,

    /// JPEG quality (0-100) [default: 90]
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// WebP quality (0-100) [default: 85]
    #[arg(long)]
    pub webp_quality: Option<u8>,

    /// JSON file with removal settings; flags override its values
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// File name pattern for directory inputs (e.g. "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Also store each cutout in this bucket root
    #[arg(long, value_name = "DIR")]
    pub upload_dir: Option<PathBuf>,

    #[command(flatten)]
    pub bucket: BucketArgs,
}

#[derive(Args, Debug)]
pub struct BucketArgs {
    /// Base URL the bucket is served from
    #[arg(long, default_value = "http://localhost:8080")]
    pub public_url: String,

    /// Bucket name inside the upload directory
    #[arg(long, default_value = "product-images")]
    pub bucket: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image files to upload
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Bucket root directory
    #[arg(long, value_name = "DIR")]
    pub upload_dir: PathBuf,

    #[command(flatten)]
    pub bucket: BucketArgs,

    /// Images above this size are downscaled before upload
    #[arg(long, default_value_t = 2.0)]
    pub max_upload_mb: f64,

    /// Format used when an image has to be re-encoded
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Webp)]
    pub format: CliOutputFormat,

    /// Encoder quality for re-encoded images (0-100)
    #[arg(long, default_value_t = 85)]
    pub quality: u8,
}

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// JSON array of order entries ("-" reads stdin)
    #[arg(value_name = "ORDER_JSON")]
    pub order: String,

    /// Deep link the order message is attached to
    #[arg(long)]
    pub deep_link: Option<String>,

    /// Currency label printed after amounts
    #[arg(long)]
    pub currency: Option<String>,

    /// Leave sizes out of the order lines
    #[arg(long)]
    pub no_sizes: bool,

    /// Print the message and link as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
    Rgba8,
}

/// One entry of an order file
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntry {
    pub title: String,
    pub price: crate::cart::PriceInput,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = uuid::Uuid::new_v4().to_string();
    let _guard =
        init_cli_tracing(cli.verbose, &session_id).context("Failed to initialize tracing")?;

    let command_name = match &cli.command {
        Command::RemoveBg(_) => "remove-bg",
        Command::Upload(_) => "upload",
        Command::Checkout(_) => "checkout",
    };
    let start_time = Instant::now();
    let outcome = async {
        match &cli.command {
            Command::RemoveBg(args) => run_remove_bg(args, cli.verbose).await.map(|processed| {
                info!("Processed {} image(s)", processed);
            }),
            Command::Upload(args) => run_upload(args).await,
            Command::Checkout(args) => run_checkout(args),
        }
    }
    .instrument(spans::session(&session_id, command_name))
    .await;

    match outcome {
        Ok(()) => {
            events::performance_metric(command_name, start_time.elapsed().as_millis() as u64);
            Ok(())
        },
        Err(e) => {
            error!("{} failed: {:#}", command_name, e);
            Err(e)
        },
    }
}

async fn run_remove_bg(args: &RemoveBgArgs, verbose: u8) -> Result<usize> {
    let config = CliConfigBuilder::removal_config(args).context("Invalid removal settings")?;
    OutputFormatHandler::validate_for_background_removal(config.output_format);

    let tracker = ProgressTracker::new(create_cli_progress_reporter(verbose > 0));
    let mut processor = BackgroundRemovalProcessor::with_progress(config, tracker)
        .context("Failed to create processor")?;

    let store = args
        .upload_dir
        .as_ref()
        .map(|dir| LocalObjectStore::new(dir, &args.bucket.bucket, &args.bucket.public_url));

    if args.input.len() == 1 && args.input.first().is_some_and(|s| s == "-") {
        return process_stdin(args.output.as_deref(), &mut processor, store.as_ref()).await;
    }

    let sources = collect_sources(args)?;
    if sources.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(0);
    }

    let source_count = sources.len();
    process_batch(args, &sources, &mut processor, store.as_ref())
        .instrument(spans::batch_processing(source_count))
        .await
}

async fn process_batch(
    args: &RemoveBgArgs,
    sources: &[ImageSource],
    processor: &mut BackgroundRemovalProcessor,
    store: Option<&LocalObjectStore>,
) -> Result<usize> {
    let source_count = sources.len();
    events::progress(&format!("Found {} image(s) to process", source_count));

    let output_dir = prepare_output_dir(args.output.as_deref(), source_count)?;

    let progress = if source_count > 1 {
        let pb = ProgressBar::new(source_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut processed_count = 0;
    let mut failed_count = 0;
    let batch_start_time = Instant::now();

    for source in sources {
        if let Some(ref pb) = progress {
            pb.set_message(source.describe());
        }

        let target = if source_count == 1 {
            args.output.clone()
        } else {
            output_dir.as_ref().map(|dir| {
                output_path_in_dir(source, dir, processor.config().output_format)
                    .to_string_lossy()
                    .to_string()
            })
        };

        match process_one(processor, source, target.as_deref(), store).await {
            Ok(()) => processed_count += 1,
            Err(e) => {
                let unreadable = e
                    .downcast_ref::<StoreError>()
                    .is_some_and(StoreError::is_source_failure);
                if unreadable {
                    warn!("Skipping unreadable source {}: {:#}", source.describe(), e);
                } else {
                    error!("Failed to process {}: {:#}", source.describe(), e);
                }
                failed_count += 1;
            },
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Completed! Processed: {processed_count}, Failed: {failed_count}"
        ));
    }

    if source_count > 1 {
        let elapsed = batch_start_time.elapsed().as_secs_f64();
        info!(
            "Batch summary: {} processed, {} failed in {:.2}s",
            processed_count, failed_count, elapsed
        );
    }

    if failed_count > 0 && processed_count == 0 {
        anyhow::bail!("All {} input(s) failed", failed_count);
    }

    Ok(processed_count)
}

async fn process_one(
    processor: &mut BackgroundRemovalProcessor,
    source: &ImageSource,
    target: Option<&str>,
    store: Option<&LocalObjectStore>,
) -> Result<()> {
    let format_label = processor.config().output_format.to_string();
    let span = spans::file_processing(&source.describe(), &format_label);
    process_and_save(processor, source, target, store)
        .instrument(span)
        .await
}

async fn process_and_save(
    processor: &mut BackgroundRemovalProcessor,
    source: &ImageSource,
    target: Option<&str>,
    store: Option<&LocalObjectStore>,
) -> Result<()> {
    let mut result = processor
        .process_source(source)
        .await
        .context("Failed to remove background")?;

    let config = processor.config();
    match target {
        Some("-") => {
            let data = result.to_bytes(config.output_format, config.output_quality())?;
            write_stdout(&data)?;
        },
        Some(path) => {
            result
                .save_timed(path, config.output_format, config.output_quality())
                .context("Failed to save result")?;
        },
        None => {
            let path = default_output_path(source, config.output_format);
            result
                .save_timed(&path, config.output_format, config.output_quality())
                .context("Failed to save result")?;
        },
    }
    log::debug!("{}", result.timing_summary());

    if let Some(store) = store {
        store_cutout(store, &result).await?;
    }

    Ok(())
}

async fn store_cutout(store: &LocalObjectStore, result: &RemovalResult) -> Result<()> {
    let span = spans::upload(&store.bucket_dir().display().to_string(), 0);
    let url = upload_removal_result(store, result)
        .instrument(span)
        .await
        .context("Failed to upload cutout")?;
    info!("Uploaded cutout: {}", url);
    Ok(())
}

async fn process_stdin(
    output_target: Option<&str>,
    processor: &mut BackgroundRemovalProcessor,
    store: Option<&LocalObjectStore>,
) -> Result<usize> {
    events::progress("Reading image from stdin");
    let image_data = read_stdin()?;

    let result = processor
        .process_bytes(&image_data)
        .context("Failed to remove background from stdin data")?;

    let config = processor.config();
    match output_target {
        Some(target) if target != "-" => {
            result
                .save(target, config.output_format, config.output_quality())
                .context("Failed to save result")?;
            info!("Image saved to: {}", target);
        },
        _ => {
            let data = result.to_bytes(config.output_format, config.output_quality())?;
            write_stdout(&data)?;
        },
    }

    if let Some(store) = store {
        store_cutout(store, &result).await?;
    }

    Ok(1)
}

async fn run_upload(args: &UploadArgs) -> Result<()> {
    let config = CliConfigBuilder::upload_config(args).context("Invalid upload settings")?;
    let store = LocalObjectStore::new(&args.upload_dir, &args.bucket.bucket, &args.bucket.public_url);

    let mut failed = 0;
    for file in &args.files {
        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let span = spans::upload(&args.bucket.bucket, bytes.len());

        match upload_image(&store, &bytes, &config).instrument(span).await {
            Ok(url) => println!("{}\t{}", file.display(), url),
            Err(e) => {
                events::error_with_context(&e, &format!("upload {}", file.display()));
                failed += 1;
            },
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} upload(s) failed", failed, args.files.len());
    }
    Ok(())
}

fn run_checkout(args: &CheckoutArgs) -> Result<()> {
    let raw = if args.order == "-" {
        String::from_utf8(read_stdin()?).context("Order data is not valid UTF-8")?
    } else {
        std::fs::read_to_string(&args.order)
            .with_context(|| format!("Failed to read order file {}", args.order))?
    };
    let entries: Vec<OrderEntry> =
        serde_json::from_str(&raw).context("Order file must be a JSON array of entries")?;

    let mut cart = build_cart(entries);
    let config = CliConfigBuilder::checkout_config(args);
    let _span = spans::checkout(cart.lines().len(), &cart.total()).entered();

    if cart.has_unpriced_lines() {
        events::warning_with_recommendation(
            "Some prices could not be read and count as 0",
            "check the price text of the listed items",
        );
    }

    let link = cart.begin_checkout(&config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&link)?);
    } else {
        println!("{}", link.message);
        println!();
        println!("{}", link.url);
    }
    Ok(())
}

/// Fill a cart from order entries, honoring per-entry quantities
pub fn build_cart(entries: Vec<OrderEntry>) -> Cart {
    let mut cart = Cart::new();
    for entry in entries {
        let extra = i64::from(entry.quantity.unwrap_or(1).max(1)) - 1;
        let id = cart.add_item(entry.into_candidate());
        if extra > 0 {
            let current = cart.get(id).map_or(1, |line| i64::from(line.quantity));
            cart.update_quantity(id, current + extra);
        }
    }
    cart
}

impl OrderEntry {
    fn into_candidate(self) -> crate::cart::CartItemCandidate {
        crate::cart::CartItemCandidate {
            title: self.title,
            price: self.price,
            size: self.size,
            image_url: self.image_url,
            product_id: self.product_id,
        }
    }
}

fn collect_sources(args: &RemoveBgArgs) -> Result<Vec<ImageSource>> {
    let mut sources = Vec::new();
    let mut files = Vec::new();

    for input in &args.input {
        match ImageSource::parse(input) {
            ImageSource::Path(path) if path.is_file() => {
                if is_image_file(&path) {
                    files.push(path);
                } else {
                    warn!("Skipping unsupported file: {}", path.display());
                }
            },
            ImageSource::Path(path) if path.is_dir() => {
                files.extend(find_image_files(&path, args.recursive, args.pattern.as_deref())?);
            },
            ImageSource::Path(path) => {
                anyhow::bail!(
                    "Input path does not exist or is not accessible: {}",
                    path.display()
                );
            },
            other => sources.push(other),
        }
    }

    files.sort();
    files.dedup();
    sources.extend(files.into_iter().map(ImageSource::Path));
    Ok(sources)
}

fn prepare_output_dir(output: Option<&str>, source_count: usize) -> Result<Option<PathBuf>> {
    if source_count <= 1 {
        return Ok(None);
    }
    let Some(output) = output else {
        return Ok(None);
    };
    if output == "-" {
        anyhow::bail!("Cannot use stdout (-) as output when processing multiple inputs");
    }

    let output_path = PathBuf::from(output);
    if output_path.is_file() {
        anyhow::bail!(
            "Output path exists and is a file, not a directory: {}",
            output_path.display()
        );
    }
    std::fs::create_dir_all(&output_path).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;
    Ok(Some(output_path))
}

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif"];

fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && is_image_file(path) && matches_pattern(path, pattern) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    let Some(pat) = pattern else {
        return true;
    };
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| glob::Pattern::new(pat).is_ok_and(|p| p.matches(name)))
}

fn source_stem(source: &ImageSource) -> String {
    match source {
        ImageSource::Path(path) => path
            .file_stem()
            .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().to_string()),
        ImageSource::Url(url) => url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
            .and_then(|name| Path::new(name).file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "remote".to_string()),
        ImageSource::Bytes(_) | ImageSource::Raw { .. } => "image".to_string(),
    }
}

/// `{stem}_bg_removed.{ext}` next to a local input, or in the working
/// directory for remote ones
fn default_output_path(source: &ImageSource, format: crate::OutputFormat) -> PathBuf {
    let dir = match source {
        ImageSource::Path(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        _ => PathBuf::from("."),
    };
    output_path_in_dir(source, &dir, format)
}

fn output_path_in_dir(source: &ImageSource, dir: &Path, format: crate::OutputFormat) -> PathBuf {
    dir.join(format!(
        "{}_bg_removed.{}",
        source_stem(source),
        OutputFormatHandler::get_extension(format)
    ))
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    if buffer.is_empty() {
        anyhow::bail!("No data received from stdin");
    }

    Ok(buffer)
}

fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .context("Failed to write image data to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
