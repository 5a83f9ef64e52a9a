//! Translation of command-line arguments into library configuration

use super::main_impl::{CheckoutArgs, CliOutputFormat, RemoveBgArgs, UploadArgs};
use crate::cart::CheckoutConfig;
use crate::config::{OutputFormat, RemovalConfig, UploadConfig};
use anyhow::{Context, Result};

/// Builds library configs from parsed CLI arguments
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Removal settings: config file (or defaults), then flag overrides
    pub(crate) fn removal_config(args: &RemoveBgArgs) -> Result<RemovalConfig> {
        let mut config = match &args.config {
            Some(path) => RemovalConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => RemovalConfig::default(),
        };

        if let Some(threshold) = args.threshold {
            config.threshold = threshold;
        }
        if let Some(feather) = args.feather {
            config.feather = feather;
        }
        if let Some(sample_size) = args.sample_size {
            config.sample_size = sample_size;
        }
        if let Some(format) = args.format {
            config.output_format = Self::output_format(format);
        }
        if let Some(quality) = args.jpeg_quality {
            config.jpeg_quality = quality;
        }
        if let Some(quality) = args.webp_quality {
            config.webp_quality = quality;
        }

        config.validate()?;
        Ok(config)
    }

    pub(crate) fn upload_config(args: &UploadArgs) -> Result<UploadConfig> {
        if !args.max_upload_mb.is_finite() || args.max_upload_mb <= 0.0 {
            anyhow::bail!(
                "--max-upload-mb must be a positive number, got {}",
                args.max_upload_mb
            );
        }

        let config = UploadConfig {
            format: Self::output_format(args.format),
            quality: args.quality,
            ..UploadConfig::with_max_megabytes(args.max_upload_mb)
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn checkout_config(args: &CheckoutArgs) -> CheckoutConfig {
        let mut config = CheckoutConfig::default();
        if let Some(link) = &args.deep_link {
            config = config.with_deep_link(link.as_str());
        }
        if let Some(currency) = &args.currency {
            config = config.with_currency_label(currency.as_str());
        }
        config.with_sizes(!args.no_sizes)
    }

    pub(crate) fn output_format(format: CliOutputFormat) -> OutputFormat {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => OutputFormat::WebP,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
            CliOutputFormat::Rgba8 => OutputFormat::Rgba8,
        }
    }
}
