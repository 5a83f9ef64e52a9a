//! Designs4U storefront CLI
//!
//! Background removal for product photos, catalog uploads and checkout
//! links from order files.

#[cfg(feature = "cli")]
use designs4u::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
