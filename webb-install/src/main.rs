use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use webb_install::cli::Args;
use webb_install::installer::Installer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if args.verbose {
        "webb_install=debug"
    } else {
        "webb_install=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    if args.verbose {
        tracing::info!("Running webb-install with verbose output");
    }

    let installer = Installer::new(args)?;
    let (report, advice) = installer.run().await?;

    println!(
        "webb ({}) installed to {}",
        report.platform.target,
        report.binary_path.display()
    );
    println!();
    println!("{advice}");

    Ok(())
}
