//! Example installing a CurseForge modpack export with a custom progress callback
//!
//! Run this example with:
//! ```
//! cargo run --example modpack_install_example -- path/to/pack.zip path/to/instance
//! ```

use cursepack::{DownloadConfigBuilder, DownloadOutcome, ModpackInstallBuilder, ProgressEvent};
use std::time::Duration;

#[tokio::main]
async fn main() -> cursepack::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(modpack), Some(instance)) = (args.next(), args.next()) else {
        eprintln!("usage: modpack_install_example <modpack.zip> <instance dir>");
        return Ok(());
    };

    let config = DownloadConfigBuilder::new()
        .max_attempts(3)
        .retry_delay(Duration::from_secs(1))
        .max_workers(8)
        .build()?;

    let installed = ModpackInstallBuilder::new(&modpack)
        .destination(&instance)
        .config(config)
        .report(true)
        .with_progress(|event| match event {
            ProgressEvent::BatchStarted { total, workers } => {
                println!("🚀 {} files, {} workers", total, workers);
            }
            ProgressEvent::ItemFinished { completed, total, outcome, .. } => match outcome {
                DownloadOutcome::Success { filename, kind, bytes, .. } => {
                    println!("[{}/{}] ✅ {} {} ({} bytes)", completed, total, kind, filename, bytes);
                }
                other => println!("[{}/{}] ❌ {:?}", completed, total, other),
            },
            ProgressEvent::Warning { message } => println!("⚠️  {}", message),
            _ => {}
        })
        .install()
        .await?;

    println!();
    print!("{}", installed.summary);
    let metrics = &installed.batch.metrics;
    println!(
        "{} bytes in {:.1}s, {} retries",
        metrics.total_bytes,
        installed.batch.duration.as_secs_f64(),
        metrics.retries_attempted
    );
    if let Some(page) = installed.report_page {
        println!("📄 {}", page.display());
    }

    Ok(())
}
