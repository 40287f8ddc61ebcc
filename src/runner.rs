use tracing::info;

use artvault::config::Config;
use artvault::humanize::HumanDuration;
use artvault::remote::ServiceClient;
use artvault::run::{ArchiveSession, DateRange, RunOptions};
use artvault::storage::ArchiveStore;

use crate::cli::RunArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(args: RunArgs) -> Result<(), AnyError> {
    let mut config = Config::load()?;
    if let Some(output) = args.output {
        config.archive.output_dir = output;
    }

    let options = RunOptions {
        range: DateRange::new(args.from, args.to)?,
        mode: args.mode,
        capacity: args.batch_size,
        metadata_only: args.metadata_only,
    };

    if config.api.cookie.is_none() {
        info!("No session cookie configured, requests go out unauthenticated");
    }

    let client = ServiceClient::new(&config.api)?;
    let store = ArchiveStore::local(&config.archive.output_dir)?;

    let (progress, mut events) =
        tokio::sync::mpsc::unbounded_channel::<artvault::progress::ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", event.message());
        }
    });

    let session = ArchiveSession::new(
        client,
        store,
        config.api.request_delay.as_duration(),
        config.archive.filename_prefix.clone(),
        progress,
    );

    let summary = session.run(&options).await;

    // The printer drains once every sender is gone.
    drop(session);
    printer.await?;

    let summary = summary?;
    let metrics = summary.metrics;
    println!(
        "Done in {}: {} days, {} archives, {} jobs archived, {} images",
        HumanDuration::from(summary.elapsed),
        metrics.days_processed,
        metrics.archives_sealed,
        metrics.jobs_archived,
        metrics.images_archived,
    );
    if metrics.jobs_dropped > 0 {
        println!("{} jobs failed twice and were dropped", metrics.jobs_dropped);
    }

    Ok(())
}
