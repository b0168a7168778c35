use std::{path::Path, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use log::{debug, error};
use sitemap_latency_tester::{
    report::{self, TestRun},
    schedule::Scheduler,
    sitemap,
};
use tokio::{spawn, sync::mpsc::channel};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.concurrency > 0, "concurrency must be at least 1");
    ensure!(args.timeout > 0, "timeout must be at least 1 second");
    let timeout = Duration::from_secs(args.timeout);
    let client = Scheduler::client_with_timeout(timeout)?;

    println!("Fetching sitemap: {}", args.sitemap_url);
    let urls = sitemap::fetch(&client, &args.sitemap_url).await?;
    if urls.is_empty() {
        println!("No URLs found in the sitemap.");
        return Ok(());
    }
    println!(
        "Testing {} pages (concurrency: {}).",
        urls.len(),
        args.concurrency
    );

    let mut run = TestRun::new(args.sitemap_url, args.concurrency, timeout);
    let scheduler = Scheduler::from_client(client).concurrency(args.concurrency);
    debug!("Starting with {scheduler:#?}.");
    let (results_tx, mut results_rx) = channel(16);
    let worker = spawn(scheduler.run(urls, results_tx));
    while let Some(result) = results_rx.recv().await {
        run.push(result);
    }
    match worker.await {
        Ok(Ok(())) => {}
        // Still report whatever completed before the failure.
        Ok(Err(err)) => error!("Scheduling failed: {err}"),
        Err(err) => error!("Probe dispatch aborted: {err}"),
    }
    let run = run.finish();
    if let Some(elapsed) = run.elapsed() {
        println!("\nTest finished in {:.1}s.", elapsed.as_secs_f64());
    }
    report::report(&run, Path::new("."))?;
    Ok(())
}

#[derive(Debug, Parser)]
#[clap(
    author,
    version,
    about = "Measures per-page latency and availability for every URL\n\
    listed in an XML sitemap, then writes a summary report."
)]
struct Args {
    #[clap(help = "The URL of the sitemap to test.")]
    sitemap_url: String,
    #[clap(
        short,
        long,
        default_value_t = 1,
        help = "Number of concurrent probes. With 1, probes run sequentially \
                with a 1-second gap between requests."
    )]
    concurrency: usize,
    #[clap(
        short,
        long,
        default_value_t = 15,
        help = "Request timeout in whole seconds."
    )]
    timeout: u64,
}
