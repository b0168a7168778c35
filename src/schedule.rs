use std::time::Duration;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use reqwest::Client;
use tokio::{select, signal::ctrl_c, spawn, sync::mpsc::Sender, time::sleep};

use crate::probe::{probe, Outcome, ProbeResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Gap between one completion and the next submission when running
/// sequentially, so a single-connection run stays gentle on the target.
pub const PACING: Duration = Duration::from_secs(1);
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug)]
pub struct Scheduler {
    client: Client,
    concurrency: usize,
}

impl Scheduler {
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            concurrency: 1,
        }
    }

    pub fn default_client() -> reqwest::Result<Client> {
        Scheduler::client_with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
        Client::builder().user_agent(USER_AGENT).timeout(timeout).build()
    }

    pub fn concurrency(self, concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            ..self
        }
    }

    /// Probes every URL exactly once, sending each result on `results` as it
    /// completes. Ctrl-C stops further submissions; results already produced
    /// still reach the receiver, so partial reports remain possible.
    pub async fn run(self, urls: Vec<String>, results: Sender<ProbeResult>) -> Result<()> {
        if self.concurrency == 1 {
            self.run_paced(urls, results).await
        } else {
            self.run_pooled(urls, results).await
        }
    }

    /// Sequential run; completion order equals input order.
    async fn run_paced(self, urls: Vec<String>, results: Sender<ProbeResult>) -> Result<()> {
        let total = urls.len();
        let interrupt = ctrl_c();
        tokio::pin!(interrupt);
        for (index, url) in urls.into_iter().enumerate() {
            let result = probe(&self.client, url).await;
            progress(index + 1, total, &result);
            if results.send(result).await.is_err() {
                break; // receiver gone
            }
            if index + 1 == total {
                break;
            }
            select! {
                _ = sleep(PACING) => {}
                _ = &mut interrupt => {
                    println!("\nInterrupted; {} of {total} pages probed.", index + 1);
                    break;
                }
            }
        }
        Ok(())
    }

    /// At most `concurrency` probes in flight; arrival order is
    /// completion order, not input order.
    async fn run_pooled(self, urls: Vec<String>, results: Sender<ProbeResult>) -> Result<()> {
        let Self {
            client,
            concurrency,
        } = self;
        let total = urls.len();
        let mut probes = stream::iter(urls.into_iter().map(|url| {
            let client = client.clone();
            async move { spawn(async move { probe(&client, url).await }).await }
        }))
        .buffer_unordered(concurrency);
        let interrupt = ctrl_c();
        tokio::pin!(interrupt);
        let mut completed = 0;
        loop {
            select! {
                next = probes.next() => match next {
                    Some(joined) => {
                        let result = joined.context("probe worker failed")?;
                        completed += 1;
                        progress(completed, total, &result);
                        if results.send(result).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = &mut interrupt => {
                    println!("\nInterrupted; {completed} of {total} pages probed.");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// One live console line per completion.
fn progress(completed: usize, total: usize, result: &ProbeResult) {
    match &result.outcome {
        Outcome::Success { latency_ms, .. } => {
            println!("{completed:2}/{total} ✓ {} - {latency_ms:.0}ms", result.url)
        }
        Outcome::Failure { detail, .. } => {
            println!("{completed:2}/{total} ✗ {} - {detail}", result.url)
        }
    }
}
