use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::probe::{Outcome, ProbeResult};

pub const FAST_BELOW_MS: f64 = 500.0;
pub const SLOW_FROM_MS: f64 = 2_000.0;

/// One full measurement session, from sitemap fetch to the last result.
///
/// A single owner appends results in arrival order; once `finish`ed it is
/// only read.
#[derive(Debug)]
pub struct TestRun {
    pub sitemap_url: String,
    pub concurrency: usize,
    pub timeout: Duration,
    pub results: Vec<ProbeResult>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl TestRun {
    pub fn new(sitemap_url: String, concurrency: usize, timeout: Duration) -> Self {
        Self {
            sitemap_url,
            concurrency,
            timeout,
            results: Vec::new(),
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub fn push(&mut self, result: ProbeResult) {
        self.results.push(result);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Local::now());
        self
    }

    /// Latencies of the successful probes, in arrival order.
    pub fn latencies(&self) -> Vec<f64> {
        self.results.iter().filter_map(ProbeResult::latency_ms).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|result| !result.is_success())
    }

    pub fn elapsed(&self) -> Option<Duration> {
        (self.finished_at? - self.started_at).to_std().ok()
    }
}

#[derive(Debug, PartialEq)]
pub struct LatencyStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// `None` when there are no successful probes to measure.
pub fn latency_stats(latencies: &[f64]) -> Option<LatencyStats> {
    if latencies.is_empty() {
        return None;
    }
    let mut sorted = latencies.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let middle = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    };
    Some(LatencyStats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        median,
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Distribution {
    pub fast: usize,
    pub medium: usize,
    pub slow: usize,
}

pub fn distribution(latencies: &[f64]) -> Distribution {
    let mut buckets = Distribution::default();
    for &latency in latencies {
        if latency < FAST_BELOW_MS {
            buckets.fast += 1;
        } else if latency < SLOW_FROM_MS {
            buckets.medium += 1;
        } else {
            buckets.slow += 1;
        }
    }
    buckets
}

/// Renders the console summary block.
pub fn summary(run: &TestRun) -> String {
    let latencies = run.latencies();
    let failures: Vec<_> = run.failures().collect();
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "Test summary");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "Total pages: {}", run.results.len());
    let _ = writeln!(out, "Successful: {}", latencies.len());
    let _ = writeln!(out, "Failed: {}", failures.len());
    if let Some(stats) = latency_stats(&latencies) {
        let _ = writeln!(out, "\nLatency (ms):");
        let _ = writeln!(out, "  min: {:.0}", stats.min);
        let _ = writeln!(out, "  max: {:.0}", stats.max);
        let _ = writeln!(out, "  mean: {:.0}", stats.mean);
        let _ = writeln!(out, "  median: {:.0}", stats.median);
        let buckets = distribution(&latencies);
        let percent = |count: usize| count as f64 / latencies.len() as f64 * 100.0;
        let _ = writeln!(out, "\nLatency distribution:");
        let _ = writeln!(
            out,
            "  < 500ms: {} pages ({:.1}%)",
            buckets.fast,
            percent(buckets.fast)
        );
        let _ = writeln!(
            out,
            "  500ms-2s: {} pages ({:.1}%)",
            buckets.medium,
            percent(buckets.medium)
        );
        let _ = writeln!(
            out,
            "  >= 2s: {} pages ({:.1}%)",
            buckets.slow,
            percent(buckets.slow)
        );
    }
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailed pages:");
        for failure in failures {
            if let Outcome::Failure { detail, .. } = &failure.outcome {
                let _ = writeln!(out, "  {} - {detail}", failure.url);
            }
        }
    }
    out
}

/// Renders the report file body: a header followed by one line per result.
pub fn render_report(run: &TestRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sitemap latency test report");
    let _ = writeln!(
        out,
        "Test time: {}",
        run.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Sitemap: {}", run.sitemap_url);
    let _ = writeln!(out, "Pages tested: {}\n", run.results.len());
    for result in &run.results {
        match &result.outcome {
            Outcome::Success { latency_ms, .. } => {
                let _ = writeln!(out, "✓ {} - {latency_ms:.0}ms", result.url);
            }
            Outcome::Failure { detail, .. } => {
                let _ = writeln!(out, "✗ {} - {detail}", result.url);
            }
        }
    }
    out
}

pub fn write_report(run: &TestRun, dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("sitemap_test_results_{timestamp}.txt"));
    fs::write(&path, render_report(run))?;
    Ok(path)
}

/// Prints the summary and persists the report file.
/// An empty run reports nothing and writes no file.
pub fn report(run: &TestRun, dir: &Path) -> Result<Option<PathBuf>> {
    if run.results.is_empty() {
        println!("No results to report.");
        return Ok(None);
    }
    print!("{}", summary(run));
    let path = write_report(run, dir)?;
    println!("\nDetailed results saved to {}", path.display());
    Ok(Some(path))
}
