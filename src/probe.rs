use std::time::Instant;

use reqwest::Client;

/// One outcome per page URL submitted to the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub outcome: Outcome,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Success { latency_ms, .. } => Some(latency_ms),
            Outcome::Failure { .. } => None,
        }
    }
}

/// Any status the server managed to return counts as `Success`;
/// whether it was a 500 is a reporting concern, not a probe error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { status_code: u16, latency_ms: f64 },
    Failure { reason: FailureReason, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    NetworkError,
    Other,
}

/// Times one GET against `url`. Never fails; every transport error
/// becomes a `Failure` outcome.
pub async fn probe(client: &Client, url: String) -> ProbeResult {
    let start = Instant::now();
    let outcome = match request(client, &url).await {
        Ok(status_code) => Outcome::Success {
            status_code,
            latency_ms: start.elapsed().as_secs_f64() * 1_000.0,
        },
        Err(err) => classify(&err),
    };
    ProbeResult { url, outcome }
}

async fn request(client: &Client, url: &str) -> reqwest::Result<u16> {
    let response = client.get(url).send().await?;
    let status_code = response.status().as_u16();
    // Drain the body so the measurement covers the whole transfer.
    response.bytes().await?;
    Ok(status_code)
}

fn classify(err: &reqwest::Error) -> Outcome {
    let (reason, detail) = if err.is_timeout() {
        (FailureReason::Timeout, "request timed out".to_owned())
    } else if err.is_connect() {
        (FailureReason::NetworkError, err.to_string())
    } else {
        (FailureReason::Other, err.to_string())
    };
    Outcome::Failure { reason, detail }
}
