use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SessionHandle;
use crate::models::{BiometricSnapshot, CoherenceVariables, CreativeOutputSignal};
use crate::source::CoherenceSource;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// One raw sample waiting to be evaluated and analysed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SampleInput {
    pub variables: CoherenceVariables,
    #[serde(default)]
    pub biometrics: Option<BiometricSnapshot>,
    #[serde(default)]
    pub output: Option<CreativeOutputSignal>,
}

impl SampleInput {
    pub fn new(variables: CoherenceVariables) -> Self {
        Self {
            variables,
            biometrics: None,
            output: None,
        }
    }

    pub fn with_biometrics(mut self, biometrics: BiometricSnapshot) -> Self {
        self.biometrics = Some(biometrics);
        self
    }

    pub fn with_output(mut self, output: CreativeOutputSignal) -> Self {
        self.output = Some(output);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SamplerReport {
    pub processed: u64,
    pub failed: u64,
}

/// Pull samples until the channel closes or `cancel_token` fires.
///
/// A failing sample is logged and skipped; the session is untouched by it.
pub async fn sampling_loop<S>(
    session: SessionHandle,
    mut source: S,
    mut samples: mpsc::Receiver<SampleInput>,
    cancel_token: CancellationToken,
) -> SamplerReport
where
    S: CoherenceSource + Send + 'static,
{
    let mut report = SamplerReport::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop cancelled");
                break;
            }
            next = samples.recv() => {
                let Some(sample) = next else {
                    log_info!("sample channel closed");
                    break;
                };

                let mut guard = session.lock().await;
                match guard.ingest(&mut source, sample) {
                    Ok(_) => report.processed += 1,
                    Err(err) => {
                        report.failed += 1;
                        log_warn!("session {}: sample skipped: {err:#}", guard.id());
                    }
                }
            }
        }
    }

    report
}

/// Owns the background sampling task for one session.
pub struct SamplerController {
    handle: Option<JoinHandle<SamplerReport>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start<S>(
        &mut self,
        session: SessionHandle,
        source: S,
        samples: mpsc::Receiver<SampleInput>,
    ) -> Result<()>
    where
        S: CoherenceSource + Send + 'static,
    {
        if self.handle.is_some() {
            bail!("sampler already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(
            session,
            source,
            samples,
            cancel_token.clone(),
        ));
        log_info!("sampler started");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Wait for the loop to drain the channel on its own.
    pub async fn finish(&mut self) -> Result<SamplerReport> {
        self.cancel_token = None;
        self.join().await
    }

    pub async fn stop(&mut self) -> Result<SamplerReport> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.join().await
    }

    async fn join(&mut self) -> Result<SamplerReport> {
        let Some(handle) = self.handle.take() else {
            return Ok(SamplerReport::default());
        };
        let report = match handle.await {
            Ok(report) => report,
            Err(err) => {
                log_error!("sampling task ended abnormally: {err}");
                return Err(err).context("sampling task failed to join");
            }
        };
        log_info!(
            "sampler stopped: {} processed, {} failed",
            report.processed,
            report.failed
        );
        Ok(report)
    }
}

impl Default for SamplerController {
    fn default() -> Self {
        Self::new()
    }
}
