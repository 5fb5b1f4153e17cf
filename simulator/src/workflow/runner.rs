use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use blmcore::capture::{ChannelSettings, Waveform};
use blmcore::prelude::PipelineError;
use blmcore::processing::{CaptureMailbox, CycleReport, Pipeline};
use blmcore::telemetry::{LogManager, Metrics, MetricsRecorder};
use std::sync::{Arc, PoisonError, RwLock};

/// Drives one capture at a time through the core pipeline.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    pipeline: Arc<Pipeline>,
    settings: Arc<RwLock<Vec<ChannelSettings>>>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        let pipeline = Pipeline::new(config.filter.build(&config.window));
        let settings = config.channel_settings();
        Self {
            config,
            pipeline: Arc::new(pipeline),
            settings: Arc::new(RwLock::new(settings)),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn settings(&self) -> Vec<ChannelSettings> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the settings read by subsequent cycles.
    pub fn update_settings(&self, settings: Vec<ChannelSettings>) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    /// Builds the calibration curve up front so configuration faults surface at startup.
    pub fn prepare(&self) -> anyhow::Result<()> {
        self.pipeline
            .calibration_curve(&self.config.window, self.config.max_energy)
            .context("building calibration curve")?;
        LogManager::new().record(&format!(
            "pipeline ready: filter {}, {} display channels, {} MeV",
            self.pipeline.filter_name(),
            self.settings().len(),
            self.config.max_energy
        ));
        Ok(())
    }

    pub fn execute(&self, capture: &Waveform) -> anyhow::Result<CycleReport> {
        self.execute_with(capture, &self.settings())
    }

    /// Runs one cycle; a cycle that fails as a whole comes back with every channel
    /// unavailable so the display never keeps states from an older capture.
    pub fn execute_or_unavailable(&self, capture: &Waveform) -> CycleReport {
        let settings = self.settings();
        self.execute_with(capture, &settings).unwrap_or_else(|err| {
            LogManager::new().warn(&format!("cycle failed: {:#}", err));
            let cause = err
                .downcast_ref::<PipelineError>()
                .cloned()
                .unwrap_or_else(|| PipelineError::Configuration(format!("{:#}", err)));
            CycleReport::unavailable(
                &settings,
                &self.config.window,
                self.config.max_energy,
                cause,
            )
        })
    }

    fn execute_with(
        &self,
        capture: &Waveform,
        settings: &[ChannelSettings],
    ) -> anyhow::Result<CycleReport> {
        let report = self
            .config
            .interval_spec(settings)
            .and_then(|interval| {
                self.pipeline
                    .process(
                        capture,
                        &self.config.window,
                        interval.as_ref(),
                        settings,
                        self.config.max_energy,
                    )
                    .context("processing capture")
            })
            .map_err(|err| {
                self.metrics.record_cycle_error();
                err
            })?;
        self.metrics.record_processed();
        self.metrics.record_channel_errors(report.failures());
        Ok(report)
    }

    /// Hands a capture to the worker, displacing any capture still waiting.
    pub fn submit(&self, mailbox: &CaptureMailbox<Waveform>, capture: Waveform) -> bool {
        let displaced = mailbox.post(capture);
        if displaced {
            self.metrics.record_dropped();
        }
        displaced
    }

    /// Worker loop: processes captures until the mailbox closes.
    pub async fn run<F>(&self, mailbox: Arc<CaptureMailbox<Waveform>>, mut publish: F)
    where
        F: FnMut(&CycleReport),
    {
        while let Some(capture) = mailbox.recv().await {
            publish(&self.execute_or_unavailable(&capture));
        }
        LogManager::new().record("capture mailbox closed, worker stopping");
    }
}
