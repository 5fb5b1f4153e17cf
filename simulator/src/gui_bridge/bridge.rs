use crate::generator::profile::{build_capture_from_config, GeneratorConfig};
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::Runner;
use anyhow::Context;
use blmcore::capture::{ChannelSettings, Waveform};
use blmcore::processing::{CaptureMailbox, CycleReport};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Flat capture as posted by a waveform source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPayload {
    pub channels: usize,
    pub samples: usize,
    pub data: Vec<f64>,
}

impl IngestPayload {
    pub fn into_capture(self) -> anyhow::Result<Waveform> {
        Waveform::from_flat(self.data, self.channels, self.samples).context("reshaping payload")
    }
}

type SharedModel = Arc<RwLock<VisualizationModel>>;

/// Display sink holding the latest snapshot, plus the HTTP ingest endpoint.
pub struct GuiBridge {
    state: SharedModel,
    runner: Arc<Runner>,
    mailbox: Arc<CaptureMailbox<Waveform>>,
}

fn queued_reply(displaced: bool) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "queued", "displaced": displaced})),
        StatusCode::ACCEPTED,
    )
}

fn rejected_reply(err: &anyhow::Error) -> warp::reply::WithStatus<warp::reply::Json> {
    error!("ingest error: {:#}", err);
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "error", "message": format!("{:#}", err)})),
        StatusCode::BAD_REQUEST,
    )
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>, mailbox: Arc<CaptureMailbox<Waveform>>) -> Self {
        let state = Arc::new(RwLock::new(VisualizationModel::idle(&runner.settings())));
        Self {
            state,
            runner,
            mailbox,
        }
    }

    /// Hosts `/states`, `/metrics`, `/settings`, `/ingest` and `/ingest-config` on a
    /// background thread.
    pub fn serve(&self, address: SocketAddr) {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());
        let mailbox = self.mailbox.clone();
        let mailbox_filter = warp::any().map(move || mailbox.clone());

        let states_route = warp::path("states")
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| {
                warp::reply::json(&*state.read().unwrap_or_else(PoisonError::into_inner))
            });

        let metrics_route = warp::path("metrics")
            .and(warp::get())
            .and(runner_filter.clone())
            .map(|runner: Arc<Runner>| warp::reply::json(&runner.metrics()));

        let ingest_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter.clone())
            .and(mailbox_filter.clone())
            .map(
                |payload: IngestPayload,
                 runner: Arc<Runner>,
                 mailbox: Arc<CaptureMailbox<Waveform>>| {
                    match payload.into_capture() {
                        Ok(capture) => queued_reply(runner.submit(&mailbox, capture)),
                        Err(err) => rejected_reply(&err),
                    }
                },
            );

        let settings_get_route = warp::path("settings")
            .and(warp::get())
            .and(runner_filter.clone())
            .map(|runner: Arc<Runner>| warp::reply::json(&runner.settings()));

        let settings_post_route = warp::path("settings")
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter.clone())
            .map(|settings: Vec<ChannelSettings>, runner: Arc<Runner>| {
                let count = settings.len();
                runner.update_settings(settings);
                warp::reply::json(&json!({"status": "ok", "channels": count}))
            });

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter)
            .and(mailbox_filter)
            .map(
                |config: GeneratorConfig,
                 runner: Arc<Runner>,
                 mailbox: Arc<CaptureMailbox<Waveform>>| {
                    match build_capture_from_config(&config) {
                        Ok(capture) => {
                            if let Some(name) = config.scenario.as_ref() {
                                info!(
                                    "[GUI] scenario {} queued: {}",
                                    name,
                                    config.description.as_deref().unwrap_or("")
                                );
                            }
                            queued_reply(runner.submit(&mailbox, capture))
                        }
                        Err(err) => rejected_reply(&err),
                    }
                },
            );

        thread::spawn(move || {
            let routes = states_route
                .or(metrics_route)
                .or(ingest_route)
                .or(settings_get_route)
                .or(settings_post_route)
                .or(generator_route);
            match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(async move {
                    warp::serve(routes).run(address).await;
                }),
                Err(err) => error!("failed to build HTTP runtime: {}", err),
            }
        });
    }

    /// Replaces the snapshot with the outcome of a finished cycle.
    pub fn publish(&self, report: &CycleReport) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let cycles = guard.cycles + 1;
        *guard = VisualizationModel::from_report(report, cycles);
        info!(
            "[GUI] cycle {}: {} channels, beam {:.1} MeV",
            cycles,
            guard.channels.len(),
            report.beam_energy_mev
        );
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
