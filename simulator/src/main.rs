use anyhow::Context;
use blmcore::capture::{Unit, Waveform};
use blmcore::processing::{CaptureMailbox, CycleReport};
use clap::Parser;
use generator::profile::build_capture;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Beam-loss monitor capture driver")]
struct Args {
    /// Process a single capture and emit a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Raw little-endian f64 capture to process instead of a synthetic one
    #[arg(long)]
    capture: Option<PathBuf>,
    #[arg(long, default_value_t = 40)]
    channels: usize,
    #[arg(long, default_value_t = 2200)]
    points: usize,
    #[arg(long, default_value_t = 800.0)]
    max_energy: f64,
    #[arg(long, default_value = "volts")]
    unit: String,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Stream this many synthetic captures through the worker
    #[arg(long, default_value_t = 0)]
    captures: usize,
    /// Delay between streamed captures in milliseconds
    #[arg(long, default_value_t = 20)]
    period_ms: u64,
    /// Keep the HTTP bridge alive for incoming captures
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn load_capture(path: &Path, config: &WorkflowConfig) -> anyhow::Result<Waveform> {
    let bytes =
        fs::read(path).with_context(|| format!("reading capture {}", path.display()))?;
    Waveform::from_le_bytes(&bytes, config.channels, config.window.points)
        .with_context(|| format!("decoding capture {}", path.display()))
}

fn write_report(report: &CycleReport) -> anyhow::Result<()> {
    let states: Vec<&str> = report.channels.iter().map(|c| c.state.label()).collect();
    let line = format!(
        "beam_energy_mev={:.1} coverage={:?} failures={} states={:?}\n",
        report.beam_energy_mev,
        report.coverage,
        report.failures(),
        states
    );
    let report_path = PathBuf::from("tools/data/offline_cycle.log");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&report_path)
        .with_context(|| format!("opening {}", report_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        let unit: Unit = args.unit.parse().context("parsing --unit")?;
        WorkflowConfig::from_args(args.channels, args.points, args.max_energy, unit)
    };

    let runner = Arc::new(Runner::new(workflow_config.clone()));
    runner.prepare()?;
    let mailbox = Arc::new(CaptureMailbox::new());
    let gui_bridge = Arc::new(GuiBridge::new(runner.clone(), mailbox.clone()));

    if args.offline {
        let capture = match &args.capture {
            Some(path) => load_capture(path, &workflow_config)?,
            None => build_capture(workflow_config.channels, workflow_config.window, args.seed)?,
        };
        let report = runner.execute(&capture)?;

        println!(
            "Offline cycle -> channels {}, bad {}, unavailable {}, beam {:.1} MeV",
            report.channels.len(),
            report.count(blmcore::ChannelState::Bad),
            report.count(blmcore::ChannelState::Unavailable),
            report.beam_energy_mev
        );
        for channel in &report.channels {
            println!(
                "  ch{:02} {:<11} {:>14} {}",
                channel.channel,
                channel.state.label(),
                channel
                    .total
                    .map(|t| format!("{:.4e}", t))
                    .unwrap_or_else(|| "-".into()),
                channel.unit
            );
        }

        gui_bridge.publish(&report);
        gui_bridge.publish_status("Offline cycle results ready.");
        write_report(&report)?;
    }

    if args.captures == 0 && !args.serve {
        return Ok(());
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating worker runtime")?;
    runtime.block_on(async {
        let worker = {
            let runner = runner.clone();
            let mailbox = mailbox.clone();
            let gui_bridge = gui_bridge.clone();
            tokio::spawn(async move {
                runner
                    .run(mailbox, |report| gui_bridge.publish(report))
                    .await
            })
        };

        for index in 0..args.captures {
            let seed = args.seed.wrapping_add(index as u64);
            let capture = build_capture(workflow_config.channels, workflow_config.window, seed)?;
            runner.submit(&mailbox, capture);
            tokio::time::sleep(Duration::from_millis(args.period_ms)).await;
        }

        if args.serve {
            gui_bridge.serve(gui_bind_address());
            gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        }

        mailbox.close();
        worker.await.context("joining worker")?;
        let metrics = runner.metrics();
        println!(
            "Processed {} captures, dropped {}, channel errors {}",
            metrics.processed, metrics.dropped, metrics.channel_errors
        );
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
