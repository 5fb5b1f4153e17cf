use std::sync::{Arc, PoisonError, RwLock};

use crate::capture::{ChannelSettings, ChannelState, Unit, Waveform};
use crate::prelude::{PipelineError, PipelineResult, WaveformFilter};
use crate::processing::calibration::{CalibrationCurve, CalibrationTable};
use crate::processing::classify::Classifier;
use crate::processing::energy::EnergyRamp;
use crate::processing::filter::PassThrough;
use crate::processing::integrator::Integrator;
use crate::processing::segment::{IndexRange, IntervalSpec, Segmenter, TimeWindow};
use crate::processing::units::{PhysicalTrace, UnitConverter};
use crate::telemetry::log::LogManager;

/// Outcome of one channel in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    pub channel: usize,
    pub unit: Unit,
    pub state: ChannelState,
    pub total: Option<f64>,
    pub trace: Option<PhysicalTrace>,
    pub error: Option<PipelineError>,
    /// Display flags as they were when the cycle read its settings.
    pub shown: bool,
    pub selected: bool,
}

impl ChannelReport {
    fn unavailable(channel: usize, settings: &ChannelSettings, error: PipelineError) -> Self {
        Self {
            channel,
            unit: settings.unit,
            shown: settings.shown,
            selected: settings.selected,
            state: ChannelState::Unavailable,
            total: None,
            trace: None,
            error: Some(error),
        }
    }
}

/// Everything one cycle hands to the display sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub channels: Vec<ChannelReport>,
    pub ranges: Vec<IndexRange>,
    pub coverage: Option<f64>,
    pub beam_energy_mev: f64,
}

impl CycleReport {
    /// Report for a cycle that could not run: every channel unavailable with `error`.
    pub fn unavailable(
        settings: &[ChannelSettings],
        window: &TimeWindow,
        max_energy: f64,
        error: PipelineError,
    ) -> Self {
        Self {
            channels: settings
                .iter()
                .enumerate()
                .map(|(channel, each)| ChannelReport::unavailable(channel, each, error.clone()))
                .collect(),
            ranges: Vec::new(),
            coverage: None,
            beam_energy_mev: EnergyRamp::new(max_energy).kinetic_energy_mev(window.end),
        }
    }

    pub fn states(&self) -> Vec<ChannelState> {
        self.channels.iter().map(|c| c.state).collect()
    }

    pub fn totals(&self) -> Vec<Option<f64>> {
        self.channels.iter().map(|c| c.total).collect()
    }

    pub fn failures(&self) -> usize {
        self.channels.iter().filter(|c| c.error.is_some()).count()
    }

    pub fn count(&self, state: ChannelState) -> usize {
        self.channels.iter().filter(|c| c.state == state).count()
    }
}

struct CachedCurve {
    window: TimeWindow,
    max_energy: f64,
    curve: Arc<CalibrationCurve>,
}

/// Runs segmentation, filtering, integration, conversion and classification per capture.
///
/// The calibration curve is cached per `(window, max_energy)` and replaced, never
/// mutated, when either changes.
pub struct Pipeline {
    table: CalibrationTable,
    filter: Box<dyn WaveformFilter>,
    keep_traces: bool,
    cache: RwLock<Option<CachedCurve>>,
    logger: LogManager,
}

impl Pipeline {
    pub fn new(filter: Box<dyn WaveformFilter>) -> Self {
        Self {
            table: CalibrationTable::standard().clone(),
            filter,
            keep_traces: true,
            cache: RwLock::new(None),
            logger: LogManager::new(),
        }
    }

    pub fn with_table(mut self, table: CalibrationTable) -> Self {
        self.table = table;
        self.cache = RwLock::new(None);
        self
    }

    /// Drop per-sample traces from reports, keeping only totals and states.
    pub fn with_traces(mut self, keep_traces: bool) -> Self {
        self.keep_traces = keep_traces;
        self
    }

    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }

    /// Shared curve for `window` at `max_energy`, built on first use or change.
    pub fn calibration_curve(
        &self,
        window: &TimeWindow,
        max_energy: f64,
    ) -> PipelineResult<Arc<CalibrationCurve>> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.as_ref() {
                if cached.window == *window && cached.max_energy == max_energy {
                    return Ok(cached.curve.clone());
                }
            }
        }

        let curve = Arc::new(CalibrationCurve::build(window, &self.table, max_energy)?);
        self.logger.trace_detail(&format!(
            "calibration curve rebuilt for [{}, {}] x {} at {} MeV",
            window.start, window.end, window.points, max_energy
        ));
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        *cache = Some(CachedCurve {
            window: *window,
            max_energy,
            curve: curve.clone(),
        });
        Ok(curve)
    }

    /// Processes one capture.
    ///
    /// Reports one entry per `settings` element. Window, interval and calibration
    /// failures abort the cycle; failures of a single channel mark it unavailable.
    pub fn process(
        &self,
        waveform: &Waveform,
        window: &TimeWindow,
        interval: Option<&IntervalSpec>,
        settings: &[ChannelSettings],
        max_energy: f64,
    ) -> PipelineResult<CycleReport> {
        window.validate()?;
        let curve = self.calibration_curve(window, max_energy)?;

        let ranges = match interval {
            Some(spec) => Segmenter::compute_ranges(window, spec)?,
            None => vec![IndexRange::new(0, waveform.samples() as i64)],
        };
        let filtered = self.filter.apply(waveform.clone());
        let segments = Segmenter::slice(&filtered, &ranges);

        let axis = Self::edged_axis(window);
        let shape = Self::check_shape(waveform, window);
        let channels = settings
            .iter()
            .enumerate()
            .map(|(channel, each)| {
                shape
                    .clone()
                    .and_then(|()| {
                        self.process_channel(channel, each, &segments, &ranges, &axis, &curve)
                    })
                    .unwrap_or_else(|err| {
                        self.logger
                            .warn(&format!("channel {} unavailable: {}", channel, err));
                        ChannelReport::unavailable(channel, each, err)
                    })
            })
            .collect();

        let processed_until = interval
            .and_then(|spec| spec.boundaries().last().copied())
            .unwrap_or(window.end);
        let report = CycleReport {
            channels,
            coverage: Segmenter::proportion_of_window(window, &ranges),
            ranges,
            beam_energy_mev: EnergyRamp::new(max_energy).kinetic_energy_mev(processed_until),
        };

        self.logger.record(&format!(
            "cycle: {} channels, good {} / moderate {} / bad {} / unavailable {}",
            report.channels.len(),
            report.count(ChannelState::Good),
            report.count(ChannelState::Moderate),
            report.count(ChannelState::Bad),
            report.count(ChannelState::Unavailable)
        ));
        Ok(report)
    }

    /// Window grid preceded by its leading integration edge, `points + 1` long.
    fn edged_axis(window: &TimeWindow) -> Vec<f64> {
        let grid = window.axis();
        let step = window.span() / (window.points - 1) as f64;
        std::iter::once(window.start - step).chain(grid).collect()
    }

    fn check_shape(waveform: &Waveform, window: &TimeWindow) -> PipelineResult<()> {
        if waveform.samples() != window.points {
            return Err(PipelineError::ShapeMismatch(format!(
                "capture of {} samples on a {}-point window",
                waveform.samples(),
                window.points
            )));
        }
        Ok(())
    }

    fn process_channel(
        &self,
        channel: usize,
        settings: &ChannelSettings,
        segments: &[Waveform],
        ranges: &[IndexRange],
        axis: &[f64],
        curve: &CalibrationCurve,
    ) -> PipelineResult<ChannelReport> {
        let mut values = Vec::new();
        for (segment, range) in segments.iter().zip(ranges) {
            let row = segment.channel(channel).ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "capture holds {} channels, no channel {}",
                    segment.channels(),
                    channel
                ))
            })?;
            let grid = range.clip(curve.len());
            let integrated =
                Integrator::integrate(&row.to_vec(), &axis[grid.start..grid.end + 1])?;
            let coefficients = settings
                .unit
                .requires_calibration()
                .then(|| &curve.values()[grid]);
            let converted = UnitConverter::convert_with(&integrated, settings.unit, coefficients)?;
            values.extend(converted.values);
        }

        let trace = PhysicalTrace {
            unit: settings.unit,
            values,
        };
        let total = trace.total();
        Ok(ChannelReport {
            channel,
            unit: settings.unit,
            shown: settings.shown,
            selected: settings.selected,
            state: Classifier::classify_scalar(total, settings.active_thresholds()),
            total: Some(total),
            trace: self.keep_traces.then_some(trace),
            error: None,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Box::new(PassThrough))
    }
}
