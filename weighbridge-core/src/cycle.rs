//! Main Acquisition Cycle
//!
//! ## Overview
//!
//! One cycle, fixed cadence, no surprises:
//!
//! ```text
//! ┌─────────────────────────── one cycle ───────────────────────────┐
//! │ link refresh ─▶ reconnect if down ─▶ acquire ─▶ commit ─▶ render │
//! │      (bounded, cycle boundary only)      │                  │    │
//! │                                          │ not ready        ▼    │
//! │                                          └──▶ skip     dispatch  │
//! │                                                              │   │
//! │                              sleep(interval) ◀───────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering guarantees
//!
//! Within a cycle, commit happens before render happens before dispatch, so
//! no observer ever sees a reading "skip ahead" of its own display, and a
//! slow or failing collector can never withhold the locally visible value.
//!
//! A `SensorNotReady` acquisition skips commit, render and dispatch for that
//! cycle but still sleeps the full interval - the cadence is fixed whether
//! or not a reading was produced. There is no mid-cycle cancellation.
//!
//! ## Startup contract
//!
//! The first cycle that finds the sensor ready performs the tare before its
//! first acquisition, satisfying the (re)start contract without a separate
//! bring-up phase. [`startup`](MainCycle::startup) is cosmetic: it records
//! the wake cause and draws the placeholder frame, nothing more.

use crate::calib::Calibrator;
use crate::dispatch::{DispatchOutcome, ReportDispatcher, ReportTransport};
use crate::display::{DisplayFrame, DisplaySink};
use crate::errors::{ScaleError, ScaleResult};
use crate::estimate::{WeightEstimator, DEFAULT_SAMPLE_COUNT};
use crate::link::{ConnectivityManager, LinkDriver, LinkStatus, RetryPolicy};
use crate::reading::{ReadingCell, WeightReading};
use crate::sample::SampleSource;
use crate::time::Clock;
use crate::{log_debug, log_info};

/// Explicit cycle configuration; no embedded magic numbers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleConfig {
    /// Inter-cycle sleep (step 7)
    pub interval_ms: u64,
    /// Samples averaged per acquisition
    pub sample_count: u32,
    /// Connection-round budget
    pub retry: RetryPolicy,
}

impl CycleConfig {
    /// Battery profile: slower cadence, half the connection budget
    pub fn low_power() -> Self {
        Self {
            interval_ms: 5_000,
            sample_count: DEFAULT_SAMPLE_COUNT,
            retry: RetryPolicy { max_attempts: 10, attempt_delay_ms: 500 },
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        // Mains profile: ~1 s steady-state cadence
        Self {
            interval_ms: 1_000,
            sample_count: DEFAULT_SAMPLE_COUNT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Why the process started; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WakeCause {
    /// Cold boot or reset
    #[default]
    PowerOn,
    /// External wake signal (e.g. a wake pin)
    ExternalSignal,
    /// Scheduled timer wake
    Timer,
}

/// Everything observable about one completed cycle
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    /// 1-based loop iteration, counting skipped cycles too
    pub iteration: u32,
    /// Link status the cycle ran under (after boundary re-evaluation)
    pub link: LinkStatus,
    /// The committed reading, or why steps 4-6 were skipped
    pub acquired: ScaleResult<WeightReading>,
    /// Dispatch result; `None` when the cycle was skipped
    pub dispatch: Option<DispatchOutcome>,
}

impl CycleReport {
    /// Reading committed this cycle, if any
    pub fn committed(&self) -> Option<&WeightReading> {
        self.acquired.as_ref().ok()
    }
}

/// Owns every component and runs the acquire-commit-render-dispatch loop
///
/// All state is explicit and passed in at construction: the sample source,
/// link driver, display, transport, committed-reading cell and clock are
/// capability implementations chosen by the deployment, so one orchestrator
/// serves every hardware profile.
pub struct MainCycle<S, L, D, T, Q, C>
where
    S: SampleSource,
    L: LinkDriver,
    D: DisplaySink,
    T: ReportTransport,
    Q: ReadingCell,
    C: Clock,
{
    config: CycleConfig,
    calibrator: Calibrator,
    estimator: WeightEstimator,
    source: S,
    connectivity: ConnectivityManager<L>,
    display: D,
    dispatcher: ReportDispatcher<T>,
    cell: Q,
    clock: C,
    wake: WakeCause,
    tared: bool,
    iterations: u32,
}

impl<S, L, D, T, Q, C> MainCycle<S, L, D, T, Q, C>
where
    S: SampleSource,
    L: LinkDriver,
    D: DisplaySink,
    T: ReportTransport,
    Q: ReadingCell,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: CycleConfig,
        calibrator: Calibrator,
        source: S,
        link: L,
        display: D,
        transport: T,
        cell: Q,
        clock: C,
    ) -> Self {
        let connectivity = ConnectivityManager::new(link, config.retry);
        Self {
            config,
            calibrator,
            estimator: WeightEstimator::new(),
            source,
            connectivity,
            display,
            dispatcher: ReportDispatcher::new(transport),
            cell,
            clock,
            wake: WakeCause::PowerOn,
            tared: false,
            iterations: 0,
        }
    }

    /// Record the wake cause and draw the placeholder frame
    ///
    /// Optional: the first cycle performs the real bring-up (connection
    /// round, startup tare) lazily either way.
    pub fn startup(&mut self, wake: WakeCause) {
        self.wake = wake;
        log_info!("startup: wake cause {:?}", wake);
        self.display.render(&DisplayFrame::new(None, false));
    }

    /// Run one full cycle, including the inter-cycle sleep
    pub fn run_cycle(&mut self) -> CycleReport {
        self.iterations += 1;

        // Link is re-evaluated exactly once per cycle, at the boundary.
        self.connectivity.refresh();
        if self.connectivity.status() != LinkStatus::Connected {
            self.connectivity.reconnect(&mut self.clock);
        }
        let link = self.connectivity.status();
        self.cell.set_exposed(link.is_up());

        let acquired = self.acquire_once();
        let dispatch = match acquired {
            Ok(reading) => {
                self.cell.commit(reading);
                self.display.render(&DisplayFrame::new(Some(reading.value), link.is_up()));
                Some(self.dispatcher.dispatch(&reading, link))
            }
            Err(err) => {
                log_debug!("cycle {}: skipped ({})", self.iterations, err);
                None
            }
        };

        self.clock.sleep_ms(self.config.interval_ms);

        CycleReport { iteration: self.iterations, link, acquired, dispatch }
    }

    fn acquire_once(&mut self) -> ScaleResult<WeightReading> {
        if !self.tared {
            let baseline = self.calibrator.tare(&mut self.source, self.config.sample_count)?;
            self.tared = true;
            log_info!("startup tare: baseline {} counts", baseline);
        }
        let now = self.clock.now_ms();
        self.estimator
            .acquire(&mut self.source, &self.calibrator, self.config.sample_count, now)
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn wake_cause(&self) -> WakeCause {
        self.wake
    }

    /// Cycles started so far, skipped ones included
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Maintenance access between cycles (tare, recalibration)
    pub fn calibrator_mut(&mut self) -> &mut Calibrator {
        &mut self.calibrator
    }

    pub fn estimator(&self) -> &WeightEstimator {
        &self.estimator
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn connectivity(&self) -> &ConnectivityManager<L> {
        &self.connectivity
    }

    pub fn connectivity_mut(&mut self) -> &mut ConnectivityManager<L> {
        &mut self.connectivity
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn dispatcher(&self) -> &ReportDispatcher<T> {
        &self.dispatcher
    }

    pub fn reading_cell(&self) -> &Q {
        &self.cell
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
