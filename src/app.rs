//! Main application logic and orchestration

use crate::acquisition::{AcquisitionLoop, Pipeline};
use crate::channel::{CommandReceiver, command_channel};
use crate::config::Config;
use crate::constants::sensor::STOP_GRACE_MS;
use crate::display::{DisplaySurface, LogDisplay, TerminalOverlay};
use crate::error::{AppError, AppResult};
use crate::presentation::{self, Presenter};
use crate::sensor::{FrameSource, LandmarkFrame, PassthroughDetector, SyntheticSource, open_trace};
use crate::state::StopSignal;
use crate::volume::{LogActuator, PactlActuator, VolumeActuator};
use log::{info, warn};
use std::time::{Duration, Instant};

/// Main application struct
pub struct App {
    config: Config,
}

/// Exit codes for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    SensorLost = 1, // Camera/trace failed or ran out
    Error = 2,      // Any other application error
}

/// Result type that includes user exit information
pub type AppRunResult = Result<(), AppError>;

/// Extended result that tracks exit reason
pub struct RunResult {
    pub result: AppRunResult,
    pub exit_code: ExitCode,
}

impl RunResult {
    fn from_error(e: AppError) -> Self {
        let exit_code = if e.is_sensor_loss() {
            ExitCode::SensorLost
        } else {
            ExitCode::Error
        };
        RunResult {
            result: Err(e),
            exit_code,
        }
    }
}

type BoxedSource = Box<dyn FrameSource<Frame = LandmarkFrame>>;

impl App {
    /// Initialize the application with configuration
    pub fn new_with_config(config: Config) -> AppResult<Self> {
        Ok(App { config })
    }

    /// Run both loops until either one stops
    pub async fn run(self) -> RunResult {
        let source: BoxedSource = match &self.config.trace {
            Some(path) => match open_trace(path, self.config.fps) {
                Ok(source) => Box::new(source),
                Err(e) => return RunResult::from_error(e),
            },
            None => Box::new(SyntheticSource::new(self.config.fps)),
        };

        let actuator: Box<dyn VolumeActuator> = if self.config.dry_run {
            Box::new(LogActuator)
        } else {
            Box::new(PactlActuator::new(self.config.sink.clone()))
        };

        let (commands_tx, commands_rx) = command_channel(self.config.channel_capacity);
        let stop = StopSignal::new();

        let acquisition = AcquisitionLoop::new(
            source,
            PassthroughDetector,
            actuator,
            Pipeline::new(&self.config, Instant::now()),
            commands_tx,
            stop.clone(),
        );
        let worker = tokio::task::spawn_blocking(move || acquisition.run());
        info!("Acquisition started");

        let presented = self.present(commands_rx, stop.clone()).await;

        // The worker sees the stop signal after its current frame
        let acquired = match tokio::time::timeout(Duration::from_millis(STOP_GRACE_MS), worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AppError::Worker(e.to_string())),
            Err(_) => {
                warn!("Acquisition still blocked on the sensor, leaving it behind");
                Ok(())
            }
        };

        match (presented, acquired) {
            (Err(e), _) | (Ok(()), Err(e)) => RunResult::from_error(e),
            (Ok(()), Ok(())) => RunResult {
                result: Ok(()),
                exit_code: ExitCode::Success,
            },
        }
    }

    /// Run the presentation loop on the current task with the configured surface
    async fn present(&self, commands: CommandReceiver, stop: StopSignal) -> AppResult<()> {
        if self.config.headless {
            return run_presenter(LogDisplay::new(), &self.config, commands, stop).await;
        }

        match TerminalOverlay::new() {
            Ok(display) => run_presenter(display, &self.config, commands, stop).await,
            Err(e) => {
                stop.trigger();
                Err(e)
            }
        }
    }
}

async fn run_presenter<D: DisplaySurface>(
    display: D,
    config: &Config,
    commands: CommandReceiver,
    stop: StopSignal,
) -> AppResult<()> {
    let presenter = Presenter::new(display, config.hide_delay);
    presentation::run(presenter, commands, stop).await
}
