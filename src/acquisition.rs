//! Acquisition loop: frames in, volume commands out

use crate::channel::CommandSender;
use crate::config::Config;
use crate::constants::smoothing::HISTORY_LEN;
use crate::error::AppResult;
use crate::gate::{ChangeGate, GateDecision, GateState};
use crate::landmarks::{DistanceExtractor, HandLandmarks};
use crate::sensor::{FrameSource, LandmarkDetector};
use crate::smoothing::DistanceSmoother;
use crate::state::StopSignal;
use crate::volume::{VolumeActuator, VolumeLevel, VolumeMapper};
use log::{debug, error, info};
use std::time::Instant;

/// Result of pushing one frame through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No hand, and lost hands are skipped
    NoSample,
    /// A level was computed but the gate held it back
    Suppressed(VolumeLevel),
    /// The level passed the gate and should be applied
    Emit(VolumeLevel),
}

/// Extraction, smoothing, mapping and gating for one stream of frames
pub struct Pipeline {
    extractor: DistanceExtractor,
    smoother: DistanceSmoother,
    mapper: VolumeMapper,
    gate: ChangeGate,
}

impl Pipeline {
    pub fn new(config: &Config, start: Instant) -> Self {
        Self {
            extractor: DistanceExtractor::new(
                config.lost_hand,
                config.frame_width,
                config.frame_height,
            ),
            smoother: DistanceSmoother::new(config.alpha, HISTORY_LEN),
            mapper: VolumeMapper::new(config.max_distance, config.sensitivity, config.beta),
            gate: ChangeGate::new(config.gate, config.min_interval, config.threshold, start),
        }
    }

    pub fn step(&mut self, hands: Option<&[HandLandmarks]>, now: Instant) -> StepOutcome {
        let Some(pair) = self.extractor.extract(hands) else {
            return StepOutcome::NoSample;
        };

        let sample = self.smoother.update(pair.distance(), now);
        let candidate = self
            .mapper
            .map(sample.smoothed, self.gate.state().last_emitted_volume);

        match self.gate.evaluate(candidate, sample.timestamp) {
            GateDecision::Emit => {
                debug!(
                    "Emit {} (raw {:.1}px, smoothed {:.1}px)",
                    candidate, sample.raw, sample.smoothed
                );
                StepOutcome::Emit(candidate)
            }
            GateDecision::Suppress => StepOutcome::Suppressed(candidate),
        }
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Recent smoothed distances, oldest first
    pub fn recent_distances(&self) -> Vec<f32> {
        self.smoother.history().collect()
    }
}

/// Owns the sensor side: source, detector, actuator and pipeline
pub struct AcquisitionLoop<S, D, A> {
    source: S,
    detector: D,
    actuator: A,
    pipeline: Pipeline,
    commands: CommandSender,
    stop: StopSignal,
}

impl<S, D, A> AcquisitionLoop<S, D, A>
where
    S: FrameSource,
    D: LandmarkDetector<S::Frame>,
    A: VolumeActuator,
{
    pub fn new(
        source: S,
        detector: D,
        actuator: A,
        pipeline: Pipeline,
        commands: CommandSender,
        stop: StopSignal,
    ) -> Self {
        Self {
            source,
            detector,
            actuator,
            pipeline,
            commands,
            stop,
        }
    }

    /// Run until the stop signal is raised or the source fails.
    ///
    /// Always ends by sending `Shutdown` and raising the stop signal. A source
    /// failure is returned as the error.
    pub fn run(mut self) -> AppResult<()> {
        let mut tracking = false;
        let result = loop {
            if self.stop.is_set() {
                break Ok(());
            }

            let frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(e) => break Err(e),
            };
            if self.stop.is_set() {
                break Ok(());
            }

            let hands = self.detector.detect(&frame);
            match self.pipeline.step(hands.as_deref(), Instant::now()) {
                StepOutcome::Emit(level) => {
                    tracking = true;
                    self.actuator.set_volume(level);
                    self.commands.show_volume(level);
                }
                StepOutcome::Suppressed(_) => tracking = true,
                // Hand left the frame: take the overlay down right away
                StepOutcome::NoSample if tracking => {
                    tracking = false;
                    self.commands.hide();
                }
                StepOutcome::NoSample => {}
            }
        };

        let last = self.pipeline.gate_state().last_emitted_volume;
        match &result {
            Ok(()) => info!("Acquisition stopped at {}", last),
            Err(e) => error!("Acquisition failed at {}: {}", last, e),
        }
        debug!("Recent distances: {:?}", self.pipeline.recent_distances());

        self.commands.shutdown();
        self.stop.trigger();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{UiCommand, command_channel};
    use crate::constants::landmarks::{INDEX_TIP, THUMB_TIP};
    use crate::error::AppError;
    use crate::gate::GatePolicy;
    use crate::landmarks::{LostHandPolicy, Point2D};
    use crate::sensor::{LandmarkFrame, PassthroughDetector};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(300);

    fn config() -> Config {
        Config {
            frame_width: 1000,
            frame_height: 1000,
            ..Config::default()
        }
    }

    /// Hand whose fingertips are `distance` pixels apart in a 1000x1000 frame
    fn hand(distance: f32) -> Vec<HandLandmarks> {
        vec![HandLandmarks::new(vec![
            (THUMB_TIP, Point2D::new(0.0, 0.0)),
            (INDEX_TIP, Point2D::new(distance / 1000.0, 0.0)),
        ])]
    }

    fn emitted(outcome: StepOutcome) -> Option<u8> {
        match outcome {
            StepOutcome::Emit(level) => Some(level.percent()),
            _ => None,
        }
    }

    #[test]
    fn test_constant_distance_settles_near_target() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(&config(), t0);
        let hands = hand(150.0);

        let levels: Vec<u8> = (1..=20)
            .filter_map(|i| emitted(pipeline.step(Some(hands.as_slice()), t0 + TICK * i)))
            .collect();

        assert_eq!(levels, vec![40, 48]);
        let settled = pipeline.gate_state().last_emitted_volume.percent();
        assert!(settled.abs_diff(50) < 5);
    }

    #[test]
    fn test_constant_distance_converges_with_fine_threshold() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(
            &Config {
                threshold: 1,
                ..config()
            },
            t0,
        );
        let hands = hand(150.0);

        for i in 1..=20 {
            pipeline.step(Some(hands.as_slice()), t0 + TICK * i);
        }

        let settled = pipeline.gate_state().last_emitted_volume.percent();
        assert!((49..=50).contains(&settled), "{settled}");
    }

    #[test]
    fn test_default_gate_stops_short_of_the_extremes() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(&config(), t0);
        let open = hand(300.0);
        let closed = hand(0.0);

        let rising: Vec<u8> = (1..=20)
            .filter_map(|i| emitted(pipeline.step(Some(open.as_slice()), t0 + TICK * i)))
            .collect();
        // 96 -> 99 is a change of 3, under the threshold
        assert_eq!(rising, vec![80, 96]);

        let falling: Vec<u8> = (21..=40)
            .filter_map(|i| emitted(pipeline.step(Some(closed.as_slice()), t0 + TICK * i)))
            .collect();
        // From 5 every candidate lands in 1..=4, again under the threshold
        assert_eq!(falling, vec![43, 15, 5]);
        assert_eq!(pipeline.gate_state().last_emitted_volume.percent(), 5);
    }

    #[test]
    fn test_jump_from_zero_to_full() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(&config(), t0);
        // First sample passes stage one unchanged
        assert_eq!(emitted(pipeline.step(Some(hand(300.0).as_slice()), t0 + TICK)), Some(80));
    }

    #[test]
    fn test_updates_faster_than_interval_are_suppressed() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(&config(), t0);

        let outcome = pipeline.step(Some(hand(300.0).as_slice()), t0 + Duration::from_millis(10));

        assert!(matches!(outcome, StepOutcome::Suppressed(_)));
        assert_eq!(pipeline.gate_state().last_emitted_volume.percent(), 0);
    }

    #[test]
    fn test_skip_policy_produces_no_sample() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(
            &Config {
                lost_hand: LostHandPolicy::Skip,
                ..config()
            },
            t0,
        );
        assert_eq!(pipeline.step(None, t0 + TICK), StepOutcome::NoSample);
    }

    #[test]
    fn test_sticky_policy_keeps_computing() {
        let t0 = Instant::now();
        let mut pipeline = Pipeline::new(
            &Config {
                gate: GatePolicy::TimeOnly,
                ..config()
            },
            t0,
        );
        assert_eq!(emitted(pipeline.step(Some(hand(300.0).as_slice()), t0 + TICK)), Some(80));
        // Hand gone: last fingertips are reused, volume keeps easing up
        assert_eq!(emitted(pipeline.step(None, t0 + TICK * 2)), Some(96));
    }

    /// Replays frames, then fails
    struct ScriptedSource {
        frames: VecDeque<LandmarkFrame>,
    }

    impl FrameSource for ScriptedSource {
        type Frame = LandmarkFrame;

        fn next_frame(&mut self) -> AppResult<LandmarkFrame> {
            std::thread::sleep(Duration::from_millis(5));
            self.frames.pop_front().ok_or(AppError::EndOfStream)
        }
    }

    /// Never fails, never ends
    struct EndlessSource;

    impl FrameSource for EndlessSource {
        type Frame = LandmarkFrame;

        fn next_frame(&mut self) -> AppResult<LandmarkFrame> {
            std::thread::sleep(Duration::from_millis(1));
            Ok(LandmarkFrame::default())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingActuator {
        levels: Arc<Mutex<Vec<u8>>>,
    }

    impl VolumeActuator for RecordingActuator {
        fn set_volume(&mut self, level: VolumeLevel) {
            self.levels.lock().unwrap().push(level.percent());
        }
    }

    fn fast_config() -> Config {
        Config {
            min_interval: Duration::ZERO,
            ..config()
        }
    }

    #[test]
    fn test_sensor_failure_ends_with_shutdown() {
        let (tx, mut rx) = command_channel(64);
        let stop = StopSignal::new();
        let actuator = RecordingActuator::default();
        let frames = [0.0, 300.0, 300.0, 0.0]
            .into_iter()
            .map(|d| LandmarkFrame {
                hands: Some(hand(d)),
            })
            .collect();

        let result = AcquisitionLoop::new(
            ScriptedSource { frames },
            PassthroughDetector,
            actuator.clone(),
            Pipeline::new(&fast_config(), Instant::now()),
            tx,
            stop.clone(),
        )
        .run();

        assert!(matches!(result, Err(AppError::EndOfStream)));
        assert!(stop.is_set());

        let received: Vec<UiCommand> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(received.last(), Some(&UiCommand::Shutdown));
        assert_eq!(received.iter().filter(|c| **c == UiCommand::Shutdown).count(), 1);

        // Every actuated level was also shown, in the same order
        let shown: Vec<u8> = received
            .iter()
            .filter_map(|c| match c {
                UiCommand::ShowVolume(level) => Some(level.percent()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, *actuator.levels.lock().unwrap());
        // Opening the pinch raises the level twice, closing it drops it
        assert_eq!(shown.len(), 3);
        assert!(shown[0] > 50 && shown[1] > shown[0] && shown[2] < shown[1], "{shown:?}");
    }

    #[test]
    fn test_skip_policy_hides_when_hand_leaves() {
        let (tx, mut rx) = command_channel(64);
        let frames = [Some(hand(300.0)), None, None]
            .into_iter()
            .map(|hands| LandmarkFrame { hands })
            .collect();

        let result = AcquisitionLoop::new(
            ScriptedSource { frames },
            PassthroughDetector,
            RecordingActuator::default(),
            Pipeline::new(
                &Config {
                    lost_hand: LostHandPolicy::Skip,
                    ..fast_config()
                },
                Instant::now(),
            ),
            tx,
            StopSignal::new(),
        )
        .run();

        assert!(result.is_err());
        let received: Vec<UiCommand> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(
            received,
            vec![
                UiCommand::ShowVolume(VolumeLevel::new(80)),
                UiCommand::HideWindow,
                UiCommand::Shutdown,
            ]
        );
    }

    #[test]
    fn test_stops_when_signalled() {
        let (tx, mut rx) = command_channel(64);
        let stop = StopSignal::new();
        let remote = stop.clone();

        let handle = std::thread::spawn(move || {
            AcquisitionLoop::new(
                EndlessSource,
                PassthroughDetector,
                RecordingActuator::default(),
                Pipeline::new(&fast_config(), Instant::now()),
                tx,
                remote,
            )
            .run()
        });

        std::thread::sleep(Duration::from_millis(20));
        stop.trigger();

        assert!(handle.join().unwrap().is_ok());
        let received: Vec<UiCommand> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(received, vec![UiCommand::Shutdown]);
    }
}
