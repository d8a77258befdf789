//! Frame sources and landmark detection
//!
//! The camera and the landmark model are external collaborators; this module
//! defines the narrow interfaces the acquisition loop uses and ships two
//! sources that need no camera: a trace replayer and a synthetic pinch.

use crate::constants::landmarks::{INDEX_TIP, MAX_INDEX, THUMB_TIP};
use crate::error::{AppError, AppResult};
use crate::landmarks::{HandLandmarks, Point2D};
use std::f32::consts::TAU;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::{Duration, Instant};

/// Blocking source of frames
pub trait FrameSource: Send {
    type Frame;

    /// Wait for and return the next frame. Errors end the session.
    fn next_frame(&mut self) -> AppResult<Self::Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    type Frame = S::Frame;

    fn next_frame(&mut self) -> AppResult<Self::Frame> {
        (**self).next_frame()
    }
}

/// Finds hands in a frame. `None` means no hand was detected.
pub trait LandmarkDetector<F>: Send {
    fn detect(&mut self, frame: &F) -> Option<Vec<HandLandmarks>>;
}

/// A frame that already carries its detection result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    pub hands: Option<Vec<HandLandmarks>>,
}

/// Detector for [`LandmarkFrame`]s: hands over what the frame carries
#[derive(Default)]
pub struct PassthroughDetector;

impl LandmarkDetector<LandmarkFrame> for PassthroughDetector {
    fn detect(&mut self, frame: &LandmarkFrame) -> Option<Vec<HandLandmarks>> {
        frame.hands.clone().filter(|hands| !hands.is_empty())
    }
}

/// Sleeps so frames are delivered at a fixed rate, like a camera would
struct FramePacer {
    period: Duration,
    next: Option<Instant>,
}

impl FramePacer {
    fn new(fps: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next: None,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        let due = self.next.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }
        // Don't try to catch up after a stall
        self.next = Some(due.max(now) + self.period);
    }
}

/// Replays a landmark trace, one frame per line.
///
/// Each line is either `-` (or empty) for a frame without hands, or
/// whitespace separated `index:x,y` tokens with normalised coordinates.
/// Hands are separated by `|`. Lines starting with `#` are skipped.
pub struct TraceSource<R> {
    reader: R,
    line_no: usize,
    pacer: FramePacer,
}

impl<R: BufRead + Send> TraceSource<R> {
    pub fn new(reader: R, fps: u32) -> Self {
        Self {
            reader,
            line_no: 0,
            pacer: FramePacer::new(fps),
        }
    }
}

/// Open a trace file, or standard input for `-`
pub fn open_trace(path: &str, fps: u32) -> AppResult<TraceSource<Box<dyn BufRead + Send>>> {
    let reader: Box<dyn BufRead + Send> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path)
            .map_err(|e| AppError::Sensor(format!("cannot open trace {}: {}", path, e)))?;
        Box::new(BufReader::new(file))
    };
    Ok(TraceSource::new(reader, fps))
}

impl<R: BufRead + Send> FrameSource for TraceSource<R> {
    type Frame = LandmarkFrame;

    fn next_frame(&mut self) -> AppResult<LandmarkFrame> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| AppError::Sensor(format!("trace read failed: {}", e)))?;
            if read == 0 {
                return Err(AppError::EndOfStream);
            }
            self.line_no += 1;
            if !line.trim_start().starts_with('#') {
                break;
            }
        }

        let hands = parse_trace_line(&line)
            .map_err(|e| AppError::Sensor(format!("trace line {}: {}", self.line_no, e)))?;
        self.pacer.wait();
        Ok(LandmarkFrame { hands })
    }
}

/// Parse one trace line into the hands it describes
pub fn parse_trace_line(line: &str) -> Result<Option<Vec<HandLandmarks>>, String> {
    let line = line.trim();
    if line.is_empty() || line == "-" {
        return Ok(None);
    }

    let hands = line
        .split('|')
        .map(parse_hand)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(hands))
}

fn parse_hand(hand: &str) -> Result<HandLandmarks, String> {
    let points = hand
        .split_whitespace()
        .map(|token| -> Result<(usize, Point2D), String> {
            let (index, coords) = token
                .split_once(':')
                .ok_or_else(|| format!("expected index:x,y, got {:?}", token))?;
            let (x, y) = coords
                .split_once(',')
                .ok_or_else(|| format!("expected x,y after {:?}", index))?;

            let index: usize = index
                .parse()
                .map_err(|_| format!("bad landmark index {:?}", index))?;
            if index > MAX_INDEX {
                return Err(format!("landmark index {} out of range 0..={}", index, MAX_INDEX));
            }
            let x: f32 = x.parse().map_err(|_| format!("bad x coordinate {:?}", x))?;
            let y: f32 = y.parse().map_err(|_| format!("bad y coordinate {:?}", y))?;
            Ok((index, Point2D::new(x, y)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if points.is_empty() {
        return Err("empty hand".to_string());
    }
    Ok(HandLandmarks::new(points))
}

/// Generates a hand slowly opening and closing its pinch.
///
/// Every cycle ends with a stretch where the hand is out of view.
pub struct SyntheticSource {
    fps: u32,
    frame: u64,
    cycle: Duration,
    absent: Duration,
    pacer: FramePacer,
}

impl SyntheticSource {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            frame: 0,
            cycle: Duration::from_secs(8),
            absent: Duration::from_secs(1),
            pacer: FramePacer::new(fps),
        }
    }

    /// Pinch openness in `[0, 1]` at time `t` seconds into the cycle
    fn openness(&self, t: f32) -> f32 {
        let present = (self.cycle - self.absent).as_secs_f32();
        let phase = (t / present).min(1.0);
        let wave = 0.5 - 0.5 * (TAU * phase).cos();
        // A little tremor so the smoothing has something to do
        let tremor = 0.02 * (t * 37.0).sin();
        (wave + tremor).clamp(0.0, 1.0)
    }

    fn hand_at(&self, t: f32) -> Option<HandLandmarks> {
        let in_cycle = t % self.cycle.as_secs_f32();
        if in_cycle >= (self.cycle - self.absent).as_secs_f32() {
            return None;
        }

        let open = self.openness(in_cycle);
        let thumb = Point2D::new(0.45, 0.65);
        let index = Point2D::new(0.45 + 0.3 * open, 0.65 - 0.4 * open);
        Some(HandLandmarks::new(vec![
            (0, Point2D::new(0.4, 0.9)),
            (THUMB_TIP, thumb),
            (INDEX_TIP, index),
        ]))
    }
}

impl FrameSource for SyntheticSource {
    type Frame = LandmarkFrame;

    fn next_frame(&mut self) -> AppResult<LandmarkFrame> {
        let t = self.frame as f32 / self.fps as f32;
        self.frame += 1;
        self.pacer.wait();
        Ok(LandmarkFrame {
            hands: self.hand_at(t).map(|hand| vec![hand]),
        })
    }
}
