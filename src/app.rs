use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::image::*;
use super::imgproc::composite::{self, Labeler, Tile};
use super::imgproc::{preprocess, PreprocessOptions};
use super::sink::Sink;
use super::source::Source;
use super::transform::TransformEngine;

pub const LABELS: [&str; 4] = [
    "Colour Input",
    "Grayscale Input",
    "Grayscale / 2",
    "| current - previous |",
];
const GRID_COLUMNS: usize = 2;

pub struct AppOptions {
    pub terminate_flag: Arc<AtomicBool>,
    pub preprocess: PreprocessOptions,

    pub frame_interval: Duration, // target time per loop iteration
    pub min_wait: Duration,       // always give the sink at least this long to poll for keys
    pub exit_key: char,
}

impl Default for AppOptions {
    fn default() -> Self {
        AppOptions {
            terminate_flag: Arc::new(AtomicBool::new(false)),
            preprocess: PreprocessOptions::default(),
            frame_interval: Duration::from_millis(40), // 25 fps
            min_wait: Duration::from_millis(2),
            exit_key: 'x',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    ExitKey,
    Terminated,
    SinkDone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub stop_reason: StopReason,
}

/// Time left in the frame interval after `elapsed` (rounded up to whole
/// milliseconds), but never less than `min_wait`.
pub fn frame_wait(elapsed: Duration, frame_interval: Duration, min_wait: Duration) -> Duration {
    let elapsed_ms = Duration::from_millis(((elapsed.as_nanos() + 999_999) / 1_000_000) as u64);
    frame_interval.saturating_sub(elapsed_ms).max(min_wait)
}

pub struct App {
    source: Box<dyn Source>,
    sink: Box<dyn Sink>,
    labeler: Box<dyn Labeler>,
    options: AppOptions,

    engine: TransformEngine,
    stream_size: Option<Size>, // size of the first frame; every later frame must match
}

impl App {
    pub fn new(
        source: Box<dyn Source>,
        sink: Box<dyn Sink>,
        labeler: Box<dyn Labeler>,
        options: AppOptions,
    ) -> App {
        if let Some(size) = source.frame_size() {
            info!("Source frame size: {}", size);
        }
        App {
            source,
            sink,
            labeler,
            options,
            engine: TransformEngine::new(),
            stream_size: None,
        }
    }

    // the four labelled views of one input frame, tiled 2x2
    fn process_frame(&mut self, frame: &ImageBuffer) -> anyhow::Result<ImageBuffer> {
        let t_start = Instant::now();

        let pre = preprocess(frame, &self.options.preprocess);
        let t_preprocessed = Instant::now();

        let transformed = self.engine.process(pre.gray.clone());
        let t_transformed = Instant::now();

        let tiles = vec![
            Tile::new(LABELS[0], pre.color),
            Tile::new(LABELS[1], pre.gray),
            Tile::new(LABELS[2], transformed.half),
            Tile::new(LABELS[3], transformed.diff),
        ];
        let output = composite::grid(tiles, GRID_COLUMNS, self.labeler.as_mut())?;
        let t_composited = Instant::now();

        debug!(
            "Frame processed. Cost: preprocess: {:?}, transform: {:?}, composite: {:?}",
            t_preprocessed - t_start,
            t_transformed - t_preprocessed,
            t_composited - t_transformed
        );
        Ok(output)
    }

    pub fn run(&mut self) -> anyhow::Result<RunStats> {
        let mut frames = 0;
        let stop_reason = loop {
            if self.options.terminate_flag.load(Ordering::Relaxed) {
                break StopReason::Terminated;
            }
            if self.sink.is_done() {
                break StopReason::SinkDone;
            }

            let t_read_start = Instant::now();
            let frame = match self.source.read_frame()? {
                Some(frame) => frame,
                None => break StopReason::EndOfStream,
            };
            let t_start = Instant::now();

            match self.stream_size {
                None => {
                    info!("First frame: {} {:?}", frame.size(), frame.format());
                    self.stream_size = Some(frame.size());
                }
                Some(size) if size != frame.size() => anyhow::bail!(
                    "Source returned invalid sized frame: {}, stream started at {}",
                    frame.size(),
                    size
                ),
                Some(_) => {}
            }

            let output = self.process_frame(&frame)?;
            self.sink.show(&output)?;
            frames += 1;

            let elapsed = t_start.elapsed();
            let wait = frame_wait(elapsed, self.options.frame_interval, self.options.min_wait);
            debug!(
                "Frame {} shown. Cost: read: {:?}, process and show: {:?}, waiting {:?}",
                frames,
                t_start - t_read_start,
                elapsed,
                wait
            );

            if self.sink.poll_key(wait)? == Some(self.options.exit_key) {
                break StopReason::ExitKey;
            }
        };

        info!("Stopped after {} frames: {:?}", frames, stop_reason);
        Ok(RunStats { frames, stop_reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imgproc::composite::NoLabels;
    use crate::source::SequenceSource;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        frames: Vec<ImageBuffer>,
        waits: Vec<Duration>,
    }

    // shows into a shared log and replays scripted key presses
    struct FakeSink {
        log: Rc<RefCell<Recorded>>,
        keys: Vec<Option<char>>,
        on_show: Option<Arc<AtomicBool>>,
    }

    impl Sink for FakeSink {
        fn show(&mut self, frame: &ImageBuffer) -> anyhow::Result<()> {
            self.log.borrow_mut().frames.push(frame.clone());
            if let Some(flag) = &self.on_show {
                flag.store(true, Ordering::Relaxed);
            }
            Ok(())
        }

        fn poll_key(&mut self, timeout: Duration) -> anyhow::Result<Option<char>> {
            self.log.borrow_mut().waits.push(timeout);
            Ok(if self.keys.is_empty() { None } else { self.keys.remove(0) })
        }
    }

    fn mono_frames(values: &[u8]) -> Vec<ImageBuffer> {
        values
            .iter()
            .map(|&v| {
                let mut frame = ImageBuffer::new(ImageFormat::Bgr24, 2, 2, None);
                frame.fill(v);
                frame
            })
            .collect()
    }

    fn full_scale() -> AppOptions {
        AppOptions {
            preprocess: PreprocessOptions { scale_percent: 100 },
            frame_interval: Duration::from_millis(5),
            min_wait: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn make_app(frames: Vec<ImageBuffer>, keys: Vec<Option<char>>, options: AppOptions) -> (App, Rc<RefCell<Recorded>>) {
        let log = Rc::new(RefCell::new(Recorded::default()));
        let sink = FakeSink {
            log: log.clone(),
            keys,
            on_show: None,
        };
        let app = App::new(
            Box::new(SequenceSource::new(frames)),
            Box::new(sink),
            Box::new(NoLabels),
            options,
        );
        (app, log)
    }

    #[test]
    fn test_runs_to_end_of_stream() {
        let (mut app, log) = make_app(mono_frames(&[100, 40, 40]), vec![], full_scale());
        let stats = app.run().unwrap();
        assert_eq!(stats, RunStats { frames: 3, stop_reason: StopReason::EndOfStream });

        let log = log.borrow();
        assert_eq!(log.frames.len(), 3);
        assert_eq!(log.waits.len(), 3);
        // 2x2 grid of 2x2 tiles: top right is gray, bottom row is half and diff
        let expected = [(100, 50, 0), (40, 20, 60), (40, 20, 0)];
        for (out, (gray, half, diff)) in log.frames.iter().zip(expected) {
            assert_eq!(out.size(), (4, 4).into());
            assert_eq!(out.pixel(3, 0), &[gray, gray, gray]);
            assert_eq!(out.pixel(0, 3), &[half, half, half]);
            assert_eq!(out.pixel(3, 3), &[diff, diff, diff]);
        }
    }

    #[test]
    fn test_exit_key_stops() {
        let keys = vec![None, Some('a'), Some('x'), None];
        let (mut app, log) = make_app(mono_frames(&[1, 2, 3, 4, 5]), keys, full_scale());
        let stats = app.run().unwrap();
        assert_eq!(stats, RunStats { frames: 3, stop_reason: StopReason::ExitKey });
        assert_eq!(log.borrow().frames.len(), 3);
    }

    #[test]
    fn test_terminate_flag_stops_between_frames() {
        let flag = Arc::new(AtomicBool::new(false));
        let log = Rc::new(RefCell::new(Recorded::default()));
        let sink = FakeSink {
            log: log.clone(),
            keys: vec![],
            on_show: Some(flag.clone()),
        };
        let options = AppOptions {
            terminate_flag: flag,
            ..full_scale()
        };
        let mut app = App::new(
            Box::new(SequenceSource::new(mono_frames(&[1, 2, 3]))),
            Box::new(sink),
            Box::new(NoLabels),
            options,
        );
        let stats = app.run().unwrap();
        assert_eq!(stats, RunStats { frames: 1, stop_reason: StopReason::Terminated });
    }

    #[test]
    fn test_downscales_before_tiling() {
        let options = AppOptions {
            preprocess: PreprocessOptions { scale_percent: 50 },
            ..full_scale()
        };
        let mut frames = Vec::new();
        for _ in 0..2 {
            frames.push(ImageBuffer::new(ImageFormat::Bgr24, 8, 6, None));
        }
        let (mut app, log) = make_app(frames, vec![], options);
        app.run().unwrap();
        assert_eq!(log.borrow().frames[0].size(), (8, 6).into());
    }

    #[test]
    fn test_frame_size_change_is_error() {
        let frames = vec![
            ImageBuffer::new(ImageFormat::Bgr24, 2, 2, None),
            ImageBuffer::new(ImageFormat::Bgr24, 4, 2, None),
        ];
        let (mut app, _) = make_app(frames, vec![], full_scale());
        assert!(app.run().is_err());
    }

    #[test]
    fn test_frame_wait() {
        let interval = Duration::from_millis(40);
        let min_wait = Duration::from_millis(2);
        assert_eq!(frame_wait(Duration::ZERO, interval, min_wait), interval);
        assert_eq!(frame_wait(Duration::from_micros(10_100), interval, min_wait), Duration::from_millis(29));
        // any fraction of a millisecond counts as a whole one
        assert_eq!(frame_wait(Duration::from_nanos(10_000_500), interval, min_wait), Duration::from_millis(29));
        assert_eq!(frame_wait(Duration::from_millis(10), interval, min_wait), Duration::from_millis(30));
        assert_eq!(frame_wait(Duration::from_millis(39), interval, min_wait), min_wait);
        assert_eq!(frame_wait(Duration::from_millis(120), interval, min_wait), min_wait);
    }
}
