use clap::Parser;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use pointxform::app::{App, AppOptions};
use pointxform::image::Size;
use pointxform::imgproc::composite::Labeler;
use pointxform::imgproc::PreprocessOptions;
use pointxform::sink::{HeadlessSink, Sink};
use pointxform::source::{RawimgSource, Source, SyntheticSource};

const WINDOW_NAME: &str = "Live Camera Input - Arithmetic Transforms";
const NO_SOURCE_MESSAGE: &str = "No video file specified or camera connected.";
const SYNTHETIC_FRAME_SIZE: Size = Size { width: 640, height: 480 };

/// Perform arithmetic point transforms on camera/video image
#[derive(Parser, Debug)]
struct Args {
    /// specify optional video file
    video_file: Option<PathBuf>,

    /// specify camera to use
    #[arg(long, default_value_t = 0)]
    camera: i32,

    /// percentage of the original size to process and display
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=100))]
    scale_percent: u32,

    /// target time per frame, in milliseconds
    #[arg(long, default_value_t = 40)]
    interval_ms: u64,

    /// read raw bgr24 frames of WIDTHxHEIGHT from stdin instead of a file or camera
    #[arg(long)]
    raw_size: Option<Size>,

    /// generate this many synthetic frames instead of capturing
    #[arg(long)]
    synthetic: Option<usize>,

    /// do not open a window
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// save every composited frame here as PNG (headless only)
    #[arg(long, requires = "headless")]
    dump_dir: Option<PathBuf>,

    /// stop after this many frames (headless only)
    #[arg(long, requires = "headless")]
    max_frames: Option<u64>,
}

#[cfg(feature = "opencv")]
fn open_capture(args: &Args) -> anyhow::Result<Option<Box<dyn Source>>> {
    use pointxform::source::CaptureSource;

    if let Some(path) = &args.video_file {
        if let Some(source) = CaptureSource::open_file(path)? {
            return Ok(Some(Box::new(source)));
        }
        warn!("Cannot open video file {}, trying camera {}", path.display(), args.camera);
    }
    info!("Starting camera stream");
    Ok(CaptureSource::open_camera(args.camera)?.map(|source| Box::new(source) as Box<dyn Source>))
}

#[cfg(not(feature = "opencv"))]
fn open_capture(args: &Args) -> anyhow::Result<Option<Box<dyn Source>>> {
    warn!(
        "Built without the opencv feature, cannot open {}",
        match &args.video_file {
            Some(path) => format!("video file {}", path.display()),
            None => format!("camera {}", args.camera),
        }
    );
    Ok(None)
}

fn open_source(args: &Args) -> anyhow::Result<Option<Box<dyn Source>>> {
    if let Some(count) = args.synthetic {
        info!("Generating {} synthetic frames", count);
        return Ok(Some(Box::new(SyntheticSource::new(SYNTHETIC_FRAME_SIZE, count))));
    }
    if let Some(size) = args.raw_size {
        info!("Reading raw {} bgr24 frames from stdin", size);
        return Ok(Some(Box::new(RawimgSource::new(std::io::stdin().lock(), size)?)));
    }
    open_capture(args)
}

// prints the notice when nothing could be opened; the caller then exits cleanly
fn open_source_or_report(args: &Args, out: &mut dyn Write) -> anyhow::Result<Option<Box<dyn Source>>> {
    let source = open_source(args)?;
    if source.is_none() {
        writeln!(out, "{}", NO_SOURCE_MESSAGE)?;
    }
    Ok(source)
}

fn headless_sink(args: &Args) -> anyhow::Result<Box<dyn Sink>> {
    Ok(Box::new(HeadlessSink::new(args.dump_dir.clone(), args.max_frames)?))
}

#[cfg(feature = "opencv")]
fn open_sink(args: &Args) -> anyhow::Result<(Box<dyn Sink>, Box<dyn Labeler>)> {
    use pointxform::imgproc::composite::HersheyLabeler;
    use pointxform::sink::HighguiSink;

    let sink: Box<dyn Sink> = if args.headless {
        headless_sink(args)?
    } else {
        Box::new(HighguiSink::new(WINDOW_NAME)?)
    };
    Ok((sink, Box::new(HersheyLabeler::default())))
}

#[cfg(not(feature = "opencv"))]
fn open_sink(args: &Args) -> anyhow::Result<(Box<dyn Sink>, Box<dyn Labeler>)> {
    use pointxform::imgproc::composite::NoLabels;

    if !args.headless {
        warn!("Built without the opencv feature, cannot open window {:?}, running headless", WINDOW_NAME);
    }
    Ok((headless_sink(args)?, Box::new(NoLabels)))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_micros()
        .init();

    let args = Args::parse();

    let terminate_flag = Arc::new(AtomicBool::new(false));
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(sig, terminate_flag.clone())?;
    }

    let Some(source) = open_source_or_report(&args, &mut std::io::stdout())? else {
        return Ok(());
    };
    let (sink, labeler) = open_sink(&args)?;

    let options = AppOptions {
        terminate_flag,
        preprocess: PreprocessOptions {
            scale_percent: args.scale_percent,
        },
        frame_interval: Duration::from_millis(args.interval_ms),
        ..Default::default()
    };
    let mut app = App::new(source, sink, labeler, options);
    let stats = app.run()?;
    info!("Processed {} frames", stats.frames);
    Ok(())
}
