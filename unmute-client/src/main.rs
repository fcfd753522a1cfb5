use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use unmute_client::{
    BlankCamera, Camera, LandmarkSource, ReplayLandmarkSource, StopSignal, Translator,
};
use unmute_gesture::{alphabet, FrameOutcome};
use unmute_shared::{Letter, TranslationEvent, TranslatorSettings};

#[cfg(feature = "opencv-backend")]
use opencv::highgui;
#[cfg(feature = "opencv-backend")]
use unmute_client::{camera::OpenCvCamera, translator::FrameReport, HttpLandmarkSource};

#[cfg(feature = "opencv-backend")]
const WINDOW_NAME: &str = "Unmute ASL Translator";

#[derive(Parser, Debug)]
#[command(author, version, about = "ASL fingerspelling translator", long_about = None)]
struct Args {
    /// Hand-pose inference service URL (e.g., http://localhost:8080)
    #[arg(short = 's', long)]
    detector: Option<String>,

    /// Video source: camera device ID (e.g., '0') or a .jsonl hand recording to replay
    #[arg(short = 'v', long, default_value = "0")]
    video_source: String,

    /// Minimum hand confidence for a letter to be accepted (0.1 to 1.0)
    #[arg(short, long)]
    confidence: Option<f32>,

    /// JSON settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not draw hand landmarks on the preview
    #[arg(long)]
    hide_landmarks: bool,

    /// Show camera window (requires the opencv-backend feature)
    #[arg(short = 'w', long)]
    show_window: bool,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    max_frames: Option<u64>,

    /// Print the reference alphabet chart and exit
    #[arg(long)]
    print_alphabet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

enum VideoSource {
    Camera(i32),
    Recording(PathBuf),
}

impl VideoSource {
    fn parse(source: &str) -> Result<Self> {
        let path = Path::new(source);
        if path.extension().is_some_and(|ext| ext == "jsonl") || path.is_file() {
            return Ok(VideoSource::Recording(path.to_path_buf()));
        }

        let camera_id: i32 = source
            .parse()
            .context("Video source must be a camera device ID (e.g., '0') or a .jsonl recording")?;
        Ok(VideoSource::Camera(camera_id))
    }
}

/// Printed on exit
#[derive(Debug, Serialize)]
struct Transcript {
    frames: u64,
    text: String,
    events: Vec<TranslationEvent>,
}

type BoxedSource = Box<dyn LandmarkSource>;

fn load_settings(args: &Args) -> Result<TranslatorSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            TranslatorSettings::from_json_str(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => TranslatorSettings::default(),
    };

    if let Some(confidence) = args.confidence {
        settings.confidence_threshold = confidence;
    }
    if args.hide_landmarks {
        settings.show_landmarks = false;
    }

    settings.validate()?;
    Ok(settings)
}

fn print_alphabet() {
    for letter in Letter::ALL {
        println!("{}\n{}\n", letter, alphabet::render(letter, '#', '.'));
    }
}

fn run_translator(args: &Args, settings: TranslatorSettings, stop: &StopSignal) -> Result<Transcript> {
    match VideoSource::parse(&args.video_source)? {
        VideoSource::Recording(path) => {
            let source = ReplayLandmarkSource::open(&path);
            // Without a frame limit, stop once the recording runs out
            let max_frames = match &source {
                Ok(replay) => args.max_frames.or(Some(replay.remaining() as u64)),
                Err(_) => args.max_frames,
            };
            let model = source.map(|replay| Box::new(replay) as BoxedSource);
            let translator =
                Translator::new(BlankCamera, model, settings)?.with_stop_signal(stop.clone());
            drive(translator, args, max_frames, stop)
        }
        #[cfg(feature = "opencv-backend")]
        VideoSource::Camera(camera_id) => {
            let model = match &args.detector {
                Some(url) => HttpLandmarkSource::connect(url.as_str(), settings.detector.clone())
                    .map(|source| Box::new(source) as BoxedSource),
                None => Err(anyhow::anyhow!("--detector is required for camera input")),
            };
            let translator = Translator::new(OpenCvCamera::new(camera_id), model, settings)?
                .with_stop_signal(stop.clone());
            drive(translator, args, args.max_frames, stop)
        }
        #[cfg(not(feature = "opencv-backend"))]
        VideoSource::Camera(camera_id) => {
            anyhow::bail!(
                "Camera {} needs the opencv-backend feature; replay a .jsonl recording instead",
                camera_id
            )
        }
    }
}

fn drive<C: Camera>(
    mut translator: Translator<C, BoxedSource>,
    args: &Args,
    max_frames: Option<u64>,
    stop: &StopSignal,
) -> Result<Transcript> {
    translator.start_camera().context("Failed to start camera")?;
    // Starting detection clears the signal, so honour a stop that came first
    if stop.is_stopped() {
        log::info!("Stop requested before detection started");
        translator.stop_camera();
        return Ok(Transcript {
            frames: 0,
            text: String::new(),
            events: Vec::new(),
        });
    }
    if let Err(e) = translator.start_detection() {
        if let Some(message) = translator.last_error() {
            log::error!("{}", message);
        }
        return Err(e.context("Failed to start detection"));
    }

    #[cfg(feature = "opencv-backend")]
    if args.show_window {
        highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
    }
    #[cfg(not(feature = "opencv-backend"))]
    if args.show_window {
        log::warn!("--show-window needs the opencv-backend feature; ignoring");
    }

    let frames = translator.run(max_frames, |translator, report| {
        if let FrameOutcome::Recognized {
            event,
            appended: true,
        } = report.outcome
        {
            log::info!("Detected {} ({:.0}%)", event.letter, event.confidence * 100.0);
        }
        log::debug!("{}", translator.status_line());

        #[cfg(feature = "opencv-backend")]
        if args.show_window {
            show_frame(translator, report, stop)?;
        }
        Ok(())
    })?;

    if stop.is_stopped() {
        log::info!("Stop requested after {} frames", frames);
    }
    translator.stop_camera();

    let events: Vec<TranslationEvent> = translator.history().iter().copied().collect();
    Ok(Transcript {
        frames,
        text: events.iter().map(|e| e.letter.as_char()).collect(),
        events,
    })
}

#[cfg(feature = "opencv-backend")]
fn show_frame<C: Camera>(
    translator: &Translator<C, BoxedSource>,
    report: &FrameReport,
    stop: &StopSignal,
) -> Result<()> {
    use unmute_client::{camera::frame_to_mat, overlay};
    use unmute_shared::overlay::HandOverlay;

    let mut display_frame = frame_to_mat(&report.frame)?;

    if translator.show_landmarks() {
        if let Some(hand) = &report.hand {
            overlay::draw_hand(&mut display_frame, &HandOverlay::from_hand(hand))?;
        }
    }
    overlay::draw_text_lines(&mut display_frame, &[translator.status_line()])?;

    highgui::imshow(WINDOW_NAME, &display_frame)?;

    // Check for 'q' key to quit
    if highgui::wait_key(1)? == b'q' as i32 {
        log::info!("Quit requested");
        stop.stop();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    if args.print_alphabet {
        print_alphabet();
        return Ok(());
    }

    log::info!("Unmute translator starting...");
    log::info!("Video source: {}", args.video_source);

    let settings = load_settings(&args).context("Invalid settings")?;
    log::info!(
        "Confidence threshold: {:.0}%",
        settings.confidence_threshold * 100.0
    );

    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    // The frame loop blocks on capture and inference, so keep it off the runtime
    let mut worker =
        tokio::task::spawn_blocking(move || run_translator(&args, settings, &worker_stop));

    let finished = tokio::select! {
        result = &mut worker => Some(result),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };
    let transcript = match finished {
        Some(result) => result??,
        None => {
            log::info!("Ctrl-C received, stopping...");
            stop.stop();
            worker.await??
        }
    };

    println!("{}", serde_json::to_string_pretty(&transcript)?);
    Ok(())
}
