mod common;

use anyhow::{anyhow, Result};
use common::{hand, CountingCamera, ScriptedSource, ALL, PEACE, THUMB};
use std::time::Duration;
use unmute_client::translator::{CAMERA_ERROR, MODEL_INIT_ERROR};
use unmute_client::{StopSignal, Translator, TranslatorError, TranslatorState};
use unmute_gesture::HISTORY_CAPACITY;
use unmute_shared::{Handedness, Letter, TranslatorSettings};

fn settings() -> TranslatorSettings {
    TranslatorSettings {
        frame_interval_ms: 0,
        ..TranslatorSettings::default()
    }
}

fn translator(source: ScriptedSource) -> (Translator<CountingCamera, ScriptedSource>, CountingCamera) {
    let camera = CountingCamera::default();
    let translator = Translator::new(camera.clone(), Ok(source), settings()).unwrap();
    (translator, camera)
}

fn detecting(source: ScriptedSource) -> (Translator<CountingCamera, ScriptedSource>, CountingCamera) {
    let (mut translator, camera) = translator(source);
    translator.start_camera().unwrap();
    translator.start_detection().unwrap();
    (translator, camera)
}

fn letters(translator: &Translator<CountingCamera, ScriptedSource>) -> Vec<Letter> {
    translator.history().letters().collect()
}

fn left(flags: [bool; 5]) -> Option<unmute_shared::HandObservation> {
    Some(hand(flags, Handedness::Left, 0.9))
}

#[test]
fn test_state_transitions() {
    let (mut translator, camera) = translator(ScriptedSource::default());
    assert_eq!(translator.state(), TranslatorState::Idle);

    translator.start_camera().unwrap();
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
    assert_eq!(camera.open_streams(), 1);

    translator.start_detection().unwrap();
    assert_eq!(translator.state(), TranslatorState::Detecting);

    translator.stop_detection();
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
    assert_eq!(camera.open_streams(), 1);

    translator.stop_camera();
    assert_eq!(translator.state(), TranslatorState::Idle);
    assert_eq!(camera.open_streams(), 0);
}

#[test]
fn test_start_detection_needs_camera() {
    let (mut translator, _) = translator(ScriptedSource::default());
    let err = translator.start_detection().unwrap_err();

    assert_eq!(
        err.downcast_ref::<TranslatorError>(),
        Some(&TranslatorError::NoCameraStream)
    );
    assert_eq!(translator.state(), TranslatorState::Idle);
}

#[test]
fn test_model_failure_blocks_detection_for_good() {
    let camera = CountingCamera::default();
    let model: Result<ScriptedSource> = Err(anyhow!("webgl backend unavailable"));
    let mut translator = Translator::new(camera, model, settings()).unwrap();

    assert!(!translator.is_model_ready());
    assert_eq!(translator.last_error(), Some(MODEL_INIT_ERROR));

    // The camera still works, but the model error stays visible
    translator.start_camera().unwrap();
    assert_eq!(translator.last_error(), Some(MODEL_INIT_ERROR));

    for _ in 0..3 {
        let err = translator.start_detection().unwrap_err();
        assert_eq!(
            err.downcast_ref::<TranslatorError>(),
            Some(&TranslatorError::ModelUnavailable)
        );
    }
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
}

#[test]
fn test_camera_failure_can_be_retried() {
    let camera = CountingCamera::failing(1);
    let mut translator =
        Translator::new(camera.clone(), Ok(ScriptedSource::default()), settings()).unwrap();

    let err = translator.start_camera().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TranslatorError>(),
        Some(TranslatorError::CameraUnavailable(_))
    ));
    assert_eq!(translator.last_error(), Some(CAMERA_ERROR));
    assert_eq!(translator.state(), TranslatorState::Idle);

    translator.start_camera().unwrap();
    assert_eq!(translator.last_error(), None);
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
    assert_eq!(camera.open_streams(), 1);
}

#[test]
fn test_stop_camera_while_detecting_releases_stream() {
    let (mut translator, camera) = detecting(ScriptedSource::default());
    translator.stop_camera();

    assert_eq!(translator.state(), TranslatorState::Idle);
    assert!(!translator.is_camera_active());
    assert_eq!(camera.open_streams(), 0);
    assert!(translator.step().is_none());
}

#[test]
fn test_dropping_translator_releases_stream() {
    let (translator, camera) = detecting(ScriptedSource::default());
    assert_eq!(camera.open_streams(), 1);
    drop(translator);
    assert_eq!(camera.open_streams(), 0);
}

#[test]
fn test_toggle_detection() {
    let (mut translator, _) = translator(ScriptedSource::default());

    translator.toggle_detection().unwrap();
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
    translator.toggle_detection().unwrap();
    assert_eq!(translator.state(), TranslatorState::Detecting);
    translator.toggle_detection().unwrap();
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
}

#[test]
fn test_run_builds_deduplicated_history() -> Result<()> {
    let source = ScriptedSource::hands([
        left(THUMB),
        left(THUMB),
        None,
        left(THUMB),
        left(ALL),
        left(PEACE),
        left([true, false, false, false, true]),
    ]);
    let (mut translator, _) = detecting(source);

    let mut appended = 0;
    let frames = translator.run(Some(7), |_, report| {
        if matches!(
            report.outcome,
            unmute_gesture::FrameOutcome::Recognized { appended: true, .. }
        ) {
            appended += 1;
        }
        Ok(())
    })?;

    assert_eq!(frames, 7);
    assert_eq!(appended, 4);
    assert_eq!(letters(&translator), [Letter::A, Letter::B, Letter::V, Letter::Y]);
    assert_eq!(translator.current().map(|e| e.letter), Some(Letter::Y));
    // Frame timestamps come from the capture
    assert_eq!(translator.history().last().map(|e| e.timestamp_ms), Some(7 * 16));
    assert_eq!(translator.state(), TranslatorState::Detecting);
    Ok(())
}

#[test]
fn test_no_hand_clears_current_and_badge() -> Result<()> {
    let source = ScriptedSource::hands([Some(hand(ALL, Handedness::Right, 0.9)), None]);
    let (mut translator, _) = detecting(source);

    translator.run(Some(1), |_, _| Ok(()))?;
    assert_eq!(translator.current().map(|e| e.letter), Some(Letter::B));
    assert_eq!(translator.detected_hand(), Some(Handedness::Right));

    translator.run(Some(1), |_, _| Ok(()))?;
    assert!(translator.current().is_none());
    assert!(translator.detected_hand().is_none());
    assert_eq!(letters(&translator), [Letter::B]);
    Ok(())
}

#[test]
fn test_detection_error_does_not_stop_the_loop() -> Result<()> {
    let source = ScriptedSource::new([
        Ok(vec![hand(THUMB, Handedness::Left, 0.9)]),
        Err(anyhow!("inference timed out")),
        Ok(vec![hand(ALL, Handedness::Left, 0.9)]),
    ]);
    let (mut translator, _) = detecting(source);

    let mut reports = 0;
    let frames = translator.run(Some(3), |_, _| {
        reports += 1;
        Ok(())
    })?;

    assert_eq!(frames, 3);
    assert_eq!(reports, 2);
    assert_eq!(letters(&translator), [Letter::A, Letter::B]);
    assert_eq!(translator.state(), TranslatorState::Detecting);
    Ok(())
}

#[test]
fn test_stop_during_inference_discards_late_result() -> Result<()> {
    let stop = StopSignal::new();
    let source = ScriptedSource::hands([left(THUMB), left(ALL), left(PEACE)])
        .stop_during_call(2, stop.clone());
    let (translator, _) = detecting(source);
    let mut translator = translator.with_stop_signal(stop.clone());

    let frames = translator.run(None, |_, _| Ok(()))?;

    assert_eq!(frames, 2);
    assert_eq!(letters(&translator), [Letter::A]);
    assert_eq!(translator.state(), TranslatorState::CameraOnly);

    // Nothing more is appended once the stop has completed
    assert!(translator.step().is_none());
    assert_eq!(letters(&translator), [Letter::A]);
    Ok(())
}

#[test]
fn test_detection_restarts_after_stop() -> Result<()> {
    let source = ScriptedSource::hands([left(THUMB), left(ALL)]);
    let (mut translator, _) = detecting(source);

    translator.stop_signal().stop();
    assert_eq!(translator.run(None, |_, _| Ok(()))?, 0);
    assert_eq!(translator.state(), TranslatorState::CameraOnly);

    translator.start_detection()?;
    assert!(!translator.stop_signal().is_stopped());
    let frames = translator.run(Some(2), |_, _| Ok(()))?;

    assert_eq!(frames, 2);
    assert_eq!(letters(&translator), [Letter::A, Letter::B]);
    assert_eq!(translator.state(), TranslatorState::Detecting);
    Ok(())
}

#[test]
fn test_toggle_resumes_after_stop() -> Result<()> {
    let (mut translator, _) = detecting(ScriptedSource::hands([left(PEACE)]));
    translator.stop_signal().stop();
    translator.run(None, |_, _| Ok(()))?;

    translator.toggle_detection()?;
    assert_eq!(translator.state(), TranslatorState::Detecting);
    assert!(translator.step().is_some());
    assert_eq!(letters(&translator), [Letter::V]);
    Ok(())
}

#[test]
fn test_stop_from_another_thread() -> Result<()> {
    let (translator, _) = detecting(ScriptedSource::default());
    let mut translator = translator;
    let stop = translator.stop_signal();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        stop.stop();
    });

    translator.run(None, |_, _| Ok(()))?;
    stopper.join().unwrap();
    assert_eq!(translator.state(), TranslatorState::CameraOnly);
    assert!(translator.is_camera_active());
    Ok(())
}

#[test]
fn test_lowering_threshold_releases_suppressed_letter() -> Result<()> {
    let weak = || Some(hand(THUMB, Handedness::Left, 0.8));
    let (mut translator, _) = detecting(ScriptedSource::hands([weak(), weak()]));
    translator.set_confidence_threshold(0.9)?;

    translator.run(Some(1), |_, _| Ok(()))?;
    assert!(translator.history().is_empty());
    assert!(translator.current().is_none());

    translator.set_confidence_threshold(0.5)?;
    translator.run(Some(1), |_, _| Ok(()))?;
    assert_eq!(letters(&translator), [Letter::A]);
    assert_eq!(translator.settings().confidence_threshold, 0.5);
    Ok(())
}

#[test]
fn test_invalid_threshold_is_rejected() {
    let (mut translator, _) = translator(ScriptedSource::default());
    let err = translator.set_confidence_threshold(0.05).unwrap_err();

    assert_eq!(
        err.downcast_ref::<TranslatorError>(),
        Some(&TranslatorError::InvalidThreshold(0.05))
    );
    assert_eq!(translator.confidence_threshold(), 0.7);
}

#[test]
fn test_invalid_settings_are_rejected() {
    let settings = TranslatorSettings {
        confidence_threshold: 1.5,
        ..TranslatorSettings::default()
    };
    let result = Translator::new(CountingCamera::default(), Ok(ScriptedSource::default()), settings);
    assert!(result.is_err());
}

#[test]
fn test_history_stays_bounded() -> Result<()> {
    let patterns = [THUMB, ALL, PEACE];
    let source = ScriptedSource::hands((0..200).map(|i| left(patterns[i % patterns.len()])));
    let (mut translator, _) = detecting(source);

    translator.run(Some(200), |translator, _| {
        assert!(translator.history().len() <= HISTORY_CAPACITY);
        Ok(())
    })?;
    assert_eq!(translator.history().len(), HISTORY_CAPACITY);
    Ok(())
}

#[test]
fn test_show_landmarks_toggle() {
    let (mut translator, _) = translator(ScriptedSource::default());
    assert!(translator.show_landmarks());
    translator.set_show_landmarks(false);
    assert!(!translator.show_landmarks());
}

#[test]
fn test_status_line() -> Result<()> {
    let (mut translator, _) = detecting(ScriptedSource::hands([
        left(THUMB),
        Some(hand(ALL, Handedness::Left, 0.92)),
    ]));
    assert_eq!(translator.status_line(), "current: - | history: [] | no hand");

    translator.run(Some(2), |_, _| Ok(()))?;
    assert_eq!(
        translator.status_line(),
        "current: B (92%) | history: [A B] | Left hand"
    );
    Ok(())
}

#[test]
fn test_replay_through_blank_camera() -> Result<()> {
    use unmute_client::{BlankCamera, ReplayLandmarkSource};

    let source = ReplayLandmarkSource::from_frames([
        vec![hand(PEACE, Handedness::Left, 0.85)],
        vec![],
        vec![hand(PEACE, Handedness::Left, 0.85)],
        vec![hand(THUMB, Handedness::Right, 0.75)],
    ]);
    let mut translator = Translator::new(BlankCamera, Ok(source), settings())?;
    translator.start_camera()?;
    translator.start_detection()?;

    translator.run(Some(4), |_, report| {
        assert_eq!((report.frame.width, report.frame.height), (640, 480));
        Ok(())
    })?;

    let history: Vec<Letter> = translator.history().letters().collect();
    assert_eq!(history, [Letter::V, Letter::A]);
    Ok(())
}
