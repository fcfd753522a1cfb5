use unmute_gesture::{FrameOutcome, RecognitionSession};
use unmute_shared::overlay::{HandOverlay, KEYPOINT_RADIUS, LINE_WIDTH, OUTLINE_COLOR};
use unmute_shared::{parse_hands_line, HandObservation, TranslationEvent};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Recognition state for the browser widget.
///
/// The page runs the hand-pose model itself and feeds each frame's hands in
/// as JSON (an array of hands, the same shape the native client replays).
#[wasm_bindgen]
pub struct TranslatorSession {
    session: RecognitionSession,
    last_hand: Option<HandObservation>,
    show_landmarks: bool,
}

#[wasm_bindgen]
impl TranslatorSession {
    #[wasm_bindgen(constructor)]
    pub fn new(confidence_threshold: f32) -> Result<TranslatorSession, JsValue> {
        let mut session = RecognitionSession::new();
        session
            .set_threshold(confidence_threshold)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        console_log!(
            "Translator session ready, threshold {:.0}%",
            confidence_threshold * 100.0
        );
        Ok(TranslatorSession {
            session,
            last_hand: None,
            show_landmarks: true,
        })
    }

    /// Feed one frame's detected hands. Returns the letter appended to the
    /// history by this frame, if any.
    pub fn observe(&mut self, hands_json: &str, timestamp_ms: f64) -> Result<Option<String>, JsValue> {
        let hands =
            parse_hands_line(hands_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let hand = hands.into_iter().next();

        let outcome = self.session.observe(hand.as_ref(), timestamp_ms as u64);
        self.last_hand = hand;

        match outcome {
            FrameOutcome::Recognized {
                event,
                appended: true,
            } => {
                console_log!("Detected {} ({:.0}%)", event.letter, event.confidence * 100.0);
                Ok(Some(event.letter.to_string()))
            }
            _ => Ok(None),
        }
    }

    pub fn current_letter(&self) -> Option<String> {
        self.session.current().map(|e| e.letter.to_string())
    }

    pub fn current_confidence(&self) -> Option<f32> {
        self.session.current().map(|e| e.confidence)
    }

    /// "Left", "Right", or nothing while no hand is in view
    pub fn detected_hand(&self) -> Option<String> {
        self.session.detected_hand().map(|h| h.to_string())
    }

    /// History letters, oldest first
    pub fn history_text(&self) -> String {
        self.session.history().letters().map(|l| l.as_char()).collect()
    }

    /// History events as a JSON array
    pub fn history_json(&self) -> Result<String, JsValue> {
        let events: Vec<TranslationEvent> = self.session.history().iter().copied().collect();
        serde_json::to_string(&events).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.session.threshold()
    }

    pub fn set_confidence_threshold(&mut self, threshold: f32) -> Result<(), JsValue> {
        self.session
            .set_threshold(threshold)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn show_landmarks(&self) -> bool {
        self.show_landmarks
    }

    pub fn set_show_landmarks(&mut self, show: bool) {
        self.show_landmarks = show;
    }

    /// Drop the current letter and hand badge, e.g. when detection stops
    pub fn clear_current(&mut self) {
        self.session.clear_current();
        self.last_hand = None;
    }
}

/// Canvas laid over the video element
#[wasm_bindgen]
pub struct OverlayCanvas {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

#[wasm_bindgen]
impl OverlayCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, width: u32, height: u32) -> Result<OverlayCanvas, JsValue> {
        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        // Match the captured frame so keypoint pixels line up
        canvas.set_width(width);
        canvas.set_height(height);

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(OverlayCanvas { canvas, context })
    }

    /// Redraw the overlay for the session's latest hand
    pub fn render(&self, session: &TranslatorSession) -> Result<(), JsValue> {
        self.clear();

        if !session.show_landmarks {
            return Ok(());
        }
        if let Some(hand) = &session.last_hand {
            self.draw_hand(&HandOverlay::from_hand(hand))?;
        }
        Ok(())
    }

    pub fn clear(&self) {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        self.context.clear_rect(0.0, 0.0, width, height);
    }
}

impl OverlayCanvas {
    fn draw_hand(&self, overlay: &HandOverlay) -> Result<(), JsValue> {
        let color = overlay.color.hex();
        let ctx = &self.context;

        ctx.set_stroke_style_str(&color);
        ctx.set_line_width(LINE_WIDTH as f64);
        for (start, end) in &overlay.segments {
            ctx.begin_path();
            ctx.move_to(start.x as f64, start.y as f64);
            ctx.line_to(end.x as f64, end.y as f64);
            ctx.stroke();
        }

        ctx.set_fill_style_str(&color);
        ctx.set_stroke_style_str(&OUTLINE_COLOR.hex());
        for point in &overlay.points {
            ctx.begin_path();
            ctx.arc(
                point.x as f64,
                point.y as f64,
                KEYPOINT_RADIUS as f64,
                0.0,
                std::f64::consts::TAU,
            )?;
            ctx.fill();
            ctx.stroke();
        }

        Ok(())
    }
}
