//! OpenCV back-end for the hand overlay and the text HUD

use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
};
use unmute_shared::overlay::{HandOverlay, Rgb, KEYPOINT_RADIUS, LINE_WIDTH, OUTLINE_COLOR};
use unmute_shared::Position;

fn bgr(color: Rgb) -> Scalar {
    Scalar::new(color.b as f64, color.g as f64, color.r as f64, 0.0)
}

fn point(position: &Position) -> Point {
    Point::new(position.x as i32, position.y as i32)
}

/// Draw the skeleton, then the keypoints on top (filled, white outline)
pub fn draw_hand(frame: &mut Mat, overlay: &HandOverlay) -> Result<()> {
    let color = bgr(overlay.color);
    let radius = KEYPOINT_RADIUS as i32;
    let thickness = LINE_WIDTH as i32;

    for (start, end) in &overlay.segments {
        imgproc::line(frame, point(start), point(end), color, thickness, imgproc::LINE_8, 0)?;
    }

    for position in &overlay.points {
        imgproc::circle(frame, point(position), radius, color, -1, imgproc::LINE_8, 0)?;
        imgproc::circle(
            frame,
            point(position),
            radius,
            bgr(OUTLINE_COLOR),
            thickness,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(())
}

/// Write lines of text top-left, one per 30px row
pub fn draw_text_lines(frame: &mut Mat, lines: &[String]) -> Result<()> {
    for (i, text) in lines.iter().enumerate() {
        imgproc::put_text(
            frame,
            text,
            Point::new(10, 30 + 30 * i as i32),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.8,
            Scalar::new(255.0, 255.0, 255.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )?;
    }
    Ok(())
}
