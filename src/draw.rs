//! Rendering of detected hands: saved visualizations and the live recording preview.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector},
    highgui, imgcodecs, imgproc,
    prelude::*,
};

use crate::{
    frame::{Frame, FrameSize},
    landmark::{Handedness, HandLandmarks},
    pipeline::ProcessedFrame,
    recorder::{RecordingControl, RecordingMonitor, RecordingProgress},
    skeleton,
    video::MatFrame,
};

// BGR
const GREEN: (f64, f64, f64) = (0., 255., 0.);
const RED: (f64, f64, f64) = (0., 0., 255.);
const WHITE: (f64, f64, f64) = (255., 255., 255.);

const BONE_THICKNESS: i32 = 2;
const JOINT_RADIUS: i32 = 4;

const RECORDING_WINDOW: &str = "Recording - press q to abort";
const ZOOM_WINDOW: &str = "Zoom (hands)";
const ZOOM_MARGIN: i32 = 40;
const ZOOM_SIZE: i32 = 320;

fn scalar((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.)
}

fn draw_hand(image: &mut Mat, hand: &HandLandmarks, size: FrameSize, color: Scalar) -> Result<()> {
    for (start, end) in skeleton::bones(hand, size) {
        imgproc::line(
            image,
            Point::new(start.0, start.1),
            Point::new(end.0, end.1),
            color,
            BONE_THICKNESS,
            imgproc::LINE_8,
            0,
        )?;
    }

    for (x, y) in skeleton::pixel_positions(hand, size).iter() {
        imgproc::circle(
            image,
            Point::new(*x, *y),
            JOINT_RADIUS,
            color,
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(())
}

/// Draws every detected hand in green on a black canvas the size of the frame.
pub fn render_skeletons(processed: &ProcessedFrame<MatFrame>) -> Result<Mat> {
    let size = processed.frame.size();
    let mut canvas = Mat::new_rows_cols_with_default(
        size.height as i32,
        size.width as i32,
        core::CV_8UC3,
        Scalar::all(0.),
    )?;

    if let Some(detection) = &processed.detection {
        for hand in detection.hands() {
            draw_hand(&mut canvas, hand, size, scalar(GREEN))?;
        }
    }

    Ok(canvas)
}

pub fn save_visualization(path: &Path, processed: &ProcessedFrame<MatFrame>) -> Result<()> {
    let canvas = render_skeletons(processed)?;
    let path_str = path
        .to_str()
        .with_context(|| format!("non UTF-8 output path {:?}", path))?;

    if !imgcodecs::imwrite(path_str, &canvas, &Vector::new())? {
        bail!("Failed to write {}", path.display());
    }
    Ok(())
}

/// OpenCV windows showing the camera with colored hands and a zoom on the hands.
///
/// Pressing `q` aborts the current sample.
#[derive(Default)]
pub struct PreviewWindow {
    zoom_open: bool,
}

impl PreviewWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&mut self) -> Result<()> {
        highgui::destroy_all_windows()?;
        self.zoom_open = false;
        Ok(())
    }

    fn show_zoom(&mut self, display: &Mat, hands: &[HandLandmarks], size: FrameSize) -> Result<()> {
        match skeleton::landmark_bounds(hands, size, ZOOM_MARGIN) {
            Some(bounds) => {
                let roi = Mat::roi(
                    display,
                    Rect::new(bounds.x, bounds.y, bounds.width, bounds.height),
                )?
                .try_clone()?;

                let mut zoom = Mat::default();
                imgproc::resize(
                    &roi,
                    &mut zoom,
                    Size::new(ZOOM_SIZE, ZOOM_SIZE),
                    0.,
                    0.,
                    imgproc::INTER_LINEAR,
                )?;
                highgui::imshow(ZOOM_WINDOW, &zoom)?;
                self.zoom_open = true;
            }
            None if self.zoom_open => {
                highgui::destroy_window(ZOOM_WINDOW)?;
                self.zoom_open = false;
            }
            None => {}
        }

        Ok(())
    }
}

impl RecordingMonitor<MatFrame> for PreviewWindow {
    fn show(
        &mut self,
        processed: &ProcessedFrame<MatFrame>,
        progress: RecordingProgress,
    ) -> Result<RecordingControl> {
        let size = processed.frame.size();
        let mut display = processed.frame.as_mat().try_clone()?;
        let hands = processed
            .detection
            .as_ref()
            .map_or(&[][..], |detection| detection.hands());

        for hand in hands {
            let color = match hand.handedness() {
                Handedness::Left => GREEN,
                Handedness::Right => RED,
            };
            draw_hand(&mut display, hand, size, scalar(color))?;
        }

        imgproc::put_text(
            &mut display,
            &format!("Recording: {}/{}", progress.captured, progress.total),
            Point::new(10, 30),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.8,
            scalar(WHITE),
            2,
            imgproc::LINE_8,
            false,
        )?;

        highgui::imshow(RECORDING_WINDOW, &display)?;
        self.show_zoom(&display, hands, size)?;

        if highgui::wait_key(1)? & 0xFF == i32::from(b'q') {
            info!("User requested abort");
            return Ok(RecordingControl::Abort);
        }

        Ok(RecordingControl::Continue)
    }
}
