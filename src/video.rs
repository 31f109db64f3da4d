//! OpenCV-backed frames, video files and cameras.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use opencv::{
    core::{Mat, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::{
    detector::EncodeJpeg,
    frame::{Frame, FrameReader, FrameSize, VideoSource},
};

/// A BGR frame held in an OpenCV `Mat`.
pub struct MatFrame(Mat);

impl MatFrame {
    pub fn new(mat: Mat) -> Self {
        MatFrame(mat)
    }

    pub fn as_mat(&self) -> &Mat {
        &self.0
    }
}

impl Frame for MatFrame {
    fn size(&self) -> FrameSize {
        FrameSize::new(self.0.cols().max(0) as u32, self.0.rows().max(0) as u32)
    }

    fn resized(&self, size: FrameSize) -> Result<Self> {
        let mut resized = Mat::default();
        imgproc::resize(
            &self.0,
            &mut resized,
            Size::new(size.width as i32, size.height as i32),
            0.,
            0.,
            imgproc::INTER_LINEAR,
        )
        .context("resizing frame")?;

        Ok(MatFrame(resized))
    }
}

impl EncodeJpeg for MatFrame {
    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vector::<u8>::new();
        let params =
            Vector::<i32>::from_slice(&[imgcodecs::IMWRITE_JPEG_QUALITY, i32::from(quality)]);

        if !imgcodecs::imencode(".jpg", &self.0, &mut buffer, &params)? {
            bail!("JPEG encoding failed");
        }

        Ok(buffer.to_vec())
    }
}

fn read_frame(capture: &mut VideoCapture) -> Result<Option<MatFrame>> {
    let mut mat = Mat::default();
    if !capture.read(&mut mat)? || mat.cols() == 0 || mat.rows() == 0 {
        return Ok(None);
    }
    Ok(Some(MatFrame(mat)))
}

/// An opened video file. The decoder is released when this is dropped.
pub struct VideoFile {
    capture: VideoCapture,
    frame_count: usize,
    path: PathBuf,
}

impl VideoFile {
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .with_context(|| format!("non UTF-8 video path {:?}", path))?;

        let capture = VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("opening video {}", path.display()))?;
        if !capture.is_opened()? {
            bail!("Could not open video {}", path.display());
        }

        // Unknown or bogus counts come back as 0 or negative.
        let reported = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let frame_count = if reported.is_finite() && reported > 0. {
            reported as usize
        } else {
            0
        };
        debug!("Opened {} ({} frames)", path.display(), frame_count);

        Ok(VideoFile {
            capture,
            frame_count,
            path: path.to_path_buf(),
        })
    }
}

impl FrameReader for VideoFile {
    type Frame = MatFrame;

    fn read_next(&mut self) -> Result<Option<MatFrame>> {
        read_frame(&mut self.capture)
    }
}

impl VideoSource for VideoFile {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_at(&mut self, index: usize) -> Result<Option<MatFrame>> {
        if !self
            .capture
            .set(videoio::CAP_PROP_POS_FRAMES, index as f64)?
        {
            debug!("Seeking to frame {} of {} failed", index, self.path.display());
        }
        read_frame(&mut self.capture)
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            warn!("Failed to release {}: {}", self.path.display(), err);
        }
    }
}

/// A live camera by device index.
pub struct Camera {
    capture: VideoCapture,
    index: i32,
}

impl Camera {
    pub fn open(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .with_context(|| format!("opening camera {}", index))?;
        if !capture.is_opened()? {
            bail!("Cannot open camera index {}", index);
        }

        Ok(Camera { capture, index })
    }
}

impl FrameReader for Camera {
    type Frame = MatFrame;

    fn read_next(&mut self) -> Result<Option<MatFrame>> {
        read_frame(&mut self.capture)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            warn!("Failed to release camera {}: {}", self.index, err);
        }
    }
}
