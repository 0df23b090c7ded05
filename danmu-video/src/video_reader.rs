//! Video reading and frame extraction using FFmpeg

use crate::{Error, Result};
use ffmpeg_next as ffmpeg;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::Path;
use std::sync::Once;

static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg (call once per application)
pub(crate) fn init_ffmpeg() {
    FFMPEG_INIT.call_once(|| {
        ffmpeg::init().expect("Failed to initialize FFmpeg");
    });
}

/// Video reader that extracts RGBA frames from video files
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
}

impl VideoReader {
    /// Opens a video file
    pub fn open(path: &Path) -> Result<Self> {
        init_ffmpeg();

        let input = ffmpeg::format::input(&path)?;

        // Find the video stream
        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;

        let video_stream_index = video_stream.index();

        // Create decoder
        let context = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context.decoder().video()?;

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            scaler: None,
        })
    }

    /// Gets the video width
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Gets the video height
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Gets the frame rate as a rational number (numerator, denominator)
    pub fn frame_rate(&self) -> (u32, u32) {
        let stream = self.input.stream(self.video_stream_index).unwrap();
        let rate = stream.rate();
        (rate.numerator() as u32, rate.denominator() as u32)
    }

    /// Gets the frame rate as a float
    pub fn fps(&self) -> f64 {
        let (num, den) = self.frame_rate();
        if den == 0 {
            0.0
        } else {
            num as f64 / den as f64
        }
    }

    /// Gets the total duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        let stream = self.input.stream(self.video_stream_index).unwrap();
        let duration = stream.duration();
        let time_base = stream.time_base();

        if duration > 0 {
            (duration as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
                * 1000.0) as u64
        } else {
            // Fallback to container duration
            let duration = self.input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64 * 1000.0;
            duration as u64
        }
    }

    /// Gets the total frame count, estimated from duration and frame rate
    /// when the stream does not declare it
    pub fn total_frames(&self) -> u64 {
        let stream = self.input.stream(self.video_stream_index).unwrap();
        let declared = stream.frames();
        if declared > 0 {
            return declared as u64;
        }

        ((self.duration_ms() as f64 / 1000.0) * self.fps()).ceil() as u64
    }

    /// Decodes the video one frame at a time, handing each RGBA frame to the
    /// callback in presentation order
    pub fn for_each_frame<F>(&mut self, mut handle: F) -> Result<()>
    where
        F: FnMut(usize, RgbaImage) -> Result<()>,
    {
        // Setup scaler for RGBA conversion
        if self.scaler.is_none() {
            self.scaler = Some(ffmpeg::software::scaling::Context::get(
                self.decoder.format(),
                self.decoder.width(),
                self.decoder.height(),
                ffmpeg::format::Pixel::RGBA,
                self.decoder.width(),
                self.decoder.height(),
                ffmpeg::software::scaling::Flags::BILINEAR,
            )?);
        }

        let scaler = self.scaler.as_mut().unwrap();
        let mut frame_index = 0usize;

        let mut receive_and_process_decoded_frames =
            |decoder: &mut ffmpeg::decoder::Video,
             scaler: &mut ffmpeg::software::scaling::Context,
             frame_index: &mut usize,
             handle: &mut F|
             -> Result<()> {
                let mut decoded = ffmpeg::frame::Video::empty();
                while decoder.receive_frame(&mut decoded).is_ok() {
                    let mut rgba_frame = ffmpeg::frame::Video::empty();
                    scaler.run(&decoded, &mut rgba_frame)?;

                    let image = rgba_to_image(&rgba_frame)?;
                    handle(*frame_index, image)?;
                    *frame_index += 1;
                }
                Ok(())
            };

        // Read packets and decode
        for (stream, packet) in self.input.packets() {
            if stream.index() == self.video_stream_index {
                self.decoder.send_packet(&packet)?;
                receive_and_process_decoded_frames(
                    &mut self.decoder,
                    scaler,
                    &mut frame_index,
                    &mut handle,
                )?;
            }
        }

        // Flush decoder
        self.decoder.send_eof()?;
        receive_and_process_decoded_frames(&mut self.decoder, scaler, &mut frame_index, &mut handle)?;

        Ok(())
    }
}

/// Converts a scaled RGBA ffmpeg frame into an image buffer, honoring the
/// frame's row stride
fn rgba_to_image(frame: &ffmpeg::frame::Video) -> Result<RgbaImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * 4;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let offset = y * stride;
        pixels.extend_from_slice(&data[offset..offset + row_bytes]);
    }

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, pixels)
        .ok_or_else(|| Error::InvalidVideo("decoded frame has unexpected size".into()))
}
