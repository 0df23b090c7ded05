//! H.264 video writing using FFmpeg
//!
//! Composited RGBA frames are converted to YUV420P, encoded with the
//! container's H.264 encoder and interleaved into the output file. PTS is a
//! plain frame counter in a `1/fps` timebase.

use crate::video_reader::init_ffmpeg;
use crate::{Error, Result};
use ffmpeg_next as ffmpeg;
use image::RgbaImage;
use std::path::Path;

/// Video writer that encodes RGBA frames into an output container
pub struct VideoWriter {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    /// Encoder timebase, `1/fps`
    frame_tb: ffmpeg::Rational,
    /// Muxer-assigned stream timebase, read back after the header is written
    stream_tb: ffmpeg::Rational,
    width: u32,
    height: u32,
    next_pts: i64,
    finished: bool,
}

impl VideoWriter {
    /// Creates the output file and opens an H.264 encoder for it.
    ///
    /// `fps` is the nominal frame rate as a rational `(numerator,
    /// denominator)`, matching what [`crate::VideoReader::frame_rate`]
    /// reports for the source.
    pub fn create(path: &Path, width: u32, height: u32, fps: (u32, u32)) -> Result<Self> {
        init_ffmpeg();

        if width == 0 || height == 0 {
            return Err(Error::InvalidVideo(format!(
                "output dimensions must be non-zero, got {width}x{height}"
            )));
        }
        // YUV420P subsampling needs even dimensions.
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::InvalidVideo(format!(
                "H.264 output requires even dimensions, got {width}x{height}"
            )));
        }
        let (fps_num, fps_den) = fps;
        if fps_num == 0 || fps_den == 0 {
            return Err(Error::InvalidVideo(format!(
                "frame rate must be positive, got {fps_num}/{fps_den}"
            )));
        }

        let mut output = ffmpeg::format::output(&path)?;
        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::H264).ok_or(Error::NoEncoder)?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let frame_tb = ffmpeg::Rational::new(fps_den as i32, fps_num as i32);

        let opened = {
            let mut stream = output.add_stream(codec)?;

            let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
                .encoder()
                .video()?;
            encoder.set_width(width);
            encoder.set_height(height);
            encoder.set_format(ffmpeg::format::Pixel::YUV420P);
            encoder.set_time_base(frame_tb);
            encoder.set_frame_rate(Some(ffmpeg::Rational::new(fps_num as i32, fps_den as i32)));
            encoder.set_max_b_frames(0);
            if global_header {
                encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
            }

            let mut opts = ffmpeg::Dictionary::new();
            opts.set("crf", "18");
            opts.set("preset", "medium");

            let opened = encoder.open_as_with(codec, opts)?;
            stream.set_time_base(frame_tb);
            stream.set_parameters(&opened);
            opened
        };

        output.write_header()?;
        let stream_tb = output.stream(0).unwrap().time_base();

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::RGBA,
            width,
            height,
            ffmpeg::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            output,
            encoder: opened,
            scaler,
            frame_tb,
            stream_tb,
            width,
            height,
            next_pts: 0,
            finished: false,
        })
    }

    /// Encodes and muxes one RGBA frame
    pub fn write_frame(&mut self, image: &RgbaImage) -> Result<()> {
        if image.width() != self.width || image.height() != self.height {
            return Err(Error::InvalidVideo(format!(
                "frame size {}x{} does not match output {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }

        let mut rgba_frame = ffmpeg::util::frame::video::Video::new(
            ffmpeg::format::Pixel::RGBA,
            self.width,
            self.height,
        );

        // Copy RGBA pixels into the frame, respecting its row stride.
        {
            let stride = rgba_frame.stride(0);
            let dst = rgba_frame.data_mut(0);
            let src = image.as_raw();
            let row_bytes = self.width as usize * 4;
            for y in 0..self.height as usize {
                let src_off = y * row_bytes;
                let dst_off = y * stride;
                dst[dst_off..dst_off + row_bytes].copy_from_slice(&src[src_off..src_off + row_bytes]);
            }
        }

        let mut yuv_frame = ffmpeg::util::frame::video::Video::empty();
        self.scaler.run(&rgba_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&yuv_frame)?;
        self.drain_packets()
    }

    /// Flushes the encoder and writes the container trailer
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        self.encoder.send_eof()?;
        self.drain_packets()?;
        self.output.write_trailer()?;
        self.finished = true;
        Ok(())
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u64 {
        self.next_pts as u64
    }

    fn drain_packets(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(self.frame_tb, self.stream_tb);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }
}
