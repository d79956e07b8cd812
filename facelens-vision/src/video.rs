use anyhow::{Context, Result};
use image::RgbImage;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::geometry::Size;

/// One captured frame, always RGB8.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub sequence: u32,
}

impl Frame {
    pub fn size(&self) -> Size {
        Size::from(self.image.dimensions())
    }
}

/// Anything that produces frames for the streaming path.
pub trait FrameSource {
    /// `Ok(None)` ends the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

pub struct Camera {
    stream: Stream<'static>,
    width: u32,
    height: u32,
    fourcc: FourCC,
}

impl Camera {
    pub fn open(device: &str) -> Result<Self> {
        let dev = Device::with_path(device).with_context(|| format!("open camera {}", device))?;
        let mut fmt = dev.format().context("get format")?;
        // Prefer RGB, then YUYV, else keep whatever the driver offers
        let rgb = Format::new(fmt.width, fmt.height, FourCC::new(b"RGB3"));
        fmt = dev.set_format(&rgb).unwrap_or(fmt);
        if fmt.fourcc != FourCC::new(b"RGB3") {
            let yuyv = Format::new(fmt.width, fmt.height, FourCC::new(b"YUYV"));
            fmt = dev.set_format(&yuyv).unwrap_or(fmt);
        }
        log::info!(
            "camera {}: {}x{} {:?}",
            device,
            fmt.width,
            fmt.height,
            fmt.fourcc
        );
        let stream = Stream::with_buffers(&dev, Type::VideoCapture, 4).context("stream")?;
        Ok(Self {
            stream,
            width: fmt.width,
            height: fmt.height,
            fourcc: fmt.fourcc,
        })
    }

    pub fn frame_size(&self) -> Size {
        Size::from((self.width, self.height))
    }

    pub fn frame(&mut self) -> Result<Frame> {
        let (data, meta) = self.stream.next().context("capture frame")?;
        let sequence = meta.sequence;
        let rgb = match &self.fourcc.repr {
            b"RGB3" => data.to_vec(),
            b"YUYV" => yuyv_to_rgb(self.width, self.height, data)?,
            b"GREY" => grey_to_rgb(self.width, self.height, data)?,
            other => anyhow::bail!(
                "unsupported pixel format {}",
                String::from_utf8_lossy(other)
            ),
        };
        let image = RgbImage::from_raw(self.width, self.height, rgb).ok_or_else(|| {
            anyhow::anyhow!(
                "frame {} too small for {}x{}",
                sequence,
                self.width,
                self.height
            )
        })?;
        Ok(Frame { image, sequence })
    }
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.frame().map(Some)
    }
}

fn yuyv_to_rgb(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>> {
    let pixels = (width * height) as usize;
    if data.len() < pixels * 2 {
        anyhow::bail!("short YUYV buffer: {} < {}", data.len(), pixels * 2);
    }
    let mut out = Vec::with_capacity(pixels * 3);
    for chunk in data[..pixels * 2].chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for y in [chunk[0] as f32, chunk[2] as f32] {
            out.extend([
                to_u8(y + 1.402 * v),
                to_u8(y - 0.344136 * u - 0.714136 * v),
                to_u8(y + 1.772 * u),
            ]);
        }
    }
    Ok(out)
}

fn to_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

fn grey_to_rgb(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>> {
    let pixels = (width * height) as usize;
    if data.len() < pixels {
        anyhow::bail!("short GREY buffer: {} < {}", data.len(), pixels);
    }
    Ok(data[..pixels].iter().flat_map(|&y| [y, y, y]).collect())
}
