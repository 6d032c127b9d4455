//! # Image buffers and views

use crate::prelude::v1::*;
use nalgebra as na;

/// Integer pixel position in source-image coordinates.
pub type Pos = na::Point2<i32>;

/// Pixel format of an image buffer.
///
/// `Yuv420Sp` is the semi-planar video format: a full-resolution luminance plane followed by
/// an interleaved half-resolution chrominance plane.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    #[default]
    Gray,
    Bgr,
    Yuv420Sp,
}

impl Format {
    /// Number of bytes per pixel in the packed part of the buffer.
    ///
    /// For `Yuv420Sp` this is the luminance plane only; the chrominance plane adds another
    /// half byte per pixel on top.
    pub fn channels(self) -> usize {
        match self {
            Format::Gray | Format::Yuv420Sp => 1,
            Format::Bgr => 3,
        }
    }
}

/// Logical dimensions of an image.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dims {
    pub width: usize,
    pub height: usize,
}

impl Dims {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// Get the number of bytes of data that an image requires, given its format and dimensions.
pub fn num_bytes(format: Format, dims: Dims) -> Result<usize> {
    let px = dims.width * dims.height;

    Ok(match format {
        Format::Gray => px,
        Format::Bgr => px * 3,
        Format::Yuv420Sp => {
            if dims.width % 2 != 0 || dims.height % 2 != 0 {
                bail!(
                    "YUV 4:2:0 SP requires even dimensions, got {}x{}",
                    dims.width,
                    dims.height
                );
            }
            px + px / 2
        }
    })
}

/// Owned pixel buffer tagged with a pixel format and logical dimensions.
///
/// The buffer length is always exactly [`num_bytes`]`(format, dims)`. Storage is reused on
/// [`resize`](Image::resize) whenever capacity allows, and [`swap`](Image::swap) exchanges
/// ownership between two buffers in constant time.
#[derive(Clone, Default)]
pub struct Image {
    data: Vec<u8>,
    format: Format,
    dims: Dims,
}

impl Image {
    /// Create a zero-filled image.
    pub fn new(format: Format, dims: Dims) -> Result<Self> {
        let mut img = Self::default();
        img.resize(format, dims)?;
        Ok(img)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy external bytes into the internally owned buffer.
    ///
    /// Fails when the supplied byte count does not match the expected size for the declared
    /// format and dimensions.
    pub fn assign(&mut self, format: Format, dims: Dims, data: &[u8]) -> Result<()> {
        let bytes = num_bytes(format, dims)?;

        if data.len() != bytes {
            bail!(
                "assign: expected {} bytes for {:?} {}x{}, got {}",
                bytes,
                format,
                dims.width,
                dims.height,
                data.len()
            );
        }

        self.data.clear();
        self.data.extend_from_slice(data);
        self.format = format;
        self.dims = dims;
        Ok(())
    }

    /// Change format and dimensions, reallocating only if capacity is insufficient.
    ///
    /// New bytes are zeroed; existing bytes are left as-is.
    pub fn resize(&mut self, format: Format, dims: Dims) -> Result<()> {
        let bytes = num_bytes(format, dims)?;
        self.data.resize(bytes, 0);
        self.format = format;
        self.dims = dims;
        Ok(())
    }

    /// Exchange ownership of the pixel data with another image in constant time.
    pub fn swap(&mut self, other: &mut Image) {
        std::mem::swap(self, other);
    }

    /// Borrow the whole image as a region.
    ///
    /// Only packed formats can be viewed this way; use [`gray_view`](Image::gray_view) to
    /// access the luminance of a `Yuv420Sp` image.
    pub fn view(&self) -> Result<Region> {
        if self.format == Format::Yuv420Sp {
            bail!("view: planar images must be viewed per plane");
        }
        Region::new(
            self.format,
            Pos::new(0, 0),
            self.dims,
            self.dims.width * self.format.channels(),
            &self.data,
        )
    }

    /// Borrow a grayscale view of the image.
    ///
    /// For `Gray` this is the whole buffer, for `Yuv420Sp` the luminance plane. `Bgr` images
    /// have no single-channel interpretation and fail.
    pub fn gray_view(&self) -> Result<Region> {
        match self.format {
            Format::Gray => self.view(),
            Format::Yuv420Sp => Region::new(
                Format::Gray,
                Pos::new(0, 0),
                self.dims,
                self.dims.width,
                &self.data[..self.dims.width * self.dims.height],
            ),
            Format::Bgr => bail!("gray_view: not a single-channel image"),
        }
    }

    /// Borrow the interleaved chrominance plane of a `Yuv420Sp` image.
    ///
    /// The plane has half the height of the image; rows interleave U and V at half the
    /// horizontal resolution.
    pub fn chroma_data(&self) -> Result<&[u8]> {
        if self.format != Format::Yuv420Sp {
            bail!("chroma_data: not a planar image");
        }
        Ok(&self.data[self.dims.width * self.dims.height..])
    }
}

/// Non-owning sub-view of an image buffer.
///
/// A region decouples the row stride from the width, may only shrink relative to the buffer
/// it views, and never owns memory.
#[derive(Clone, Copy)]
pub struct Region<'a> {
    format: Format,
    pos: Pos,
    dims: Dims,
    row_stride: usize,
    data: &'a [u8],
}

impl<'a> Region<'a> {
    /// Wrap a byte slice as a region.
    ///
    /// The slice must cover all addressed rows. Planar formats cannot be wrapped; wrap their
    /// planes individually instead.
    pub fn new(
        format: Format,
        pos: Pos,
        dims: Dims,
        row_stride: usize,
        data: &'a [u8],
    ) -> Result<Self> {
        if format == Format::Yuv420Sp {
            bail!("region: planar formats are viewed per plane");
        }

        let row_bytes = dims.width * format.channels();
        if row_bytes > row_stride {
            bail!("region: row stride {} shorter than row", row_stride);
        }
        if dims.height > 0 && (dims.height - 1) * row_stride + row_bytes > data.len() {
            bail!("region: backing slice too short");
        }

        Ok(Self {
            format,
            pos,
            dims,
            row_stride,
            data,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Reduce the logical dimensions of the view.
    ///
    /// Fails if asked to grow past the originating extent.
    pub fn shrink(&mut self, dims: Dims) -> Result<()> {
        if dims.width > self.dims.width || dims.height > self.dims.height {
            bail!("a region must not grow in size");
        }
        self.dims = dims;
        Ok(())
    }

    /// Borrow one row of pixels.
    pub fn row(&self, y: usize) -> &'a [u8] {
        let row_bytes = self.dims.width * self.format.channels();
        let start = y * self.row_stride;
        &self.data[start..start + row_bytes]
    }
}

/// Copy one image into another, reusing the destination buffer.
pub fn copy(src: &Image, dst: &mut Image) -> Result<()> {
    dst.resize(src.format(), src.dims())?;
    dst.data_mut().copy_from_slice(src.data());
    Ok(())
}

fn bgr_to_gray(b: u8, g: u8, r: u8) -> u8 {
    // BT.601 luminance
    ((114 * b as u32 + 587 * g as u32 + 299 * r as u32 + 500) / 1000) as u8
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Convert an image to the given format, reusing the destination buffer.
///
/// Supported conversions are `Bgr` ↔ `Gray`, `Yuv420Sp` → `Gray` and `Yuv420Sp` → `Bgr`;
/// converting to the source format is a plain copy. Anything else is an unsupported format
/// error. BT.601 coefficients are used throughout.
pub fn convert(src: &Image, dst: &mut Image, format: Format) -> Result<()> {
    if src.format() == format {
        return copy(src, dst);
    }

    let dims = src.dims();
    dst.resize(format, dims)?;

    match (src.format(), format) {
        (Format::Bgr, Format::Gray) => {
            for (out, px) in dst
                .data_mut()
                .iter_mut()
                .zip(src.data().chunks_exact(3))
            {
                *out = bgr_to_gray(px[0], px[1], px[2]);
            }
        }
        (Format::Gray, Format::Bgr) => {
            for (out, v) in dst
                .data_mut()
                .chunks_exact_mut(3)
                .zip(src.data().iter())
            {
                out.fill(*v);
            }
        }
        (Format::Yuv420Sp, Format::Gray) => {
            let luma = &src.data()[..dims.width * dims.height];
            dst.data_mut().copy_from_slice(luma);
        }
        (Format::Yuv420Sp, Format::Bgr) => {
            let luma = &src.data()[..dims.width * dims.height];
            let chroma = src.chroma_data()?;

            for y in 0..dims.height {
                let crow = &chroma[(y / 2) * dims.width..];
                for x in 0..dims.width {
                    let l = luma[y * dims.width + x] as i32;
                    // NV21 ordering: V before U
                    let v = crow[(x / 2) * 2] as i32 - 128;
                    let u = crow[(x / 2) * 2 + 1] as i32 - 128;

                    let out = &mut dst.data_mut()[(y * dims.width + x) * 3..][..3];
                    out[0] = clamp_u8(l + (1772 * u) / 1000);
                    out[1] = clamp_u8(l - (344 * u + 714 * v) / 1000);
                    out[2] = clamp_u8(l + (1402 * v) / 1000);
                }
            }
        }
        (from, to) => bail!("convert: unsupported conversion {:?} -> {:?}", from, to),
    }

    Ok(())
}
