//! # Per-pixel processing primitives
//!
//! The small set of image operations the detection pipeline composes: differencing,
//! thresholding, median background, nearest-neighbour upscale and debug drawing. All
//! operations reuse destination capacity.

use crate::prelude::v1::*;

fn expect_same(a: &Image, b: &Image, what: &str) -> Result<()> {
    if a.format() != b.format() || a.dims() != b.dims() {
        bail!("{}: format/dimension mismatch", what);
    }
    Ok(())
}

/// Per-byte absolute difference of two grayscale views into `dst`.
pub fn absdiff(a: &Region, b: &Region, dst: &mut Image) -> Result<()> {
    if a.format() != Format::Gray || b.format() != Format::Gray || a.dims() != b.dims() {
        bail!("absdiff: expected matching grayscale inputs");
    }

    let dims = a.dims();
    dst.resize(Format::Gray, dims)?;

    for y in 0..dims.height {
        let (ra, rb) = (a.row(y), b.row(y));
        let out = &mut dst.data_mut()[y * dims.width..][..dims.width];
        for x in 0..dims.width {
            out[x] = ra[x].abs_diff(rb[x]);
        }
    }

    Ok(())
}

/// In-place binarization: pixels strictly above `thresh` become 255, the rest 0.
pub fn threshold_gt(img: &mut Image, thresh: u8) -> Result<()> {
    if img.format() != Format::Gray {
        bail!("threshold_gt: expected a grayscale image");
    }

    for v in img.data_mut() {
        *v = if *v > thresh { 0xFF } else { 0x00 };
    }

    Ok(())
}

/// Per-byte bitwise OR of two binary masks into `dst`.
pub fn bitwise_or(a: &Image, b: &Image, dst: &mut Image) -> Result<()> {
    expect_same(a, b, "bitwise_or")?;
    dst.resize(a.format(), a.dims())?;

    for ((out, x), y) in dst.data_mut().iter_mut().zip(a.data()).zip(b.data()) {
        *out = x | y;
    }

    Ok(())
}

/// Per-pixel median of three grayscale views into `dst`.
pub fn median3(a: &Region, b: &Region, c: &Region, dst: &mut Image) -> Result<()> {
    if a.format() != Format::Gray
        || b.format() != Format::Gray
        || c.format() != Format::Gray
        || a.dims() != b.dims()
        || a.dims() != c.dims()
    {
        bail!("median3: expected matching grayscale inputs");
    }

    let dims = a.dims();
    dst.resize(Format::Gray, dims)?;

    for y in 0..dims.height {
        let (ra, rb, rc) = (a.row(y), b.row(y), c.row(y));
        let out = &mut dst.data_mut()[y * dims.width..][..dims.width];
        for x in 0..dims.width {
            let (vx, vy, vz) = (ra[x], rb[x], rc[x]);
            let (lo, hi) = (vx.min(vy).min(vz), vx.max(vy).max(vz));
            out[x] = (vx as u16 + vy as u16 + vz as u16 - lo as u16 - hi as u16) as u8;
        }
    }

    Ok(())
}

/// Downsample one packed plane by 2x, averaging each 2x2 block with rounding.
///
/// Output dimensions are halved with rounding down; a trailing odd row/column is ignored.
pub(crate) fn decimate_plane(src: &Region, dst: &mut [u8]) {
    let dims = src.dims();
    let ch = src.format().channels();
    let (w, h) = (dims.width / 2, dims.height / 2);

    for y in 0..h {
        let top = src.row(2 * y);
        let bot = src.row(2 * y + 1);
        let out = &mut dst[y * w * ch..][..w * ch];
        for x in 0..w {
            for c in 0..ch {
                let i = 2 * x * ch + c;
                let sum = top[i] as u16 + top[i + ch] as u16 + bot[i] as u16 + bot[i + ch] as u16;
                out[x * ch + c] = ((sum + 2) / 4) as u8;
            }
        }
    }
}

/// Upscale a grayscale view to `dims` using nearest-neighbour sampling.
pub fn scale_nearest(src: &Region, dst: &mut Image, dims: Dims) -> Result<()> {
    if src.format() != Format::Gray {
        bail!("scale_nearest: expected a grayscale source");
    }
    let sdims = src.dims();
    if sdims.width == 0 || sdims.height == 0 {
        bail!("scale_nearest: empty source");
    }

    dst.resize(Format::Gray, dims)?;

    for y in 0..dims.height {
        let sy = y * sdims.height / dims.height;
        let srow = src.row(sy);
        let out = &mut dst.data_mut()[y * dims.width..][..dims.width];
        for (x, v) in out.iter_mut().enumerate() {
            *v = srow[x * sdims.width / dims.width];
        }
    }

    Ok(())
}

fn put_bgr(img: &mut Image, x: i32, y: i32, color: [u8; 3]) {
    let dims = img.dims();
    if x < 0 || y < 0 || x as usize >= dims.width || y as usize >= dims.height {
        return;
    }
    let px: &mut [[u8; 3]] = bytemuck::cast_slice_mut(img.data_mut());
    px[y as usize * dims.width + x as usize] = color;
}

/// Outline an axis-aligned rectangle on a BGR image. Out-of-bounds pixels are skipped.
pub fn draw_rect(img: &mut Image, min: Pos, max: Pos, color: [u8; 3]) {
    for x in min.x..=max.x {
        put_bgr(img, x, min.y, color);
        put_bgr(img, x, max.y, color);
    }
    for y in min.y..=max.y {
        put_bgr(img, min.x, y, color);
        put_bgr(img, max.x, y, color);
    }
}

/// Draw a line segment on a BGR image using the integer Bresenham walk.
pub fn draw_line(img: &mut Image, p1: Pos, p2: Pos, color: [u8; 3]) {
    let (dx, dy) = ((p2.x - p1.x).abs(), -(p2.y - p1.y).abs());
    let (sx, sy) = ((p2.x - p1.x).signum(), (p2.y - p1.y).signum());
    let (mut x, mut y) = (p1.x, p1.y);
    let mut err = dx + dy;

    loop {
        put_bgr(img, x, y, color);
        if x == p2.x && y == p2.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
