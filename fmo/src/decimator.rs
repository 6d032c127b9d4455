//! # Format-aware 2x decimation
//!
//! Builds the next pyramid level from the previous one by 2x linear downsampling. Packed
//! formats decimate directly; `Yuv420Sp` images have their luminance and chrominance planes
//! decimated independently and reassembled, since averaging across interleaved chroma
//! samples would mix the two channels.

use crate::prelude::v1::*;
use crate::processing::decimate_plane;

/// Decimation tool that handles any supported image format.
///
/// Plane scratch buffers are owned by the decimator and reused across frames.
#[derive(Default)]
pub struct Decimator {
    y: Image,
    u: Image,
    v: Image,
}

impl Decimator {
    /// Dimensions of the output, given that the decimation input has dimensions `dims`.
    pub fn next_dims(dims: Dims) -> Dims {
        Dims::new(dims.width / 2, dims.height / 2)
    }

    /// Format of the output, given that the decimation input has format `before`.
    pub fn next_format(before: Format) -> Format {
        before
    }

    /// Pixel size in the output, given that the decimation input has pixel size `before`.
    ///
    /// The pixel size is the footprint of one pixel measured in source-image pixels; it is
    /// the unit for geometric thresholds downstream.
    pub fn next_pixel_size(before: i32) -> i32 {
        before * 2
    }

    /// Decimate `src` into `dst`, reusing the destination buffer.
    pub fn decimate(&mut self, src: &Image, dst: &mut Image) -> Result<()> {
        let dims = Self::next_dims(src.dims());

        match src.format() {
            Format::Gray | Format::Bgr => {
                dst.resize(src.format(), dims)?;
                decimate_plane(&src.view()?, dst.data_mut());
            }
            Format::Yuv420Sp => {
                dst.resize(Format::Yuv420Sp, dims)?;

                let luma_len = dims.width * dims.height;
                let (luma, chroma) = dst.data_mut().split_at_mut(luma_len);
                decimate_plane(&src.gray_view()?, luma);

                self.split_chroma(src)?;
                let half = Dims::new(dims.width / 2, dims.height / 2);

                // NV21 keeps V before U within each chroma pair
                self.y.resize(Format::Gray, half)?;
                decimate_plane(&self.v.view()?, self.y.data_mut());
                for (o, &s) in chroma.iter_mut().step_by(2).zip(self.y.data()) {
                    *o = s;
                }

                decimate_plane(&self.u.view()?, self.y.data_mut());
                for (o, &s) in chroma.iter_mut().skip(1).step_by(2).zip(self.y.data()) {
                    *o = s;
                }
            }
        }

        Ok(())
    }

    /// De-interleave the chrominance plane into the U and V scratch images.
    fn split_chroma(&mut self, src: &Image) -> Result<()> {
        let dims = src.dims();
        let half = Dims::new(dims.width / 2, dims.height / 2);
        self.u.resize(Format::Gray, half)?;
        self.v.resize(Format::Gray, half)?;

        let chroma = src.chroma_data()?;
        for ((u, v), pair) in self
            .u
            .data_mut()
            .iter_mut()
            .zip(self.v.data_mut())
            .zip(chroma.chunks_exact(2))
        {
            *v = pair[0];
            *u = pair[1];
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_level_geometry() {
        assert_eq!(Decimator::next_dims(Dims::new(641, 361)), Dims::new(320, 180));
        assert_eq!(Decimator::next_format(Format::Bgr), Format::Bgr);
        assert_eq!(Decimator::next_pixel_size(2), 4);
    }

    #[test]
    fn gray_decimation() {
        let mut src = Image::default();
        src.assign(
            Format::Gray,
            Dims::new(4, 4),
            &[
                10, 10, 20, 20, //
                10, 10, 20, 20, //
                0, 0, 0, 0, //
                0, 0, 0, 4, //
            ],
        )
        .unwrap();

        let mut dst = Image::default();
        Decimator::default().decimate(&src, &mut dst).unwrap();
        assert_eq!(dst.dims(), Dims::new(2, 2));
        assert_eq!(dst.data(), &[10, 20, 0, 1]);
    }

    #[test]
    fn planar_decimation_keeps_format() {
        let dims = Dims::new(8, 4);
        let mut data = vec![100u8; 8 * 4];
        // interleaved chroma, V before U
        for _ in 0..8 {
            data.extend_from_slice(&[10, 200]);
        }
        let mut src = Image::default();
        src.assign(Format::Yuv420Sp, dims, &data).unwrap();

        let mut dst = Image::default();
        Decimator::default().decimate(&src, &mut dst).unwrap();

        assert_eq!(dst.format(), Format::Yuv420Sp);
        assert_eq!(dst.dims(), Dims::new(4, 2));
        assert_eq!(dst.data().len(), num_bytes(Format::Yuv420Sp, dst.dims()).unwrap());
        assert!(dst.data().iter().take(8).all(|&v| v == 100));
        assert_eq!(dst.chroma_data().unwrap(), &[10, 200, 10, 200]);
    }
}
