use crate::error::{SnapError, SnapResult};

/// Premultiplied RGBA8 bitmap, 4 bytes/pixel, row-major with no padding.
///
/// A `Bitmap` is owned by whichever stage produced it (capture, decode, or
/// diff synthesis) and is never mutated afterwards; there are no `&mut`
/// accessors to its pixel data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Wrap raw premultiplied RGBA8 bytes, validating the byte length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> SnapResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if data.len() != expected {
            return Err(SnapError::capture(format!(
                "bitmap byte length mismatch: {}x{} needs {expected} bytes, got {}",
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Snapshot a rendered pixmap into an owned bitmap.
    pub fn from_pixmap(pixmap: &vello_cpu::Pixmap) -> SnapResult<Self> {
        let width = u32::from(pixmap.width());
        let height = u32::from(pixmap.height());
        if width == 0 || height == 0 {
            return Err(SnapError::capture("surface produced an empty image"));
        }
        Self::from_raw(width, height, pixmap.data_as_u8_slice().to_vec())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Pixel at (x, y) as premultiplied `[r, g, b, a]`.
    ///
    /// Panics when out of bounds; callers iterate within `width`/`height`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_bad_length() {
        assert!(Bitmap::from_raw(2, 2, vec![0u8; 15]).is_err());
        assert!(Bitmap::from_raw(2, 2, vec![0u8; 16]).is_ok());
    }

    #[test]
    fn pixel_indexing_is_row_major() {
        let mut data = vec![0u8; 2 * 2 * 4];
        data[(1 * 2 + 1) * 4] = 7;
        let b = Bitmap::from_raw(2, 2, data).unwrap();
        assert_eq!(b.pixel(1, 1)[0], 7);
        assert_eq!(b.pixel(0, 0)[0], 0);
    }

    #[test]
    fn from_pixmap_copies_dimensions() {
        let pm = vello_cpu::Pixmap::new(4, 3);
        let b = Bitmap::from_pixmap(&pm).unwrap();
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 3);
        assert_eq!(b.byte_len(), 4 * 3 * 4);
    }
}
