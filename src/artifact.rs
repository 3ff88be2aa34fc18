use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use crate::bitmap::Bitmap;
use crate::error::{SnapError, SnapResult};

/// Encode a bitmap to PNG bytes.
///
/// Pixel bytes are stored as RGBA8 without unpremultiplying, so an encode
/// followed by [`decode_png`] is pixel-identical. That round-trip fidelity is
/// what makes comparison across process boundaries sound.
pub fn encode_png(bitmap: &Bitmap) -> SnapResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(bitmap.width(), bitmap.height(), bitmap.data().to_vec())
        .ok_or_else(|| SnapError::artifact("bitmap does not form a valid RGBA image"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| SnapError::artifact(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

/// Decode PNG bytes into a bitmap.
pub fn decode_png(bytes: &[u8]) -> SnapResult<Bitmap> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| SnapError::artifact(format!("PNG decode failed: {e}")))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Bitmap::from_raw(width, height, img.into_raw())
}

/// Write `bytes` to `path` atomically: parent directories are created, the
/// data goes to a `.tmp` sibling first, and a rename publishes it.
///
/// A failed write is fatal to the owning test; artifacts are required for
/// diagnosis.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SnapResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            SnapError::artifact(format!("cannot create '{}': {e}", parent.display()))
        })?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, bytes)
        .map_err(|e| SnapError::artifact(format!("cannot write '{}': {e}", tmp.display())))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        SnapError::artifact(format!("cannot move artifact into '{}': {e}", path.display()))
    })
}

/// Load a reference image.
///
/// A missing file is `Ok(None)` — the caller reports that as Incomparable.
/// An unreadable or undecodable file is an error: the reference exists but
/// the environment cannot use it.
pub fn load_reference(path: &Path) -> SnapResult<Option<Bitmap>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SnapError::artifact(format!(
                "cannot read reference '{}': {e}",
                path.display()
            )));
        }
    };
    decode_png(&bytes).map(Some)
}

/// Ordered key/value record attached to a test verdict, for consumption by
/// external reporting tools.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostics {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Persist the record as a JSON sidecar.
    pub fn write_json(&self, path: &Path) -> SnapResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SnapError::artifact(format!("diagnostics serialization failed: {e}")))?;
        write_atomic(path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "snapcheck_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn png_round_trip_is_pixel_identical() {
        let data: Vec<u8> = (0..(4 * 2 * 4)).map(|i| (i * 7 % 251) as u8).collect();
        let bitmap = Bitmap::from_raw(4, 2, data).unwrap();

        let encoded = encode_png(&bitmap).unwrap();
        let decoded = decode_png(&encoded).unwrap();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_tmp() {
        let dir = temp_dir("write_atomic");
        let path = dir.join("nested/deep/TestImage.A.B.png");

        write_atomic(&path, b"payload").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");

        let tmp = path.with_extension("png.tmp");
        assert!(!tmp.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_reference_is_none_corrupt_is_error() {
        let dir = temp_dir("load_reference");
        std::fs::create_dir_all(&dir).unwrap();

        assert!(load_reference(&dir.join("absent.png")).unwrap().is_none());

        let corrupt = dir.join("corrupt.png");
        std::fs::write(&corrupt, b"not a png").unwrap();
        assert!(load_reference(&corrupt).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn diagnostics_serialize_flat() {
        let mut d = Diagnostics::new();
        d.record("actualImage", "/tmp/a.png");
        d.record("expectedImage", "/tmp/e.png");

        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"actualImage\":\"/tmp/a.png\""));
        assert_eq!(d.get("expectedImage"), Some("/tmp/e.png"));
    }
}
