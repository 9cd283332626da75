//! Frame records delivered to the output sink.

use super::SourceConfig;
use serde::Serialize;

/// Encoding tag carried by every record: a raw pixel matrix, no container.
pub const RAW_MATRIX_TAG: &str = "cvmat";

/// One captured frame, packaged for the downstream consumer.
///
/// Ownership of the pixel buffer moves to the sink together with the
/// record; the acquisition loop never retains or reuses it.
#[derive(Clone, Serialize)]
pub struct FrameRecord {
    width: u32,
    height: u32,
    format: &'static str,
    color_model: &'static str,
    image: Vec<u8>,
}

impl FrameRecord {
    /// Packages one retrieved frame under the given configuration.
    pub fn new(config: &SourceConfig, image: Vec<u8>) -> Self {
        Self {
            width: config.width,
            height: config.height,
            format: RAW_MATRIX_TAG,
            color_model: config.format.as_str(),
            image,
        }
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoding tag of the image payload.
    #[inline]
    pub fn encoding(&self) -> &'static str {
        self.format
    }

    /// Channel order of the pixel data.
    #[inline]
    pub fn color_model(&self) -> &'static str {
        self.color_model
    }

    /// The pixel data, sized exactly as the driver reported it.
    #[inline]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Consumes the record, yielding the pixel buffer.
    pub fn into_image(self) -> Vec<u8> {
        self.image
    }

    /// Checks that the payload length matches the configured geometry.
    pub fn is_valid(&self) -> bool {
        self.image.len() == (self.width as usize) * (self.height as usize) * 3
    }
}

impl std::fmt::Debug for FrameRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRecord")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("color_model", &self.color_model)
            .field("image_bytes", &self.image.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PixelFormat;

    #[test]
    fn test_record_echoes_configuration() {
        let config = SourceConfig {
            width: 320,
            height: 240,
            format: PixelFormat::Rgb,
        };
        let record = FrameRecord::new(&config, vec![0u8; 320 * 240 * 3]);

        assert_eq!(record.width(), 320);
        assert_eq!(record.height(), 240);
        assert_eq!(record.encoding(), "cvmat");
        assert_eq!(record.color_model(), "rgb");
        assert!(record.is_valid());
    }

    #[test]
    fn test_record_keeps_driver_reported_size() {
        // The payload length is whatever the driver reported, even when it
        // disagrees with the configured geometry.
        let record = FrameRecord::new(&SourceConfig::default(), vec![0u8; 100]);
        assert_eq!(record.image().len(), 100);
        assert!(!record.is_valid());
    }

    #[test]
    fn test_serialized_field_names() {
        let record = FrameRecord::new(&SourceConfig::default(), vec![1, 2, 3]);
        let value = toml::Value::try_from(&record).unwrap();
        let table = value.as_table().unwrap();

        for key in ["width", "height", "format", "color_model", "image"] {
            assert!(table.contains_key(key), "missing key {key}");
        }
        assert_eq!(table["format"].as_str(), Some("cvmat"));
        assert_eq!(table["color_model"].as_str(), Some("bgr"));
    }
}
