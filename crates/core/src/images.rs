//! URLs for product and category images served by the backend.
//!
//! Originals live under `/uploads/`. The backend writes a `{stem}_thumb.jpg`
//! thumbnail for every JPEG it stores; older PNG/WebP uploads have none, so
//! those always use the original.

/// Builds image URLs against the backend origin.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Full-size image URL.
    #[must_use]
    pub fn full(&self, filename: &str) -> String {
        format!("{}/uploads/{}", self.base, urlencoding::encode(filename))
    }

    /// Thumbnail URL for JPEG originals, else the full image.
    #[must_use]
    pub fn thumbnail(&self, filename: &str) -> String {
        match jpeg_stem(filename) {
            Some(stem) => format!(
                "{}/thumbnails/{}_thumb.jpg",
                self.base,
                urlencoding::encode(stem)
            ),
            None => self.full(filename),
        }
    }
}

fn jpeg_stem(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    (ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")).then_some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> ImageUrls {
        ImageUrls::new("https://api.yakimoto.se/")
    }

    #[test]
    fn test_full_url() {
        assert_eq!(
            urls().full("gi.png"),
            "https://api.yakimoto.se/uploads/gi.png"
        );
    }

    #[test]
    fn test_thumbnail_for_jpeg() {
        assert_eq!(
            urls().thumbnail("abc.JPG"),
            "https://api.yakimoto.se/thumbnails/abc_thumb.jpg"
        );
        assert_eq!(
            urls().thumbnail("a.b.jpeg"),
            "https://api.yakimoto.se/thumbnails/a.b_thumb.jpg"
        );
    }

    #[test]
    fn test_thumbnail_falls_back_to_full() {
        assert_eq!(
            urls().thumbnail("legacy.webp"),
            "https://api.yakimoto.se/uploads/legacy.webp"
        );
        assert_eq!(
            urls().thumbnail("noext"),
            "https://api.yakimoto.se/uploads/noext"
        );
    }
}
