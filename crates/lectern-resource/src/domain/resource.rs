//! Byte ranges and content types.

use std::path::Path;

/// An inclusive byte range inside a file of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// Inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Parses a `Range` header value against a file of `total` bytes.
    ///
    /// Supports one range of the forms `bytes=a-b`, `bytes=a-` and
    /// `bytes=-n`.  An end past the file is clamped.  Returns `None` for
    /// anything malformed, multi-range or unsatisfiable; callers then serve
    /// the whole file.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lectern_resource::domain::ByteRange;
    ///
    /// assert_eq!(
    ///     ByteRange::parse("bytes=0-99", 1000),
    ///     Some(ByteRange { start: 0, end: 99 })
    /// );
    /// assert_eq!(
    ///     ByteRange::parse("bytes=-100", 1000),
    ///     Some(ByteRange { start: 900, end: 999 })
    /// );
    /// assert_eq!(ByteRange::parse("bytes=1000-", 1000), None);
    /// ```
    pub fn parse(header: &str, total: u64) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?.trim();
        if spec.contains(',') || total == 0 {
            return None;
        }
        let (first, last) = spec.split_once('-')?;
        let (first, last) = (first.trim(), last.trim());
        let max = total - 1;

        match (first.is_empty(), last.is_empty()) {
            // bytes=-n: the last n bytes.
            (true, false) => {
                let n: u64 = last.parse().ok()?;
                if n == 0 {
                    return None;
                }
                Some(Self {
                    start: total.saturating_sub(n),
                    end: max,
                })
            }
            // bytes=a-
            (false, true) => {
                let start: u64 = first.parse().ok()?;
                (start <= max).then_some(Self { start, end: max })
            }
            // bytes=a-b
            (false, false) => {
                let start: u64 = first.parse().ok()?;
                let end: u64 = last.parse().ok()?;
                if start > end || start > max {
                    return None;
                }
                Some(Self {
                    start,
                    end: end.min(max),
                })
            }
            (true, true) => None,
        }
    }

    /// Number of bytes covered; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// `Content-Type` for a file, by extension.  Unknown extensions are served as
/// `application/octet-stream`.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
