//! Bible domain store: the chapter on display, the highlighted verse, the
//! font size, and any streamed version content.
//!
//! # Verse position
//!
//! `current_verse` is a 1-based position into `chapter_verses`.  While a
//! chapter is loaded it always satisfies `1 <= current_verse <= len`; with no
//! verses it is 0.  A full content sync clamps a stray position into range
//! (the payload is authoritative), whereas a bare verse update that points
//! outside the chapter is not claimed.

use crate::domain::books::book_name;
use crate::domain::DomainStore;
use crate::protocol::codec::base64_decode;
use crate::protocol::messages::{
    BibleContent, BibleMessage, ContentChunk, ContentComplete, Domain, FontSize, SyncMessage,
    Verse,
};

/// Font size used until a persisted or synced value arrives.
pub const DEFAULT_FONT_SIZE: u32 = 48;
/// Smallest accepted verse font size in points.
pub const MIN_FONT_SIZE: u32 = 12;
/// Largest accepted verse font size in points.
pub const MAX_FONT_SIZE: u32 = 200;

/// Synchronized Bible state.
#[derive(Debug, Clone, PartialEq)]
pub struct BibleState {
    /// Derived from `selected_book_number`; never taken from the wire.
    pub selected_book: Option<&'static str>,
    pub selected_book_number: Option<u8>,
    pub selected_chapter: Option<u32>,
    pub chapter_verses: Vec<Verse>,
    pub current_verse: u32,
    pub is_multi_version: bool,
    pub second_version_chapter_verses: Vec<Verse>,
    pub verse_font_size: u32,
}

impl Default for BibleState {
    fn default() -> Self {
        Self {
            selected_book: None,
            selected_book_number: None,
            selected_chapter: None,
            chapter_verses: Vec::new(),
            current_verse: 0,
            is_multi_version: false,
            second_version_chapter_verses: Vec::new(),
            verse_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl BibleState {
    /// The highlighted verse, if a chapter is loaded.
    pub fn current(&self) -> Option<&Verse> {
        let idx = self.current_verse.checked_sub(1)? as usize;
        self.chapter_verses.get(idx)
    }
}

/// Bytes streamed from the text-content provider for one Bible version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBuffer {
    version_id: String,
    chunks: Vec<Vec<u8>>,
    complete: bool,
}

impl ContentBuffer {
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// All received bytes in stream order.
    pub fn bytes(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

/// Owner of [`BibleState`] and the in-flight [`ContentBuffer`].
#[derive(Debug, Clone, Default)]
pub struct BibleStore {
    state: BibleState,
    content: Option<ContentBuffer>,
}

impl BibleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose initial font size comes from persisted settings.
    pub fn with_font_size(font_size: u32) -> Self {
        let mut store = Self::new();
        store.state.verse_font_size = clamp_font_size(font_size);
        store
    }

    pub fn state(&self) -> &BibleState {
        &self.state
    }

    /// The most recent streamed content, complete or not.
    pub fn content(&self) -> Option<&ContentBuffer> {
        self.content.as_ref()
    }

    fn sync_content(&mut self, c: &BibleContent) -> bool {
        let Some(name) = book_name(c.book_number) else {
            tracing::debug!(book_number = c.book_number, "unknown book number");
            return false;
        };

        let current_verse = if c.chapter_verses.is_empty() {
            0
        } else {
            c.current_verse.clamp(1, c.chapter_verses.len() as u32)
        };

        self.state = BibleState {
            selected_book: Some(name),
            selected_book_number: Some(c.book_number),
            selected_chapter: Some(c.chapter),
            chapter_verses: c.chapter_verses.clone(),
            current_verse,
            is_multi_version: c.is_multi_version,
            second_version_chapter_verses: c.second_version_chapter_verses.clone(),
            verse_font_size: self.state.verse_font_size,
        };
        true
    }

    fn update_verse(&mut self, position: u32) -> bool {
        let len = self.state.chapter_verses.len() as u32;
        if position == 0 || position > len {
            return false;
        }
        self.state.current_verse = position;
        true
    }

    fn content_chunk(&mut self, chunk: &ContentChunk) -> bool {
        let bytes = match base64_decode(&chunk.data) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(version = %chunk.version_id, "dropping content chunk: {e}");
                return false;
            }
        };

        if chunk.index == 0 {
            self.content = Some(ContentBuffer {
                version_id: chunk.version_id.clone(),
                chunks: vec![bytes],
                complete: false,
            });
            return true;
        }

        match self.content.as_mut() {
            Some(buf)
                if buf.version_id == chunk.version_id
                    && !buf.complete
                    && buf.chunks.len() == chunk.index as usize =>
            {
                buf.chunks.push(bytes);
                true
            }
            _ => false,
        }
    }

    fn content_complete(&mut self, done: &ContentComplete) -> bool {
        match self.content.as_mut() {
            Some(buf)
                if buf.version_id == done.version_id
                    && !buf.complete
                    && buf.chunks.len() == done.chunk_count as usize =>
            {
                buf.complete = true;
                true
            }
            _ if done.chunk_count == 0 => {
                self.content = Some(ContentBuffer {
                    version_id: done.version_id.clone(),
                    chunks: Vec::new(),
                    complete: true,
                });
                true
            }
            _ => false,
        }
    }
}

impl DomainStore for BibleStore {
    type Message = BibleMessage;
    const DOMAIN: Domain = Domain::Bible;

    fn select(message: &SyncMessage) -> Option<&BibleMessage> {
        match message {
            SyncMessage::Bible(m) => Some(m),
            _ => None,
        }
    }

    fn apply(&mut self, message: &BibleMessage) -> bool {
        match message {
            BibleMessage::SyncContent(c) => self.sync_content(c),
            BibleMessage::UpdateVerse(v) => self.update_verse(v.current_verse),
            BibleMessage::UpdateFontSize(f) => {
                self.state.verse_font_size = clamp_font_size(f.font_size);
                true
            }
            BibleMessage::ContentChunk(c) => self.content_chunk(c),
            BibleMessage::ContentComplete(c) => self.content_complete(c),
        }
    }

    fn snapshot(&self) -> Vec<SyncMessage> {
        let mut out = Vec::with_capacity(2);
        if let (Some(book_number), Some(chapter)) =
            (self.state.selected_book_number, self.state.selected_chapter)
        {
            out.push(SyncMessage::Bible(BibleMessage::SyncContent(BibleContent {
                book_number,
                chapter,
                chapter_verses: self.state.chapter_verses.clone(),
                current_verse: self.state.current_verse,
                is_multi_version: self.state.is_multi_version,
                second_version_chapter_verses: self.state.second_version_chapter_verses.clone(),
            })));
        }
        out.push(SyncMessage::Bible(BibleMessage::UpdateFontSize(FontSize {
            font_size: self.state.verse_font_size,
        })));
        out
    }
}

fn clamp_font_size(size: u32) -> u32 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::base64_encode;
    use crate::protocol::messages::{Envelope, VerseSelection};
    use serde_json::json;

    fn verses(n: u32) -> Vec<Verse> {
        (1..=n)
            .map(|i| Verse {
                number: i,
                text: format!("verse {i}"),
            })
            .collect()
    }

    fn sync(book_number: u8, chapter: u32, n: u32, current: u32) -> BibleMessage {
        BibleMessage::SyncContent(BibleContent {
            book_number,
            chapter,
            chapter_verses: verses(n),
            current_verse: current,
            is_multi_version: false,
            second_version_chapter_verses: Vec::new(),
        })
    }

    fn chunk(version: &str, index: u32, data: &[u8]) -> BibleMessage {
        BibleMessage::ContentChunk(ContentChunk {
            version_id: version.into(),
            index,
            data: base64_encode(data),
        })
    }

    #[test]
    fn test_sync_content_from_envelope_applies_defaults() {
        // Arrange
        let mut store = BibleStore::new();
        let env: Envelope = serde_json::from_value(json!({
            "type": "BIBLE_SYNC_CONTENT",
            "data": {
                "bookNumber": 1,
                "chapter": 1,
                "chapterVerses": [{"number": 1, "text": "In the beginning"}],
                "currentVerse": 1
            }
        }))
        .unwrap();

        // Act
        let claimed = store.handle_message(&env);

        // Assert
        assert!(claimed);
        let s = store.state();
        assert_eq!(s.selected_book_number, Some(1));
        assert_eq!(s.selected_chapter, Some(1));
        assert_eq!(s.selected_book, Some("Genesis"));
        assert!(!s.is_multi_version);
        assert!(s.second_version_chapter_verses.is_empty());
    }

    #[test]
    fn test_sync_content_clamps_current_verse_into_range() {
        let mut store = BibleStore::new();

        assert!(store.apply(&sync(43, 3, 5, 99)));
        assert_eq!(store.state().current_verse, 5);

        assert!(store.apply(&sync(43, 3, 5, 0)));
        assert_eq!(store.state().current_verse, 1);
    }

    #[test]
    fn test_sync_content_with_empty_chapter_sets_position_zero() {
        let mut store = BibleStore::new();

        assert!(store.apply(&sync(1, 1, 0, 3)));
        assert_eq!(store.state().current_verse, 0);
        assert!(store.state().current().is_none());
    }

    #[test]
    fn test_sync_content_with_unknown_book_is_not_claimed() {
        // Arrange
        let mut store = BibleStore::new();
        store.apply(&sync(1, 1, 3, 1));
        let before = store.state().clone();

        // Act
        let claimed = store.apply(&sync(67, 1, 3, 1));

        // Assert
        assert!(!claimed);
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_sync_content_keeps_font_size() {
        let mut store = BibleStore::with_font_size(72);

        store.apply(&sync(1, 1, 3, 1));

        assert_eq!(store.state().verse_font_size, 72);
    }

    #[test]
    fn test_update_verse_within_range_is_claimed() {
        let mut store = BibleStore::new();
        store.apply(&sync(19, 23, 6, 1));

        assert!(store.apply(&BibleMessage::UpdateVerse(VerseSelection { current_verse: 4 })));
        assert_eq!(store.state().current_verse, 4);
        assert_eq!(store.state().current().map(|v| v.number), Some(4));
    }

    #[test]
    fn test_update_verse_out_of_range_is_not_claimed() {
        // Arrange
        let mut store = BibleStore::new();
        store.apply(&sync(19, 23, 6, 2));

        // Act / Assert
        assert!(!store.apply(&BibleMessage::UpdateVerse(VerseSelection { current_verse: 7 })));
        assert!(!store.apply(&BibleMessage::UpdateVerse(VerseSelection { current_verse: 0 })));
        assert_eq!(store.state().current_verse, 2);
    }

    #[test]
    fn test_update_verse_without_chapter_is_not_claimed() {
        let mut store = BibleStore::new();

        assert!(!store.apply(&BibleMessage::UpdateVerse(VerseSelection { current_verse: 1 })));
    }

    #[test]
    fn test_font_size_is_clamped() {
        let mut store = BibleStore::new();

        store.apply(&BibleMessage::UpdateFontSize(FontSize { font_size: 4 }));
        assert_eq!(store.state().verse_font_size, MIN_FONT_SIZE);

        store.apply(&BibleMessage::UpdateFontSize(FontSize { font_size: 9000 }));
        assert_eq!(store.state().verse_font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn test_content_chunks_accumulate_in_order() {
        // Arrange
        let mut store = BibleStore::new();

        // Act
        assert!(store.apply(&chunk("kjv", 0, b"Gen")));
        assert!(store.apply(&chunk("kjv", 1, b"esis")));
        assert!(store.apply(&BibleMessage::ContentComplete(ContentComplete {
            version_id: "kjv".into(),
            chunk_count: 2,
        })));

        // Assert
        let buf = store.content().expect("buffer must exist");
        assert_eq!(buf.version_id(), "kjv");
        assert!(buf.is_complete());
        assert_eq!(buf.bytes(), b"Genesis");
    }

    #[test]
    fn test_out_of_order_chunk_is_not_claimed() {
        let mut store = BibleStore::new();
        store.apply(&chunk("kjv", 0, b"a"));

        assert!(!store.apply(&chunk("kjv", 2, b"c")));
        assert!(!store.apply(&chunk("web", 1, b"b")));
        assert_eq!(store.content().map(|b| b.chunk_count()), Some(1));
    }

    #[test]
    fn test_complete_with_wrong_count_is_not_claimed() {
        let mut store = BibleStore::new();
        store.apply(&chunk("kjv", 0, b"a"));

        assert!(!store.apply(&BibleMessage::ContentComplete(ContentComplete {
            version_id: "kjv".into(),
            chunk_count: 3,
        })));
        assert!(!store.content().map(|b| b.is_complete()).unwrap_or(true));
    }

    #[test]
    fn test_empty_stream_completes_without_chunks() {
        let mut store = BibleStore::new();

        assert!(store.apply(&BibleMessage::ContentComplete(ContentComplete {
            version_id: "empty".into(),
            chunk_count: 0,
        })));
        assert_eq!(store.content().map(|b| b.bytes()), Some(Vec::new()));
    }

    #[test]
    fn test_invalid_base64_chunk_is_not_claimed() {
        let mut store = BibleStore::new();

        let claimed = store.apply(&BibleMessage::ContentChunk(ContentChunk {
            version_id: "kjv".into(),
            index: 0,
            data: "***".into(),
        }));

        assert!(!claimed);
        assert!(store.content().is_none());
    }

    #[test]
    fn test_snapshot_rebuilds_equal_state() {
        // Arrange
        let mut source = BibleStore::with_font_size(60);
        source.apply(&sync(45, 8, 10, 28));
        let mut replica = BibleStore::new();

        // Act
        for msg in source.snapshot() {
            let m = BibleStore::select(&msg).expect("bible message").clone();
            assert!(replica.apply(&m));
        }

        // Assert
        assert_eq!(replica.state(), source.state());
    }

    #[test]
    fn test_snapshot_of_empty_store_only_carries_font_size() {
        let snapshot = BibleStore::new().snapshot();

        assert_eq!(snapshot.len(), 1);
        assert!(matches!(
            snapshot[0],
            SyncMessage::Bible(BibleMessage::UpdateFontSize(_))
        ));
    }

    #[test]
    fn test_handle_message_rejects_other_domains() {
        let mut store = BibleStore::new();
        let env: Envelope =
            serde_json::from_value(json!({"type": "MEDIA_CLEAR", "data": {}})).unwrap();

        assert!(!store.handle_message(&env));
    }
}
