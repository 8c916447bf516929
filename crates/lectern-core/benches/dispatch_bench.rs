//! Criterion benchmarks for the envelope codec and dispatcher.
//!
//! The hot path is the periodic `MEDIA_CONTROL` sync report (twice a second
//! during playback) and the occasional large `BIBLE_SYNC_CONTENT` carrying a
//! full chapter.
//!
//! Run with:
//! ```bash
//! cargo bench --package lectern-core --bench dispatch_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lectern_core::protocol::codec::{decode_frame, decode_message, encode_frame, encode_message};
use lectern_core::protocol::messages::{
    BibleContent, BibleMessage, MediaMessage, PanOffset, PlaybackAction, PlaybackControl,
    SyncMessage, Verse,
};
use lectern_core::Dispatcher;

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_sync_report() -> SyncMessage {
    SyncMessage::Media(MediaMessage::Control(PlaybackControl {
        action: PlaybackAction::Sync,
        current_time: 123.456,
    }))
}

fn make_pan() -> SyncMessage {
    SyncMessage::Media(MediaMessage::UpdatePan(PanOffset { x: 0.25, y: -0.5 }))
}

/// Psalm 119 is the longest chapter (176 verses).
fn make_long_chapter() -> SyncMessage {
    let verses = (1..=176)
        .map(|n| Verse {
            number: n,
            text: "Blessed are the undefiled in the way, who walk in the law of the Lord."
                .to_string(),
        })
        .collect();
    SyncMessage::Bible(BibleMessage::SyncContent(BibleContent {
        book_number: 19,
        chapter: 119,
        chapter_verses: verses,
        current_verse: 1,
        is_multi_version: false,
        second_version_chapter_verses: Vec::new(),
    }))
}

fn fixtures() -> Vec<(&'static str, SyncMessage)> {
    vec![
        ("MediaControl(sync)", make_sync_report()),
        ("MediaUpdatePan", make_pan()),
        ("BibleSyncContent(176)", make_long_chapter()),
    ]
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for (name, msg) in fixtures() {
        group.bench_with_input(BenchmarkId::new("msg", name), &msg, |b, msg| {
            b.iter(|| {
                let env = encode_message(black_box(msg)).expect("encode must succeed");
                encode_frame(&env).expect("frame must serialize")
            })
        });
    }
    group.finish();
}

fn bench_decode_and_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_and_dispatch");
    for (name, msg) in fixtures() {
        let frame = encode_message(&msg)
            .and_then(|env| encode_frame(&env))
            .expect("encode must succeed for benchmark setup");
        group.bench_with_input(BenchmarkId::new("msg", name), &frame, |b, frame| {
            let mut dispatcher = Dispatcher::default();
            b.iter(|| {
                let env = decode_frame(black_box(frame)).expect("frame must parse");
                dispatcher.dispatch(&env)
            })
        });
    }
    group.finish();
}

fn bench_decode_only(c: &mut Criterion) {
    let env = encode_message(&make_sync_report()).expect("encode must succeed");
    c.bench_function("decode_message/MediaControl(sync)", |b| {
        b.iter(|| decode_message(black_box(&env)).expect("decode must succeed"))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut dispatcher = Dispatcher::default();
    dispatcher.dispatch_message(&make_long_chapter());
    c.bench_function("dispatcher_snapshot/long_chapter", |b| {
        b.iter(|| black_box(dispatcher.snapshot()))
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode_and_dispatch,
    bench_decode_only,
    bench_snapshot
);
criterion_main!(benches);
