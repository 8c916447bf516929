//! Integration tests for keeping two dispatchers consistent over a transport
//! channel.
//!
//! One dispatcher plays the control surface, the other the output surface.
//! Every control-side change is applied locally, encoded, and sent; the
//! output side drains its inbox through its own dispatcher.

use lectern_core::protocol::codec::{encode_message, ProtocolError};
use lectern_core::protocol::messages::{
    BibleContent, BibleMessage, MediaKind, MediaMessage, MediaSelection, SyncMessage, Verse,
    VerseSelection, ViewChange, ViewKind, ViewMessage, ZoomLevel,
};
use lectern_core::{Dispatcher, Inbox, Transport, TransportChannel};
use serde_json::json;

/// Applies locally, then sends, the way the control session does.
fn act(control: &mut Dispatcher, channel: &TransportChannel, msg: SyncMessage) {
    assert!(control.dispatch_message(&msg), "control side must claim {msg:?}");
    let env = encode_message(&msg).expect("encode must succeed");
    channel.send(env);
}

fn drain(inbox: &mut Inbox, output: &mut Dispatcher) -> usize {
    let mut claimed = 0;
    while let Some(frame) = inbox.try_recv() {
        if output.dispatch(&frame.envelope) {
            claimed += 1;
        }
    }
    claimed
}

fn genesis_one() -> SyncMessage {
    SyncMessage::Bible(BibleMessage::SyncContent(BibleContent {
        book_number: 1,
        chapter: 1,
        chapter_verses: vec![
            Verse { number: 1, text: "In the beginning".into() },
            Verse { number: 2, text: "And the earth was without form".into() },
        ],
        current_verse: 1,
        is_multi_version: false,
        second_version_chapter_verses: Vec::new(),
    }))
}

#[test]
fn test_bible_sync_on_attached_channel_updates_output_store() {
    // Arrange
    let channel = TransportChannel::new();
    let mut inbox = channel.attach();
    let mut control = Dispatcher::default();
    let mut output = Dispatcher::default();

    // Act
    act(&mut control, &channel, genesis_one());
    drain(&mut inbox, &mut output);

    // Assert
    let s = output.bible().state();
    assert_eq!(s.selected_book_number, Some(1));
    assert_eq!(s.selected_chapter, Some(1));
    assert!(!s.is_multi_version);
}

#[test]
fn test_changes_while_absent_are_only_seen_through_resync() {
    // Arrange – the output surface does not exist yet
    let channel = TransportChannel::new();
    let mut control = Dispatcher::default();
    act(&mut control, &channel, genesis_one());
    act(
        &mut control,
        &channel,
        SyncMessage::Bible(BibleMessage::UpdateVerse(VerseSelection { current_verse: 2 })),
    );

    // Act – attach, and check nothing leaked through before the resync
    let mut inbox = channel.attach();
    let mut output = Dispatcher::default();
    let claimed_before_resync = drain(&mut inbox, &mut output);

    // Assert
    assert_eq!(claimed_before_resync, 0);
    assert_eq!(output.bible().state().selected_book_number, None);

    // Act – resync
    for msg in control.snapshot() {
        channel.send(encode_message(&msg).expect("snapshot must encode"));
    }
    drain(&mut inbox, &mut output);

    // Assert
    assert_eq!(output.bible().state(), control.bible().state());
    assert_eq!(output.bible().state().current_verse, 2);
}

#[test]
fn test_resync_after_reattach_restores_every_domain() {
    // Arrange
    let channel = TransportChannel::new();
    let mut control = Dispatcher::default();
    act(
        &mut control,
        &channel,
        SyncMessage::View(ViewMessage::Change(ViewChange { view: ViewKind::Media })),
    );
    act(
        &mut control,
        &channel,
        SyncMessage::Media(MediaMessage::Select(MediaSelection {
            resource_path: "media/slides.pdf".into(),
            kind: MediaKind::Pdf,
        })),
    );
    act(
        &mut control,
        &channel,
        SyncMessage::Media(MediaMessage::UpdateZoom(ZoomLevel { zoom_level: 2.0 })),
    );

    // Act
    let mut inbox = channel.attach();
    let mut output = Dispatcher::default();
    for msg in control.snapshot() {
        channel.send(encode_message(&msg).expect("snapshot must encode"));
    }
    drain(&mut inbox, &mut output);

    // Assert
    assert_eq!(output.view().state(), control.view().state());
    assert_eq!(output.bible().state(), control.bible().state());
    assert_eq!(output.media().state(), control.media().state());
    assert_eq!(output.timer().state(), control.timer().state());
}

#[test]
fn test_unknown_envelope_from_newer_peer_is_ignored() {
    // Arrange
    let channel = TransportChannel::new();
    let mut inbox = channel.attach();
    let mut output = Dispatcher::default();
    let future: lectern_core::Envelope =
        serde_json::from_value(json!({"type": "SONG_LYRICS", "data": {"line": 3}})).unwrap();

    // Act
    channel.send(future);
    let claimed = drain(&mut inbox, &mut output);

    // Assert
    assert_eq!(claimed, 0);
    assert_eq!(output.revision(), 0);
}

#[test]
fn test_encode_error_is_reported_not_sent() {
    let bad = SyncMessage::Media(MediaMessage::UpdateZoom(ZoomLevel {
        zoom_level: f64::INFINITY,
    }));

    assert!(matches!(
        encode_message(&bad),
        Err(ProtocolError::Serialize { .. })
    ));
}
