//! WebSocket surface bridge: the inter-process [`Transport`] between the
//! control surface and the output surface process.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured (loopback) address.
//! 2. Accepting the output surface's connection and upgrading it to a
//!    WebSocket.  The request path carries the surface id:
//!    `/surface/<uuid>`.  Any other path is refused during the handshake.
//! 3. Forwarding every envelope handed to [`SurfaceBridge::send`] as one
//!    JSON text frame, in order.
//! 4. Reporting `Connected` / `Disconnected` so the lifecycle manager can
//!    move the surface to `attached` / `absent`.
//! 5. Decoding text frames the surface sends back and reporting each one as
//!    [`BridgeEvent::Envelope`].
//!
//! A handshake with a well-formed id is not enough to be attached: the
//! [`SurfaceGate`] must also confirm that id is the surface the lifecycle
//! manager spawned.  Any other connection is closed before it can replace
//! the real surface or receive state.
//!
//! Exactly one output surface is attached at a time.  A new admitted
//! connection replaces the previous one; the old socket is closed once its
//! outbound queue is dropped.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        protocol::{frame::coding::CloseCode, CloseFrame},
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use lectern_core::channel::Transport;
use lectern_core::protocol::codec::{decode_frame, encode_frame};
use lectern_core::protocol::messages::Envelope;

use crate::application::surface_lifecycle::SurfaceId;

/// Connection changes and inbound envelopes reported by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// The output surface finished loading and connected.
    Connected(SurfaceId),
    /// One text frame from the attached surface, in arrival order.
    Envelope(SurfaceId, Envelope),
    /// The output surface's connection closed.
    Disconnected(SurfaceId),
}

/// Decides whether a connecting surface id may be attached.
#[async_trait]
pub trait SurfaceGate: Send + Sync {
    async fn admits(&self, surface_id: SurfaceId) -> bool;
}

struct Attachment {
    surface_id: SurfaceId,
    tx: mpsc::UnboundedSender<Envelope>,
}

/// Sender side of the bridge.  Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct SurfaceBridge {
    current: Mutex<Option<Attachment>>,
}

impl std::fmt::Debug for SurfaceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBridge")
            .field("attached", &self.attached_surface())
            .finish()
    }
}

impl SurfaceBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Option<Attachment>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The surface currently connected, if any.
    pub fn attached_surface(&self) -> Option<SurfaceId> {
        self.guard().as_ref().map(|a| a.surface_id)
    }

    /// Makes `surface_id` the attached surface and returns the queue its
    /// writer task drains.  Any previous attachment is dropped.
    fn attach(&self, surface_id: SurfaceId) -> mpsc::UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guard = self.guard();
        if let Some(previous) = guard.replace(Attachment { surface_id, tx }) {
            info!(
                old = %previous.surface_id,
                new = %surface_id,
                "surface connection replaced"
            );
        }
        rx
    }

    /// Clears the attachment if it still belongs to `surface_id`.
    fn detach(&self, surface_id: SurfaceId) -> bool {
        let mut guard = self.guard();
        if guard.as_ref().map(|a| a.surface_id) == Some(surface_id) {
            *guard = None;
            true
        } else {
            false
        }
    }
}

impl Transport for SurfaceBridge {
    fn send(&self, envelope: Envelope) {
        let mut guard = self.guard();
        let Some(attachment) = guard.as_ref() else {
            debug!(message_type = %envelope.message_type, "no surface connected; dropped");
            return;
        };
        if attachment.tx.send(envelope).is_err() {
            debug!(surface_id = %attachment.surface_id, "surface writer gone; detaching");
            *guard = None;
        }
    }

    fn is_attached(&self) -> bool {
        self.guard()
            .as_ref()
            .map(|a| !a.tx.is_closed())
            .unwrap_or(false)
    }
}

/// Extracts the surface id from a `/surface/<uuid>` request path.
pub fn parse_surface_path(path: &str) -> Option<SurfaceId> {
    let id = path.strip_prefix("/surface/")?;
    Uuid::parse_str(id.trim_end_matches('/')).ok()
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Binds the bridge listener.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind surface bridge on {addr}"))
}

/// Runs the accept loop until `running` is cleared.
///
/// Each connection is handled in its own task.
pub async fn run_bridge(
    listener: TcpListener,
    bridge: Arc<SurfaceBridge>,
    gate: Arc<dyn SurfaceGate>,
    events: mpsc::UnboundedSender<BridgeEvent>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("surface bridge listening on {addr}");
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping surface bridge");
            break;
        }

        // Short timeout so the running flag is checked even when idle.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("surface connection from {peer_addr}");
                let bridge = Arc::clone(&bridge);
                let gate = Arc::clone(&gate);
                let events = events.clone();
                tokio::spawn(async move {
                    if let Err(e) = run_connection(stream, bridge, gate, events).await {
                        warn!("surface connection from {peer_addr} ended with error: {e:#}");
                    }
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

async fn run_connection(
    stream: TcpStream,
    bridge: Arc<SurfaceBridge>,
    gate: Arc<dyn SurfaceGate>,
    events: mpsc::UnboundedSender<BridgeEvent>,
) -> anyhow::Result<()> {
    let mut surface_id: Option<SurfaceId> = None;
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        match parse_surface_path(req.uri().path()) {
            Some(id) => {
                surface_id = Some(id);
                Ok(resp)
            }
            None => {
                let mut refusal = ErrorResponse::new(Some("unknown surface path".to_string()));
                *refusal.status_mut() = StatusCode::NOT_FOUND;
                Err(refusal)
            }
        }
    };
    let mut ws_stream = accept_hdr_async(stream, callback)
        .await
        .context("surface WebSocket handshake failed")?;
    let surface_id = surface_id.context("handshake accepted without a surface id")?;

    if !gate.admits(surface_id).await {
        warn!(
            target: "security",
            %surface_id,
            "refusing connection from a surface that was not spawned"
        );
        let refusal = CloseFrame {
            code: CloseCode::Policy,
            reason: "unexpected surface".into(),
        };
        let _ = ws_stream.close(Some(refusal)).await;
        return Ok(());
    }

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut outbound = bridge.attach(surface_id);
    let _ = events.send(BridgeEvent::Connected(surface_id));
    info!(%surface_id, "output surface connected");

    // ── Writer: outbound queue → text frames ────────────────────────────────
    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound.recv().await {
            let text = match encode_frame(&envelope) {
                Ok(t) => t,
                Err(e) => {
                    error!("cannot encode {}: {e}", envelope.message_type);
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                debug!(%surface_id, "surface socket closed while sending");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // ── Reader: inbound envelopes, then close ───────────────────────────────
    let reader = async {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(WsMessage::Close(_)) => break,
                Ok(WsMessage::Text(text)) => match decode_frame(&text) {
                    Ok(envelope) => {
                        debug!(%surface_id, message_type = %envelope.message_type, "inbound envelope");
                        let _ = events.send(BridgeEvent::Envelope(surface_id, envelope));
                    }
                    Err(e) => warn!(%surface_id, "skipping undecodable frame: {e}"),
                },
                Ok(_) => {}
                Err(WsError::ConnectionClosed | WsError::Protocol(_)) => break,
                Err(e) => {
                    warn!(%surface_id, "surface socket error: {e}");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = reader => {}
        _ = writer => {}
    }

    if bridge.detach(surface_id) {
        info!(%surface_id, "output surface disconnected");
    }
    let _ = events.send(BridgeEvent::Disconnected(surface_id));
    Ok(())
}
