//! WebSocket link from the output surface to the control surface.
//!
//! The control surface spawns this process with a `--control-url` of the
//! form `ws://127.0.0.1:24900/surface/<uuid>`.  Opening that socket is how the
//! output surface reports that it finished loading; the control surface then
//! replays its full state over the same socket.
//!
//! Architecture:
//! - `run_link` connects, retrying while the control bridge comes up.
//! - Each inbound text frame is decoded into an [`Envelope`] and forwarded on
//!   an `mpsc` channel.  Frames that are not envelopes are logged and skipped.
//! - Envelopes queued on the outbound channel (requests such as
//!   `SURFACE_RESYNC_REQUEST`) are written back as text frames, in order.
//! - The link is one-shot: once the socket closes, `Disconnected` is sent and
//!   the task ends.  The control surface owns the lifecycle and will spawn a
//!   fresh output process if it wants one.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{bail, Context};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use lectern_core::protocol::codec::{decode_frame, encode_frame};
use lectern_core::protocol::messages::Envelope;

type ControlSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the link to the control surface.
#[derive(Debug, Clone)]
pub struct ControlLinkConfig {
    /// Full WebSocket URL including the `/surface/<uuid>` path.
    pub url: String,
    /// Connection attempts before giving up.
    pub connect_attempts: u32,
    /// Delay between attempts.
    pub retry_interval: Duration,
}

impl Default for ControlLinkConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:24900/surface/00000000-0000-0000-0000-000000000000".to_string(),
            connect_attempts: 10,
            retry_interval: Duration::from_millis(500),
        }
    }
}

/// Events emitted by the link to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// The socket is open; a resync follows.
    Connected,
    /// One envelope from the control surface, in arrival order.
    Envelope(Envelope),
    /// The socket closed.  No further events follow.
    Disconnected,
}

/// Connects and forwards envelopes until the socket closes or `running` is
/// cleared.  Envelopes received on `outbound` are sent to the control
/// surface while the socket is open, including any queued before the
/// connection was made.
///
/// # Errors
///
/// Returns an error if no connection could be made within
/// `connect_attempts`.
pub async fn run_link(
    config: ControlLinkConfig,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let Some(mut socket) = connect_with_retry(&config, &running).await? else {
        return Ok(());
    };

    info!("connected to control surface at {}", config.url);
    let _ = events.send(LinkEvent::Connected);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; closing control link");
            let _ = socket.close(None).await;
            break;
        }

        tokio::select! {
            // Short timeout so the running flag is checked even when idle.
            frame = timeout(Duration::from_millis(200), socket.next()) => {
                let frame = match frame {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(_) => continue,
                };

                match frame {
                    Ok(WsMessage::Text(text)) => match decode_frame(&text) {
                        Ok(envelope) => {
                            debug!(message_type = %envelope.message_type, "envelope received");
                            if events.send(LinkEvent::Envelope(envelope)).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("skipping undecodable frame: {e}"),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
                    Err(e) => {
                        warn!("control link error: {e}");
                        break;
                    }
                }
            }
            Some(envelope) = outbound.recv() => {
                let text = match encode_frame(&envelope) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("cannot encode {}: {e}", envelope.message_type);
                        continue;
                    }
                };
                debug!(message_type = %envelope.message_type, "sending to control surface");
                if let Err(e) = socket.send(WsMessage::Text(text)).await {
                    warn!("control link send failed: {e}");
                    break;
                }
            }
        }
    }

    info!("control link closed");
    let _ = events.send(LinkEvent::Disconnected);
    Ok(())
}

/// Returns `Ok(None)` if shutdown was requested while still connecting.
async fn connect_with_retry(
    config: &ControlLinkConfig,
    running: &AtomicBool,
) -> anyhow::Result<Option<ControlSocket>> {
    let attempts = config.connect_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        if !running.load(Ordering::Relaxed) {
            return Ok(None);
        }
        match connect_async(config.url.as_str()).await {
            Ok((socket, _response)) => return Ok(Some(socket)),
            Err(e) => {
                debug!(attempt, "control surface not reachable yet: {e}");
                last_error = Some(e);
            }
        }
        if attempt < attempts {
            time::sleep(config.retry_interval).await;
        }
    }

    match last_error {
        Some(e) => Err(e).with_context(|| {
            format!(
                "could not reach control surface at {} after {attempts} attempts",
                config.url
            )
        }),
        None => bail!("could not reach control surface at {}", config.url),
    }
}
