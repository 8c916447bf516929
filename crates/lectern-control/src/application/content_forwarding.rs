//! Forwarding of streamed Bible text to the output surface.
//!
//! The text-content provider produces a version's text as a stream of raw
//! byte chunks.  This module does not parse them; every chunk is wrapped in a
//! `BIBLE_CONTENT_CHUNK` envelope (base64 payload, zero-based index) and sent
//! in stream order, followed by one `BIBLE_CONTENT_COMPLETE` carrying the
//! chunk count.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use lectern_core::channel::Transport;
use lectern_core::protocol::codec::{base64_encode, encode_message, ProtocolError};
use lectern_core::protocol::messages::{BibleMessage, ContentChunk, ContentComplete, SyncMessage};

/// A Bible translation the provider can stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BibleVersion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub language: String,
}

/// Error type for the text-content provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown version: {0}")]
    UnknownVersion(String),
    #[error("content source error: {0}")]
    Source(String),
}

/// Source of Bible text.
#[async_trait]
pub trait TextContentProvider: Send + Sync {
    /// Lists the available versions.
    async fn fetch_versions(&self) -> Result<Vec<BibleVersion>, ProviderError>;

    /// Streams one version's raw content in chunks.
    async fn fetch_content(
        &self,
        version_id: &str,
    ) -> Result<BoxStream<'static, Result<Vec<u8>, ProviderError>>, ProviderError>;
}

/// Error type for [`forward_content`].
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("no output surface attached")]
    Detached,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Streams `version_id` from `provider` to the output surface.
///
/// Returns the number of chunks sent.  Does not start fetching when no
/// surface is attached; a provider error mid-stream stops forwarding
/// without sending `BIBLE_CONTENT_COMPLETE`.
pub async fn forward_content(
    transport: &dyn Transport,
    provider: &dyn TextContentProvider,
    version_id: &str,
) -> Result<u32, ForwardError> {
    if !transport.is_attached() {
        return Err(ForwardError::Detached);
    }

    let mut stream = provider.fetch_content(version_id).await?;
    let mut index: u32 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        let msg = SyncMessage::Bible(BibleMessage::ContentChunk(ContentChunk {
            version_id: version_id.to_string(),
            index,
            data: base64_encode(&bytes),
        }));
        transport.send(encode_message(&msg)?);
        debug!(version_id, index, len = bytes.len(), "content chunk forwarded");
        index += 1;
    }

    let done = SyncMessage::Bible(BibleMessage::ContentComplete(ContentComplete {
        version_id: version_id.to_string(),
        chunk_count: index,
    }));
    transport.send(encode_message(&done)?);
    info!(version_id, chunks = index, "content forwarded");
    Ok(index)
}
