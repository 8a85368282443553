//! Edit-or-create publishing of the single status message.

use std::sync::Arc;

use serenity::all::{ChannelId, CreateEmbed, CreateMessage, EditMessage, Http, MessageId};
use serenity::async_trait;
use serenity::http::HttpError;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SinkError {
    /// The tracked message no longer exists on the platform.
    #[error("status message not found")]
    NotFound,
    #[error(transparent)]
    Discord(#[from] serenity::Error),
}

/// The chat-platform capability the publisher needs: update a known message
/// or post a fresh one.
#[async_trait]
pub trait StatusSink {
    async fn edit(&self, id: MessageId, embed: CreateEmbed) -> Result<(), SinkError>;
    async fn create(&self, embed: CreateEmbed) -> Result<MessageId, SinkError>;
}

/// Serenity-backed sink targeting the configured status channel.
pub struct DiscordSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl StatusSink for DiscordSink {
    async fn edit(&self, id: MessageId, embed: CreateEmbed) -> Result<(), SinkError> {
        // confirm the message still exists so a deleted target surfaces as
        // NotFound rather than a failed write
        self.channel_id
            .message(&self.http, id)
            .await
            .map_err(classify)?;

        self.channel_id
            .edit_message(&self.http, id, EditMessage::new().embed(embed))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn create(&self, embed: CreateEmbed) -> Result<MessageId, SinkError> {
        let message = self
            .channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
            .map_err(classify)?;
        Ok(message.id)
    }
}

fn classify(err: serenity::Error) -> SinkError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err
        && response.status_code.as_u16() == 404
    {
        return SinkError::NotFound;
    }
    SinkError::Discord(err)
}

/// Owns the handle of the previously published message. Logically there is
/// exactly one status message: while a live handle is known, a publish must
/// never create a second one.
pub struct Publisher<S> {
    sink: S,
    handle: Option<MessageId>,
}

impl<S: StatusSink> Publisher<S> {
    pub fn new(sink: S, handle: Option<MessageId>) -> Self {
        Self { sink, handle }
    }

    /// One write per call: edit the known message, or create (and remember)
    /// a new one when none is known or the previous one disappeared.
    /// Transport errors propagate; the caller logs and the next tick retries.
    pub async fn publish(&mut self, embed: CreateEmbed) -> Result<(), SinkError> {
        if let Some(id) = self.handle {
            match self.sink.edit(id, embed.clone()).await {
                Ok(()) => return Ok(()),
                Err(SinkError::NotFound) => {
                    warn!(message_id = id.get(), "Status message disappeared, creating a new one");
                    self.handle = None;
                }
                Err(e) => return Err(e),
            }
        }

        let id = self.sink.create(embed).await?;
        info!(message_id = id.get(), "Created status message");
        self.handle = Some(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use super::*;

    /// In-memory stand-in for the channel: tracks the one message that
    /// "exists" on the platform and counts writes.
    struct MockSink {
        existing: Mutex<Option<MessageId>>,
        next_id: AtomicU64,
        edits: AtomicUsize,
        creates: AtomicUsize,
        transport_down: bool,
    }

    impl MockSink {
        fn new(existing: Option<u64>) -> Self {
            Self {
                existing: Mutex::new(existing.map(MessageId::new)),
                next_id: AtomicU64::new(100),
                edits: AtomicUsize::new(0),
                creates: AtomicUsize::new(0),
                transport_down: false,
            }
        }

        fn delete_externally(&self) {
            *self.existing.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl StatusSink for MockSink {
        async fn edit(&self, id: MessageId, _embed: CreateEmbed) -> Result<(), SinkError> {
            if self.transport_down {
                return Err(SinkError::Discord(serenity::Error::Other("transport down")));
            }
            if *self.existing.lock().unwrap() != Some(id) {
                return Err(SinkError::NotFound);
            }
            self.edits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create(&self, _embed: CreateEmbed) -> Result<MessageId, SinkError> {
            if self.transport_down {
                return Err(SinkError::Discord(serenity::Error::Other("transport down")));
            }
            self.creates.fetch_add(1, Ordering::SeqCst);
            let id = MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            *self.existing.lock().unwrap() = Some(id);
            Ok(id)
        }
    }

    fn embed() -> CreateEmbed {
        CreateEmbed::new().title("estado")
    }

    #[tokio::test]
    async fn creates_once_then_edits() {
        let mut publisher = Publisher::new(MockSink::new(None), None);

        for _ in 0..3 {
            publisher.publish(embed()).await.unwrap();
        }

        assert_eq!(publisher.sink.creates.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.sink.edits.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.handle, *publisher.sink.existing.lock().unwrap());
    }

    #[tokio::test]
    async fn adopted_handle_is_edited_not_recreated() {
        let mut publisher = Publisher::new(MockSink::new(Some(42)), Some(MessageId::new(42)));

        publisher.publish(embed()).await.unwrap();

        assert_eq!(publisher.sink.creates.load(Ordering::SeqCst), 0);
        assert_eq!(publisher.sink.edits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recreates_exactly_once_after_external_delete() {
        let mut publisher = Publisher::new(MockSink::new(None), None);

        publisher.publish(embed()).await.unwrap();
        publisher.sink.delete_externally();

        publisher.publish(embed()).await.unwrap();
        publisher.publish(embed()).await.unwrap();

        assert_eq!(publisher.sink.creates.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.sink.edits.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.handle, *publisher.sink.existing.lock().unwrap());
    }

    #[tokio::test]
    async fn transport_error_propagates_and_keeps_handle() {
        let mut sink = MockSink::new(Some(42));
        sink.transport_down = true;
        let mut publisher = Publisher::new(sink, Some(MessageId::new(42)));

        let err = publisher.publish(embed()).await.unwrap_err();
        assert!(matches!(err, SinkError::Discord(_)));
        assert_eq!(publisher.handle, Some(MessageId::new(42)));
    }
}
