use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::message::MessageType;

/// Transforms a single message into zero or more documents.
///
/// Returning an empty list is not an error, the message is skipped and contributes no documents.
/// The token is shared by every build task of the batch and is cancelled as soon as one of them
/// fails, long-running builders should watch it and bail out early.
#[async_trait]
pub trait DocumentBuilder<M, D>: Send + Sync {
    async fn build(
        &self,
        cln_token: CancellationToken,
        message: &M,
    ) -> std::result::Result<Vec<D>, BoxError>;
}

/// BuilderRegistry maps every [MessageType] to its [DocumentBuilder]. It is assembled once and
/// then only read, concurrently, by the build tasks.
pub struct BuilderRegistry<M, D> {
    builders: HashMap<MessageType, Arc<dyn DocumentBuilder<M, D>>>,
}

impl<M, D> BuilderRegistry<M, D> {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registers the builder for the given message type, replacing any previous one.
    pub fn with_builder<B>(self, message_type: impl Into<MessageType>, builder: B) -> Self
    where
        B: DocumentBuilder<M, D> + 'static,
    {
        self.with_shared_builder(message_type, Arc::new(builder))
    }

    /// Same as [BuilderRegistry::with_builder], for a builder that serves more than one type.
    pub fn with_shared_builder(
        mut self,
        message_type: impl Into<MessageType>,
        builder: Arc<dyn DocumentBuilder<M, D>>,
    ) -> Self {
        self.builders.insert(message_type.into(), builder);
        self
    }

    /// Returns the builder registered for the message type, if any.
    pub fn get(&self, message_type: &MessageType) -> Option<Arc<dyn DocumentBuilder<M, D>>> {
        self.builders.get(message_type).map(Arc::clone)
    }

    pub fn contains(&self, message_type: &MessageType) -> bool {
        self.builders.contains_key(message_type)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn message_types(&self) -> impl Iterator<Item = &MessageType> {
        self.builders.keys()
    }
}

impl<M, D> Default for BuilderRegistry<M, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, D> FromIterator<(MessageType, Arc<dyn DocumentBuilder<M, D>>)> for BuilderRegistry<M, D> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (MessageType, Arc<dyn DocumentBuilder<M, D>>)>,
    {
        Self {
            builders: iter.into_iter().collect(),
        }
    }
}

impl<M, D> fmt::Debug for BuilderRegistry<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut message_types: Vec<_> = self.builders.keys().collect();
        message_types.sort();
        f.debug_struct("BuilderRegistry")
            .field("message_types", &message_types)
            .finish()
    }
}
