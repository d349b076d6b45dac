use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};

use crate::deduplicate::{Deduplicate, Identity};
use crate::error::{Error, Result};
use crate::executor::BuildExecutor;
use crate::grouper::group_by_namespace;
use crate::message::{Message, Namespace};
use crate::registry::BuilderRegistry;

/// Turns a batch of messages into documents.
#[trait_variant::make(Send)]
pub trait DocumentProcessor<M, D> {
    /// Returns all the documents of the batch, or the first error with its [crate::ErrorCode].
    /// Documents are never returned along with an error.
    async fn make_documents(
        &self,
        cln_token: &CancellationToken,
        messages: Vec<M>,
    ) -> Result<Vec<D>>;
}

/// ParallelProcessor builds the documents of every message concurrently and deduplicates them per
/// namespace. It is cheap to clone and can be shared by many callers.
pub struct ParallelProcessor<M, D> {
    registry: Arc<BuilderRegistry<M, D>>,
    executor: BuildExecutor<M, D>,
    deduplicate: Arc<dyn Deduplicate<D>>,
}

impl<M, D> Clone for ParallelProcessor<M, D> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            executor: self.executor.clone(),
            deduplicate: Arc::clone(&self.deduplicate),
        }
    }
}

impl<M, D> fmt::Debug for ParallelProcessor<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelProcessor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<M, D> ParallelProcessor<M, D>
where
    M: Message,
    D: Send + 'static,
{
    /// Creates a processor which does not deduplicate, see [ParallelProcessor::with_deduplicate].
    pub fn new(registry: BuilderRegistry<M, D>) -> Self {
        let registry = Arc::new(registry);
        Self {
            executor: BuildExecutor::new(Arc::clone(&registry)),
            registry,
            deduplicate: Arc::new(Identity),
        }
    }

    /// Sets the strategy used to deduplicate the documents of each namespace.
    pub fn with_deduplicate(mut self, deduplicate: impl Deduplicate<D> + 'static) -> Self {
        self.deduplicate = Arc::new(deduplicate);
        self
    }

    /// Builds the documents of the messages in parallel, groups them by namespace and deduplicates
    /// each namespace. Documents of messages with an empty namespace are dropped. The order of the
    /// documents across namespaces is unspecified.
    ///
    /// Errors carry [crate::ErrorCode::BuildDocuments] or
    /// [crate::ErrorCode::DeduplicateDocuments] depending on the failing phase.
    pub async fn make_documents(
        &self,
        cln_token: &CancellationToken,
        messages: Vec<M>,
    ) -> Result<Vec<D>> {
        let span = info_span!("make_documents", messages = messages.len());
        async move {
            let built = self.executor.execute(cln_token, messages).await?;
            self.deduplicate_each_namespace(group_by_namespace(built))
        }
        .instrument(span)
        .await
    }

    fn deduplicate_each_namespace(
        &self,
        documents_by_namespace: HashMap<Namespace, Vec<D>>,
    ) -> Result<Vec<D>> {
        let mut documents =
            Vec::with_capacity(documents_by_namespace.values().map(Vec::len).sum());

        for (namespace, namespace_documents) in documents_by_namespace {
            let received = namespace_documents.len();
            let deduplicated = self
                .deduplicate
                .deduplicate(namespace_documents)
                .map_err(|source| Error::Deduplicate {
                    namespace: namespace.clone(),
                    source,
                })?;
            debug!(%namespace, received, kept = deduplicated.len(), "Deduplicated documents");
            documents.extend(deduplicated);
        }

        Ok(documents)
    }
}

impl<M, D> DocumentProcessor<M, D> for ParallelProcessor<M, D>
where
    M: Message,
    D: Send + 'static,
{
    async fn make_documents(
        &self,
        cln_token: &CancellationToken,
        messages: Vec<M>,
    ) -> Result<Vec<D>> {
        ParallelProcessor::make_documents(self, cln_token, messages).await
    }
}
