use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use crate::error::BuildError;
use crate::message::{Message, Namespace};
use crate::registry::BuilderRegistry;

/// Documents built from the message at the same position of the input batch.
#[derive(Debug)]
pub(crate) struct BuiltDocuments<D> {
    pub(crate) documents: Vec<D>,
    pub(crate) namespace: Namespace,
}

/// What the joining side needs to report a task that did not return.
struct TaskContext<M> {
    index: usize,
    message: Arc<M>,
    span: Span,
}

/// BuildExecutor builds the documents of a batch with one tokio task per message.
///
/// Error handling: all the tasks of a batch share a child of the caller's cancellation token. The
/// first failure we join cancels it so the in-flight builders can stop early, the remaining tasks
/// are still awaited before returning. Structured concurrency is honored, no task outlives
/// [BuildExecutor::execute] and no partial result is returned along with an error.
pub(crate) struct BuildExecutor<M, D> {
    registry: Arc<BuilderRegistry<M, D>>,
}

impl<M, D> Clone for BuildExecutor<M, D> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<M, D> BuildExecutor<M, D>
where
    M: Message,
    D: Send + 'static,
{
    pub(crate) fn new(registry: Arc<BuilderRegistry<M, D>>) -> Self {
        Self { registry }
    }

    /// Builds the documents of every message. On success the result holds one entry per message
    /// in input order, regardless of the order in which the tasks completed.
    pub(crate) async fn execute(
        &self,
        cln_token: &CancellationToken,
        messages: Vec<M>,
    ) -> Result<Vec<BuiltDocuments<D>>, BuildError> {
        let batch_token = cln_token.child_token();

        // every task reports its own index, only this task writes into the slots.
        let mut slots: Vec<Option<BuiltDocuments<D>>> = Vec::with_capacity(messages.len());
        slots.resize_with(messages.len(), || None);

        let mut tasks = JoinSet::new();
        let mut contexts: HashMap<Id, TaskContext<M>> = HashMap::with_capacity(messages.len());
        for (index, message) in messages.into_iter().enumerate() {
            let message = Arc::new(message);
            let span = info_span!(
                "build",
                index,
                message_type = %message.message_type(),
                namespace = %message.namespace()
            );
            let registry = Arc::clone(&self.registry);
            let task_token = batch_token.clone();
            let task_message = Arc::clone(&message);

            let handle = tasks.spawn(
                async move {
                    let result =
                        build_documents(&registry, task_token, index, &*task_message).await;
                    (index, result)
                }
                .instrument(span.clone()),
            );
            contexts.insert(
                handle.id(),
                TaskContext {
                    index,
                    message,
                    span,
                },
            );
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(built))) => {
                    if first_error.is_none()
                        && let Some(slot) = slots.get_mut(index)
                    {
                        *slot = Some(built);
                    }
                }
                Ok((_, Err(e))) => record_failure(&mut first_error, &batch_token, e),
                Err(e) => {
                    let Some(context) = contexts.remove(&e.id()) else {
                        error!(error = %e, "Joined an unknown build task");
                        continue;
                    };
                    let failure = task_failure(context, e);
                    record_failure(&mut first_error, &batch_token, failure);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

/// Turns a panicked or aborted task into the error of its message.
fn task_failure<M: Message>(context: TaskContext<M>, e: JoinError) -> BuildError {
    let TaskContext {
        index,
        message,
        span,
    } = context;
    span.in_scope(|| {
        message.update_log_with_data();
        error!(error = %e, "Build task did not complete");
    });
    BuildError::Task {
        message_type: message.message_type(),
        index,
        reason: e.to_string(),
    }
}

/// Keeps the first failure of the batch and cancels the shared token on it.
fn record_failure(
    first_error: &mut Option<BuildError>,
    batch_token: &CancellationToken,
    error: BuildError,
) {
    if first_error.is_some() {
        debug!(%error, "Dropping build error, an earlier one will be returned");
        return;
    }
    warn!(%error, "Build failed, cancelling the in-flight build tasks");
    batch_token.cancel();
    *first_error = Some(error);
}

/// Looks up the builder of the message and builds its documents.
async fn build_documents<M, D>(
    registry: &BuilderRegistry<M, D>,
    cln_token: CancellationToken,
    index: usize,
    message: &M,
) -> Result<BuiltDocuments<D>, BuildError>
where
    M: Message,
{
    let message_type = message.message_type();
    let Some(builder) = registry.get(&message_type) else {
        message.update_log_with_data();
        error!("Message type has no document builder");
        return Err(BuildError::BuilderNotFound(message_type));
    };

    let documents = match builder.build(cln_token, message).await {
        Ok(documents) => documents,
        Err(e) => {
            message.update_log_with_data();
            error!(error = %e, "Failed to build documents");
            return Err(BuildError::Builder {
                message_type,
                index,
                source: e,
            });
        }
    };

    if documents.is_empty() {
        message.update_log_with_data();
        info!("Message ignored...");
    }

    Ok(BuiltDocuments {
        documents,
        namespace: message.namespace(),
    })
}
