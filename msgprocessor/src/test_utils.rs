use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::message::{Message, MessageType, Namespace};
use crate::registry::DocumentBuilder;

#[derive(Debug, Clone)]
pub(crate) struct TestMessage {
    pub(crate) id: String,
    pub(crate) namespace: Namespace,
    pub(crate) message_type: MessageType,
    pub(crate) hook_calls: Arc<AtomicUsize>,
}

impl TestMessage {
    pub(crate) fn new(id: &str, namespace: &str, message_type: &str) -> Self {
        Self {
            id: id.to_string(),
            namespace: namespace.into(),
            message_type: message_type.into(),
            hook_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn hook_calls(&self) -> usize {
        self.hook_calls.load(Ordering::SeqCst)
    }
}

impl Message for TestMessage {
    fn namespace(&self) -> Namespace {
        self.namespace.clone()
    }

    fn message_type(&self) -> MessageType {
        self.message_type.clone()
    }

    fn update_log_with_data(&self) {
        self.hook_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TestDocument {
    pub(crate) id: String,
}

impl TestDocument {
    pub(crate) fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

pub(crate) fn docs<const N: usize>(ids: [&str; N]) -> Vec<TestDocument> {
    ids.into_iter().map(TestDocument::new).collect()
}

pub(crate) fn sorted(mut documents: Vec<TestDocument>) -> Vec<TestDocument> {
    documents.sort();
    documents
}

/// Builds the same documents for every message.
pub(crate) struct FixedBuilder {
    documents: Vec<TestDocument>,
}

impl FixedBuilder {
    pub(crate) fn new<const N: usize>(ids: [&str; N]) -> Self {
        Self {
            documents: docs(ids),
        }
    }
}

#[async_trait]
impl DocumentBuilder<TestMessage, TestDocument> for FixedBuilder {
    async fn build(
        &self,
        _cln_token: CancellationToken,
        _message: &TestMessage,
    ) -> Result<Vec<TestDocument>, BoxError> {
        Ok(self.documents.clone())
    }
}

/// What [ScriptedBuilder] does for a given message.
#[derive(Clone)]
pub(crate) enum Outcome {
    Documents(Vec<TestDocument>),
    Skip,
    Fail(&'static str),
    Panic,
    /// Sleeps before returning the documents.
    Delayed(Duration, Vec<TestDocument>),
    /// Fails after the delay.
    DelayedFail(Duration, &'static str),
    /// Blocks until the shared token is cancelled and flags it.
    AwaitCancellation(Arc<AtomicBool>),
    /// Ignores cancellation, flags that it finished after the delay.
    Completes(Duration, Arc<AtomicBool>),
}

/// Builder with a scripted [Outcome] per (namespace, id) of the message.
#[derive(Default)]
pub(crate) struct ScriptedBuilder {
    outcomes: HashMap<(String, String), Outcome>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, namespace: &str, id: &str, outcome: Outcome) -> Self {
        self.outcomes
            .insert((namespace.to_string(), id.to_string()), outcome);
        self
    }

    /// Handle to the number of times build was called.
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl DocumentBuilder<TestMessage, TestDocument> for ScriptedBuilder {
    async fn build(
        &self,
        cln_token: CancellationToken,
        message: &TestMessage,
    ) -> Result<Vec<TestDocument>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let key = (message.namespace.to_string(), message.id.clone());
        let Some(outcome) = self.outcomes.get(&key).cloned() else {
            return Err(format!("unexpected message {key:?}").into());
        };

        match outcome {
            Outcome::Documents(documents) => Ok(documents),
            Outcome::Skip => Ok(vec![]),
            Outcome::Fail(reason) => Err(reason.into()),
            Outcome::Panic => panic!("builder panicked on {}", message.id),
            Outcome::Delayed(delay, documents) => {
                tokio::time::sleep(delay).await;
                Ok(documents)
            }
            Outcome::DelayedFail(delay, reason) => {
                tokio::time::sleep(delay).await;
                Err(reason.into())
            }
            Outcome::Completes(delay, completed) => {
                tokio::time::sleep(delay).await;
                completed.store(true, Ordering::SeqCst);
                Ok(vec![])
            }
            Outcome::AwaitCancellation(observed) => {
                tokio::select! {
                    _ = cln_token.cancelled() => {
                        observed.store(true, Ordering::SeqCst);
                        Err("cancelled".into())
                    }
                    _ = tokio::time::sleep(Duration::from_secs(10)) => {
                        Ok(docs(["never-cancelled"]))
                    }
                }
            }
        }
    }
}
