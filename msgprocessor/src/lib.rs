//! Builds documents out of a batch of messages concurrently and deduplicates them per namespace.
//!
//! [ParallelProcessor::make_documents] executes the following for every batch:
//! - Spawns one task per message which looks up the [DocumentBuilder] for the message type in the
//!   [BuilderRegistry] and builds zero or more documents. The first failure cancels the token
//!   shared by all the tasks of the batch.
//! - Groups the built documents by [Namespace] in the order the messages were given.
//! - Runs the [Deduplicate] strategy once per namespace and flattens the result.

mod error;
pub use crate::error::{BoxError, BuildError, Error, ErrorCode, Result};

mod message;
pub use crate::message::{Message, MessageType, Namespace};

/// Immutable lookup table from [MessageType] to the [DocumentBuilder] that handles it.
mod registry;
pub use crate::registry::{BuilderRegistry, DocumentBuilder};

/// Fan-out/fan-in of the build tasks, one tokio task per message.
mod executor;

/// Partitions the built documents by namespace.
mod grouper;

/// Pluggable per-namespace deduplication.
mod deduplicate;
pub use crate::deduplicate::{Deduplicate, Identity, LastWriteWins};

mod processor;
pub use crate::processor::{DocumentProcessor, ParallelProcessor};

#[cfg(test)]
mod test_utils;
