use std::collections::HashMap;

use crate::executor::BuiltDocuments;
use crate::message::Namespace;

/// Groups the built documents by namespace. The input is walked in message order so the order of
/// the documents within a namespace only depends on the input batch. Messages without documents
/// or without a namespace are dropped.
pub(crate) fn group_by_namespace<D>(built: Vec<BuiltDocuments<D>>) -> HashMap<Namespace, Vec<D>> {
    let mut documents_by_namespace: HashMap<Namespace, Vec<D>> = HashMap::new();

    for BuiltDocuments {
        documents,
        namespace,
    } in built
    {
        if documents.is_empty() || namespace.is_empty() {
            continue;
        }
        documents_by_namespace
            .entry(namespace)
            .or_default()
            .extend(documents);
    }

    documents_by_namespace
}
