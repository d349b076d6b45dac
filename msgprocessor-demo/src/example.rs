use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use msgprocessor::{
    BoxError, BuilderRegistry, DocumentBuilder, LastWriteWins, Message, MessageType, Namespace,
    ParallelProcessor,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub(crate) const EXAMPLE_TYPE: &str = "typeExample";

/// A parent with the names of their children.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExampleMessage {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) age: i32,
    pub(crate) city: String,
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) children_names: Vec<String>,
    #[serde(default)]
    pub(crate) namespace: String,
}

impl Message for ExampleMessage {
    fn namespace(&self) -> Namespace {
        Namespace::from(self.namespace.as_str())
    }

    fn message_type(&self) -> MessageType {
        MessageType::from(EXAMPLE_TYPE)
    }

    fn update_log_with_data(&self) {
        info!(
            msg_id = self.id,
            msg_name = %self.name,
            msg_children_names = ?self.children_names,
            msg_age = self.age,
            msg_city = %self.city,
            msg_state = %self.state,
            "Message data"
        );
    }
}

/// One document per child of an [ExampleMessage].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ExampleDocument {
    #[serde(rename = "ID")]
    pub(crate) id: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) parent_name: String,
    pub(crate) parent_birth_year: i32,
    pub(crate) child_name: String,
    pub(crate) city_and_state: String,
    pub(crate) namespace: String,
}

pub(crate) struct ExampleBuilder;

#[async_trait]
impl DocumentBuilder<ExampleMessage, ExampleDocument> for ExampleBuilder {
    async fn build(
        &self,
        _cln_token: CancellationToken,
        message: &ExampleMessage,
    ) -> Result<Vec<ExampleDocument>, BoxError> {
        // parents without children are skipped
        let now = Utc::now();
        let documents = message
            .children_names
            .iter()
            .map(|child_name| ExampleDocument {
                id: format!("{}_{}", message.id, child_name),
                created_at: now,
                parent_name: message.name.clone(),
                parent_birth_year: now.year() - message.age,
                child_name: child_name.clone(),
                city_and_state: format!("{} - {}", message.city, message.state),
                namespace: message.namespace.clone(),
            })
            .collect();
        Ok(documents)
    }
}

/// Processor for [ExampleMessage]s, keeping the latest document per ID in each namespace.
pub(crate) fn processor() -> ParallelProcessor<ExampleMessage, ExampleDocument> {
    let registry = BuilderRegistry::new().with_builder(EXAMPLE_TYPE, ExampleBuilder);
    ParallelProcessor::new(registry)
        .with_deduplicate(LastWriteWins::new(|d: &ExampleDocument| d.id.clone()))
}

fn message(
    id: i64,
    name: &str,
    age: i32,
    (city, state): (&str, &str),
    children_names: &[&str],
    namespace: &str,
) -> ExampleMessage {
    ExampleMessage {
        id,
        name: name.to_string(),
        age,
        city: city.to_string(),
        state: state.to_string(),
        children_names: children_names.iter().map(ToString::to_string).collect(),
        namespace: namespace.to_string(),
    }
}

/// Batch used when no messages file is given. It has a parent without children and repeated
/// messages within and across namespaces.
pub(crate) fn sample_messages() -> Vec<ExampleMessage> {
    let john = message(
        1,
        "John",
        30,
        ("New York", "NY"),
        &["John", "Jane", "Mary"],
        "namespace1",
    );
    let chris = message(3, "Chris", 35, ("Washington", "DC"), &["Bob"], "namespace1");
    vec![
        john.clone(),
        message(2, "Poul", 25, ("New Jersey", "NY"), &[], "namespace1"),
        chris.clone(),
        ExampleMessage {
            namespace: "namespace2".to_string(),
            ..chris
        },
        john,
    ]
}
