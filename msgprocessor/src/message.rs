use std::fmt;
use std::sync::Arc;

/// Message is the input of [crate::ParallelProcessor::make_documents].
pub trait Message: Send + Sync + 'static {
    /// The partition the documents built from this message belong to. An empty namespace means the
    /// documents are dropped after building.
    fn namespace(&self) -> Namespace;

    /// Selects the [crate::DocumentBuilder] for this message.
    fn message_type(&self) -> MessageType;

    /// Called when the message is skipped, has no builder or fails to build, from within the span
    /// of its build task. Implementations attach their own data to the logs here.
    fn update_log_with_data(&self) {}
}

impl<T: Message + ?Sized> Message for Arc<T> {
    fn namespace(&self) -> Namespace {
        (**self).namespace()
    }

    fn message_type(&self) -> MessageType {
        (**self).message_type()
    }

    fn update_log_with_data(&self) {
        (**self).update_log_with_data()
    }
}

impl<T: Message + ?Sized> Message for Box<T> {
    fn namespace(&self) -> Namespace {
        (**self).namespace()
    }

    fn message_type(&self) -> MessageType {
        (**self).message_type()
    }

    fn update_log_with_data(&self) {
        (**self).update_log_with_data()
    }
}

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(Arc::from(value))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_key!(
    /// Logical partition used to group documents before deduplication.
    Namespace
);

string_key!(
    /// Decides which [crate::DocumentBuilder] handles a message.
    MessageType
);
