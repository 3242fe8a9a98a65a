//! Connection-aware execution of persistence operations with one bounded retry.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::StorageError;

/// Connection lifecycle of a persistence backend.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Establish the connection. Must be a no-op when already connected.
    async fn connect(&self) -> Result<(), StorageError>;

    /// Close the connection.
    async fn disconnect(&self) -> Result<(), StorageError>;
}

/// Decides whether a failed operation is worth one reconnect-and-retry.
pub trait TransientClassifier: Send + Sync {
    /// `true` when `error` is a dropped or unreachable connection.
    fn is_transient(&self, error: &StorageError) -> bool;
}

impl<F> TransientClassifier for F
where
    F: Fn(&StorageError) -> bool + Send + Sync,
{
    fn is_transient(&self, error: &StorageError) -> bool {
        self(error)
    }
}

/// Message fragments that identify a lost connection in backend errors.
pub const DEFAULT_TRANSIENT_SIGNATURES: &[&str] = &[
    "server has closed the connection",
    "connection closed",
    "can't reach database server",
    "connection reset",
    "broken pipe",
    "p1001",
    "p1017",
];

/// Default classifier: connection variants plus known backend signatures.
#[derive(Debug, Clone)]
pub struct DisconnectClassifier {
    signatures: Vec<String>,
}

impl DisconnectClassifier {
    /// Classifier matching the given (case-insensitive) message fragments.
    pub fn with_signatures(signatures: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            signatures: signatures
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
        }
    }

    /// Configured signatures.
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }
}

impl Default for DisconnectClassifier {
    fn default() -> Self {
        Self::with_signatures(DEFAULT_TRANSIENT_SIGNATURES.iter().copied())
    }
}

impl TransientClassifier for DisconnectClassifier {
    fn is_transient(&self, error: &StorageError) -> bool {
        match error {
            StorageError::ConnectionClosed(_) | StorageError::Unreachable(_) => true,
            StorageError::Backend(message) => {
                let message = message.to_lowercase();
                self.signatures.iter().any(|sig| message.contains(sig))
            }
            StorageError::Query(_) => false,
        }
    }
}

/// Runs persistence operations against a [`Connection`], retrying once after a
/// transient disconnect.
///
/// The retry replays the operation as-is. Multi-step operations must be safe
/// to run twice when the first attempt failed before mutating durable state.
pub struct ResilientExecutor<C: ?Sized> {
    connection: Arc<C>,
    classifier: Arc<dyn TransientClassifier>,
    retries: AtomicU64,
}

impl<C> ResilientExecutor<C>
where
    C: Connection + ?Sized,
{
    /// Executor using the [`DisconnectClassifier`] defaults.
    pub fn new(connection: Arc<C>) -> Self {
        Self::with_classifier(connection, Arc::new(DisconnectClassifier::default()))
    }

    /// Executor with a caller-supplied transient-error classifier.
    pub fn with_classifier(connection: Arc<C>, classifier: Arc<dyn TransientClassifier>) -> Self {
        Self {
            connection,
            classifier,
            retries: AtomicU64::new(0),
        }
    }

    /// Number of reconnect-and-retry cycles performed so far.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Run `operation`, reconnecting and retrying exactly once on a transient error.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StorageError>> + Send,
        T: Send,
    {
        self.connection.connect().await?;

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !self.classifier.is_transient(&err) {
            tracing::debug!("storage operation failed with non-transient error: {}", err);
            return Err(err);
        }

        tracing::warn!("transient storage error, reconnecting before retry: {}", err);
        if let Err(close_err) = self.connection.disconnect().await {
            tracing::debug!("ignoring error while closing stale connection: {}", close_err);
        }
        self.connection.connect().await?;
        self.retries.fetch_add(1, Ordering::Relaxed);

        operation().await.inspect_err(|retry_err| {
            tracing::error!("storage operation failed after reconnect: {}", retry_err);
        })
    }
}
