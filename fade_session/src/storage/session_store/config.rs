use std::sync::Arc;

use crate::storage::errors::StorageError;

use super::types::{InMemorySessionStore, RedisSessionStore, SessionStore};

/// Build a session store backend by name and verify it is reachable.
///
/// Supported types are `memory` (the url is ignored) and `redis`.
pub async fn create_session_store(
    store_type: &str,
    store_url: &str,
) -> Result<Arc<dyn SessionStore>, StorageError> {
    tracing::info!(
        "Initializing session store with type: {}, url: {}",
        store_type,
        store_url
    );

    let store: Arc<dyn SessionStore> = match store_type {
        "memory" => Arc::new(InMemorySessionStore::new()),
        "redis" => {
            let client = redis::Client::open(store_url).map_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
                StorageError::from(e)
            })?;
            Arc::new(RedisSessionStore::new(client))
        }
        t => {
            return Err(StorageError::Storage(format!(
                "Unsupported session store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    if let Err(e) = store.init().await {
        tracing::error!("Failed to connect to session store: {}", e);
        return Err(e);
    }

    tracing::info!(
        "Connected to session store: type={}, url={}",
        store_type,
        store_url
    );

    Ok(store)
}
