use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::provider::MailClient;

/// Establishes a concrete [`MailClient`] binding on demand.
#[async_trait]
pub trait ClientConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn MailClient>>;
}

/// Re-initializable handle to the mail client binding. The bound client is
/// cached across calls; [`ClientHandle::rebind`] drops the cache and
/// reconnects so liveness probes never trust stale binding state.
pub struct ClientHandle {
    connector: Box<dyn ClientConnector>,
    bound: Mutex<Option<Arc<dyn MailClient>>>,
}

impl ClientHandle {
    pub fn new(connector: Box<dyn ClientConnector>) -> Self {
        Self {
            connector,
            bound: Mutex::new(None),
        }
    }

    /// Wrap an existing client in a handle that always reconnects to it.
    pub fn direct(client: Arc<dyn MailClient>) -> Self {
        Self::new(Box::new(DirectConnector(client)))
    }

    /// Cached binding, connecting on first use.
    pub async fn bind(&self) -> Result<Arc<dyn MailClient>> {
        let mut guard = self.bound.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = self
            .connector
            .connect()
            .await
            .context("Failed to bind the mail client")?;
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop any cached binding and connect afresh.
    pub async fn rebind(&self) -> Result<Arc<dyn MailClient>> {
        let mut guard = self.bound.lock().await;
        guard.take();

        let client = self
            .connector
            .connect()
            .await
            .context("Failed to bind the mail client")?;
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Rebind and run a liveness check, returning the verified client.
    pub async fn probe(&self) -> Result<Arc<dyn MailClient>> {
        let client = self.rebind().await?;
        client
            .health_check()
            .await
            .context("Mail client is not reachable")?;
        Ok(client)
    }
}

struct DirectConnector(Arc<dyn MailClient>);

#[async_trait]
impl ClientConnector for DirectConnector {
    async fn connect(&self) -> Result<Arc<dyn MailClient>> {
        Ok(Arc::clone(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::client::memory::MemoryMailClient;

    struct CountingConnector {
        client: Arc<MemoryMailClient>,
        connects: AtomicUsize,
    }

    #[async_trait]
    impl ClientConnector for Arc<CountingConnector> {
        async fn connect(&self) -> Result<Arc<dyn MailClient>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.client) as Arc<dyn MailClient>)
        }
    }

    fn counting_handle() -> (ClientHandle, Arc<CountingConnector>) {
        let connector = Arc::new(CountingConnector {
            client: Arc::new(MemoryMailClient::new()),
            connects: AtomicUsize::new(0),
        });
        (ClientHandle::new(Box::new(Arc::clone(&connector))), connector)
    }

    #[tokio::test]
    async fn bind_reuses_the_cached_binding() {
        let (handle, connector) = counting_handle();
        handle.bind().await.unwrap();
        handle.bind().await.unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rebind_always_reconnects() {
        let (handle, connector) = counting_handle();
        handle.bind().await.unwrap();
        handle.rebind().await.unwrap();
        handle.probe().await.unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn probe_fails_when_the_client_is_offline() {
        let client = Arc::new(MemoryMailClient::new());
        client.set_offline(true).await;
        let handle = ClientHandle::direct(client);
        assert!(handle.probe().await.is_err());
    }
}
