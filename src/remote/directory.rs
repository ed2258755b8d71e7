use async_trait::async_trait;
use tracing::info;

use super::{HostContact, HostNotifier, RemoteFailure, VisitorDirectory};

/// Directory backed by a fixed host list, usually from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    hosts: Vec<HostContact>,
}

impl StaticDirectory {
    /// Creates a directory over `hosts`.
    pub fn new(hosts: Vec<HostContact>) -> Self {
        Self { hosts }
    }
}

#[async_trait]
impl VisitorDirectory for StaticDirectory {
    async fn list_hosts(&self) -> Result<Vec<HostContact>, RemoteFailure> {
        Ok(self.hosts.clone())
    }
}

/// Text sent to a host when their visitor checks in.
pub fn arrival_message(visitor_name: &str, purpose: &str) -> String {
    format!(
        "Hi! You have a visitor: {visitor_name} is here to see you.\n\nPurpose: {purpose}\n\nPlease come to reception when convenient."
    )
}

/// Notifier that writes the arrival message to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl HostNotifier for LogNotifier {
    async fn notify(
        &self,
        host: &HostContact,
        visitor_name: &str,
        purpose: &str,
    ) -> Result<(), RemoteFailure> {
        let message = arrival_message(visitor_name, purpose);
        info!(host_id = %host.id, host = %host.display_name, %message, "host notification");
        Ok(())
    }
}
