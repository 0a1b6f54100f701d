//! Connection observer
//!
//! Forwards network-state transitions from the provider into the scheduler
//! mailbox. The actor decides what to do with them: if the network is usable
//! it re-arms both queues, otherwise nothing happens.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;

use super::messages::SchedulerCommand;
use crate::network::ConnectionType;

pub(crate) struct ConnectionObserver;

impl ConnectionObserver {
    /// Start forwarding `changes` to the scheduler behind `mailbox`.
    ///
    /// The task ends when the provider closes its channel or the scheduler
    /// is gone.
    pub(crate) fn spawn(
        mut changes: broadcast::Receiver<ConnectionType>,
        mailbox: WeakUnboundedSender<SchedulerCommand>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let connection = match changes.recv().await {
                    Ok(connection) => connection,
                    // Missed events; the actor re-reads live state anyway
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "ConnectionObserver lagged behind provider");
                        ConnectionType::Unknown
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("ConnectionObserver: provider closed");
                        break;
                    }
                };

                let Some(tx) = mailbox.upgrade() else {
                    break;
                };
                if tx.send(SchedulerCommand::ConnectionChanged(connection)).is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_forwards_changes() {
        let (provider, changes) = broadcast::channel(4);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ConnectionObserver::spawn(changes, tx.downgrade());

        provider.send(ConnectionType::Wifi).unwrap();
        match rx.recv().await {
            Some(SchedulerCommand::ConnectionChanged(ConnectionType::Wifi)) => {}
            _ => panic!("expected ConnectionChanged(Wifi)"),
        }

        drop(provider);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("observer should stop when the provider closes")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_scheduler_gone() {
        let (provider, changes) = broadcast::channel(4);
        let (tx, rx) = mpsc::unbounded_channel::<SchedulerCommand>();
        let handle = ConnectionObserver::spawn(changes, tx.downgrade());

        drop(tx);
        drop(rx);
        provider.send(ConnectionType::Ethernet).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("observer should stop once the mailbox is gone")
            .unwrap();
    }
}
