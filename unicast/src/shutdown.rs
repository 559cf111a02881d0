use tokio::sync::watch;

/// Owned by the [`UnicastContext`], tells the listener and the dispatcher
/// to stop.
///
/// The signal is one-way: once raised it stays raised.
///
/// [`UnicastContext`]: crate::UnicastContext
pub(crate) struct ShutdownController(watch::Sender<bool>);

/// Handed to every background task of the context.
#[derive(Clone)]
pub(crate) struct ShutdownReceiver(watch::Receiver<bool>);

impl ShutdownController {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self(sender)
    }

    pub(crate) fn subscribe(&self) -> ShutdownReceiver {
        ShutdownReceiver(self.0.subscribe())
    }

    /// raise the signal for every subscribed task
    pub(crate) fn signal(self) {
        self.0.send_replace(true);
    }
}

impl ShutdownReceiver {
    /// Resolves to `true` once the signal is raised.
    ///
    /// Dropping the [`ShutdownController`] without signalling counts as a
    /// shutdown too: the context is gone and nobody would ever raise it.
    pub(crate) async fn is_shutting_down(&mut self) -> bool {
        self.0.wait_for(|raised| *raised).await.map(|r| *r).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn signal_reaches_every_receiver() {
        let controller = ShutdownController::new();
        let mut listener = controller.subscribe();
        let mut dispatcher = listener.clone();

        controller.signal();

        assert!(listener.is_shutting_down().await);
        assert!(dispatcher.is_shutting_down().await);
    }

    #[tokio::test]
    async fn dropped_controller_is_a_shutdown() {
        let controller = ShutdownController::new();
        let mut receiver = controller.subscribe();

        drop(controller);

        assert!(receiver.is_shutting_down().await);
    }

    #[tokio::test]
    async fn no_signal_keeps_waiting() {
        let controller = ShutdownController::new();
        let mut receiver = controller.subscribe();

        let waited = timeout(Duration::from_millis(20), receiver.is_shutting_down()).await;
        assert!(waited.is_err());

        controller.signal();
    }
}
