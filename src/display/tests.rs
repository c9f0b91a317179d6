//! Display Module Tests
//!
//! ## Test Scopes
//! - **Ordering**: Events reach the sink in posting order.
//! - **Synchronous flush**: `post_and_wait` returns only after the sink applied the event.
//! - **Affordances**: Tracking start/stop/next from events.

#[cfg(test)]
mod tests {
    use crate::display::context::PresentationContext;
    use crate::display::sink::{ChannelSink, DisplaySink};
    use crate::display::types::{Affordances, DisplayEvent};
    use std::sync::{Arc, Mutex};

    struct Recording(Arc<Mutex<Vec<DisplayEvent>>>);

    impl DisplaySink for Recording {
        fn apply(&mut self, event: DisplayEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    // ============================================================
    // TEST 1: Presentation context
    // ============================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_events_applied_in_order() {
        // ARRANGE
        let (sink, mut rx) = ChannelSink::channel();
        let context = PresentationContext::spawn(sink);
        let presenter = context.presenter();

        // ACT
        presenter.post(DisplayEvent::StartEnabled(false));
        presenter.post(DisplayEvent::GridCleared);
        presenter.post(DisplayEvent::NextEnabled(true));

        // ASSERT: Same order as posted
        assert_eq!(rx.recv().await, Some(DisplayEvent::StartEnabled(false)));
        assert_eq!(rx.recv().await, Some(DisplayEvent::GridCleared));
        assert_eq!(rx.recv().await, Some(DisplayEvent::NextEnabled(true)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_and_wait_from_worker() {
        // ARRANGE
        let log = Arc::new(Mutex::new(Vec::new()));
        let context = PresentationContext::spawn(Recording(log.clone()));
        let presenter = context.presenter();

        // ACT: Post from a blocking worker, as the gatherer does
        let seen = {
            let log = log.clone();
            tokio::task::spawn_blocking(move || {
                presenter.post(DisplayEvent::GridCleared);
                let applied = presenter.post_and_wait(DisplayEvent::StopEnabled(false));
                (applied, log.lock().unwrap().len())
            })
            .await
            .unwrap()
        };

        // ASSERT: Both events were applied before post_and_wait returned
        assert_eq!(seen, (true, 2));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_flush_and_shutdown() {
        // ARRANGE
        let log = Arc::new(Mutex::new(Vec::new()));
        let context = PresentationContext::spawn(Recording(log.clone()));
        let presenter = context.presenter();

        // ACT
        presenter.post(DisplayEvent::SelectionEnabled(true));
        presenter.flush().await;

        // ASSERT
        assert_eq!(log.lock().unwrap().len(), 1);

        // ACT: Post after shutdown
        context.shutdown().await;
        presenter.post(DisplayEvent::GridCleared);
        presenter.flush().await;

        // ASSERT: Dropped silently
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    // ============================================================
    // TEST 2: Affordances
    // ============================================================

    #[test]
    fn test_affordance_tracking() {
        // ARRANGE
        let mut affordances = Affordances::IDLE;

        // ACT
        DisplayEvent::StartEnabled(false).update_affordances(&mut affordances);
        DisplayEvent::StopEnabled(true).update_affordances(&mut affordances);
        DisplayEvent::GridCleared.update_affordances(&mut affordances);

        // ASSERT
        assert_eq!(affordances, Affordances::RUNNING);
    }
}
