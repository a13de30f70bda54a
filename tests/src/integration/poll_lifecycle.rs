//! # Polling Lifecycle
//!
//! Polled variables refresh only when the fetched event differs from the
//! cached one, and stop polling once the last observer detaches.

#[cfg(test)]
mod tests {
    use crate::fixtures::{key, TestBus, TestFsm};
    use event_bus::{double_key, ParamSet};
    use event_vars::{EventVariable, VariableConfig, VariableFactory};
    use std::time::Duration;
    use tokio::time::sleep;

    const KEY: &str = "tcs.mount.azimuth";
    const INTERVAL: Duration = Duration::from_millis(100);

    fn azimuth(value: f64) -> ParamSet {
        ParamSet::new().add(double_key("azimuth").set([value]))
    }

    async fn polled(bus: &TestBus) -> EventVariable {
        bus.publish(&key(KEY), azimuth(0.0)).await;
        EventVariable::make(key(KEY), bus.service.clone(), Some(INTERVAL))
            .await
            .expect("make")
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_event_does_not_refresh() -> anyhow::Result<()> {
        let bus = TestBus::new();
        let variable = polled(&bus).await;
        let fsm = TestFsm::new("fsm");
        variable.bind(fsm.clone()).await?;

        sleep(INTERVAL * 5).await;
        assert_eq!(fsm.refreshes(), 0);
        // Polling never opens a bus subscription.
        assert_eq!(bus.bus.total_subscribers(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_is_picked_up_once() -> anyhow::Result<()> {
        let bus = TestBus::new();
        let variable = polled(&bus).await;
        let fsm = TestFsm::new("fsm");
        variable.bind(fsm.clone()).await?;

        sleep(INTERVAL * 3 + INTERVAL / 2).await;
        let update = bus.publish(&key(KEY), azimuth(12.5)).await;

        sleep(INTERVAL).await;
        assert_eq!(fsm.refreshes(), 1);
        assert_eq!(variable.latest_event(), update);

        // Same event on the next polls.
        sleep(INTERVAL * 3).await;
        assert_eq!(fsm.refreshes(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() -> anyhow::Result<()> {
        let bus = TestBus::new();
        let variable = polled(&bus).await;
        let fsm = TestFsm::new("fsm");
        let token = variable.bind(fsm.clone()).await?;

        token.cancel().await?;
        assert!(!variable.is_subscribed().await);

        bus.publish(&key(KEY), azimuth(45.0)).await;
        sleep(INTERVAL * 4).await;
        assert_eq!(fsm.refreshes(), 0);
        assert_eq!(variable.latest_event().key(), &key(KEY));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fsm_stopping_itself_stops_polling() -> anyhow::Result<()> {
        let bus = TestBus::new();
        let variable = polled(&bus).await;
        let fsm = TestFsm::stopping_after("one-shot", 1);
        variable.bind(fsm.clone()).await?;

        bus.publish(&key(KEY), azimuth(1.0)).await;
        sleep(INTERVAL * 2).await;
        assert_eq!(fsm.refreshes(), 1);
        assert!(!variable.is_subscribed().await);

        bus.publish(&key(KEY), azimuth(2.0)).await;
        sleep(INTERVAL * 3).await;
        assert_eq!(fsm.refreshes(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_factory_polling_config() -> anyhow::Result<()> {
        let bus = TestBus::new();
        bus.publish(&key(KEY), azimuth(0.0)).await;
        let factory = VariableFactory::new(bus.service.clone(), VariableConfig::polling(INTERVAL));

        let variable = factory.event_variable(KEY).await?;
        let fsm = TestFsm::new("fsm");
        variable.bind(fsm.clone()).await?;

        bus.publish(&key(KEY), azimuth(3.0)).await;
        sleep(INTERVAL * 2).await;
        assert_eq!(fsm.refreshes(), 1);
        Ok(())
    }
}
