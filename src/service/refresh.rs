use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::loader::{Repaint, ServiceEvent};

/// Periodic reload trigger. Stops when dropped.
#[derive(Debug)]
pub struct RefreshTimer {
    handle: JoinHandle<()>,
    period: Duration,
}

impl RefreshTimer {
    pub fn start(
        runtime: &Handle,
        period: Duration,
        tx: UnboundedSender<ServiceEvent>,
        repaint: Repaint,
    ) -> Self {
        debug!(?period, "starting auto-refresh");
        let handle = runtime.spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if tx.send(ServiceEvent::RefreshTick).is_err() {
                    break;
                }
                repaint();
            }
        });
        Self { handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn ticks_after_one_period_not_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = RefreshTimer::start(
            &Handle::current(),
            Duration::from_secs(60),
            tx,
            Arc::new(|| {}),
        );
        assert!(timeout(Duration::from_secs(59), rx.recv()).await.is_err());
        let tick = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(matches!(tick, Some(ServiceEvent::RefreshTick)));
        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = RefreshTimer::start(
            &Handle::current(),
            Duration::from_secs(10),
            tx,
            Arc::new(|| {}),
        );
        drop(timer);
        let next = timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(!matches!(next, Ok(Some(_))));
    }
}
