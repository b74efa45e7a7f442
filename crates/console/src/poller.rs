use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::sync::Synchronizer;
use crate::transport::Transport;

/// Which screen of the console is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    NewDownload,
    ActiveDownloads,
    History,
}

impl View {
    /// Views rendered from the Job Store; the poll timer only runs under these.
    pub fn consumes_jobs(self) -> bool {
        matches!(self, View::ActiveDownloads | View::History)
    }
}

/// Background sync timer.
///
/// Ticks every `period` while the current view consumes jobs, and refreshes
/// right away when the operator switches into such a view.
pub struct Poller {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn<T>(
        sync: Arc<Synchronizer<T>>,
        mut views: watch::Receiver<View>,
        period: Duration,
    ) -> Self
    where
        T: Transport + 'static,
    {
        // Anything sent after this point reaches the task as a change.
        let shown = *views.borrow_and_update();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run(sync, views, stop_rx, period, shown));
        Self { stop_tx, handle }
    }

    /// Stops the timer and waits for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn run<T>(
    sync: Arc<Synchronizer<T>>,
    mut views: watch::Receiver<View>,
    mut stop_rx: watch::Receiver<bool>,
    period: Duration,
    mut shown: View,
) where
    T: Transport + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The session syncs once at init; the first timer fetch is one period out.
    ticker.reset();

    info!(period_ms = period.as_millis() as u64, ?shown, "poll timer started");
    loop {
        if *stop_rx.borrow() {
            break;
        }
        let polling = shown.consumes_jobs();

        tokio::select! {
            stopped = stop_rx.changed() => {
                if stopped.is_err() {
                    break;
                }
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = *views.borrow_and_update();
                if view != shown {
                    debug!(from = ?shown, to = ?view, "view switched");
                    shown = view;
                    if view.consumes_jobs() {
                        trigger(&sync);
                        ticker.reset();
                    }
                }
            }
            _ = ticker.tick(), if polling => trigger(&sync),
        }
    }
    info!("poll timer stopped");
}

/// Runs one timer sync off the loop so a slow fetch never delays shutdown.
fn trigger<T>(sync: &Arc<Synchronizer<T>>)
where
    T: Transport + 'static,
{
    let sync = Arc::clone(sync);
    tokio::spawn(async move {
        sync.tick().await;
    });
}
