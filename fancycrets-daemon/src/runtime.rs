use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use fancycrets_core::SecretApi;
use fancycrets_reconcile::{ApplyOutcome, Event, Outcome, Reconciler};

use crate::error::DaemonError;
use crate::http_api::HttpSecretApi;
use crate::settings::Settings;
use crate::watcher::{poll_namespace, RequeueSet, SecretLister};

const EVENT_QUEUE_DEPTH: usize = 256;

/// Counters reported when the processor shuts down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    pub handled: usize,
    pub patched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Build the API client from `settings` and run the controller until ctrl-c.
pub fn start_blocking(settings: Settings) -> Result<(), DaemonError> {
    init_tracing();
    settings.validate()?;
    let api = Arc::new(HttpSecretApi::from_settings(&settings)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| crate::error::io_err("tokio-runtime", e))?;

    runtime.block_on(async move {
        let (shutdown_tx, _) = broadcast::channel::<()>(16);
        let signal = tokio::spawn(forward_ctrl_c(
            tokio::signal::ctrl_c(),
            shutdown_tx.clone(),
            shutdown_tx.subscribe(),
        ));
        let stats = run_until(&settings, api, shutdown_tx.clone()).await;
        let _ = shutdown_tx.send(());
        let signal_result = signal.await?;
        let stats = stats?;
        signal_result?;
        tracing::info!(
            handled = stats.handled,
            patched = stats.patched,
            failed = stats.failed,
            "controller stopped"
        );
        Ok::<(), DaemonError>(())
    })
}

/// Broadcast shutdown once `signal` resolves. A failing signal handler stops
/// the controller too and is reported as [`DaemonError::Signal`].
async fn forward_ctrl_c<F>(
    signal: F,
    shutdown: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        _ = shutdown_rx.recv() => Ok(()),
        result = signal => {
            let _ = shutdown.send(());
            match result {
                Ok(()) => {
                    tracing::info!("received ctrl-c, shutting down controller");
                    Ok(())
                }
                Err(err) => Err(DaemonError::Signal(format!("ctrl-c handler failed: {err}"))),
            }
        }
    }
}

/// Configured namespaces with repeats removed, in first-seen order.
fn unique_namespaces(settings: &Settings) -> Vec<String> {
    let mut seen = BTreeSet::new();
    settings
        .namespaces
        .iter()
        .filter(|namespace| seen.insert((*namespace).clone()))
        .cloned()
        .collect()
}

/// Run pollers and the event processor until `shutdown` fires.
///
/// The client is shared by every task; it is built once by the caller. Each
/// namespace gets exactly one poller, even if it is listed more than once.
pub async fn run_until<A>(
    settings: &Settings,
    api: Arc<A>,
    shutdown: broadcast::Sender<()>,
) -> Result<ProcessorStats, DaemonError>
where
    A: SecretApi + SecretLister + 'static,
{
    let (events_tx, events_rx) = mpsc::channel::<Event>(EVENT_QUEUE_DEPTH);
    let requeue: RequeueSet = Arc::default();

    let namespaces = unique_namespaces(settings);
    if namespaces.len() < settings.namespaces.len() {
        tracing::warn!(namespaces = ?settings.namespaces, "ignoring repeated namespaces");
    }
    let mut pollers = Vec::with_capacity(namespaces.len());
    for namespace in namespaces {
        tracing::info!(namespace = %namespace, interval_secs = settings.poll_interval_secs, "watching secrets");
        let lister: Arc<dyn SecretLister> = api.clone();
        pollers.push(tokio::spawn(poll_namespace(
            lister,
            namespace,
            settings.poll_interval(),
            requeue.clone(),
            events_tx.clone(),
            shutdown.subscribe(),
        )));
    }
    drop(events_tx);

    let reconciler = Reconciler::new(api);
    let processor = tokio::spawn(process_events(
        reconciler,
        events_rx,
        requeue,
        shutdown.subscribe(),
    ));

    let mut first_error = None;
    for poller in pollers {
        if let Err(err) = poller.await? {
            tracing::error!(error = %err, "poller exited with error");
            let _ = shutdown.send(());
            first_error.get_or_insert(err);
        }
    }
    let stats = processor.await??;
    match first_error {
        Some(err) => Err(err),
        None => Ok(stats),
    }
}

/// Handle events one at a time; a failed object is queued for another attempt.
pub(crate) async fn process_events(
    reconciler: Reconciler,
    mut events_rx: mpsc::Receiver<Event>,
    requeue: RequeueSet,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<ProcessorStats, DaemonError> {
    let mut stats = ProcessorStats::default();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                let kind = event.kind();
                let object = event.object_ref();
                let (namespace, name) = requeue_key(&event);
                let result = {
                    let reconciler = reconciler.clone();
                    tokio::task::spawn_blocking(move || reconciler.handle(&event)).await?
                };
                stats.handled += 1;
                match result {
                    Ok(Outcome::Composed(ApplyOutcome::Patched { keys })) => {
                        stats.patched += 1;
                        tracing::info!(event = kind, object = %object, keys = ?keys, "composed");
                    }
                    Ok(Outcome::Skipped) => {
                        stats.skipped += 1;
                    }
                    Ok(outcome) => {
                        tracing::debug!(event = kind, object = %object, outcome = ?outcome, "handled");
                    }
                    Err(err) => {
                        stats.failed += 1;
                        tracing::warn!(event = kind, object = %object, error = %err, "reconcile failed, will retry on next poll");
                        if let Ok(mut pending) = requeue.lock() {
                            pending.insert((namespace, name));
                        }
                    }
                }
            }
        }
    }
    Ok(stats)
}

fn requeue_key(event: &Event) -> (String, String) {
    let body = match event {
        Event::Create { body, .. } | Event::Update { body, .. } | Event::Delete { body, .. } => body,
    };
    (body.namespace().to_owned(), body.name().to_owned())
}

/// Install the `tracing` subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
