//! Click-fetch binary
//!
//! Every line read from stdin is one click; the line is the search term.
//! The screen is redrawn for every snapshot the store publishes. Ctrl-C or
//! SIGTERM stops reading input; in-flight fetches still drain.

use anyhow::Context;
use click_fetch::admin::{self, AdminState};
use click_fetch::{build_store, render, ClickFetchEnvironment, Config, Dispatcher, FetchSettings, ReqwestClient};
use std::io::BufRead;
use std::sync::Arc;
use tally_runtime::metrics::MetricsRecorder;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "click_fetch=info,tally_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("loading configuration")?;
    tracing::info!(
        endpoint = %config.endpoint,
        limit = config.limit,
        cancel_superseded = config.cancel_superseded,
        "Configuration loaded"
    );

    let mut recorder = MetricsRecorder::new();
    if config.metrics {
        recorder.start().context("installing metrics recorder")?;
    }
    let recorder = Arc::new(recorder);

    let settings = FetchSettings::from(&config);
    let client = ReqwestClient::new(settings.timeout).context("building HTTP client")?;
    let store = build_store(
        ClickFetchEnvironment::new(Arc::new(client), settings),
        config.shutdown_timeout(),
    );

    let mut snapshots = store.subscribe();
    let (stop_view, mut view_stopped) = oneshot::channel::<()>();
    let view = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                snapshot = snapshots.recv() => match snapshot {
                    Some(snapshot) => println!("\n{}", render(&snapshot)),
                    None => break,
                },
                _ = &mut view_stopped => {
                    while let Some(snapshot) = snapshots.try_recv() {
                        println!("\n{}", render(&snapshot));
                    }
                    break;
                },
            }
        }
    });

    let admin = config.admin_addr.map(|addr| {
        let router = admin::router(AdminState {
            store: store.clone(),
            metrics: Arc::clone(&recorder),
        });
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let stopped = async {
                let _ = stopped.await;
            };
            if let Err(error) = tally_web::server::serve(router, addr, stopped).await {
                tracing::error!(%error, "Admin server failed");
            }
        });
        (stop, task)
    });

    let dispatcher = Dispatcher::new(store.clone());
    let mut lines = stdin_lines();
    let clicks = async {
        while let Some(line) = lines.recv().await {
            let line = line.context("reading stdin")?;
            dispatcher.dispatch_click(line.trim()).await?;
        }
        anyhow::Ok(())
    };

    let outcome = tokio::select! {
        outcome = clicks => {
            tracing::info!("Input closed, waiting for in-flight fetches");
            outcome
        },
        () = tally_web::server::shutdown_signal() => {
            tracing::info!("Interrupted, waiting for in-flight fetches");
            Ok(())
        },
    };

    if let Err(error) = store.close().await {
        tracing::warn!(%error, "Store did not drain cleanly");
    }
    let _ = stop_view.send(());
    if let Err(error) = view.await {
        tracing::warn!(%error, "View task failed");
    }

    if let Some((stop, task)) = admin {
        let _ = stop.send(());
        if let Err(error) = task.await {
            tracing::warn!(%error, "Admin task failed");
        }
    }

    if let Some(text) = recorder.render() {
        println!("\n{text}");
    }

    outcome
}

/// Lines of stdin, read on a plain thread so an interrupt never waits for Enter.
fn stdin_lines() -> mpsc::Receiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
