//! Serving a router with request tracing and graceful shutdown.

use crate::middleware::correlation_id_layer;
use axum::Router;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Wrap a router with the standard observability layers.
///
/// Every request gets a [`RequestId`](crate::RequestId) and a `tower-http` trace span.
#[must_use]
pub fn with_observability(router: Router) -> Router {
    router
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve `router` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<F>(router: Router, addr: SocketAddr, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_listener(listener, router, shutdown).await
}

/// Serve `router` on an already bound listener until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after the signal.
///
/// # Errors
///
/// Returns an error if the listener address is unavailable or the server fails.
pub async fn serve_listener<F>(listener: TcpListener, router: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "HTTP server listening");

    axum::serve(listener, with_observability(router))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!(%local_addr, "HTTP server stopped");
    Ok(())
}

/// Resolve when the process receives Ctrl-C or, on Unix, SIGTERM.
///
/// A signal that cannot be listened for never resolves its branch.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(error) => {
                tracing::warn!(%error, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::handlers::health_check;
    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn serves_until_shutdown() {
        tally_testing::helpers::init_test_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let router = Router::new().route("/health", get(health_check));
        let server = tokio::spawn(serve_listener(listener, router, async move {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.to_ascii_lowercase().contains("x-correlation-id"));
        assert!(response.ends_with("ok"));

        stop.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_resolves_shutdown_signal() {
        use std::time::Duration;

        let waiting = tokio::spawn(shutdown_signal());
        // Let the handlers install before raising the signal
        tokio::time::sleep(Duration::from_millis(50)).await;

        let raised = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(raised.success());

        let resolved = tokio::time::timeout(Duration::from_secs(2), waiting).await;
        assert!(matches!(resolved, Ok(Ok(()))));
    }
}
