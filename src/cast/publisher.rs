//! HTTP publisher that lets a cast receiver fetch local files.
//!
//! Each registered track gets a URL under `/media/:id`. The server runs on its
//! own thread with a single-threaded tokio runtime so the rest of the player
//! stays free of async code.

use std::collections::HashMap;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use axum::Router;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use thiserror::Error;
use tokio::sync::oneshot;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::config::CastSettings;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("stream publisher is already running")]
    AlreadyRunning,
    #[error("stream publisher is not running")]
    NotRunning,
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves local media to the remote sink.
///
/// `start` on a running publisher and `stop` on a stopped one report
/// `AlreadyRunning` / `NotRunning`; callers are expected to ignore those.
pub trait StreamPublisher: Send + Sync {
    fn start(&self) -> Result<(), PublisherError>;
    fn stop(&self) -> Result<(), PublisherError>;
    fn is_running(&self) -> bool;
    /// Make the file at `path` reachable and return the URL the receiver
    /// should load. Registering the same path again returns the same URL.
    fn register(&self, path: &FsPath) -> Result<String, PublisherError>;
    fn clear_registered_media(&self);
}

/// Start or stop `publisher` to follow the cast signal, swallowing the
/// already-running / not-running cases.
pub fn apply_cast_transition(publisher: &dyn StreamPublisher, casting: bool) {
    if casting {
        if let Err(e) = publisher.start() {
            tracing::debug!("stream publisher start ignored: {e}");
        }
    } else {
        if let Err(e) = publisher.stop() {
            tracing::debug!("stream publisher stop ignored: {e}");
        }
        publisher.clear_registered_media();
    }
}

type MediaTable = Arc<RwLock<HashMap<String, PathBuf>>>;

struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

pub struct HttpStreamPublisher {
    settings: CastSettings,
    media: MediaTable,
    next_id: AtomicU64,
    server: Mutex<Option<RunningServer>>,
}

impl HttpStreamPublisher {
    pub fn new(settings: CastSettings) -> Self {
        Self {
            settings,
            media: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            server: Mutex::new(None),
        }
    }

    fn server(&self) -> MutexGuard<'_, Option<RunningServer>> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address the server is bound to, when running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server().as_ref().map(|s| s.addr)
    }

    pub fn registered_count(&self) -> usize {
        self.media.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl StreamPublisher for HttpStreamPublisher {
    fn start(&self) -> Result<(), PublisherError> {
        let mut server = self.server();
        if server.is_some() {
            return Err(PublisherError::AlreadyRunning);
        }

        let bind = format!("{}:{}", self.settings.bind_address, self.settings.port);
        let listener = std::net::TcpListener::bind(&bind).map_err(|source| PublisherError::Bind {
            addr: bind.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let app = Router::new()
            .route("/media/:id", get(serve_media))
            .with_state(self.media.clone());
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let join = thread::Builder::new()
            .name("cadenza-publisher".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::error!("stream publisher runtime failed: {e}");
                        return;
                    }
                };
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(l) => l,
                        Err(e) => {
                            tracing::error!("stream publisher listener failed: {e}");
                            return;
                        }
                    };
                    // Open streams die with the server future.
                    tokio::select! {
                        res = axum::serve(listener, app).into_future() => {
                            if let Err(e) = res {
                                tracing::warn!("stream publisher stopped: {e}");
                            }
                        }
                        _ = shutdown_rx => {}
                    }
                });
            })?;

        tracing::info!(%addr, "stream publisher listening");
        *server = Some(RunningServer {
            addr,
            shutdown,
            join,
        });
        Ok(())
    }

    fn stop(&self) -> Result<(), PublisherError> {
        let running = self.server().take().ok_or(PublisherError::NotRunning)?;
        let _ = running.shutdown.send(());
        let _ = running.join.join();
        tracing::info!(addr = %running.addr, "stream publisher stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.server().is_some()
    }

    fn register(&self, path: &FsPath) -> Result<String, PublisherError> {
        let port = self
            .local_addr()
            .map(|a| a.port())
            .ok_or(PublisherError::NotRunning)?;

        let mut media = self.media.write().unwrap_or_else(PoisonError::into_inner);
        let existing = media
            .iter()
            .find(|(_, p)| p.as_path() == path)
            .map(|(id, _)| id.clone());
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
                media.insert(id.clone(), path.to_path_buf());
                id
            }
        };

        Ok(format!(
            "http://{}:{}/media/{}",
            self.settings.advertise_host, port, id
        ))
    }

    fn clear_registered_media(&self) {
        self.media
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Drop for HttpStreamPublisher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

async fn serve_media(
    State(media): State<MediaTable>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    let path = media.read().ok().and_then(|m| m.get(&id).cloned());
    let Some(path) = path else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // ServeFile handles ranges and content type; its error type is Infallible.
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
