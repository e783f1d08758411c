//! Blocking worker pool over `tiny_http`.

use std::io::Read;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arc_swap::ArcSwap;
use http::Method;
use parking_lot::Mutex;

use super::HttpHost;
use crate::error::{HostError, HostResult};
use crate::filter::ExceptionFilterChain;
use crate::web::{HandlerPanic, Request, Response};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running server. Dropping the handle shuts it down.
///
/// The host is shared by the worker threads and dropped by the last one to
/// exit, which unloads its plugins.
pub struct ServerHandle {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    filters: Arc<ArcSwap<ExceptionFilterChain>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ServerHandle {
    /// The bound address; useful when the configured port was 0.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Replaces the exception filters while serving.
    pub fn set_exception_filters(&self, chain: ExceptionFilterChain) {
        self.filters.store(Arc::new(chain));
    }

    /// Stops accepting requests and waits for in-flight ones to finish.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::info!(addr = %self.addr, "shutting down");
        }
        self.wait();
    }

    /// Blocks until every worker has exited.
    pub fn wait(&self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("addr", &self.addr)
            .field("running", &self.is_running())
            .finish()
    }
}

pub(super) fn start(host: HttpHost) -> HostResult<ServerHandle> {
    host.config().validate()?;
    let bind = host.config().bind_address.clone();
    let server = tiny_http::Server::http(bind.as_str())
        .map_err(|err| HostError::Transport(format!("cannot bind {bind}: {err}")))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| HostError::Transport(format!("{bind} is not an IP listener")))?;

    let server = Arc::new(server);
    let running = Arc::new(AtomicBool::new(true));
    let filters = Arc::clone(host.filters());
    let threads = host.config().worker_threads;
    let host = Arc::new(host);

    let mut workers = Vec::with_capacity(threads);
    for index in 0..threads {
        let server = Arc::clone(&server);
        let running_flag = Arc::clone(&running);
        let host = Arc::clone(&host);
        let spawned = thread::Builder::new()
            .name(format!("ferrous-host-worker-{index}"))
            .spawn(move || worker_loop(&host, &server, &running_flag));
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(err) => {
                running.store(false, Ordering::Release);
                for worker in workers {
                    if worker.join().is_err() {
                        tracing::error!("worker thread panicked");
                    }
                }
                return Err(HostError::Io(err));
            }
        }
    }

    tracing::info!(%addr, workers = threads, "listening");
    Ok(ServerHandle {
        addr,
        running,
        filters,
        workers: Mutex::new(workers),
    })
}

fn worker_loop(host: &HttpHost, server: &tiny_http::Server, running: &AtomicBool) {
    while running.load(Ordering::Acquire) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| serve(host, request))) {
                    let panic = HandlerPanic::from_payload(&*payload);
                    tracing::error!(error = %panic, "request serving panicked");
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "failed to receive request"),
        }
    }
}

fn serve(host: &HttpHost, mut incoming: tiny_http::Request) {
    let response = match read_request(&mut incoming) {
        Ok(request) => host.handle(request),
        Err(message) => {
            tracing::warn!(error = %message, "malformed request");
            Response::text(http::StatusCode::BAD_REQUEST, message)
        }
    };
    if let Err(err) = incoming.respond(to_transport(response)) {
        tracing::warn!(error = %err, "failed to write response");
    }
}

fn read_request(incoming: &mut tiny_http::Request) -> Result<Request, String> {
    let method = Method::from_bytes(incoming.method().as_str().as_bytes())
        .map_err(|_| format!("unsupported method {}", incoming.method()))?;
    let mut request = Request::new(method, incoming.url());
    for header in incoming.headers() {
        request = request.with_header(header.field.as_str().as_str(), header.value.as_str());
    }
    let mut body = Vec::new();
    incoming
        .as_reader()
        .read_to_end(&mut body)
        .map_err(|err| format!("failed to read body: {err}"))?;
    Ok(request.with_body(body))
}

fn to_transport(response: Response) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let (status, headers, body) = response.into_parts();
    let mut transport = tiny_http::Response::from_data(body).with_status_code(status.as_u16());
    for (name, value) in &headers {
        match tiny_http::Header::from_bytes(name.as_str().as_bytes(), value.as_bytes()) {
            Ok(header) => transport.add_header(header),
            Err(()) => tracing::warn!(header = name.as_str(), "dropping unrepresentable header"),
        }
    }
    transport
}
