//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use handler_dispatch::config::ServerConfig;
use handler_dispatch::dispatch::{
    Exchange, Handler, HandlerContext, HandlerError, Priority, Registration, Registry,
};
use handler_dispatch::http::HttpServer;
use handler_dispatch::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Handler that answers with a fixed status and body.
pub struct Fixed {
    status: u16,
    body: &'static str,
}

impl Handler for Fixed {
    fn handle(&mut self, exchange: &mut Exchange) -> Result<(), HandlerError> {
        exchange.respond(self.status, self.body)?;
        Ok(())
    }
}

/// Registration for a `Fixed` handler that counts how often it is created.
#[allow(dead_code)]
pub fn counted(
    name: &'static str,
    index: &str,
    priority: Priority,
    body: &'static str,
    created: Arc<AtomicUsize>,
) -> Registration {
    Registration::new(name, index, priority, move |_: &HandlerContext| {
        created.fetch_add(1, Ordering::SeqCst);
        Box::new(Fixed { status: 200, body }) as Box<dyn Handler>
    })
}

/// Registration for a `Fixed` handler.
#[allow(dead_code)]
pub fn fixed(name: &'static str, index: &str, priority: Priority, status: u16, body: &'static str) -> Registration {
    Registration::new(name, index, priority, move |_: &HandlerContext| {
        Box::new(Fixed { status, body }) as Box<dyn Handler>
    })
}

/// A server running on an ephemeral loopback port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server for `registrations` on an already-bound listener.
#[allow(dead_code)]
pub async fn start_server(registrations: Vec<Registration>, config: ServerConfig) -> TestServer {
    let registry = Arc::new(Registry::build(registrations).unwrap());
    let server = HttpServer::with_registry(config, registry);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer { addr, shutdown, task }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
