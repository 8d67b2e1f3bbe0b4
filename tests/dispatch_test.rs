//! Registry and dispatcher behaviour through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use handler_dispatch::dispatch::{
    AccessHandler, DispatchOutcome, Dispatcher, Exchange, Handler, HandlerContext, HandlerError, Priority,
    Registration, RegistrationError, Registry, RouteHandler,
};
use handler_dispatch::handlers;

mod common;

#[test]
fn test_basic_scenario() {
    let registry = Registry::build(handlers::registrations()).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry), HandlerContext::default());

    let mut exchange = Exchange::get("/test");
    dispatcher.dispatch(&mut exchange);

    let reply = exchange.into_reply().unwrap();
    assert_eq!(reply.status.as_u16(), 200);
    assert_eq!(reply.body, "It's working so far!");
}

#[test]
fn test_unknown_index_scenario() {
    let created = Arc::new(AtomicUsize::new(0));
    let registry = Registry::build(vec![common::counted(
        "only",
        "test",
        Priority::Default,
        "ok",
        created.clone(),
    )])
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry), HandlerContext::default());

    let mut exchange = Exchange::get("/unknown");
    assert_eq!(dispatcher.dispatch(&mut exchange), DispatchOutcome::RouteNotFound);
    assert_eq!(exchange.reply().unwrap().status.as_u16(), 404);
    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[test]
fn test_shared_index_scenario() {
    let low = Arc::new(AtomicUsize::new(0));
    let high = Arc::new(AtomicUsize::new(0));
    let registry = Registry::build(vec![
        common::counted("fallback", "shared", Priority::Lowest, "fallback", low.clone()),
        common::counted("primary", "shared", Priority::Highest, "primary", high.clone()),
    ])
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry), HandlerContext::default());

    for _ in 0..3 {
        let mut exchange = Exchange::get("/shared");
        dispatcher.dispatch(&mut exchange);
        assert_eq!(exchange.reply().unwrap().body, "primary");
    }
    assert_eq!(high.load(Ordering::SeqCst), 3);
    assert_eq!(low.load(Ordering::SeqCst), 0);
}

#[test]
fn test_every_tier_ordering() {
    // Registered in reverse so the sort has work to do
    let registrations: Vec<Registration> = Priority::ALL
        .iter()
        .rev()
        .map(|p| common::fixed(p.as_str(), "tiers", *p, 200, "x"))
        .collect();
    let registry = Registry::build(registrations).unwrap();

    let order: Vec<Priority> = registry.lookup("tiers").unwrap().iter().map(|d| d.priority()).collect();
    assert_eq!(order, Priority::ALL.to_vec());
}

#[test]
fn test_rebuild_is_identical() {
    let build = || {
        Registry::build(vec![
            common::fixed("a", "one", Priority::Low, 200, "a"),
            common::fixed("b", "one", Priority::Low, 200, "b"),
            common::fixed("c", "two", Priority::High, 200, "c"),
            common::fixed("d", "one", Priority::Default, 200, "d"),
        ])
        .unwrap()
    };
    assert_eq!(build().summary(), build().summary());
}

#[test]
fn test_empty_index_aborts_build() {
    let err = Registry::build(vec![common::fixed("bad", "", Priority::Default, 200, "x")]).unwrap_err();
    assert!(matches!(err, RegistrationError::EmptyIndex { .. }));
}

struct Guarded {
    access: AccessHandler,
    writes: Arc<AtomicUsize>,
}

impl Handler for Guarded {
    fn handle(&mut self, exchange: &mut Exchange) -> Result<(), HandlerError> {
        if self.access.set_http_exchange(exchange).is_handled() {
            return Ok(());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.access.respond(exchange, 200, "guarded");
        Ok(())
    }
}

#[test]
fn test_early_exit_writes_exactly_once() {
    let writes = Arc::new(AtomicUsize::new(0));
    let counter = writes.clone();
    let registry = Registry::build(vec![Registration::new(
        "guarded",
        "test",
        Priority::Default,
        move |ctx: &HandlerContext| {
            Box::new(Guarded {
                access: ctx.access_handler(),
                writes: counter.clone(),
            }) as Box<dyn Handler>
        },
    )])
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry), HandlerContext::default());

    let mut exchange = Exchange::new(axum::http::Method::OPTIONS, "/test".parse().unwrap());
    dispatcher.dispatch(&mut exchange);

    assert_eq!(writes.load(Ordering::SeqCst), 0);
    assert_eq!(exchange.reply().unwrap().status.as_u16(), 405);
    assert_eq!(exchange.respond(200, "again"), Err(handler_dispatch::dispatch::ExchangeError::AlreadyResponded));
}

struct Echo {
    access: AccessHandler,
}

impl Handler for Echo {
    fn handle(&mut self, exchange: &mut Exchange) -> Result<(), HandlerError> {
        if self.access.set_http_exchange(exchange).is_handled() {
            return Ok(());
        }
        let body = String::from_utf8_lossy(exchange.body()).into_owned();
        self.access.respond(exchange, 200, body);
        Ok(())
    }
}

impl RouteHandler for Echo {
    const NAME: &'static str = "echo";
    const INDEX: &'static str = "echo";
    const PRIORITY: Priority = Priority::High;

    fn create(ctx: &HandlerContext) -> Self {
        Self {
            access: ctx.access_handler(),
        }
    }
}

#[test]
fn test_concurrent_dispatch_shares_registry() {
    let mut registrations = handlers::registrations();
    registrations.push(Registration::of::<Echo>());
    let registry = Registry::build(registrations).unwrap();
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), HandlerContext::default()));

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let payload = format!("{}-{}", worker, i);
                    let mut exchange = Exchange::new(axum::http::Method::POST, "/echo".parse().unwrap())
                        .with_body(payload.clone());
                    dispatcher.dispatch(&mut exchange);
                    assert_eq!(exchange.reply().unwrap().body, payload);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}
