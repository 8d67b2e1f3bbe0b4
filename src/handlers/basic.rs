//! Liveness check served under `/test`.

use crate::dispatch::{AccessHandler, Exchange, Handler, HandlerContext, HandlerError, Priority, RouteHandler};

pub const BASIC_RESPONSE: &str = "It's working so far!";

/// Answers every admitted request with a fixed 200.
#[derive(Debug)]
pub struct BasicFunctionality {
    access: AccessHandler,
}

impl RouteHandler for BasicFunctionality {
    const NAME: &'static str = "basic-functionality";
    const INDEX: &'static str = "test";
    const PRIORITY: Priority = Priority::Default;

    fn create(ctx: &HandlerContext) -> Self {
        Self {
            access: ctx.access_handler(),
        }
    }
}

impl Handler for BasicFunctionality {
    fn handle(&mut self, exchange: &mut Exchange) -> Result<(), HandlerError> {
        if self.access.set_http_exchange(exchange).is_handled() {
            return Ok(());
        }
        self.access.respond(exchange, 200, BASIC_RESPONSE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_responds_ok() {
        let mut handler = BasicFunctionality::create(&HandlerContext::default());
        let mut exchange = Exchange::get("/test");
        handler.handle(&mut exchange).unwrap();

        let reply = exchange.into_reply().unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, BASIC_RESPONSE);
    }

    #[test]
    fn test_rejected_request_is_not_answered_twice() {
        let mut handler = BasicFunctionality::create(&HandlerContext::default());
        let mut exchange = Exchange::new(Method::DELETE, "/test".parse().unwrap());
        handler.handle(&mut exchange).unwrap();

        let reply = exchange.into_reply().unwrap();
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_registration_metadata() {
        let registrations = crate::handlers::registrations();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].index(), "test");
        assert_eq!(registrations[0].priority(), Priority::Default);
    }
}
