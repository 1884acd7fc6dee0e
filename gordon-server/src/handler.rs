//! Request handlers.

use gordon_protocol::{Page, Request};

/// Error a handler may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Resolves a request to a page.
///
/// Application-level failures, such as an unknown document, should be
/// returned as error-status pages so they reach the client. An `Err` (or
/// `Ok(None)`, which is never valid) closes the connection without a
/// response.
pub trait Handler: Send + Sync {
    fn serve(&self, request: &Request) -> Result<Option<Page>, HandlerError>;
}

/// A handler backed by a closure.
pub struct FnHandler<F>(F);

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Request) -> Result<Option<Page>, HandlerError> + Send + Sync,
{
    FnHandler(f)
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Request) -> Result<Option<Page>, HandlerError> + Send + Sync,
{
    fn serve(&self, request: &Request) -> Result<Option<Page>, HandlerError> {
        (self.0)(request)
    }
}
