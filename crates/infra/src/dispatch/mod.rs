//! Fire-and-forget request dispatch
//!
//! A fixed pool of tokio workers drains one shared LIFO queue, throttled to
//! a global request rate. Failures never reach the caller of
//! [`AsyncRequestDispatcher::request`]; they are routed to a per-request
//! handler or to the dispatcher-wide [`ErrorReceiver`].

mod dispatcher;
mod request;

pub use dispatcher::AsyncRequestDispatcher;
pub use request::{
    DispatchFailure, DispatchRequest, DispatchResponse, ErrorReceiver, FailureCause,
    LogErrorReceiver, RequestExecutor,
};
