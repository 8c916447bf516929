//! Application layer for lectern-resource.
//!
//! Decides whether a request path may be served.  No sockets here; the HTTP
//! front end in `infrastructure` calls [`ResourcePolicy::resolve`] and turns
//! the outcome into a response.

pub mod resolver;

pub use resolver::{ResolvedResource, ResourceError, ResourcePolicy, RESOURCE_SCHEME};
