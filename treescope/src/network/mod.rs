//! Network mocking: the rule registry and the interceptor chain that consults it.

pub mod interceptor;
pub mod mocks;

pub use interceptor::{Interception, InterceptorChain, OutboundRequest, RequestInterceptor};
pub use mocks::{MockRegistry, MockSpec};
