//! Outbound request interception.
//!
//! The transport composes an [`InterceptorChain`] and asks it about every
//! request before sending. The first interceptor that answers
//! [`Interception::Respond`] supplies a fabricated response and the real
//! request is not sent; if all proceed, the request goes out unmodified.

use treescope_common::MockResponse;

use super::mocks::MockRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
}

impl OutboundRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    /// Deliver `response` instead of performing the request
    Respond {
        /// Id of the rule or name of the interceptor that answered
        source: String,
        response: MockResponse,
    },
    Proceed,
}

pub trait RequestInterceptor {
    fn intercept(&mut self, request: &OutboundRequest) -> Interception;
}

impl RequestInterceptor for MockRegistry {
    fn intercept(&mut self, request: &OutboundRequest) -> Interception {
        match self.find_matching_mock(&request.method, &request.url) {
            Some(rule) => Interception::Respond { source: rule.id, response: rule.response },
            None => Interception::Proceed,
        }
    }
}

#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn RequestInterceptor>>,
}

impl InterceptorChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Box<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl RequestInterceptor for InterceptorChain {
    fn intercept(&mut self, request: &OutboundRequest) -> Interception {
        for interceptor in &mut self.interceptors {
            let answer = interceptor.intercept(request);
            if matches!(answer, Interception::Respond { .. }) {
                return answer;
            }
        }
        Interception::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mocks::MockSpec;

    /// Answers every request to a fixed host.
    struct Offline;

    impl RequestInterceptor for Offline {
        fn intercept(&mut self, request: &OutboundRequest) -> Interception {
            if request.url.contains("offline.test") {
                Interception::Respond {
                    source: "offline".to_string(),
                    response: MockResponse { status: 503, ..MockResponse::default() },
                }
            } else {
                Interception::Proceed
            }
        }
    }

    #[test]
    fn test_chain_first_respond_wins() {
        let mut registry = MockRegistry::new();
        registry.add(MockSpec::new("offline.test/users"));

        let mut chain = InterceptorChain::new();
        chain.push(Box::new(registry));
        chain.push(Box::new(Offline));

        let answer = chain.intercept(&OutboundRequest::new("GET", "https://offline.test/users"));
        assert!(matches!(answer, Interception::Respond { ref source, .. } if source == "mock_1"));

        let answer = chain.intercept(&OutboundRequest::new("GET", "https://offline.test/feed"));
        assert!(matches!(answer, Interception::Respond { ref source, .. } if source == "offline"));

        let answer = chain.intercept(&OutboundRequest::new("GET", "https://online.test/"));
        assert_eq!(answer, Interception::Proceed);
    }
}
