//! API client shared by the controllers.
//!
//! Resolves an operation, hands the request to the [`Transport`] and
//! classifies the outcome. Holds no per-call state, so clones can be used
//! from any number of tasks at once.

use crate::error::Result;
use crate::normalize;
use crate::resolver::{resolve, Operation, RequestScope};
use crate::transport::{RawResponse, RequestBody, Transport};
use std::sync::Arc;

/// Entry point for issuing resolved requests.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    scope: RequestScope,
}

impl ApiClient {
    /// Create a client with a default organization scope.
    pub fn new(transport: Arc<dyn Transport>, scope: RequestScope) -> Self {
        Self { transport, scope }
    }

    /// Default scope applied when no per-call organization is supplied.
    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// Same client with the organization overridden for subsequent calls.
    pub fn scoped(&self, organization_id: Option<&str>) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            scope: self.scope.overridden_by(organization_id),
        }
    }

    /// Issue exactly one request for `operation`.
    ///
    /// Resolution failures return before the transport is touched.
    ///
    /// # Errors
    ///
    /// Returns the classified error for local rejections, failure statuses
    /// and transport failures.
    pub async fn call(
        &self,
        operation: &Operation<'_>,
        body: Option<RequestBody>,
    ) -> Result<RawResponse> {
        let endpoint = resolve(operation, &self.scope).inspect_err(|e| {
            tracing::warn!(operation = operation.name(), error = %e, "Request rejected locally");
        })?;

        let start = std::time::Instant::now();
        let request = endpoint.into_request(body);
        let outcome = self.transport.send(request).await;

        normalize::check(outcome)
            .inspect(|resp| {
                tracing::debug!(
                    operation = operation.name(),
                    status = resp.status,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Operation succeeded"
                );
            })
            .inspect_err(|e| {
                tracing::warn!(
                    operation = operation.name(),
                    kind = %e.kind(),
                    error = %e,
                    "Operation failed"
                );
            })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
