// Request/response correlation for host-initiated exchanges
// The host asks, the client dispatches a store action and answers
// later, once an internal response signal reports completion

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::emitter::CommandEmitter;
use super::hub::{SignalChannel, Subscription};
use super::message::{OperationOutcome, OperationResponse};
use crate::config::OutstandingPolicy;
use crate::store::SiteId;

/// One outstanding exchange awaiting its response signal.
#[derive(Debug, Clone)]
pub struct CorrelatedRequest {
    pub key: SiteId,
    pub response_signal: String,
    pub created_at: DateTime<Utc>,
}

struct Outstanding {
    request: CorrelatedRequest,
    settled: Arc<AtomicBool>,
    subscription: Subscription,
}

/// Correlates host requests with asynchronous store-side completion.
///
/// The correlation key is caller-supplied business data (the site id),
/// not a generated request id: the host wire protocol has no id field,
/// so at most one exchange per site per operation type can be told
/// apart. What happens when a second request arrives for a key that is
/// still outstanding is governed by [`OutstandingPolicy`].
pub struct Correlator {
    signals: Arc<dyn SignalChannel>,
    emitter: Arc<CommandEmitter>,
    timeout: Option<Duration>,
    policy: OutstandingPolicy,
    outstanding: Arc<Mutex<HashMap<(String, SiteId), Outstanding>>>,
}

impl Correlator {
    /// `signals` is the internal surface response signals arrive on;
    /// `emitter` carries answers back to the host. `timeout` of `None`
    /// waits forever, matching the legacy behavior.
    pub fn new(
        signals: Arc<dyn SignalChannel>,
        emitter: Arc<CommandEmitter>,
        timeout: Option<Duration>,
        policy: OutstandingPolicy,
    ) -> Self {
        Self {
            signals,
            emitter,
            timeout,
            policy,
            outstanding: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Begin a correlated exchange.
    ///
    /// Registers a one-shot listener on `response_signal`, then invokes
    /// `operation` (which dispatches into the store and returns
    /// immediately). The listener is registered first so a completion
    /// signalled synchronously from the dispatch cannot be missed.
    ///
    /// When the response arrives, a `<request_signal>-response` command
    /// goes to the host. A payload whose key differs from `key` has its
    /// `error` overridden to name both keys, but is still forwarded:
    /// the host must be told something even on a mismatch.
    pub fn correlate<F>(&self, key: SiteId, request_signal: &str, response_signal: &str, operation: F)
    where
        F: FnOnce(SiteId),
    {
        let map_key = (response_signal.to_string(), key);

        {
            let mut outstanding = self.outstanding.lock().unwrap();
            if let Some(existing) = outstanding.get(&map_key) {
                match self.policy {
                    OutstandingPolicy::Replace => {
                        tracing::debug!(
                            %key,
                            response_signal,
                            "superseding outstanding request for the same key"
                        );
                        existing.settled.store(true, Ordering::SeqCst);
                        existing.subscription.dispose();
                        outstanding.remove(&map_key);
                    }
                    OutstandingPolicy::Reject => {
                        tracing::debug!(
                            %key,
                            response_signal,
                            "rejecting duplicate request for outstanding key"
                        );
                        self.emitter.send_response(
                            request_signal,
                            &OperationResponse::err(
                                key,
                                "error",
                                format!("another request is outstanding for siteId: {key}"),
                            ),
                        );
                        return;
                    }
                }
            }
        }

        let settled = Arc::new(AtomicBool::new(false));
        let request = CorrelatedRequest {
            key,
            response_signal: response_signal.to_string(),
            created_at: Utc::now(),
        };
        tracing::debug!(%key, request_signal, "beginning correlated exchange");

        let handler = {
            let settled = Arc::clone(&settled);
            let emitter = Arc::clone(&self.emitter);
            let outstanding = Arc::clone(&self.outstanding);
            let map_key = map_key.clone();
            let request_signal = request_signal.to_string();
            let response_signal = response_signal.to_string();
            Arc::new(move |args: &[serde_json::Value]| {
                // First to flip the flag (listener or timeout) owns
                // the answer; the loser stays silent.
                if settled.swap(true, Ordering::SeqCst) {
                    return;
                }
                outstanding.lock().unwrap().remove(&map_key);

                let response = match args
                    .first()
                    .cloned()
                    .map(serde_json::from_value::<OperationOutcome>)
                {
                    Some(Ok(outcome)) => {
                        let error = if outcome.site_id != key {
                            tracing::warn!(
                                expected = %key,
                                observed = %outcome.site_id,
                                %response_signal,
                                "response key mismatch"
                            );
                            Some(format!(
                                "Expected response for siteId: {key}, got: {}",
                                outcome.site_id
                            ))
                        } else {
                            outcome.error
                        };
                        OperationResponse {
                            site_id: key,
                            status: outcome.status,
                            error,
                        }
                    }
                    _ => OperationResponse::err(
                        key,
                        "error",
                        format!("malformed payload on {response_signal}"),
                    ),
                };
                emitter.send_response(&request_signal, &response);
            })
        };
        let subscription = self.signals.subscribe_once(response_signal, handler);

        self.outstanding.lock().unwrap().insert(
            map_key.clone(),
            Outstanding {
                request,
                settled: Arc::clone(&settled),
                subscription,
            },
        );

        operation(key);

        if let Some(timeout) = self.timeout {
            let emitter = Arc::clone(&self.emitter);
            let outstanding = Arc::clone(&self.outstanding);
            let request_signal = request_signal.to_string();
            let response_signal = response_signal.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if settled.swap(true, Ordering::SeqCst) {
                    return;
                }
                if let Some(entry) = outstanding.lock().unwrap().remove(&map_key) {
                    entry.subscription.dispose();
                }
                tracing::warn!(%key, %response_signal, "correlated exchange timed out");
                emitter.send_response(
                    &request_signal,
                    &OperationResponse::err(
                        key,
                        "error",
                        format!("timed out waiting for {response_signal}"),
                    ),
                );
            });
        }
    }

    /// Number of exchanges currently awaiting a response.
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.lock().unwrap().len()
    }

    /// Snapshot of the exchanges currently awaiting a response.
    pub fn outstanding_requests(&self) -> Vec<CorrelatedRequest> {
        self.outstanding
            .lock()
            .unwrap()
            .values()
            .map(|entry| entry.request.clone())
            .collect()
    }
}
