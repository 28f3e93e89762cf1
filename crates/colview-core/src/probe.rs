#![forbid(unsafe_code)]

//! Reachability probes: does a target page allow being framed, and is it up?
//!
//! The engine only builds requests and classifies responses; the host does
//! the actual `GET {endpoint}/{raw url}` and hands the outcome back. Probes
//! are fire-and-forget and cannot be cancelled, so a late answer for an old
//! edit can overwrite a newer status. The sequence number on each request is
//! logged with the result to make that race visible; it is not used to drop
//! stale answers.

use serde::{Deserialize, Serialize};

use crate::state::{ColumnAddress, LoadStatus};

/// One probe the host must perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub seq: u64,
    pub address: ColumnAddress,
    /// Address being checked, as stored in state.
    pub target: String,
    /// Full lookup-service URL to fetch.
    pub endpoint: String,
}

/// What the host observed while performing a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The service answered. `success` is true for a 2xx status.
    Response { success: bool, body: String },
    /// Network failure, CORS rejection, aborted fetch...
    TransportError(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupBody {
    supports_iframe: Option<bool>,
    error: Option<String>,
}

/// Map a probe outcome onto a column status.
#[must_use]
pub fn classify(outcome: &ProbeOutcome) -> LoadStatus {
    match outcome {
        ProbeOutcome::TransportError(_) => LoadStatus::Unreachable,
        ProbeOutcome::Response { success: false, .. } => LoadStatus::Unreachable,
        ProbeOutcome::Response { success: true, body } => {
            match serde_json::from_str::<LookupBody>(body) {
                Ok(LookupBody {
                    supports_iframe: Some(true),
                    ..
                }) => LoadStatus::Ok,
                Ok(LookupBody { error, .. }) => {
                    if let Some(error) = error {
                        tracing::debug!(target: "colview.probe", %error, "lookup reported error");
                    }
                    LoadStatus::Blocked
                }
                Err(err) => {
                    tracing::debug!(target: "colview.probe", %err, "unreadable lookup body");
                    LoadStatus::Unreachable
                }
            }
        }
    }
}

/// Issues probe requests against a fixed lookup endpoint.
#[derive(Debug, Clone)]
pub struct ReachabilityChecker {
    endpoint: String,
    next_seq: u64,
}

impl ReachabilityChecker {
    /// An empty `endpoint` disables probing entirely.
    #[must_use]
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_owned(),
            next_seq: 1,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }

    /// Build a probe for `target`; blank targets are not probed.
    pub fn request(&mut self, address: ColumnAddress, target: &str) -> Option<ProbeRequest> {
        if !self.is_enabled() || target.trim().is_empty() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(ProbeRequest {
            seq,
            address,
            target: target.to_owned(),
            endpoint: format!("{}/{}", self.endpoint, target),
        })
    }
}
