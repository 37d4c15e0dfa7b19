//! Feature-gated instrumentation for API requests and refresh exchanges.
//!
//! Every request passes through [`OperationSpan`] and [`record_operation_outcome`], and every
//! call to the refresh endpoint does the same with [`OperationKind::Refresh`]. Without the
//! `tracing` or `metrics` feature these helpers compile to nothing.
//!
//! With `tracing`, each request runs inside a `session_market_client.operation` span whose
//! `stage` field names the call site. Session expiry and credentials that could not be cleared
//! are logged at `warn`.
//!
//! With `metrics`, the `session_market_client_operation_total` counter is incremented on entry
//! and on completion, labeled with `operation` (`request` or `refresh`) and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What the client was doing when an outcome was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// One `execute` call, covering its refresh and its single retry.
	Request,
	/// One POST to the refresh endpoint. Coalesced waiters do not record one.
	Refresh,
}
impl OperationKind {
	/// Label used for the `operation` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Request => "request",
			OperationKind::Refresh => "refresh",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Where an operation stands when it is counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// The operation started.
	Attempt,
	/// The caller received a response or a fresh access token.
	Success,
	/// The caller received an error.
	Failure,
}
impl OperationOutcome {
	/// Label used for the `outcome` metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
