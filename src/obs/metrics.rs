// self
use crate::obs::{OperationKind, OperationOutcome};

const OPERATION_TOTAL: &str = "session_market_client_operation_total";

/// Counts one request or refresh outcome on the installed `metrics` recorder.
///
/// A request that refreshes and retries is counted once as a request and once as a refresh.
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			OPERATION_TOTAL,
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (OPERATION_TOTAL, kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_failures_are_counted_without_a_recorder() {
		record_operation_outcome(OperationKind::Refresh, OperationOutcome::Failure);
		record_operation_outcome(OperationKind::Request, OperationOutcome::Success);
	}
}
