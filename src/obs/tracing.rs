// self
use crate::{_prelude::*, events::ExpiryReason, obs::OperationKind, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("session_market_client.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs that stored credentials were abandoned (when tracing is enabled).
pub fn record_session_expired(reason: ExpiryReason, redirect_to: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason = reason.as_str(), redirect_to, "session expired");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, redirect_to);
	}
}

/// Logs that a rejected refresh left credentials in the store (when tracing is enabled).
pub fn record_credentials_retained(err: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "stored credentials could not be cleared");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn record_session_expired_is_infallible() {
		record_session_expired(ExpiryReason::MissingRefreshToken, "/login");
	}

	#[test]
	fn record_credentials_retained_is_infallible() {
		record_credentials_retained(&StoreError::Backend { message: "locked".into() });
	}
}
