use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Failures decoding payloads that arrive over the bridge.
#[derive(Debug, Error)]
pub enum ProtocolError {
	#[error("malformed element descriptor: {0}")]
	Descriptor(#[source] serde_json::Error),

	#[error("malformed live query results for request {request_id}: {source}")]
	Results {
		request_id: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid query type '{0}' (must be 'css' or 'xpath')")]
	QueryKind(String),
}
