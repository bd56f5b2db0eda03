//! Retry of transient JSON-RPC failures with exponential backoff.

use std::{future::Future, time::Duration};

use alloy::{
    rpc::json_rpc::ErrorPayload,
    transports::{RpcError, TransportErrorKind},
};
use backoff::{exponential::ExponentialBackoffBuilder, ExponentialBackoff};
use serde::Deserialize;
use tracing::debug;

use super::config::RPCRetryConfig;

/// Classification of [`RpcError<TransportErrorKind>`] into transient and permanent failures.
///
/// Adapted from alloy-transport's crate private `RpcErrorExt`:
/// https://github.com/alloy-rs/alloy/blob/a3899575fbc0c789275f95661516b99e9a92838d/crates/transport/src/error.rs#L156
/// License: MIT OR Apache-2.0
pub(crate) trait RpcErrorExt {
    /// Whether the request may succeed when sent again: rate limits (429), unavailable
    /// backends (503), missing batch responses, null responses and provider specific rate limit
    /// codes.
    fn is_retryable(&self) -> bool;

    /// The delay some providers (e.g. Infura) suggest under `data.rate.backoff_seconds`.
    fn backoff_hint(&self) -> Option<Duration>;

    fn classify_error(self) -> backoff::Error<Self>
    where
        Self: Sized;
}

impl RpcErrorExt for RpcError<TransportErrorKind> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retry_err(),
            Self::SerError(_) => false,
            Self::DeserError { text, .. } => {
                if let Ok(resp) = serde_json::from_str::<ErrorPayload>(text) {
                    return resp.is_retry_err();
                }

                // some providers send invalid JSON RPC in the error case (no `id:u64`), but the
                // text should be a `JsonRpcError`
                #[derive(Deserialize)]
                struct Resp {
                    error: ErrorPayload,
                }

                serde_json::from_str::<Resp>(text)
                    .map(|resp| resp.error.is_retry_err())
                    .unwrap_or(false)
            }
            Self::ErrorResp(err) => err.is_retry_err(),
            Self::NullResp => true,
            _ => false,
        }
    }

    fn backoff_hint(&self) -> Option<Duration> {
        let Self::ErrorResp(resp) = self else {
            return None;
        };
        let Some(Ok(data)) = resp.try_data_as::<serde_json::Value>() else {
            return None;
        };
        let backoff_seconds = &data["rate"]["backoff_seconds"];
        if let Some(seconds) = backoff_seconds.as_u64() {
            return Some(Duration::from_secs(seconds));
        }
        backoff_seconds
            .as_f64()
            .map(|seconds| Duration::from_secs(seconds.ceil() as u64))
    }

    fn classify_error(self) -> backoff::Error<Self> {
        if !self.is_retryable() {
            return backoff::Error::permanent(self);
        }
        match self.backoff_hint() {
            Some(hint) => backoff::Error::retry_after(self, hint),
            None => backoff::Error::transient(self),
        }
    }
}

/// Exponential backoff bounded by a number of retries rather than by elapsed time.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
    max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RPCRetryConfig::default().into()
    }
}

impl From<RPCRetryConfig> for RetryPolicy {
    fn from(config: RPCRetryConfig) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(config.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();

        Self { backoff, max_retries: config.max_retries }
    }
}

impl From<&RetryPolicy> for RPCRetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        RPCRetryConfig {
            max_retries: policy.max_retries,
            initial_backoff_ms: policy.backoff.initial_interval.as_millis() as u64,
            max_backoff_ms: policy.backoff.max_interval.as_millis() as u64,
        }
    }
}

impl RetryPolicy {
    /// Runs `operation`, retrying transient failures up to `max_retries` times.
    ///
    /// Permanent failures, and the failure of the last allowed attempt, are returned as is.
    pub(crate) async fn retry_request<F, Fut, T>(
        &self,
        mut operation: F,
    ) -> Result<T, RpcError<TransportErrorKind>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let mut attempts = 0;
        backoff::future::retry_notify(
            self.backoff.clone(),
            || {
                attempts += 1;
                let exhausted = attempts > self.max_retries;
                let fut = operation();
                async move {
                    fut.await.map_err(|e| {
                        if exhausted {
                            backoff::Error::permanent(e)
                        } else {
                            e.classify_error()
                        }
                    })
                }
            },
            |error: RpcError<TransportErrorKind>, delay: Duration| {
                debug!(%error, ?delay, "Retrying RPC request")
            },
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use alloy::{
        rpc::client::{ClientBuilder, ReqwestClient},
        transports::HttpError,
    };
    use mockito::{Mock, ServerGuard};
    use rstest::rstest;
    use serde::de::Error;

    use super::*;

    pub(crate) const MOCK_RETRY_POLICY_MAX_RETRIES: usize = 3;

    pub(crate) fn mock_retry_config() -> RPCRetryConfig {
        RPCRetryConfig::new(MOCK_RETRY_POLICY_MAX_RETRIES, 1, 5)
    }

    async fn mock_success(server: &mut ServerGuard) -> Mock {
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0xabc"}"#)
            .expect(1)
            .create_async()
            .await
    }

    async fn mock_rate_limited(server: &mut ServerGuard, times: usize) -> Mock {
        server
            .mock("POST", "/")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":0,"error":{"code":429,"message":"Too Many Requests"}}"#,
            )
            .expect(times)
            .create_async()
            .await
    }

    async fn counted_block_number(
        policy: &RetryPolicy,
        client: &ReqwestClient,
        count: &Arc<AtomicUsize>,
    ) -> Result<String, RpcError<TransportErrorKind>> {
        policy
            .retry_request(|| async {
                count.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_blockNumber")
                    .await
            })
            .await
    }

    #[test]
    fn test_config_roundtrip() {
        let config = RPCRetryConfig::new(7, 200, 10_000);

        let policy = RetryPolicy::from(config.clone());

        assert_eq!(RPCRetryConfig::from(&policy), config);
        assert_eq!(policy.backoff.max_elapsed_time, None);
    }

    #[rstest]
    #[case::rate_limited(429)]
    #[case::unavailable(503)]
    fn test_http_errors_are_retryable(#[case] status: u16) {
        let err = RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(
            HttpError { status, body: "".to_string() },
        ));

        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_classification_non_retryable() {
        let ser_err =
            RpcError::<TransportErrorKind>::SerError(serde_json::Error::custom("test error"));
        assert!(!ser_err.is_retryable());

        let backend_gone =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::BackendGone);
        assert!(!backend_gone.is_retryable());

        let reverted = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        });
        assert!(!reverted.is_retryable());
    }

    #[test]
    fn test_null_response_is_retryable() {
        assert!(RpcError::<TransportErrorKind>::NullResp.is_retryable());
    }

    #[rstest]
    #[case::integer(10_f64, Duration::from_secs(10))]
    #[case::float(5.7, Duration::from_secs(6))]
    fn test_backoff_hint_extraction(#[case] backoff_value: f64, #[case] duration: Duration) {
        let data = serde_json::value::to_raw_value(&serde_json::json!({
            "rate": { "backoff_seconds": backoff_value }
        }))
        .unwrap();
        let err = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code: -32005,
            message: "Rate limited".into(),
            data: Some(data),
        });

        assert_eq!(err.backoff_hint(), Some(duration));
    }

    #[test]
    fn test_backoff_hint_missing() {
        let err = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code: -32005,
            message: "Some error".into(),
            data: None,
        });

        assert_eq!(err.backoff_hint(), None);
    }

    #[tokio::test]
    async fn test_retry_on_rate_limit_then_succeed() {
        let mut server = mockito::Server::new_async().await;
        let _rate_limited = mock_rate_limited(&mut server, MOCK_RETRY_POLICY_MAX_RETRIES).await;
        let success = mock_success(&mut server).await;
        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let count = Arc::new(AtomicUsize::new(0));

        let result = counted_block_number(&mock_retry_config().into(), &client, &count).await;

        assert_eq!(result.unwrap(), "0xabc");
        assert_eq!(count.load(Ordering::SeqCst), MOCK_RETRY_POLICY_MAX_RETRIES + 1);
        success.assert_async().await;
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut server = mockito::Server::new_async().await;
        let rate_limited =
            mock_rate_limited(&mut server, MOCK_RETRY_POLICY_MAX_RETRIES + 1).await;
        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let count = Arc::new(AtomicUsize::new(0));

        let result = counted_block_number(&mock_retry_config().into(), &client, &count).await;

        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), MOCK_RETRY_POLICY_MAX_RETRIES + 1);
        rate_limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32600,"message":"Invalid Request"}}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let count = Arc::new(AtomicUsize::new(0));

        let result = counted_block_number(&mock_retry_config().into(), &client, &count).await;

        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_retries_fail_on_first_transient_error() {
        let mut server = mockito::Server::new_async().await;
        let _rate_limited = mock_rate_limited(&mut server, 1).await;
        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let count = Arc::new(AtomicUsize::new(0));

        let result =
            counted_block_number(&RPCRetryConfig::disabled().into(), &client, &count).await;

        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
