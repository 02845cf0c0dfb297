use futures::TryFutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{collections::HashMap, time::Duration};

use crate::error::Error::NetworkError;
use crate::http_client::default_headers;

/// JSON-RPC 2.0 transport over HTTP POST
#[derive(Debug)]
pub struct JsonRpc {
    client: reqwest::Client,
    server_url: reqwest::Url,
    next_id: AtomicU64,
}

impl JsonRpc {
    pub fn new(
        server_url: reqwest::Url,
        timeout: u64,
        headers: HashMap<String, String>,
    ) -> Result<Self, crate::error::Error> {
        let mut http_headers: HeaderMap = default_headers();

        for (key, value) in headers {
            match (
                HeaderName::try_from(key.as_str()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    http_headers.insert(name, value);
                }
                _ => tracing::warn!(header = %key, "skipping invalid header"),
            }
        }

        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(timeout))
            .default_headers(http_headers)
            .build()
            .map_err(NetworkError)?;
        Ok(JsonRpc {
            client,
            server_url,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn post<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Response<R>, crate::error::Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(method, id, "rpc request");
        let res = self
            .client
            .post(self.server_url.clone())
            .json(&Request {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .map_err(NetworkError)
            .await?;

        res.json().map_err(NetworkError).await
    }
}

#[derive(Debug, Serialize)]
pub struct Request<'a, T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "is_null")]
    params: T,
}

fn is_null<T: Serialize>(params: &T) -> bool {
    matches!(serde_json::to_value(params), Ok(serde_json::Value::Null))
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct Response<T> {
    jsonrpc: String,
    id: serde_json::Value,
    pub result: Option<T>,
    pub error: Option<Error>,
}

#[derive(Debug, Deserialize)]
pub struct Error {
    pub code: i32,
    pub message: Option<String>,
}

#[cfg(test)]
mod test {

    use std::collections::HashMap;
    use std::str::FromStr;

    use reqwest::Url;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers;
    use wiremock::matchers::headers;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    use crate::jsonrpc::JsonRpc;
    use crate::jsonrpc::Response;

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Quote {
        symbol: String,
        price: i64,
        flags: Vec<u8>,
    }

    #[tokio::test]
    async fn post_sends_envelope_and_headers() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "quote",
            "params": {
                "symbol": "SPY",
                "price": 44123,
                "flags": [4]
            }
        });
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "symbol": "SPY",
                "price": 44123,
                "flags": [4]
            }
        });
        let mock_server = MockServer::start().await;

        let response = ResponseTemplate::new(200).set_body_json(response);
        Mock::given(method("POST"))
            .and(path("/"))
            .and(headers("x-api-key", vec!["9864920430304"]))
            .and(headers("x-client-name", vec!["soroban-pxpump"]))
            .and(matchers::body_partial_json(request))
            .respond_with(response)
            .expect(1)
            .mount(&mock_server)
            .await;

        let server_url = Url::from_str(&mock_server.uri()).unwrap();
        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert("x-api-key".into(), "9864920430304".into());
        let rpc = JsonRpc::new(server_url, 10, headers).unwrap();

        let params = json!({
            "symbol": "SPY",
            "price": 44123,
            "flags": [4]
        });

        let response: Response<Quote> = rpc.post("quote", params).await.unwrap();
        assert_eq!(response.jsonrpc, "2.0");
        assert_eq!(
            response.result,
            Some(Quote {
                symbol: "SPY".to_string(),
                price: 44123,
                flags: vec![4]
            })
        );
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn post_increments_request_id_and_omits_null_params() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(matchers::body_json(json!({"jsonrpc": "2.0", "id": 2, "method": "getHealth"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "error": {"code": -32601, "message": "method not found"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"status": "healthy"}
            })))
            .mount(&mock_server)
            .await;

        let rpc = JsonRpc::new(
            Url::from_str(&mock_server.uri()).unwrap(),
            10,
            HashMap::new(),
        )
        .unwrap();

        let first: Response<serde_json::Value> =
            rpc.post("getHealth", serde_json::Value::Null).await.unwrap();
        assert!(first.result.is_some());

        let second: Response<serde_json::Value> =
            rpc.post("getHealth", serde_json::Value::Null).await.unwrap();
        let error = second.error.expect("second call should hit the error mock");
        assert_eq!(error.code, -32601);
        assert_eq!(error.message.as_deref(), Some("method not found"));
    }
}
