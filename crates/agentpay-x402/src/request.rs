//! Request plumbing shared by the HTTP actions.
//!
//! The actions report failures as structured JSON rather than raising them,
//! so the helpers here classify transport errors (no response received vs.
//! request construction) and parse response bodies by content type without
//! ever erroring themselves. HTTP error statuses are data, not failures,
//! and are returned verbatim to the caller.

use std::collections::BTreeMap;

use http::{HeaderMap, StatusCode, header};
use reqwest::Response;
use reqwest_middleware as rqm;
use url::form_urlencoded;

use agentpay_types::proto::decode_payment_proof;

use crate::schemas::HttpMethod;

/// Appends query parameters to a URL, respecting an existing query string.
pub fn build_url_with_params(
    base_url: &str,
    query_params: Option<&BTreeMap<String, String>>,
) -> String {
    let Some(params) = query_params.filter(|p| !p.is_empty()) else {
        return base_url.to_string();
    };
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{encoded}")
}

/// Issues one request with the caller's method, headers, and body. The body
/// is attached only for methods that can carry one.
pub async fn send_once(
    client: &rqm::ClientWithMiddleware,
    method: HttpMethod,
    url: &str,
    headers: Option<&BTreeMap<String, String>>,
    body: Option<&serde_json::Value>,
) -> Result<Response, rqm::Error> {
    let mut builder = client.request(method.into(), url);
    if let Some(headers) = headers {
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
    }
    if method.can_have_body() {
        if let Some(body) = body {
            builder = builder.json(body);
        }
    }
    builder.send().await
}

/// Issues a request and, on a 404, retries exactly once with the flipped
/// HTTP method. A narrow accommodation for endpoints that advertise one
/// method but serve another; not a general retry policy.
pub async fn send_with_method_flip(
    client: &rqm::ClientWithMiddleware,
    method: HttpMethod,
    url: &str,
    headers: Option<&BTreeMap<String, String>>,
    body: Option<&serde_json::Value>,
) -> Result<(Response, HttpMethod), rqm::Error> {
    let response = send_once(client, method, url, headers, body).await?;
    if response.status() == StatusCode::NOT_FOUND {
        let flipped = method.flipped();
        let response = send_once(client, flipped, url, headers, body).await?;
        return Ok((response, flipped));
    }
    Ok((response, method))
}

/// Consumes a response into (status, headers, parsed body): JSON when the
/// content type says so and the body parses, raw text otherwise.
pub async fn parse_response_data(response: Response) -> (StatusCode, HeaderMap, serde_json::Value) {
    let status = response.status();
    let headers = response.headers().clone();
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);

    let bytes = response.bytes().await.unwrap_or_default();
    let text = || String::from_utf8_lossy(&bytes).into_owned();
    let data = if is_json {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::Value::String(text()))
    } else {
        serde_json::Value::String(text())
    };
    (status, headers, data)
}

/// Extracts and decodes the settlement proof header, trying the V2 name
/// first and the V1 name second.
pub fn proof_from_headers(headers: &HeaderMap) -> Option<serde_json::Value> {
    headers
        .get("payment-response")
        .or_else(|| headers.get("x-payment-response"))
        .and_then(|value| value.to_str().ok())
        .map(decode_payment_proof)
}

/// Renders a transport-layer failure as the structured error payload the
/// actions return, distinguishing "no response received" from request
/// construction problems.
pub fn transport_error_json(error: &rqm::Error, url: &str) -> serde_json::Value {
    let no_response = match error {
        rqm::Error::Reqwest(inner) => {
            inner.is_connect() || inner.is_timeout() || inner.is_redirect()
        }
        _ => false,
    };
    if no_response {
        serde_json::json!({
            "error": true,
            "message": format!("Network error when accessing {url}"),
            "details": error.to_string(),
            "suggestion": "Check your internet connection and verify the API endpoint is accessible.",
        })
    } else {
        serde_json::json!({
            "error": true,
            "message": format!("Error making request to {url}"),
            "details": error.to_string(),
            "suggestion": "Please check the request parameters and try again.",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentpay_types::util::Base64Bytes;
    use http::HeaderValue;

    #[test]
    fn url_building_respects_existing_query() {
        assert_eq!(
            build_url_with_params("https://api.example.com/w", None),
            "https://api.example.com/w"
        );

        let mut params = BTreeMap::new();
        params.insert("location".to_string(), "NYC".to_string());
        params.insert("units".to_string(), "metric".to_string());
        assert_eq!(
            build_url_with_params("https://api.example.com/w", Some(&params)),
            "https://api.example.com/w?location=NYC&units=metric"
        );
        assert_eq!(
            build_url_with_params("https://api.example.com/w?a=1", Some(&params)),
            "https://api.example.com/w?a=1&location=NYC&units=metric"
        );
    }

    #[test]
    fn proof_header_precedence_and_fallback() {
        let proof = serde_json::json!({"transaction": "0xabc"});
        let encoded = Base64Bytes::encode(serde_json::to_vec(&proof).unwrap()).to_string();

        let mut headers = HeaderMap::new();
        headers.insert("x-payment-response", HeaderValue::from_str(&encoded).unwrap());
        let decoded = proof_from_headers(&headers).unwrap();
        assert_eq!(decoded["transaction"], "0xabc");

        headers.insert("payment-response", HeaderValue::from_static("@@garbage@@"));
        let decoded = proof_from_headers(&headers).unwrap();
        assert_eq!(decoded["raw"], "@@garbage@@");

        assert!(proof_from_headers(&HeaderMap::new()).is_none());
    }
}
