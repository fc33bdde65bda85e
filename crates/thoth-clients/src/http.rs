use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidConfig(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidConfig(format!("{raw}: not a base url")));
    }
    Ok(url)
}

/// Append path segments and query pairs to `base`.
pub(crate) fn endpoint(base: &Url, segments: &[&str], query: &[(&str, String)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in query {
            pairs.append_pair(k, v);
        }
    }
    url
}

/// Send the request and return the body of a successful response.
pub(crate) async fn fetch_text(req: RequestBuilder) -> Result<String, ClientError> {
    let response = req.send().await?;
    let status = response.status();
    let body = response.text().await?;

    match status {
        s if s.is_success() => Ok(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized(body)),
        s => Err(ClientError::Status {
            status: s.as_u16(),
            body,
        }),
    }
}

/// Send the request and decode a JSON body, mapping HTTP failures to [`ClientError`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let body = fetch_text(req).await?;
    serde_json::from_str(&body).map_err(|e| {
        ClientError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
    })
}
