use serde::Serialize;
use spin_sdk::http::{Request, Response};

use crate::core::errors::ApiError;

pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

pub fn json_response<T: Serialize>(status: u16, value: &T) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(value)?)
        .build())
}

pub fn no_content() -> Response {
    Response::builder().status(204).build()
}

/// Deserializes a JSON body, turning any parse failure into a 400.
pub fn parse_json<T: serde::de::DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    serde_json::from_slice(req.body())
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

const POST_ITEM_PREFIX: &str = "/api/posts/";

/// The `{id}` segment of `/api/posts/{id}`, allowing one trailing slash.
/// `None` for any other shape, including nested paths.
pub fn post_item_segment(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(POST_ITEM_PREFIX)?;
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    (!rest.is_empty() && !rest.contains('/')).then_some(rest)
}

pub fn post_id_from_path(path: &str) -> Result<u64, ApiError> {
    post_item_segment(path)
        .and_then(|segment| segment.parse::<u64>().ok())
        .ok_or_else(|| ApiError::BadRequest("Post ID must be a positive integer".to_string()))
}

pub fn authorization_header(req: &Request) -> Option<&str> {
    req.header("Authorization").and_then(|h| h.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_is_the_last_segment() {
        assert_eq!(post_id_from_path("/api/posts/42").unwrap(), 42);
        assert_eq!(post_id_from_path("/api/posts/7/").unwrap(), 7);
    }

    #[test]
    fn only_a_single_segment_is_an_item_path() {
        assert_eq!(post_item_segment("/api/posts/1"), Some("1"));
        assert_eq!(post_item_segment("/api/posts/1/"), Some("1"));
        assert_eq!(post_item_segment("/api/posts/"), None);
        assert_eq!(post_item_segment("/api/posts/1//"), None);
        assert_eq!(post_item_segment("/api/posts/bogus/extra/1"), None);
        assert_eq!(post_item_segment("/api/postsx/1"), None);
        assert!(post_id_from_path("/api/posts/bogus/extra/1").is_err());
    }

    #[test]
    fn non_numeric_post_id_is_rejected() {
        assert!(post_id_from_path("/api/posts/abc").is_err());
        assert!(post_id_from_path("/api/posts/-1").is_err());
    }
}
