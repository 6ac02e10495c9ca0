//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

use crate::http::Request;

/// Identity of a request inside a cache store.
///
/// Built from the method, the URL without its fragment and the values of
/// the vary headers. Two requests with equal keys share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub hash: String,
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Key for a request, folding in the named vary headers.
    pub fn for_request(request: &Request, vary_headers: &[String]) -> Self {
        let vary: Vec<&str> = vary_headers
            .iter()
            .map(|name| request.header(name).unwrap_or(""))
            .collect();
        Self::new(&request.method, &request.url, &vary.join("\n"))
    }

    /// Key for a GET of `url` with no vary header values.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url, "")
    }

    fn new(method: &str, url: &Url, vary: &str) -> Self {
        let method = method.to_ascii_uppercase();
        let mut url = url.clone();
        url.set_fragment(None);
        let url = url.to_string();
        Self { hash: compute_cache_key(&method, &url, vary), method, url }
    }
}

/// Compute a cache key for a request identity.
pub fn compute_cache_key(method: &str, url: &str, vary_headers: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(vary_headers.as_bytes());
    hex::encode(hasher.finalize())
}
