//! Static routing table.
//!
//! Partitions request paths into disjoint classes, each mapped to one of the
//! two caching strategies.

use serde::{Deserialize, Serialize};

/// Caching strategy applied to a route class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

/// Route class of a same-origin request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// One of the enumerated shell pages or assets.
    StaticShell,
    /// Under a framework-bundled static asset prefix.
    FrameworkAsset,
    /// Under the API prefix.
    Api,
    Other,
}

impl RouteClass {
    pub fn strategy(self) -> Strategy {
        match self {
            RouteClass::StaticShell | RouteClass::FrameworkAsset => Strategy::CacheFirst,
            RouteClass::Api | RouteClass::Other => Strategy::NetworkFirst,
        }
    }
}

/// Paths and prefixes used to classify requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    /// Exact paths precached on install and served cache-first.
    #[serde(default = "default_static_paths")]
    pub static_paths: Vec<String>,

    /// Prefixes of framework-bundled assets served cache-first.
    #[serde(default = "default_asset_prefixes")]
    pub asset_prefixes: Vec<String>,

    /// Prefix of API routes served network-first.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

fn default_static_paths() -> Vec<String> {
    [
        "/",
        "/about",
        "/timeline",
        "/certifications",
        "/projects",
        "/contact",
        "/manifest.json",
        "/favicon.ico",
        "/og-image.jpg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_asset_prefixes() -> Vec<String> {
    vec!["/_next/static/".into()]
}

fn default_api_prefix() -> String {
    "/api/".into()
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            static_paths: default_static_paths(),
            asset_prefixes: default_asset_prefixes(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl RouteTable {
    /// Classify a URL path.
    ///
    /// Exact static matches win over prefixes, asset prefixes over the API
    /// prefix.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.static_paths.iter().any(|p| p == path) {
            RouteClass::StaticShell
        } else if self.asset_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            RouteClass::FrameworkAsset
        } else if path.starts_with(self.api_prefix.as_str()) {
            RouteClass::Api
        } else {
            RouteClass::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_paths_are_cache_first() {
        let table = RouteTable::default();
        for path in &table.static_paths {
            assert_eq!(table.classify(path), RouteClass::StaticShell, "{path}");
            assert_eq!(table.classify(path).strategy(), Strategy::CacheFirst);
        }
        assert_eq!(table.static_paths.len(), 9);
    }

    #[test]
    fn test_static_match_is_exact() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/about/"), RouteClass::Other);
        assert_eq!(table.classify("/projects/portfolio-site"), RouteClass::Other);
        assert_eq!(table.classify("/projects/portfolio-site").strategy(), Strategy::NetworkFirst);
    }

    #[test]
    fn test_framework_assets_are_cache_first() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/_next/static/chunks/main.js"), RouteClass::FrameworkAsset);
        assert_eq!(table.classify("/_next/static/css/app.css").strategy(), Strategy::CacheFirst);
        assert_eq!(table.classify("/_next/image"), RouteClass::Other);
    }

    #[test]
    fn test_api_is_network_first() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/api/contact"), RouteClass::Api);
        assert_eq!(table.classify("/api/contact").strategy(), Strategy::NetworkFirst);
        assert_eq!(table.classify("/apis"), RouteClass::Other);
    }

    #[test]
    fn test_alternate_table() {
        let table = RouteTable {
            static_paths: vec!["/offline".into()],
            asset_prefixes: vec!["/assets/".into()],
            api_prefix: "/v2/".into(),
        };
        assert_eq!(table.classify("/"), RouteClass::Other);
        assert_eq!(table.classify("/offline"), RouteClass::StaticShell);
        assert_eq!(table.classify("/assets/logo.svg"), RouteClass::FrameworkAsset);
        assert_eq!(table.classify("/v2/items"), RouteClass::Api);
    }
}
