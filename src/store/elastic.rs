//! # HTTP Store Gateway
//!
//! Talks to an Elasticsearch-compatible cluster over its REST API using a
//! blocking `reqwest` client.
//!
//! ## Key Components
//!
//! - **[`StoreOptions`]**: host, credentials and request timeout.
//! - **[`connect`]**: requests `GET /` once, reads `version.number` and returns
//!   a gateway speaking the matching wire dialect.
//! - **[`Dialect`]**: the handful of request details that differ between
//!   store major versions. [`V6`] asks for typeless mappings and gives the
//!   reindex destination an explicit `_doc` type; [`V7`] needs neither.
//! - **[`ElasticGateway`]**: the [`StoreGateway`] implementation, generic over
//!   its dialect.
//!
//! Every request and response body is logged at `trace` level under
//! [`STORE_LOG_TARGET`], so the wire traffic can be enabled on its own.

use std::fmt;
use std::time::Duration;

use log::{debug, trace};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use semver::Version;
use serde_json::{json, Value as Json};
use url::Url;

use super::StoreGateway;
use crate::definition::IndexDefinition;
use crate::error::{Error, Result};
use crate::tree::{tree_to_json, Tree, Value};

/// Log target of the request/response trace.
pub const STORE_LOG_TARGET: &str = "index_reconciler::store";

/// Timeout applied to reindex requests, which block until the copy is done.
const REINDEX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Connection settings for the store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: None,
            password: None,
            request_timeout: Duration::from_secs(crate::defaults::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Parse and check the store host. It must carry a scheme and a host.
///
/// The returned URL always ends with `/` so that relative endpoint paths
/// keep any path prefix the host was given.
pub fn parse_host(host: &str) -> Result<Url> {
    let mut url = Url::parse(host)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Transport {
            message: format!("store host '{}' must use http or https", host),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::Transport {
            message: format!("store host '{}' has no host name", host),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Request details that depend on the store major version.
pub trait Dialect: fmt::Debug + Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Query parameters for index and mapping requests.
    fn mapping_query(&self) -> &'static [(&'static str, &'static str)];

    /// The `dest` section of a reindex request.
    fn reindex_destination(&self, index: &str) -> Json;
}

/// Dialect for 6.x clusters.
#[derive(Debug, Clone, Copy, Default)]
pub struct V6;

impl Dialect for V6 {
    fn name(&self) -> &'static str {
        "v6"
    }

    fn mapping_query(&self) -> &'static [(&'static str, &'static str)] {
        &[("include_type_name", "false")]
    }

    fn reindex_destination(&self, index: &str) -> Json {
        json!({"index": index, "type": "_doc"})
    }
}

/// Dialect for 7.x clusters.
#[derive(Debug, Clone, Copy, Default)]
pub struct V7;

impl Dialect for V7 {
    fn name(&self) -> &'static str {
        "v7"
    }

    fn mapping_query(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn reindex_destination(&self, index: &str) -> Json {
        json!({"index": index})
    }
}

/// Which dialect a store version needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectKind {
    V6,
    V7,
}

impl DialectKind {
    pub fn for_version(version: &Version) -> Result<Self> {
        match version.major {
            6 => Ok(DialectKind::V6),
            7 => Ok(DialectKind::V7),
            _ => Err(Error::UnsupportedVersion {
                version: version.to_string(),
            }),
        }
    }
}

/// Connect to the store and return a gateway for its version.
pub fn connect(options: &StoreOptions) -> Result<Box<dyn StoreGateway>> {
    let base = parse_host(&options.host)?;
    let client = Client::builder().timeout(options.request_timeout).build()?;
    let credentials = options
        .user
        .clone()
        .map(|user| (user, options.password.clone()));

    let client = HttpClient {
        client,
        base,
        credentials,
    };
    let info = client.get_json(Method::GET, "", &[], "detect version", "/")?;
    let version = parse_version(&info)?;
    debug!("store reports version {}", version);

    let gateway: Box<dyn StoreGateway> = match DialectKind::for_version(&version)? {
        DialectKind::V6 => Box::new(ElasticGateway::new(client, V6)),
        DialectKind::V7 => Box::new(ElasticGateway::new(client, V7)),
    };
    Ok(gateway)
}

/// Read `version.number` from the store's root endpoint.
pub fn parse_version(info: &Json) -> Result<Version> {
    let number = info
        .pointer("/version/number")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::StoreQuery {
            operation: "detect version".to_string(),
            target: "/".to_string(),
            message: "response carries no version.number".to_string(),
        })?;
    Ok(Version::parse(number)?)
}

/// Index names an alias lookup returned, sorted.
pub fn parse_alias_targets(body: &Json) -> Vec<String> {
    let mut targets: Vec<String> = body
        .as_object()
        .map(|indices| indices.keys().cloned().collect())
        .unwrap_or_default();
    targets.sort();
    targets
}

/// Build an [`IndexDefinition`] from a `GET /{index}` response.
pub fn parse_index_definition(body: &Json, index: &str) -> Result<IndexDefinition> {
    let entry = body.get(index).ok_or_else(|| Error::IndexNotFound {
        index: index.to_string(),
    })?;
    let section = |key: &str| {
        entry
            .get(key)
            .cloned()
            .map(Value::tree_from_json)
            .unwrap_or_default()
    };
    Ok(IndexDefinition::new(section("mappings"), section("settings")))
}

/// Summarize the `failures` of a reindex response, if any.
pub fn reindex_failures(body: &Json) -> Option<String> {
    let failures = body.get("failures")?.as_array()?;
    if failures.is_empty() {
        return None;
    }
    let first = failures[0]
        .pointer("/cause/reason")
        .and_then(Json::as_str)
        .unwrap_or("unknown cause");
    Some(format!("{} document(s) failed, first: {}", failures.len(), first))
}

/// Alias actions binding an unbound alias.
pub fn bind_actions(alias: &str, index: &str) -> Json {
    json!({"actions": [{"add": {"index": index, "alias": alias}}]})
}

/// Alias actions moving an alias to a new index in one request.
pub fn rebind_actions(alias: &str, new_index: &str) -> Json {
    json!({"actions": [
        {"remove": {"index": "*", "alias": alias}},
        {"add": {"index": new_index, "alias": alias}}
    ]})
}

fn error_reason(body: &str) -> String {
    serde_json::from_str::<Json>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/reason")
                .and_then(Json::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

fn error_type(body: &str) -> Option<String> {
    serde_json::from_str::<Json>(body).ok().and_then(|json| {
        json.pointer("/error/type")
            .and_then(Json::as_str)
            .map(str::to_string)
    })
}

#[derive(Debug, Clone)]
struct HttpClient {
    client: Client,
    base: Url,
    credentials: Option<(String, Option<String>)>,
}

struct Reply {
    status: StatusCode,
    body: String,
}

impl HttpClient {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<RequestBuilder> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        trace!(target: STORE_LOG_TARGET, "{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }
        Ok(request)
    }

    fn send(&self, request: RequestBuilder, body: Option<&Json>) -> Result<Reply> {
        let request = match body {
            Some(body) => {
                trace!(target: STORE_LOG_TARGET, "request body: {}", body);
                request.json(body)
            }
            None => request,
        };
        let response = request.send().map_err(|e| Error::Transport {
            message: e.to_string(),
        })?;
        let status = response.status();
        let body = response.text()?;
        trace!(target: STORE_LOG_TARGET, "response {}: {}", status, body);
        Ok(Reply { status, body })
    }

    fn get_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        operation: &str,
        target: &str,
    ) -> Result<Json> {
        let reply = self.send(self.request(method, path, query)?, None)?;
        expect_success(&reply, operation, target)?;
        Ok(serde_json::from_str(&reply.body)?)
    }
}

fn expect_success(reply: &Reply, operation: &str, target: &str) -> Result<()> {
    if reply.status.is_success() {
        return Ok(());
    }
    Err(Error::StoreQuery {
        operation: operation.to_string(),
        target: target.to_string(),
        message: format!("HTTP {}: {}", reply.status, error_reason(&reply.body)),
    })
}

/// [`StoreGateway`] over the store's REST API.
#[derive(Debug)]
pub struct ElasticGateway<D: Dialect> {
    http: HttpClient,
    dialect: D,
}

impl<D: Dialect> ElasticGateway<D> {
    fn new(http: HttpClient, dialect: D) -> Self {
        debug!("using {} store dialect", dialect.name());
        Self { http, dialect }
    }

    fn post_aliases(&self, actions: &Json, operation: &str, alias: &str) -> Result<()> {
        let request = self.http.request(Method::POST, "_aliases", &[])?;
        let reply = self.http.send(request, Some(actions))?;
        expect_success(&reply, operation, alias)
    }
}

impl<D: Dialect> StoreGateway for ElasticGateway<D> {
    fn alias_exists(&self, alias: &str) -> Result<bool> {
        let request = self
            .http
            .request(Method::HEAD, &format!("_alias/{}", alias), &[])?;
        let reply = self.http.send(request, None)?;
        match reply.status {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::StoreQuery {
                operation: "check alias".to_string(),
                target: alias.to_string(),
                message: format!("HTTP {}", status),
            }),
        }
    }

    fn resolve_physical_index(&self, alias: &str) -> Result<String> {
        let request = self
            .http
            .request(Method::GET, &format!("_alias/{}", alias), &[])?;
        let reply = self.http.send(request, None)?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(Error::UnboundAlias {
                alias: alias.to_string(),
            });
        }
        expect_success(&reply, "resolve alias", alias)?;

        let mut targets = parse_alias_targets(&serde_json::from_str(&reply.body)?);
        match targets.len() {
            0 => Err(Error::UnboundAlias {
                alias: alias.to_string(),
            }),
            1 => Ok(targets.remove(0)),
            _ => Err(Error::AmbiguousAlias {
                alias: alias.to_string(),
                indices: targets,
            }),
        }
    }

    fn fetch_definition(&self, index: &str) -> Result<IndexDefinition> {
        let request = self
            .http
            .request(Method::GET, index, self.dialect.mapping_query())?;
        let reply = self.http.send(request, None)?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(Error::IndexNotFound {
                index: index.to_string(),
            });
        }
        expect_success(&reply, "fetch index", index)?;
        parse_index_definition(&serde_json::from_str(&reply.body)?, index)
    }

    fn create_index(&self, index: &str, definition: &IndexDefinition) -> Result<()> {
        let request = self
            .http
            .request(Method::PUT, index, self.dialect.mapping_query())?;
        let reply = self.http.send(request, Some(&definition.to_json()))?;
        if error_type(&reply.body).as_deref() == Some("resource_already_exists_exception") {
            return Err(Error::IndexExists {
                index: index.to_string(),
            });
        }
        expect_success(&reply, "create index", index)
    }

    fn bind_alias(&self, alias: &str, index: &str) -> Result<()> {
        self.post_aliases(&bind_actions(alias, index), "bind alias", alias)
    }

    fn rebind_alias(&self, alias: &str, new_index: &str) -> Result<()> {
        self.post_aliases(&rebind_actions(alias, new_index), "rebind alias", alias)
    }

    fn update_mappings(&self, index: &str, mappings: &Tree) -> Result<()> {
        let request = self.http.request(
            Method::PUT,
            &format!("{}/_mapping", index),
            self.dialect.mapping_query(),
        )?;
        let reply = self.http.send(request, Some(&tree_to_json(mappings)))?;
        expect_success(&reply, "update mappings", index)
    }

    fn reindex(&self, source: &str, dest: &str) -> Result<()> {
        let body = json!({
            "source": {"index": source},
            "dest": self.dialect.reindex_destination(dest),
        });
        let request = self
            .http
            .request(
                Method::POST,
                "_reindex",
                &[("wait_for_completion", "true"), ("refresh", "true")],
            )?
            .timeout(REINDEX_TIMEOUT);
        let reply = self.http.send(request, Some(&body))?;
        expect_success(&reply, "reindex", source)?;

        match reindex_failures(&serde_json::from_str(&reply.body)?) {
            Some(message) => Err(Error::StoreQuery {
                operation: "reindex".to_string(),
                target: format!("{} -> {}", source, dest),
                message,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_appends_trailing_slash() {
        let url = parse_host("http://localhost:9200").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/");

        let url = parse_host("https://search.internal/es").unwrap();
        assert_eq!(url.join("_aliases").unwrap().as_str(), "https://search.internal/es/_aliases");
    }

    #[test]
    fn test_parse_host_rejects_missing_scheme_or_host() {
        assert!(parse_host("localhost:9200").is_err());
        assert!(parse_host("ftp://localhost").is_err());
        assert!(parse_host("not a url").is_err());
    }

    #[test]
    fn test_parse_version() {
        let info = json!({"name": "node-1", "version": {"number": "7.10.2"}});
        assert_eq!(parse_version(&info).unwrap(), Version::new(7, 10, 2));

        assert!(parse_version(&json!({"version": {}})).is_err());
        assert!(parse_version(&json!({"version": {"number": "seven"}})).is_err());
    }

    #[test]
    fn test_dialect_for_version() {
        assert_eq!(DialectKind::for_version(&Version::new(6, 8, 23)).unwrap(), DialectKind::V6);
        assert_eq!(DialectKind::for_version(&Version::new(7, 17, 0)).unwrap(), DialectKind::V7);

        let err = DialectKind::for_version(&Version::new(8, 1, 0)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
        assert!(DialectKind::for_version(&Version::new(5, 6, 0)).is_err());
    }

    #[test]
    fn test_dialect_request_details() {
        assert_eq!(V6.mapping_query(), &[("include_type_name", "false")]);
        assert!(V7.mapping_query().is_empty());
        assert_eq!(V6.reindex_destination("b"), json!({"index": "b", "type": "_doc"}));
        assert_eq!(V7.reindex_destination("b"), json!({"index": "b"}));
    }

    #[test]
    fn test_parse_alias_targets_sorted() {
        let body = json!({"products-2": {"aliases": {"products": {}}}, "products-1": {"aliases": {}}});
        assert_eq!(parse_alias_targets(&body), vec!["products-1", "products-2"]);
        assert!(parse_alias_targets(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_index_definition_normalizes_settings() {
        let body = json!({
            "products-1": {
                "aliases": {"products": {}},
                "mappings": {"properties": {"id": {"type": "integer"}}},
                "settings": {"index": {"number_of_shards": "1", "uuid": "abc"}}
            }
        });

        let definition = parse_index_definition(&body, "products-1").unwrap();
        assert!(definition.mappings.contains_key("properties"));
        assert_eq!(
            definition.settings,
            Value::tree_from_json(json!({"index": {"number_of_shards": "1"}}))
        );

        assert!(matches!(
            parse_index_definition(&body, "other").unwrap_err(),
            Error::IndexNotFound { .. }
        ));
    }

    #[test]
    fn test_reindex_failures() {
        assert_eq!(reindex_failures(&json!({"took": 10, "failures": []})), None);
        let body = json!({"failures": [{"cause": {"reason": "mapper_parsing_exception"}}]});
        assert_eq!(
            reindex_failures(&body).unwrap(),
            "1 document(s) failed, first: mapper_parsing_exception"
        );
    }

    #[test]
    fn test_alias_action_bodies() {
        assert_eq!(
            rebind_actions("products", "products-2"),
            json!({"actions": [
                {"remove": {"index": "*", "alias": "products"}},
                {"add": {"index": "products-2", "alias": "products"}}
            ]})
        );
        assert_eq!(
            bind_actions("products", "products-1")["actions"][0]["add"]["alias"],
            json!("products")
        );
    }

    #[test]
    fn test_error_reason_extraction() {
        let body = r#"{"error": {"type": "resource_already_exists_exception", "reason": "index exists"}}"#;
        assert_eq!(error_reason(body), "index exists");
        assert_eq!(error_type(body).as_deref(), Some("resource_already_exists_exception"));
        assert_eq!(error_reason("plain failure"), "plain failure");
    }

    #[test]
    fn test_connect_rejects_invalid_host_before_network() {
        let options = StoreOptions {
            host: "localhost".to_string(),
            ..StoreOptions::default()
        };
        assert!(connect(&options).is_err());
    }
}
