//! Application catalog queries.
//!
//! Applications live in an organisation's object repository under a slash
//! separated path such as `team/web/app`. The helpers here answer whether a
//! path names an app and turn version tags into the concrete version ids a
//! deployment needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::client::{Client, ClientError};

const APP_OBJECT_TYPE: &str = "app";

#[derive(Debug, Deserialize)]
struct CatalogObject {
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// One published version of an application.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct AppVersion {
    /// Human-assigned tag, possibly empty.
    #[serde(default)]
    pub tag: String,
    /// Concrete version id.
    pub version: String,
    /// Publication time.
    pub created: DateTime<Utc>,
}

/// Splits an application path into its directory and base name.
///
/// `"a/b/app"` yields `("a/b", "app")`; a bare `"app"` yields `("", "app")`.
/// Only the separator before the base name is dropped, so `"a//app"` keeps
/// `"a/"` as its directory.
#[must_use]
pub fn split_app_path(app: &str) -> (&str, &str) {
    app.rsplit_once('/').unwrap_or(("", app))
}

/// Reports whether `app` names an application visible to `organisation`.
///
/// # Errors
///
/// Returns [`ClientError::NotAnApp`] when the path names an object of another
/// type, and the client's request errors when the listing fails.
pub async fn app_exists(client: &Client, organisation: &str, app: &str) -> Result<bool, ClientError> {
    let (dir, base) = split_app_path(app);
    let path = format!("images/api/v3/orgs/{organisation}/objects/");
    let objects: Vec<CatalogObject> = client
        .get_json(&path, &[("op", "list"), ("dir", dir)])
        .await?;
    debug!(org = organisation, app, listed = objects.len(), "catalog listed");

    match objects.into_iter().find(|object| object.name == base) {
        Some(object) if object.kind == APP_OBJECT_TYPE => Ok(true),
        Some(object) => Err(ClientError::NotAnApp {
            path: app.to_owned(),
            kind: object.kind,
        }),
        None => Ok(false),
    }
}

/// Lists every published version of `app`.
///
/// # Errors
///
/// Returns the client's request errors when the listing fails.
pub async fn list_versions(
    client: &Client,
    organisation: &str,
    app: &str,
) -> Result<Vec<AppVersion>, ClientError> {
    let (dir, base) = split_app_path(app);
    let path = format!("images/api/v3/orgs/{organisation}/objects/{base}");
    client
        .get_json(&path, &[("op", "list"), ("dir", dir)])
        .await
}

/// Picks the version id matching `requested` from `versions`.
///
/// An empty request selects the most recently created version. Otherwise the
/// first entry whose id or tag equals `requested` wins.
///
/// # Errors
///
/// Returns [`ClientError::VersionNotFound`] when `versions` is empty or
/// nothing matches.
pub fn resolve_version(
    versions: &[AppVersion],
    requested: &str,
    app: &str,
) -> Result<String, ClientError> {
    let found = if requested.is_empty() {
        versions.iter().max_by_key(|entry| entry.created)
    } else {
        versions
            .iter()
            .find(|entry| entry.version == requested || entry.tag == requested)
    };
    found
        .map(|entry| entry.version.clone())
        .ok_or_else(|| ClientError::VersionNotFound {
            app: app.to_owned(),
            version: requested.to_owned(),
        })
}

/// Resolves a version id or tag of `app` to a version id. An empty `version`
/// means the latest.
///
/// # Errors
///
/// Returns [`ClientError::VersionNotFound`] when the app has no matching
/// version, and the client's request errors when the listing fails.
pub async fn resolve_version_to_id(
    client: &Client,
    organisation: &str,
    app: &str,
    version: &str,
) -> Result<String, ClientError> {
    let versions = list_versions(client, organisation, app).await?;
    let id = resolve_version(&versions, version, app)?;
    debug!(org = organisation, app, requested = version, %id, "version resolved");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[fixture]
    fn versions() -> Vec<AppVersion> {
        let at = |day| {
            Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0)
                .single()
                .expect("valid timestamp")
        };
        vec![
            AppVersion {
                tag: String::from("old"),
                version: String::from("v1"),
                created: at(1),
            },
            AppVersion {
                tag: String::from("stable"),
                version: String::from("v2"),
                created: at(2),
            },
        ]
    }

    #[rstest]
    #[case("a/b/app", "a/b", "app")]
    #[case("app", "", "app")]
    #[case("/app", "", "app")]
    #[case("team//app", "team/", "app")]
    fn splits_application_paths(#[case] app: &str, #[case] dir: &str, #[case] base: &str) {
        assert_eq!(split_app_path(app), (dir, base));
    }

    #[rstest]
    #[case("", "v2")]
    #[case("old", "v1")]
    #[case("stable", "v2")]
    #[case("v1", "v1")]
    fn resolves_requested_versions(
        versions: Vec<AppVersion>,
        #[case] requested: &str,
        #[case] expected: &str,
    ) {
        let id = resolve_version(&versions, requested, "acme/app").expect("resolvable");
        assert_eq!(id, expected);
    }

    #[rstest]
    fn unknown_tag_is_not_found(versions: Vec<AppVersion>) {
        let err = resolve_version(&versions, "beta", "acme/app").expect_err("unknown tag");
        assert_eq!(
            err,
            ClientError::VersionNotFound {
                app: String::from("acme/app"),
                version: String::from("beta"),
            }
        );
    }

    #[test]
    fn empty_listing_has_no_latest() {
        let err = resolve_version(&[], "", "acme/app").expect_err("nothing to pick");
        assert!(matches!(err, ClientError::VersionNotFound { .. }), "got {err:?}");
    }

    async fn catalog(body: serde_json::Value) -> (MockServer, Client) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images/api/v3/orgs/acme/objects/"))
            .and(query_param("op", "list"))
            .and(query_param("dir", "team"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let client = Client::with_token(&server.uri(), "t");
        (server, client)
    }

    #[tokio::test]
    async fn app_exists_matches_app_objects() {
        let (_server, client) = catalog(serde_json::json!([
            {"name": "web", "path": "team/web", "type": "app"},
            {"name": "docs", "path": "team/docs", "type": "dir"}
        ]))
        .await;

        assert!(app_exists(&client, "acme", "team/web").await.expect("listing"));
        assert!(!app_exists(&client, "acme", "team/api").await.expect("listing"));
    }

    #[tokio::test]
    async fn app_exists_rejects_other_object_types() {
        let (_server, client) = catalog(serde_json::json!([
            {"name": "docs", "path": "team/docs", "type": "dir"}
        ]))
        .await;

        let err = app_exists(&client, "acme", "team/docs")
            .await
            .expect_err("directory is not an app");
        assert_eq!(
            err,
            ClientError::NotAnApp {
                path: String::from("team/docs"),
                kind: String::from("dir"),
            }
        );
    }

    #[tokio::test]
    async fn resolve_version_to_id_queries_the_base_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images/api/v3/orgs/acme/objects/web"))
            .and(query_param("op", "list"))
            .and(query_param("dir", "team"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"tag": "old", "version": "v1", "created": "2024-03-01T12:00:00Z"},
                {"tag": "stable", "version": "v2", "created": "2024-03-02T12:00:00Z"}
            ])))
            .mount(&server)
            .await;
        let client = Client::with_token(&server.uri(), "t");

        let latest = resolve_version_to_id(&client, "acme", "team/web", "")
            .await
            .expect("latest");
        assert_eq!(latest, "v2");
    }

    #[tokio::test]
    async fn listing_failure_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = Client::with_token(&server.uri(), "t");

        let err = list_versions(&client, "acme", "web")
            .await
            .expect_err("not found");
        assert_eq!(
            err,
            ClientError::Remote {
                status: 404,
                text: String::from("404 Not Found"),
            }
        );
    }
}
