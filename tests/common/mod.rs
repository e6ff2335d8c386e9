//! In-process stand-in for the Kubernetes API server.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use http::{Method, Request, Response, StatusCode};
use kube::{client::Body, Client};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Recorded {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct MockApi {
    pub client: Client,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self, method: Method) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.path)
            .collect()
    }
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k.to_owned(), v.to_owned())
        })
        .collect()
}

/// Answer every request with `route(method, path)`.
pub fn serve<F>(route: F) -> MockApi
where
    F: Fn(&Method, &str) -> (StatusCode, Value) + Send + 'static,
{
    let (service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        while let Some((request, send)) = handle.next_request().await {
            let path = request.uri().path().to_owned();
            let (status, body) = route(request.method(), &path);
            recorded.lock().unwrap().push(Recorded {
                method: request.method().clone(),
                path,
                query: parse_query(request.uri().query()),
            });
            send.send_response(
                Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            );
        }
    });

    MockApi {
        client: Client::new(service, "default"),
        requests,
    }
}

pub fn failure(code: StatusCode, reason: &str, message: &str) -> (StatusCode, Value) {
    (
        code,
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": code.as_u16(),
        }),
    )
}

pub fn not_found() -> (StatusCode, Value) {
    failure(StatusCode::NOT_FOUND, "NotFound", "the server could not find the requested resource")
}

fn resource(name: &str, kind: &str, namespaced: bool) -> Value {
    json!({
        "name": name,
        "singularName": kind.to_lowercase(),
        "namespaced": namespaced,
        "kind": kind,
        "verbs": ["create", "get", "list", "patch"],
    })
}

fn group(name: &str, version: &str) -> Value {
    let group_version = json!({ "groupVersion": format!("{name}/{version}"), "version": version });
    json!({
        "name": name,
        "versions": [group_version.clone()],
        "preferredVersion": group_version,
    })
}

/// Discovery documents of a small cluster whose metrics API is unavailable.
pub fn discovery(path: &str) -> Option<(StatusCode, Value)> {
    let body = match path {
        "/api" => json!({
            "versions": ["v1"],
            "serverAddressByClientCIDRs": [],
        }),
        "/api/v1" => json!({
            "groupVersion": "v1",
            "resources": [
                resource("configmaps", "ConfigMap", true),
                resource("namespaces", "Namespace", false),
                resource("pods/log", "Pod", true),
            ],
        }),
        "/apis" => json!({
            "groups": [
                group("apps", "v1"),
                group("rbac.authorization.k8s.io", "v1"),
                group("metrics.k8s.io", "v1beta1"),
            ],
        }),
        "/apis/apps/v1" => json!({
            "groupVersion": "apps/v1",
            "resources": [resource("deployments", "Deployment", true)],
        }),
        "/apis/rbac.authorization.k8s.io/v1" => json!({
            "groupVersion": "rbac.authorization.k8s.io/v1",
            "resources": [resource("clusterroles", "ClusterRole", false)],
        }),
        "/apis/metrics.k8s.io/v1beta1" => {
            return Some(failure(
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
                "the server is currently unable to handle the request",
            ))
        }
        _ => return None,
    };
    Some((StatusCode::OK, body))
}

/// The object a server-side apply returns: just enough metadata to decode.
pub fn applied(path: &str) -> (StatusCode, Value) {
    let name = path.rsplit('/').next().unwrap_or_default();
    (StatusCode::OK, json!({ "metadata": { "name": name } }))
}
