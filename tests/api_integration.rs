use std::sync::Arc;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use erp_nav::app::build_composer;
use erp_nav::errors::FetchError;
use erp_nav::provider::StaticModuleProvider;
use erp_nav::{create_app, AppState, NavConfig};

fn app() -> Result<Router> {
    let composer = build_composer(&NavConfig::default())?;
    Ok(create_app(AppState::new(composer)))
}

async fn json_body(resp: Response) -> Result<Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn post(uri: &str, payload: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload)?))?)
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::builder().method("GET").uri(uri).body(Body::empty())?)
}

#[tokio::test]
async fn health_reports_registry_size() -> Result<()> {
    let resp = app()?.oneshot(get("/api/health")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await?;
    assert_eq!(v["status"], "ok");
    assert_eq!(v["modules"], 5);
    assert_eq!(v["remote_provider"], false);
    Ok(())
}

#[tokio::test]
async fn registry_endpoints() -> Result<()> {
    let app = app()?;

    let resp = app.clone().oneshot(get("/api/registry/modules")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await?;
    let keys: Vec<&str> = v
        .as_array()
        .map(|modules| modules.iter().filter_map(|m| m["key"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(keys, vec!["hr", "payroll", "finance", "projects", "procurement"]);

    let resp = app.clone().oneshot(get("/api/registry/modules/hr")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await?;
    assert_eq!(v["base_path"], "/dashboard/modules/hr");

    let resp = app.oneshot(get("/api/registry/modules/warehouse")?).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v = json_body(resp).await?;
    assert_eq!(v["error"], "not_found");
    Ok(())
}

#[tokio::test]
async fn resolve_returns_sections_and_etag() -> Result<()> {
    let app = app()?;
    let payload = json!({
        "user": {
            "role_level": 700,
            "department": "Human Resources",
            "permissions": ["document.edit"],
            "module_access": ["hr"]
        },
        "path": "/dashboard/modules/hr/recruitment"
    });

    let resp = app.clone().oneshot(post("/api/navigation/resolve", &payload)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let etag = resp
        .headers()
        .get(header::ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("resolve must send an ETag");

    let v = json_body(resp).await?;
    assert_eq!(v["source"], "registry");
    assert_eq!(v["sections"][0]["items"][0]["path"], "/dashboard");
    assert_eq!(v["active_module"], "hr");
    assert_eq!(v["access"], "allowed");
    assert_eq!(v["fingerprint"].as_str().map(str::len), Some(64));

    let mut conditional = post("/api/navigation/resolve", &payload)?;
    conditional
        .headers_mut()
        .insert(header::IF_NONE_MATCH, etag.parse()?);
    let resp = app.oneshot(conditional).await?;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    Ok(())
}

#[tokio::test]
async fn etag_from_one_route_does_not_match_another() -> Result<()> {
    let app = app()?;
    let dashboard = json!({"user": {"role_level": 200}, "path": "/dashboard"});
    let users = json!({"user": {"role_level": 200}, "path": "/dashboard/system/users"});

    let resp = app.clone().oneshot(post("/api/navigation/resolve", &dashboard)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let etag = resp
        .headers()
        .get(header::ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("resolve must send an ETag");
    assert_eq!(json_body(resp).await?["access"], "allowed");

    let mut conditional = post("/api/navigation/resolve", &users)?;
    conditional
        .headers_mut()
        .insert(header::IF_NONE_MATCH, etag.parse()?);
    let resp = app.oneshot(conditional).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_ne!(
        resp.headers().get(header::ETAG).and_then(|value| value.to_str().ok()),
        Some(etag.as_str())
    );
    assert_eq!(json_body(resp).await?["access"], "denied");
    Ok(())
}

#[tokio::test]
async fn resolve_prefers_supplied_remote_modules() -> Result<()> {
    let payload = json!({
        "user": {"role_level": 300},
        "remote_modules": [
            {"code": "FIELD_SERVICE", "name": "Field Service", "requiredRoleLevel": 200},
            {"name": "Orphan"}
        ]
    });

    let resp = app()?.oneshot(post("/api/navigation/resolve", &payload)?).await?;
    let v = json_body(resp).await?;

    assert_eq!(v["source"], "remote");
    let modules = v["sections"]
        .as_array()
        .and_then(|sections| sections.iter().find(|s| s["name"] == "modules"))
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(modules["items"][0]["path"], "/dashboard/modules/field-service");
    assert_eq!(v["diagnostics"][0]["kind"], "data_quality");
    assert!(v.get("access").is_none());
    Ok(())
}

#[tokio::test]
async fn provider_failure_degrades_to_registry() -> Result<()> {
    let composer = build_composer(&NavConfig::default())?;
    let state = AppState::new(composer).with_provider(Arc::new(StaticModuleProvider::failing(FetchError::Status(502))));
    let app = create_app(state);

    let payload = json!({"user": {"role_level": 200, "module_access": ["projects"]}});
    let resp = app.oneshot(post("/api/navigation/resolve", &payload)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await?;
    assert_eq!(v["source"], "registry");
    assert_eq!(v["diagnostics"][0]["kind"], "fetch_failure");
    Ok(())
}

#[tokio::test]
async fn access_endpoint() -> Result<()> {
    let app = app()?;

    let denied = json!({"user": {"role_level": 100}, "path": "/dashboard/system/users/"});
    let v = json_body(app.clone().oneshot(post("/api/navigation/access", &denied)?).await?).await?;
    assert_eq!(v["outcome"], "denied");
    assert_eq!(v["path"], "/dashboard/system/users");

    let allowed = json!({
        "user": {"role_level": 600, "permissions": ["payroll.run"], "module_access": ["payroll"]},
        "path": "/dashboard/modules/payroll/payslips"
    });
    let v = json_body(app.clone().oneshot(post("/api/navigation/access", &allowed)?).await?).await?;
    assert_eq!(v["outcome"], "allowed");
    assert_eq!(v["module"], "payroll");

    let unowned = json!({"user": {"role_level": 1000}, "path": "/login"});
    let v = json_body(app.clone().oneshot(post("/api/navigation/access", &unowned)?).await?).await?;
    assert_eq!(v["outcome"], "unowned");

    let empty = json!({"user": {"role_level": 1000}, "path": "  "});
    let resp = app.oneshot(post("/api/navigation/access", &empty)?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn module_sidebar_endpoint_filters_items() -> Result<()> {
    let app = app()?;

    let user = json!({"role_level": 600, "department": "Finance & Accounting"});
    let resp = app.clone().oneshot(post("/api/navigation/modules/payroll", &user)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await?;

    let sections = v["sections"].as_array().cloned().unwrap_or_default();
    assert_eq!(sections.len(), 1);
    let labels: Vec<&str> = sections[0]["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|item| item["label"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(labels, vec!["Overview", "Payslips"]);

    let resp = app.oneshot(post("/api/navigation/modules/warehouse", &user)?).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}
