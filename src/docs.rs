use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, composer, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::registry::list_modules,
		routes::registry::get_module,
		routes::navigation::resolve,
		routes::navigation::check_access,
		routes::navigation::module_sidebar
	),
	components(
		schemas(
			authz::User,
			composer::AccessOutcome,
			composer::NavigationSource,
			models::navigation::AccessRequirement,
			models::navigation::IconRef,
			models::navigation::SectionKind,
			models::remote::RemoteModuleRecord,
			models::remote::RemoteModulesResponse,
			routes::health::HealthResponse,
			routes::registry::ModuleSummary,
			routes::navigation::ResolveRequest,
			routes::navigation::ResolveResponse,
			routes::navigation::AccessRequest,
			routes::navigation::AccessResponse
		)
	),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Registry", description = "Registered modules"),
		(name = "Navigation", description = "Navigation and access resolution")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

	add_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).try_it_out_enabled(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

/// Request examples keyed by path, for Swagger's "Try it out".
fn request_examples() -> Vec<(&'static str, Value)> {
	vec![
		(
			"/api/navigation/resolve",
			json!({
				"user": {
					"role_level": 700,
					"department": "Human Resources",
					"permissions": ["document.edit"],
					"module_access": ["hr"]
				},
				"path": "/dashboard/modules/hr/employees"
			}),
		),
		(
			"/api/navigation/access",
			json!({
				"user": { "role_level": 100 },
				"path": "/dashboard/system/users"
			}),
		),
		(
			"/api/navigation/modules/{key}",
			json!({ "role_level": 600, "department": "Finance & Accounting" }),
		),
	]
}

fn add_examples(doc: &mut Value) {
	let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
		return;
	};

	for (path, example) in request_examples() {
		let media = paths
			.get_mut(path)
			.and_then(|item| item.get_mut("post"))
			.and_then(|operation| operation.get_mut("requestBody"))
			.and_then(|body| body.get_mut("content"))
			.and_then(|content| content.get_mut("application/json"))
			.and_then(Value::as_object_mut);

		if let Some(media) = media {
			media.entry("example").or_insert(example);
		}
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
