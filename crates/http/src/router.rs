//! Router assembly: module mounting, middleware, and the OpenAPI document.

use std::time::Duration;

use axum::{routing::get, routing::MethodRouter, Json, Router};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use bookshelf_kernel::{Module, ModuleRegistry};

const API_TITLE: &str = "Bookshelf API";
const API_VERSION: &str = "1.0.0";
const OPENAPI_JSON_PATH: &str = "/docs/openapi.json";
const SWAGGER_UI_PATH: &str = "/swagger-ui";

/// Incrementally assembles the application router.
///
/// Routes and modules go in first; each `with_*` layer wraps everything added
/// before it.
#[derive(Default)]
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Nest `module`'s routes under its mount path.
    pub fn mount_module(mut self, module: &dyn Module) -> Self {
        let mount_path = module.mount_path();
        tracing::info!(module = module.name(), path = %mount_path, "mounting module routes");
        self.router = self.router.nest(&mount_path, module.routes());
        self
    }

    /// Span per request with headers; request and response logged at INFO.
    pub fn with_tracing(mut self) -> Self {
        let trace = TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().include_headers(true))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO));
        self.router = self.router.layer(trace);
        self
    }

    /// Any origin, method and header. The catalog has no credentials to protect.
    pub fn with_cors(mut self) -> Self {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        self.router = self.router.layer(cors);
        self
    }

    /// Tag each request with an `x-request-id` UUID and echo it on the response.
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Serve the merged document as raw JSON and behind Swagger UI.
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let document = merged_openapi(registry);

        let typed: utoipa::openapi::OpenApi = match serde_json::from_value(document.clone()) {
            Ok(typed) => typed,
            Err(e) => {
                tracing::warn!(error = %e, "merged OpenAPI document does not parse; Swagger UI shows an empty API");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title(API_TITLE)
                            .version(API_VERSION)
                            .build(),
                    )
                    .build()
            }
        };

        self.router = self
            .router
            .merge(utoipa_swagger_ui::SwaggerUi::new(SWAGGER_UI_PATH).url("/api-docs/openapi.json", typed))
            .route(
                OPENAPI_JSON_PATH,
                get(move || {
                    let document = document.clone();
                    async move { Json(document) }
                }),
            );
        self
    }

    pub fn build(self) -> Router {
        self.router
    }
}

fn base_document() -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {
            "title": API_TITLE,
            "version": API_VERSION,
            "description": "Book catalog API"
        },
        "paths": {
            "/healthz": {
                "get": {
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "Server is up",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" },
                        "code": { "type": "string" },
                        "details": { "type": "array", "items": {} },
                        "trace_id": { "type": "string" },
                        "timestamp": { "type": "string", "format": "date-time" }
                    },
                    "required": ["message", "code", "trace_id", "timestamp"]
                }
            }
        }
    })
}

/// Join a module-relative path onto its mount path; `/` is the mount path itself.
fn absolute_path(mount_path: &str, path: &str) -> String {
    if path == "/" {
        mount_path.to_string()
    } else {
        format!("{mount_path}{path}")
    }
}

/// The base document plus every module's paths and schemas.
pub fn merged_openapi(registry: &ModuleRegistry) -> Value {
    let mut document = base_document();

    for module in registry.modules() {
        let Some(fragment) = module.openapi() else {
            continue;
        };
        let mount_path = module.mount_path();

        if let Some(paths) = fragment["paths"].as_object() {
            for (path, item) in paths {
                document["paths"][absolute_path(&mount_path, path)] = item.clone();
            }
        }
        if let Some(schemas) = fragment["components"]["schemas"].as_object() {
            for (name, schema) in schemas {
                document["components"]["schemas"][name] = schema.clone();
            }
        }
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::Path;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoModule;

    async fn echo_word(Path(word): Path<String>) -> String {
        word
    }

    impl Module for EchoModule {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn routes(&self) -> Router {
            Router::new()
                .route("/", get(|| async { "root" }))
                .route("/{word}", get(echo_word))
        }

        fn openapi(&self) -> Option<Value> {
            Some(json!({
                "paths": {
                    "/": { "get": { "summary": "Echo root", "responses": {} } },
                    "/{word}": { "get": { "summary": "Echo word", "responses": {} } }
                },
                "components": { "schemas": { "Echo": { "type": "string" } } }
            }))
        }
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(EchoModule)).unwrap();
        registry
    }

    async fn get_text(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn module_routes_are_nested_under_mount_path() {
        let router = RouterBuilder::new().mount_module(&EchoModule).build();

        assert_eq!(
            get_text(router.clone(), "/api/echo").await,
            (StatusCode::OK, "root".to_string())
        );
        assert_eq!(
            get_text(router, "/api/echo/hello").await,
            (StatusCode::OK, "hello".to_string())
        );
    }

    #[tokio::test]
    async fn middleware_stack_sets_request_id() {
        let router = RouterBuilder::new()
            .route("/health", get(|| async { "ok" }))
            .with_tracing()
            .with_cors()
            .with_request_id()
            .with_timeout(5000)
            .build();

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn absolute_path_maps_root_to_mount_path() {
        assert_eq!(absolute_path("/api/books", "/"), "/api/books");
        assert_eq!(absolute_path("/api/books", "/{id}"), "/api/books/{id}");
    }

    #[test]
    fn openapi_merges_module_paths_and_schemas() {
        let document = merged_openapi(&registry());

        assert!(document["paths"]["/api/echo"]["get"].is_object());
        assert!(document["paths"]["/api/echo/{word}"]["get"].is_object());
        assert!(document["paths"]["/healthz"]["get"].is_object());
        assert!(document["components"]["schemas"]["Echo"].is_object());
        assert!(document["components"]["schemas"]["ErrorResponse"].is_object());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let router = RouterBuilder::new().with_openapi(&registry()).build();

        let (status, body) = get_text(router, OPENAPI_JSON_PATH).await;

        assert_eq!(status, StatusCode::OK);
        let document: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(document["info"]["title"], API_TITLE);
    }
}
