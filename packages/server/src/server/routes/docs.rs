use axum::{
    http::header,
    response::{Html, IntoResponse, Response},
};

/// OpenAPI description of the intake API, embedded at compile time.
pub const OPENAPI_YAML: &str = include_str!("../openapi.yaml");

const DOCS_HTML: &str = r##"<!doctype html>
<html>
<head>
<title>Telemetry Ingest API Docs</title>
<link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
window.ui = SwaggerUIBundle({ url: "/openapi.yaml", dom_id: "#swagger-ui" });
</script>
</body>
</html>"##;

pub async fn openapi_handler() -> Response {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_YAML).into_response()
}

/// Swagger UI pointed at `/openapi.yaml`.
pub async fn docs_handler() -> Html<&'static str> {
    Html(DOCS_HTML)
}
