//! OpenAPI 3.0 document served at `/api-docs.json`.
//!
//! Paths are assembled here; every body schema is derived with `schemars`
//! from the types the handlers actually serialize.

use std::collections::BTreeMap;

use schemars::gen::{SchemaGenerator, SchemaSettings};
use schemars::JsonSchema;
use serde_json::{json, Value};
use userhub::User;

use crate::error::ErrorResponse;
use crate::routes::ApiResponse;

#[derive(serde::Serialize)]
pub struct OpenApi {
    pub openapi: &'static str,
    pub info: OpenApiInfo,
    pub paths: BTreeMap<&'static str, Value>,
    pub components: OpenApiComponents,
    pub security: Vec<Value>,
}

#[derive(serde::Serialize)]
pub struct OpenApiInfo {
    pub title: &'static str,
    pub version: &'static str,
    pub description: Option<&'static str>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiComponents {
    pub schemas: BTreeMap<String, Value>,
    pub security_schemes: BTreeMap<&'static str, Value>,
}

/// Collects component schemas while paths reference them.
struct Components {
    generator: SchemaGenerator,
}

impl Components {
    fn new() -> Self {
        Self {
            generator: SchemaSettings::openapi3().into_generator(),
        }
    }

    /// `$ref` to `T`, registering its definition on first use.
    fn schema_for<T: JsonSchema>(&mut self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.generator.subschema_for::<T>())
    }

    fn response<T: JsonSchema>(&mut self, description: &str) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "description": description,
            "content": {"application/json": {"schema": self.schema_for::<T>()?}}
        }))
    }

    fn error(&mut self, description: &str) -> Result<Value, serde_json::Error> {
        self.response::<ErrorResponse>(description)
    }

    fn into_schemas(mut self) -> Result<BTreeMap<String, Value>, serde_json::Error> {
        self.generator
            .take_definitions()
            .into_iter()
            .map(|(name, schema)| Ok((name, serde_json::to_value(schema)?)))
            .collect()
    }
}

fn public() -> Value {
    json!([])
}

fn id_param() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Decimal user id",
        "schema": {"type": "string", "pattern": "^[0-9]+$"}
    })
}

fn user_body(required: bool) -> Value {
    let required_fields = if required {
        json!(["name", "email"])
    } else {
        json!([])
    };
    json!({
        "required": true,
        "content": {"application/json": {"schema": {
            "type": "object",
            "required": required_fields,
            "properties": {
                "name": {"type": "string"},
                "email": {"type": "string"}
            }
        }}}
    })
}

fn paths(c: &mut Components) -> Result<BTreeMap<&'static str, Value>, serde_json::Error> {
    let unauthorized = c.error("Missing API key")?;
    let forbidden = c.error("Invalid API key")?;
    let malformed_id = c.error("Malformed id")?;
    let no_such_user = c.error("No such user")?;
    let email_taken = c.error("Email already in use")?;
    let one = |c: &mut Components, d: &str| c.response::<ApiResponse<User>>(d);
    let many = |c: &mut Components, d: &str| c.response::<ApiResponse<Vec<User>>>(d);

    let mut paths = BTreeMap::new();
    paths.insert(
        "/",
        json!({"get": {"summary": "Welcome message", "security": public(),
            "responses": {"200": {"description": "Service name, version and docs link"}}}}),
    );
    paths.insert(
        "/api-docs.json",
        json!({"get": {"summary": "This OpenAPI document", "security": public(),
            "responses": {"200": {"description": "OpenAPI 3.0 document"}}}}),
    );
    paths.insert(
        "/health",
        json!({"get": {"summary": "Liveness probe", "security": public(),
            "responses": {"200": {"description": "Process is alive"}}}}),
    );
    paths.insert(
        "/ready",
        json!({"get": {"summary": "Readiness probe", "security": public(),
            "responses": {
                "200": {"description": "Ready for traffic"},
                "503": {"description": "A dependency is not ready"}
            }}}),
    );
    paths.insert(
        "/api/v1/info",
        json!({"get": {"summary": "API metadata",
            "responses": {"200": {"description": "API metadata"},
                "401": unauthorized, "403": forbidden}}}),
    );
    paths.insert(
        "/api/v1/status",
        json!({"get": {"summary": "Process status snapshot",
            "responses": {"200": {"description": "Status snapshot"},
                "401": unauthorized, "403": forbidden}}}),
    );
    paths.insert(
        "/api/v1/users",
        json!({
            "get": {"summary": "List users",
                "responses": {"200": many(c, "All live users")?,
                    "401": unauthorized, "403": forbidden}},
            "post": {"summary": "Create a user", "requestBody": user_body(true),
                "responses": {
                    "201": one(c, "Created user")?,
                    "400": c.error("Missing name or email")?,
                    "409": email_taken,
                    "401": unauthorized, "403": forbidden}}
        }),
    );
    paths.insert(
        "/api/v1/users/search",
        json!({"get": {"summary": "Search users by name (case-insensitive substring)",
            "parameters": [{"name": "name", "in": "query", "required": true, "schema": {"type": "string"}}],
            "responses": {
                "200": many(c, "Matching users, possibly none")?,
                "400": c.error("Missing name parameter")?,
                "401": unauthorized, "403": forbidden}}}),
    );
    paths.insert(
        "/api/v1/users/{id}",
        json!({
            "parameters": [id_param()],
            "get": {"summary": "Get a user",
                "responses": {
                    "200": one(c, "The user")?,
                    "400": malformed_id, "404": no_such_user,
                    "401": unauthorized, "403": forbidden}},
            "put": {"summary": "Update name and/or email", "requestBody": user_body(false),
                "responses": {
                    "200": one(c, "Updated user")?,
                    "400": c.error("Malformed id or empty update")?,
                    "404": no_such_user, "409": email_taken,
                    "401": unauthorized, "403": forbidden}},
            "delete": {"summary": "Delete a user",
                "responses": {
                    "200": one(c, "Deleted user, with a confirmation message")?,
                    "400": malformed_id, "404": no_such_user,
                    "401": unauthorized, "403": forbidden}}
        }),
    );
    Ok(paths)
}

/// Build the document; `api_key_header` names the credential header.
pub fn document(api_key_header: &'static str) -> Result<OpenApi, serde_json::Error> {
    let mut components = Components::new();
    let paths = paths(&mut components)?;

    let mut security_schemes = BTreeMap::new();
    security_schemes.insert(
        "ApiKeyAuth",
        json!({"type": "apiKey", "in": "header", "name": api_key_header}),
    );

    Ok(OpenApi {
        openapi: "3.0.3",
        info: OpenApiInfo {
            title: "userhub API",
            version: env!("CARGO_PKG_VERSION"),
            description: Some("In-memory user directory with API key authentication"),
        },
        paths,
        components: OpenApiComponents {
            schemas: components.into_schemas()?,
            security_schemes,
        },
        security: vec![json!({"ApiKeyAuth": []})],
    })
}
