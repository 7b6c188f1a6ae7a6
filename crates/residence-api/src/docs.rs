//! Interactive API documentation.
//!
//! `GET /docs/` serves a Swagger UI page (loaded from a CDN) that renders the
//! OpenAPI 3 document at `GET /docs/openapi.json`.

use axum::{
  Json,
  response::{Html, IntoResponse},
};
use serde_json::{Value, json};

pub const TITLE: &str = "University Residence Management API";
pub const VERSION: &str = "v1";

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>University Residence Management API</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/docs/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

pub async fn ui() -> impl IntoResponse { Html(SWAGGER_UI) }

pub async fn openapi() -> Json<Value> { Json(document()) }

/// The OpenAPI 3 description of every route the router serves.
pub fn document() -> Value {
  let mut paths = serde_json::Map::new();
  for (tag, schema, params) in [
    ("buildings", "Building", &["name", "address"][..]),
    ("rooms", "Room", &["building", "room_number", "capacity"][..]),
    ("residents", "Resident", &["room", "email", "check_in_date", "check_out_date"][..]),
  ] {
    let (collection, item) = entity_paths(tag, schema, params);
    paths.insert(format!("/api/{tag}/"), collection);
    paths.insert(format!("/api/{tag}/{{id}}/"), item);
  }

  paths.insert(
    "/api-token-auth/".into(),
    json!({
      "post": {
        "tags": ["auth"],
        "summary": "Obtain the API token for a username and password",
        "security": [],
        "requestBody": body_ref("Credentials"),
        "responses": {
          "200": response_ref("Token"),
          "400": { "description": "Missing fields or bad credentials" }
        }
      }
    }),
  );
  paths.insert(
    "/admin/".into(),
    json!({
      "get": {
        "tags": ["admin"],
        "summary": "Record counts (administrators only)",
        "responses": { "200": response_ref("Summary"), "403": { "description": "Not an administrator" } }
      }
    }),
  );

  json!({
    "openapi": "3.0.3",
    "info": { "title": TITLE, "version": VERSION },
    "security": [{ "tokenAuth": [] }],
    "paths": paths,
    "components": {
      "securitySchemes": {
        "tokenAuth": {
          "type": "apiKey",
          "in": "header",
          "name": "Authorization",
          "description": "`Token <key>`, obtained from /api-token-auth/"
        }
      },
      "schemas": schemas()
    }
  })
}

fn entity_paths(tag: &str, schema: &str, filters: &[&str]) -> (Value, Value) {
  let mut parameters: Vec<Value> = filters
    .iter()
    .map(|name| json!({ "name": name, "in": "query", "required": false, "schema": { "type": "string" } }))
    .collect();
  parameters.push(json!({ "name": "search", "in": "query", "required": false, "schema": { "type": "string" } }));
  parameters.push(json!({ "name": "ordering", "in": "query", "required": false, "schema": { "type": "string" } }));

  let id = json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }]);
  let one = response_ref(schema);

  let collection = json!({
    "get": {
      "tags": [tag],
      "parameters": parameters,
      "responses": {
        "200": {
          "description": "OK",
          "content": { "application/json": { "schema": {
            "type": "array", "items": { "$ref": format!("#/components/schemas/{schema}") }
          } } }
        }
      }
    },
    "post": {
      "tags": [tag],
      "requestBody": body_ref(schema),
      "responses": { "201": one, "400": { "description": "Validation failed" } }
    }
  });
  let item = json!({
    "parameters": id,
    "get": { "tags": [tag], "responses": { "200": one, "404": { "description": "Not found" } } },
    "put": { "tags": [tag], "requestBody": body_ref(schema), "responses": { "200": one } },
    "patch": { "tags": [tag], "requestBody": body_ref(schema), "responses": { "200": one } },
    "delete": { "tags": [tag], "responses": { "204": { "description": "Deleted" } } }
  });
  (collection, item)
}

fn body_ref(schema: &str) -> Value {
  json!({
    "required": true,
    "content": { "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } } }
  })
}

fn response_ref(schema: &str) -> Value {
  json!({
    "description": "OK",
    "content": { "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } } }
  })
}

fn schemas() -> Value {
  let id = json!({ "type": "integer", "readOnly": true });
  json!({
    "Building": {
      "type": "object",
      "required": ["name", "address"],
      "properties": {
        "id": id,
        "name": { "type": "string", "maxLength": 100 },
        "address": { "type": "string" }
      }
    },
    "Room": {
      "type": "object",
      "required": ["building", "room_number", "capacity"],
      "properties": {
        "id": id,
        "building": { "type": "integer" },
        "room_number": { "type": "string", "maxLength": 10 },
        "capacity": { "type": "integer", "format": "int32" }
      }
    },
    "Resident": {
      "type": "object",
      "required": ["first_name", "last_name", "email", "check_in_date"],
      "properties": {
        "id": id,
        "first_name": { "type": "string", "maxLength": 50 },
        "last_name": { "type": "string", "maxLength": 50 },
        "email": { "type": "string", "format": "email" },
        "room": { "type": "integer", "nullable": true },
        "check_in_date": { "type": "string", "format": "date" },
        "check_out_date": { "type": "string", "format": "date", "nullable": true },
        "notes": { "type": "string", "nullable": true }
      }
    },
    "Credentials": {
      "type": "object",
      "required": ["username", "password"],
      "properties": { "username": { "type": "string" }, "password": { "type": "string" } }
    },
    "Token": {
      "type": "object",
      "properties": {
        "token": { "type": "string" },
        "user_id": { "type": "integer" },
        "username": { "type": "string" },
        "is_admin": { "type": "boolean" }
      }
    },
    "Summary": {
      "type": "object",
      "properties": {
        "buildings": { "type": "integer" },
        "rooms": { "type": "integer" },
        "residents": { "type": "integer" },
        "users": { "type": "integer" }
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn document_lists_every_route() {
    let doc = document();
    assert_eq!(doc["info"]["title"], TITLE);
    assert_eq!(doc["info"]["version"], VERSION);
    for path in [
      "/api/buildings/",
      "/api/buildings/{id}/",
      "/api/rooms/",
      "/api/rooms/{id}/",
      "/api/residents/",
      "/api/residents/{id}/",
      "/api-token-auth/",
      "/admin/",
    ] {
      assert!(doc["paths"].get(path).is_some(), "{path}");
    }
  }
}
