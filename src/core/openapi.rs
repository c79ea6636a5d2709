use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::todos::{dtos as todos_dtos, handlers as todos_handlers};
use crate::shared::types::{EmptyResponse, ErrorResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        todos_handlers::list_todos,
        todos_handlers::create_todo,
        todos_handlers::get_todo,
        todos_handlers::update_todo,
        todos_handlers::delete_todo,
        todos_handlers::create_attachment,
        todos_handlers::remove_attachment,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            EmptyResponse,
            // Todos
            todos_dtos::CreateTodoDto,
            todos_dtos::UpdateTodoDto,
            todos_dtos::TodoItemDto,
            todos_dtos::TodoResponseDto,
            todos_dtos::TodoListResponseDto,
            todos_dtos::UploadUrlResponseDto,
        )
    ),
    tags(
        (name = "todos", description = "Per-user to-do items and their attachments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Todos API",
        version = "0.1.0",
        description = "API documentation for the multi-user to-do service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_todo_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.contains(&&"/todos".to_string()));
        assert!(paths.contains(&&"/todos/{item_id}".to_string()));
        assert!(paths.contains(&&"/todos/{item_id}/attachment".to_string()));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }

    #[test]
    fn test_swagger_info_modifier_overrides_info() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "Custom docs".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("Custom docs"));
    }
}
