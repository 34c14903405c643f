use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::access::ScopeKind;
use crate::features::favorites::{dtos as favorites_dtos, handlers as favorites_handlers};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Users
        users_handlers::get_me,
        // Identity sync (internal)
        users_handlers::upsert_user,
        users_handlers::add_org_membership,
        // Files
        files_handlers::issue_upload_url,
        files_handlers::create_file,
        files_handlers::list_files,
        files_handlers::trash_file,
        files_handlers::restore_file,
        files_handlers::get_download_url,
        // Favorites
        favorites_handlers::toggle_favorite,
        favorites_handlers::list_favorites,
    ),
    components(
        schemas(
            // Shared
            Meta,
            ScopeKind,
            // Users
            users_dtos::UserResponseDto,
            users_dtos::UpsertUserDto,
            users_dtos::AddOrgMembershipDto,
            ApiResponse<users_dtos::UserResponseDto>,
            // Files
            files_models::FileType,
            files_dtos::CreateFileDto,
            files_dtos::FileResponseDto,
            files_dtos::UploadUrlResponseDto,
            files_dtos::DownloadUrlResponseDto,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::UploadUrlResponseDto>,
            ApiResponse<files_dtos::DownloadUrlResponseDto>,
            // Favorites
            favorites_dtos::FavoriteResponseDto,
            favorites_dtos::ToggleFavoriteResponseDto,
            ApiResponse<Vec<favorites_dtos::FavoriteResponseDto>>,
            ApiResponse<favorites_dtos::ToggleFavoriteResponseDto>,
        )
    ),
    tags(
        (name = "users", description = "Current user"),
        (name = "identity-sync", description = "User and membership sync from the identity provider (basic auth)"),
        (name = "files", description = "File records and their lifecycle"),
        (name = "favorites", description = "Per-user favorite marks"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Stashbox API",
        version = "0.1.0",
        description = "File metadata and lifecycle API for Stashbox",
    )
)]
pub struct ApiDoc;

/// Adds the bearer JWT and internal basic-auth schemes to the OpenAPI spec
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
            components.add_security_scheme(
                "internal_basic",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
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
