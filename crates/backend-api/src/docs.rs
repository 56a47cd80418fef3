use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Roster API", description = "Member management for student organizations"),
    paths(
        crate::routes::health::root,
        crate::routes::health::health_check,
        crate::routes::members::list_members,
        crate::routes::members::get_member,
        crate::routes::members::create_member,
        crate::routes::members::update_member,
        crate::routes::members::delete_member
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::members::MembersResponse,
            crate::routes::members::MemberResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Members", description = "Member record management")
    )
)]
pub struct ApiDoc;
