use utoipa::{Modify, OpenApi};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    crate::web::middlewares::AUTH_TOKEN,
                    "JWT of the signed in user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "simplelms", description = "Courses, enrollment, scheduled content and moderated comments"),
    paths(
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::user::user_activity_handler,
        crate::web::routes::user::user_completions_handler,

        crate::web::routes::courses::course_list_handler,
        crate::web::routes::courses::course_create_handler,
        crate::web::routes::courses::course_get_handler,
        crate::web::routes::courses::course_update_handler,
        crate::web::routes::courses::course_delete_handler,
        crate::web::routes::courses::course_enroll_handler,
        crate::web::routes::courses::course_batch_enroll_handler,
        crate::web::routes::courses::course_members_handler,
        crate::web::routes::courses::course_leave_handler,
        crate::web::routes::courses::course_contents_handler,
        crate::web::routes::courses::course_announcements_handler,
        crate::web::routes::courses::course_analytics_handler,
        crate::web::routes::courses::course_image_handler,

        crate::web::routes::contents::content_create_handler,
        crate::web::routes::contents::content_get_handler,
        crate::web::routes::contents::content_update_handler,
        crate::web::routes::contents::content_delete_handler,
        crate::web::routes::contents::content_complete_handler,
        crate::web::routes::contents::content_attachment_handler,

        crate::web::routes::comments::comments_list_handler,
        crate::web::routes::comments::comments_pending_handler,
        crate::web::routes::comments::comment_create_handler,
        crate::web::routes::comments::comment_moderate_handler,

        crate::web::routes::categories::category_list_handler,
        crate::web::routes::categories::category_create_handler,
        crate::web::routes::categories::category_get_handler,
        crate::web::routes::categories::category_update_handler,
        crate::web::routes::categories::category_delete_handler,

        crate::web::routes::announcements::announcement_list_handler,
        crate::web::routes::announcements::announcement_create_handler,
        crate::web::routes::announcements::announcement_get_handler,
        crate::web::routes::announcements::announcement_update_handler,
        crate::web::routes::announcements::announcement_delete_handler,
    ),
    tags(
        (name = "account", description = "Registration, sign in and user activity"),
        (name = "courses", description = "Courses and enrollment"),
        (name = "contents", description = "Scheduled course contents"),
        (name = "comments", description = "Comments and moderation"),
        (name = "categories", description = "Course categories"),
        (name = "announcements", description = "Time-windowed course announcements"),
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_enrollment_and_cookie_auth() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/v1/courses/enroll"));
        assert!(doc.paths.paths.contains_key("/api/v1/comments/moderate/{content_id}/{comment_id}"));
        assert!(doc.paths.paths.contains_key("/api/v1/comments/pending/{content_id}"));
        let components = doc.components.expect("components are generated");
        assert!(components.security_schemes.contains_key("cookie"));
    }
}
