use utoipa::{Modify, OpenApi};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme("cookie", SecurityScheme::ApiKey(
                    ApiKey::Cookie(ApiKeyValue::with_description(AUTH_TOKEN, "JWT token for current user"))
            ));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::registration_handler,
        crate::web::routes::account::login_handler,
        crate::web::routes::account::logout_handler,
        crate::web::routes::courses::course_list_handler,
        crate::web::routes::courses::course_detail_handler,
        crate::web::routes::courses::course_enroll_handler,
        crate::web::routes::exam::exam_submit_handler,
        crate::web::routes::exam::exam_result_handler,
        crate::web::routes::admin::course_list_handler,
        crate::web::routes::admin::course_create_handler,
        crate::web::routes::admin::course_get_handler,
        crate::web::routes::admin::course_update_handler,
        crate::web::routes::admin::course_delete_handler,
        crate::web::routes::admin::course_add_lesson_handler,
        crate::web::routes::admin::course_add_question_handler,
        crate::web::routes::admin::question_add_choice_handler,
        crate::web::routes::admin::course_attach_instructor_handler,
        crate::web::routes::admin::course_detach_instructor_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Registration and sessions"),
        (name = "courses", description = "Course catalogue and enrollment"),
        (name = "exam", description = "Exam attempts and their scores"),
        (name = "admin", description = "Course authoring, admin role only"),
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_learner_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/registration/", "/{course_id}/enroll/", "/{course_id}/submit/", "/admin/courses"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
