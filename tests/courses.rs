mod common;
use axum::http::StatusCode;
use onlinecourse::model::entity::{
    Course, CourseCreate, Enrollment, EnrollmentMode, UserEntity, UserEntityCreateUpdate,
};
use onlinecourse::model::{CrudRepository, DbConnection, ModelManager};
use onlinecourse::web::{AuthenticatedUser, UserRole};
use serde_json::Value;
use tokio::task::JoinSet;

use crate::common::{
    Action, Flow, add_question_action, create_course_action, enroll_action, login_admin_action,
    registration_action, setup_server, setup_test_db,
};

fn course_detail_action(course_key: &'static str) -> Action {
    Action::new("course_detail", "GET", "")
        .with_dyn_path(move |ctx| format!("/{}/", ctx.field(course_key, "id")))
}

#[tokio::test]
async fn enroll_once_bumps_counter_and_repeat_is_noop() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_course_action("course", "Cloud Native", None))
        .step(registration_action("learner", "learner").with_clear_cookies(true))
        .step(
            course_detail_action("course").assert_json(|body, _| {
                assert_eq!(body["is_enrolled"], false);
                assert_eq!(body["course"]["total_enrollment"], 0);
            }),
        )
        .step(enroll_action("course").assert_location(|location, ctx| {
            assert_eq!(location, format!("/{}/", ctx.field("course", "id")));
        }))
        .step(
            course_detail_action("course").assert_json(|body, _| {
                assert_eq!(body["is_enrolled"], true);
                assert_eq!(body["course"]["total_enrollment"], 1);
            }),
        )
        // second enrollment changes nothing
        .step(enroll_action("course"))
        .step(
            course_detail_action("course").assert_json(|body, _| {
                assert_eq!(body["is_enrolled"], true);
                assert_eq!(body["course"]["total_enrollment"], 1);
            }),
        )
        .step(login_admin_action())
        .step(
            Action::new("list_enrollments", "GET", "/admin/enrollments").assert_json(|body, ctx| {
                assert_eq!(body["total"], 1);
                let enrollment = &body["items"][0];
                assert_eq!(enrollment["mode"], "honor");
                assert_eq!(enrollment["rating"], 5.0);
                assert_eq!(enrollment["course_id"].as_str(), Some(ctx.field("course", "id").as_str()));
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn anonymous_enroll_redirects_without_enrolling() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_course_action("course", "Databases", None))
        .step(
            enroll_action("course")
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .assert_location(|location, ctx| {
                    assert_eq!(location, format!("/{}/", ctx.field("course", "id")));
                }),
        )
        .step(
            course_detail_action("course").assert_json(|body, _| {
                assert_eq!(body["is_enrolled"], false);
                assert_eq!(body["course"]["total_enrollment"], 0);
            }),
        )
        .step(
            Action::new("enroll_unknown", "GET", "/00000000-0000-4000-8000-000000000000/enroll/")
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn landing_orders_by_popularity() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_course_action("quiet", "Quiet Course", None))
        .step(create_course_action("popular", "Popular Course", None))
        .step(registration_action("first", "first").with_clear_cookies(true))
        .step(enroll_action("popular"))
        .step(registration_action("second", "second").with_clear_cookies(true))
        .step(enroll_action("popular"))
        .step(
            Action::new("landing", "GET", "/").assert_json(|body, ctx| {
                let courses = body.as_array().expect("course list");
                assert_eq!(courses.len(), 2);
                assert_eq!(courses[0]["id"].as_str(), Some(ctx.field("popular", "id").as_str()));
                assert_eq!(courses[0]["total_enrollment"], 2);
                assert_eq!(courses[0]["is_enrolled"], true);
                assert_eq!(courses[1]["is_enrolled"], false);
            }),
        )
        .step(
            Action::new("landing_anonymous", "GET", "/")
                .with_clear_cookies(true)
                .assert_json(|body, _| {
                    let courses = body.as_array().expect("course list");
                    assert!(courses.iter().all(|c| c["is_enrolled"] == false));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn course_detail_hides_correct_answers() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_course_action("course", "Rust 101", Some("2024-05-01")))
        .step(
            Action::new("add_lesson", "POST", "")
                .with_dyn_path(|ctx| format!("/admin/courses/{}/lessons", ctx.field("course", "id")))
                .with_body(serde_json::json!({ "title": "Second", "content": "more", "order_index": 2 }))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("add_lesson", "POST", "")
                .with_dyn_path(|ctx| format!("/admin/courses/{}/lessons", ctx.field("course", "id")))
                .with_body(serde_json::json!({ "title": "First", "content": "intro", "order_index": 1 }))
                .with_expect(StatusCode::CREATED),
        )
        .step(add_question_action(
            "course",
            "question",
            "Which keyword declares a binding?",
            2,
            &[("let", true), ("var", false)],
        ))
        .step(
            course_detail_action("course")
                .with_clear_cookies(true)
                .assert_json(|body, ctx| {
                    let lessons: Vec<&str> = body["lessons"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|l| l["title"].as_str().unwrap())
                        .collect();
                    assert_eq!(lessons, vec!["First", "Second"]);

                    let question = &body["questions"][0];
                    let question_id = ctx.get("question")["question"]["id"].as_str().unwrap();
                    assert_eq!(question["field_name"], format!("choice_{question_id}"));
                    assert_eq!(question["grade_point"], 2);

                    let choices = question["choices"].as_array().unwrap();
                    assert_eq!(choices.len(), 2);
                    assert!(choices.iter().all(|c| c.get("is_correct").is_none()));
                    assert_eq!(body["is_enrolled"], Value::Bool(false));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enrolls_insert_one_row() {
    const ATTEMPTS: usize = 16;

    let db = setup_test_db().await;
    let mm = ModelManager::new(DbConnection::from_pool(db.pool().clone()));
    let system = AuthenticatedUser::admin();

    let user = UserEntity::create_with_role(
        &mm,
        &system,
        UserEntityCreateUpdate {
            username: "racer".to_string(),
            password_hash: "unused".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        },
        UserRole::User,
    )
    .await
    .unwrap();
    let course = Course::create(
        &mm,
        &system,
        CourseCreate {
            name: "Distributed Systems".to_string(),
            image: String::new(),
            description: String::new(),
            pub_date: None,
        },
    )
    .await
    .unwrap();

    let mut attempts = JoinSet::new();
    for _ in 0..ATTEMPTS {
        let mm = mm.clone();
        let system = system.clone();
        let (user_id, course_id) = (user.id(), course.id());
        attempts.spawn(async move {
            Enrollment::enroll(&mm, &system, user_id, course_id, EnrollmentMode::Honor, None).await
        });
    }

    let mut created = 0;
    let mut enrollment_ids = Vec::new();
    while let Some(joined) = attempts.join_next().await {
        let (enrollment, was_created) = joined.unwrap().unwrap();
        if was_created {
            created += 1;
        }
        enrollment_ids.push(enrollment.id());
    }

    assert_eq!(created, 1);
    assert_eq!(enrollment_ids.len(), ATTEMPTS);
    assert!(enrollment_ids.iter().all(|id| *id == enrollment_ids[0]));

    let rows = Enrollment::count_by_course(&mm, &system, course.id()).await.unwrap();
    let course = Course::find_by_id(&mm, &system, course.id()).await.unwrap().unwrap();
    assert_eq!(rows, 1);
    assert_eq!(i64::from(course.total_enrollment()), rows);
}
