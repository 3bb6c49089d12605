mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, self_enroll_action, setup_server, setup_test_db,
    signin_action, signup_action,
};

fn members_action(expected: usize) -> Action {
    Action::new("members", "GET", "dynamic")
        .with_dyn_path(|ctx| format!("/api/v1/courses/{}/members", ctx.id("course")))
        .assert_body(move |body| {
            let members: Vec<Value> = serde_json::from_str(body).unwrap();
            assert_eq!(members.len(), expected);
        })
}

#[tokio::test]
async fn enroll_twice_is_rejected() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Algebra", 30, "course"))
        .step(signup_action("alice", "alice").with_save_as("alice"))
        .step(self_enroll_action("course", "alice").assert_body(|body| {
            assert!(body.contains("\"role\":\"student\""));
        }))
        .step(
            self_enroll_action("course", "alice")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("Student is already enrolled in this course"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn enroll_stops_at_max_students() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Small class", 2, "course"))
        .step(signup_action("a", "a").with_save_as("a"))
        .step(self_enroll_action("course", "a"))
        .step(signup_action("b", "b").with_save_as("b"))
        .step(self_enroll_action("course", "b"))
        .step(signup_action("c", "c").with_save_as("c"))
        .step(
            self_enroll_action("course", "c")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("Course is full"))),
        )
        .step(
            Action::new("course_detail", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .assert_body(|body| {
                    let course: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(course["enrolled_count"], 2);
                    assert_eq!(course["is_full"], true);
                }),
        )
        .step(
            Action::new("course_analytics", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/analytics", ctx.id("course")))
                .assert_body(|body| {
                    let stats: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(stats["members_count"], 2);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn zero_capacity_course_rejects_everyone() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Closed", 0, "course"))
        .step(signup_action("a", "a").with_save_as("a"))
        .step(self_enroll_action("course", "a").with_expect(StatusCode::BAD_REQUEST))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn enroll_others_requires_ownership() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Geometry", 5, "course"))
        .step(signup_action("bob", "bob").with_save_cookies(false).with_save_as("bob"))
        .step(signup_action("mallory", "mallory").with_save_as("mallory"))
        .step(
            Action::new("enroll_someone_else", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| json!({"course_id": ctx.id("course"), "user_id": ctx.id("bob")}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("enroll_self_as_assistant", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "user_id": ctx.id("mallory"),
                        "role": "assistant",
                    })
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_action("teacher", "teacher").with_clear_cookies(true))
        .step(
            Action::new("teacher_enrolls_assistant", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "user_id": ctx.id("bob"),
                        "role": "assistant",
                    })
                })
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| assert!(body.contains("\"role\":\"assistant\""))),
        )
        .step(
            Action::new("enroll_missing_user", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| {
                    json!({"course_id": ctx.id("course"), "user_id": uuid::Uuid::new_v4()})
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("enroll_missing_course", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| {
                    json!({"course_id": uuid::Uuid::new_v4(), "user_id": ctx.id("bob")})
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(members_action(1))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn batch_enroll_is_all_or_nothing() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("u1", "u1").with_save_cookies(false).with_save_as("u1"))
        .step(signup_action("u2", "u2").with_save_cookies(false).with_save_as("u2"))
        .step(signup_action("u3", "u3").with_save_cookies(false).with_save_as("u3"))
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Pairs only", 2, "course"))
        .step(
            Action::new("batch_too_many", "POST", "/api/v1/courses/batch_enroll")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "user_ids": [ctx.id("u1"), ctx.id("u2"), ctx.id("u3")],
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("Not enough slots available for all students"));
                }),
        )
        .step(members_action(0))
        .step(
            Action::new("batch_empty", "POST", "/api/v1/courses/batch_enroll")
                .with_dyn_body(|ctx| json!({"course_id": ctx.id("course"), "user_ids": []}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("batch_fits", "POST", "/api/v1/courses/batch_enroll")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "user_ids": [ctx.id("u1"), ctx.id("u2")],
                    })
                })
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    let outcome: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(outcome["enrolled"].as_array().unwrap().len(), 2);
                    assert!(outcome["skipped"].as_array().unwrap().is_empty());
                }),
        )
        .step(members_action(2))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn batch_enroll_skips_existing_members() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("u1", "u1").with_save_cookies(false).with_save_as("u1"))
        .step(signup_action("u2", "u2").with_save_cookies(false).with_save_as("u2"))
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Trio", 3, "course"))
        .step(
            Action::new("batch_first", "POST", "/api/v1/courses/batch_enroll")
                .with_dyn_body(|ctx| json!({"course_id": ctx.id("course"), "user_ids": [ctx.id("u1")]}))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("batch_again", "POST", "/api/v1/courses/batch_enroll")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "user_ids": [ctx.id("u1"), ctx.id("u2"), ctx.id("u2")],
                    })
                })
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    let outcome: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(outcome["enrolled"].as_array().unwrap().len(), 1);
                    assert_eq!(outcome["skipped"].as_array().unwrap().len(), 1);
                }),
        )
        .step(members_action(2))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn batch_enroll_requires_ownership() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Owned", 5, "course"))
        .step(signup_action("student", "student").with_save_as("student"))
        .step(
            Action::new("batch_by_student", "POST", "/api/v1/courses/batch_enroll")
                .with_dyn_body(|ctx| {
                    json!({"course_id": ctx.id("course"), "user_ids": [ctx.id("student")]})
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}
