mod common;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, self_enroll_action, setup_server, setup_test_db,
    signin_action, signup_action,
};

fn create_content_action(
    name: &'static str,
    start: Option<chrono::DateTime<Utc>>,
    end: Option<chrono::DateTime<Utc>>,
) -> Action {
    Action::new("create_content", "POST", "/api/v1/contents/")
        .with_dyn_body(move |ctx| {
            json!({
                "course_id": ctx.id("course"),
                "name": name,
                "scheduled_start": start,
                "scheduled_end": end,
            })
        })
        .with_expect(StatusCode::CREATED)
        .with_save_as(name)
}

#[tokio::test]
async fn course_contents_follow_schedule() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let now = Utc::now();

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Scheduled", 10, "course"))
        .step(create_content_action("always", None, None))
        .step(create_content_action("started", Some(now - Duration::days(1)), None))
        .step(create_content_action("future", Some(now + Duration::days(1)), None))
        .step(create_content_action("expired", None, Some(now - Duration::days(1))))
        .step(create_content_action(
            "window",
            Some(now - Duration::hours(1)),
            Some(now + Duration::hours(1)),
        ))
        .step(
            Action::new("visible_contents", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/contents", ctx.id("course")))
                .assert_body(|body| {
                    let contents: Vec<Value> = serde_json::from_str(body).unwrap();
                    let names: Vec<&str> =
                        contents.iter().map(|c| c["name"].as_str().unwrap()).collect();
                    // unscheduled first, then by start
                    assert_eq!(names, ["always", "started", "window"]);
                }),
        )
        // the teacher still sees hidden items directly
        .step(
            Action::new("teacher_reads_future", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("future"))),
        )
        .step(signup_action("student", "student").with_save_as("student"))
        .step(
            Action::new("student_reads_future", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("future")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("student_reads_window", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("window"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn content_validation_and_hierarchy() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let now = Utc::now();

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Tree", 10, "course"))
        .step(create_content_action("root", None, None))
        .step(
            Action::new("inverted_window", "POST", "/api/v1/contents/")
                .with_dyn_body(move |ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "name": "broken",
                        "scheduled_start": now + Duration::days(2),
                        "scheduled_end": now + Duration::days(1),
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("child", "POST", "/api/v1/contents/")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "parent_id": ctx.id("root"),
                        "name": "child",
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("child"),
        )
        .step(
            Action::new("self_parent", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("root")))
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "parent_id": ctx.id("root"),
                        "name": "root",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("cycle", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("root")))
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "parent_id": ctx.id("child"),
                        "name": "root",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("grandchild", "POST", "/api/v1/contents/")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "parent_id": ctx.id("child"),
                        "name": "grandchild",
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("grandchild"),
        )
        // a deeper descendant is rejected as well
        .step(
            Action::new("deep_cycle", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("root")))
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "parent_id": ctx.id("grandchild"),
                        "name": "root",
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("descendant"))),
        )
        // moving a leaf under another branch is fine
        .step(
            Action::new("reparent_grandchild", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("grandchild")))
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "parent_id": ctx.id("root"),
                        "name": "grandchild",
                    })
                }),
        )
        .step(
            Action::new("delete_grandchild", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("grandchild"))),
        )
        .step(
            Action::new("delete_parent", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("root")))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("delete_child", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("child"))),
        )
        .step(
            Action::new("delete_parent_again", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("root"))),
        )
        .step(signup_action("stranger", "stranger").with_save_as("stranger"))
        .step(
            Action::new("stranger_adds_content", "POST", "/api/v1/contents/")
                .with_dyn_body(|ctx| json!({"course_id": ctx.id("course"), "name": "spam"}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn content_completes_once() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Finish me", 10, "course"))
        .step(create_content_action("lesson", None, None))
        .step(signup_action("student", "student").with_save_as("student"))
        .step(self_enroll_action("course", "student"))
        .step(
            Action::new("complete", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}/complete", ctx.id("lesson")))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("complete_again", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}/complete", ctx.id("lesson")))
                .with_expect(StatusCode::CONFLICT)
                .assert_body(|body| assert!(body.contains("already completed"))),
        )
        .step(
            Action::new("completions", "GET", "/api/v1/account/completions").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 1);
            }),
        )
        .step(
            Action::new("activity", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/account/{}/activity", ctx.id("student")))
                .assert_body(|body| {
                    let stats: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(stats["contents_completed"], 1);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn announcements_follow_window() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let now = Utc::now();

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("News", 10, "course"))
        .step(
            Action::new("current", "POST", "/api/v1/announcements/")
                .with_dyn_body(move |ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "title": "Exam moved",
                        "content": "to Friday",
                        "start_date": now - Duration::hours(1),
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("current")
                .assert_body(|body| assert!(body.contains("created_by"))),
        )
        .step(
            Action::new("upcoming", "POST", "/api/v1/announcements/")
                .with_dyn_body(move |ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "title": "Holidays",
                        "content": "no classes",
                        "start_date": now + Duration::days(3),
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("upcoming"),
        )
        .step(
            Action::new("visible_announcements", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/announcements", ctx.id("course")))
                .assert_body(|body| {
                    let items: Vec<Value> = serde_json::from_str(body).unwrap();
                    assert_eq!(items.len(), 1);
                    assert_eq!(items[0]["title"], "Exam moved");
                }),
        )
        .step(signup_action("outsider", "outsider").with_save_as("outsider"))
        .step(
            Action::new("outsider_announces", "POST", "/api/v1/announcements/")
                .with_dyn_body(|ctx| {
                    json!({"course_id": ctx.id("course"), "title": "spam", "content": "spam"})
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        // the global listing and direct reads hide what is not shown yet
        .step(
            Action::new("outsider_lists", "GET", "/api/v1/announcements/").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 1);
                assert_eq!(page["items"][0]["title"], "Exam moved");
            }),
        )
        .step(
            Action::new("outsider_reads_upcoming", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/announcements/{}", ctx.id("upcoming")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("outsider_reads_current", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/announcements/{}", ctx.id("current"))),
        )
        .step(signin_action("teacher", "teacher").with_clear_cookies(true))
        .step(
            Action::new("all_announcements", "GET", "/api/v1/announcements/").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 2);
            }),
        )
        .step(
            Action::new("teacher_reads_upcoming", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/announcements/{}", ctx.id("upcoming"))),
        )
        .step(
            Action::new("by_course", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/announcements/?course_id={}", ctx.id("course")))
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 2);
                }),
        )
        .step(
            Action::new("by_other_course", "GET", "dynamic")
                .with_dyn_path(|_| {
                    format!("/api/v1/announcements/?course_id={}", uuid::Uuid::new_v4())
                })
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 0);
                }),
        )
        .run(&mut server, pool)
        .await;
}
