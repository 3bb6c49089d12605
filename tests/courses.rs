mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, self_enroll_action, setup_server, setup_test_db,
    signin_action, signup_action,
};

fn course_in_category(
    name: &'static str,
    description: &'static str,
    save_as: &'static str,
) -> Action {
    Action::new("create_course", "POST", "/api/v1/courses/")
        .with_dyn_body(move |ctx| {
            json!({
                "name": name,
                "description": description,
                "price": 0,
                "category_id": ctx.id("programming"),
            })
        })
        .with_expect(StatusCode::CREATED)
        .with_save_as(save_as)
}

fn plain_course(name: &'static str, description: &'static str) -> Action {
    Action::new("create_course", "POST", "/api/v1/courses/")
        .with_body(json!({ "name": name, "description": description, "price": 10 }))
        .with_expect(StatusCode::CREATED)
}

fn course_names(body: &str) -> Vec<String> {
    let page: Value = serde_json::from_str(body).unwrap();
    let mut names: Vec<String> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

fn search_action(q: &'static str, expected: &'static [&'static str]) -> Action {
    Action::new("search_courses", "GET", "/api/v1/courses/")
        .with_param("q", q)
        .assert_body(move |body| assert_eq!(course_names(body), expected))
}

#[tokio::test]
async fn course_listing_filters() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("alice", "alice").with_save_as("alice"))
        .step(
            Action::new("create_category", "POST", "/api/v1/categories/")
                .with_body(json!({"name": "Programming"}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("programming"),
        )
        .step(course_in_category("Rust basics", "first steps", "rust"))
        .step(course_in_category("Advanced Rust", "ownership deep dive", "advanced"))
        .step(plain_course("Cooking 101", "knife skills, 100% hands-on"))
        .step(signup_action("bob", "bob").with_save_as("bob"))
        .step(plain_course("Bread baking", "sourdough"))
        .step(
            Action::new("all_courses", "GET", "/api/v1/courses/").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 4);
            }),
        )
        // case-insensitive over name and description
        .step(search_action("rUsT", &["Advanced Rust", "Rust basics"]))
        .step(search_action("deep", &["Advanced Rust"]))
        // teacher username is searchable as well
        .step(search_action("bob", &["Bread baking"]))
        // wildcards in the query match literally
        .step(search_action("%", &["Cooking 101"]))
        .step(search_action("_", &[]))
        .step(
            Action::new("by_category", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/?category_id={}", ctx.id("programming")))
                .assert_body(|body| {
                    assert_eq!(course_names(body), ["Advanced Rust", "Rust basics"]);
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 2);
                }),
        )
        .step(
            Action::new("by_teacher", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/?teacher_id={}", ctx.id("bob")))
                .assert_body(|body| assert_eq!(course_names(body), ["Bread baking"])),
        )
        .step(
            Action::new("combined", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/?teacher_id={}&q=advanced", ctx.id("alice"))
                })
                .assert_body(|body| {
                    assert_eq!(course_names(body), ["Advanced Rust"]);
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 1);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn course_with_members_or_contents_cannot_be_deleted() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Chemistry", 10, "course"))
        .step(signup_action("student", "student").with_save_as("student"))
        .step(self_enroll_action("course", "student"))
        .step(signin_action("teacher", "teacher").with_clear_cookies(true))
        .step(
            Action::new("delete_with_members", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::CONFLICT)
                .assert_body(|body| assert!(body.contains("still has members"))),
        )
        .step(
            Action::new("remove_student", "DELETE", "dynamic").with_dyn_path(|ctx| {
                format!("/api/v1/courses/{}/members/{}", ctx.id("course"), ctx.id("student"))
            }),
        )
        .step(
            Action::new("add_content", "POST", "/api/v1/contents/")
                .with_dyn_body(|ctx| json!({"course_id": ctx.id("course"), "name": "Lab safety"}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("content"),
        )
        .step(
            Action::new("delete_with_contents", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("delete_content", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/contents/{}", ctx.id("content"))),
        )
        .step(
            Action::new("delete_empty_course", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course"))),
        )
        .step(
            Action::new("deleted_course", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn members_filter_by_role() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let members = |role: Option<&'static str>, expected: usize| {
        let action = Action::new("members", "GET", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/courses/{}/members", ctx.id("course")))
            .assert_body(move |body| {
                let members: Vec<Value> = serde_json::from_str(body).unwrap();
                assert_eq!(members.len(), expected);
                if let Some(role) = role {
                    assert!(members.iter().all(|m| m["role"] == role));
                }
            });
        match role {
            Some(role) => action.with_param("role", role),
            None => action,
        }
    };

    Flow::new()
        .step(signup_action("helper", "helper").with_save_as("helper"))
        .step(signup_action("student", "student").with_save_as("student"))
        .step(signup_action("teacher", "teacher").with_save_as("teacher"))
        .step(create_course_action("Biology", 10, "course"))
        .step(
            Action::new("enroll_student", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| json!({"course_id": ctx.id("course"), "user_id": ctx.id("student")}))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("enroll_assistant", "POST", "/api/v1/courses/enroll")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": ctx.id("course"),
                        "user_id": ctx.id("helper"),
                        "role": "assistant",
                    })
                })
                .with_expect(StatusCode::CREATED),
        )
        .step(members(None, 2))
        .step(members(Some("assistant"), 1))
        .step(members(Some("student"), 1))
        .run(&mut server, pool)
        .await;
}
