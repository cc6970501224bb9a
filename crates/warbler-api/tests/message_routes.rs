mod common;

use axum::http::StatusCode;
use common::{TestApp, flashes_after, get, json, location, post};
use warbler_types::api::MessageView;

const LOREM: &str = "Lorem ipsum dolor sit amet consectetur adipisicing elit. Quibusdam, sed odio.";

#[tokio::test]
async fn add_message_as_session_user() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let cookie = app.login_cookie(user);

    let resp = app.send(post("/messages/new", Some(&cookie), "text=Hello")).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/users/{user}"));

    let uow = app.state.db.begin().unwrap();
    let owned = uow.messages_by_user(user).unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].text, "Hello");
}

#[tokio::test]
async fn add_message_without_session_is_unauthorized() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");

    let resp = app.send(post("/messages/new", None, "text=Hello")).await;
    assert_eq!(flashes_after(&app, resp).await, ["Access unauthorized."]);

    let uow = app.state.db.begin().unwrap();
    assert_eq!(uow.message_count(user).unwrap(), 0);
}

#[tokio::test]
async fn overlong_message_is_a_bad_request() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let cookie = app.login_cookie(user);

    let text = "a".repeat(141);
    let resp = app
        .send(post("/messages/new", Some(&cookie), &format!("text={text}")))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn show_message() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let message = app.message(user, LOREM);

    let resp = app.send(get(&format!("/messages/{message}"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: MessageView = json(resp).await;
    assert_eq!(view.text, LOREM);
    assert_eq!(view.author.username, "testuser");
}

#[tokio::test]
async fn show_unknown_message_is_not_found() {
    let app = TestApp::new();
    let resp = app
        .send(get(&format!("/messages/{}", uuid::Uuid::new_v4()), None))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_own_message() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let message = app.message(user, LOREM);
    let cookie = app.login_cookie(user);

    let resp = app
        .send(post(&format!("/messages/{message}/delete"), Some(&cookie), ""))
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/users/{user}"));

    let uow = app.state.db.begin().unwrap();
    assert_eq!(uow.message_count(user).unwrap(), 0);
}

#[tokio::test]
async fn delete_message_without_session_is_unauthorized() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let message = app.message(user, LOREM);

    let resp = app
        .send(post(&format!("/messages/{message}/delete"), None, ""))
        .await;
    assert_eq!(flashes_after(&app, resp).await, ["Access unauthorized."]);

    let uow = app.state.db.begin().unwrap();
    assert!(uow.find_message(message).unwrap().is_some());
}

#[tokio::test]
async fn delete_someone_elses_message_is_unauthorized() {
    let app = TestApp::new();
    let owner = app.user("testuser", "test@test.com", "testuser");
    let intruder = app.user("intruder", "intruder@test.com", "intruder");
    let message = app.message(owner, LOREM);
    let cookie = app.login_cookie(intruder);

    let resp = app
        .send(post(&format!("/messages/{message}/delete"), Some(&cookie), ""))
        .await;
    assert_eq!(flashes_after(&app, resp).await, ["Access unauthorized."]);

    let uow = app.state.db.begin().unwrap();
    assert!(uow.find_message(message).unwrap().is_some());
}

#[tokio::test]
async fn delete_unknown_message_is_not_found() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let cookie = app.login_cookie(user);

    let resp = app
        .send(post(
            &format!("/messages/{}/delete", uuid::Uuid::new_v4()),
            Some(&cookie),
            "",
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_of_deleted_user_is_unauthorized() {
    let app = TestApp::new();
    let user = app.user("testuser", "test@test.com", "testuser");
    let cookie = app.login_cookie(user);
    {
        let uow = app.state.db.begin().unwrap();
        uow.delete_user(user).unwrap();
        uow.commit().unwrap();
    }

    let resp = app.send(post("/messages/new", Some(&cookie), "text=Hello")).await;
    assert_eq!(flashes_after(&app, resp).await, ["Access unauthorized."]);
}
