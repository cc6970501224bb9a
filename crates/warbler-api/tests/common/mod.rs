//! Shared harness: an in-memory app plus request/response helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use axum_extra::extract::CookieJar;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use uuid::Uuid;

use warbler_api::auth::{AppState, AppStateInner};
use warbler_api::middleware::{SESSION_COOKIE, SessionConfig, SessionUser, start_session};
use warbler_db::{Database, Message, User};

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            session: SessionConfig {
                secret: "integration-test-secret".into(),
                lifetime: chrono::Duration::days(1),
                secure_cookies: false,
            },
        });
        let router = warbler_api::router(state.clone());
        Self { state, router }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Create an account directly in the database.
    pub fn user(&self, username: &str, email: &str, password: &str) -> Uuid {
        let uow = self.state.db.begin().unwrap();
        let mut user = User::signup(username, email, password, None).unwrap();
        let id = uow.save_user(&mut user).unwrap();
        uow.commit().unwrap();
        id
    }

    pub fn message(&self, user_id: Uuid, text: &str) -> Uuid {
        let uow = self.state.db.begin().unwrap();
        let id = uow.save_message(&mut Message::new(user_id, text)).unwrap();
        uow.commit().unwrap();
        id
    }

    /// A `Cookie` header value logging in as `user_id`.
    pub fn login_cookie(&self, user_id: Uuid) -> String {
        let username = {
            let uow = self.state.db.begin().unwrap();
            uow.find_user(user_id).unwrap().map(|u| u.username).unwrap_or_default()
        };
        let jar = start_session(
            CookieJar::new(),
            &self.state.session,
            &SessionUser {
                id: user_id,
                username,
            },
        )
        .unwrap();
        let token = jar.get(SESSION_COOKIE).unwrap().value().to_string();
        format!("{}={}", SESSION_COOKIE, token)
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

pub async fn json<T: DeserializeOwned>(resp: Response) -> T {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(resp: &Response) -> String {
    resp.headers()[header::LOCATION].to_str().unwrap().to_string()
}

/// `name=value` pairs from every `Set-Cookie` header.
pub fn set_cookies(resp: &Response) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect()
}

pub fn set_cookie(resp: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(resp).into_iter().find(|c| c.starts_with(&prefix))
}

/// Follow an unauthorized redirect and return the flashes shown on `/`.
pub async fn flashes_after(app: &TestApp, resp: Response) -> Vec<String> {
    assert_eq!(resp.status(), StatusCode::FOUND);
    let cookie = set_cookie(&resp, "flash").expect("flash cookie");
    let home = app.send(get(&location(&resp), Some(&cookie))).await;
    let body: warbler_types::api::HomeResponse = json(home).await;
    body.flashes
}
