//! Password-reset flow: the three steps, their session state, and the
//! question-step bypass.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use breachlab::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let run_id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("breachlab-reset-test-{run_id}.db"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let state = breachlab::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    breachlab::api::router(state).await
}

fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|c| c.split(';').next())
        .map(ToString::to_string)
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, username: &str, password: &str, answer: &str) {
    let body = format!(
        "username={username}&password={password}&confirm_password={password}\
         &question=What%20was%20your%20first%20car%3F&answer={answer}"
    );
    let response = app
        .clone()
        .oneshot(form_request("/register", &body, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn login_status(app: &Router, username: &str, password: &str) -> StatusCode {
    let body = format!("username={username}&password={password}");
    app.clone()
        .oneshot(form_request("/login", &body, None))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_reset_unknown_username_is_distinguishable() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(form_request("/reset", "username=ghost", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_flow_with_security_question() {
    let app = spawn_app().await;
    register(&app, "carol", "OldPassword1", "tacos").await;

    let response = app
        .clone()
        .oneshot(form_request("/reset", "username=carol", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/reset/question");
    let cookie = session_cookie(&response).expect("reset init should set a session cookie");

    // The question page shows carol's question.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/reset/question")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["step"], "question");

    let response = app
        .clone()
        .oneshot(form_request("/reset/question", "answer=pizza", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(form_request("/reset/question", "answer=tacos", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/reset/password");

    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=NewPassword1&confirm_password=NewPassword1",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    assert_eq!(
        login_status(&app, "carol", "NewPassword1").await,
        StatusCode::OK
    );
    assert_eq!(
        login_status(&app, "carol", "OldPassword1").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_question_step_can_be_skipped() {
    let app = spawn_app().await;
    register(&app, "dana", "OldPassword1", "secret").await;

    let response = app
        .clone()
        .oneshot(form_request("/reset", "username=dana", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response).unwrap();

    // Straight to the password step, never touching the question: the
    // final step only checks that a flow is active.
    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=Bypassed1a&confirm_password=Bypassed1a",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    assert_eq!(
        login_status(&app, "dana", "Bypassed1a").await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_password_step_without_flow_redirects_and_mutates_nothing() {
    let app = spawn_app().await;
    register(&app, "erin", "OldPassword1", "secret").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=Hijacked1a&confirm_password=Hijacked1a",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/reset");

    assert_eq!(
        login_status(&app, "erin", "OldPassword1").await,
        StatusCode::OK
    );
    assert_eq!(
        login_status(&app, "erin", "Hijacked1a").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_completed_flow_cannot_be_replayed() {
    let app = spawn_app().await;
    register(&app, "finn", "OldPassword1", "secret").await;

    let response = app
        .clone()
        .oneshot(form_request("/reset", "username=finn", None))
        .await
        .unwrap();
    let cookie = session_cookie(&response).unwrap();

    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=FirstNew1a&confirm_password=FirstNew1a",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    // Same session, second submit: the flow was consumed.
    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=SecondNew1a&confirm_password=SecondNew1a",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/reset");

    assert_eq!(
        login_status(&app, "finn", "FirstNew1a").await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_password_rules_checked_before_consuming_flow() {
    let app = spawn_app().await;
    register(&app, "gale", "OldPassword1", "secret").await;

    let response = app
        .clone()
        .oneshot(form_request("/reset", "username=gale", None))
        .await
        .unwrap();
    let cookie = session_cookie(&response).unwrap();

    // A rejected password leaves the flow active.
    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=weak&confirm_password=weak",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(form_request(
            "/reset/password",
            "password=StillGood1&confirm_password=StillGood1",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}
