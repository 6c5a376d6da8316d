use http::{Method, StatusCode};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use webtrie::{HttpServer, MiniJinjaEngine, RecordingSink, TemplateEngine, TemplateError};

mod common;
use common::trace::request;

fn template_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("layout.html"),
        "<title>{{ title }}</title>{% block body %}{% endblock %}",
    )
    .unwrap();
    fs::create_dir(dir.path().join("user")).unwrap();
    fs::write(
        dir.path().join("user/list.html"),
        "{% extends \"layout.html\" %}{% block body %}{% for u in users %}<li>{{ u }}</li>{% endfor %}{% endblock %}",
    )
    .unwrap();
    dir
}

#[test]
fn test_directory_engine_renders_nested_templates() {
    let dir = template_dir();
    let engine = MiniJinjaEngine::from_dir(dir.path());
    let out = engine
        .render("user/list.html", &json!({ "title": "Users", "users": ["a", "b"] }))
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<title>Users</title><li>a</li><li>b</li>"
    );
}

#[test]
fn test_directory_engine_missing_template() {
    let dir = template_dir();
    let engine = MiniJinjaEngine::from_dir(dir.path());
    let err = engine.render("nope.html", &json!({})).unwrap_err();
    assert!(matches!(err, TemplateError::NotFound { name } if name == "nope.html"));
}

#[test]
fn test_handler_renders_through_server_engine() {
    let dir = template_dir();
    let mut server = HttpServer::default();
    server.set_template_engine(Arc::new(MiniJinjaEngine::from_dir(dir.path())));
    server
        .get("/users", |ctx| {
            let users = ctx.query_values("u");
            ctx.render("user/list.html", &json!({ "title": "Team", "users": users }))
                .unwrap();
        })
        .unwrap();
    let service = server.into_service();

    let mut sink = RecordingSink::new();
    service.serve(request(Method::GET, "/users?u=gm&u=lis"), &mut sink);
    assert_eq!(sink.status(), Some(StatusCode::OK));
    assert_eq!(
        sink.body_string(),
        "<title>Team</title><li>gm</li><li>lis</li>"
    );
}
