use cookie::Cookie;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::middleware::{AccessLogBuilder, MetricsMiddleware, RecoverBuilder, TracingMiddleware};
use crate::router::RouteError;
use crate::server::HttpServer;
use crate::template::MiniJinjaEngine;

/// Template rendered by `GET /login` when no template directory is given.
const LOGIN_TEMPLATE: &str = "<html><body><h1>Login</h1><p>{{ greeting }}</p></body></html>";

#[derive(Debug, Deserialize)]
struct LoginRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct LoginReply<'a> {
    name: &'a str,
    request_id: String,
}

/// The route table served by `webtrie serve`.
///
/// Layers, outermost first: recovery, access log, tracing span, metrics.
/// `/metrics` exposes the collector in Prometheus text format.
///
/// # Errors
///
/// A [`RouteError`] if the table conflicts, which would be a bug here.
pub fn demo_server(templates: Option<&Path>) -> Result<HttpServer, RouteError> {
    let metrics = Arc::new(MetricsMiddleware::new());
    let mut server = HttpServer::new(vec![
        RecoverBuilder::new().build(),
        AccessLogBuilder::new().build(),
        TracingMiddleware.build(),
        metrics.layer(),
    ]);

    let engine = match templates {
        Some(dir) => MiniJinjaEngine::from_dir(dir),
        None => {
            let mut engine = MiniJinjaEngine::new();
            if let Err(err) = engine.add_template("login.html", LOGIN_TEMPLATE) {
                warn!(error = %err, "Built-in login template rejected");
            }
            engine
        }
    };
    server.set_template_engine(Arc::new(engine));

    server
        .get("/usr/detail", |ctx| {
            ctx.resp_body = b"hello,/usr/detail".to_vec();
        })?
        .get("/usr/*", |ctx| {
            ctx.resp_body = b"hello,/usr/*".to_vec();
        })?
        .get("/usr/*/*", |ctx| {
            ctx.resp_body = b"hello,/usr/*/*".to_vec();
        })?
        .get("/usr/home/list", |ctx| {
            ctx.resp_body = b"hello,/usr/home/list".to_vec();
        })?
        .get("/*/detail", |ctx| {
            ctx.resp_body = b"hello,/*/detail".to_vec();
        })?
        .get("/usr/detail/:id", |ctx| {
            let id = ctx.path_value("id").into_string().unwrap_or_default();
            ctx.resp_body = format!("hello,/usr/detail/:id,id:{id}").into_bytes();
        })?
        .get("/gm/:id([0-9a-zA-Z]+)", |ctx| {
            let id = ctx.path_value("id").into_string().unwrap_or_default();
            ctx.resp_body = format!("hello,/gm/:id([0-9a-zA-Z]+),id:{id}").into_bytes();
        })?
        .post("/form", |ctx| {
            let name = ctx.form_value("name").into_string().unwrap_or_default();
            ctx.resp_body = format!("hello,form,name:{name}").into_bytes();
        })?
        .get("/login", |ctx| {
            let greeting = ctx
                .query_value("name")
                .into_string()
                .unwrap_or_else(|_| "guest".to_string());
            let data = serde_json::json!({ "greeting": format!("hello, {greeting}") });
            if let Err(err) = ctx.render("login.html", &data) {
                warn!(error = %err, "Login page render failed");
            }
        })?
        .post("/login", |ctx| {
            let login = match ctx.bind_json::<LoginRequest>() {
                Ok(login) => login,
                Err(err) => {
                    ctx.resp_status = Some(StatusCode::BAD_REQUEST);
                    ctx.resp_body = err.to_string().into_bytes();
                    return;
                }
            };
            let session = Cookie::build(("session", ctx.request_id().to_string()))
                .path("/")
                .http_only(true)
                .build();
            if let Err(err) = ctx.set_cookie(&session) {
                warn!(error = %err, "Session cookie rejected");
            }
            let reply = LoginReply {
                name: &login.name,
                request_id: ctx.request_id().to_string(),
            };
            if let Err(err) = ctx.resp_json_ok(&reply) {
                warn!(error = %err, "Login reply serialization failed");
            }
        })?
        .get("/panic", |_ctx| {
            std::panic::panic_any("demo handler panic");
        })?;

    let collector = Arc::clone(&metrics);
    server.get("/metrics", move |ctx| {
        ctx.resp_body = collector.render_prometheus().into_bytes();
        ctx.resp_headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        );
    })?;

    Ok(server)
}
