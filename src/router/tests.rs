use super::{NodeKind, RouteError, Router};
use http::Method;

fn router_with(routes: &[(Method, &str, &'static str)]) -> Router<&'static str> {
    let mut router = Router::new();
    for (method, path, name) in routes {
        router
            .add_route(method.clone(), path, *name)
            .unwrap_or_else(|e| panic!("failed to register {method} {path}: {e}"));
    }
    router
}

fn assert_route(router: &Router<&'static str>, method: Method, path: &str, expected: &str) {
    match router.find_route(&method, path) {
        Some(matched) => assert_eq!(
            *matched.value, expected,
            "handler mismatch for {method} {path}"
        ),
        None => assert_eq!(expected, "<none>", "expected {method} {path} to match"),
    }
}

#[test]
fn test_static_routes_return_registered_value() {
    let router = router_with(&[
        (Method::GET, "/user/home", "user_home"),
        (Method::GET, "/", "root"),
        (Method::GET, "/user", "user"),
        (Method::GET, "/order/detail", "order_detail"),
        (Method::POST, "/order/create", "order_create"),
        (Method::POST, "login", "login"),
    ]);

    assert_route(&router, Method::GET, "/user/home", "user_home");
    assert_route(&router, Method::GET, "/", "root");
    assert_route(&router, Method::GET, "/user", "user");
    assert_route(&router, Method::GET, "/order/detail", "order_detail");
    assert_route(&router, Method::POST, "/order/create", "order_create");
    assert_route(&router, Method::POST, "/login", "login");
    assert_route(&router, Method::POST, "/user/home", "<none>");
    assert_route(&router, Method::DELETE, "/", "<none>");
}

#[test]
fn test_empty_segments_are_ignored() {
    let router = router_with(&[(Method::GET, "a//b", "ab")]);
    assert_route(&router, Method::GET, "/a/b", "ab");
    assert_route(&router, Method::GET, "/a//b/", "ab");
}

#[test]
fn test_intermediate_node_without_value_is_a_miss() {
    let router = router_with(&[(Method::GET, "/order/detail", "order_detail")]);
    assert_route(&router, Method::GET, "/order", "<none>");
}

#[test]
fn test_empty_path_is_rejected() {
    let mut router = Router::new();
    assert_eq!(router.add_route(Method::GET, "", "x"), Err(RouteError::EmptyPath));
    assert!(router.find_route(&Method::GET, "").is_none());
}

#[test]
fn test_duplicate_route_is_rejected() {
    let mut router = router_with(&[(Method::GET, "/user/home", "first")]);
    let err = router.add_route(Method::GET, "/user/home", "second").unwrap_err();
    assert_eq!(
        err,
        RouteError::Duplicate {
            method: Method::GET,
            path: "/user/home".to_string()
        }
    );
    assert_route(&router, Method::GET, "/user/home", "first");
    // Same path under another method is a different route.
    router.add_route(Method::POST, "/user/home", "post").unwrap();
}

#[test]
fn test_static_beats_wildcard() {
    let router = router_with(&[
        (Method::GET, "/order/detail", "static"),
        (Method::GET, "/order/*", "wildcard"),
    ]);
    assert_route(&router, Method::GET, "/order/detail", "static");
    assert_route(&router, Method::GET, "/order/other", "wildcard");
}

#[test]
fn test_static_beats_param() {
    let router = router_with(&[
        (Method::GET, "/user/detail", "static"),
        (Method::GET, "/user/:id", "param"),
    ]);
    assert_route(&router, Method::GET, "/user/detail", "static");
    assert_route(&router, Method::GET, "/user/42", "param");
}

#[test]
fn test_no_backtracking_through_middle_wildcard() {
    let router = router_with(&[(Method::GET, "/a/*/c", "wild")]);
    assert_route(&router, Method::GET, "/a/x/c", "wild");
    assert_route(&router, Method::GET, "/a/b1/b2/c", "<none>");
}

#[test]
fn test_no_backtracking_after_static_choice() {
    let router = router_with(&[
        (Method::GET, "/usr/home/list", "list"),
        (Method::GET, "/usr/*/*", "two_wild"),
    ]);
    // "home" commits to the static branch, which has no "lis" child.
    assert_route(&router, Method::GET, "/usr/home/lis", "<none>");
    assert_route(&router, Method::GET, "/usr/other/lis", "two_wild");
}

#[test]
fn test_trailing_wildcard_absorbs_remaining_segments() {
    let router = router_with(&[
        (Method::GET, "/usr/*", "usr_wild"),
        (Method::GET, "/usr/detail", "usr_detail"),
    ]);
    assert_route(&router, Method::GET, "/usr/home/list/extra", "usr_wild");
    assert_route(&router, Method::GET, "/usr/home", "usr_wild");
    assert_route(&router, Method::GET, "/usr/detail", "usr_detail");
    assert_route(&router, Method::GET, "/usr", "<none>");
}

#[test]
fn test_trailing_wildcard_with_deeper_routes_below() {
    let router = router_with(&[
        (Method::GET, "/a/*", "any"),
        (Method::GET, "/a/*/c", "wild_c"),
    ]);
    assert_route(&router, Method::GET, "/a/x/y/z", "any");
    assert_route(&router, Method::GET, "/a/x", "any");
    assert_route(&router, Method::GET, "/a/x/c", "wild_c");
    // Once the wildcard absorbs a segment, the rest of the path is its.
    assert_route(&router, Method::GET, "/a/x/y/c", "any");
}

#[test]
fn test_middle_wildcard_does_not_absorb() {
    let router = router_with(&[
        (Method::GET, "/a/*/*", "two"),
        (Method::GET, "/a/*/c", "wild_c"),
    ]);
    assert_route(&router, Method::GET, "/a/x/c", "wild_c");
    assert_route(&router, Method::GET, "/a/x/y", "two");
    assert_route(&router, Method::GET, "/a/x/y/z", "two");
}

#[test]
fn test_leading_wildcard() {
    let router = router_with(&[(Method::GET, "/*/detail", "wild_detail")]);
    assert_route(&router, Method::GET, "/anything/detail", "wild_detail");
    assert_route(&router, Method::GET, "/anything/else", "<none>");
}

#[test]
fn test_param_extraction() {
    let router = router_with(&[(Method::GET, "/usr/detail/:id", "detail")]);
    let matched = router.find_route(&Method::GET, "/usr/detail/77").unwrap();
    assert_eq!(*matched.value, "detail");
    assert_eq!(matched.matched_route, "/usr/detail/:id");
    assert_eq!(matched.get_path_param("id"), Some("77"));
    assert!(matches!(matched.kind, NodeKind::Param { .. }));
}

#[test]
fn test_regex_param_extraction() {
    let router = router_with(&[(Method::GET, "/gm/:id([0-9a-zA-Z]+)", "gm")]);
    let matched = router.find_route(&Method::GET, "/gm/abc123").unwrap();
    assert_eq!(matched.get_path_param("id"), Some("abc123"));
    assert_eq!(matched.matched_route, "/gm/:id([0-9a-zA-Z]+)");
    assert!(router.find_route(&Method::GET, "/gm/!!!").is_none());
}

#[test]
fn test_regex_matches_within_segment() {
    let router = router_with(&[(Method::GET, "/gm/:id([0-9]+)", "gm")]);
    let matched = router.find_route(&Method::GET, "/gm/12ab").unwrap();
    assert_eq!(matched.get_path_param("id"), Some("12ab"));
    assert_route(&router, Method::GET, "/gm/ab", "<none>");

    let anchored = router_with(&[(Method::GET, "/gm/:id(^[0-9]+$)", "anchored")]);
    assert_route(&anchored, Method::GET, "/gm/123", "anchored");
    assert_route(&anchored, Method::GET, "/gm/12ab", "<none>");
}

#[test]
fn test_repeated_param_name_last_wins() {
    let router = router_with(&[(Method::GET, "/user/:id/abc/:id", "nested")]);
    let matched = router.find_route(&Method::GET, "/user/123/abc/456").unwrap();
    assert_eq!(matched.get_path_param("id"), Some("456"));
    assert_eq!(matched.path_params.len(), 2);
    assert_eq!(matched.path_params_map().get("id").map(String::as_str), Some("456"));
}

#[test]
fn test_params_captured_along_path() {
    let router = router_with(&[(Method::GET, "/org/:org/team/:team", "team")]);
    let matched = router.find_route(&Method::GET, "/org/acme/team/core").unwrap();
    assert_eq!(matched.get_path_param("org"), Some("acme"));
    assert_eq!(matched.get_path_param("team"), Some("core"));
}

#[test]
fn test_param_then_wildcard_conflict() {
    let mut router = router_with(&[(Method::GET, "/user/:id", "param")]);
    let err = router.add_route(Method::GET, "/user/*", "wild").unwrap_err();
    assert!(matches!(
        err,
        RouteError::MixedDynamic {
            existing: "param",
            new: "wildcard",
            ..
        }
    ));
    // The failed registration leaves the param route intact.
    assert_route(&router, Method::GET, "/user/9", "param");
}

#[test]
fn test_wildcard_then_param_and_regex_conflict() {
    let mut router = router_with(&[(Method::GET, "/user/*", "wild")]);
    assert!(matches!(
        router.add_route(Method::GET, "/user/:id", "param"),
        Err(RouteError::MixedDynamic { existing: "wildcard", new: "param", .. })
    ));
    assert!(matches!(
        router.add_route(Method::GET, "/user/:id([0-9]+)", "regex"),
        Err(RouteError::MixedDynamic { existing: "wildcard", new: "regex", .. })
    ));
}

#[test]
fn test_param_and_regex_conflict() {
    let mut router = router_with(&[(Method::GET, "/user/:id", "param")]);
    assert!(matches!(
        router.add_route(Method::GET, "/user/:id([0-9]+)", "regex"),
        Err(RouteError::MixedDynamic { existing: "param", new: "regex", .. })
    ));

    let mut router = router_with(&[(Method::GET, "/user/:id([0-9]+)", "regex")]);
    assert!(matches!(
        router.add_route(Method::GET, "/user/:id", "param"),
        Err(RouteError::MixedDynamic { existing: "regex", new: "param", .. })
    ));
}

#[test]
fn test_same_param_name_is_shared() {
    let router = router_with(&[
        (Method::GET, "/user/:id", "user"),
        (Method::GET, "/user/:id/posts", "posts"),
    ]);
    assert_route(&router, Method::GET, "/user/1", "user");
    assert_route(&router, Method::GET, "/user/1/posts", "posts");
}

#[test]
fn test_different_param_name_conflicts() {
    let mut router = router_with(&[(Method::GET, "/user/:id", "id")]);
    let err = router.add_route(Method::GET, "/user/:name", "name").unwrap_err();
    assert_eq!(
        err,
        RouteError::ParamConflict {
            existing: ":id".to_string(),
            new: ":name".to_string()
        }
    );
}

#[test]
fn test_regex_must_match_name_and_pattern() {
    let mut router = router_with(&[(Method::GET, "/gm/:id([0-9]+)", "a")]);
    router.add_route(Method::GET, "/gm/:id([0-9]+)/x", "b").unwrap();
    assert!(matches!(
        router.add_route(Method::GET, "/gm/:id([a-z]+)/y", "c"),
        Err(RouteError::RegexConflict { .. })
    ));
    assert!(matches!(
        router.add_route(Method::GET, "/gm/:key([0-9]+)/z", "d"),
        Err(RouteError::RegexConflict { .. })
    ));
}

#[test]
fn test_invalid_regex_is_rejected() {
    let mut router: Router<&str> = Router::new();
    let err = router.add_route(Method::GET, "/gm/:id([0-9+)", "bad").unwrap_err();
    assert!(matches!(err, RouteError::InvalidRegex { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_empty_param_name_is_rejected() {
    let mut router: Router<&str> = Router::new();
    assert!(matches!(
        router.add_route(Method::GET, "/user/:", "bad"),
        Err(RouteError::EmptyParamName { .. })
    ));
}

#[test]
fn test_routes_listing() {
    let router = router_with(&[
        (Method::POST, "/form", "form"),
        (Method::GET, "/user/:id", "user"),
        (Method::GET, "/", "root"),
    ]);
    let routes = router.routes();
    assert_eq!(
        routes,
        vec![
            (Method::GET, "/".to_string()),
            (Method::GET, "/user/:id".to_string()),
            (Method::POST, "/form".to_string()),
        ]
    );
    assert_eq!(router.len(), 3);
    assert!(!router.is_empty());
    assert!(Router::<()>::new().is_empty());
}
