use ferrous_host::{Context, HostError, Method, Request, Router};

fn noop(_: &mut Context) -> ferrous_host::HandlerResult<String> {
    Ok(String::new())
}

#[test]
fn test_duplicate_method_and_pattern_rejected() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/x/{id}", noop).unwrap();

    let err = router.add_route(Method::GET, "/x/{id}", noop).unwrap_err();
    match err {
        HostError::DuplicateRoute { method, pattern } => {
            assert_eq!(method, Method::GET);
            assert_eq!(pattern, "/x/{id}");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(router.len(), 1);
}

#[test]
fn test_same_pattern_different_methods() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/x/{id}", noop).unwrap();
    router.add_route(Method::POST, "/x/{id}", noop).unwrap();
    assert_eq!(router.len(), 2);
}

#[test]
fn test_different_parameter_names_are_distinct_patterns() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/x/{id}", noop).unwrap();
    router.add_route(Method::GET, "/x/{itemId}", noop).unwrap();
    assert_eq!(router.len(), 2);

    // First registered wins.
    let found = router.match_route(&Method::GET, "/x/5").unwrap();
    assert_eq!(found.route.pattern(), "/x/{id}");
}

#[test]
fn test_trailing_slash_duplicates_detected() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/items", noop).unwrap();
    assert!(matches!(
        router.add_route(Method::GET, "/items/", noop),
        Err(HostError::DuplicateRoute { .. })
    ));

    // Both spellings would serve the same paths, so only one is kept.
    router.add_route(Method::GET, "/x/{id}", noop).unwrap();
    assert!(matches!(
        router.add_route(Method::GET, "/x/{id}/", noop),
        Err(HostError::DuplicateRoute { pattern, .. }) if pattern == "/x/{id}"
    ));
    assert!(router.find_route(&Method::GET, "/x/5/").is_some());
    assert_eq!(router.len(), 2);
}

#[test]
fn test_uuid_constraint() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/x/{id:uuid}", noop).unwrap();

    let found = router
        .match_route(&Method::GET, "/x/550e8400-e29b-41d4-a716-446655440000")
        .unwrap();
    assert_eq!(found.params["id"], "550e8400-e29b-41d4-a716-446655440000");
    assert!(router.find_route(&Method::GET, "/x/not-a-uuid").is_none());
}

#[test]
fn test_constraint_falls_through_to_later_route() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/users/{id:int}", noop).unwrap();
    router.add_route(Method::GET, "/users/{name:alpha}", noop).unwrap();

    let by_id = router.match_route(&Method::GET, "/users/42").unwrap();
    assert_eq!(by_id.params["id"], "42");

    let by_name = router.match_route(&Method::GET, "/users/ada").unwrap();
    assert_eq!(by_name.params["name"], "ada");

    assert!(router.match_route(&Method::GET, "/users/ada42").is_none());
}

#[test]
fn test_multiple_parameters() {
    let mut router = Router::new();
    router
        .add_route(Method::GET, "/orgs/{org}/repos/{repo}/issues/{number:int}", noop)
        .unwrap();

    let found = router
        .match_route(&Method::GET, "/orgs/acme/repos/anvil/issues/7")
        .unwrap();
    assert_eq!(found.params.len(), 3);
    assert_eq!(found.params["org"], "acme");
    assert_eq!(found.params["repo"], "anvil");
    assert_eq!(found.params["number"], "7");
}

#[test]
fn test_parameters_do_not_span_segments() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/files/{name}", noop).unwrap();
    assert!(router.find_route(&Method::GET, "/files/a/b").is_none());
    assert!(router.find_route(&Method::GET, "/files/").is_none());
}

#[test]
fn test_head_has_no_implicit_get() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/ping", noop).unwrap();
    assert!(router.find_route(&Method::HEAD, "/ping").is_none());
    assert!(router.matches_any_method("/ping"));
}

#[test]
fn test_add_all_is_atomic() {
    use ferrous_host::{Route, RouteHandler};
    use std::sync::Arc;

    let handler: RouteHandler = Arc::new(noop);
    let mut router = Router::new();
    router.add_route(Method::GET, "/b", noop).unwrap();

    let batch = vec![
        Route::new(Method::GET, "/a", handler.clone()).unwrap(),
        Route::new(Method::GET, "/b", handler.clone()).unwrap(),
    ];
    assert!(router.add_all(batch).is_err());
    assert_eq!(router.len(), 1);

    let within_batch = vec![
        Route::new(Method::GET, "/c", handler.clone()).unwrap(),
        Route::new(Method::GET, "/c/", handler.clone()).unwrap(),
    ];
    assert!(router.add_all(within_batch).is_err());
    assert_eq!(router.len(), 1);
}

#[test]
fn test_invalid_pattern_reported() {
    let mut router = Router::new();
    assert!(matches!(
        router.add_route(Method::GET, "/x/{id:bogus}", noop),
        Err(HostError::InvalidPattern { .. })
    ));
    assert!(router.is_empty());
}

#[test]
fn test_handler_receives_extracted_params() {
    let mut router = Router::new();
    router
        .add_route(Method::GET, "/echo/{word}", |ctx| {
            Ok(ctx.param("word").unwrap_or_default().to_uppercase())
        })
        .unwrap();

    let mut ctx = Context::from_request(Request::get("/echo/hey?x=1"));
    let found = router.match_route(ctx.method(), ctx.path()).unwrap();
    // The router itself does not populate the context.
    assert!(ctx.param("word").is_none());
    assert_eq!(found.params["word"], "hey");
    assert_eq!((found.route.handler())(&mut ctx).unwrap(), "");
}
