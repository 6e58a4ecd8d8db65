use notes_portal::routing::{RouteClass, classify, is_excluded_path};

#[test]
fn test_classify_auth_routes() {
    assert_eq!(classify("/login"), RouteClass::AuthRoute);
    assert_eq!(classify("/sign-up"), RouteClass::AuthRoute);
    assert!(classify("/login").is_auth_route());
}

#[test]
fn test_classify_is_exact_match() {
    assert_eq!(classify("/"), RouteClass::Home);
    assert_eq!(classify("/login/"), RouteClass::Other);
    assert_eq!(classify("/sign-up/confirm"), RouteClass::Other);
    assert_eq!(classify("/LOGIN"), RouteClass::Other);
    assert_eq!(classify(""), RouteClass::Other);
}

#[test]
fn test_static_assets_are_excluded() {
    for path in [
        "/_next/static/chunks/app.js",
        "/_next/image",
        "/static/app.css",
        "/favicon.ico",
        "/logo.svg",
        "/images/photo.jpeg",
        "/a/b/c.webp",
    ] {
        assert!(is_excluded_path(path), "{path} should bypass the middleware");
    }
}

#[test]
fn test_pages_and_api_are_matched() {
    for path in ["/", "/login", "/sign-up", "/api/fetch-newest-note", "/notes.v2/edit", "/file.pngx"] {
        assert!(!is_excluded_path(path), "{path} should run the middleware");
    }
}
