//! Tests for `error` module

use super::*;

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors: Vec<Error> = vec![
        Error::RestaurantNotFound(1),
        Error::ReviewNotFound(1),
        Error::NotReviewAuthor {
            review_id: 1,
            user_id: 2,
        },
        Error::backend("elasticsearch", "connection refused"),
        Error::MalformedState("bad token".into()),
        Error::InvalidArgument("size".into()),
        Error::Config("port".into()),
    ];

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    for code in &codes {
        assert!(code.starts_with("MATJIP-"), "Code {code} should start with MATJIP-");
    }
}

#[test]
fn test_error_display_includes_code() {
    let err = Error::RestaurantNotFound(42);
    let display = format!("{err}");
    assert!(display.contains("MATJIP-001"));
    assert!(display.contains("42"));
}

#[test]
fn test_only_backend_errors_are_transient() {
    assert!(Error::backend("postgres", "timeout").is_transient());
    assert!(!Error::MalformedState("x".into()).is_transient());
    assert!(!Error::RestaurantNotFound(1).is_transient());
}

#[test]
fn test_not_found_classification() {
    assert!(Error::RestaurantNotFound(1).is_not_found());
    assert!(Error::ReviewNotFound(1).is_not_found());
    assert!(!Error::InvalidArgument("page".into()).is_not_found());
}

#[test]
fn test_backend_error_names_backend() {
    let err = Error::backend("cache", "503 Service Unavailable");
    assert_eq!(
        err.to_string(),
        "[MATJIP-004] cache unavailable: 503 Service Unavailable"
    );
}

#[cfg(feature = "postgres")]
#[test]
fn test_sqlx_pool_timeout_is_transient() {
    let err: Error = sqlx::Error::PoolTimedOut.into();
    assert!(err.is_transient());
}
