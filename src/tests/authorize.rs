use std::sync::Arc;

use chrono::Utc;

use crate::error::ErrorKind;
use crate::handlers::{AuthorizeHandler, AuthorizeOptions};
use crate::primitives::grant::{Token, User};
use crate::request::{Request, Response};
use crate::response_types::{Issued, Outcome};

use super::defaults::*;
use super::{example_client, owner, FixedOwner, ScopePolicy, TestModel};

struct AuthorizeSetup {
    model: Arc<TestModel>,
    options: AuthorizeOptions,
}

impl AuthorizeSetup {
    fn new() -> Self {
        AuthorizeSetup::with_model(TestModel {
            fixed_code: Some("12345"),
            ..TestModel::new()
        })
    }

    fn with_model(model: TestModel) -> Self {
        AuthorizeSetup {
            model: Arc::new(model),
            options: AuthorizeOptions::default(),
        }
    }

    fn handler(&self) -> AuthorizeHandler<TestModel> {
        AuthorizeHandler::with_authenticator(self.options, self.model.clone(), owner())
    }

    fn request() -> Request {
        Request::new().with_query(vec![
            ("client_id", EXAMPLE_CLIENT_ID),
            ("response_type", "code"),
            ("state", EXAMPLE_STATE),
        ])
    }

    /// The request is answered by redirecting to the client.
    fn assert_redirect(&self, request: Request) -> (Response, Outcome) {
        let mut response = Response::new();
        let outcome = smol::block_on(self.handler().handle(&request, &mut response))
            .expect("Expected a redirect");
        assert_eq!(response.status, 302);
        (response, outcome)
    }

    /// The request fails before any redirect is possible.
    fn assert_direct_error(&self, request: Request, kind: ErrorKind, message: &str) {
        let mut response = Response::new();
        let error = smol::block_on(self.handler().handle(&request, &mut response))
            .expect_err("Expected a direct error");
        assert_eq!(error.kind(), kind);
        assert_eq!(error.message(), message);
        assert_eq!(response.get("location"), None);
    }
}

#[test]
fn code_redirects_with_state() {
    let setup = AuthorizeSetup::new();
    let (response, outcome) = setup.assert_redirect(AuthorizeSetup::request());

    assert_eq!(
        response.get("location"),
        Some("http://example.com/cb?code=12345&state=foobar")
    );
    let code = match outcome {
        Ok(Issued::Code(code)) => code,
        other => panic!("Expected a code, got {:?}", other),
    };
    assert_eq!(code.authorization_code, "12345");
    assert_eq!(code.redirect_uri.as_deref(), Some(EXAMPLE_REDIRECT_URI));
    assert_eq!(code.user, User::new(EXAMPLE_OWNER_ID));
    assert!(setup.model.called("save_authorization_code"));
}

#[test]
fn code_lifetime_is_applied() {
    let setup = AuthorizeSetup::new();
    let before = Utc::now();
    let (_, outcome) = setup.assert_redirect(AuthorizeSetup::request());
    let after = Utc::now();

    let code = match outcome {
        Ok(Issued::Code(code)) => code,
        other => panic!("Expected a code, got {:?}", other),
    };
    assert!((code.expires_at - before).num_seconds() >= 300);
    assert!((code.expires_at - after).num_seconds() <= 300);
}

#[test]
fn failed_save_is_redirected_as_server_error() {
    let setup = AuthorizeSetup::with_model(TestModel {
        fixed_code: Some("12345"),
        fail_save_code: true,
        ..TestModel::new()
    });
    let (response, outcome) = setup.assert_redirect(AuthorizeSetup::request());

    assert_eq!(
        response.get("location"),
        Some("http://example.com/cb?error=server_error&error_description=Unhandled%20exception")
    );
    let error = outcome.expect_err("Expected a redirected error");
    assert_eq!(error.kind(), ErrorKind::ServerError);
    assert_eq!(error.message(), "Unhandled exception");
}

#[test]
fn denied_save_keeps_its_kind() {
    let setup = AuthorizeSetup::with_model(TestModel {
        fixed_code: Some("12345"),
        deny_save_code: Some("Cannot request this auth code"),
        ..TestModel::new()
    });
    let (response, outcome) = setup.assert_redirect(AuthorizeSetup::request());

    assert_eq!(
        response.get("location"),
        Some(
            "http://example.com/cb?error=access_denied\
             &error_description=Cannot%20request%20this%20auth%20code"
        )
    );
    let error = outcome.expect_err("Expected a redirected error");
    assert_eq!(error.kind(), ErrorKind::AccessDenied);
    assert_eq!(error.message(), "Cannot request this auth code");
}

#[test]
fn missing_state_is_redirected() {
    let setup = AuthorizeSetup::new();
    let request = Request::new().with_query(vec![
        ("client_id", EXAMPLE_CLIENT_ID),
        ("response_type", "code"),
    ]);
    let (response, outcome) = setup.assert_redirect(request);

    assert_eq!(
        response.get("location"),
        Some(
            "http://example.com/cb?error=invalid_request\
             &error_description=Missing%20parameter%3A%20%60state%60"
        )
    );
    assert_eq!(outcome.unwrap_err().kind(), ErrorKind::InvalidRequest);
}

#[test]
fn empty_state_allowed() {
    let mut setup = AuthorizeSetup::new();
    setup.options.allow_empty_state = true;
    let request = Request::new().with_query(vec![
        ("client_id", EXAMPLE_CLIENT_ID),
        ("response_type", "code"),
    ]);
    let (response, outcome) = setup.assert_redirect(request);

    assert_eq!(response.get("location"), Some("http://example.com/cb?code=12345"));
    assert!(outcome.is_ok());
}

#[test]
fn malformed_scope_is_redirected() {
    let setup = AuthorizeSetup::new();
    let request = AuthorizeSetup::request().with_body(vec![("scope", "foo\"bar")]);
    let (response, outcome) = setup.assert_redirect(request);

    let location = response.get("location").unwrap();
    assert!(location.starts_with("http://example.com/cb?error=invalid_scope&"));
    assert_eq!(outcome.unwrap_err().kind(), ErrorKind::InvalidScope);
    assert!(!setup.model.called("save_authorization_code"));
}

#[test]
fn rejected_scope_is_redirected() {
    let setup = AuthorizeSetup::with_model(TestModel {
        scope_policy: Some(ScopePolicy::Reject),
        ..TestModel::new()
    });
    let request = AuthorizeSetup::request().with_query(vec![
        ("client_id", EXAMPLE_CLIENT_ID),
        ("response_type", "code"),
        ("state", EXAMPLE_STATE),
        ("scope", "read"),
    ]);
    let (_, outcome) = setup.assert_redirect(request);

    let error = outcome.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidScope);
    assert_eq!(error.message(), "Invalid scope: Requested scope is invalid");
}

#[test]
fn denied_by_owner() {
    let setup = AuthorizeSetup::new();
    let request = Request::new().with_query(vec![
        ("allowed", "false"),
        ("client_id", EXAMPLE_CLIENT_ID),
        ("response_type", "code"),
        ("state", EXAMPLE_STATE),
    ]);
    setup.assert_direct_error(
        request,
        ErrorKind::AccessDenied,
        "Access denied: user denied access to application",
    );
    assert!(!setup.model.called("get_client"));
}

#[test]
fn client_errors_are_direct() {
    let setup = AuthorizeSetup::new();

    let request = Request::new().with_query(vec![("response_type", "code")]);
    setup.assert_direct_error(
        request,
        ErrorKind::InvalidRequest,
        "Missing parameter: `client_id`",
    );

    let request =
        Request::new().with_query(vec![("client_id", "unknown"), ("response_type", "code")]);
    setup.assert_direct_error(
        request,
        ErrorKind::InvalidClient,
        "Invalid client: client credentials are invalid",
    );

    let request = AuthorizeSetup::request().with_body(vec![("redirect_uri", "http://evil.com/cb")]);
    setup.assert_direct_error(
        request,
        ErrorKind::InvalidClient,
        "Invalid client: `redirect_uri` does not match client value",
    );

    let request = AuthorizeSetup::request().with_body(vec![("redirect_uri", "not a uri")]);
    setup.assert_direct_error(
        request,
        ErrorKind::InvalidRequest,
        "Invalid request: `redirect_uri` is not a valid URI",
    );
}

#[test]
fn malformed_registration() {
    let setup = AuthorizeSetup::new();
    let mut client = example_client(&[]);
    setup.model.store.register_client(client.clone());
    setup.assert_direct_error(
        AuthorizeSetup::request(),
        ErrorKind::InvalidClient,
        "Invalid client: missing client `grants`",
    );

    client.grants = vec!["authorization_code".into()];
    client.redirect_uris.clear();
    setup.model.store.register_client(client);
    setup.assert_direct_error(
        AuthorizeSetup::request(),
        ErrorKind::InvalidClient,
        "Invalid client: missing client `redirectUri`",
    );
}

#[test]
fn response_type_errors_are_direct() {
    let setup = AuthorizeSetup::new();

    let request = Request::new().with_query(vec![("client_id", EXAMPLE_CLIENT_ID)]);
    setup.assert_direct_error(
        request,
        ErrorKind::InvalidRequest,
        "Missing parameter: `response_type`",
    );

    let request = Request::new().with_query(vec![
        ("client_id", EXAMPLE_CLIENT_ID),
        ("response_type", "code token"),
    ]);
    setup.assert_direct_error(
        request,
        ErrorKind::InvalidRequest,
        "Invalid parameter: `response_type`",
    );

    let request = Request::new().with_query(vec![
        ("client_id", EXAMPLE_CLIENT_ID),
        ("response_type", "token"),
    ]);
    setup.assert_direct_error(
        request,
        ErrorKind::UnsupportedResponseType,
        "Unsupported response type: `response_type` is invalid",
    );
}

#[test]
fn unauthorized_client_never_saves() {
    let setup = AuthorizeSetup::new();
    setup.model.store.register_client(example_client(&["password"]));
    setup.assert_direct_error(
        AuthorizeSetup::request(),
        ErrorKind::UnauthorizedClient,
        "Unauthorized client: `grant_type` is invalid",
    );
    assert!(!setup.model.called("save_authorization_code"));
}

#[test]
fn authenticator_without_user() {
    let setup = AuthorizeSetup::new();
    let handler = AuthorizeHandler::with_authenticator(
        setup.options,
        setup.model.clone(),
        Arc::new(FixedOwner(None)),
    );
    let error = smol::block_on(handler.handle(&AuthorizeSetup::request(), &mut Response::new()))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ServerError);
    assert_eq!(
        error.message(),
        "Server error: `handle()` did not return a `user` object"
    );
}

#[test]
fn bearer_authenticated_owner() {
    let setup = AuthorizeSetup::new();
    let token = Token {
        access_token: "owner-token".into(),
        access_token_expires_at: None,
        refresh_token: None,
        refresh_token_expires_at: None,
        scope: None,
        grant: "password".into(),
        authorization_code: None,
        client: example_client(&["password"]),
        user: User::new("owner"),
    };
    smol::block_on(crate::model::TokenModel::save_token(
        &setup.model.store,
        token,
        &Request::post(),
    ))
    .unwrap();

    let handler = AuthorizeHandler::new(setup.options, setup.model.clone());
    let request = AuthorizeSetup::request().with_header("Authorization", "Bearer owner-token");
    let mut response = Response::new();
    let outcome = smol::block_on(handler.handle(&request, &mut response)).unwrap();
    match outcome {
        Ok(Issued::Code(code)) => assert_eq!(code.user, User::new("owner")),
        other => panic!("Expected a code, got {:?}", other),
    }

    let mut response = Response::new();
    let error = smol::block_on(handler.handle(&AuthorizeSetup::request(), &mut response))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnauthorizedRequest);
    assert_eq!(response.get("WWW-Authenticate"), Some("Bearer realm=\"Service\""));
}

#[test]
fn zero_code_lifetime_is_rejected() {
    let mut setup = AuthorizeSetup::new();
    setup.options.authorization_code_lifetime = 0;
    setup.assert_direct_error(
        AuthorizeSetup::request(),
        ErrorKind::InvalidArgument,
        "Missing parameter: `authorization_code_lifetime`",
    );
}
