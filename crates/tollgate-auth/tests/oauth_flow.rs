//! End-to-end authorization flows against the in-memory backends.

use std::sync::Arc;

use tollgate_auth::prelude::*;

fn stack() -> (AuthorizationEndpoint, TokenEndpoint, BearerVerifier) {
    let registry = MemoryClientRegistry::new();
    registry.register(Client {
        client_id: "abc".to_string(),
        client_secret: None,
        client_type: ClientType::Public,
        redirect_uris: vec!["https://app.example/cb".to_string()],
        allowed_grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
        allowed_response_types: vec![ResponseType::Code, ResponseType::Token],
    });
    registry.register(Client {
        client_id: "intruder".to_string(),
        client_secret: None,
        client_type: ClientType::Public,
        redirect_uris: vec!["https://intruder.example/cb".to_string()],
        allowed_grant_types: vec![GrantType::AuthorizationCode],
        allowed_response_types: vec![ResponseType::Code],
    });
    let registry = Arc::new(registry);

    let config = AuthServerConfig::default();
    let tokens = Arc::new(MemoryTokenStore::with_token_lifetime(
        std::time::Duration::from_secs(3600),
    ));
    let sessions = Arc::new(SessionRegistry::new(config.session_timeout()));

    let authorize = AuthorizationEndpoint::new(sessions, tokens.clone(), registry.clone());
    let token = TokenEndpoint::new(&config, tokens.clone(), registry, None);
    let verifier = BearerVerifier::new(tokens, config.bearer.clone());
    (authorize, token, verifier)
}

fn authorization_request(response_type: &str, scope: &str, state: Option<&str>) -> AuthorizationRequest {
    AuthorizationRequest {
        response_type: Some(response_type.to_string()),
        client_id: Some("abc".to_string()),
        redirect_uri: None,
        scope: Some(scope.to_string()),
        state: state.map(str::to_string),
    }
}

/// Runs authorize-login-consent and returns the final redirect URI.
async fn run_flow(
    endpoint: &AuthorizationEndpoint,
    request: &AuthorizationRequest,
    decision: ConsentDecision,
) -> String {
    let AuthorizeOutcome::LoginRequired { session_id } =
        endpoint.authorize(request, None, None).await
    else {
        panic!("expected login prompt");
    };

    let outcome = endpoint
        .authorize(&AuthorizationRequest::default(), Some(session_id), Some("alice"))
        .await;
    let AuthorizeOutcome::ConsentRequired { session_id, .. } = outcome else {
        panic!("expected consent prompt, got {outcome:?}");
    };

    let AuthorizeOutcome::Redirect(uri) = endpoint.decide(session_id, decision).await else {
        panic!("expected final redirect");
    };
    uri
}

fn query_param(uri: &str, name: &str) -> Option<String> {
    url::Url::parse(uri)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.to_string())
}

#[tokio::test]
async fn code_flow_with_full_grant() {
    let (authorize, token, verifier) = stack();

    let uri = run_flow(
        &authorize,
        &authorization_request("code", "read write", None),
        ConsentDecision::Accept {
            granted_scope: ScopeSet::parse("read write"),
        },
    )
    .await;
    assert!(uri.starts_with("https://app.example/cb?code="));
    // Scope is only surfaced at token exchange, never on the code redirect.
    assert!(!uri.contains("scope="));
    let code = query_param(&uri, "code").unwrap();

    let reply = token
        .handle(
            &TokenRequest {
                grant_type: Some("authorization_code".to_string()),
                client_id: Some("abc".to_string()),
                code: Some(code),
                ..TokenRequest::default()
            },
            None,
        )
        .await;
    assert_eq!(reply.status, 200);
    assert!(
        reply
            .headers
            .iter()
            .any(|(name, value)| *name == "Cache-Control" && value == "no-store")
    );
    assert!(
        reply
            .headers
            .iter()
            .any(|(name, value)| *name == "Pragma" && value == "no-cache")
    );

    let body: TokenResponse = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(body.token_type, "bearer");
    assert_eq!(body.expires_in, Some(3600));
    // granted == requested: scope omitted.
    assert!(body.scope.is_none());

    // The minted token works against a protected resource.
    let header = format!("Bearer {}", body.access_token);
    let Verification::Valid { subject, scope } = verifier.verify(Some(&header), None, None).await
    else {
        panic!("expected valid token");
    };
    assert_eq!(subject, "alice");
    assert!(scope.is_identical(&ScopeSet::parse("read write")));
}

#[tokio::test]
async fn code_flow_with_narrowed_grant() {
    let (authorize, token, _) = stack();

    let uri = run_flow(
        &authorize,
        &authorization_request("code", "read write", None),
        ConsentDecision::Accept {
            granted_scope: ScopeSet::parse("read"),
        },
    )
    .await;
    assert!(!uri.contains("scope="));
    let code = query_param(&uri, "code").unwrap();

    let reply = token
        .handle(
            &TokenRequest {
                grant_type: Some("authorization_code".to_string()),
                client_id: Some("abc".to_string()),
                code: Some(code),
                ..TokenRequest::default()
            },
            None,
        )
        .await;
    assert_eq!(reply.status, 200);
    // Narrower than requested: scope must be echoed.
    assert!(reply.body.contains(r#""scope":"read""#));
}

#[tokio::test]
async fn rejection_redirects_per_flow() {
    let (authorize, _, _) = stack();

    let uri = run_flow(
        &authorize,
        &authorization_request("code", "read", Some("s1")),
        ConsentDecision::Reject,
    )
    .await;
    assert!(uri.starts_with("https://app.example/cb?error=access_denied"));
    assert_eq!(query_param(&uri, "state").as_deref(), Some("s1"));

    let uri = run_flow(
        &authorize,
        &authorization_request("token", "read", Some("s2")),
        ConsentDecision::Reject,
    )
    .await;
    assert!(uri.starts_with("https://app.example/cb#error=access_denied"));
    assert!(uri.contains("state=s2"));
}

#[tokio::test]
async fn implicit_flow_places_token_in_fragment() {
    let (authorize, _, verifier) = stack();

    let uri = run_flow(
        &authorize,
        &authorization_request("token", "read", Some("s3")),
        ConsentDecision::Accept {
            granted_scope: ScopeSet::parse("read"),
        },
    )
    .await;

    let url = url::Url::parse(&uri).unwrap();
    assert!(url.query().is_none());
    let fragment = url.fragment().unwrap();
    let params: Vec<(String, String)> = url::form_urlencoded::parse(fragment.as_bytes())
        .into_owned()
        .collect();

    let get = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(get("token_type").as_deref(), Some("bearer"));
    assert_eq!(get("expires_in").as_deref(), Some("3600"));
    assert_eq!(get("state").as_deref(), Some("s3"));
    assert!(get("scope").is_none());

    let header = format!("Bearer {}", get("access_token").unwrap());
    assert!(matches!(
        verifier.verify(Some(&header), None, None).await,
        Verification::Valid { .. }
    ));
}

#[tokio::test]
async fn implicit_request_by_code_only_client_errors_in_fragment() {
    let (authorize, _, _) = stack();

    // "intruder" is registered for the code flow only.
    let request = AuthorizationRequest {
        response_type: Some("token".to_string()),
        client_id: Some("intruder".to_string()),
        redirect_uri: None,
        scope: Some("read".to_string()),
        state: Some("s9".to_string()),
    };
    let outcome = authorize.authorize(&request, None, None).await;
    let AuthorizeOutcome::Redirect(uri) = outcome else {
        panic!("expected redirect, got {outcome:?}");
    };
    assert!(uri.starts_with("https://intruder.example/cb#error=unauthorized_client"));
    assert!(uri.contains("state=s9"));
    assert!(url::Url::parse(&uri).unwrap().query().is_none());
}

#[tokio::test]
async fn code_cannot_be_spent_by_another_client() {
    let (authorize, token, _) = stack();

    let uri = run_flow(
        &authorize,
        &authorization_request("code", "read", None),
        ConsentDecision::Accept {
            granted_scope: ScopeSet::parse("read"),
        },
    )
    .await;
    let code = query_param(&uri, "code").unwrap();

    let reply = token
        .handle(
            &TokenRequest {
                grant_type: Some("authorization_code".to_string()),
                client_id: Some("intruder".to_string()),
                code: Some(code),
                ..TokenRequest::default()
            },
            None,
        )
        .await;
    assert_eq!(reply.status, 400);
    assert!(reply.body.contains(r#""error":"invalid_grant""#));
    assert!(reply.body.contains("The code was not issued to the client."));
}

#[tokio::test]
async fn refresh_token_extends_the_code_flow() {
    let (authorize, token, verifier) = stack();

    let uri = run_flow(
        &authorize,
        &authorization_request("code", "read write", None),
        ConsentDecision::Accept {
            granted_scope: ScopeSet::parse("read write"),
        },
    )
    .await;
    let code = query_param(&uri, "code").unwrap();

    let reply = token
        .handle(
            &TokenRequest {
                grant_type: Some("authorization_code".to_string()),
                client_id: Some("abc".to_string()),
                code: Some(code),
                ..TokenRequest::default()
            },
            None,
        )
        .await;
    let issued: TokenResponse = serde_json::from_str(&reply.body).unwrap();

    let reply = token
        .handle(
            &TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                client_id: Some("abc".to_string()),
                refresh_token: issued.refresh_token.clone(),
                ..TokenRequest::default()
            },
            None,
        )
        .await;
    assert_eq!(reply.status, 200);
    let refreshed: TokenResponse = serde_json::from_str(&reply.body).unwrap();
    assert_ne!(refreshed.access_token, issued.access_token);

    // Rotation: the old access token is dead, the new one lives.
    let old = format!("Bearer {}", issued.access_token);
    assert!(matches!(
        verifier.verify(Some(&old), None, None).await,
        Verification::Invalid
    ));
    let new = format!("Bearer {}", refreshed.access_token);
    assert!(matches!(
        verifier.verify(Some(&new), None, None).await,
        Verification::Valid { .. }
    ));
}

#[tokio::test]
async fn dynamic_redirect_uri_binds_the_exchange() {
    let (authorize, token, _) = stack();

    // Supply redirect_uri explicitly so it is dynamically configured.
    let mut request = authorization_request("code", "read", None);
    request.redirect_uri = Some("https://app.example/cb".to_string());

    let uri = run_flow(
        &authorize,
        &request,
        ConsentDecision::Accept {
            granted_scope: ScopeSet::parse("read"),
        },
    )
    .await;
    let code = query_param(&uri, "code").unwrap();

    // Token request omitting redirect_uri fails.
    let reply = token
        .handle(
            &TokenRequest {
                grant_type: Some("authorization_code".to_string()),
                client_id: Some("abc".to_string()),
                code: Some(code.clone()),
                ..TokenRequest::default()
            },
            None,
        )
        .await;
    assert_eq!(reply.status, 400);
    assert!(reply.body.contains(r#""error":"invalid_grant""#));
}
