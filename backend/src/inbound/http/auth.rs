//! Bearer authentication extractor.
//!
//! Handlers take an [`AuthenticatedUser`] argument; extraction reads the
//! `Authorization: Bearer <token>` header and resolves it through the
//! [`IdentityVerifier`](crate::domain::ports::IdentityVerifier) held in
//! [`HttpState`]. Failures short-circuit before the handler body runs.

use std::ops::Deref;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, User};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The caller resolved from the request's bearer credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(User);

impl AuthenticatedUser {
    #[must_use]
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl Deref for AuthenticatedUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Token portion of an `Authorization` header, when it uses the bearer scheme.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let prefix = value.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    value.get(BEARER_PREFIX.len()..).map(|token| token.trim().to_owned())
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered on the app"))?;
            let user = state.identity.verify(token.as_deref()).await?;
            Ok(Self(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::test::TestRequest;
    use rstest::rstest;

    use crate::domain::ports::MockIdentityVerifier;
    use crate::domain::{AccessDenial, ErrorCode, MembershipTier, Role};
    use crate::inbound::http::test_utils::{member, mid_april};
    use crate::test_support::{ScriptedAiSource, TestHarness};

    fn request_with(verifier: MockIdentityVerifier, header: Option<&str>) -> HttpRequest {
        let mut state = TestHarness::new(ScriptedAiSource::failing(), mid_april()).http_state();
        state.identity = Arc::new(verifier);
        let mut request = TestRequest::default().app_data(web::Data::new(state));
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }
        request.to_http_request()
    }

    #[rstest]
    #[case(Some("Bearer abc.def"), Some("abc.def"))]
    #[case(Some("bearer   abc"), Some("abc"))]
    #[case(Some("Basic dXNlcjpwYXNz"), None)]
    #[case(Some("Bearer"), None)]
    #[case(None, None)]
    fn extracts_bearer_tokens(#[case] header: Option<&str>, #[case] expected: Option<&str>) {
        let mut request = TestRequest::default();
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }
        let req = request.to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn extractor_hands_the_token_to_the_verifier() {
        let user = member(Role::Doctor, MembershipTier::Free);
        let expected = user.clone();
        let mut verifier = MockIdentityVerifier::new();
        verifier
            .expect_verify()
            .withf(|credential| *credential == Some("abc.def"))
            .times(1)
            .return_once(move |_| Ok(user));
        let req = request_with(verifier, Some("Bearer abc.def"));

        let resolved = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .expect("resolved");

        assert_eq!(resolved.into_inner(), expected);
    }

    #[rstest]
    #[actix_web::test]
    async fn extractor_passes_missing_credentials_through() {
        let mut verifier = MockIdentityVerifier::new();
        verifier
            .expect_verify()
            .withf(|credential| credential.is_none())
            .times(1)
            .return_once(|_| Err(AccessDenial::Unauthenticated.into()));
        let req = request_with(verifier, None);

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[actix_web::test]
    async fn extractor_without_state_is_an_internal_error() {
        let req = TestRequest::default().to_http_request();

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .expect_err("no state");

        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
