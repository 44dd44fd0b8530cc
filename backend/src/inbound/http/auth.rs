//! Bearer-token authentication for HTTP handlers.
//!
//! [`AuthenticatedUser`] reads `Authorization: Bearer <token>`, resolves it
//! through the [`crate::domain::ports::Accounts`] port, and offers the role
//! guards handlers use before calling a use case.

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Actor, Error, User, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

/// Caller identified by a valid bearer token.
///
/// Wrap in `Option` for endpoints that also serve anonymous callers; an
/// invalid token then degrades to anonymous access.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(User);

impl AuthenticatedUser {
    /// The resolved user.
    #[must_use]
    pub fn user(&self) -> &User {
        &self.0
    }

    /// Consume the wrapper.
    #[must_use]
    pub fn into_user(self) -> User {
        self.0
    }

    /// Identity and role for use-case calls.
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }

    /// Require an administrator.
    pub fn require_admin(&self) -> Result<Actor, Error> {
        let actor = self.actor();
        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(Error::forbidden("administrator role required"))
        }
    }

    /// Require a role allowed to sell.
    pub fn require_seller(&self) -> Result<Actor, Error> {
        let actor = self.actor();
        if actor.role.can_sell() {
            Ok(actor)
        } else {
            Err(Error::forbidden("seller role required"))
        }
    }

    /// Require the caller to be `user` or an administrator.
    pub fn require_self_or_admin(&self, user: UserId) -> Result<Actor, Error> {
        let actor = self.actor();
        if actor.is_self_or_admin(user) {
            Ok(actor)
        } else {
            Err(Error::forbidden("you may only access your own account"))
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let (scheme, token) = value.split_at_checked(BEARER_PREFIX.len()).ok_or_else(|| {
        Error::unauthorized("authorization header must use the Bearer scheme")
    })?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) || token.is_empty() {
        return Err(Error::unauthorized(
            "authorization header must use the Bearer scheme",
        ));
    }
    Ok(token.to_owned())
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token?;
            state.accounts.resolve_token(&token).await.map(Self)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::inbound::http::test_utils::{MockPorts, bearer};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    const TOKEN: &str = "valid-token";

    async fn who_am_i(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user().id.to_string())
    }

    async fn admin_only(user: AuthenticatedUser) -> Result<HttpResponse, Error> {
        user.require_admin()?;
        Ok(HttpResponse::NoContent().finish())
    }

    async fn maybe(user: Option<AuthenticatedUser>) -> HttpResponse {
        match user {
            Some(user) => HttpResponse::Ok().body(user.user().id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn call(
        ports: MockPorts,
        path: &str,
        header: Option<(header::HeaderName, String)>,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(ports.into_state())
                .route("/me", web::get().to(who_am_i))
                .route("/admin", web::get().to(admin_only))
                .route("/maybe", web::get().to(maybe)),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri(path);
        if let Some(header) = header {
            req = req.insert_header(header);
        }
        actix_test::call_service(&app, req.to_request()).await
    }

    #[actix_web::test]
    async fn resolves_bearer_token() {
        let res = call(
            MockPorts::signed_in(TOKEN, 7, UserRole::Client),
            "/me",
            Some(bearer(TOKEN)),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, "7");
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic dXNlcjpwYXNz"))]
    #[case(Some("Bearer "))]
    #[case(Some("Bear"))]
    #[actix_web::test]
    async fn missing_or_malformed_header_is_unauthorised(#[case] value: Option<&str>) {
        let header = value.map(|v| (header::AUTHORIZATION, v.to_owned()));
        let res = call(MockPorts::default(), "/me", header).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn rejected_token_is_unauthorised() {
        let mut ports = MockPorts::default();
        ports
            .accounts
            .expect_resolve_token()
            .returning(|_| Err(Error::unauthorized("token expired")));
        let res = call(ports, "/me", Some(bearer("stale"))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(UserRole::Client, StatusCode::FORBIDDEN)]
    #[case(UserRole::Seller, StatusCode::FORBIDDEN)]
    #[case(UserRole::Admin, StatusCode::NO_CONTENT)]
    #[case(UserRole::SuperAdmin, StatusCode::NO_CONTENT)]
    #[actix_web::test]
    async fn admin_guard_checks_role(#[case] role: UserRole, #[case] expected: StatusCode) {
        let res = call(MockPorts::signed_in(TOKEN, 1, role), "/admin", Some(bearer(TOKEN))).await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn optional_user_falls_back_to_anonymous() {
        let res = call(MockPorts::default(), "/maybe", None).await;
        assert_eq!(actix_test::read_body(res).await, "anonymous");
    }

    #[rstest]
    #[case(UserRole::Client, 5, true)]
    #[case(UserRole::Client, 6, false)]
    #[case(UserRole::Admin, 6, true)]
    fn self_or_admin_guard(#[case] role: UserRole, #[case] target: i32, #[case] allowed: bool) {
        let user = AuthenticatedUser(crate::domain::fixtures::user(5, role));
        assert_eq!(user.require_self_or_admin(UserId::new(target)).is_ok(), allowed);
    }

    #[rstest]
    #[case(UserRole::Client, false)]
    #[case(UserRole::Seller, true)]
    #[case(UserRole::Admin, true)]
    fn seller_guard(#[case] role: UserRole, #[case] allowed: bool) {
        let user = AuthenticatedUser(crate::domain::fixtures::user(5, role));
        assert_eq!(user.require_seller().is_ok(), allowed);
    }
}
