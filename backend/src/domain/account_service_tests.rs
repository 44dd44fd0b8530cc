//! Tests for the account service.

use std::sync::Arc;

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::fixtures;
use crate::domain::ports::{
    CatalogRepositoryError, IssuedToken, MailerError, MockCatalogRepository, MockPasswordHasher,
    MockTokenService, MockUserRepository, MockWelcomeMailer, UserPersistenceError,
};
use crate::domain::{
    CatalogEntry, CatalogId, EmailAddress, ErrorCode, UserCredentials, UserId, UserName, UserRole,
};

type TestService = AccountService<
    MockUserRepository,
    MockCatalogRepository,
    MockPasswordHasher,
    MockTokenService,
    MockWelcomeMailer,
>;

struct Mocks {
    users: MockUserRepository,
    catalogs: MockCatalogRepository,
    hasher: MockPasswordHasher,
    tokens: MockTokenService,
    mailer: MockWelcomeMailer,
}

impl Mocks {
    fn new() -> Self {
        Self {
            users: MockUserRepository::new(),
            catalogs: MockCatalogRepository::new(),
            hasher: MockPasswordHasher::new(),
            tokens: MockTokenService::new(),
            mailer: MockWelcomeMailer::new(),
        }
    }

    fn issuing_tokens(mut self) -> Self {
        self.tokens.expect_issue().returning(|user| {
            Ok(IssuedToken {
                token: format!("token-{}", user.id),
                expires_at: fixtures::timestamp() + Duration::hours(24),
            })
        });
        self
    }

    fn build(self) -> TestService {
        AccountService::new(
            Arc::new(self.users),
            Arc::new(self.catalogs),
            Arc::new(self.hasher),
            Arc::new(self.tokens),
            Arc::new(self.mailer),
        )
    }
}

fn registration(role: UserRole, gender_id: Option<i32>) -> Registration {
    Registration {
        name: UserName::parse("Lucía").expect("valid name"),
        email: EmailAddress::parse("lucia@example.com").expect("valid email"),
        password: PlainPassword::parse("secreto123".to_owned()).expect("valid password"),
        birth_date: None,
        gender_id: gender_id.map(CatalogId::new),
        role,
    }
}

fn credentials(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials {
        email: email.to_owned(),
        password: PlainPassword::for_verification(password.to_owned()),
    }
}

#[rstest]
#[tokio::test]
async fn register_creates_user_and_returns_session() {
    let mut mocks = Mocks::new().issuing_tokens();
    mocks
        .hasher
        .expect_hash()
        .times(1)
        .returning(|_| Ok("$2b$hash".to_owned()));
    mocks
        .users
        .expect_create()
        .withf(|user| {
            user.email == "lucia@example.com"
                && user.password_hash == "$2b$hash"
                && user.role == UserRole::Seller
        })
        .times(1)
        .returning(|_| Ok(fixtures::user(7, UserRole::Seller)));
    mocks.mailer.expect_send_welcome().times(1).returning(|_| Ok(()));

    let session = mocks
        .build()
        .register(registration(UserRole::Seller, None))
        .await
        .expect("registration succeeds");

    assert_eq!(session.token, "token-7");
    assert_eq!(session.user.id, UserId::new(7));
}

#[rstest]
#[tokio::test]
async fn register_survives_mail_failures() {
    let mut mocks = Mocks::new().issuing_tokens();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$2b$hash".to_owned()));
    mocks
        .users
        .expect_create()
        .returning(|_| Ok(fixtures::user(8, UserRole::Client)));
    mocks
        .mailer
        .expect_send_welcome()
        .returning(|_| Err(MailerError::delivery("relay down")));

    let session = mocks
        .build()
        .register(registration(UserRole::Client, None))
        .await
        .expect("mail failure does not fail registration");
    assert_eq!(session.user.id, UserId::new(8));
}

#[rstest]
#[case(UserRole::Admin)]
#[case(UserRole::SuperAdmin)]
#[tokio::test]
async fn register_rejects_administrative_roles(#[case] role: UserRole) {
    let mut mocks = Mocks::new();
    mocks.users.expect_create().never();

    let error = mocks
        .build()
        .register(registration(role, None))
        .await
        .expect_err("admin roles are not self-assignable");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn register_rejects_unknown_gender() {
    let mut mocks = Mocks::new();
    mocks
        .catalogs
        .expect_find()
        .withf(|kind, id| *kind == CatalogKind::Gender && id.get() == 9)
        .returning(|_, _| Ok(None));
    mocks.users.expect_create().never();

    let error = mocks
        .build()
        .register(registration(UserRole::Client, Some(9)))
        .await
        .expect_err("unknown gender");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn register_accepts_known_gender() {
    let mut mocks = Mocks::new().issuing_tokens();
    mocks
        .catalogs
        .expect_find()
        .returning(|_, id| Ok(Some(CatalogEntry::new(id, "Femenino"))));
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$2b$hash".to_owned()));
    mocks
        .users
        .expect_create()
        .withf(|user| user.gender_id == Some(CatalogId::new(2)))
        .returning(|_| Ok(fixtures::user(3, UserRole::Client)));
    mocks.mailer.expect_send_welcome().returning(|_| Ok(()));

    mocks
        .build()
        .register(registration(UserRole::Client, Some(2)))
        .await
        .expect("registration succeeds");
}

#[rstest]
#[tokio::test]
async fn register_maps_duplicate_email_to_conflict() {
    let mut mocks = Mocks::new();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$2b$hash".to_owned()));
    mocks
        .users
        .expect_create()
        .returning(|_| Err(UserPersistenceError::duplicate_email("lucia@example.com")));

    let error = mocks
        .build()
        .register(registration(UserRole::Client, None))
        .await
        .expect_err("duplicate email");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn register_reports_unavailable_catalog() {
    let mut mocks = Mocks::new();
    mocks
        .catalogs
        .expect_find()
        .returning(|_, _| Err(CatalogRepositoryError::connection("pool exhausted")));

    let error = mocks
        .build()
        .register(registration(UserRole::Client, Some(1)))
        .await
        .expect_err("catalog unavailable");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn login_normalises_email_and_issues_token() {
    let mut mocks = Mocks::new().issuing_tokens();
    mocks
        .users
        .expect_find_credentials_by_email()
        .withf(|email| email == "ana@example.com")
        .returning(|_| {
            Ok(Some(UserCredentials {
                user: fixtures::user(4, UserRole::Client),
                password_hash: "$2b$stored".to_owned(),
            }))
        });
    mocks
        .hasher
        .expect_verify()
        .withf(|password, hash| password.expose() == "secreto123" && hash == "$2b$stored")
        .returning(|_, _| Ok(true));

    let session = mocks
        .build()
        .login(credentials(" Ana@Example.com ", "secreto123"))
        .await
        .expect("login succeeds");
    assert_eq!(session.token, "token-4");
}

#[rstest]
#[tokio::test]
async fn login_rejects_wrong_password() {
    let mut mocks = Mocks::new();
    mocks
        .users
        .expect_find_credentials_by_email()
        .returning(|_| {
            Ok(Some(UserCredentials {
                user: fixtures::user(4, UserRole::Client),
                password_hash: "$2b$stored".to_owned(),
            }))
        });
    mocks.hasher.expect_verify().returning(|_, _| Ok(false));
    mocks.tokens.expect_issue().never();

    let error = mocks
        .build()
        .login(credentials("ana@example.com", "nope"))
        .await
        .expect_err("wrong password");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn login_rejects_unknown_email_with_same_message() {
    let mut mocks = Mocks::new();
    mocks
        .users
        .expect_find_credentials_by_email()
        .returning(|_| Ok(None));

    let error = mocks
        .build()
        .login(credentials("ghost@example.com", "secreto123"))
        .await
        .expect_err("unknown email");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), INVALID_CREDENTIALS);
}

#[rstest]
#[case(TokenError::expired(), "token expired")]
#[case(TokenError::invalid("bad signature"), "invalid token")]
#[tokio::test]
async fn resolve_token_rejects_bad_tokens(#[case] failure: TokenError, #[case] message: &str) {
    let mut mocks = Mocks::new();
    mocks
        .tokens
        .expect_verify()
        .return_once(move |_| Err(failure));

    let error = mocks
        .build()
        .resolve_token("abc")
        .await
        .expect_err("token rejected");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), message);
}

#[rstest]
#[tokio::test]
async fn resolve_token_rejects_deleted_users() {
    let mut mocks = Mocks::new();
    mocks
        .tokens
        .expect_verify()
        .returning(|_| Ok(UserId::new(11)));
    mocks.users.expect_find_by_id().returning(|_| Ok(None));

    let error = mocks
        .build()
        .resolve_token("abc")
        .await
        .expect_err("user gone");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn resolve_token_loads_current_user() {
    let mut mocks = Mocks::new();
    mocks
        .tokens
        .expect_verify()
        .returning(|_| Ok(UserId::new(5)));
    mocks
        .users
        .expect_find_by_id()
        .withf(|id| id.get() == 5)
        .returning(|_| Ok(Some(fixtures::user(5, UserRole::Admin))));

    let user = mocks.build().resolve_token("abc").await.expect("resolved");
    assert_eq!(user.role, UserRole::Admin);
}
