//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::web;

use crate::domain::ports::{
    MockAccounts, MockCatalogs, MockGallery, MockProducts, MockPurchases, MockUserDirectory,
};
use crate::domain::{User, UserRole, fixtures};

use super::state::{HttpState, HttpStatePorts};

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "mercado-test-boundary";

/// Mocked driving ports; set expectations, then call [`MockPorts::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccounts,
    pub users: MockUserDirectory,
    pub catalogs: MockCatalogs,
    pub products: MockProducts,
    pub gallery: MockGallery,
    pub purchases: MockPurchases,
}

impl MockPorts {
    /// Ports with `token` resolving to a fixture user with `id` and `role`.
    pub fn signed_in(token: &'static str, id: i32, role: UserRole) -> Self {
        let mut ports = Self::default();
        accept_token(&mut ports.accounts, token, fixtures::user(id, role));
        ports
    }

    /// Wrap the mocks as handler state.
    pub fn into_state(self) -> web::Data<HttpState> {
        self.into_state_with_limit(super::state::DEFAULT_UPLOAD_LIMIT)
    }

    /// Wrap the mocks as handler state with a custom upload limit.
    pub fn into_state_with_limit(self, limit: usize) -> web::Data<HttpState> {
        web::Data::new(HttpState::with_upload_limit(
            HttpStatePorts {
                accounts: Arc::new(self.accounts),
                users: Arc::new(self.users),
                catalogs: Arc::new(self.catalogs),
                products: Arc::new(self.products),
                gallery: Arc::new(self.gallery),
                purchases: Arc::new(self.purchases),
            },
            limit,
        ))
    }
}

/// Make `token` resolve to `user`.
pub fn accept_token(accounts: &mut MockAccounts, token: &'static str, user: User) {
    accounts
        .expect_resolve_token()
        .withf(move |candidate| candidate == token)
        .returning(move |_| Ok(user.clone()));
}

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// `Content-Type` header matching [`multipart_body`].
pub fn multipart_content_type() -> (header::HeaderName, String) {
    (
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

/// Encode text fields and an optional file part as `multipart/form-data`.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, contents)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
