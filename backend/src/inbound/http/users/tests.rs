//! Tests for user administration handlers.

use super::*;
use crate::domain::{UserRole, fixtures};
use crate::inbound::http::test_utils::{MockPorts, bearer};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::rstest;
use serde_json::{Value, json};

const TOKEN: &str = "user-token";

async fn send(ports: MockPorts, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(ports.into_state())
            .service(list_users)
            .service(get_user)
            .service(update_user)
            .service(change_password)
            .service(delete_user),
    )
    .await;
    let res = actix_test::call_service(&app, req.insert_header(bearer(TOKEN)).to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

#[actix_web::test]
async fn admin_lists_users_with_filters() {
    let mut ports = MockPorts::signed_in(TOKEN, 1, UserRole::Admin);
    ports
        .users
        .expect_list()
        .withf(|_, filter, page| {
            filter.search.as_deref() == Some("ana")
                && filter.role == Some(UserRole::Seller)
                && page.page() == 2
        })
        .returning(|_, _, page| {
            Ok(Page::new(vec![fixtures::user(5, UserRole::Seller)], 21, page))
        });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::get()
            .uri("/api/usuarios?busqueda=%20ana%20&id_tipo_usuario=2&page=2&limit=20"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 21);
    assert_eq!(body["items"][0]["id_usuario"], 5);
}

#[actix_web::test]
async fn clients_cannot_list_users() {
    let (status, _) = send(
        MockPorts::signed_in(TOKEN, 5, UserRole::Client),
        actix_test::TestRequest::get().uri("/api/usuarios"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[case("/api/usuarios?page=0", "page")]
#[case("/api/usuarios?limit=1000", "limit")]
#[case("/api/usuarios?id_tipo_usuario=7", "id_tipo_usuario")]
#[actix_web::test]
async fn invalid_listing_queries_are_rejected(#[case] uri: &str, #[case] field: &str) {
    let (status, body) = send(
        MockPorts::signed_in(TOKEN, 1, UserRole::Admin),
        actix_test::TestRequest::get().uri(uri),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[case(5, StatusCode::OK)]
#[case(6, StatusCode::FORBIDDEN)]
#[actix_web::test]
async fn users_read_only_themselves(#[case] target: i32, #[case] expected: StatusCode) {
    let mut ports = MockPorts::signed_in(TOKEN, 5, UserRole::Client);
    ports
        .users
        .expect_get()
        .returning(|_, id| Ok(fixtures::user(id.get(), UserRole::Client)));
    let (status, _) = send(
        ports,
        actix_test::TestRequest::get().uri(&format!("/api/usuarios/{target}")),
    )
    .await;
    assert_eq!(status, expected);
}

#[actix_web::test]
async fn update_distinguishes_null_from_absent() {
    let mut ports = MockPorts::signed_in(TOKEN, 5, UserRole::Client);
    ports
        .users
        .expect_update()
        .withf(|_, id, changes| {
            id.get() == 5
                && changes.birth_date == Some(None)
                && changes.gender_id.is_none()
                && changes.name.as_ref().map(UserName::as_str) == Some("Ana María")
        })
        .returning(|_, id, _| Ok(fixtures::user(id.get(), UserRole::Client)));

    let (status, _) = send(
        ports,
        actix_test::TestRequest::put()
            .uri("/api/usuarios/5")
            .set_json(json!({"nombre": "Ana María", "fecha_nacimiento": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn update_rejects_malformed_email() {
    let (status, body) = send(
        MockPorts::signed_in(TOKEN, 5, UserRole::Client),
        actix_test::TestRequest::put()
            .uri("/api/usuarios/5")
            .set_json(json!({"email": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "email");
}

#[actix_web::test]
async fn password_change_returns_no_content() {
    let mut ports = MockPorts::signed_in(TOKEN, 5, UserRole::Client);
    ports
        .users
        .expect_change_password()
        .withf(|actor, id, change| {
            actor.id == *id && change.current.expose() == "viejo" && change.new.expose() == "nuevo123"
        })
        .returning(|_, _, _| Ok(()));

    let (status, _) = send(
        ports,
        actix_test::TestRequest::put()
            .uri("/api/usuarios/5/contrasena")
            .set_json(json!({"contrasena_actual": "viejo", "contrasena_nueva": "nuevo123"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn short_new_password_is_rejected() {
    let (status, body) = send(
        MockPorts::signed_in(TOKEN, 5, UserRole::Client),
        actix_test::TestRequest::put()
            .uri("/api/usuarios/5/contrasena")
            .set_json(json!({"contrasena_actual": "viejo", "contrasena_nueva": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "contrasena_nueva");
}

#[actix_web::test]
async fn referenced_user_delete_conflicts() {
    let mut ports = MockPorts::signed_in(TOKEN, 1, UserRole::Admin);
    ports.users.expect_delete().returning(|_, _| {
        Err(Error::conflict("user is referenced")
            .with_details(json!({"archivos": 2, "transacciones": 0})))
    });
    let (status, body) = send(ports, actix_test::TestRequest::delete().uri("/api/usuarios/9")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["archivos"], 2);
}

#[actix_web::test]
async fn admin_delete_returns_no_content() {
    let mut ports = MockPorts::signed_in(TOKEN, 1, UserRole::Admin);
    ports
        .users
        .expect_delete()
        .withf(|_, id| id.get() == 9)
        .returning(|_, _| Ok(()));
    let (status, _) = send(ports, actix_test::TestRequest::delete().uri("/api/usuarios/9")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
