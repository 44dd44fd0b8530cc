//! End-to-end purchase flow over HTTP against embedded PostgreSQL.
//!
//! The app is assembled from the same state builders the server uses, so
//! these requests travel through the real services, Diesel repositories,
//! bcrypt, JWT issuing, and local file storage.

use std::future::Future;
use std::net::SocketAddr;

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use mercado::Trace;
use mercado::domain::ports::UserRepository;
use mercado::domain::{NewUser, UserRole};
use mercado::inbound::http;
use mercado::inbound::http::error::{configure_extractors, unknown_route};
use mercado::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use mercado::outbound::security::TokenSecret;
use mercado::outbound::storage::LocalFileStorage;
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::TempDir;

mod support;

use support::http::{authorised, id_of, multipart};
use support::database_or_skip;

#[allow(dead_code)]
#[path = "../src/server/config.rs"]
mod server_config;
pub use server_config::ServerConfig;

#[allow(dead_code)]
#[path = "../src/server/state_builders.rs"]
mod state_builders;

const PASSWORD: &str = "secreto-123";
const PDF_BYTES: &[u8] = b"%PDF-1.7 guia de estudio";

fn run_async<F: Future<Output = ()>>(future: F) {
    actix_web::rt::System::new().block_on(future);
}

async fn body_json(res: ServiceResponse) -> Value {
    actix_test::read_body_json(res).await
}

async fn seed_admin(pool: &DbPool) -> String {
    let hash = bcrypt::hash(PASSWORD, 4).expect("hash admin password");
    DieselUserRepository::new(pool.clone())
        .create(&NewUser {
            name: "Administradora".to_owned(),
            email: "admin@mercado.test".to_owned(),
            password_hash: hash,
            birth_date: None,
            gender_id: None,
            role: UserRole::Admin,
        })
        .await
        .expect("seed admin");
    "admin@mercado.test".to_owned()
}

#[rstest]
fn seller_listing_purchase_and_download() {
    let Some(database) = database_or_skip() else {
        return;
    };
    let database_url = database.url().to_string();
    let uploads = TempDir::new().expect("uploads dir");

    run_async(async move {
        let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(4))
            .await
            .expect("pool");
        let admin_email = seed_admin(&pool).await;
        let storage = LocalFileStorage::open(uploads.path()).expect("storage");
        let config = ServerConfig::new(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            pool,
            storage,
            TokenSecret::from_bytes(vec![42; 32]),
        );
        let state = state_builders::build_http_state(&config).expect("http state");
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .wrap(Trace)
                .configure(configure_extractors)
                .configure(http::configure)
                .default_service(actix_web::web::to(unknown_route)),
        )
        .await;

        // Accounts.
        let login = |email: &str| {
            actix_test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({"email": email, "contrasena": PASSWORD}))
                .to_request()
        };
        let res = actix_test::call_service(&app, login(&admin_email)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let admin_token = body_json(res).await["token"]
            .as_str()
            .expect("admin token")
            .to_owned();

        let register = |nombre: &str, email: &str, role: i32| {
            actix_test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({
                    "nombre": nombre,
                    "email": email,
                    "contrasena": PASSWORD,
                    "id_tipo_usuario": role,
                }))
                .to_request()
        };
        let res = actix_test::call_service(&app, register("Vera", "vera@mercado.test", 2)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let seller = body_json(res).await;
        let seller_token = seller["token"].as_str().expect("seller token").to_owned();
        assert_eq!(seller["usuario"]["id_tipo_usuario"], 2);

        let res = actix_test::call_service(&app, register("Carlos", "carlos@mercado.test", 1)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let client_token = body_json(res).await["token"]
            .as_str()
            .expect("client token")
            .to_owned();

        let res = actix_test::call_service(&app, register("Otra", "VERA@mercado.test", 1)).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        // Catalogs.
        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::post().uri("/api/categorias"), &admin_token)
                .set_json(json!({"nombre": "Guías"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let category_id = id_of(&body_json(res).await, "id_categoria");

        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::post().uri("/api/extensiones"), &admin_token)
                .set_json(json!({"nombre": "pdf"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let extension_id = id_of(&body_json(res).await, "id_extension");

        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::post().uri("/api/categorias"), &client_token)
                .set_json(json!({"nombre": "Prohibida"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // Upload.
        let category = category_id.to_string();
        let extension = extension_id.to_string();
        let res = actix_test::call_service(
            &app,
            multipart(
                authorised(actix_test::TestRequest::post().uri("/api/archivos"), &seller_token),
                &[
                    ("nombre", "Guía de estudio"),
                    ("descripcion", "Resumen del temario"),
                    ("precio", "12.50"),
                    ("id_categoria", category.as_str()),
                    ("id_extension", extension.as_str()),
                ],
                "archivo",
                "guia.pdf",
                PDF_BYTES,
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let product = body_json(res).await;
        let product_id = id_of(&product, "id_archivo");
        assert_eq!(product["precio"], "12.50");
        assert_eq!(product["activo"], true);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/archivos?busqueda=estudio")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["total"], 1);

        // Gallery.
        let res = actix_test::call_service(
            &app,
            multipart(
                authorised(
                    actix_test::TestRequest::post().uri(&format!("/api/imagenes/archivo/{product_id}")),
                    &seller_token,
                ),
                &[],
                "imagen",
                "portada.png",
                b"\x89PNG fake",
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(body_json(res).await["es_portada"], true);

        // Purchase.
        let purchased_uri = format!("/api/transacciones/compras/{product_id}");
        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::get().uri(&purchased_uri), &client_token).to_request(),
        )
        .await;
        assert_eq!(body_json(res).await, json!({"comprado": false}));

        let download_uri = format!("/api/archivos/{product_id}/descargar");
        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::get().uri(&download_uri), &client_token).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let paypal = json!({
            "id_orden_paypal": "PAYPAL-ORDER-1",
            "archivos": [product_id],
            "monto": "12.50",
        });
        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::post().uri("/api/transacciones/paypal"), &client_token)
                .set_json(&paypal)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let transaction = body_json(res).await;
        assert_eq!(transaction["total"], "12.50");
        assert_eq!(transaction["estado"], "Completada");
        assert_eq!(transaction["referencia_pago"], "PAYPAL-ORDER-1");

        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::post().uri("/api/transacciones/paypal"), &client_token)
                .set_json(&paypal)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::get().uri(&purchased_uri), &client_token).to_request(),
        )
        .await;
        assert_eq!(body_json(res).await, json!({"comprado": true}));

        // Seller view.
        let res = actix_test::call_service(
            &app,
            authorised(
                actix_test::TestRequest::get().uri("/api/detalle-transacciones/ventas"),
                &seller_token,
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let sales = body_json(res).await;
        assert_eq!(sales["total"], 1);
        assert_eq!(sales["items"][0]["comprador"], "Carlos");

        // Referenced rows survive deletion.
        let res = actix_test::call_service(
            &app,
            authorised(
                actix_test::TestRequest::delete().uri(&format!("/api/categorias/{category_id}")),
                &admin_token,
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = actix_test::call_service(
            &app,
            authorised(
                actix_test::TestRequest::delete().uri(&format!("/api/archivos/{product_id}")),
                &seller_token,
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"resultado": "desactivado"}));

        // Buyers keep access to hidden products.
        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::get().uri(&download_uri), &client_token).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, PDF_BYTES);
    });
}

#[rstest]
fn wrong_password_and_unknown_token_are_rejected() {
    let Some(database) = database_or_skip() else {
        return;
    };
    let database_url = database.url().to_string();
    let uploads = TempDir::new().expect("uploads dir");

    run_async(async move {
        let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(2))
            .await
            .expect("pool");
        let admin_email = seed_admin(&pool).await;
        let config = ServerConfig::new(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            pool,
            LocalFileStorage::open(uploads.path()).expect("storage"),
            TokenSecret::from_bytes(vec![7; 32]),
        );
        let state = state_builders::build_http_state(&config).expect("http state");
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .wrap(Trace)
                .configure(http::configure),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({"email": admin_email, "contrasena": "incorrecta"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = actix_test::call_service(
            &app,
            authorised(actix_test::TestRequest::get().uri("/api/auth/me"), "not-a-jwt").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    });
}
