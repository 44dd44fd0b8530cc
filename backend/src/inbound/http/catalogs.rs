//! Lookup-table handlers shared by the six catalog routes.
//!
//! Each [`CatalogKind`] is mounted at `/api/<route>` with the same handlers;
//! the kind travels as resource-level app data.
//!
//! ```text
//! GET /api/categorias
//! POST /api/extensiones {"nombre":"pdf"}
//! PUT /api/generos/3 {"nombre":"Otro"}
//! DELETE /api/metodos-pago/2
//! ```

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CatalogId, CatalogKind, Error};

use super::ApiResult;
use super::auth::AuthenticatedUser;
use super::schemas::CatalogRecordSchema;
use super::state::HttpState;

/// Request body for creating or renaming a catalog row.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CatalogNameRequest {
    #[schema(example = "Plantillas")]
    pub nombre: String,
}

/// Mount every catalog under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    for kind in CatalogKind::ALL {
        let base = format!("/api/{}", kind.route());
        cfg.service(
            web::resource(base.clone())
                .app_data(web::Data::new(kind))
                .route(web::get().to(list_entries))
                .route(web::post().to(create_entry)),
        )
        .service(
            web::resource(format!("{base}/{{id}}"))
                .app_data(web::Data::new(kind))
                .route(web::get().to(get_entry))
                .route(web::put().to(rename_entry))
                .route(web::delete().to(delete_entry)),
        );
    }
}

/// List a catalog ordered by name.
#[utoipa::path(
    get,
    path = "/api/{catalogo}",
    params(("catalogo" = String, Path, description = "categorias, extensiones, generos, metodos-pago, tipo-usuarios or estados-transaccion")),
    responses(
        (status = 200, description = "Entries", body = [CatalogRecordSchema])
    ),
    tags = ["catalogs"],
    operation_id = "listCatalog",
    security([])
)]
pub async fn list_entries(
    state: web::Data<HttpState>,
    kind: web::Data<CatalogKind>,
) -> ApiResult<HttpResponse> {
    let kind = **kind;
    let entries = state.catalogs.list(kind).await?;
    let body: Vec<_> = entries.iter().map(|entry| entry.in_catalog(kind)).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Fetch one catalog row.
#[utoipa::path(
    get,
    path = "/api/{catalogo}/{id}",
    params(
        ("catalogo" = String, Path, description = "Catalog route"),
        ("id" = i32, Path, description = "Row id")
    ),
    responses(
        (status = 200, description = "Entry", body = CatalogRecordSchema),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["catalogs"],
    operation_id = "getCatalogEntry",
    security([])
)]
pub async fn get_entry(
    state: web::Data<HttpState>,
    kind: web::Data<CatalogKind>,
    path: web::Path<CatalogId>,
) -> ApiResult<HttpResponse> {
    let kind = **kind;
    let entry = state.catalogs.get(kind, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entry.in_catalog(kind)))
}

/// Add a catalog row (administrators).
#[utoipa::path(
    post,
    path = "/api/{catalogo}",
    params(("catalogo" = String, Path, description = "Catalog route")),
    request_body = CatalogNameRequest,
    responses(
        (status = 201, description = "Created", body = CatalogRecordSchema),
        (status = 400, description = "Invalid name", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Duplicate name", body = Error)
    ),
    tags = ["catalogs"],
    operation_id = "createCatalogEntry"
)]
pub async fn create_entry(
    state: web::Data<HttpState>,
    kind: web::Data<CatalogKind>,
    user: AuthenticatedUser,
    payload: web::Json<CatalogNameRequest>,
) -> ApiResult<HttpResponse> {
    let kind = **kind;
    let actor = user.require_admin()?;
    let entry = state
        .catalogs
        .create(actor, kind, payload.into_inner().nombre)
        .await?;
    Ok(HttpResponse::Created().json(entry.in_catalog(kind)))
}

/// Rename a catalog row (administrators).
#[utoipa::path(
    put,
    path = "/api/{catalogo}/{id}",
    params(
        ("catalogo" = String, Path, description = "Catalog route"),
        ("id" = i32, Path, description = "Row id")
    ),
    request_body = CatalogNameRequest,
    responses(
        (status = 200, description = "Renamed", body = CatalogRecordSchema),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Duplicate name", body = Error)
    ),
    tags = ["catalogs"],
    operation_id = "renameCatalogEntry"
)]
pub async fn rename_entry(
    state: web::Data<HttpState>,
    kind: web::Data<CatalogKind>,
    user: AuthenticatedUser,
    path: web::Path<CatalogId>,
    payload: web::Json<CatalogNameRequest>,
) -> ApiResult<HttpResponse> {
    let kind = **kind;
    let actor = user.require_admin()?;
    let entry = state
        .catalogs
        .rename(actor, kind, path.into_inner(), payload.into_inner().nombre)
        .await?;
    Ok(HttpResponse::Ok().json(entry.in_catalog(kind)))
}

/// Delete an unreferenced, non-system catalog row (administrators).
#[utoipa::path(
    delete,
    path = "/api/{catalogo}/{id}",
    params(
        ("catalogo" = String, Path, description = "Catalog route"),
        ("id" = i32, Path, description = "Row id")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "System row or still referenced", body = Error)
    ),
    tags = ["catalogs"],
    operation_id = "deleteCatalogEntry"
)]
pub async fn delete_entry(
    state: web::Data<HttpState>,
    kind: web::Data<CatalogKind>,
    user: AuthenticatedUser,
    path: web::Path<CatalogId>,
) -> ApiResult<HttpResponse> {
    let actor = user.require_admin()?;
    state.catalogs.delete(actor, **kind, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogEntry, UserRole};
    use crate::inbound::http::test_utils::{MockPorts, bearer};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    const TOKEN: &str = "catalog-token";

    async fn send(ports: MockPorts, req: actix_test::TestRequest) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new().app_data(ports.into_state()).configure(configure),
        )
        .await;
        actix_test::call_service(&app, req.to_request()).await
    }

    #[rstest]
    #[case("/api/categorias", CatalogKind::Category, "id_categoria")]
    #[case("/api/extensiones", CatalogKind::Extension, "id_extension")]
    #[case("/api/generos", CatalogKind::Gender, "id_genero")]
    #[case("/api/metodos-pago", CatalogKind::PaymentMethod, "id_metodo_pago")]
    #[case("/api/tipo-usuarios", CatalogKind::UserType, "id_tipo_usuario")]
    #[case("/api/estados-transaccion", CatalogKind::TransactionStatus, "id_estado")]
    #[actix_web::test]
    async fn lists_are_keyed_by_table(
        #[case] uri: &str,
        #[case] kind: CatalogKind,
        #[case] id_field: &str,
    ) {
        let mut ports = MockPorts::default();
        ports
            .catalogs
            .expect_list()
            .withf(move |candidate| *candidate == kind)
            .returning(|_| Ok(vec![CatalogEntry::new(CatalogId::new(1), "Uno")]));

        let res = send(ports, actix_test::TestRequest::get().uri(uri)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body[0][id_field], 1);
        assert_eq!(body[0]["nombre"], "Uno");
    }

    #[actix_web::test]
    async fn missing_entry_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .catalogs
            .expect_get()
            .returning(|_, id| Err(Error::not_found(format!("category {id} not found"))));
        let res = send(ports, actix_test::TestRequest::get().uri("/api/categorias/99")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn admins_create_entries() {
        let mut ports = MockPorts::signed_in(TOKEN, 1, UserRole::Admin);
        ports
            .catalogs
            .expect_create()
            .withf(|_, kind, name| *kind == CatalogKind::Extension && name == ".PDF")
            .returning(|_, _, _| Ok(CatalogEntry::new(CatalogId::new(4), "pdf")));

        let res = send(
            ports,
            actix_test::TestRequest::post()
                .uri("/api/extensiones")
                .insert_header(bearer(TOKEN))
                .set_json(json!({"nombre": ".PDF"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body, json!({"id_extension": 4, "nombre": "pdf"}));
    }

    #[rstest]
    #[case(actix_test::TestRequest::post().uri("/api/generos").set_json(json!({"nombre": "x"})))]
    #[case(actix_test::TestRequest::put().uri("/api/generos/1").set_json(json!({"nombre": "x"})))]
    #[case(actix_test::TestRequest::delete().uri("/api/generos/1"))]
    #[actix_web::test]
    async fn mutations_require_admin(#[case] req: actix_test::TestRequest) {
        let ports = MockPorts::signed_in(TOKEN, 5, UserRole::Seller);
        let res = send(ports, req.insert_header(bearer(TOKEN))).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn protected_rows_conflict_on_delete() {
        let mut ports = MockPorts::signed_in(TOKEN, 1, UserRole::SuperAdmin);
        ports
            .catalogs
            .expect_delete()
            .returning(|_, _, _| Err(Error::conflict("system rows cannot be deleted")));
        let res = send(
            ports,
            actix_test::TestRequest::delete()
                .uri("/api/estados-transaccion/2")
                .insert_header(bearer(TOKEN)),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn rename_returns_updated_entry() {
        let mut ports = MockPorts::signed_in(TOKEN, 1, UserRole::Admin);
        ports
            .catalogs
            .expect_rename()
            .withf(|_, kind, id, name| {
                *kind == CatalogKind::Category && id.get() == 3 && name == "Música"
            })
            .returning(|_, _, id, name| Ok(CatalogEntry::new(id, name)));
        let res = send(
            ports,
            actix_test::TestRequest::put()
                .uri("/api/categorias/3")
                .insert_header(bearer(TOKEN))
                .set_json(json!({"nombre": "Música"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["id_categoria"], 3);
    }
}
