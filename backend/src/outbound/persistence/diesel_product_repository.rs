//! PostgreSQL-backed `ProductRepository` implementation using Diesel ORM.
//!
//! Listings join `archivos` with its seller, category, and extension rows and
//! attach the cover image path from `imagenes_archivo` in a second query.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{Page, PageRequest};

use crate::domain::ports::{ProductRepository, ProductRepositoryError};
use crate::domain::{
    CatalogId, NewProduct, Price, Product, ProductChanges, ProductFilter, ProductId,
    ProductRemoval, ProductSort, SellerId, UserId,
};

use super::error_mapping::{
    contains_pattern, map_basic_diesel_error, map_basic_pool_error, row_total,
};
use super::models::{NewProductRow, NewSellerRow, ProductRow, ProductUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{
    archivos, categoria_archivo, detalle_transaccion, extension_archivo, imagenes_archivo,
    usuarios, vendedor,
};

/// `archivos` joined with everything a listing shows.
macro_rules! product_source {
    () => {
        archivos::table
            .inner_join(vendedor::table.inner_join(usuarios::table))
            .inner_join(categoria_archivo::table)
            .inner_join(extension_archivo::table)
    };
}

/// Columns loaded for each listed product.
macro_rules! product_columns {
    () => {
        (
            ProductRow::as_select(),
            vendedor::id_usuario,
            usuarios::nombre,
            categoria_archivo::nombre,
            extension_archivo::nombre,
        )
    };
}

/// Narrow a boxed product query by a [`ProductFilter`].
macro_rules! filter_products {
    ($query:ident, $filter:expr) => {{
        let filter: &ProductFilter = $filter;
        if !filter.include_inactive {
            $query = $query.filter(archivos::activo.eq(true));
        }
        if let Some(term) = filter.search.as_deref() {
            let pattern = contains_pattern(term);
            $query = $query.filter(
                archivos::nombre.ilike(pattern.clone()).or(archivos::descripcion
                    .assume_not_null()
                    .ilike(pattern)),
            );
        }
        if let Some(category) = filter.category_id {
            $query = $query.filter(archivos::id_categoria.eq(category.get()));
        }
        if let Some(extension) = filter.extension_id {
            $query = $query.filter(archivos::id_extension.eq(extension.get()));
        }
        if let Some(seller) = filter.seller_user_id {
            $query = $query.filter(vendedor::id_usuario.eq(seller.get()));
        }
        if let Some(min) = filter.min_price {
            $query = $query.filter(archivos::precio_centavos.ge(min.cents()));
        }
        if let Some(max) = filter.max_price {
            $query = $query.filter(archivos::precio_centavos.le(max.cents()));
        }
    }};
}

type JoinedRow = (ProductRow, i32, String, String, String);

/// Diesel-backed implementation of the `ProductRepository` port.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProductRepositoryError {
    map_basic_pool_error(error, |message| ProductRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> ProductRepositoryError {
    map_basic_diesel_error(
        error,
        ProductRepositoryError::query,
        ProductRepositoryError::connection,
    )
}

fn to_product(
    (row, seller_user_id, seller_name, category_name, extension_name): JoinedRow,
    covers: &mut HashMap<i32, String>,
) -> Result<Product, ProductRepositoryError> {
    let price = Price::from_cents(row.precio_centavos)
        .map_err(|err| ProductRepositoryError::query(format!("archivos.precio_centavos: {err}")))?;
    Ok(Product {
        id: ProductId::new(row.id_archivo),
        seller_id: SellerId::new(row.id_vendedor),
        seller_user_id: UserId::new(seller_user_id),
        seller_name,
        category_id: CatalogId::new(row.id_categoria),
        category_name,
        extension_id: CatalogId::new(row.id_extension),
        extension_name,
        name: row.nombre,
        description: row.descripcion,
        price,
        file_path: row.ruta_archivo,
        uploaded_at: row.fecha_subida,
        downloads: row.descargas,
        active: row.activo,
        cover_image: covers.remove(&row.id_archivo),
    })
}

/// Cover image path per product id.
async fn load_covers(
    conn: &mut AsyncPgConnection,
    ids: Vec<i32>,
) -> QueryResult<HashMap<i32, String>> {
    let rows: Vec<(i32, String)> = imagenes_archivo::table
        .filter(imagenes_archivo::id_archivo.eq_any(ids))
        .filter(imagenes_archivo::es_portada.eq(true))
        .select((imagenes_archivo::id_archivo, imagenes_archivo::ruta_imagen))
        .load(conn)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Load joined rows for `ids` together with their covers.
async fn load_by_ids(
    conn: &mut AsyncPgConnection,
    ids: Vec<i32>,
) -> QueryResult<(Vec<JoinedRow>, HashMap<i32, String>)> {
    let rows: Vec<JoinedRow> = product_source!()
        .filter(archivos::id_archivo.eq_any(ids.clone()))
        .select(product_columns!())
        .order_by(archivos::id_archivo.asc())
        .load(conn)
        .await?;
    let covers = load_covers(conn, ids).await?;
    Ok((rows, covers))
}

fn assemble(
    rows: Vec<JoinedRow>,
    mut covers: HashMap<i32, String>,
) -> Result<Vec<Product>, ProductRepositoryError> {
    rows.into_iter()
        .map(|row| to_product(row, &mut covers))
        .collect()
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut count_query = product_source!().into_boxed();
        filter_products!(count_query, filter);
        let total: i64 = count_query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut query = product_source!().select(product_columns!()).into_boxed();
        filter_products!(query, filter);
        query = match filter.sort {
            ProductSort::Recent => query.order_by((
                archivos::fecha_subida.desc(),
                archivos::id_archivo.desc(),
            )),
            ProductSort::PriceAsc => query.order_by((
                archivos::precio_centavos.asc(),
                archivos::id_archivo.asc(),
            )),
            ProductSort::PriceDesc => query.order_by((
                archivos::precio_centavos.desc(),
                archivos::id_archivo.asc(),
            )),
            ProductSort::Popular => {
                query.order_by((archivos::descargas.desc(), archivos::id_archivo.asc()))
            }
            ProductSort::Name => {
                query.order_by((archivos::nombre.asc(), archivos::id_archivo.asc()))
            }
        };
        let rows: Vec<JoinedRow> = query
            .limit(page.sql_limit())
            .offset(page.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids = rows.iter().map(|(row, ..)| row.id_archivo).collect();
        let covers = load_covers(&mut conn, ids)
            .await
            .map_err(map_diesel_error)?;
        let products = assemble(rows, covers)?;
        let total = row_total(total).map_err(ProductRepositoryError::query)?;
        Ok(Page::new(products, total, page))
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        let mut found = self.find_many(&[id]).await?;
        Ok(found.pop())
    }

    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw_ids = ids.iter().map(|id| id.get()).collect();
        let (rows, covers) = load_by_ids(&mut conn, raw_ids)
            .await
            .map_err(map_diesel_error)?;
        assemble(rows, covers)
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let seller_user_id = product.seller_user_id.get();
        let draft = &product.draft;

        let (rows, covers) = conn
            .transaction(|conn| {
                async move {
                    // Administrators may upload without having registered as sellers.
                    diesel::insert_into(vendedor::table)
                        .values(NewSellerRow {
                            id_usuario: seller_user_id,
                        })
                        .on_conflict(vendedor::id_usuario)
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    let seller_id: i32 = vendedor::table
                        .filter(vendedor::id_usuario.eq(seller_user_id))
                        .select(vendedor::id_vendedor)
                        .first(conn)
                        .await?;

                    let new_row = NewProductRow {
                        id_vendedor: seller_id,
                        id_categoria: draft.category_id.get(),
                        id_extension: draft.extension_id.get(),
                        nombre: &draft.name,
                        descripcion: draft.description.as_deref(),
                        precio_centavos: draft.price.cents(),
                        ruta_archivo: &product.file_path,
                    };
                    let id: i32 = diesel::insert_into(archivos::table)
                        .values(&new_row)
                        .returning(archivos::id_archivo)
                        .get_result(conn)
                        .await?;
                    load_by_ids(conn, vec![id]).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        assemble(rows, covers)?
            .pop()
            .ok_or_else(|| ProductRepositoryError::query("inserted product not found"))
    }

    async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = ProductUpdate {
            nombre: changes.name.as_deref(),
            descripcion: changes.description.as_ref().map(Option::as_deref),
            precio_centavos: changes.price.map(Price::cents),
            id_categoria: changes.category_id.map(CatalogId::get),
            id_extension: changes.extension_id.map(CatalogId::get),
            activo: changes.active,
        };
        let updated = diesel::update(archivos::table.find(id.get()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Ok(None);
        }
        drop(conn);
        self.find(id).await
    }

    async fn remove(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductRemoval>, ProductRepositoryError> {
        let raw_id = id.get();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let file_path: Option<String> = archivos::table
                    .find(raw_id)
                    .select(archivos::ruta_archivo)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(file_path) = file_path else {
                    return Ok(None);
                };

                let sold: i64 = detalle_transaccion::table
                    .filter(detalle_transaccion::id_archivo.eq(raw_id))
                    .count()
                    .get_result(conn)
                    .await?;
                if sold > 0 {
                    diesel::update(archivos::table.find(raw_id))
                        .set(archivos::activo.eq(false))
                        .execute(conn)
                        .await?;
                    return Ok(Some(ProductRemoval::Deactivated));
                }

                let image_paths: Vec<String> = imagenes_archivo::table
                    .filter(imagenes_archivo::id_archivo.eq(raw_id))
                    .select(imagenes_archivo::ruta_imagen)
                    .load(conn)
                    .await?;
                diesel::delete(archivos::table.find(raw_id))
                    .execute(conn)
                    .await?;
                Ok(Some(ProductRemoval::Deleted {
                    file_path,
                    image_paths,
                }))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn increment_downloads(&self, id: ProductId) -> Result<(), ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(archivos::table.find(id.get()))
            .set(archivos::descargas.eq(archivos::descargas + 1))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Row assembly coverage; queries run against embedded PostgreSQL in
    //! `tests/diesel_marketplace_repositories.rs`.
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn joined(id: i32, cents: i64) -> JoinedRow {
        (
            ProductRow {
                id_archivo: id,
                id_vendedor: 3,
                id_categoria: 1,
                id_extension: 2,
                nombre: "Plantilla CV".to_owned(),
                descripcion: None,
                precio_centavos: cents,
                ruta_archivo: format!("archivos/{id}.docx"),
                fecha_subida: Utc
                    .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
                    .single()
                    .expect("timestamp"),
                descargas: 4,
                activo: true,
            },
            9,
            "Lucía".to_owned(),
            "Plantillas".to_owned(),
            "docx".to_owned(),
        )
    }

    #[rstest]
    fn covers_attach_to_their_products() {
        let covers = HashMap::from([(1, "imagenes/a.png".to_owned())]);
        let products = assemble(vec![joined(1, 1250), joined(2, 300)], covers).expect("valid");

        let [first, second] = products.as_slice() else {
            panic!("expected two products");
        };
        assert_eq!(first.cover_image.as_deref(), Some("imagenes/a.png"));
        assert_eq!(second.cover_image, None);
        assert_eq!(first.seller_user_id, UserId::new(9));
        assert_eq!(first.price.cents(), 1250);
    }

    #[rstest]
    fn negative_prices_are_query_errors() {
        let error = assemble(vec![joined(1, -5)], HashMap::new()).expect_err("negative price");
        assert!(matches!(error, ProductRepositoryError::Query { .. }));
    }
}
