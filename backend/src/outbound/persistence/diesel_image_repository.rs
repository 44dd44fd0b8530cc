//! PostgreSQL-backed `ImageRepository` implementation using Diesel ORM.
//!
//! Every mutation locks the parent `archivos` row before reading the gallery,
//! so concurrent uploads to an empty gallery serialise on the product rather
//! than each seeing "no cover". A partial unique index on
//! `imagenes_archivo (id_archivo) WHERE es_portada` backs the rule.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ImageRepository, ImageRepositoryError};
use crate::domain::{
    ImageChanges, ImageId, ImageRemoval, NewProductImage, ProductId, ProductImage,
};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ImageRow, NewImageRow};
use super::pool::{DbPool, PoolError};
use super::schema::{archivos, imagenes_archivo};

/// Diesel-backed implementation of the `ImageRepository` port.
#[derive(Clone)]
pub struct DieselImageRepository {
    pool: DbPool,
}

impl DieselImageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ImageRepositoryError {
    map_basic_pool_error(error, |message| ImageRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> ImageRepositoryError {
    map_basic_diesel_error(
        error,
        ImageRepositoryError::query,
        ImageRepositoryError::connection,
    )
}

impl From<ImageRow> for ProductImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: ImageId::new(row.id_imagen),
            product_id: ProductId::new(row.id_archivo),
            path: row.ruta_imagen,
            order: row.orden,
            is_cover: row.es_portada,
            uploaded_at: row.fecha_subida,
        }
    }
}

/// Lock the owning product row, then load its gallery in display order.
async fn lock_gallery(conn: &mut AsyncPgConnection, product_id: i32) -> QueryResult<Vec<ImageRow>> {
    archivos::table
        .find(product_id)
        .select(archivos::id_archivo)
        .for_update()
        .first::<i32>(conn)
        .await
        .optional()?;
    imagenes_archivo::table
        .filter(imagenes_archivo::id_archivo.eq(product_id))
        .select(ImageRow::as_select())
        .order_by((imagenes_archivo::orden.asc(), imagenes_archivo::id_imagen.asc()))
        .for_update()
        .load(conn)
        .await
}

/// Lock the gallery that owns `image_id`, returning the image and its
/// siblings.
async fn lock_gallery_of(
    conn: &mut AsyncPgConnection,
    image_id: i32,
) -> QueryResult<Option<(ImageRow, Vec<ImageRow>)>> {
    let product_id: Option<i32> = imagenes_archivo::table
        .find(image_id)
        .select(imagenes_archivo::id_archivo)
        .first(conn)
        .await
        .optional()?;
    let Some(product_id) = product_id else {
        return Ok(None);
    };
    let gallery = lock_gallery(conn, product_id).await?;
    let image = gallery.iter().find(|row| row.id_imagen == image_id).cloned();
    Ok(image.map(|image| (image, gallery)))
}

/// Make `image_id` the only cover of `product_id`.
async fn move_cover(
    conn: &mut AsyncPgConnection,
    product_id: i32,
    image_id: i32,
) -> QueryResult<()> {
    diesel::update(
        imagenes_archivo::table
            .filter(imagenes_archivo::id_archivo.eq(product_id))
            .filter(imagenes_archivo::id_imagen.ne(image_id))
            .filter(imagenes_archivo::es_portada.eq(true)),
    )
    .set(imagenes_archivo::es_portada.eq(false))
    .execute(conn)
    .await?;
    diesel::update(imagenes_archivo::table.find(image_id))
        .set(imagenes_archivo::es_portada.eq(true))
        .execute(conn)
        .await?;
    Ok(())
}

async fn reload(conn: &mut AsyncPgConnection, image_id: i32) -> QueryResult<ImageRow> {
    imagenes_archivo::table
        .find(image_id)
        .select(ImageRow::as_select())
        .first(conn)
        .await
}

/// Whether `order` lists exactly the ids in `gallery`.
fn is_permutation(gallery: &[ImageRow], order: &[i32]) -> bool {
    let mut current: Vec<i32> = gallery.iter().map(|row| row.id_imagen).collect();
    let mut requested = order.to_vec();
    current.sort_unstable();
    requested.sort_unstable();
    current == requested
}

/// Outcome of a reorder inside its transaction.
enum Reordered {
    Applied(Vec<ImageRow>),
    Mismatch,
}

#[async_trait]
impl ImageRepository for DieselImageRepository {
    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, ImageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ImageRow> = imagenes_archivo::table
            .filter(imagenes_archivo::id_archivo.eq(product_id.get()))
            .select(ImageRow::as_select())
            .order_by((imagenes_archivo::orden.asc(), imagenes_archivo::id_imagen.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ProductImage::from).collect())
    }

    async fn find(&self, id: ImageId) -> Result<Option<ProductImage>, ImageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = imagenes_archivo::table
            .find(id.get())
            .select(ImageRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(ProductImage::from))
    }

    async fn add(&self, image: &NewProductImage) -> Result<ProductImage, ImageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let product_id = image.product_id.get();

        let row = conn
            .transaction(|conn| {
                async move {
                    let gallery = lock_gallery(conn, product_id).await?;
                    let next_order = gallery
                        .iter()
                        .map(|row| row.orden)
                        .max()
                        .map_or(1, |last| last.saturating_add(1));
                    let has_cover = gallery.iter().any(|row| row.es_portada);
                    let is_cover = image.is_cover || !has_cover;

                    let inserted: ImageRow = diesel::insert_into(imagenes_archivo::table)
                        .values(NewImageRow {
                            id_archivo: product_id,
                            ruta_imagen: &image.path,
                            orden: image.order.unwrap_or(next_order),
                            es_portada: false,
                        })
                        .returning(ImageRow::as_returning())
                        .get_result(conn)
                        .await?;
                    if !is_cover {
                        return Ok(inserted);
                    }
                    move_cover(conn, product_id, inserted.id_imagen).await?;
                    reload(conn, inserted.id_imagen).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: ImageId,
        changes: ImageChanges,
    ) -> Result<Option<ProductImage>, ImageRepositoryError> {
        let image_id = id.get();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction(|conn| {
                async move {
                    let Some((image, _gallery)) = lock_gallery_of(conn, image_id).await? else {
                        return Ok(None);
                    };
                    if let Some(order) = changes.order {
                        diesel::update(imagenes_archivo::table.find(image_id))
                            .set(imagenes_archivo::orden.eq(order))
                            .execute(conn)
                            .await?;
                    }
                    match changes.is_cover {
                        Some(true) => move_cover(conn, image.id_archivo, image_id).await?,
                        // Clearing the flag is only honoured for non-cover images,
                        // which makes it a no-op.
                        Some(false) | None => {}
                    }
                    reload(conn, image_id).await.map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(row.map(ProductImage::from))
    }

    async fn set_cover(&self, id: ImageId) -> Result<Option<ProductImage>, ImageRepositoryError> {
        self.update(
            id,
            ImageChanges {
                order: None,
                is_cover: Some(true),
            },
        )
        .await
    }

    async fn reorder(
        &self,
        product_id: ProductId,
        order: &[ImageId],
    ) -> Result<Vec<ProductImage>, ImageRepositoryError> {
        let raw_product = product_id.get();
        let requested: Vec<i32> = order.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let gallery = lock_gallery(conn, raw_product).await?;
                    if !is_permutation(&gallery, &requested) {
                        return Ok(Reordered::Mismatch);
                    }
                    for (position, image_id) in (1_i32..).zip(requested.iter().copied()) {
                        diesel::update(imagenes_archivo::table.find(image_id))
                            .set(imagenes_archivo::orden.eq(position))
                            .execute(conn)
                            .await?;
                    }
                    lock_gallery(conn, raw_product).await.map(Reordered::Applied)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            Reordered::Applied(rows) => Ok(rows.into_iter().map(ProductImage::from).collect()),
            Reordered::Mismatch => Err(ImageRepositoryError::order_mismatch()),
        }
    }

    async fn remove(&self, id: ImageId) -> Result<Option<ImageRemoval>, ImageRepositoryError> {
        let image_id = id.get();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let Some((image, gallery)) = lock_gallery_of(conn, image_id).await? else {
                    return Ok(None);
                };
                diesel::delete(imagenes_archivo::table.find(image_id))
                    .execute(conn)
                    .await?;

                let mut promoted = None;
                if image.es_portada {
                    let successor = gallery.iter().find(|row| row.id_imagen != image_id);
                    if let Some(successor) = successor {
                        move_cover(conn, image.id_archivo, successor.id_imagen).await?;
                        promoted = Some(ImageId::new(successor.id_imagen));
                    }
                }
                Ok(Some(ImageRemoval {
                    path: image.ruta_imagen,
                    promoted,
                }))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn row(id: i32) -> ImageRow {
        ImageRow {
            id_imagen: id,
            id_archivo: 1,
            ruta_imagen: format!("imagenes/{id}.png"),
            orden: id,
            es_portada: id == 1,
            fecha_subida: Utc
                .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
                .single()
                .expect("timestamp"),
        }
    }

    #[rstest]
    #[case(&[3, 1, 2], true)]
    #[case(&[1, 2], false)]
    #[case(&[1, 2, 2], false)]
    #[case(&[1, 2, 3, 4], false)]
    fn reorder_requires_every_image_once(#[case] order: &[i32], #[case] expected: bool) {
        let gallery = vec![row(1), row(2), row(3)];
        assert_eq!(is_permutation(&gallery, order), expected);
    }

    #[rstest]
    fn rows_convert_to_domain_images() {
        let image = ProductImage::from(row(1));
        assert_eq!(image.id, ImageId::new(1));
        assert!(image.is_cover);
        assert_eq!(image.path, "imagenes/1.png");
    }
}
