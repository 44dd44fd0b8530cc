//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live next to
//! the repositories that need them.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{
    archivos, cliente, detalle_transaccion, imagenes_archivo, transacciones, usuarios, vendedor,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the `usuarios` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = usuarios)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id_usuario: i32,
    pub nombre: String,
    pub email: String,
    pub contrasena: String,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub fecha_registro: DateTime<Utc>,
    pub id_tipo_usuario: i32,
    pub id_genero: Option<i32>,
}

/// Insertable struct for registering users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = usuarios)]
pub(crate) struct NewUserRow<'a> {
    pub nombre: &'a str,
    pub email: &'a str,
    pub contrasena: &'a str,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub id_tipo_usuario: i32,
    pub id_genero: Option<i32>,
}

/// Partial profile update; `None` fields are skipped and `Some(None)` writes
/// NULL.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = usuarios)]
pub(crate) struct UserUpdate<'a> {
    pub nombre: Option<&'a str>,
    pub email: Option<&'a str>,
    pub fecha_nacimiento: Option<Option<NaiveDate>>,
    pub id_tipo_usuario: Option<i32>,
    pub id_genero: Option<Option<i32>>,
}

/// Insertable seller extension row.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = vendedor)]
pub(crate) struct NewSellerRow {
    pub id_usuario: i32,
}

/// Insertable client extension row.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = cliente)]
pub(crate) struct NewClientRow {
    pub id_usuario: i32,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Row struct for reading from the `archivos` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = archivos)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id_archivo: i32,
    pub id_vendedor: i32,
    pub id_categoria: i32,
    pub id_extension: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio_centavos: i64,
    pub ruta_archivo: String,
    pub fecha_subida: DateTime<Utc>,
    pub descargas: i32,
    pub activo: bool,
}

/// Insertable struct for new products.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = archivos)]
pub(crate) struct NewProductRow<'a> {
    pub id_vendedor: i32,
    pub id_categoria: i32,
    pub id_extension: i32,
    pub nombre: &'a str,
    pub descripcion: Option<&'a str>,
    pub precio_centavos: i64,
    pub ruta_archivo: &'a str,
}

/// Partial product update.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = archivos)]
pub(crate) struct ProductUpdate<'a> {
    pub nombre: Option<&'a str>,
    pub descripcion: Option<Option<&'a str>>,
    pub precio_centavos: Option<i64>,
    pub id_categoria: Option<i32>,
    pub id_extension: Option<i32>,
    pub activo: Option<bool>,
}

// ---------------------------------------------------------------------------
// Gallery images
// ---------------------------------------------------------------------------

/// Row struct for reading from the `imagenes_archivo` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = imagenes_archivo)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ImageRow {
    pub id_imagen: i32,
    pub id_archivo: i32,
    pub ruta_imagen: String,
    pub orden: i32,
    pub es_portada: bool,
    pub fecha_subida: DateTime<Utc>,
}

/// Insertable struct for gallery images.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = imagenes_archivo)]
pub(crate) struct NewImageRow<'a> {
    pub id_archivo: i32,
    pub ruta_imagen: &'a str,
    pub orden: i32,
    pub es_portada: bool,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Row struct for reading from the `transacciones` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transacciones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id_transaccion: i32,
    pub id_usuario: i32,
    pub id_metodo_pago: i32,
    pub id_estado: i32,
    pub total_centavos: i64,
    pub referencia_pago: Option<String>,
    pub fecha_transaccion: DateTime<Utc>,
}

/// Insertable transaction header.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transacciones)]
pub(crate) struct NewTransactionRow<'a> {
    pub id_usuario: i32,
    pub id_metodo_pago: i32,
    pub id_estado: i32,
    pub total_centavos: i64,
    pub referencia_pago: Option<&'a str>,
}

/// Row struct for reading from the `detalle_transaccion` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = detalle_transaccion)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DetailRow {
    pub id_detalle: i32,
    pub id_transaccion: i32,
    pub id_archivo: i32,
    pub precio_unitario_centavos: i64,
}

/// Insertable line item.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = detalle_transaccion)]
pub(crate) struct NewDetailRow {
    pub id_transaccion: i32,
    pub id_archivo: i32,
    pub precio_unitario_centavos: i64,
}
