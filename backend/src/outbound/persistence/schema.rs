//! Diesel table definitions for the marketplace schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate them with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// User roles. Rows 1-4 are seeded and referenced by id.
    tipo_usuarios (id_tipo_usuario) {
        id_tipo_usuario -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    /// User genders.
    genero_usuario (id_genero) {
        id_genero -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    /// Product categories.
    categoria_archivo (id_categoria) {
        id_categoria -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    /// Product file extensions, stored lower case without a dot.
    extension_archivo (id_extension) {
        id_extension -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    /// Payment methods.
    metodos_pago (id_metodo_pago) {
        id_metodo_pago -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    /// Purchase statuses. Rows 1-4 are seeded and referenced by id.
    estado_transaccion (id_estado) {
        id_estado -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    /// Registered accounts.
    usuarios (id_usuario) {
        id_usuario -> Int4,
        nombre -> Varchar,
        /// Lower-cased, unique.
        email -> Varchar,
        /// bcrypt hash.
        contrasena -> Varchar,
        fecha_nacimiento -> Nullable<Date>,
        fecha_registro -> Timestamptz,
        id_tipo_usuario -> Int4,
        id_genero -> Nullable<Int4>,
    }
}

diesel::table! {
    /// Seller extension row; one per user that has ever sold.
    vendedor (id_vendedor) {
        id_vendedor -> Int4,
        id_usuario -> Int4,
        fecha_alta -> Timestamptz,
    }
}

diesel::table! {
    /// Client extension row.
    cliente (id_cliente) {
        id_cliente -> Int4,
        id_usuario -> Int4,
        fecha_alta -> Timestamptz,
    }
}

diesel::table! {
    /// Products listed for sale.
    archivos (id_archivo) {
        id_archivo -> Int4,
        id_vendedor -> Int4,
        id_categoria -> Int4,
        id_extension -> Int4,
        nombre -> Varchar,
        descripcion -> Nullable<Text>,
        precio_centavos -> Int8,
        /// Path relative to the uploads directory.
        ruta_archivo -> Varchar,
        fecha_subida -> Timestamptz,
        descargas -> Int4,
        activo -> Bool,
    }
}

diesel::table! {
    /// Product gallery images.
    imagenes_archivo (id_imagen) {
        id_imagen -> Int4,
        id_archivo -> Int4,
        ruta_imagen -> Varchar,
        orden -> Int4,
        es_portada -> Bool,
        fecha_subida -> Timestamptz,
    }
}

diesel::table! {
    /// Purchase headers.
    transacciones (id_transaccion) {
        id_transaccion -> Int4,
        id_usuario -> Int4,
        id_metodo_pago -> Int4,
        id_estado -> Int4,
        total_centavos -> Int8,
        /// Unique when present (partial index).
        referencia_pago -> Nullable<Varchar>,
        fecha_transaccion -> Timestamptz,
    }
}

diesel::table! {
    /// Purchase line items.
    detalle_transaccion (id_detalle) {
        id_detalle -> Int4,
        id_transaccion -> Int4,
        id_archivo -> Int4,
        precio_unitario_centavos -> Int8,
    }
}

diesel::joinable!(usuarios -> tipo_usuarios (id_tipo_usuario));
diesel::joinable!(usuarios -> genero_usuario (id_genero));
diesel::joinable!(vendedor -> usuarios (id_usuario));
diesel::joinable!(cliente -> usuarios (id_usuario));
diesel::joinable!(archivos -> vendedor (id_vendedor));
diesel::joinable!(archivos -> categoria_archivo (id_categoria));
diesel::joinable!(archivos -> extension_archivo (id_extension));
diesel::joinable!(imagenes_archivo -> archivos (id_archivo));
diesel::joinable!(transacciones -> usuarios (id_usuario));
diesel::joinable!(transacciones -> metodos_pago (id_metodo_pago));
diesel::joinable!(transacciones -> estado_transaccion (id_estado));
diesel::joinable!(detalle_transaccion -> transacciones (id_transaccion));
diesel::joinable!(detalle_transaccion -> archivos (id_archivo));

diesel::allow_tables_to_appear_in_same_query!(
    tipo_usuarios,
    genero_usuario,
    categoria_archivo,
    extension_archivo,
    metodos_pago,
    estado_transaccion,
    usuarios,
    vendedor,
    cliente,
    archivos,
    imagenes_archivo,
    transacciones,
    detalle_transaccion,
);
