//! Sample aggregates shared by service and handler tests.

use chrono::{TimeZone, Utc};

use crate::domain::{
    Actor, CatalogId, DetailId, ImageId, Price, Product, ProductId, ProductImage, SellerId,
    Transaction, TransactionDetail, TransactionId, User, UserId, UserRole,
};

pub(crate) fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn price(cents: i64) -> Price {
    Price::from_cents(cents).expect("non-negative price")
}

pub(crate) fn user(id: i32, role: UserRole) -> User {
    User {
        id: UserId::new(id),
        name: format!("Usuario {id}"),
        email: format!("usuario{id}@example.com"),
        birth_date: None,
        registered_at: timestamp(),
        role,
        gender_id: None,
    }
}

pub(crate) fn actor(id: i32, role: UserRole) -> Actor {
    Actor {
        id: UserId::new(id),
        role,
    }
}

pub(crate) fn product(id: i32, seller_user_id: i32, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        seller_id: SellerId::new(seller_user_id),
        seller_user_id: UserId::new(seller_user_id),
        seller_name: format!("Usuario {seller_user_id}"),
        category_id: CatalogId::new(1),
        category_name: "Plantillas".to_owned(),
        extension_id: CatalogId::new(1),
        extension_name: "pdf".to_owned(),
        name: format!("Archivo {id}"),
        description: None,
        price: price(cents),
        file_path: format!("archivos/{id}.pdf"),
        uploaded_at: timestamp(),
        downloads: 0,
        active: true,
        cover_image: None,
    }
}

pub(crate) fn image(id: i32, product_id: i32, order: i32, is_cover: bool) -> ProductImage {
    ProductImage {
        id: ImageId::new(id),
        product_id: ProductId::new(product_id),
        path: format!("imagenes/{id}.png"),
        order,
        is_cover,
        uploaded_at: timestamp(),
    }
}

pub(crate) fn detail(id: i32, transaction_id: i32, product_id: i32, cents: i64) -> TransactionDetail {
    TransactionDetail {
        id: DetailId::new(id),
        transaction_id: TransactionId::new(transaction_id),
        product_id: ProductId::new(product_id),
        product_name: format!("Archivo {product_id}"),
        unit_price: price(cents),
    }
}

pub(crate) fn transaction(id: i32, buyer_id: i32, details: Vec<TransactionDetail>) -> Transaction {
    let total = details
        .iter()
        .fold(Price::ZERO, |sum, line| {
            sum.checked_add(line.unit_price).expect("total fits")
        });
    Transaction {
        id: TransactionId::new(id),
        buyer_id: UserId::new(buyer_id),
        buyer_name: format!("Usuario {buyer_id}"),
        payment_method_id: CatalogId::new(1),
        payment_method_name: "PayPal".to_owned(),
        status_id: CatalogId::new(1),
        status_name: "Pendiente".to_owned(),
        total,
        reference: None,
        created_at: timestamp(),
        details,
    }
}
