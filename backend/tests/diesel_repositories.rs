//! Diesel repositories against embedded PostgreSQL.
//!
//! Covers the behaviour that only the database can enforce: seeded system
//! rows, reference guards on deletes, gallery cover bookkeeping, and unique
//! payment references.

use diesel::pg::PgConnection;
use diesel::sql_types::{BigInt, Integer};
use diesel::{Connection, QueryableByName, RunQueryDsl};
use futures_util::future::join_all;
use mercado::domain::ports::{
    CatalogDeletion, CatalogRepository, ImageRepository, ProductRepository,
    TransactionRepository, TransactionRepositoryError, UserDeletion, UserRepository,
};
use mercado::domain::{
    CatalogKind, CatalogName, ImageId, NewProduct, NewProductImage, NewTransaction, Price,
    ProductDraft, ProductRemoval, STATUS_COMPLETED, STATUS_PENDING, User, UserRole,
};
use mercado::domain::{CatalogId, NewUser, Product, UserChanges};
use mercado::outbound::persistence::{
    DbPool, DieselCatalogRepository, DieselImageRepository, DieselProductRepository,
    DieselTransactionRepository, DieselUserRepository, PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::database_or_skip;

struct Context {
    runtime: Runtime,
    catalogs: DieselCatalogRepository,
    users: DieselUserRepository,
    products: DieselProductRepository,
    images: DieselImageRepository,
    transactions: DieselTransactionRepository,
    database: TemporaryDatabase,
}

#[fixture]
fn context() -> Option<Context> {
    let database = database_or_skip()?;
    let runtime = Runtime::new().expect("runtime");
    let pool = runtime
        .block_on(DbPool::new(
            PoolConfig::new(database.url().to_string()).with_max_size(8),
        ))
        .expect("pool");
    Some(Context {
        runtime,
        catalogs: DieselCatalogRepository::new(pool.clone()),
        users: DieselUserRepository::new(pool.clone()),
        products: DieselProductRepository::new(pool.clone()),
        images: DieselImageRepository::new(pool.clone()),
        transactions: DieselTransactionRepository::new(pool),
        database,
    })
}

#[derive(QueryableByName)]
struct RoleRows {
    #[diesel(sql_type = BigInt)]
    vendedores: i64,
    #[diesel(sql_type = BigInt)]
    clientes: i64,
}

fn price(cents: i64) -> Price {
    Price::from_cents(cents).expect("valid price")
}

impl Context {
    async fn user(&self, email: &str, role: UserRole) -> User {
        self.users
            .create(&NewUser {
                name: email.to_owned(),
                email: email.to_owned(),
                password_hash: "$2b$04$not-a-real-hash".to_owned(),
                birth_date: None,
                gender_id: None,
                role,
            })
            .await
            .expect("create user")
    }

    async fn catalog(&self, kind: CatalogKind, name: &str) -> CatalogId {
        let name = CatalogName::parse(kind, name).expect("valid name");
        self.catalogs
            .create(kind, &name)
            .await
            .expect("create catalog row")
            .id
    }

    async fn product(&self, seller: &User, cents: i64) -> Product {
        let category_id = self.catalog(CatalogKind::Category, "Plantillas").await;
        let extension_id = self.catalog(CatalogKind::Extension, "docx").await;
        self.products
            .create(&NewProduct {
                seller_user_id: seller.id,
                draft: ProductDraft {
                    name: "Plantilla de CV".to_owned(),
                    description: None,
                    price: price(cents),
                    category_id,
                    extension_id,
                },
                file_path: "archivos/cv.docx".to_owned(),
            })
            .await
            .expect("create product")
    }

    /// Count the `vendedor` and `cliente` rows owned by `user`.
    fn role_rows(&self, user: &User) -> (i64, i64) {
        let mut conn = PgConnection::establish(self.database.url()).expect("connect");
        let rows: RoleRows = diesel::sql_query(
            "SELECT (SELECT COUNT(*) FROM vendedor WHERE id_usuario = $1) AS vendedores, \
                    (SELECT COUNT(*) FROM cliente WHERE id_usuario = $1) AS clientes",
        )
        .bind::<Integer, _>(user.id.get())
        .get_result(&mut conn)
        .expect("count role rows");
        (rows.vendedores, rows.clientes)
    }

    async fn purchase(&self, buyer: &User, product: &Product, reference: &str) {
        let paypal = self
            .catalogs
            .find_by_name(CatalogKind::PaymentMethod, "PayPal")
            .await
            .expect("lookup")
            .expect("seeded PayPal row");
        self.transactions
            .create(&NewTransaction {
                buyer_id: buyer.id,
                payment_method_id: paypal.id,
                status_id: STATUS_COMPLETED,
                total: product.price,
                reference: Some(reference.to_owned()),
                lines: vec![(product.id, product.price)],
            })
            .await
            .expect("create transaction");
    }
}

#[rstest]
fn seeded_system_rows_are_present(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        let roles = ctx.catalogs.list(CatalogKind::UserType).await.expect("roles");
        assert_eq!(roles.len(), 4);
        let statuses = ctx
            .catalogs
            .list(CatalogKind::TransactionStatus)
            .await
            .expect("statuses");
        assert!(statuses.iter().any(|row| row.id == STATUS_PENDING));
        assert!(statuses.iter().any(|row| row.id == STATUS_COMPLETED && row.name == "Completada"));
    });
}

#[rstest]
fn registration_and_promotion_create_role_rows(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        let seller = ctx.user("tienda@mercado.test", UserRole::Seller).await;
        assert_eq!(ctx.role_rows(&seller), (1, 0));

        let client = ctx.user("comprador@mercado.test", UserRole::Client).await;
        assert_eq!(ctx.role_rows(&client), (0, 1));

        let promoted = ctx
            .users
            .update(
                client.id,
                &UserChanges {
                    role: Some(UserRole::Seller),
                    ..UserChanges::default()
                },
            )
            .await
            .expect("update")
            .expect("user exists");
        assert_eq!(promoted.role, UserRole::Seller);
        assert_eq!(ctx.role_rows(&client), (1, 1));
    });
}

#[rstest]
fn referenced_catalog_rows_cannot_be_deleted(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        let seller = ctx.user("vendedora@mercado.test", UserRole::Seller).await;
        let product = ctx.product(&seller, 500).await;

        let outcome = ctx
            .catalogs
            .delete_unreferenced(CatalogKind::Category, product.category_id)
            .await
            .expect("delete attempt");
        assert_eq!(outcome, CatalogDeletion::Referenced { count: 1 });

        let unused = ctx.catalog(CatalogKind::Category, "Sin uso").await;
        let outcome = ctx
            .catalogs
            .delete_unreferenced(CatalogKind::Category, unused)
            .await
            .expect("delete unused");
        assert_eq!(outcome, CatalogDeletion::Deleted);
    });
}

#[rstest]
fn first_image_is_cover_and_removal_promotes_the_next(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        let seller = ctx.user("galeria@mercado.test", UserRole::Seller).await;
        let product = ctx.product(&seller, 900).await;

        let mut added = Vec::new();
        for name in ["a.png", "b.png", "c.png"] {
            let image = ctx
                .images
                .add(&NewProductImage {
                    product_id: product.id,
                    path: format!("imagenes/{name}"),
                    order: None,
                    is_cover: false,
                })
                .await
                .expect("add image");
            added.push(image);
        }
        let covers: Vec<bool> = added.iter().map(|image| image.is_cover).collect();
        assert_eq!(covers, vec![true, false, false]);

        let order: Vec<ImageId> = added.iter().rev().map(|image| image.id).collect();
        let reordered = ctx
            .images
            .reorder(product.id, &order)
            .await
            .expect("reorder");
        let listed: Vec<ImageId> = reordered.iter().map(|image| image.id).collect();
        assert_eq!(listed, order);

        let removal = ctx
            .images
            .remove(added[0].id)
            .await
            .expect("remove")
            .expect("image existed");
        assert_eq!(removal.path, "imagenes/a.png");
        assert!(removal.promoted.is_some());

        let remaining = ctx
            .images
            .list_for_product(product.id)
            .await
            .expect("list");
        assert_eq!(remaining.iter().filter(|image| image.is_cover).count(), 1);
    });
}

#[rstest]
fn concurrent_first_uploads_leave_one_cover(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        let seller = ctx.user("concurrente@mercado.test", UserRole::Seller).await;
        let product = ctx.product(&seller, 300).await;

        let uploads = (0..8).map(|n| {
            let images = ctx.images.clone();
            let image = NewProductImage {
                product_id: product.id,
                path: format!("imagenes/{n}.png"),
                order: None,
                is_cover: false,
            };
            async move { images.add(&image).await }
        });
        for outcome in join_all(uploads).await {
            outcome.expect("add image");
        }

        let gallery = ctx
            .images
            .list_for_product(product.id)
            .await
            .expect("list");
        assert_eq!(gallery.len(), 8);
        assert_eq!(gallery.iter().filter(|image| image.is_cover).count(), 1);
    });
}

#[rstest]
fn purchases_guard_references_and_product_removal(context: Option<Context>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        let seller = ctx.user("autor@mercado.test", UserRole::Seller).await;
        let buyer = ctx.user("lector@mercado.test", UserRole::Client).await;
        let product = ctx.product(&seller, 1250).await;

        assert!(
            !ctx.transactions
                .has_completed_purchase(buyer.id, product.id)
                .await
                .expect("check")
        );
        ctx.purchase(&buyer, &product, "ORDER-1").await;
        assert!(
            ctx.transactions
                .has_completed_purchase(buyer.id, product.id)
                .await
                .expect("check")
        );

        let duplicate = ctx
            .transactions
            .create(&NewTransaction {
                buyer_id: buyer.id,
                payment_method_id: CatalogId::new(1),
                status_id: STATUS_COMPLETED,
                total: product.price,
                reference: Some("ORDER-1".to_owned()),
                lines: vec![(product.id, product.price)],
            })
            .await;
        assert!(matches!(
            duplicate,
            Err(TransactionRepositoryError::DuplicateReference { .. })
        ));

        let removal = ctx
            .products
            .remove(product.id)
            .await
            .expect("remove")
            .expect("product existed");
        assert_eq!(removal, ProductRemoval::Deactivated);
        let hidden = ctx
            .products
            .find(product.id)
            .await
            .expect("find")
            .expect("row kept");
        assert!(!hidden.active);

        let deletion = ctx
            .users
            .delete_unreferenced(buyer.id)
            .await
            .expect("delete attempt");
        assert_eq!(
            deletion,
            UserDeletion::Referenced {
                products: 0,
                transactions: 1
            }
        );
    });
}
