//! Tests for the gallery service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::fixtures;
use crate::domain::ports::{
    ImageRepositoryError, MockFileStorage, MockImageRepository, MockProductRepository,
};
use crate::domain::{ErrorCode, ImageRemoval, UserRole};

type TestService = GalleryService<MockImageRepository, MockProductRepository, MockFileStorage>;

#[derive(Default)]
struct Mocks {
    images: MockImageRepository,
    products: MockProductRepository,
    storage: MockFileStorage,
}

impl Mocks {
    /// Product 5 owned by user 2.
    fn owned_product() -> Self {
        let mut mocks = Self::default();
        mocks
            .products
            .expect_find()
            .returning(|id| Ok(Some(fixtures::product(id.get(), 2, 100))));
        mocks
    }

    fn with_image(mut self, image: ProductImage) -> Self {
        self.images
            .expect_find()
            .returning(move |_| Ok(Some(image.clone())));
        self
    }

    fn build(self) -> TestService {
        GalleryService::new(
            Arc::new(self.images),
            Arc::new(self.products),
            Arc::new(self.storage),
        )
    }
}

fn seller() -> Actor {
    fixtures::actor(2, UserRole::Seller)
}

fn png() -> FileUpload {
    FileUpload {
        original_name: "portada.PNG".to_owned(),
        contents: vec![0x89, b'P', b'N', b'G'],
    }
}

#[rstest]
#[tokio::test]
async fn list_requires_existing_product() {
    let mut mocks = Mocks::default();
    mocks.products.expect_find().returning(|_| Ok(None));

    let error = mocks
        .build()
        .list(ProductId::new(5))
        .await
        .expect_err("missing product");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn add_stores_image_and_inserts_row() {
    let mut mocks = Mocks::owned_product();
    mocks
        .storage
        .expect_store()
        .withf(|area, _| *area == StorageArea::Images)
        .returning(|_, _| Ok("imagenes/new.png".to_owned()));
    mocks
        .images
        .expect_add()
        .withf(|image| image.path == "imagenes/new.png" && image.is_cover && image.order == Some(3))
        .returning(|_| Ok(fixtures::image(1, 5, 3, true)));

    let image = mocks
        .build()
        .add(
            seller(),
            ProductId::new(5),
            png(),
            ImagePlacement {
                order: Some(3),
                is_cover: true,
            },
        )
        .await
        .expect("image added");
    assert!(image.is_cover);
}

#[rstest]
#[case("notes.txt")]
#[case("noextension")]
#[tokio::test]
async fn add_rejects_non_images(#[case] name: &str) {
    let mut mocks = Mocks::owned_product();
    mocks.storage.expect_store().never();
    let upload = FileUpload {
        original_name: name.to_owned(),
        contents: vec![1],
    };

    let error = mocks
        .build()
        .add(seller(), ProductId::new(5), upload, ImagePlacement::default())
        .await
        .expect_err("not an image");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn add_requires_ownership() {
    let error = Mocks::owned_product()
        .build()
        .add(
            fixtures::actor(3, UserRole::Seller),
            ProductId::new(5),
            png(),
            ImagePlacement::default(),
        )
        .await
        .expect_err("not the owner");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn unsetting_the_cover_is_rejected() {
    let mut mocks = Mocks::owned_product().with_image(fixtures::image(1, 5, 0, true));
    mocks.images.expect_update().never();

    let error = mocks
        .build()
        .update(
            seller(),
            ImageId::new(1),
            ImageChanges {
                order: None,
                is_cover: Some(false),
            },
        )
        .await
        .expect_err("cover must remain");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_moves_image() {
    let mut mocks = Mocks::owned_product().with_image(fixtures::image(2, 5, 1, false));
    mocks
        .images
        .expect_update()
        .withf(|_, changes| changes.order == Some(0))
        .returning(|id, _| Ok(Some(fixtures::image(id.get(), 5, 0, false))));

    let image = mocks
        .build()
        .update(
            seller(),
            ImageId::new(2),
            ImageChanges {
                order: Some(0),
                is_cover: None,
            },
        )
        .await
        .expect("moved");
    assert_eq!(image.order, 0);
}

#[rstest]
#[tokio::test]
async fn set_cover_delegates_to_repository() {
    let mut mocks = Mocks::owned_product().with_image(fixtures::image(2, 5, 1, false));
    mocks
        .images
        .expect_set_cover()
        .times(1)
        .returning(|id| Ok(Some(fixtures::image(id.get(), 5, 1, true))));

    let image = mocks
        .build()
        .set_cover(fixtures::actor(1, UserRole::Admin), ImageId::new(2))
        .await
        .expect("cover set");
    assert!(image.is_cover);
}

#[rstest]
#[tokio::test]
async fn reorder_rejects_repeated_ids() {
    let mut mocks = Mocks::owned_product();
    mocks.images.expect_reorder().never();

    let error = mocks
        .build()
        .reorder(
            seller(),
            ProductId::new(5),
            vec![ImageId::new(1), ImageId::new(1)],
        )
        .await
        .expect_err("duplicate ids");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn reorder_surfaces_mismatch_as_bad_request() {
    let mut mocks = Mocks::owned_product();
    mocks
        .images
        .expect_reorder()
        .returning(|_, _| Err(ImageRepositoryError::order_mismatch()));

    let error = mocks
        .build()
        .reorder(seller(), ProductId::new(5), vec![ImageId::new(9)])
        .await
        .expect_err("foreign id");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn delete_removes_row_then_file() {
    let mut mocks = Mocks::owned_product().with_image(fixtures::image(1, 5, 0, true));
    mocks.images.expect_remove().returning(|_| {
        Ok(Some(ImageRemoval {
            path: "imagenes/1.png".to_owned(),
            promoted: Some(ImageId::new(2)),
        }))
    });
    mocks
        .storage
        .expect_remove()
        .withf(|path| path == "imagenes/1.png")
        .times(1)
        .returning(|_| Ok(()));

    mocks
        .build()
        .delete(seller(), ImageId::new(1))
        .await
        .expect("deleted");
}
