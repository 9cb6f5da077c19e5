//! Fixtures shared by the unit tests.

use chrono::Utc;
use common::{Address, AddressId, Money, Product, ProductId, User, UserId, UserProfile};
use document_store::{DocumentStore, InMemoryDocumentStore};

pub(crate) async fn seed_user(store: &InMemoryDocumentStore) -> UserId {
    let user = User::new(
        UserProfile {
            first_name: "Test".to_string(),
            last_name: "Shopper".to_string(),
            email: format!("{}@example.com", UserId::new()),
            phone: UserId::new().to_string(),
        },
        Utc::now(),
    );
    let user_id = user.user_id;
    store.insert_user(user).await.unwrap();
    user_id
}

pub(crate) async fn seed_product(store: &InMemoryDocumentStore, name: &str, cents: i64) -> Product {
    let product = Product {
        product_id: ProductId::new(),
        product_name: name.to_string(),
        price: Money::from_cents(cents),
        rating: None,
        image: format!("{}.png", name.to_lowercase()),
    };
    store.insert_product(product.clone()).await.unwrap();
    product
}

pub(crate) fn address(city: &str) -> Address {
    Address {
        address_id: AddressId::new(),
        house_name: "221B".to_string(),
        street_name: "Baker Street".to_string(),
        city_name: city.to_string(),
        pin_code: "NW1".to_string(),
    }
}
