use common::{Product, ProductId, User, UserId};

/// Predicate over user documents.
///
/// Every field that is set is a condition. By default all conditions must
/// hold; `any_of` switches to matching documents that satisfy at least one,
/// which is how signup probes for an already-used email or phone.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Filter by document id.
    pub user_id: Option<UserId>,

    /// Filter by exact email.
    pub email: Option<String>,

    /// Filter by exact phone number.
    pub phone: Option<String>,

    /// Match when any condition holds instead of all of them.
    pub match_any: bool,
}

impl UserFilter {
    /// Creates an empty filter matching every user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching a single user by id.
    pub fn by_id(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Match documents satisfying at least one condition.
    pub fn any_of(mut self) -> Self {
        self.match_any = true;
        self
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, user: &User) -> bool {
        let mut conditions = Vec::with_capacity(3);
        if let Some(id) = self.user_id {
            conditions.push(user.user_id == id);
        }
        if let Some(ref email) = self.email {
            conditions.push(&user.email == email);
        }
        if let Some(ref phone) = self.phone {
            conditions.push(&user.phone == phone);
        }

        if conditions.is_empty() {
            return true;
        }
        if self.match_any {
            conditions.into_iter().any(|c| c)
        } else {
            conditions.into_iter().all(|c| c)
        }
    }
}

/// Predicate over catalog products. All set conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Filter by product id.
    pub product_id: Option<ProductId>,

    /// Case-insensitive substring of the product name.
    pub name_contains: Option<String>,
}

impl ProductFilter {
    /// Creates an empty filter matching every product.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    pub fn name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into());
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(id) = self.product_id
            && product.product_id != id
        {
            return false;
        }
        if let Some(ref fragment) = self.name_contains
            && !product
                .product_name
                .to_lowercase()
                .contains(&fragment.to_lowercase())
        {
            return false;
        }
        true
    }
}
