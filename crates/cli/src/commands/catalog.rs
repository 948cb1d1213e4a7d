//! Catalog browsing.

use sportgear_core::{Money, ProductId, format_money};
use sportgear_storefront::Storefront;
use sportgear_storefront::authz::Action;
use sportgear_storefront::models::{ProductDisplay, ProductDraft, ProductFilters, ProductPatch};
use sportgear_storefront::sync::{ADMIN_PRODUCTS_POLL_INTERVAL, Poller, ViewScope};

use super::{AppError, require};

pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub sport: Option<String>,
    pub gender: Option<String>,
    pub stock: i64,
}

impl NewProduct {
    /// A product with no units left is listed as sold out.
    fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            brand: self.brand,
            sport: self.sport,
            gender: self.gender,
            in_stock: self.stock > 0,
            stock_quantity: self.stock.max(0),
        }
    }
}

pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub stock: Option<i64>,
}

impl ProductChanges {
    /// `None` when nothing would change.
    fn into_patch(self) -> Option<ProductPatch> {
        let patch = ProductPatch {
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            in_stock: self.stock.map(|stock| stock > 0),
            stock_quantity: self.stock.map(|stock| stock.max(0)),
        };
        let unchanged = patch.name.is_none()
            && patch.description.is_none()
            && patch.price.is_none()
            && patch.category.is_none()
            && patch.stock_quantity.is_none();
        (!unchanged).then_some(patch)
    }
}

pub async fn list(shop: &Storefront) -> Result<(), AppError> {
    search(shop, &ProductFilters::default()).await
}

pub async fn search(shop: &Storefront, filters: &ProductFilters) -> Result<(), AppError> {
    let scope = ViewScope::new();
    let products = shop.products(&scope).fetch_products(filters).await?;
    render(&products);
    Ok(())
}

/// Product management view: the full catalog, refreshed until Ctrl-C.
pub async fn watch(shop: &Storefront) -> Result<(), AppError> {
    require(shop, Action::ManageProducts, "manage products")?;
    let scope = ViewScope::new();
    let products = shop.products(&scope);
    let _poll = Poller::start(ADMIN_PRODUCTS_POLL_INTERVAL, &scope, move || {
        let products = products.clone();
        async move {
            match products.fetch_products(&ProductFilters::default()).await {
                Ok(list) => render(&list),
                Err(e) => tracing::warn!("Refresh failed: {e}"),
            }
        }
    });

    tracing::info!(
        "Watching the catalog every {}s, Ctrl-C to stop",
        ADMIN_PRODUCTS_POLL_INTERVAL.as_secs()
    );
    tokio::signal::ctrl_c().await?;
    scope.unmount();
    Ok(())
}

pub async fn create(shop: &Storefront, product: NewProduct) -> Result<(), AppError> {
    require(shop, Action::ManageProducts, "manage products")?;
    let draft = product.into_draft();
    let created = shop.products(&ViewScope::new()).create_product(&draft).await?;
    tracing::info!("Created product #{} {}", created.product.id, created.product.name);
    Ok(())
}

pub async fn update(shop: &Storefront, id: ProductId, changes: ProductChanges) -> Result<(), AppError> {
    require(shop, Action::ManageProducts, "manage products")?;
    let patch = changes.into_patch().ok_or(AppError::NothingToUpdate)?;
    let updated = shop.products(&ViewScope::new()).update_product(id, &patch).await?;
    tracing::info!(
        "Updated product #{} {} at {}",
        updated.product.id,
        updated.product.name,
        format_money(updated.product.price)
    );
    Ok(())
}

pub async fn delete(shop: &Storefront, id: ProductId) -> Result<(), AppError> {
    require(shop, Action::ManageProducts, "manage products")?;
    shop.products(&ViewScope::new()).delete_product(id).await?;
    tracing::info!("Deleted product #{id}");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn show(shop: &Storefront, id: ProductId) -> Result<(), AppError> {
    let scope = ViewScope::new();
    let product = shop.products(&scope).get_product(id).await?;

    println!("{} (#{})", product.name, product.id);
    println!("  price:    {}", format_money(product.price));
    println!("  category: {}", product.category);
    if let Some(brand) = &product.brand {
        println!("  brand:    {brand}");
    }
    if let Some(sport) = &product.sport {
        println!("  sport:    {sport}");
    }
    if product.in_stock {
        println!("  stock:    {}", product.stock_quantity);
    } else {
        println!("  stock:    sold out");
    }
    if let Some(description) = &product.description {
        println!();
        println!("{description}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn render(products: &[ProductDisplay]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for item in products {
        let stock = if item.in_stock_flag { "" } else { "  [sold out]" };
        println!(
            "{:>5}  {:<48} {:>12}  {}{stock}",
            item.product.id,
            item.product.name,
            format_money(item.product.price),
            "*".repeat(usize::from(item.rating)),
        );
    }
}
