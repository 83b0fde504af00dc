//! Normalization of backend wire shapes into core types.
//!
//! Categories are canonicalized to the object form; a product's image list
//! is taken from `images`, falling back to a single `image` field.

use fitsupply_core::{Category, Order, OrderCustomer, OrderItem, Price, Product};

use super::wire::{CategoryWire, CategoryWrite, ImageWire, OrderItemWire, OrderWire, ProductWire};

/// Convert a backend category to the canonical object form.
#[must_use]
pub fn convert_category(wire: CategoryWire) -> Category {
    match wire {
        CategoryWire::Embedded { id, name, slug } => Category { id, name, slug },
        CategoryWire::Named(name) => Category::named(name),
    }
}

/// Reference a category in a product write; `None` for a blank name
/// without an id.
#[must_use]
pub fn category_write(category: &Category) -> Option<CategoryWrite> {
    match category.id {
        Some(id) => Some(CategoryWrite::Id(id)),
        None => {
            let name = category.name.trim();
            (!name.is_empty()).then(|| CategoryWrite::Name(name.to_owned()))
        }
    }
}

/// Convert a backend product to the canonical read-only projection.
#[must_use]
pub fn convert_product(wire: ProductWire) -> Product {
    let mut images: Vec<String> = wire
        .images
        .unwrap_or_default()
        .into_iter()
        .filter_map(image_url)
        .collect();
    if images.is_empty() {
        images.extend(wire.image.filter(|url| !url.trim().is_empty()));
    }

    Product {
        id: wire.id,
        slug: wire.slug,
        name: wire.name,
        description: wire.description.unwrap_or_default(),
        short_description: wire.short_description.filter(|s| !s.trim().is_empty()),
        price: wire.price,
        compare_price: wire.compare_price,
        stock_quantity: wire.stock_quantity,
        low_stock_threshold: wire
            .low_stock_threshold
            .unwrap_or(Product::DEFAULT_LOW_STOCK_THRESHOLD),
        sku: wire.sku.filter(|s| !s.trim().is_empty()),
        category: wire.category.map(convert_category),
        images,
        is_active: wire.is_active,
        is_featured: wire.is_featured,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
    }
}

fn image_url(image: ImageWire) -> Option<String> {
    let url = match image {
        ImageWire::Url(url) => Some(url),
        ImageWire::Object { image, url } => image.or(url),
    }?;
    (!url.trim().is_empty()).then_some(url)
}

/// Convert a backend order.
#[must_use]
pub fn convert_order(wire: OrderWire) -> Order {
    Order {
        id: wire.id,
        order_number: wire.order_number,
        customer: wire.user.map(|user| OrderCustomer {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
        status: wire.status,
        total_amount: wire.total_amount,
        shipping_address: wire.shipping_address,
        billing_address: wire.billing_address,
        payment_method: wire.payment_method,
        notes: wire.notes.unwrap_or_default(),
        created_at: wire.created_at,
        updated_at: wire.updated_at,
        items: wire.items.into_iter().map(convert_order_item).collect(),
    }
}

fn convert_order_item(wire: OrderItemWire) -> OrderItem {
    let subtotal = wire
        .subtotal
        .unwrap_or_else(|| wire.price_at_time * wire.quantity);
    let (product_id, product_name, product_image) = match wire.product {
        Some(product) => (
            Some(product.id),
            wire.product_name.unwrap_or(product.name),
            product.image,
        ),
        None => (wire.product_id, wire.product_name.unwrap_or_default(), None),
    };

    OrderItem {
        id: wire.id,
        product_id,
        product_name,
        product_image,
        quantity: wire.quantity,
        price_at_time: wire.price_at_time,
        subtotal: subtotal.max(Price::ZERO),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitsupply_core::{OrderStatus, ProductId};

    use super::*;

    fn product(json: &str) -> Product {
        convert_product(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_string_category_canonicalized() {
        let p = product(r#"{"id":1,"slug":"whey","name":"Whey","price":"29.99","category":"Protein"}"#);
        assert_eq!(p.category, Some(Category::named("Protein")));
        assert_eq!(p.low_stock_threshold, Product::DEFAULT_LOW_STOCK_THRESHOLD);
        assert!(p.is_active);
    }

    #[test]
    fn test_object_category_kept() {
        let p = product(
            r#"{"id":1,"slug":"whey","name":"Whey","price":29.99,
                "category":{"id":4,"name":"Protein","slug":"protein"}}"#,
        );
        let category = p.category.unwrap();
        assert_eq!(category.slug.as_deref(), Some("protein"));
        assert_eq!(p.price, Price::from_cents(2999));
    }

    #[test]
    fn test_single_image_fallback() {
        let p = product(
            r#"{"id":1,"slug":"w","name":"W","price":"1.00","images":[],"image":"/media/w.png"}"#,
        );
        assert_eq!(p.images, vec!["/media/w.png".to_string()]);

        let p = product(
            r#"{"id":1,"slug":"w","name":"W","price":"1.00",
                "images":[{"image":"/a.png"},"/b.png",{"url":""}],"image":"/c.png"}"#,
        );
        assert_eq!(p.images, vec!["/a.png".to_string(), "/b.png".to_string()]);
    }

    #[test]
    fn test_order_conversion() {
        let wire: OrderWire = serde_json::from_str(
            r#"{"id":9,"order_number":"FS-9","status":"shipped","total_amount":"54.00",
                "user":{"id":2,"username":"jdoe","email":"j@example.com"},
                "notes":null,
                "items":[{"id":1,"product":{"id":7,"name":"Whey","image":"/w.png"},
                          "quantity":2,"price_at_time":"25.00"}]}"#,
        )
        .unwrap();
        let order = convert_order(wire);
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.customer.as_ref().unwrap().username, "jdoe");
        assert_eq!(order.notes, "");
        let item = order.items.first().unwrap();
        assert_eq!(item.product_id, Some(ProductId::new(7)));
        assert_eq!(item.product_name, "Whey");
        assert_eq!(item.subtotal, Price::from_cents(5000));
    }
}
