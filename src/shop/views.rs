//! HTML views.
//!
//! One function per page, each returning the page body as [`Markup`];
//! [`layout`] wraps a body in the shared document shell. All interpolated
//! text is escaped by maud.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::store::{CartItem, Category, Money, Order, OrderLine, Product};

use super::Totals;

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/300x300";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;color:#1f2937}\
header{display:flex;justify-content:space-between;align-items:center;padding:1rem 2rem;background:#312e81}\
header a{color:#fff;text-decoration:none;margin-left:1rem}\
main{max-width:72rem;margin:0 auto;padding:2rem}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(14rem,1fr));gap:1.5rem}\
.card img{width:100%}\
.error{background:#fee2e2;color:#991b1b;padding:.75rem 1rem;border-radius:.375rem}\
table{width:100%;border-collapse:collapse}td,th{padding:.5rem;border-bottom:1px solid #e5e7eb;text-align:left}\
footer{text-align:center;color:#6b7280;padding:2rem}";

/// Data for the header and navigation shared by every page.
pub struct Chrome<'a> {
    pub app_name: &'a str,
    /// Base path prefix for in-app links.
    pub base: String,
    /// Display name of the logged-in customer.
    pub user: Option<&'a str>,
    pub cart_count: u32,
}

impl Chrome<'_> {
    fn href(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Wrap a page body in the site layout.
pub fn layout(chrome: &Chrome<'_>, title: &str, content: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - " (chrome.app_name) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header {
                    a href=(chrome.href("/")) { strong { (chrome.app_name) } }
                    nav {
                        a href=(chrome.href("/products")) { "Products" }
                        a href=(chrome.href("/categories")) { "Categories" }
                        a href=(chrome.href("/cart")) {
                            "Cart (" span id="cart-count" { (chrome.cart_count) } ")"
                        }
                        @if let Some(user) = chrome.user {
                            a href=(chrome.href("/orders")) { "Orders" }
                            a href=(chrome.href("/logout")) { "Log out " (user) }
                        } @else {
                            a href=(chrome.href("/login")) { "Log in" }
                            a href=(chrome.href("/register")) { "Register" }
                        }
                    }
                }
                main { (content) }
                footer { (chrome.app_name) }
            }
        }
    }
    .into_string()
}

fn image(url: Option<&str>, alt: &str) -> Markup {
    html! { img src=(url.unwrap_or(PLACEHOLDER_IMAGE)) alt=(alt); }
}

fn product_grid(base: &str, products: &[Product]) -> Markup {
    html! {
        @if products.is_empty() {
            p { "No products found." }
        } @else {
            div class="grid" {
                @for product in products {
                    div class="card" {
                        a href={ (base) "/product/" (product.id) } {
                            (image(product.image_url.as_deref(), &product.name))
                            h3 { (product.name) }
                        }
                        p { (product.price.to_string()) }
                    }
                }
            }
        }
    }
}

pub fn home(base: &str, products: &[Product], categories: &[Category]) -> Markup {
    html! {
        h1 { "New arrivals" }
        (product_grid(base, products))
        h2 { "Shop by category" }
        ul {
            @for category in categories {
                li { a href={ (base) "/category/" (category.id) } { (category.name) } }
            }
        }
    }
}

/// Current `/products` filter values, echoed back into the form.
pub struct ProductFilters<'a> {
    pub search: Option<&'a str>,
    pub sort: &'a str,
}

const SORT_OPTIONS: [(&str, &str); 4] = [
    ("newest", "Newest"),
    ("price_low", "Price: low to high"),
    ("price_high", "Price: high to low"),
    ("name", "Name"),
];

pub fn product_list(base: &str, products: &[Product], filters: &ProductFilters<'_>) -> Markup {
    html! {
        h1 { "Products" }
        form method="get" action={ (base) "/products" } {
            input type="text" name="search" placeholder="Search products..." value=(filters.search.unwrap_or(""));
            select name="sort" {
                @for (value, label) in SORT_OPTIONS {
                    option value=(value) selected[value == filters.sort] { (label) }
                }
            }
            button type="submit" { "Filter" }
        }
        p {
            "Showing " strong { (products.len()) } " results"
            @if let Some(search) = filters.search {
                " for \"" strong { (search) } "\""
            }
        }
        (product_grid(base, products))
    }
}

pub fn product_page(base: &str, product: &Product) -> Markup {
    html! {
        div class="card" {
            (image(product.image_url.as_deref(), &product.name))
            h1 { (product.name) }
            p { strong { (product.price.to_string()) } }
            p { (product.description) }
            @if product.in_stock() {
                p { (product.stock_quantity) " in stock" }
                form method="post" action={ (base) "/cart/add" } {
                    input type="hidden" name="product_id" value=(product.id);
                    input type="number" name="quantity" value="1" min="1";
                    button type="submit" data-product-id=(product.id) { "Add to cart" }
                }
            } @else {
                p class="error" { "Out of stock" }
            }
        }
    }
}

pub fn category_list(base: &str, categories: &[Category]) -> Markup {
    html! {
        h1 { "Categories" }
        @if categories.is_empty() {
            p { "No categories yet." }
        }
        div class="grid" {
            @for category in categories {
                div class="card" {
                    h3 { a href={ (base) "/category/" (category.id) } { (category.name) } }
                    p { (category.description) }
                }
            }
        }
    }
}

pub fn category_page(base: &str, category: &Category, subcategories: &[Category], products: &[Product]) -> Markup {
    html! {
        h1 { (category.name) }
        p { (category.description) }
        @if !subcategories.is_empty() {
            ul {
                @for sub in subcategories {
                    li { a href={ (base) "/category/" (sub.id) } { (sub.name) } }
                }
            }
        }
        (product_grid(base, products))
    }
}

fn summary(totals: &Totals) -> Markup {
    let row = |label: &str, amount: Money| html! { tr { th { (label) } td { (amount.to_string()) } } };
    html! {
        table {
            (row("Subtotal", totals.subtotal))
            (row("Shipping", totals.shipping))
            (row("Taxes", totals.tax))
            (row("Order total", totals.total))
        }
    }
}

pub fn cart_page(base: &str, items: &[CartItem], totals: &Totals) -> Markup {
    html! {
        h1 { "Your Shopping Cart" }
        @if items.is_empty() {
            h2 { "Your cart is empty" }
            a href={ (base) "/products" } { "Continue Shopping" }
        } @else {
            table {
                tr { th { "Product" } th { "Price" } th { "Quantity" } th { "Total" } }
                @for item in items {
                    tr id={ "cart-item-" (item.product_id) } {
                        td { a href={ (base) "/product/" (item.product_id) } { (item.name) } }
                        td { (item.price.to_string()) }
                        td { (item.quantity) }
                        td { (item.line_total().to_string()) }
                    }
                }
            }
            (summary(totals))
            a href={ (base) "/checkout" } { "Checkout" }
        }
    }
}

pub fn checkout_page(base: &str, items: &[CartItem], totals: &Totals) -> Markup {
    html! {
        h1 { "Checkout" }
        form id="checkout-form" method="post" action={ (base) "/order/create" } {
            label for="shipping_address" { "Shipping address" }
            textarea id="shipping_address" name="shipping_address" required {}
            label for="billing_address" { "Billing address (leave blank to use shipping)" }
            textarea id="billing_address" name="billing_address" {}
            select name="payment_method" {
                option value="credit_card" { "Credit Card" }
                option value="paypal" { "PayPal" }
            }
            button type="submit" { "Complete Order" }
        }
        ul {
            @for item in items {
                li { (item.name) " x " (item.quantity) " - " (item.line_total().to_string()) }
            }
        }
        (summary(totals))
        a href={ (base) "/cart" } { "Return to Cart" }
    }
}

pub fn order_list(base: &str, orders: &[Order]) -> Markup {
    html! {
        h1 { "Order History" }
        @if orders.is_empty() {
            p { "You have not placed any orders yet." }
        } @else {
            table {
                tr { th { "Order" } th { "Placed" } th { "Status" } th { "Total" } }
                @for order in orders {
                    tr {
                        td { a href={ (base) "/order/" (order.id) } { "Order #" (order.id) } }
                        td { (order.created_at.format("%B %-d, %Y").to_string()) }
                        td { (order.status.label()) }
                        td { (order.total_amount.to_string()) }
                    }
                }
            }
        }
    }
}

pub fn order_page(order: &Order, lines: &[OrderLine]) -> Markup {
    html! {
        h1 { "Order #" (order.id) }
        p { "Order placed on " (order.created_at.format("%B %-d, %Y at %-I:%M %p").to_string()) }
        p { "Status: " (order.status.label()) }
        table {
            @for line in lines {
                tr {
                    td { (image(line.image_url.as_deref(), &line.name)) }
                    td { (line.name) }
                    td { (line.quantity) " x " (line.unit_price.to_string()) }
                    td { (line.total_price.to_string()) }
                }
            }
        }
        p { "Total: " strong { (order.total_amount.to_string()) } }
        h3 { "Shipping address" }
        p { (order.shipping_address) }
        h3 { "Billing address" }
        p { (order.billing_address) }
        p { "Payment method: " (order.payment_method) }
    }
}

pub fn login_page(base: &str, error: Option<&str>) -> Markup {
    html! {
        h1 { "Sign in to your account" }
        form method="post" action={ (base) "/login" } {
            @if let Some(error) = error {
                p class="error" { (error) }
            }
            label for="email" { "Email address" }
            input id="email" name="email" type="email" required;
            label for="password" { "Password" }
            input id="password" name="password" type="password" required;
            button type="submit" { "Sign in" }
        }
        p { "New to our store? " a href={ (base) "/register" } { "Create an account" } }
    }
}

pub fn register_page(base: &str, error: Option<&str>) -> Markup {
    html! {
        h1 { "Create a new account" }
        form method="post" action={ (base) "/register" } {
            @if let Some(error) = error {
                p class="error" { (error) }
            }
            @for (name, label, kind) in [
                ("username", "Username", "text"),
                ("email", "Email address", "email"),
                ("first_name", "First Name", "text"),
                ("last_name", "Last Name", "text"),
                ("password", "Password", "password"),
                ("password_confirm", "Confirm Password", "password"),
            ] {
                label for=(name) { (label) }
                input id=(name) name=(name) type=(kind) required;
            }
            button type="submit" { "Sign up" }
        }
        p { "Already have an account? " a href={ (base) "/login" } { "Sign in" } }
    }
}

pub fn error(status: axum::http::StatusCode, message: &str, home: &str) -> Markup {
    html! {
        h1 { (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error")) }
        p class="error" { (message) }
        a href=(home) { "Back to the store" }
    }
}
