//! Login, registration and logout.
//!
//! Form errors are flashed into the session and shown once by the next
//! render of the form (post/redirect/get).

use crate::auth::{hash_password, verify_password};
use crate::http::context::RequestContext;
use crate::routing::{HandlerError, PathParams};
use crate::store::{NewUser, StoreError};

use super::{views, Shop};

const STORE_DOWN: &str = "Database error, please try again later";

fn field<'a>(ctx: &'a RequestContext, name: &str) -> &'a str {
    ctx.input(name).map(str::trim).unwrap_or("")
}

pub fn show_login(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let error = ctx.session.login_error.take();
    let content = views::login_page(&ctx.url(""), error.as_deref());
    shop.render(ctx, "Login", content);
    Ok(())
}

fn login_failed(ctx: &mut RequestContext, message: &str) {
    ctx.session.login_error = Some(message.to_string());
    let login = ctx.url("/login");
    ctx.redirect(&login);
}

pub fn login(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let email = field(ctx, "email").to_string();
    let password = ctx.input("password").unwrap_or("").to_string();
    if email.is_empty() || password.is_empty() {
        login_failed(ctx, "Email and password are required");
        return Ok(());
    }

    let user = match shop.db.find_user_by_email(&email) {
        Ok(user) => user,
        Err(StoreError::NotConnected) => {
            login_failed(ctx, STORE_DOWN);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    match user.filter(|u| verify_password(&password, &u.password_hash)) {
        Some(user) => {
            ctx.session.log_in(user.id, &user.username, user.display_name());
            ctx.session.login_error = None;
            let target = ctx
                .session
                .redirect_after_login
                .take()
                .unwrap_or_else(|| ctx.url("/"));
            tracing::info!(request_id = %ctx.request_id(), user_id = user.id, "Customer logged in");
            ctx.redirect(&target);
        }
        None => {
            tracing::info!(request_id = %ctx.request_id(), "Failed login attempt");
            login_failed(ctx, "Invalid email or password");
        }
    }
    Ok(())
}

pub fn show_register(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let error = ctx.session.register_error.take();
    let content = views::register_page(&ctx.url(""), error.as_deref());
    shop.render(ctx, "Register", content);
    Ok(())
}

fn register_failed(ctx: &mut RequestContext, message: &str) {
    ctx.session.register_error = Some(message.to_string());
    let register = ctx.url("/register");
    ctx.redirect(&register);
}

/// Check a registration form, returning the first problem found.
fn validate_registration(ctx: &RequestContext, min_password_len: usize) -> Result<(), String> {
    let required = ["username", "email", "first_name", "last_name"];
    let password = ctx.input("password").unwrap_or("");
    if required.iter().any(|name| field(ctx, name).is_empty()) || password.is_empty() {
        return Err("All fields are required".to_string());
    }
    if Some(password) != ctx.input("password_confirm") {
        return Err("Passwords do not match".to_string());
    }
    if password.chars().count() < min_password_len {
        return Err(format!("Password must be at least {min_password_len} characters"));
    }
    Ok(())
}

pub fn register(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    if let Err(message) = validate_registration(ctx, shop.settings.min_password_len) {
        register_failed(ctx, &message);
        return Ok(());
    }

    let new_user = NewUser {
        username: field(ctx, "username").to_string(),
        email: field(ctx, "email").to_string(),
        password_hash: hash_password(ctx.input("password").unwrap_or("")),
        first_name: field(ctx, "first_name").to_string(),
        last_name: field(ctx, "last_name").to_string(),
    };
    let username = new_user.username.clone();
    let display_name = format!("{} {}", new_user.first_name, new_user.last_name);

    match shop.db.create_user(new_user) {
        Ok(user_id) => {
            ctx.session.log_in(user_id, &username, display_name);
            ctx.session.register_error = None;
            tracing::info!(request_id = %ctx.request_id(), user_id, "Customer registered");
            let home = ctx.url("/");
            ctx.redirect(&home);
        }
        Err(StoreError::DuplicateUser) => register_failed(ctx, "Username or email already exists"),
        Err(StoreError::NotConnected) => register_failed(ctx, STORE_DOWN),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Clear the session and cart, and rotate the session id.
pub fn logout(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    match shop.db.clear_cart(ctx.session_id()) {
        Ok(()) | Err(StoreError::NotConnected) => {}
        Err(err) => return Err(err.into()),
    }
    ctx.session = Default::default();
    ctx.rotate_session();
    let home = ctx.url("/");
    ctx.redirect(&home);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop::testing::*;
    use crate::shop::{bind, Action, Shop, Surface};
    use crate::routing::Handler;
    use axum::http::{header, Method, StatusCode};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn submit(shop: &Arc<Shop>, action: Action, ctx: RequestContext, fields: &[(&str, &str)]) -> RequestContext {
        let input: HashMap<String, String> = fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let mut ctx = ctx.with_input(input);
        bind(shop, Surface::Page, action).call(&mut ctx, &PathParams::new()).unwrap();
        ctx
    }

    fn location(ctx: &RequestContext) -> &str {
        ctx.reply().headers.get(header::LOCATION).unwrap().to_str().unwrap()
    }

    const ADA: [(&str, &str); 6] = [
        ("username", "ada"),
        ("email", "ada@example.com"),
        ("first_name", "Ada"),
        ("last_name", "Lovelace"),
        ("password", "analytical"),
        ("password_confirm", "analytical"),
    ];

    #[test]
    fn test_register_logs_in() {
        let shop = shop();
        let ctx = submit(&shop, register, request(Method::POST, "/register"), &ADA);
        assert_eq!(location(&ctx), "/");
        assert!(ctx.session.is_authenticated());
        assert_eq!(ctx.session.display_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_register_errors_flash() {
        let shop = shop();
        let mut short = ADA;
        short[4].1 = "abc";
        short[5].1 = "abc";
        let ctx = submit(&shop, register, request(Method::POST, "/register"), &short);
        assert_eq!(location(&ctx), "/register");
        assert_eq!(
            ctx.session.register_error.as_deref(),
            Some("Password must be at least 6 characters")
        );

        let mut mismatch = ADA;
        mismatch[5].1 = "different";
        let ctx = submit(&shop, register, request(Method::POST, "/register"), &mismatch);
        assert_eq!(ctx.session.register_error.as_deref(), Some("Passwords do not match"));

        submit(&shop, register, request(Method::POST, "/register"), &ADA);
        let ctx = submit(&shop, register, request(Method::POST, "/register"), &ADA);
        assert_eq!(ctx.session.register_error.as_deref(), Some("Username or email already exists"));
    }

    #[test]
    fn test_flash_shown_once() {
        let shop = shop();
        let mut ctx = request(Method::GET, "/login");
        ctx.session.login_error = Some("Invalid email or password".into());
        let mut ctx = submit(&shop, show_login, ctx, &[]);
        assert!(ctx.reply().body.contains("Invalid email or password"));
        assert_eq!(ctx.session.login_error, None);

        bind(&shop, Surface::Page, show_login).call(&mut ctx, &PathParams::new()).unwrap();
        assert!(!ctx.reply().body.contains("Invalid email or password"));
    }

    #[test]
    fn test_login_returns_to_remembered_page() {
        let shop = shop();
        submit(&shop, register, request(Method::POST, "/register"), &ADA);

        let mut ctx = request(Method::POST, "/login");
        ctx.session.redirect_after_login = Some("/orders".into());
        let ctx = submit(
            &shop,
            login,
            ctx,
            &[("email", "ADA@example.com"), ("password", "analytical")],
        );
        assert_eq!(location(&ctx), "/orders");
        assert_eq!(ctx.session.redirect_after_login, None);
        assert!(ctx.session.is_authenticated());
    }

    #[test]
    fn test_login_wrong_password() {
        let shop = shop();
        submit(&shop, register, request(Method::POST, "/register"), &ADA);
        let ctx = submit(
            &shop,
            login,
            request(Method::POST, "/login"),
            &[("email", "ada@example.com"), ("password", "wrong")],
        );
        assert_eq!(location(&ctx), "/login");
        assert!(!ctx.session.is_authenticated());
        assert_eq!(ctx.session.login_error.as_deref(), Some("Invalid email or password"));
    }

    #[test]
    fn test_login_while_store_down_flashes() {
        let shop = offline_shop();
        let ctx = submit(
            &shop,
            login,
            request(Method::POST, "/login"),
            &[("email", "a@b.c"), ("password", "x")],
        );
        assert_eq!(ctx.reply().status, StatusCode::FOUND);
        assert_eq!(ctx.session.login_error.as_deref(), Some(STORE_DOWN));
    }

    #[test]
    fn test_logout_clears_session_and_cart() {
        let shop = shop();
        shop.db.add_to_cart("visitor", 1, 1).unwrap();
        let mut ctx = request(Method::GET, "/logout");
        ctx.session.log_in(1, "ada", "Ada Lovelace".into());
        let ctx = submit(&shop, logout, ctx, &[]);
        assert!(!ctx.session.is_authenticated());
        assert!(ctx.session_rotated());
        assert_eq!(shop.db.cart_item_count("visitor").unwrap(), 0);
    }
}
