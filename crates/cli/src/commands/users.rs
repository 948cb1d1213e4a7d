//! Account administration.

use sportgear_core::{AccountStatus, Role, UserId};
use sportgear_storefront::Storefront;
use sportgear_storefront::authz::Action;
use sportgear_storefront::models::UserFilters;
use sportgear_storefront::sync::ViewScope;

use super::{AppError, require};

#[allow(clippy::print_stdout)]
pub async fn list(shop: &Storefront, filters: &UserFilters) -> Result<(), AppError> {
    require(shop, Action::ManageUsers, "manage users")?;
    let scope = ViewScope::new();
    let users = shop.users(&scope).fetch_users(filters).await?;
    if users.is_empty() {
        println!("No users.");
    }
    for user in &users {
        println!(
            "{:<24} {:<32} {:<28} {:<19} {}",
            user.userid,
            user.email,
            user.full_name(),
            user.role,
            user.status,
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn set_role(shop: &Storefront, id: &UserId, role: Role) -> Result<(), AppError> {
    require(shop, Action::AssignRoles, "assign roles")?;
    let scope = ViewScope::new();
    shop.users(&scope).update_role(id, role).await?;
    println!("{id} is now {}", role.label());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn set_status(shop: &Storefront, id: &UserId, status: AccountStatus) -> Result<(), AppError> {
    require(shop, Action::ManageUsers, "manage users")?;
    let scope = ViewScope::new();
    shop.users(&scope).update_status(id, status).await?;
    println!("{id} is now {status}");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn stats(shop: &Storefront) -> Result<(), AppError> {
    require(shop, Action::ManageUsers, "manage users")?;
    let scope = ViewScope::new();
    let stats = shop.users(&scope).stats().await?;
    println!("{} accounts", stats.total);
    for (role, count) in &stats.role_stats {
        println!("  {role:<20} {count}");
    }
    for (status, count) in &stats.status_stats {
        println!("  {status:<20} {count}");
    }
    Ok(())
}
