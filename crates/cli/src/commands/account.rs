//! Sign-in, registration and session inspection.

use secrecy::SecretString;
use sportgear_core::Email;
use sportgear_storefront::Storefront;
use sportgear_storefront::authz::{Decision, Route};
use sportgear_storefront::models::{ProfileUpdate, Registration};
use sportgear_storefront::sync::ViewScope;

use super::{AppError, signed_in};

pub struct RegisterArgs {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
}

pub async fn login(shop: &mut Storefront, email: &str, password: String) -> Result<(), AppError> {
    let email = Email::parse(email)?;
    let session = shop.login(&email, &SecretString::from(password)).await?;
    tracing::info!(
        "Signed in as {} ({})",
        session.user().display_name(),
        session.user().role().label()
    );
    Ok(())
}

pub async fn register(shop: &mut Storefront, args: RegisterArgs) -> Result<(), AppError> {
    let registration = Registration {
        email: Email::parse(&args.email)?,
        password: SecretString::from(args.password),
        first_name: args.first_name,
        last_name: args.last_name,
        phone_number: args.phone,
        date_of_birth: args.birth_date,
    };
    let session = shop.register(&registration).await?;
    tracing::info!("Account created, signed in as {}", session.user().display_name());
    Ok(())
}

pub async fn logout(shop: &mut Storefront) -> Result<(), AppError> {
    shop.logout().await?;
    tracing::info!("Signed out");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn whoami(shop: &Storefront) -> Result<(), AppError> {
    let session = signed_in(shop)?;
    let user = session.user();
    println!("{}", user.display_name());
    println!("  email: {}", user.email);
    if let Some(id) = user.id() {
        println!("  id:    {id}");
    }
    println!("  role:  {}", shop.session().role().label());
    Ok(())
}

pub async fn password(shop: &Storefront, current: String, new: String) -> Result<(), AppError> {
    let id = signed_in(shop)?.user().id().ok_or(AppError::NotSignedIn)?;
    shop.users(&ViewScope::new())
        .update_password(&id, &SecretString::from(current), &SecretString::from(new))
        .await?;
    tracing::info!("Password changed");
    Ok(())
}

pub async fn profile(shop: &mut Storefront, update: &ProfileUpdate) -> Result<(), AppError> {
    signed_in(shop)?;
    let session = shop.update_profile(&ViewScope::new(), update).await?;
    tracing::info!("Profile saved for {}", session.user().display_name());
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn access(shop: &Storefront, route: &str) -> Result<(), AppError> {
    let route: Route = route.parse()?;
    match shop.guard(route) {
        Decision::Allow => println!("{route}: allowed"),
        Decision::RedirectToLogin => println!("{route}: sign in required ({})", Route::Login),
        Decision::Denied { fallback } => {
            println!("{route}: access denied, go back to {fallback}");
        }
    }
    Ok(())
}
