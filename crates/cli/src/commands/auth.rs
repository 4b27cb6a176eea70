//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! cafe-cli status
//! cafe-cli login -e test1@test.com -p 123456
//! cafe-cli register -n "Test 1" -e test1@test.com -p 123456
//! cafe-cli logout
//! ```

use cafe_catalog_client::{Credentials, Registration};
use cafe_catalog_core::SessionStatus;
use tracing::info;

use super::{App, CliError};

/// Print the status of the persisted session.
#[allow(clippy::print_stdout)]
pub async fn status(app: &mut App) {
    app.restore().await;
    let state = app.session.state();

    match (&state.status, &state.user) {
        (SessionStatus::Authenticated, Some(user)) => {
            println!("{} as {} <{}> ({})", state.status, user.name, user.email, user.role);
        }
        _ => println!("{}", state.status),
    }
    println!("screens: {:?}", app.gate.group().screens());
}

/// Sign in and persist the token.
///
/// # Errors
///
/// Returns [`CliError::Authentication`] with the server's message on failure.
pub async fn login(app: &mut App, email: String, password: String) -> Result<(), CliError> {
    let credentials = Credentials::new(email, password);
    app.session.sign_in(&credentials).await;
    finish_authentication(app)
}

/// Register an account and persist the token.
///
/// # Errors
///
/// Returns [`CliError::Authentication`] with the server's message on failure.
pub async fn register(
    app: &mut App,
    name: String,
    email: String,
    password: String,
) -> Result<(), CliError> {
    let registration = Registration::new(name, email, password);
    app.session.sign_up(&registration).await;
    finish_authentication(app)
}

#[allow(clippy::print_stdout)]
fn finish_authentication(app: &mut App) -> Result<(), CliError> {
    let state = app.session.state();
    if state.has_error() {
        app.session.remove_error();
        return Err(CliError::Authentication(state.error_message));
    }

    app.gate.sync(state.status);
    if let Some(user) = state.user {
        println!("Signed in as {} <{}>", user.name, user.email);
    }
    Ok(())
}

/// Remove the persisted token.
///
/// # Errors
///
/// Returns the storage error if the token file could not be removed.
#[allow(clippy::print_stdout)]
pub async fn logout(app: &mut App) -> Result<(), CliError> {
    app.session.log_out().await?;
    app.gate.sync(app.session.status());
    info!(dir = %app.config.storage_dir.display(), "Session token removed");
    println!("Signed out");
    Ok(())
}
