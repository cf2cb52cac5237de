use color_eyre::eyre::{bail, eyre, Result};
use portfolio::{
    setup::setup_tracing,
    state::setup_db_pool,
    user::{Admin, AdminUpsert},
};

/// Creates an admin account, or resets its password when the email already exists.
///
/// Usage: `ADMIN_PASSWORD=... create-admin <email>`
fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run())
}

async fn run() -> Result<()> {
    setup_tracing("create_admin")?;

    let email = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("Usage: create-admin <email> (password is read from ADMIN_PASSWORD)"))?;
    let password = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| eyre!("ADMIN_PASSWORD must be set"))?;

    if email.trim().is_empty() || password.is_empty() {
        bail!("Email and password must not be empty");
    }

    let database_url = std::env::var("DATABASE_URL").map_err(|_| eyre!("DATABASE_URL must be set"))?;
    let pool = setup_db_pool(&database_url).await?;

    let (admin, outcome) = Admin::upsert_with_password(&pool, &email, &password).await?;
    match outcome {
        AdminUpsert::Created => println!("Created admin {}", admin.email),
        AdminUpsert::PasswordReset => println!("Reset password for admin {}", admin.email),
    }

    Ok(())
}
