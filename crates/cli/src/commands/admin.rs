//! Back-office user creation command.

use mybookstore_admin::db::users::{UserAdminRepository, UserInput};
use mybookstore_admin::services::auth::{generate_temporary_password, hash_password};
use mybookstore_core::Role;

use super::CommandError;

/// Create a back-office user and print its temporary password once.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for a bad role or a duplicate email.
pub async fn create_user(
    email: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
) -> Result<(), CommandError> {
    let role: Role = role
        .parse()
        .map_err(|e: String| CommandError::Invalid(e))?;
    if role == Role::Subscriber {
        return Err(CommandError::Invalid(
            "back-office users must be agent or admin; subscribers register on the site"
                .to_string(),
        ));
    }

    let pool = super::connect().await?;

    let password = generate_temporary_password();
    let hash =
        hash_password(&password).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let input = UserInput {
        email: email.trim().to_lowercase(),
        role,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        phone: None,
        address: None,
        city: None,
        postal_code: None,
    };

    let id = UserAdminRepository::new(&pool)
        .create(&input, &hash)
        .await
        .map_err(|e| CommandError::Invalid(e.to_string()))?;

    tracing::info!(user_id = %id, role = %role, "back-office user created");

    #[allow(clippy::print_stdout)]
    {
        println!("Created {role} user {} (id {id})", input.email);
        println!("Temporary password: {password}");
        println!("Note it now - it will not be shown again.");
    }

    Ok(())
}
