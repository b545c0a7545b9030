/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: signed, expiring session tokens
/// - [`identity`]: the normalized identity both sign-in paths produce
/// - [`session`]: reconciler that merges local and federated identities
/// - [`authorization`]: role and ownership gate
/// - [`secret`]: random secrets and constant-time comparison
///
/// # Example
///
/// ```no_run
/// use planora_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod secret;
pub mod session;
