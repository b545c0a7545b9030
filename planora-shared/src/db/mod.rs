/// Database layer for Planora
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool lifecycle and health checks
/// - `migrations`: Embedded migration runner
///
/// Queries live with their models in [`crate::models`].

pub mod migrations;
pub mod pool;
