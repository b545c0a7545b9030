/// Middleware modules for the API server
///
/// - `session`: resolves the caller's identity from the bearer token and the
///   federated session cookie

pub mod session;
