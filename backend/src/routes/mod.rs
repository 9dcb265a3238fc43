/// Router Module Index
///
/// Splits the HTTP surface by access level. Access control is attached per module
/// in `create_router` (as route layers), so a handler can never be exposed without
/// the layer its module expects.

/// Routes reachable without a token.
pub mod public;

/// Routes behind the `AuthUser` extractor middleware.
/// Ownership checks happen inside the handlers.
pub mod authenticated;

/// Routes behind the `AuthUser` extractor middleware that additionally require
/// `is_admin` (checked inside the handlers).
pub mod admin;
