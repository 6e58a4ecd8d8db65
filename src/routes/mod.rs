/// Router Module Index
///
/// Routes are split by access level; the session middleware wraps both.

/// Pages, the sibling note API, and auth actions. No identity required.
pub mod public;

/// Note CRUD, protected by the `AuthUser` extractor middleware.
pub mod authenticated;
