pub mod category_service;
pub mod tag_service;
pub mod user_service;

pub use category_service::CategoryService;
pub use tag_service::TagService;
pub use user_service::UserService;

/// Lowercase ASCII slug from a display name. Uniqueness is left to the
/// database constraint on the slug column.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_separator = false;
        } else {
            pending_separator = true;
        }
    }

    slug
}
