//! Input sanitization shared by the request decoder and the storage key layout.

/// Maximum number of characters kept from a customer name.
pub const MAX_CUSTOMER_NAME_LENGTH: usize = 128;

/// Sanitize a customer name for use inside a storage key or download filename.
///
/// Keeps ASCII alphanumerics, spaces and underscores, drops everything else, then
/// converts spaces to underscores. Leading/trailing whitespace is trimmed first.
/// Returns an empty string when nothing survives; callers treat that as invalid.
pub fn sanitize_customer_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_')
        .take(MAX_CUSTOMER_NAME_LENGTH)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Whether a customer name still carries at least one alphanumeric character after sanitization.
pub fn is_valid_customer_name(name: &str) -> bool {
    sanitize_customer_name(name)
        .chars()
        .any(|c| c.is_ascii_alphanumeric())
}
