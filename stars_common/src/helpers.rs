/// Splits a comma-separated configuration value into its trimmed, non-empty parts.
pub fn split_list(value: &str) -> Vec<&str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}
