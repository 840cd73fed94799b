//! Service banner for the root endpoint.

/// Returns the running-service message with the crate version.
pub fn running_message() -> String {
    format!("metergate v{} is running", super::version())
}
