//! Lock holder identity.

/// Identity recorded in `locked_by`, e.g. `deploy@db-node-3 (pid 4182)`.
///
/// Includes the process ID so two processes on one host never share an identity.
pub fn default_owner() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{} (pid {})", user, host, std::process::id())
}
