//! Host identity and wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Tag value used when the hostname cannot be determined.
pub const UNKNOWN_HOST: &str = "unknown";

/// Resolve this machine's hostname (best-effort).
///
/// Called once at startup; the result is threaded through as an owned value.
pub fn resolve_hostname() -> String {
    system_hostname()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| {
            log::warn!("could not resolve hostname, tagging points with host={UNKNOWN_HOST}");
            UNKNOWN_HOST.to_string()
        })
}

#[cfg(unix)]
fn system_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes; gethostname NUL-terminates on
    // success unless truncated, which the search below tolerates.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8(buf[..end].to_vec()).ok()
}

#[cfg(not(unix))]
fn system_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}

/// Current wall-clock time in unix seconds.
pub fn unix_secs_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
