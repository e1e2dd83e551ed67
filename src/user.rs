//! Acting-user resolution.
//!
//! Saving and listing drawings happen on behalf of a user. Rather than
//! requiring `--user` on every invocation, the user is resolved through a chain:
//!
//! 1. `--user <uuid>`: explicit per-command override
//! 2. `DRAWBOT_USER` env var: process/session level
//! 3. `default-user` in `~/.drawbot/config.toml`: only for a brand-new session
//!
//! When none yields a value the session keeps whatever user it already has.

use std::env;

use uuid::Uuid;

/// Resolve the acting user from the resolution chain.
///
/// `fallback` is the configured default, passed only when it should apply.
/// Returns `Ok(None)` when no source names a user, and an error when a
/// source names something that is not a usable UUID.
pub fn resolve_user(
    explicit: Option<&str>,
    fallback: Option<Uuid>,
) -> Result<Option<Uuid>, String> {
    // 1. Explicit --user flag.
    if let Some(id) = explicit {
        return parse_user(id, "--user").map(Some);
    }

    // 2. DRAWBOT_USER environment variable.
    if let Ok(id) = env::var("DRAWBOT_USER")
        && !id.is_empty()
    {
        return parse_user(&id, "DRAWBOT_USER").map(Some);
    }

    // 3. Config default.
    Ok(fallback)
}

/// Parse a user id, rejecting anything but a non-nil UUID.
pub fn parse_user(text: &str, source: &str) -> Result<Uuid, String> {
    let id = text
        .parse::<Uuid>()
        .map_err(|e| format!("{source}: '{text}' is not a valid user id: {e}"))?;
    if id.is_nil() {
        return Err(format!("{source}: the nil UUID is not a user"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins() {
        // An explicit user is returned without touching the env or config.
        let user = Uuid::new_v4();
        let result = resolve_user(Some(&user.to_string()), Some(Uuid::new_v4()));
        assert_eq!(result.unwrap(), Some(user));
    }

    #[test]
    fn explicit_must_be_a_uuid() {
        let err = resolve_user(Some("alice"), None).unwrap_err();
        assert!(err.starts_with("--user"));
    }

    #[test]
    fn nil_is_rejected() {
        let err = parse_user(&Uuid::nil().to_string(), "--user").unwrap_err();
        assert!(err.contains("nil"));
    }
}
