//! Tilde expansion.

use crate::interpreter::types::ShellState;

/// Expand `~` or `~user`. The bare tilde resolves to $HOME; named users
/// come from the sandbox's user-home table, defaulting to /home/<user>.
pub fn expand_tilde(state: &ShellState, user: Option<&str>) -> String {
    match user {
        None => {
            let home = state.get_scalar("HOME");
            if home.is_empty() {
                "/home/user".to_string()
            } else {
                home
            }
        }
        Some(name) => state
            .user_homes
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("/home/{}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_tilde_uses_home() {
        let mut state = ShellState::default();
        state.env.insert("HOME".to_string(), "/home/alice".to_string());
        assert_eq!(expand_tilde(&state, None), "/home/alice");
    }

    #[test]
    fn test_bare_tilde_default() {
        let state = ShellState::default();
        assert_eq!(expand_tilde(&state, None), "/home/user");
    }

    #[test]
    fn test_user_tilde() {
        let mut state = ShellState::default();
        state.user_homes.insert("bob".to_string(), "/srv/bob".to_string());
        assert_eq!(expand_tilde(&state, Some("bob")), "/srv/bob");
        assert_eq!(expand_tilde(&state, Some("carol")), "/home/carol");
    }
}
