//! Generator utility functions

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs_home()
    {
        return path.replacen('~', &home, 1);
    }
    path.to_string()
}

/// Get home directory path
pub fn dirs_home() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_leaves_other_paths() {
        assert_eq!(expand_tilde("./out/config.yaml"), "./out/config.yaml");
        assert_eq!(expand_tilde("/etc/linkforge.toml"), "/etc/linkforge.toml");
        assert_eq!(expand_tilde("~user/x"), "~user/x");
    }

    #[test]
    fn test_expand_tilde_home() {
        if let Some(home) = dirs_home() {
            assert_eq!(expand_tilde("~/config.yaml"), format!("{home}/config.yaml"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
