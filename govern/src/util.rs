use std::path::PathBuf;

/// Expands a leading `~/` to the user's home directory.
pub(crate) fn get_base_dir(dir: &str) -> Option<PathBuf> {
    let mut path_buf = PathBuf::new();
    if dir.starts_with("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            path_buf.push(home_dir);
            path_buf.push(dir.strip_prefix("~/")?);
        }
    } else {
        path_buf.push(dir);
    }
    Some(path_buf)
}

/// `<root_dir>/config/<name>.toml`
pub(crate) fn get_toml_config_file(root_dir: &str, name: &str) -> Option<PathBuf> {
    let mut path_buf = get_base_dir(root_dir)?;
    path_buf.push("config");
    path_buf.push(format!("{name}.toml"));
    Some(path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_file() {
        assert_eq!(
            get_toml_config_file("/tmp/govern", "config"),
            Some(PathBuf::from("/tmp/govern/config/config.toml"))
        );
    }

    #[test]
    fn test_home_dir_is_expanded() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(get_base_dir("~/.govern"), Some(home.join(".govern")));
    }
}
