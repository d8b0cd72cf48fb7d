//! Environment constants and path utilities.
//!
//! Centralizes the directory and file names used for configuration discovery.

use std::path::{Path, PathBuf};

/// Application directory name (hidden directory like .git, .vscode)
pub const TASKPLAN_DIR_NAME: &str = ".taskplan";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in a project root
pub const LOCAL_CONFIG_FILE_NAME: &str = "taskplan.toml";

/// System-wide configuration directory (Unix-like systems)
pub const SYSTEM_CONFIG_DIR: &str = "/etc/taskplan";

/// Build the .taskplan directory path from a workspace root
pub fn taskplan_dir_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(TASKPLAN_DIR_NAME)
}

/// Build config directory path in user's home directory
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    home_dir.join(TASKPLAN_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build `./taskplan.toml` for a directory
pub fn project_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LOCAL_CONFIG_FILE_NAME)
}

/// Build `./.taskplan/config.toml` for a directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    taskplan_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the system-wide config file path
pub fn system_config_file_path() -> PathBuf {
    Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME)
}
