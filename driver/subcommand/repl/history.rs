use std::{env, fs, path};

/// Overrides the history location, mostly for sandboxed sessions
const HISTORY_ENV_VAR: &str = "ZIS_INSPECT_HISTORY";

/// Returns where REPL history is kept
///
/// History is optional; any failure to find or create the directory disables it.
pub fn repl_history_path() -> Option<path::PathBuf> {
    if let Some(explicit) = env::var_os(HISTORY_ENV_VAR) {
        return Some(path::PathBuf::from(explicit)).filter(|path| !path.as_os_str().is_empty());
    }

    let project_dirs = directories_next::ProjectDirs::from("org.zis-lang", "", "zis-inspect")?;
    let data_dir = project_dirs.data_dir();

    fs::create_dir_all(data_dir).ok()?;
    Some(data_dir.join("inspect-history"))
}
