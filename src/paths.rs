use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// File name of the user settings file.
pub const SETTINGS_FILE_NAME: &str = "user_settings.json";

/// File name of the captured coordinates and colors.
pub const ZODIAC_CONFIG_FILE_NAME: &str = "revolution_idle_zodiac_automation_config.json";

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the log file path: `<exe_dir>/logs/revolution_idle_automation.log`
pub fn get_log_file() -> PathBuf {
    get_logs_dir().join("revolution_idle_automation.log")
}

/// Returns the settings file path: `<exe_dir>/user_settings.json`
pub fn get_settings_file() -> PathBuf {
    get_exe_dir().join(SETTINGS_FILE_NAME)
}

/// Returns the zodiac configuration path: `<exe_dir>/revolution_idle_zodiac_automation_config.json`
pub fn get_zodiac_config_file() -> PathBuf {
    get_exe_dir().join(ZODIAC_CONFIG_FILE_NAME)
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}
