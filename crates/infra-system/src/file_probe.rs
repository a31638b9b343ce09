// File existence probe

use std::path::Path;

/// Wi-Fi provisioning file dropped onto the printer's virtual SD card
pub const DEFAULT_WIFI_CONFIG_PATH: &str = "/home/pi/gcode_files/SDCARD/wifi-config.json";

/// Whether `path` exists; any error (permissions, broken link) counts as no
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().try_exists().unwrap_or(false)
}

/// Text form used by the CLI (`True` / `False`, as existing macros expect)
pub fn format_exists(exists: bool) -> &'static str {
    if exists {
        "True"
    } else {
        "False"
    }
}
