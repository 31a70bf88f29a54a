use std::io::Write;
use tempfile::NamedTempFile;

/// Writes `settings` to a temporary JSON file that lives as long as the handle.
pub fn write_settings(settings: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create settings file");
    serde_json::to_writer_pretty(&mut file, settings).expect("write settings");
    file.flush().expect("flush settings");
    file
}
