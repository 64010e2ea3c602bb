// 💾 Raw snapshots - verbatim query documents on disk for audit/debugging

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = ".json";

/// Path a snapshot named `name` lands at inside `dir` (`.json` appended if missing)
pub fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    if name.ends_with(EXTENSION) {
        dir.join(name)
    } else {
        dir.join(format!("{}{}", name, EXTENSION))
    }
}

/// Write `document` as JSON to `dir/name.json`, creating `dir` if needed.
/// Returns the written path.
pub fn write_json_snapshot(dir: &Path, name: &str, document: &Value) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create snapshot directory: {:?}", dir))?;

    let path = snapshot_path(dir, name);
    let content = serde_json::to_string(document).context("Failed to serialize snapshot")?;
    fs::write(&path, content).with_context(|| format!("Failed to write snapshot: {:?}", path))?;

    log::debug!("[Snapshot] Wrote {:?}", path);
    Ok(path)
}

pub fn read_json_snapshot<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {:?}", path))?;

    serde_json::from_str(&content).with_context(|| format!("Failed to parse snapshot JSON: {:?}", path))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_path_appends_extension_once() {
        let dir = Path::new("json");
        assert_eq!(snapshot_path(dir, "gastos"), PathBuf::from("json/gastos.json"));
        assert_eq!(snapshot_path(dir, "gastos.json"), PathBuf::from("json/gastos.json"));
    }

    #[test]
    fn test_write_then_read_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("json");
        let document = json!({"object": "list", "results": [{"id": "p1"}], "has_more": false});

        let path = write_json_snapshot(&nested, "categorias", &document).unwrap();
        assert!(path.ends_with("categorias.json"));
        assert_eq!(read_json_snapshot(&path).unwrap(), document);
    }

    #[test]
    fn test_read_invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_json_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse snapshot JSON"));
    }
}
