use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::product::Snapshot;

/// Durable home of the last-known snapshot.
pub trait SnapshotStore {
    /// Previous snapshot, empty if nothing has been stored yet.
    fn load(&self) -> Result<Snapshot>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

#[derive(Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            anyhow::bail!("DATA_FILE is empty");
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

pub fn to_pretty_json(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    snapshot.serialize(&mut ser).context("serialize snapshot")?;
    buf.push(b'\n');
    Ok(buf)
}

impl SnapshotStore for JsonStore {
    fn load(&self) -> Result<Snapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("store.empty path={} reason=missing", self.path.display());
                return Ok(Snapshot::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read snapshot {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            log::info!("store.empty path={} reason=blank", self.path.display());
            return Ok(Snapshot::new());
        }

        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("decode snapshot {}", self.path.display()))?;
        log::info!(
            "store.loaded path={} products={}",
            self.path.display(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create snapshot parent dir for {}", self.path.display()))?;
        }

        let bytes = to_pretty_json(snapshot)?;
        let tmp = self.tmp_path();
        {
            let mut f = fs::File::create(&tmp)
                .with_context(|| format!("create {}", tmp.display()))?;
            f.write_all(&bytes)
                .with_context(|| format!("write {}", tmp.display()))?;
            f.sync_all().ok();
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace snapshot {}", self.path.display()))?;

        log::info!(
            "store.saved path={} products={}",
            self.path.display(),
            snapshot.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{dec, PriceRecord};

    fn sample() -> Snapshot {
        let mut s = Snapshot::new();
        for r in [
            PriceRecord::new("Yonex AS-50", Some(dec("32.00")), Some(dec("27.5"))),
            PriceRecord::new("Victor Gold", Some(dec("15")), None),
            PriceRecord::new("Mystery Tube", None, None),
            PriceRecord::new("RSL Classic", Some(dec("1049.99")), None),
        ] {
            s.insert(r.name.clone(), r);
        }
        s
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nope.json")).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn blank_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.json");
        fs::write(&path, "  \n").unwrap();
        let store = JsonStore::new(&path).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonStore::new(&path).unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn save_load_save_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested").join("snap.json")).unwrap();

        let original = sample();
        store.save(&original).unwrap();
        let first = fs::read(store.path()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, original);
        let mystery = &loaded["Mystery Tube"];
        assert_eq!(mystery.regular_price, None);
        assert_eq!(mystery.sale_price, None);
        assert_eq!(mystery.effective_price, None);

        store.save(&loaded).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn reads_files_written_by_the_previous_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shuttlecocks.json");
        fs::write(
            &path,
            r#"{
    "Yonex AS-50": {
        "name": "Yonex AS-50",
        "regular_price": 32.0,
        "sale_price": 25.0,
        "effective_price": 25.0
    },
    "Victor Gold": {
        "name": "Victor Gold",
        "regular_price": 15.0,
        "sale_price": null,
        "effective_price": 15.0
    }
}"#,
        )
        .unwrap();
        let loaded = JsonStore::new(&path).unwrap().load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get_index(0).unwrap().0, "Yonex AS-50");
        assert_eq!(loaded["Yonex AS-50"].effective_price, Some(dec("25")));
        assert_eq!(loaded["Victor Gold"].sale_price, None);
    }

    #[test]
    fn output_is_pretty_printed_with_nulls() {
        let text = String::from_utf8(to_pretty_json(&sample()).unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"Yonex AS-50\": {\n        \"name\""));
        assert!(text.contains("\"sale_price\": null"));
    }
}
