//! Simulated sysfs / dev tree for harness tests

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use synth_driver::{HarnessConfig, Pacing, MAP_SUBDIR};
use tempfile::TempDir;

/// Temp directory laid out like `/sys/class/uio` plus `/dev`
pub struct FakeUio {
    pub root: TempDir,
}

impl FakeUio {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("class")).unwrap();
        std::fs::create_dir_all(root.path().join("dev")).unwrap();
        Self { root }
    }

    pub fn class_root(&self) -> PathBuf {
        self.root.path().join("class")
    }

    pub fn dev_root(&self) -> PathBuf {
        self.root.path().join("dev")
    }

    /// Add `/sys/class/uio/<node>` with a name and optional map0 attributes
    pub fn add_device(&self, node: &str, name: &str, map: Option<(&str, &str, &str)>) {
        let dir = self.class_root().join(node);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("name"), format!("{name}\n")).unwrap();

        if let Some((addr, size, offset)) = map {
            let map_dir = dir.join(MAP_SUBDIR);
            std::fs::create_dir_all(&map_dir).unwrap();
            std::fs::write(map_dir.join("addr"), format!("{addr}\n")).unwrap();
            std::fs::write(map_dir.join("size"), format!("{size}\n")).unwrap();
            std::fs::write(map_dir.join("offset"), format!("{offset}\n")).unwrap();
        }
    }

    /// Regular file standing in for `/dev/<node>`
    pub fn add_node(&self, node: &str, len: u64) -> PathBuf {
        let path = self.dev_root().join(node);
        File::create(&path).unwrap().set_len(len).unwrap();
        path
    }

    /// Reference `zed_uio_module` at 0x43c00000, 64 KB, backed by `uio0`
    pub fn zed_board() -> Self {
        let fake = Self::new();
        fake.add_device("uio0", "zed_uio_module", Some(("0x43c00000", "0x00010000", "0")));
        fake.add_node("uio0", 0x10000);
        fake
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            class_root: self.class_root(),
            dev_root: self.dev_root(),
            pacing: Pacing::IMMEDIATE,
            ..HarnessConfig::default()
        }
    }
}

/// Native-endian 32-bit word at `index` of a file
pub fn file_word(path: &Path, index: usize) -> u32 {
    let bytes = std::fs::read(path).unwrap();
    let start = index * 4;
    u32::from_ne_bytes(bytes[start..start + 4].try_into().unwrap())
}
