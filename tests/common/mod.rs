#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub use workdag_test_utils::builders;
pub use workdag_test_utils::init_tracing;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, contents).expect("write test file");
    path
}

/// Assert that `order` is a topological order of `edges`.
pub fn assert_topological(order: &[&str], edges: &[(&str, &str)]) {
    let pos = |name: &str| {
        order
            .iter()
            .position(|n| *n == name)
            .unwrap_or_else(|| panic!("{name} missing from order {order:?}"))
    };
    for (from, to) in edges {
        assert!(
            pos(from) < pos(to),
            "edge {from} -> {to} violated by order {order:?}"
        );
    }
}
