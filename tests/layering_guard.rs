//! Layering guardrails to keep the semantic core free of dependencies.
//!
//! `dataprovider_core` holds the value model and display-name formatting that every host integration must agree
//! on. It may not pull in any crate. This test scans its `Cargo.toml` and fails if `[dependencies]` lists anything.

#[test]
fn core_crate_has_no_dependencies() {
    let manifest = include_str!("../crates/dataprovider_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            if line.starts_with("[dependencies.") {
                panic!("`dataprovider_core` must not depend on other crates, found `{}`", line);
            }
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if !line_no_comment.is_empty() {
            panic!("`dataprovider_core` must not depend on other crates, found `{}`", line_no_comment);
        }
    }
}

#[test]
fn engine_depends_on_core_by_path() {
    let manifest = include_str!("../Cargo.toml");
    assert!(
        manifest
            .lines()
            .any(|line| line.trim().starts_with("dataprovider_core = { path = \"crates/dataprovider_core\" }")),
        "the engine must depend on the in-tree semantic core"
    );
}
