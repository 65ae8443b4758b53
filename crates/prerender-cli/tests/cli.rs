//! End-to-end tests for the prerender-kit binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn prerender_kit(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("prerender-kit"));
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn transform_prints_rewritten_code() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "src/index.ts",
        "export const posts = usePrerenderData('posts', fetchPosts)\n",
    );

    prerender_kit(temp.path())
        .args(["transform", "src/index.ts"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "import { __neverReachable as __neverReachable_prerender } from '#nuxt-prerender-kit/runtime';\n",
        ))
        .stdout(predicate::str::contains(
            "usePrerenderData('posts', import.meta.prerender ? fetchPosts : __neverReachable_prerender())",
        ));
}

#[test]
fn transform_writes_output_and_source_map() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.ts", "usePrerenderData('k', load)\n");

    prerender_kit(temp.path())
        .args([
            "transform",
            "src/a.ts",
            "--out",
            "out.js",
            "--map",
            "out.js.map",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let code = fs::read_to_string(temp.path().join("out.js")).unwrap();
    assert!(code.contains("import.meta.prerender ? load :"));

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("out.js.map")).unwrap())
            .unwrap();
    assert_eq!(map["sources"][0], "src/a.ts");
}

#[test]
fn transform_reports_unchanged_files() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.ts", "export const x = 1\n");

    prerender_kit(temp.path())
        .args(["transform", "src/a.ts"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unchanged: target function not referenced"));
}

#[test]
fn transform_dev_flag_bypasses() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.ts", "usePrerenderData('k', load)\n");

    prerender_kit(temp.path())
        .args(["transform", "src/a.ts", "--dev"])
        .assert()
        .success()
        .stderr(predicate::str::contains("development bypass active"));
}

#[test]
fn transform_uses_module_id_for_markup_blocks() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "script.ts",
        "const data = await usePrerenderData('k', () => $fetch('/api'))\n",
    );

    prerender_kit(temp.path())
        .args([
            "transform",
            "script.ts",
            "--id",
            "/app/pages/index.vue?vue&type=script&setup=true&lang.ts",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("import.meta.prerender ? () => $fetch('/api') :"));

    prerender_kit(temp.path())
        .args(["transform", "script.ts", "--id", "/app/pages/index.vue"])
        .assert()
        .success()
        .stderr(predicate::str::contains("markup without script block"));
}

#[test]
fn transform_missing_file_fails() {
    let temp = TempDir::new().unwrap();

    prerender_kit(temp.path())
        .args(["transform", "missing.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.ts"));
}

#[test]
fn config_file_changes_behavior() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "prerender.toml",
        concat!(
            "guard = \"false\"\n\n",
            "[fallback]\nsymbol = \"__nr\"\nshape = \"keyed-call\"\n\n",
            "[import]\n",
            "statement = \"import { __neverReachable as __nr } from '#runtime';\\n\"\n",
            "marker = \"from '#runtime'\"\n",
        ),
    );
    write(temp.path(), "src/a.ts", "usePrerenderData('k', load)\n");

    prerender_kit(temp.path())
        .args(["transform", "src/a.ts"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "import { __neverReachable as __nr } from '#runtime';\n",
        ))
        .stdout(predicate::str::contains(
            "usePrerenderData('k', false ? load : __nr('k'))",
        ));
}

#[test]
fn config_with_unimported_fallback_fails() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "prerender.toml", "[fallback]\nsymbol = \"__nr\"\n");
    write(temp.path(), "src/a.ts", "usePrerenderData('k', load)\n");

    prerender_kit(temp.path())
        .args(["transform", "src/a.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not bind the fallback symbol"));
}

#[test]
fn scan_lists_call_sites() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "src/a.ts",
        "const a = usePrerenderData('a', fa)\nconst b = usePrerenderData('b')\n",
    );
    write(temp.path(), "src/b.css", "body {}\n");

    prerender_kit(temp.path())
        .args(["scan", "src/a.ts", "src/b.css"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/a.ts:1:11 'a'\n"))
        .stdout(predicate::str::contains("src/a.ts:2:11 'b' (too few arguments)"))
        .stderr(predicate::str::contains("src/b.css: skipped"))
        .stderr(predicate::str::contains("2 call sites found, 1 rewritable"));
}

#[test]
fn scan_uses_module_id_for_markup_blocks() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "script.ts",
        "const data = await usePrerenderData('k', () => $fetch('/api'))\n",
    );

    prerender_kit(temp.path())
        .args([
            "scan",
            "script.ts",
            "--id",
            "/app/pages/index.vue?vue&type=script&setup=true&lang.ts",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("script.ts:1:20 'k'\n"))
        .stderr(predicate::str::contains("1 call site found, 1 rewritable"));

    prerender_kit(temp.path())
        .args(["scan", "script.ts", "other.ts", "--id", "/app/pages/index.vue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--id applies to a single file"));
}

#[test]
fn check_prints_effective_config() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "prerender.toml", "functionName = \"usePageData\"\n");

    prerender_kit(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("functionName = \"usePageData\""))
        .stderr(predicate::str::contains("Configuration is valid"));

    prerender_kit(temp.path())
        .args(["check", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"functionName\": \"usePageData\""));
}

#[test]
fn check_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "bad.toml", "functionName = \"not valid\"\n");

    prerender_kit(temp.path())
        .args(["check", "--config", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid identifier"));
}
