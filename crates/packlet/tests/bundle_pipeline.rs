//! End-to-end bundling through the orchestrator, against real files on disk.

use std::fs;

use packlet::{
    config::{BundleConfig, Config},
    orchestrator,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn bundle_config(entry: &str, output: &str) -> BundleConfig {
    BundleConfig {
        entry: entry.into(),
        output: output.into(),
        dedupe_modules: true,
        cache_modules: false,
    }
}

#[test]
fn bundles_a_two_module_project() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("index.js"),
        "import { greeting } from \"./lib.js\";\nconsole.log(greeting);\n",
    )
    .unwrap();
    fs::write(src.join("lib.js"), "export const greeting = \"hello\";\n").unwrap();

    let config = bundle_config("src/index.js", "dist/bundle.js");
    let output = orchestrator::run(&config, dir.path()).unwrap();

    assert_eq!(output, dir.path().join("dist/bundle.js"));
    let bundle = fs::read_to_string(&output).unwrap();
    // Entry is module 0 and its mapping routes the literal specifier to module 1.
    assert!(bundle.contains("require(0);"), "got: {bundle}");
    assert!(bundle.contains("{\"./lib.js\":1}"), "got: {bundle}");
    assert!(
        bundle.contains("const { greeting } = require(\"./lib.js\");"),
        "got: {bundle}"
    );
    assert!(
        bundle.contains("exports.greeting = greeting;"),
        "got: {bundle}"
    );
}

#[test]
fn output_parent_directories_are_created() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.js"), "console.log(1);\n").unwrap();

    let config = bundle_config("main.js", "deeply/nested/out/bundle.js");
    let output = orchestrator::run(&config, dir.path()).unwrap();
    assert!(output.is_file());
}

#[test]
fn bundling_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.js"), "import \"./dep.js\";\n").unwrap();
    fs::write(dir.path().join("dep.js"), "export default 1;\n").unwrap();

    let first = orchestrator::run(&bundle_config("main.js", "out/a.js"), dir.path()).unwrap();
    let second = orchestrator::run(&bundle_config("main.js", "out/b.js"), dir.path()).unwrap();
    assert_eq!(
        fs::read_to_string(first).unwrap(),
        fs::read_to_string(second).unwrap()
    );
}

#[test]
fn missing_entry_aborts_before_any_output_is_written() {
    let dir = TempDir::new().unwrap();

    let config = bundle_config("missing.js", "dist/bundle.js");
    let err = orchestrator::run(&config, dir.path()).unwrap_err();

    assert!(
        format!("{err:#}").contains("failed to read source file"),
        "got: {err:#}"
    );
    assert!(!dir.path().join("dist").exists());
    assert!(!dir.path().join("dist/bundle.js").exists());
}

#[test]
fn module_only_syntax_aborts_without_writing_output() {
    let dir = TempDir::new().unwrap();
    // Valid module syntax, but it cannot run inside the bundle's
    // non-async function wrapper.
    fs::write(dir.path().join("main.js"), "const x = await fetch(\"u\");\n").unwrap();

    let config = bundle_config("main.js", "dist/bundle.js");
    let err = orchestrator::run(&config, dir.path()).unwrap_err();

    let rendered = format!("{err:#}");
    assert!(rendered.contains("failed to transform"), "got: {rendered}");
    assert!(rendered.contains("main.js"), "got: {rendered}");
    assert!(!dir.path().join("dist/bundle.js").exists());
}

#[test]
fn cached_runtime_is_emitted_when_configured() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.js"), "console.log(1);\n").unwrap();

    let config = BundleConfig {
        cache_modules: true,
        ..bundle_config("main.js", "out.js")
    };
    let output = orchestrator::run(&config, dir.path()).unwrap();
    let bundle = fs::read_to_string(output).unwrap();
    assert!(bundle.contains("var cache = {};"), "got: {bundle}");
}

#[test]
fn discovered_config_drives_a_full_build() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("packlet.toml"),
        "entry = \"app.js\"\noutput = \"dist/app.bundle.js\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("app.js"), "import \"./side.js\";\n").unwrap();
    fs::write(dir.path().join("side.js"), "console.log(\"side effect\");\n").unwrap();

    let config = Config::discover(dir.path())
        .unwrap()
        .into_bundle_config(None, None)
        .unwrap();
    let output = orchestrator::run(&config, dir.path()).unwrap();

    assert_eq!(output, dir.path().join("dist/app.bundle.js"));
    let bundle = fs::read_to_string(output).unwrap();
    assert!(bundle.contains("require(\"./side.js\");"), "got: {bundle}");
}
