//! Bundle serialization: the module table and the runtime loader.
//!
//! Each asset becomes a table entry keyed by its id, pairing a factory
//! function wrapping the asset's code with the asset's specifier-to-id
//! mapping. The mapping is serialized through `serde_json`, never by string
//! concatenation, so arbitrary specifier text cannot break the artifact.
//! The code itself is embedded as a function body; downleveling splices
//! only complete parsed statements, and [`ensure_embeddable`] re-parses
//! each module's code inside the wrapper so module-only syntax that a
//! plain function cannot carry (top-level `await`, `import.meta`) aborts
//! the build instead of yielding an artifact that fails at execution.

use std::path::Path;

use anyhow::{Result, bail};
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::graph::Asset;

/// The per-module wrapper the runtime invokes. Shared with
/// [`ensure_embeddable`] so exactly what gets emitted is what gets checked.
fn factory(code: &str) -> String {
    format!("function (require, module, exports) {{\n{code}\n}}")
}

/// Check that `code` stays syntactically valid inside the factory wrapper.
///
/// Module syntax is a wider grammar than a function body: top-level
/// `await` and `import.meta` parse fine in a module yet are syntax errors
/// inside the non-async function the bundle executes. Parsing the wrapped
/// code as a plain script catches every such construct.
pub fn ensure_embeddable(path: &Path, code: &str) -> Result<()> {
    let allocator = Allocator::default();
    let wrapped = format!("({});", factory(code));
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, &wrapped, source_type).parse();

    if let Some(first) = ret.errors.first() {
        bail!(
            "{} uses module-only syntax (such as top-level await or import.meta) \
             that cannot run inside the bundle's module wrapper: {first}",
            path.display()
        );
    }
    Ok(())
}

/// Serialize `assets` into one self-contained executable artifact.
///
/// The runtime executes module 0 (the entry) first; every module receives a
/// local `require` closed over its own mapping, a fresh `module` object,
/// and that module's `exports`.
///
/// With `cache_modules` disabled (the reference behavior) every
/// `require(id)` re-executes the module and importers observe independent
/// exports objects. Enabled, the runtime keeps an id -> module cache and
/// repeat requires share one exports object; the cache entry is published
/// before the factory runs so import cycles terminate.
pub fn generate_bundle(assets: &[Asset], cache_modules: bool) -> String {
    let mut modules = String::new();
    for asset in assets {
        let mapping = serde_json::to_string(&asset.mapping)
            .expect("mapping serialization is infallible");
        modules.push_str(&format!(
            "{}: [{}, {}],\n",
            asset.id,
            factory(&asset.code),
            mapping
        ));
    }

    let mut out = String::with_capacity(modules.len() + 512);
    out.push_str("(function (modules) {\n");
    if cache_modules {
        out.push_str("  var cache = {};\n");
    }
    out.push_str("  function require(id) {\n");
    if cache_modules {
        out.push_str(
            "    if (cache[id] !== undefined) {\n      return cache[id].exports;\n    }\n",
        );
    }
    out.push_str(
        "    var fn = modules[id][0];\n\
         \x20   var mapping = modules[id][1];\n\
         \x20   function localRequire(name) {\n\
         \x20     return require(mapping[name]);\n\
         \x20   }\n\
         \x20   var module = { exports: {} };\n",
    );
    if cache_modules {
        out.push_str("    cache[id] = module;\n");
    }
    out.push_str(
        "    fn(localRequire, module, module.exports);\n\
         \x20   return module.exports;\n\
         \x20 }\n\
         \x20 require(0);\n\
         })({\n",
    );
    out.push_str(&modules);
    out.push_str("});\n");
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::AssetId;

    fn asset(id: u32, code: &str, mapping: &[(&str, u32)]) -> Asset {
        Asset {
            id: AssetId::new(id),
            filename: PathBuf::from(format!("/src/{id}.js")),
            dependencies: mapping.iter().map(|(s, _)| (*s).to_string()).collect(),
            code: code.to_string(),
            mapping: mapping
                .iter()
                .map(|(s, id)| ((*s).to_string(), AssetId::new(*id)))
                .collect::<IndexMap<_, _>>(),
        }
    }

    #[test]
    fn single_module_bundle_bootstraps_from_module_zero() {
        let bundle = generate_bundle(&[asset(0, "console.log(\"hi\");", &[])], false);
        assert!(bundle.contains("require(0);"), "got: {bundle}");
        assert!(
            bundle.contains("0: [function (require, module, exports) {\nconsole.log(\"hi\");\n}, {}],"),
            "got: {bundle}"
        );
    }

    #[test]
    fn mapping_is_serialized_as_a_json_object() {
        let bundle = generate_bundle(
            &[
                asset(0, "require(\"./b.js\");", &[("./b.js", 1)]),
                asset(1, "", &[]),
            ],
            false,
        );
        assert!(bundle.contains("{\"./b.js\":1}"), "got: {bundle}");
    }

    #[test]
    fn pathological_specifiers_are_escaped() {
        let bundle = generate_bundle(&[asset(0, "", &[("./we\"ird\\mod.js", 1)])], false);
        assert!(
            bundle.contains("{\"./we\\\"ird\\\\mod.js\":1}"),
            "got: {bundle}"
        );
    }

    #[test]
    fn reference_runtime_has_no_module_cache() {
        let bundle = generate_bundle(&[asset(0, "", &[])], false);
        assert!(!bundle.contains("cache"), "got: {bundle}");
    }

    #[test]
    fn cached_runtime_publishes_the_module_before_execution() {
        let bundle = generate_bundle(&[asset(0, "", &[])], true);
        let publish = bundle.find("cache[id] = module;").unwrap();
        let invoke = bundle.find("fn(localRequire, module, module.exports);").unwrap();
        assert!(publish < invoke, "got: {bundle}");
    }

    #[test]
    fn ordinary_downleveled_code_is_embeddable() {
        ensure_embeddable(
            std::path::Path::new("/src/a.js"),
            "const { x } = require(\"./b.js\");\nconsole.log(x);",
        )
        .unwrap();
        ensure_embeddable(std::path::Path::new("/src/empty.js"), "").unwrap();
    }

    #[test]
    fn top_level_await_is_rejected_with_the_file_named() {
        let err = ensure_embeddable(
            std::path::Path::new("/src/a.js"),
            "const x = await fetch(\"u\");",
        )
        .unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("/src/a.js"), "got: {rendered}");
        assert!(rendered.contains("module wrapper"), "got: {rendered}");
    }

    #[test]
    fn import_meta_is_rejected() {
        let err = ensure_embeddable(
            std::path::Path::new("/src/a.js"),
            "console.log(import.meta.url);",
        )
        .unwrap_err();
        assert!(err.to_string().contains("/src/a.js"), "got: {err}");
    }

    #[test]
    fn generation_is_deterministic() {
        let assets = [
            asset(0, "require(\"./b.js\");", &[("./b.js", 1)]),
            asset(1, "exports.value = 1;", &[]),
        ];
        assert_eq!(
            generate_bundle(&assets, false),
            generate_bundle(&assets, false)
        );
    }
}
