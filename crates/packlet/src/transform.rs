//! Transform collaborator: dependency extraction and ESM downleveling.
//!
//! Downleveling is span-based splicing over the original source: statements
//! that are not module syntax pass through byte-for-byte (comments and
//! formatting included), while `import`/`export` statements are replaced
//! with CommonJS-style equivalents evaluable inside the bundle runtime's
//! `function (require, module, exports)` wrapper.

use oxc_ast::ast::{
    BindingPatternKind, Declaration, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, ImportDeclaration,
    ImportDeclarationSpecifier, Program, Statement,
};
use oxc_span::GetSpan;

/// Collect the literal specifier of every static import edge, in source
/// order, duplicates preserved as written.
///
/// Re-export forms (`export ... from`, `export * from`) count as edges too:
/// their downleveled code calls `require` on the same specifier, so the
/// target module must be present in the bundle.
pub fn collect_dependencies(program: &Program<'_>) -> Vec<String> {
    let mut dependencies = Vec::new();
    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                dependencies.push(decl.source.value.to_string());
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(source) = &export.source {
                    dependencies.push(source.value.to_string());
                }
            }
            Statement::ExportAllDeclaration(export) => {
                dependencies.push(export.source.value.to_string());
            }
            _ => {}
        }
    }
    dependencies
}

/// Rewrite every top-level module-syntax statement of `program` in place,
/// returning the downleveled source text.
pub fn downlevel(source: &str, program: &Program<'_>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    let mut temps = 0usize;

    for stmt in &program.body {
        let Some(rewrite) = rewrite_statement(stmt, source, &mut temps) else {
            continue;
        };
        let span = stmt.span();
        out.push_str(&source[cursor..span.start as usize]);
        out.push_str(&rewrite);
        cursor = span.end as usize;
    }

    out.push_str(&source[cursor..]);
    out
}

fn rewrite_statement(stmt: &Statement<'_>, source: &str, temps: &mut usize) -> Option<String> {
    match stmt {
        Statement::ImportDeclaration(decl) => Some(rewrite_import(decl, temps)),
        Statement::ExportNamedDeclaration(export) => {
            Some(rewrite_export_named(export, source, temps))
        }
        Statement::ExportAllDeclaration(export) => Some(rewrite_export_all(export)),
        Statement::ExportDefaultDeclaration(export) => Some(rewrite_export_default(export, source)),
        _ => None,
    }
}

fn rewrite_import(decl: &ImportDeclaration<'_>, temps: &mut usize) -> String {
    let require = format!("require({})", js_string(decl.source.value.as_str()));
    let Some(specifiers) = &decl.specifiers else {
        // import "./effects.js";
        return format!("{require};");
    };

    let mut default_local = None;
    let mut namespace_local = None;
    let mut named = Vec::new();
    for specifier in specifiers {
        match specifier {
            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                default_local = Some(s.local.name.as_str());
            }
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                namespace_local = Some(s.local.name.as_str());
            }
            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                named.push((s.imported.name().to_string(), s.local.name.as_str()));
            }
        }
    }

    match (default_local, namespace_local, named.as_slice()) {
        (None, None, []) => format!("{require};"),
        (Some(local), None, []) => format!("const {local} = {require}.default;"),
        (None, Some(local), []) => format!("const {local} = {require};"),
        (None, None, named) if named.iter().all(|(imported, _)| is_identifier(imported)) => {
            let patterns = named
                .iter()
                .map(|(imported, local)| {
                    if imported == local {
                        imported.clone()
                    } else {
                        format!("{imported}: {local}")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("const {{ {patterns} }} = {require};")
        }
        (default_local, namespace_local, named) => {
            // Mixed clauses (or non-identifier imported names) go through a
            // per-statement temporary so the module is required exactly once.
            let temp = next_temp(temps);
            let mut parts = vec![format!("const {temp} = {require};")];
            if let Some(local) = default_local {
                parts.push(format!("const {local} = {temp}.default;"));
            }
            if let Some(local) = namespace_local {
                parts.push(format!("const {local} = {temp};"));
            }
            for (imported, local) in named {
                parts.push(format!("const {local} = {temp}{};", member(imported)));
            }
            parts.join(" ")
        }
    }
}

fn rewrite_export_named(
    export: &ExportNamedDeclaration<'_>,
    source: &str,
    temps: &mut usize,
) -> String {
    // export const x = …; / export function f() {} / export class C {}
    if let Some(declaration) = &export.declaration {
        let declaration_text = declaration.span().source_text(source);
        let mut names = Vec::new();
        collect_declared_names(declaration, &mut names);

        let mut out = String::from(declaration_text);
        if !declaration_text.ends_with(';') {
            out.push(';');
        }
        for name in &names {
            out.push_str(&format!(" exports.{name} = {name};"));
        }
        return out;
    }

    // export { a, b as c } from "./m.js";
    if let Some(source_literal) = &export.source {
        let temp = next_temp(temps);
        let mut parts = vec![format!(
            "const {temp} = require({});",
            js_string(source_literal.value.as_str())
        )];
        for specifier in &export.specifiers {
            parts.push(format!(
                "exports{} = {temp}{};",
                member(specifier.exported.name().as_str()),
                member(specifier.local.name().as_str())
            ));
        }
        return parts.join(" ");
    }

    // export { a, b as c };
    export
        .specifiers
        .iter()
        .map(|specifier| {
            format!(
                "exports{} = {};",
                member(specifier.exported.name().as_str()),
                specifier.local.name()
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn rewrite_export_all(export: &ExportAllDeclaration<'_>) -> String {
    let require = format!("require({})", js_string(export.source.value.as_str()));
    match &export.exported {
        // export * as ns from "./m.js";
        Some(exported) => format!("exports{} = {require};", member(exported.name().as_str())),
        // export * from "./m.js";
        None => format!("Object.assign(exports, {require});"),
    }
}

fn rewrite_export_default(export: &ExportDefaultDeclaration<'_>, source: &str) -> String {
    let declaration_text = export.declaration.span().source_text(source);

    // Named function and class declarations keep their module-scope binding.
    let binding = match &export.declaration {
        ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
            func.id.as_ref().map(|id| id.name.as_str())
        }
        ExportDefaultDeclarationKind::ClassDeclaration(class) => {
            class.id.as_ref().map(|id| id.name.as_str())
        }
        _ => None,
    };

    match binding {
        Some(name) => format!("{declaration_text} exports.default = {name};"),
        None => format!("exports.default = {declaration_text};"),
    }
}

/// Names bound by an exported declaration, destructuring patterns included.
fn collect_declared_names(declaration: &Declaration<'_>, out: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                collect_binding_names(&declarator.id.kind, out);
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                out.push(id.name.to_string());
            }
        }
        _ => {}
    }
}

fn collect_binding_names(kind: &BindingPatternKind<'_>, out: &mut Vec<String>) {
    match kind {
        BindingPatternKind::BindingIdentifier(id) => out.push(id.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                collect_binding_names(&property.value.kind, out);
            }
            if let Some(rest) = &object.rest {
                collect_binding_names(&rest.argument.kind, out);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                collect_binding_names(&element.kind, out);
            }
            if let Some(rest) = &array.rest {
                collect_binding_names(&rest.argument.kind, out);
            }
        }
        BindingPatternKind::AssignmentPattern(assignment) => {
            collect_binding_names(&assignment.left.kind, out);
        }
    }
}

fn next_temp(temps: &mut usize) -> String {
    let temp = format!("_packlet{}", *temps);
    *temps += 1;
    temp
}

/// Member access suffix: dot form for identifier-shaped names, escaped
/// bracket form otherwise.
fn member(name: &str) -> String {
    if is_identifier(name) {
        format!(".{name}")
    } else {
        format!("[{}]", js_string(name))
    }
}

/// JSON string escaping is a strict subset of JS string literal syntax, so
/// this is also how arbitrary text gets embedded in generated code.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).expect("string serialization is infallible")
}

/// ASCII identifier check; anything fancier (Unicode, etc.) takes the
/// always-valid bracket path.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
