mod imports;
mod walker;

use std::path::Path;

use anyhow::Result;
use tree_sitter::Language as Grammar;

use symgraph_core::analyzer::{check_grammar, parse_with, LanguageExtractor, ParsedFile};
use symgraph_core::syntax::CallSite;
use symgraph_core::types::*;

use walker::Walker;

/// TypeScript/TSX language extractor using tree-sitter.
pub struct TypeScriptExtractor {
    ts_grammar: Grammar,
    tsx_grammar: Grammar,
}

impl TypeScriptExtractor {
    pub fn new() -> Result<Self> {
        let ts_grammar: Grammar = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let tsx_grammar: Grammar = tree_sitter_typescript::LANGUAGE_TSX.into();
        check_grammar(&ts_grammar, "TypeScript")?;
        check_grammar(&tsx_grammar, "TSX")?;
        Ok(Self {
            ts_grammar,
            tsx_grammar,
        })
    }

    fn grammar_for_file(&self, path: &str) -> &Grammar {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsx") => &self.tsx_grammar,
            _ => &self.ts_grammar,
        }
    }
}

impl LanguageExtractor for TypeScriptExtractor {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn file_extensions(&self) -> &[&str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn parse_file(&self, path: &str, content: &str) -> Result<ParsedFile> {
        parse_with(self.grammar_for_file(path), "TypeScript", path, content)
    }

    fn symbols(&self, parsed: &ParsedFile) -> Vec<Symbol> {
        walk(parsed, Language::TypeScript, false).symbols
    }

    fn imports(&self, parsed: &ParsedFile) -> Vec<DependencyRecord> {
        imports::extract_imports(parsed)
    }

    fn call_sites(&self, parsed: &ParsedFile) -> Vec<CallSite> {
        walk(parsed, Language::TypeScript, true).calls
    }
}

/// JavaScript/JSX language extractor using tree-sitter.
pub struct JavaScriptExtractor {
    grammar: Grammar,
}

impl JavaScriptExtractor {
    pub fn new() -> Result<Self> {
        let grammar: Grammar = tree_sitter_javascript::LANGUAGE.into();
        check_grammar(&grammar, "JavaScript")?;
        Ok(Self { grammar })
    }
}

impl LanguageExtractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn file_extensions(&self) -> &[&str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn parse_file(&self, path: &str, content: &str) -> Result<ParsedFile> {
        parse_with(&self.grammar, "JavaScript", path, content)
    }

    fn symbols(&self, parsed: &ParsedFile) -> Vec<Symbol> {
        walk(parsed, Language::JavaScript, false).symbols
    }

    fn imports(&self, parsed: &ParsedFile) -> Vec<DependencyRecord> {
        imports::extract_imports(parsed)
    }

    fn call_sites(&self, parsed: &ParsedFile) -> Vec<CallSite> {
        walk(parsed, Language::JavaScript, true).calls
    }
}

fn walk(parsed: &ParsedFile, language: Language, collect_calls: bool) -> Walker<'_> {
    let mut walker = Walker::new(&parsed.content, &parsed.path, language, collect_calls);
    walker.run(parsed.tree.root_node());
    walker
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts_symbols(content: &str) -> Vec<Symbol> {
        TypeScriptExtractor::new()
            .unwrap()
            .extract_symbols(content, "src/service.ts")
    }

    fn js_symbols(content: &str) -> Vec<Symbol> {
        JavaScriptExtractor::new()
            .unwrap()
            .extract_symbols(content, "lib/index.js")
    }

    fn find<'s>(symbols: &'s [Symbol], qualified: &str) -> &'s Symbol {
        symbols
            .iter()
            .find(|s| s.qualified_name == qualified)
            .unwrap_or_else(|| panic!("missing symbol {qualified}: {symbols:#?}"))
    }

    #[test]
    fn test_parse_typescript_interface() {
        let content = r#"
/** Persists users. */
export interface UserRepository extends Repository<User> {
    save(user: User): Promise<void>;
    findById(id: string): Promise<User | null>;
}
"#;
        let syms = ts_symbols(content);
        let repo = find(&syms, "UserRepository");
        assert_eq!(repo.kind, SymbolKind::Interface);
        assert!(repo.is_exported);
        assert_eq!(repo.documentation.as_deref(), Some("Persists users."));
        assert_eq!(repo.base_classes(), vec!["Repository<User>".to_string()]);

        let save = find(&syms, "UserRepository.save");
        assert_eq!(save.kind, SymbolKind::Method);
        assert_eq!(save.parent_class(), Some("UserRepository"));
        assert_eq!(save.metadata.get(keys::RETURN_TYPE), Some(&"Promise<void>".into()));
    }

    #[test]
    fn test_extract_class_with_heritage_and_members() {
        let content = r#"
export abstract class PostgresUserRepository extends BaseRepository implements UserRepository, Disposable {
    private pool: Pool;
    #cache = new Map();

    constructor(pool: Pool) {
        super();
        this.pool = pool;
    }

    async save(user: User): Promise<void> {
        await this.query(user);
    }

    protected static create(): PostgresUserRepository { return null as any; }

    abstract dispose(): void;

    get size(): number { return 0; }

    handle = (event: Event) => {
        this.save(event.user);
    };

    _internal() {}
}
"#;
        let syms = ts_symbols(content);
        let repo = find(&syms, "PostgresUserRepository");
        assert_eq!(repo.kind, SymbolKind::Class);
        assert_eq!(repo.metadata.get(keys::IS_ABSTRACT), Some(&true.into()));
        assert_eq!(repo.base_classes(), vec!["BaseRepository".to_string()]);
        assert_eq!(
            repo.interfaces(),
            vec!["UserRepository".to_string(), "Disposable".to_string()]
        );

        let ctor = find(&syms, "PostgresUserRepository.constructor");
        assert_eq!(ctor.metadata.get(keys::IS_CONSTRUCTOR), Some(&true.into()));

        let save = find(&syms, "PostgresUserRepository.save");
        assert_eq!(save.visibility, Visibility::Public);
        assert_eq!(save.metadata.get(keys::IS_ASYNC), Some(&true.into()));

        let create = find(&syms, "PostgresUserRepository.create");
        assert_eq!(create.visibility, Visibility::Protected);
        assert_eq!(create.metadata.get(keys::IS_STATIC), Some(&true.into()));

        let dispose = find(&syms, "PostgresUserRepository.dispose");
        assert_eq!(dispose.metadata.get(keys::IS_ABSTRACT), Some(&true.into()));

        let size = find(&syms, "PostgresUserRepository.size");
        assert_eq!(size.metadata.get(keys::IS_PROPERTY), Some(&true.into()));

        let handle = find(&syms, "PostgresUserRepository.handle");
        assert_eq!(handle.kind, SymbolKind::Method);
        assert_eq!(handle.metadata.get(keys::IS_ARROW), Some(&true.into()));

        assert_eq!(
            find(&syms, "PostgresUserRepository._internal").visibility,
            Visibility::Private
        );
        assert!(!syms.iter().any(|s| s.name == "pool" || s.name == "#cache"));
    }

    #[test]
    fn test_enums_type_aliases_and_namespaces() {
        let content = r#"
export enum Status { Active, Inactive }
const enum Flags { A = 1 }
export type UserId = string;
namespace Geometry {
    export function area(r: number): number { return r * r; }
    export namespace Inner {
        export class Point {}
    }
}
"#;
        let syms = ts_symbols(content);
        assert_eq!(find(&syms, "Status").kind, SymbolKind::Enum);
        assert!(find(&syms, "Status").is_exported);
        assert!(!find(&syms, "Flags").is_exported);

        let alias = find(&syms, "UserId");
        assert_eq!(alias.kind, SymbolKind::Interface);
        assert_eq!(alias.metadata.get(keys::IS_TYPE_ALIAS), Some(&true.into()));

        assert_eq!(find(&syms, "Geometry").kind, SymbolKind::Module);
        let area = find(&syms, "Geometry.area");
        assert_eq!(area.kind, SymbolKind::Function);
        assert!(area.is_exported);
        let point = find(&syms, "Geometry.Inner.Point");
        assert_eq!(point.depth(), 2);
    }

    #[test]
    fn test_function_forms() {
        let content = r#"
export default function main() {}
function* ids() { yield 1; }
export const fetchUser = async (id: string): Promise<User> => api.get(id);
const format = function (value) { return value; };
export const MAX_RETRIES = 3;
let counter = 0;
"#;
        let syms = ts_symbols(content);
        let main = find(&syms, "main");
        assert_eq!(main.metadata.get(keys::IS_DEFAULT_EXPORT), Some(&true.into()));
        assert!(main.is_exported);

        let ids = find(&syms, "ids");
        assert_eq!(ids.metadata.get(keys::IS_GENERATOR), Some(&true.into()));
        assert!(!ids.is_exported);

        let fetch = find(&syms, "fetchUser");
        assert_eq!(fetch.kind, SymbolKind::Function);
        assert_eq!(fetch.metadata.get(keys::IS_ARROW), Some(&true.into()));
        assert_eq!(fetch.metadata.get(keys::IS_ASYNC), Some(&true.into()));
        assert_eq!(fetch.metadata.get(keys::RETURN_TYPE), Some(&"Promise<User>".into()));

        assert_eq!(find(&syms, "format").kind, SymbolKind::Function);
        assert_eq!(find(&syms, "MAX_RETRIES").kind, SymbolKind::Constant);
        assert_eq!(find(&syms, "counter").kind, SymbolKind::Variable);
    }

    #[test]
    fn test_javascript_commonjs_idioms() {
        let content = r#"
function Animal(name) { this.name = name; }

Animal.prototype.speak = function () {
    return describe(this.name);
};

exports.describe = function (name) { return name; };

class Dog extends Animal {
    #secret = 1;
    bark() { this.speak(); }
}
"#;
        let syms = js_symbols(content);
        assert!(syms.iter().all(|s| s.language == Language::JavaScript));

        let speak = find(&syms, "Animal.speak");
        assert_eq!(speak.kind, SymbolKind::Method);
        assert_eq!(speak.parent_class(), Some("Animal"));
        assert_eq!(speak.metadata.get(keys::IS_PROTOTYPE_METHOD), Some(&true.into()));

        let describe = find(&syms, "describe");
        assert_eq!(describe.kind, SymbolKind::Function);
        assert!(describe.is_exported);

        let dog = find(&syms, "Dog");
        assert_eq!(dog.base_classes(), vec!["Animal".to_string()]);
        assert_eq!(find(&syms, "Dog.bark").kind, SymbolKind::Method);
    }

    #[test]
    fn test_imports() {
        let extractor = TypeScriptExtractor::new().unwrap();
        let content = r#"
import React from "react";
import { useState, useEffect as effect } from "react";
import * as path from "path";
import "./styles.css";
import type { User } from "../models/user";
import fs = require("fs");
export { helper } from "./helpers";
export * from "./types";
const lodash = require("lodash");
const { join, resolve: res } = require("path");
"#;
        let deps = extractor.extract_dependencies(content, "src/app.ts", None);
        let imports: Vec<&DependencyRecord> = deps.iter().filter(|d| d.is_import()).collect();
        let targets: Vec<&str> = imports.iter().map(|d| d.target.as_str()).collect();
        assert_eq!(
            targets,
            vec![
                "react",
                "react",
                "path",
                "./styles.css",
                "../models/user",
                "fs",
                "./helpers",
                "./types",
                "lodash",
                "path"
            ]
        );
        assert_eq!(imports[0].alias.as_deref(), Some("React"));
        assert_eq!(imports[1].imported_names, vec!["useState", "useEffect"]);
        assert_eq!(imports[1].alias.as_deref(), Some("effect"));
        assert!(imports[2].is_wildcard);
        assert!(!imports[3].is_external);
        assert!(!imports[4].is_external);
        assert_eq!(imports[5].alias.as_deref(), Some("fs"));
        assert_eq!(imports[6].imported_names, vec!["helper"]);
        assert!(imports[7].is_wildcard);
        assert_eq!(imports[8].alias.as_deref(), Some("lodash"));
        assert_eq!(imports[9].imported_names, vec!["join", "resolve"]);
        assert!(imports[0].is_external);
    }

    #[test]
    fn test_calls() {
        let extractor = JavaScriptExtractor::new().unwrap();
        let content = r#"
function helper() { return 1; }
function main() {
    helper();
    const user = new User();
    console.log(user);
}
"#;
        let deps = extractor.extract_dependencies(content, "main.js", None);
        let callees: Vec<&str> = deps.iter().filter_map(|d| d.callee.as_deref()).collect();
        assert_eq!(callees, vec!["helper", "User", "log"]);
        assert!(deps.iter().all(|d| d.caller.as_deref() == Some("main")));
        assert!(!deps[0].is_external);
        assert!(deps[1].is_external);
    }

    #[test]
    fn test_tsx_components() {
        let content = r#"
export const Greeting = ({ name }: Props) => <div>Hello {name}</div>;
export function App() { return <Greeting name="x" />; }
"#;
        let syms = TypeScriptExtractor::new()
            .unwrap()
            .extract_symbols(content, "src/App.tsx");
        assert!(syms.iter().any(|s| s.name == "Greeting" && s.kind == SymbolKind::Function));
        assert!(syms.iter().any(|s| s.name == "App" && s.is_exported));
    }

    #[test]
    fn test_malformed_input_does_not_fail() {
        let syms = ts_symbols("export class { ((( function");
        assert!(syms.iter().all(|s| !s.name.is_empty()));
        let syms = js_symbols("const = => {");
        assert!(syms.iter().all(|s| !s.name.is_empty()));
    }
}
