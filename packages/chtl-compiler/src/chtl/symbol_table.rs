//! The global symbol table (spec §3.6, SPEC_FULL §11.4): templates,
//! customs, variables, imports, configuration, constraints and origin
//! blocks, all keyed by qualified name `namespace::local`. One instance is
//! owned by a `CompileContext` for the lifetime of a single compilation
//! (spec §5) — never a process-wide static.

use super::ast::{ConfigurationNode, CustomDefinition, DefinitionKind, TemplateDefinition};
use crate::config::Configuration;
use crate::error::{CompileError, Result};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Qualified name: `namespace::local`, with `""` meaning the root namespace.
pub fn qualify(namespace: &str, local: &str) -> String {
    if namespace.is_empty() {
        local.to_string()
    } else {
        format!("{namespace}::{local}")
    }
}

#[derive(Debug, Clone)]
pub enum Definition {
    Template(TemplateDefinition),
    Custom(CustomDefinition),
}

impl Definition {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            Definition::Template(t) => t.kind,
            Definition::Custom(c) => c.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Definition::Template(t) => &t.name,
            Definition::Custom(c) => &c.name,
        }
    }

    pub fn inherits(&self) -> &[String] {
        match self {
            Definition::Template(t) => &t.inherits,
            Definition::Custom(c) => &c.inherits,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Definition::Custom(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub absolute_path: String,
    pub kind: super::ast::ImportKind,
}

/// A namespace node in the parent/child tree (spec §3.7: acyclic by
/// construction — registration walks up from a child and refuses to link a
/// namespace as its own ancestor).
#[derive(Debug, Clone, Default)]
pub struct NamespaceNode {
    pub parent: Option<String>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    /// One map per (definition kind, is_custom) pair, keyed by qualified
    /// name, mirrors spec §3.6's six disjoint definition maps.
    style_templates: IndexMap<String, Definition>,
    element_templates: IndexMap<String, Definition>,
    var_templates: IndexMap<String, Definition>,
    style_customs: IndexMap<String, Definition>,
    element_customs: IndexMap<String, Definition>,
    var_customs: IndexMap<String, Definition>,

    variables: IndexMap<String, String>,
    imports: IndexMap<String, ImportRecord>,
    pub configuration: Configuration,
    /// scope path (e.g. `namespace::Element`) -> forbidden tag/type names.
    constraints: IndexMap<String, HashSet<String>>,
    origin_blocks: IndexMap<String, String>,
    namespaces: HashMap<String, NamespaceNode>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn map_for(&self, kind: DefinitionKind, custom: bool) -> &IndexMap<String, Definition> {
        match (kind, custom) {
            (DefinitionKind::Style, false) => &self.style_templates,
            (DefinitionKind::Element, false) => &self.element_templates,
            (DefinitionKind::Var, false) => &self.var_templates,
            (DefinitionKind::Style, true) => &self.style_customs,
            (DefinitionKind::Element, true) => &self.element_customs,
            (DefinitionKind::Var, true) => &self.var_customs,
        }
    }

    fn map_for_mut(&mut self, kind: DefinitionKind, custom: bool) -> &mut IndexMap<String, Definition> {
        match (kind, custom) {
            (DefinitionKind::Style, false) => &mut self.style_templates,
            (DefinitionKind::Element, false) => &mut self.element_templates,
            (DefinitionKind::Var, false) => &mut self.var_templates,
            (DefinitionKind::Style, true) => &mut self.style_customs,
            (DefinitionKind::Element, true) => &mut self.element_customs,
            (DefinitionKind::Var, true) => &mut self.var_customs,
        }
    }

    /// Registers a definition under `namespace`. Fails per spec §3.7: a
    /// template name must be unique within its namespace-and-kind unless
    /// this is an aliased import (`allow_redefine`).
    pub fn define(
        &mut self,
        namespace: &str,
        def: Definition,
        allow_redefine: bool,
    ) -> Result<()> {
        let qualified = qualify(namespace, def.name());
        let custom = def.is_custom();
        let map = self.map_for_mut(def.kind(), custom);
        if !allow_redefine && map.contains_key(&qualified) {
            return Err(CompileError::semantic(
                "duplicate-definition",
                format!("`{qualified}` is already defined"),
                None,
            ));
        }
        map.insert(qualified, def);
        Ok(())
    }

    pub fn lookup(&self, namespace: &str, kind: DefinitionKind, custom: bool, name: &str) -> Option<&Definition> {
        let qualified = qualify(namespace, name);
        self.map_for(kind, custom)
            .get(&qualified)
            .or_else(|| self.map_for(kind, custom).get(name))
    }

    pub fn define_variable(&mut self, namespace: &str, name: &str, value: impl Into<String>) {
        self.variables.insert(qualify(namespace, name), value.into());
    }

    pub fn lookup_variable(&self, namespace: &str, name: &str) -> Option<&str> {
        self.variables
            .get(&qualify(namespace, name))
            .or_else(|| self.variables.get(name))
            .map(String::as_str)
    }

    pub fn register_import(&mut self, name: &str, record: ImportRecord) {
        self.imports.insert(name.to_string(), record);
    }

    pub fn lookup_import(&self, name: &str) -> Option<&ImportRecord> {
        self.imports.get(name)
    }

    /// Registers `child` as a sub-namespace of `parent`, rejecting the
    /// registration if it would create a cycle (spec §3.7).
    pub fn register_namespace(&mut self, child: &str, parent: Option<&str>) -> Result<()> {
        if let Some(parent_name) = parent {
            let mut cursor = Some(parent_name.to_string());
            while let Some(name) = cursor {
                if name == child {
                    return Err(CompileError::semantic(
                        "cyclic-namespace",
                        format!("namespace `{child}` cannot be its own ancestor"),
                        None,
                    ));
                }
                cursor = self.namespaces.get(&name).and_then(|n| n.parent.clone());
            }
        }
        self.namespaces.insert(
            child.to_string(),
            NamespaceNode { parent: parent.map(str::to_string) },
        );
        Ok(())
    }

    pub fn add_constraint(&mut self, scope: &str, forbidden: impl IntoIterator<Item = String>) {
        self.constraints.entry(scope.to_string()).or_default().extend(forbidden);
    }

    pub fn constraints_for(&self, scope: &str) -> Option<&HashSet<String>> {
        self.constraints.get(scope)
    }

    pub fn register_origin_block(&mut self, name: &str, text: impl Into<String>) {
        self.origin_blocks.insert(name.to_string(), text.into());
    }

    pub fn lookup_origin_block(&self, name: &str) -> Option<&str> {
        self.origin_blocks.get(name).map(String::as_str)
    }

    pub fn apply_configuration(&mut self, node: &ConfigurationNode) {
        for (key, value) in &node.entries {
            self.configuration.set(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_util::{Position, SourceFile, Span};
    use std::rc::Rc;

    fn dummy_span() -> Span {
        let file = Rc::new(SourceFile::new("x", "t.chtl"));
        let p = Position::start_of(file);
        Span::new(p.clone(), p)
    }

    fn style_template(name: &str) -> Definition {
        Definition::Template(TemplateDefinition {
            kind: DefinitionKind::Style,
            name: name.to_string(),
            body: Vec::new(),
            inherits: Vec::new(),
            span: dummy_span(),
        })
    }

    #[test]
    fn duplicate_definition_in_same_namespace_fails() {
        let mut table = SymbolTable::new();
        table.define("", style_template("T"), false).unwrap();
        let err = table.define("", style_template("T"), false).unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }

    #[test]
    fn same_name_in_different_namespaces_is_fine() {
        let mut table = SymbolTable::new();
        table.define("a", style_template("T"), false).unwrap();
        table.define("b", style_template("T"), false).unwrap();
        assert!(table.lookup("a", DefinitionKind::Style, false, "T").is_some());
        assert!(table.lookup("b", DefinitionKind::Style, false, "T").is_some());
    }

    #[test]
    fn namespace_cycle_is_rejected() {
        let mut table = SymbolTable::new();
        table.register_namespace("a", None).unwrap();
        table.register_namespace("b", Some("a")).unwrap();
        assert!(table.register_namespace("a", Some("b")).is_err());
    }

    #[test]
    fn origin_blocks_round_trip() {
        let mut table = SymbolTable::new();
        table.register_origin_block("Banner", "<b>hi</b>");
        assert_eq!(table.lookup_origin_block("Banner"), Some("<b>hi</b>"));
    }
}
