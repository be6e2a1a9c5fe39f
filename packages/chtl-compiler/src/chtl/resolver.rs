//! The semantic resolver (spec §4.5): inheritance merging, custom
//! specialization (`insert`/`delete`/`replace`/overrides) and the
//! constraint check that runs after specialization.
//!
//! Inheritance is computed as an explicit "effective body" value rather
//! than shared mutable parent pointers (spec §9): each usage clones its
//! resolved definition before applying any per-usage overrides, matching
//! `original_source`'s `Util/ASTCloner.cpp` (SPEC_FULL §11.5).

use super::ast::*;
use super::symbol_table::{Definition, SymbolTable};
use crate::error::{CompileError, Result};
use std::collections::HashSet;

pub struct Resolver<'a> {
    table: &'a SymbolTable,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Resolver { table }
    }

    /// Computes the fully-merged, specialization-applied body for a usage
    /// of `kind`/`custom`/`name` in `namespace`, ready to splice in place of
    /// the `Usage` node.
    pub fn resolve_usage(&self, namespace: &str, usage: &Usage, custom: bool) -> Result<Vec<Node>> {
        // `Shared::Box` names a specific namespace to look the definition up
        // in, overriding the ambient ancestor namespace entirely rather than
        // qualifying under it (spec §4.3's `namespace::name` usage form).
        let namespace = usage.namespace.as_deref().unwrap_or(namespace);
        let mut visiting = HashSet::new();
        let mut body = self.effective_body(namespace, usage.kind, custom, &usage.name, &mut visiting)?;

        if custom {
            if let Some(Definition::Custom(def)) =
                self.table.lookup(namespace, usage.kind, true, &usage.name)
            {
                for op in &def.deletes {
                    apply_delete(&mut body, op)?;
                }
                for op in &def.replaces {
                    apply_replace(&mut body, op)?;
                }
                for op in &def.inserts {
                    apply_insert(&mut body, op)?;
                }
            }
        }

        for over in &usage.overrides {
            apply_override(&mut body, over);
        }

        Ok(body)
    }

    /// Merges a definition's inherited chain into one body: parents merge
    /// first (in declaration order), the definition's own body merges last
    /// so its entries win on key collision (spec §4.5).
    fn effective_body(
        &self,
        namespace: &str,
        kind: DefinitionKind,
        custom: bool,
        name: &str,
        visiting: &mut HashSet<String>,
    ) -> Result<Vec<Node>> {
        let qualified = super::symbol_table::qualify(namespace, name);
        if !visiting.insert(qualified.clone()) {
            return Err(CompileError::semantic(
                "cyclic-inheritance",
                format!("`{name}` inherits from itself, directly or indirectly"),
                None,
            ));
        }

        let def = self.table.lookup(namespace, kind, custom, name).ok_or_else(|| {
            CompileError::semantic("undefined-reference", format!("no definition named `{name}`"), None)
        })?;

        let mut merged = Vec::new();
        for parent in def.inherits() {
            let parent_body = self.effective_body(namespace, kind, custom, parent, visiting)?;
            merged = merge_bodies(kind, merged, parent_body);
        }
        merged = merge_bodies(kind, merged, def_body(def).to_vec());

        visiting.remove(&qualified);
        Ok(merged)
    }

    /// Recursively replaces every `Usage` node (and `StyleChild::Usage`)
    /// with its resolved, specialized body, so the generator never has to
    /// look anything up in the symbol table itself.
    pub fn expand_tree(&self, namespace: &str, nodes: Vec<Node>) -> Result<Vec<Node>> {
        let mut out = Vec::new();
        for node in nodes {
            match node {
                Node::Usage(usage) => {
                    let lookup_ns = usage.namespace.as_deref().unwrap_or(namespace);
                    let custom = self.table.lookup(lookup_ns, usage.kind, true, &usage.name).is_some();
                    let expanded = self.resolve_usage(namespace, &usage, custom)?;
                    out.extend(self.expand_tree(namespace, expanded)?);
                }
                Node::Element(mut el) => {
                    el.children = self.expand_tree(namespace, el.children)?;
                    if let Some(style) = el.style.take() {
                        el.style = Some(self.expand_style(namespace, style)?);
                    }
                    out.push(Node::Element(el));
                }
                Node::Namespace(mut ns) => {
                    let child_ns = super::symbol_table::qualify(namespace, &ns.name);
                    ns.children = self.expand_tree(&child_ns, ns.children)?;
                    out.push(Node::Namespace(ns));
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn expand_style(&self, namespace: &str, style: Style) -> Result<Style> {
        let mut children = Vec::new();
        for child in style.children {
            match child {
                StyleChild::Usage(usage) => {
                    let lookup_ns = usage.namespace.as_deref().unwrap_or(namespace);
                    let custom = self.table.lookup(lookup_ns, usage.kind, true, &usage.name).is_some();
                    let expanded = self.resolve_usage(namespace, &usage, custom)?;
                    for node in expanded {
                        if let Node::Property(p) = node {
                            children.push(StyleChild::Property(p));
                        }
                    }
                }
                other => children.push(other),
            }
        }
        Ok(Style { children, span: style.span })
    }

    /// Walks a fully-specialized tree checking each `Constraint` node's
    /// forbidden set against its enclosing element's descendants (spec
    /// §4.5). Returns every violation found rather than stopping at the
    /// first, since constraint errors are semantic errors accumulated per
    /// file (spec §7).
    pub fn check_constraints(&self, nodes: &[Node]) -> Vec<CompileError> {
        let mut errors = Vec::new();
        walk_constraints(nodes, &mut errors);
        errors
    }
}

fn def_body(def: &Definition) -> &[Node] {
    match def {
        Definition::Template(t) => &t.body,
        Definition::Custom(c) => &c.body,
    }
}

/// Merge two definition bodies. `@Style`/`@Var` bodies are flat
/// property lists merged by name (later wins, spec §4.5); `@Element`
/// bodies are concatenated since elements have no natural override key.
fn merge_bodies(kind: DefinitionKind, base: Vec<Node>, overlay: Vec<Node>) -> Vec<Node> {
    if matches!(kind, DefinitionKind::Element) {
        let mut result = base;
        result.extend(overlay);
        return result;
    }
    let mut result: Vec<Node> = Vec::new();
    for node in base.into_iter().chain(overlay.into_iter()) {
        if let Node::Property(p) = &node {
            if let Some(existing) = result.iter_mut().find_map(|n| match n {
                Node::Property(existing) if existing.name == p.name => Some(existing),
                _ => None,
            }) {
                *existing = p.clone();
                continue;
            }
        }
        result.push(node);
    }
    result
}

fn anchor_matches(node: &Node, anchor: &Anchor, index: usize) -> bool {
    match anchor {
        Anchor::Index(i) => *i == index,
        Anchor::Tag(tag) => matches!(node, Node::Element(e) if &e.tag == tag),
        Anchor::Selector(sel) => match node {
            Node::Element(e) => {
                if let Some(id) = sel.strip_prefix('#') {
                    e.attributes.iter().any(|a| a.name == "id" && property_text(a) == Some(id.to_string()))
                } else if let Some(class) = sel.strip_prefix('.') {
                    e.attributes.iter().any(|a| {
                        a.name == "class"
                            && property_text(a)
                                .map(|v| v.split_whitespace().any(|c| c == class))
                                .unwrap_or(false)
                    })
                } else {
                    false
                }
            }
            _ => false,
        },
    }
}

fn property_text(prop: &Property) -> Option<String> {
    match &prop.value {
        Expr::Literal(Literal::Str(s)) => Some(s.clone()),
        _ => None,
    }
}

fn find_anchor_index(body: &[Node], anchor: &Anchor) -> Option<usize> {
    body.iter().enumerate().find(|(i, n)| anchor_matches(n, anchor, *i)).map(|(i, _)| i)
}

fn apply_delete(body: &mut Vec<Node>, op: &DeleteOp) -> Result<()> {
    match find_anchor_index(body, &op.anchor) {
        Some(idx) => {
            body.remove(idx);
            Ok(())
        }
        None => Err(CompileError::semantic(
            "unresolved-specialization-anchor",
            "`delete` anchor does not match anything in the custom's current body",
            Some(op.span.clone()),
        )),
    }
}

fn apply_replace(body: &mut Vec<Node>, op: &ReplaceOp) -> Result<()> {
    match find_anchor_index(body, &op.anchor) {
        Some(idx) => {
            body.splice(idx..=idx, op.payload.clone());
            Ok(())
        }
        None => Err(CompileError::semantic(
            "unresolved-specialization-anchor",
            "`replace` anchor does not match anything in the custom's current body",
            Some(op.span.clone()),
        )),
    }
}

fn apply_insert(body: &mut Vec<Node>, op: &InsertOp) -> Result<()> {
    match op.position {
        InsertPosition::AtTop => {
            body.splice(0..0, op.payload.clone());
            Ok(())
        }
        InsertPosition::AtBottom => {
            body.extend(op.payload.clone());
            Ok(())
        }
        InsertPosition::Before | InsertPosition::After | InsertPosition::Replace => {
            let anchor = op.anchor.as_ref().ok_or_else(|| {
                CompileError::semantic(
                    "missing-specialization-anchor",
                    "`insert before`/`after`/`replace` requires an anchor",
                    Some(op.span.clone()),
                )
            })?;
            match find_anchor_index(body, anchor) {
                Some(idx) => {
                    match op.position {
                        InsertPosition::Before => body.splice(idx..idx, op.payload.clone()),
                        InsertPosition::After => body.splice(idx + 1..idx + 1, op.payload.clone()),
                        InsertPosition::Replace => body.splice(idx..=idx, op.payload.clone()),
                        _ => unreachable!(),
                    };
                    Ok(())
                }
                None => Err(CompileError::semantic(
                    "unresolved-specialization-anchor",
                    "`insert` anchor does not match anything in the custom's current body",
                    Some(op.span.clone()),
                )),
            }
        }
    }
}

/// Per-usage local overrides: a property with the same name as one already
/// present replaces its value in place; anything else is appended.
fn apply_override(body: &mut [Node], over: &Node) {
    if let Node::Property(p) = over {
        if let Some(existing) = body.iter_mut().find_map(|n| match n {
            Node::Property(existing) if existing.name == p.name => Some(existing),
            _ => None,
        }) {
            existing.value = p.value.clone();
        }
    }
}

fn walk_constraints(nodes: &[Node], errors: &mut Vec<CompileError>) {
    for node in nodes {
        if let Node::Element(el) = node {
            let forbidden: Vec<&Constraint> = el
                .children
                .iter()
                .filter_map(|c| if let Node::Constraint(cn) = c { Some(cn) } else { None })
                .collect();
            if !forbidden.is_empty() {
                for child in &el.children {
                    if let Node::Element(child_el) = child {
                        for constraint in &forbidden {
                            if constraint.forbidden.iter().any(|f| f == &child_el.tag) {
                                errors.push(CompileError::semantic(
                                    "constraint-violation",
                                    format!("`{}` is forbidden inside `{}`", child_el.tag, el.tag),
                                    Some(constraint.span.clone()),
                                ));
                            }
                        }
                    }
                }
            }
            walk_constraints(&el.children, errors);
        }
    }
}
