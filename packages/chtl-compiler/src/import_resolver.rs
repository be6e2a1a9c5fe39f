//! The import resolver (spec §4.4): finds an `[Import]` target on disk and
//! reads it. Grounded on `original_source`'s `ImportManager`: a fixed
//! search-path list tried in order, a read-through file cache, and a
//! loaded/loading set that turns re-imports into cache hits and import
//! cycles into no-ops rather than errors. `@Chtl` recursion back through the
//! CHTL pipeline is owned by `driver`, which is the only caller that also
//! holds the `CompileContext` needed to do it; this module only resolves
//! paths and reads bytes.

use crate::chtl::ast::{Import, ImportKind};
use crate::chtl::symbol_table::{ImportRecord, SymbolTable};
use crate::error::{CompileError, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Module metadata read from a CMOD/CJMOD package's `info/` subtree (spec
/// §6.5).
#[derive(Debug, Clone, Default)]
pub struct ModuleInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub dependencies: Vec<String>,
    pub category: Option<String>,
    pub min_chtl_version: Option<String>,
    pub max_chtl_version: Option<String>,
}

/// Per-compilation import state: the search path, a read-through file
/// cache, and which canonical paths are mid-load (cycle detection) or
/// already loaded (cache hit, spec §4.4 "cycle tolerated as empty").
pub struct ImportResolver {
    search_paths: Vec<PathBuf>,
    file_cache: HashMap<PathBuf, String>,
    loading: HashSet<PathBuf>,
    loaded: HashSet<PathBuf>,
}

/// What a resolved `@Chtl` import needs from its caller: the canonical path
/// to feed back through `driver::populate_symbol_table`, or `None` if this
/// path is a cache hit / cycle re-entry the caller should skip.
pub enum ChtlTarget {
    Load(PathBuf),
    AlreadyLoaded,
}

impl ImportResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        ImportResolver {
            search_paths,
            file_cache: HashMap::new(),
            loading: HashSet::new(),
            loaded: HashSet::new(),
        }
    }

    /// Search order (spec §4.4): absolute path as given, relative to the
    /// importing file's directory, a `module/` subdirectory next to it,
    /// then each configured module root in order.
    pub fn find_file(&self, raw_path: &str, importing_file: &Path) -> Option<PathBuf> {
        let candidate = Path::new(raw_path);
        if candidate.is_absolute() && candidate.exists() {
            return Some(candidate.to_path_buf());
        }

        let base = importing_file.parent().unwrap_or_else(|| Path::new("."));
        let relative = base.join(raw_path);
        if relative.exists() {
            return Some(relative);
        }

        let in_module_dir = base.join("module").join(raw_path);
        if in_module_dir.exists() {
            return Some(in_module_dir);
        }

        for root in &self.search_paths {
            let full = root.join(raw_path);
            if full.exists() {
                return Some(full);
            }
        }
        None
    }

    pub fn read_cached(&mut self, path: &Path) -> Result<String> {
        if let Some(content) = self.file_cache.get(path) {
            return Ok(content.clone());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io(format!("cannot read `{}`: {e}", path.display())))?
            .replace("\r\n", "\n");
        self.file_cache.insert(path.to_path_buf(), content.clone());
        Ok(content)
    }

    /// Resolves `import` to a file and, for `@Html`/`@Css`/`@JavaScript`,
    /// registers its raw text directly as an origin block under its alias
    /// (or path) so the generator can re-emit it verbatim wherever that
    /// name is referenced. `@Chtl` and `@CJmod` are handled by the caller
    /// ([`ImportResolver::begin_chtl_load`] / `resolve_cjmod_package`)
    /// since they need to mutate more than one table.
    pub fn resolve_raw(&mut self, import: &Import, importing_file: &Path, table: &mut SymbolTable) -> Result<()> {
        let canonical = self.locate(import, importing_file)?;
        let content = self.read_cached(&canonical)?;
        let name = import.alias.clone().unwrap_or_else(|| import.path.clone());
        table.register_import(
            &name,
            ImportRecord { absolute_path: canonical.to_string_lossy().into_owned(), kind: import.kind.clone() },
        );
        table.register_origin_block(&name, content);
        Ok(())
    }

    fn locate(&self, import: &Import, importing_file: &Path) -> Result<PathBuf> {
        let resolved = self.find_file(&import.path, importing_file).ok_or_else(|| {
            CompileError::import(
                "unresolved-import",
                format!("cannot find import target `{}`", import.path),
                Some(import.span.clone()),
            )
        })?;
        Ok(resolved.canonicalize().unwrap_or(resolved))
    }

    /// Marks a `@Chtl` import as starting to load, returning
    /// [`ChtlTarget::AlreadyLoaded`] if it's a cache hit or a cycle
    /// re-entry the caller should treat as a no-op (spec §4.4). The caller
    /// must call [`ImportResolver::finish_chtl_load`] once parsing of the
    /// returned path completes.
    pub fn begin_chtl_load(&mut self, import: &Import, importing_file: &Path) -> Result<ChtlTarget> {
        let canonical = self.locate(import, importing_file)?;
        if self.loaded.contains(&canonical) || !self.loading.insert(canonical.clone()) {
            return Ok(ChtlTarget::AlreadyLoaded);
        }
        Ok(ChtlTarget::Load(canonical))
    }

    pub fn finish_chtl_load(&mut self, path: PathBuf) {
        self.loading.remove(&path);
        self.loaded.insert(path);
    }

    /// CMOD/CJMOD packages follow an `info/` + `src/` layout (spec §6.5): an
    /// `info/` text file carries `key: value` metadata, `[Export]`
    /// enumerates what's visible, and `src/` holds the actual CHTL/CJMOD
    /// source merged into the importing namespace.
    pub fn read_module_info(&mut self, package_dir: &Path) -> Result<ModuleInfo> {
        let info_dir = package_dir.join("info");
        let mut info = ModuleInfo::default();
        if !info_dir.is_dir() {
            return Ok(info);
        }
        for entry in std::fs::read_dir(&info_dir)
            .map_err(|e| CompileError::io(format!("cannot read `{}`: {e}", info_dir.display())))?
        {
            let entry = entry.map_err(|e| CompileError::io(e.to_string()))?;
            let content = self.read_cached(&entry.path())?;
            for line in content.lines() {
                let Some((key, value)) = line.split_once(':') else { continue };
                let key = key.trim();
                let value = value.trim().trim_matches(|c| c == '"' || c == ';').to_string();
                match key {
                    "name" => info.name = Some(value),
                    "version" => info.version = Some(value),
                    "description" => info.description = Some(value),
                    "author" => info.author = Some(value),
                    "license" => info.license = Some(value),
                    "category" => info.category = Some(value),
                    "min_chtl_version" => info.min_chtl_version = Some(value),
                    "max_chtl_version" => info.max_chtl_version = Some(value),
                    "dependencies" => info.dependencies = value.split(',').map(|s| s.trim().to_string()).collect(),
                    _ => {}
                }
            }
        }
        Ok(info)
    }

    /// CJMOD packages are registered as a bare import record; the builtin
    /// CJMOD API (`crate::cjmod`) is what actually dispatches their syntax
    /// at scan/generate time (spec §4.8). Resolving the package only needs
    /// to make its metadata available to that layer.
    pub fn resolve_cjmod_package(&mut self, import: &Import, importing_file: &Path, table: &mut SymbolTable) -> Result<()> {
        let canonical = self.locate(import, importing_file)?;
        let info = self.read_module_info(&canonical)?;
        let name = info
            .name
            .or_else(|| canonical.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| import.path.clone());
        table.register_import(
            &name,
            ImportRecord { absolute_path: canonical.to_string_lossy().into_owned(), kind: ImportKind::CJmod },
        );
        Ok(())
    }
}

/// Merges an `[Export]` node's entries into `table` under `namespace` by
/// re-registering each named definition the module already defined there
/// (spec §6.5: "`[Export]` enumerates exported templates/customs/variables
/// by kind"). Anything not listed stays private to the imported module.
pub fn apply_exports(
    exports: &[crate::chtl::ast::Node],
    source_namespace: &str,
    target_namespace: &str,
    table: &mut SymbolTable,
) {
    for node in exports {
        let crate::chtl::ast::Node::Export(export) = node else { continue };
        for entry in &export.entries {
            for custom in [true, false] {
                if let Some(def) = table.lookup(source_namespace, entry.kind, custom, &entry.name).cloned() {
                    let _ = table.define(target_namespace, def, true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_file_checks_relative_to_importing_file() {
        let dir = std::env::temp_dir().join("chtl_import_resolver_test");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("dep.chtl");
        std::fs::write(&target, "div {}").unwrap();
        let resolver = ImportResolver::new(Vec::new());
        let importing_file = dir.join("main.chtl");
        let found = resolver.find_file("dep.chtl", &importing_file);
        assert_eq!(found, Some(target.clone()));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn find_file_falls_back_to_search_paths() {
        let dir = std::env::temp_dir().join("chtl_import_resolver_test_modroot");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("shared.chtl");
        std::fs::write(&target, "div {}").unwrap();
        let resolver = ImportResolver::new(vec![dir.clone()]);
        let importing_file = PathBuf::from("/nowhere/main.chtl");
        let found = resolver.find_file("shared.chtl", &importing_file);
        assert_eq!(found, Some(target));
        std::fs::remove_dir_all(&dir).ok();
    }
}
