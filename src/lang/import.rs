use crate::{
    lang::{
        compilation::{Compiler, ModuleImporter},
        diagnostics::{CompileError, Diagnostics},
        parser::parse_unit,
    },
    runtime::data_structures::{
        function::FunctionRegistry,
        scope::{Scope, ScopePtr},
        symbol::SymbolTable,
    },
};
use std::{
    collections::{HashMap, HashSet},
    fs::read_to_string,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Finds module files along a colon separated search path.
#[derive(Clone, Debug)]
pub struct ModuleResolver {
    search_path: Vec<PathBuf>,
    extension: String,
}

impl ModuleResolver {
    pub fn new(search_path: &str, extension: &str) -> ModuleResolver {
        ModuleResolver {
            search_path: search_path
                .split(':')
                .filter(|directory| !directory.is_empty())
                .map(PathBuf::from)
                .collect(),
            extension: extension.to_string(),
        }
    }

    pub fn search_path(&self) -> &Vec<PathBuf> {
        &self.search_path
    }

    /// Find the file for a module name, adding the source extension if the name lacks it.
    pub fn resolve(&self, module: &str) -> Option<PathBuf> {
        let suffix = format!(".{}", self.extension);

        let name = if module.ends_with(&suffix) {
            module.to_string()
        } else {
            format!("{}{}", module, suffix)
        };

        self.find_file(&name)
    }

    /// Find a file relative to the first search path directory that has it.  Absolute paths are
    /// taken as they are.
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);

        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }

        self.search_path
            .iter()
            .map(|directory| directory.join(path))
            .find(|candidate| candidate.is_file())
    }
}

/// The modules compiled so far in a session, keyed by canonical path.  Each module file is
/// compiled once no matter how many units import it.
#[derive(Default)]
pub struct ModuleCache {
    loaded: HashMap<PathBuf, ScopePtr>,
    loading: HashSet<PathBuf>,
}

impl ModuleCache {
    pub fn new() -> ModuleCache {
        ModuleCache::default()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.loading.clear();
    }
}

/// Loads, parses and compiles imported modules.  A module is compiled into a fresh child of the
/// library scope, so it sees the library but nothing of the unit that imported it.
pub struct ModuleLoader<'a> {
    symbols: &'a SymbolTable,
    resolver: &'a ModuleResolver,
    cache: &'a mut ModuleCache,
    library: ScopePtr,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        resolver: &'a ModuleResolver,
        cache: &'a mut ModuleCache,
        library: &ScopePtr,
    ) -> ModuleLoader<'a> {
        ModuleLoader {
            symbols,
            resolver,
            cache,
            library: Rc::clone(library),
        }
    }

    fn load(
        &mut self,
        registry: &FunctionRegistry,
        diagnostics: &mut Diagnostics,
        path: &Path,
        module: &str,
        line: usize,
    ) -> Result<ScopePtr, CompileError> {
        let failed = |message: String| CompileError::ModuleFailed {
            module: module.to_string(),
            line,
            message,
        };

        let source = read_to_string(path).map_err(|error| failed(error.to_string()))?;

        let mut decls = parse_unit(self.symbols, &path.display().to_string(), &source)
            .map_err(|error| failed(error.to_string()))?;

        let scope = Scope::new_child(&self.library);

        Compiler::new(registry, diagnostics)
            .with_importer(self)
            .compile(&scope, &mut decls)
            .map_err(|failure| {
                let messages: Vec<String> = failure.errors.iter().map(|error| error.to_string()).collect();
                failed(messages.join("; "))
            })?;

        Ok(scope)
    }
}

impl ModuleImporter for ModuleLoader<'_> {
    fn import_module(
        &mut self,
        registry: &FunctionRegistry,
        diagnostics: &mut Diagnostics,
        module: &str,
        line: usize,
    ) -> Result<ScopePtr, CompileError> {
        let Some(path) = self.resolver.resolve(module) else {
            return Err(CompileError::ModuleNotFound {
                module: module.to_string(),
                line,
            });
        };

        let key = path.canonicalize().unwrap_or(path);

        if let Some(scope) = self.cache.loaded.get(&key) {
            log::debug!("Module {} already loaded from {}.", module, key.display());
            return Ok(Rc::clone(scope));
        }

        if !self.cache.loading.insert(key.clone()) {
            return Err(CompileError::CircularImport {
                module: module.to_string(),
                line,
            });
        }

        log::debug!("Loading module {} from {}.", module, key.display());

        let result = self.load(registry, diagnostics, &key, module, line);

        let _ = self.cache.loading.remove(&key);

        let scope = result?;

        let _ = self.cache.loaded.insert(key, Rc::clone(&scope));
        Ok(scope)
    }

    fn symbols(&self) -> &SymbolTable {
        self.symbols
    }
}
