use crate::{
    lang::ast::WordSeq,
    runtime::{
        data_structures::{symbol::Symbol, var_buffer::VarBuffer},
        interpreter::WordHandler,
    },
};
use std::{
    cell::{Ref, RefCell},
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// A native word implemented in Rust.
#[derive(Clone)]
pub struct Primitive {
    pub handler: Rc<WordHandler>,
    pub description: String,
    pub signature: String,
}

/// A compiled user word.  `free_var_index` is the first variable slot the word's own bind
/// constructs use and `captured_count` is how many slots of enclosing binds it can see.
#[derive(Clone)]
pub struct UserFunction {
    pub body: Rc<WordSeq>,
    pub free_var_index: usize,
    pub captured_count: usize,
}

/// A compiled body together with the variables it runs against.
#[derive(Clone)]
pub struct Closure {
    pub body: Rc<WordSeq>,
    pub buffer: Option<Rc<VarBuffer>>,
}

/// The payload of a function handle.  The handle's address never changes, only this payload,
/// so every node that resolved to a placeholder sees the final definition.
#[derive(Clone)]
pub enum FunctionKind {
    Primitive(Primitive),
    Placeholder,
    Named(UserFunction),
    Closure(Closure),
    Variable(usize),
}

impl FunctionKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FunctionKind::Primitive(_) => "primitive",
            FunctionKind::Placeholder => "placeholder",
            FunctionKind::Named(_) => "word",
            FunctionKind::Closure(_) => "closure",
            FunctionKind::Variable(_) => "variable",
        }
    }
}

pub struct Function {
    name: Option<Symbol>,
    kind: RefCell<FunctionKind>,
}

pub type FunctionRef = Rc<Function>;

impl Function {
    pub fn new(name: Option<Symbol>, kind: FunctionKind) -> FunctionRef {
        Rc::new(Function {
            name,
            kind: RefCell::new(kind),
        })
    }

    pub fn name(&self) -> Option<&Symbol> {
        self.name.as_ref()
    }

    /// The name used for the function in call stacks and dumps.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.name().to_string(),
            None => format!("<{}>", self.kind.borrow().kind_name()),
        }
    }

    pub fn kind(&self) -> Ref<'_, FunctionKind> {
        self.kind.borrow()
    }

    /// Replace the payload in place.
    pub fn define(&self, kind: FunctionKind) {
        *self.kind.borrow_mut() = kind;
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(*self.kind.borrow(), FunctionKind::Placeholder)
    }

    /// User functions are the ones a later declaration in the same scope would be a duplicate
    /// of. Anything else in a scope was put there by the host.
    pub fn is_user_function(&self) -> bool {
        matches!(
            *self.kind.borrow(),
            FunctionKind::Placeholder | FunctionKind::Named(_)
        )
    }

    /// How many enclosing variable slots a call to this function can see.  A placeholder has
    /// not been compiled yet, so it gets everything.
    pub fn captured_count(&self) -> usize {
        match &*self.kind.borrow() {
            FunctionKind::Named(user) => user.captured_count,
            FunctionKind::Placeholder => usize::MAX,
            _ => 0,
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = self.display_name();

        match &*self.kind.borrow() {
            FunctionKind::Primitive(primitive) => {
                write!(f, "{} {}", name, primitive.signature)?;

                if !primitive.description.is_empty() {
                    write!(f, "  # {}", primitive.description)?;
                }

                Ok(())
            }
            FunctionKind::Placeholder => write!(f, "{} (undefined)", name),
            FunctionKind::Named(user) => write!(f, "func {} : {}.", name, user.body),
            FunctionKind::Closure(closure) => write!(f, "{} [ {}]", name, closure.body),
            FunctionKind::Variable(slot) => write!(f, "{} -> slot {}", name, slot),
        }
    }
}

/// The owner of every function created while compiling.  Scopes and word sequences hold extra
/// handles, but only the registry ever tears a function down, and it does so exactly once for
/// the whole session.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RefCell<Vec<FunctionRef>>,
}

impl FunctionRegistry {
    pub fn new() -> FunctionRegistry {
        FunctionRegistry::default()
    }

    /// Create a function and take ownership of it.
    pub fn register(&self, name: Option<Symbol>, kind: FunctionKind) -> FunctionRef {
        let function = Function::new(name, kind);

        self.functions.borrow_mut().push(Rc::clone(&function));
        function
    }

    pub fn len(&self) -> usize {
        self.functions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear down every registered function.  Payloads are reset to placeholders, which drops the
    /// compiled bodies and with them the handle cycles recursive words create.  Any handle still
    /// held elsewhere stays valid, calling it is a run-time error.
    pub fn release_all(&self) {
        let functions = std::mem::take(&mut *self.functions.borrow_mut());

        log::debug!("Releasing {} registered functions.", functions.len());

        for function in &functions {
            function.define(FunctionKind::Placeholder);
        }
    }
}

impl Drop for FunctionRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::ast::{Node, Op},
        runtime::data_structures::symbol::SymbolTable,
    };

    fn body_calling(function: &FunctionRef) -> Rc<WordSeq> {
        let mut body = WordSeq::default();

        body.push(Node::new(1, Op::Call(Rc::clone(function))));
        Rc::new(body)
    }

    #[test]
    fn defining_a_placeholder_is_seen_through_every_handle() {
        let symbols = SymbolTable::new();
        let registry = FunctionRegistry::new();
        let function = registry.register(Some(symbols.intern("f")), FunctionKind::Placeholder);
        let alias = Rc::clone(&function);

        assert!(alias.is_placeholder());
        assert_eq!(alias.captured_count(), usize::MAX);

        function.define(FunctionKind::Named(UserFunction {
            body: Rc::new(WordSeq::default()),
            free_var_index: 0,
            captured_count: 0,
        }));

        assert!(!alias.is_placeholder());
        assert_eq!(alias.captured_count(), 0);
    }

    #[test]
    fn release_breaks_recursive_cycles() {
        let symbols = SymbolTable::new();
        let registry = FunctionRegistry::new();
        let function = registry.register(Some(symbols.intern("loop")), FunctionKind::Placeholder);

        function.define(FunctionKind::Named(UserFunction {
            body: body_calling(&function),
            free_var_index: 0,
            captured_count: 0,
        }));

        let watch = Rc::downgrade(&function);
        drop(function);

        assert!(watch.upgrade().is_some());
        drop(registry);
        assert!(watch.upgrade().is_none());
    }

    #[test]
    fn released_handles_become_placeholders() {
        let registry = FunctionRegistry::new();
        let function = registry.register(None, FunctionKind::Variable(0));

        registry.release_all();

        assert!(function.is_placeholder());
        assert!(registry.is_empty());
    }
}
