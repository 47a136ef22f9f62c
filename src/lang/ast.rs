use crate::runtime::data_structures::{
    function::FunctionRef, scope::ScopePtr, symbol::Symbol, value::Value,
};
use std::{
    cell::{Cell, RefCell},
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// One step of a word sequence.
#[derive(Clone)]
pub enum Op {
    /// Push an alias of a literal value.
    PushValue(Value),

    /// Call a word by name.  Compiling rewrites every one of these into a Call.
    Word(Symbol),

    /// Call a resolved function.
    Call(FunctionRef),

    /// Push a quoted block.
    Quote(Rc<Block>),

    /// `-> a b ; rest`, bind the top values of the stack to names while `rest` runs.
    Bind(Binding),

    /// `let decls in rest`, declarations visible only to `rest`.
    Let(LetBlock),
}

#[derive(Clone)]
pub struct Node {
    pub line: usize,
    pub op: Op,
}

impl Node {
    pub fn new(line: usize, op: Op) -> Node {
        Node { line, op }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.op {
            Op::PushValue(value) => write!(f, "{}", value.stringify()),
            Op::Word(symbol) => write!(f, "{}", symbol),
            Op::Call(function) => write!(f, "{}", function.display_name()),
            Op::Quote(block) => write!(f, "[ {}]", block.body()),
            Op::Bind(binding) => write!(f, "{}", binding),
            Op::Let(let_block) => write!(f, "{}", let_block),
        }
    }
}

/// A name as written in a bind or an import list.
#[derive(Clone)]
pub struct NameNode {
    pub line: usize,
    pub symbol: Symbol,
}

#[derive(Clone)]
pub struct Binding {
    pub names: Vec<NameNode>,
    pub body: WordSeq,

    /// The slot the first name is stored in, filled in by the compiler.
    pub base: usize,
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "->")?;

        for name in &self.names {
            write!(f, " {}", name.symbol)?;
        }

        write!(f, " ;")?;

        for node in self.body.iter() {
            write!(f, " {}", node)?;
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct LetBlock {
    pub decls: DeclSeq,
    pub body: WordSeq,
}

impl Display for LetBlock {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "let ")?;

        for decl in self.decls.iter() {
            write!(f, "{} ", decl)?;
        }

        write!(f, "in")?;

        for node in self.body.iter() {
            write!(f, " {}", node)?;
        }

        Ok(())
    }
}

/// An ordered list of steps.  Displayed with a trailing space after every step.
#[derive(Clone, Default)]
pub struct WordSeq {
    nodes: Vec<Node>,
}

impl WordSeq {
    pub fn new(nodes: Vec<Node>) -> WordSeq {
        WordSeq { nodes }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn extend(&mut self, other: WordSeq) {
        self.nodes.extend(other.nodes);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Display for WordSeq {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{} ", node)?;
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct FuncDecl {
    pub line: usize,
    pub symbol: Symbol,
    pub body: Rc<WordSeq>,
}

#[derive(Clone)]
pub struct ImportDecl {
    pub line: usize,
    pub module: String,

    /// With an alias every word is bound as `alias.word` instead of under its own name.
    pub alias: Option<Symbol>,

    /// The words to take from the module, None takes every word it declares.
    pub names: Option<Vec<NameNode>>,
}

#[derive(Clone)]
pub enum Declaration {
    Func(FuncDecl),
    Import(ImportDecl),
}

impl Declaration {
    pub fn line(&self) -> usize {
        match self {
            Declaration::Func(func) => func.line,
            Declaration::Import(import) => import.line,
        }
    }
}

impl Display for Declaration {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Declaration::Func(func) => write!(f, "func {} : {}.", func.symbol, func.body),
            Declaration::Import(import) => {
                write!(f, "import {}", import.module)?;

                if let Some(alias) = &import.alias {
                    write!(f, " as {}", alias)?;
                }

                if let Some(names) = &import.names {
                    write!(f, " (")?;

                    for name in names {
                        write!(f, " {}", name.symbol)?;
                    }

                    write!(f, " )")?;
                }

                write!(f, " .")
            }
        }
    }
}

/// The declarations of a compilation unit, in source order.
#[derive(Clone, Default)]
pub struct DeclSeq {
    decls: Vec<Declaration>,
}

impl DeclSeq {
    pub fn new(decls: Vec<Declaration>) -> DeclSeq {
        DeclSeq { decls }
    }

    pub fn push(&mut self, decl: Declaration) {
        self.decls.push(decl);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.decls.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Declaration> {
        self.decls.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl Display for DeclSeq {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for decl in &self.decls {
            writeln!(f, "{}", decl)?;
        }

        Ok(())
    }
}

/// A quoted word sequence.  The block remembers the scope it was written in and is compiled
/// against that scope the first time it runs, after which the scope is let go.  Every value made
/// from the block shares the one compiled body.
pub struct Block {
    line: usize,
    body: RefCell<Rc<WordSeq>>,
    environment: RefCell<Option<ScopePtr>>,
    captured_count: Cell<usize>,
    compiled: Cell<bool>,
}

impl Block {
    pub fn new(line: usize, body: WordSeq) -> Block {
        Block {
            line,
            body: RefCell::new(Rc::new(body)),
            environment: RefCell::new(None),
            captured_count: Cell::new(0),
            compiled: Cell::new(false),
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn body(&self) -> Rc<WordSeq> {
        Rc::clone(&self.body.borrow())
    }

    /// Record the scope the block was written in.  The block captures every variable slot that
    /// scope can see.
    pub fn attach(&self, scope: &ScopePtr) {
        if self.compiled.get() {
            return;
        }

        self.captured_count.set(scope.vars_below());
        *self.environment.borrow_mut() = Some(Rc::clone(scope));
    }

    pub fn environment(&self) -> Option<ScopePtr> {
        self.environment.borrow().clone()
    }

    pub fn captured_count(&self) -> usize {
        self.captured_count.get()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get()
    }

    /// Install the resolved body and release the scope it was resolved in.
    pub fn finish(&self, body: Rc<WordSeq>) {
        *self.body.borrow_mut() = body;
        *self.environment.borrow_mut() = None;
        self.compiled.set(true);
    }
}
