use crate::{
    lang::{
        ast::{
            Binding, Block, DeclSeq, Declaration, FuncDecl, ImportDecl, LetBlock, NameNode, Node,
            Op, WordSeq,
        },
        source_buffer::SourceLocation,
        tokenizing::{NumberType, Punct, Token, TokenList, tokenize_from_source},
    },
    runtime::data_structures::{
        symbol::SymbolTable,
        value::{ListLiteral, Value},
    },
};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{location}: unterminated string literal")]
    UnterminatedString { location: SourceLocation },

    #[error("{location}: unexpected new line in string literal")]
    NewlineInString { location: SourceLocation },

    #[error("{location}: malformed number ‘{text}’")]
    BadNumber {
        location: SourceLocation,
        text: String,
    },

    #[error("{location}: expected {expected} but found ‘{found}’")]
    Unexpected {
        location: SourceLocation,
        expected: String,
        found: String,
    },

    #[error("{path}: unexpected end of input, expected {expected}")]
    UnexpectedEnd { path: String, expected: String },
}

impl ParseError {
    /// The line the error was found on.  Running out of input has no line of its own.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnterminatedString { location }
            | ParseError::NewlineInString { location }
            | ParseError::BadNumber { location, .. }
            | ParseError::Unexpected { location, .. } => Some(location.line()),
            ParseError::UnexpectedEnd { .. } => None,
        }
    }
}

/// Read a whole compilation unit, a sequence of declarations.
pub fn parse_unit(symbols: &SymbolTable, path: &str, source: &str) -> Result<DeclSeq, ParseError> {
    let tokens = tokenize_from_source(path, source)?;
    let mut parser = Parser::new(symbols, path, tokens);

    let decls = parser.declarations()?;
    parser.expect_end("a declaration")?;

    Ok(decls)
}

/// Read a bare word sequence, as typed at the REPL.
pub fn parse_words(symbols: &SymbolTable, path: &str, source: &str) -> Result<WordSeq, ParseError> {
    let tokens = tokenize_from_source(path, source)?;
    let mut parser = Parser::new(symbols, path, tokens);

    let words = parser.words()?;
    parser.expect_end("a word")?;

    Ok(words)
}

/// Recursive descent over a token list.  Words are interned as they're read.
struct Parser<'a> {
    symbols: &'a SymbolTable,
    path: String,
    tokens: TokenList,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(symbols: &'a SymbolTable, path: &str, tokens: TokenList) -> Parser<'a> {
        Parser {
            symbols,
            path: path.to_string(),
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();

        if token.is_some() {
            self.position += 1;
        }

        token
    }

    fn unexpected<T>(&self, token: Option<&Token>, expected: &str) -> Result<T, ParseError> {
        Err(match token {
            Some(token) => ParseError::Unexpected {
                location: token.location().clone(),
                expected: expected.to_string(),
                found: token.to_string(),
            },
            None => ParseError::UnexpectedEnd {
                path: self.path.clone(),
                expected: expected.to_string(),
            },
        })
    }

    fn expect_end(&self, expected: &str) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            token => self.unexpected(token, expected),
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> Result<Token, ParseError> {
        match self.next() {
            Some(token) if token.is_punct(punct) => Ok(token),
            token => self.unexpected(token.as_ref(), &format!("‘{}’", punct.text())),
        }
    }

    fn expect_name(&mut self, expected: &str) -> Result<(usize, String), ParseError> {
        match self.next() {
            Some(Token::Word(location, name)) => Ok((location.line(), name)),
            token => self.unexpected(token.as_ref(), expected),
        }
    }

    fn at_declaration(&self) -> bool {
        matches!(self.peek(), Some(token) if token.is_word("func") || token.is_word("import"))
    }

    /// decl*
    fn declarations(&mut self) -> Result<DeclSeq, ParseError> {
        let mut decls = DeclSeq::default();

        while self.at_declaration() {
            decls.push(self.declaration()?);
        }

        Ok(decls)
    }

    /// "func" WORD ":" words "." | "import" WORD ( "as" WORD )? ( "(" WORD* ")" )? "."?
    fn declaration(&mut self) -> Result<Declaration, ParseError> {
        let Some(keyword) = self.next() else {
            return self.unexpected(None, "a declaration");
        };

        if keyword.is_word("import") {
            return self.import(keyword.line());
        }

        let (line, name) = self.expect_name("a word name")?;

        self.expect_punct(Punct::Colon)?;
        let body = self.words()?;
        self.expect_punct(Punct::Dot)?;

        Ok(Declaration::Func(FuncDecl {
            line,
            symbol: self.symbols.intern(&name),
            body: Rc::new(body),
        }))
    }

    fn import(&mut self, line: usize) -> Result<Declaration, ParseError> {
        let module = match self.next() {
            Some(Token::Word(_, module)) | Some(Token::String(_, module)) => module,
            token => return self.unexpected(token.as_ref(), "a module name"),
        };

        let mut alias = None;

        if matches!(self.peek(), Some(token) if token.is_word("as")) {
            let _ = self.next();
            let (_, name) = self.expect_name("an alias for the module")?;

            alias = Some(self.symbols.intern(&name));
        }

        let mut names = None;

        if matches!(self.peek(), Some(token) if token.is_punct(Punct::OpenParen)) {
            let _ = self.next();
            let mut list = Vec::new();

            while !matches!(self.peek(), Some(token) if token.is_punct(Punct::CloseParen)) {
                let (line, name) = self.expect_name("a word name or ‘)’")?;

                list.push(NameNode {
                    line,
                    symbol: self.symbols.intern(&name),
                });
            }

            let _ = self.next();
            names = Some(list);
        }

        if matches!(self.peek(), Some(token) if token.is_punct(Punct::Dot)) {
            let _ = self.next();
        }

        Ok(Declaration::Import(ImportDecl {
            line,
            module,
            alias,
            names,
        }))
    }

    /// item*, stopping at any closing punctuation or the end of input.
    fn words(&mut self) -> Result<WordSeq, ParseError> {
        let mut words = WordSeq::default();

        loop {
            let Some(token) = self.peek() else {
                break;
            };

            let ends_sequence = matches!(
                token,
                Token::Punct(
                    _,
                    Punct::Dot
                        | Punct::CloseBracket
                        | Punct::CloseBrace
                        | Punct::CloseParen
                        | Punct::Comma
                )
            );

            if ends_sequence {
                break;
            }

            self.item(&mut words)?;
        }

        Ok(words)
    }

    fn item(&mut self, words: &mut WordSeq) -> Result<(), ParseError> {
        let Some(token) = self.next() else {
            return self.unexpected(None, "a word");
        };

        let line = token.line();

        let op = match token {
            Token::Number(_, NumberType::Int(value)) => Op::PushValue(Value::Int(value)),
            Token::Number(_, NumberType::Float(value)) => Op::PushValue(Value::Float(value)),
            Token::String(_, text) => Op::PushValue(Value::String(Rc::from(text.as_str()))),
            Token::Symbol(_, name) => Op::PushValue(Value::Symbol(self.symbols.intern(&name))),

            Token::Word(_, word) if word == "let" => Op::Let(self.let_block()?),
            Token::Word(_, word) => Op::Word(self.symbols.intern(&word)),

            Token::Punct(_, Punct::OpenBracket) => {
                let body = self.words()?;
                self.expect_punct(Punct::CloseBracket)?;

                Op::Quote(Rc::new(Block::new(line, body)))
            }

            Token::Punct(_, Punct::OpenBrace) => Op::PushValue(self.list()?),

            Token::Punct(_, Punct::OpenParen) => {
                let group = self.words()?;
                self.expect_punct(Punct::CloseParen)?;

                words.extend(group);
                return Ok(());
            }

            Token::Punct(_, Punct::Arrow) => Op::Bind(self.binding()?),

            token => return self.unexpected(Some(&token), "a word"),
        };

        words.push(Node::new(line, op));
        Ok(())
    }

    /// The items of `{ a, b }`.  The braces may be empty.
    fn list(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();

        if matches!(self.peek(), Some(token) if token.is_punct(Punct::CloseBrace)) {
            let _ = self.next();
            return Ok(Value::List(Rc::new(ListLiteral::new(items))));
        }

        loop {
            items.push(self.words()?);

            match self.next() {
                Some(token) if token.is_punct(Punct::Comma) => continue,
                Some(token) if token.is_punct(Punct::CloseBrace) => break,
                token => return self.unexpected(token.as_ref(), "‘,’ or ‘}’"),
            }
        }

        Ok(Value::List(Rc::new(ListLiteral::new(items))))
    }

    /// The names of `-> a b ; rest`, and the rest of the enclosing sequence.
    fn binding(&mut self) -> Result<Binding, ParseError> {
        let mut names = Vec::new();

        while !matches!(self.peek(), Some(token) if token.is_punct(Punct::Semicolon)) {
            let (line, name) = self.expect_name("a variable name or ‘;’")?;

            names.push(NameNode {
                line,
                symbol: self.symbols.intern(&name),
            });
        }

        if names.is_empty() {
            return self.unexpected(self.peek(), "a variable name");
        }

        self.expect_punct(Punct::Semicolon)?;

        Ok(Binding {
            names,
            body: self.words()?,
            base: 0,
        })
    }

    /// The declarations of `let decls in rest`, and the rest of the enclosing sequence.
    fn let_block(&mut self) -> Result<LetBlock, ParseError> {
        let decls = self.declarations()?;

        match self.next() {
            Some(token) if token.is_word("in") => {}
            token => return self.unexpected(token.as_ref(), "a declaration or ‘in’"),
        }

        Ok(LetBlock {
            decls,
            body: self.words()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unit(source: &str) -> DeclSeq {
        parse_unit(&SymbolTable::new(), "<test>", source).unwrap()
    }

    #[test]
    fn declarations_round_trip_through_display() {
        let decls = unit("func double : dup + .\nfunc main : 21 double .");

        assert_eq!(
            decls.to_string(),
            "func double : dup + .\nfunc main : 21 double .\n"
        );
        assert_eq!(decls.iter().nth(1).unwrap().line(), 2);
    }

    #[test]
    fn groups_are_spliced_into_the_parent() {
        let words = parse_words(&SymbolTable::new(), "<test>", "1 ( 2 3 ) 4").unwrap();

        assert_eq!(words.len(), 4);
    }

    #[test]
    fn binds_run_to_the_end_of_the_sequence() {
        let decls = unit("func f : [ -> x ; x x ] 1 .");
        let Declaration::Func(func) = decls.iter().next().unwrap() else {
            panic!("expected a function");
        };

        assert_eq!(func.body.to_string(), "[ -> x ; x x ] 1 ");
    }

    #[test]
    fn let_blocks_hold_their_declarations() {
        let decls = unit("func f : let func g : 1 . in g g .");

        assert_eq!(decls.to_string(), "func f : let func g : 1 . in g g .\n");
    }

    #[test]
    fn imports_with_and_without_lists() {
        let decls = unit("import math ( square cube )\nimport strings .");

        assert_eq!(
            decls.to_string(),
            "import math ( square cube ) .\nimport strings .\n"
        );
    }

    #[test]
    fn imports_may_take_an_alias() {
        let decls = unit("import math as m ( square )");
        let Declaration::Import(import) = decls.iter().next().unwrap() else {
            panic!("expected an import");
        };

        assert_eq!(import.alias.as_ref().map(|alias| alias.to_string()), Some("m".to_string()));
        assert_eq!(decls.to_string(), "import math as m ( square ) .\n");
    }

    #[test]
    fn lists_hold_comma_separated_sequences() {
        let words = parse_words(&SymbolTable::new(), "<test>", "{ 1 2, \"a\" } { }").unwrap();

        assert_eq!(words.to_string(), "{ 1 2 , \"a\" } { } ");
    }

    #[test]
    fn missing_dot_is_reported() {
        let error = parse_unit(&SymbolTable::new(), "<test>", "func f : 1").err().expect("expected an error");

        assert!(matches!(error, ParseError::UnexpectedEnd { .. }));
    }

    #[test]
    fn empty_bind_is_reported_with_its_line() {
        let error = parse_words(&SymbolTable::new(), "<test>", "\n-> ; 1").err().expect("expected an error");

        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn stray_closing_bracket_is_reported() {
        let error = parse_words(&SymbolTable::new(), "<test>", "1 ]").err().expect("expected an error");

        assert!(matches!(error, ParseError::Unexpected { .. }));
    }
}
