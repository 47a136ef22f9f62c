use crate::lang::{
    parser::ParseError,
    source_buffer::{SourceBuffer, SourceLocation},
};
use std::fmt::{self, Debug, Display, Formatter};

/// A number token can be either an integer or a floating point literal.
#[derive(Clone, Copy, PartialEq)]
pub enum NumberType {
    Int(i64),
    Float(f64),
}

impl Display for NumberType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberType::Int(num) => write!(f, "{}", num),
            NumberType::Float(num) => write!(f, "{}", num),
        }
    }
}

/// Print the value of the held number as well as an indicator of which variant we're holding for
/// debugging purposes.
impl Debug for NumberType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberType::Int(num) => write!(f, "{} i", num),
            NumberType::Float(num) => write!(f, "{} f", num),
        }
    }
}

/// The structural characters of the grammar.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Punct {
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Dot,
    Colon,
    Arrow,
}

impl Punct {
    /// Brackets, commas and semicolons end a word even without surrounding whitespace.
    fn from_delimiter(next: char) -> Option<Punct> {
        match next {
            '[' => Some(Punct::OpenBracket),
            ']' => Some(Punct::CloseBracket),
            '{' => Some(Punct::OpenBrace),
            '}' => Some(Punct::CloseBrace),
            '(' => Some(Punct::OpenParen),
            ')' => Some(Punct::CloseParen),
            ',' => Some(Punct::Comma),
            ';' => Some(Punct::Semicolon),
            _ => None,
        }
    }

    /// The dot, colon and arrow only count when they stand alone, so `.s` and `->string` stay
    /// words.
    fn from_word(text: &str) -> Option<Punct> {
        match text {
            "." => Some(Punct::Dot),
            ":" => Some(Punct::Colon),
            "->" => Some(Punct::Arrow),
            _ => None,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Punct::OpenBracket => "[",
            Punct::CloseBracket => "]",
            Punct::OpenBrace => "{",
            Punct::CloseBrace => "}",
            Punct::OpenParen => "(",
            Punct::CloseParen => ")",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Dot => ".",
            Punct::Colon => ":",
            Punct::Arrow => "->",
        }
    }
}

/// A simple unit of the language, together with the location in the original source code where
/// it was found.
#[derive(Clone, PartialEq)]
pub enum Token {
    /// Can be either an integer or a floating point value.
    Number(SourceLocation, NumberType),

    /// A string literal with its escapes already processed.
    String(SourceLocation, String),

    /// A symbol literal, `/name`, holding the name without the slash.
    Symbol(SourceLocation, String),

    /// A word to be resolved by the compiler.
    Word(SourceLocation, String),

    Punct(SourceLocation, Punct),
}

/// A list of tokens found in the source code.
pub type TokenList = Vec<Token>;

/// Make sure that the tokens are nicely printable for error messages.
impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Number(_, num) => write!(f, "{}", num),
            Token::String(_, string) => write!(f, "\"{}\"", string),
            Token::Symbol(_, name) => write!(f, "/{}", name),
            Token::Word(_, string) => write!(f, "{}", string),
            Token::Punct(_, punct) => write!(f, "{}", punct.text()),
        }
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self)
    }
}

impl Token {
    /// Get the token's location in the original source text.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Token::Number(location, _) => location,
            Token::String(location, _) => location,
            Token::Symbol(location, _) => location,
            Token::Word(location, _) => location,
            Token::Punct(location, _) => location,
        }
    }

    pub fn line(&self) -> usize {
        self.location().line()
    }

    /// Check if the token is the given punctuation.
    pub fn is_punct(&self, punct: Punct) -> bool {
        matches!(self, Token::Punct(_, found) if *found == punct)
    }

    /// Check if the token is the given word.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(_, found) if found == word)
    }
}

/// Check if the given character is considered whitespace.
fn is_whitespace(next: &char) -> bool {
    *next == ' ' || *next == '\t' || *next == '\r' || *next == '\n'
}

/// Skip over whitespace in the text.  Stopping only at either the end of the buffer or the next
/// non-whitespace character.
fn skip_whitespace(buffer: &mut SourceBuffer) {
    while let Some(next) = buffer.peek_next() {
        if !is_whitespace(&next) {
            break;
        }

        let _ = buffer.next_char();
    }
}

/// Process an escape sequence in a string literal.  The backslash has already been consumed.
fn process_escape(location: &SourceLocation, buffer: &mut SourceBuffer) -> Result<char, ParseError> {
    match buffer.next_char() {
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),

        // Quotes, backslashes and anything else pass through untranslated.
        Some(next) => Ok(next),

        None => Err(ParseError::UnterminatedString {
            location: location.clone(),
        }),
    }
}

/// Process a string literal.  Escapes are translated, a new line before the closing quote is an
/// error.
fn process_string(buffer: &mut SourceBuffer) -> Result<Token, ParseError> {
    let location = buffer.location().clone();
    let mut text = String::new();

    // Skip the opening quote.
    let _ = buffer.next_char();

    loop {
        match buffer.next_char() {
            Some('"') => break,
            Some('\\') => text.push(process_escape(&location, buffer)?),
            Some('\n') => return Err(ParseError::NewlineInString { location }),
            Some(next) => text.push(next),
            None => return Err(ParseError::UnterminatedString { location }),
        }
    }

    Ok(Token::String(location, text))
}

/// Pull text out of the buffer until we hit whitespace or a delimiter.
fn process_word(buffer: &mut SourceBuffer) -> (SourceLocation, String) {
    let location = buffer.location().clone();
    let mut text = String::new();

    while let Some(next) = buffer.peek_next() {
        if is_whitespace(&next) || Punct::from_delimiter(next).is_some() {
            break;
        }

        text.push(next);
        let _ = buffer.next_char();
    }

    (location, text)
}

/// Does it look like we're dealing with a numeric literal?  A leading digit, optionally after a
/// minus sign.
fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);

    digits.starts_with(|next: char| next.is_ascii_digit())
}

/// Attempt to convert the text into a numeric literal.  We support hexadecimal and binary
/// literals, and using _ as a separator for readability.
fn to_numeric(text: &str) -> Option<NumberType> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(stripped) => (true, stripped),
        None => (false, text),
    };

    let digits = digits.replace('_', "");

    let number = if let Some(stripped) = digits.strip_prefix("0x") {
        NumberType::Int(i64::from_str_radix(stripped, 16).ok()?)
    } else if let Some(stripped) = digits.strip_prefix("0b") {
        NumberType::Int(i64::from_str_radix(stripped, 2).ok()?)
    } else if digits.contains('.') || digits.contains('e') || digits.contains('E') {
        NumberType::Float(digits.parse().ok()?)
    } else {
        NumberType::Int(digits.parse().ok()?)
    };

    Some(match (negative, number) {
        (true, NumberType::Int(value)) => NumberType::Int(-value),
        (true, NumberType::Float(value)) => NumberType::Float(-value),
        (false, number) => number,
    })
}

/// Tokenize the source code from a string.
pub fn tokenize_from_source(path: &str, source: &str) -> Result<TokenList, ParseError> {
    let mut buffer = SourceBuffer::new(path, source);
    let mut token_list = TokenList::new();

    while let Some(next) = buffer.peek_next() {
        if is_whitespace(&next) {
            skip_whitespace(&mut buffer);
            continue;
        }

        if next == '#' {
            buffer.skip_line();
            continue;
        }

        if next == '"' {
            token_list.push(process_string(&mut buffer)?);
            continue;
        }

        if let Some(punct) = Punct::from_delimiter(next) {
            token_list.push(Token::Punct(buffer.location().clone(), punct));
            let _ = buffer.next_char();
            continue;
        }

        let (location, text) = process_word(&mut buffer);

        let next_token = if let Some(punct) = Punct::from_word(&text) {
            Token::Punct(location, punct)
        } else if let Some(name) = text.strip_prefix('/').filter(|name| !name.is_empty()) {
            Token::Symbol(location, name.to_string())
        } else if is_number(&text) {
            match to_numeric(&text) {
                Some(number) => Token::Number(location, number),
                None => return Err(ParseError::BadNumber { location, text }),
            }
        } else {
            Token::Word(location, text)
        };

        token_list.push(next_token);
    }

    Ok(token_list)
}
