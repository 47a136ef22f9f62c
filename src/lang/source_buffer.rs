use core::str::Chars;
use std::fmt::{ self,
                Display,
                Formatter };



/// The location in the source code where a token was found.  Carried by every token so that the
/// reader can report where things went wrong, the compiler and evaluator only keep the line.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation
{
    /// Either the path to the file or a description of the source code.  For example code entered
    /// in the REPL will have a tag of "\<repl\>".
    path: String,

    /// The 1 based line number in the source code where the token was found.
    line: usize,

    /// The 1 based column number in the source code where the token was found.
    column: usize
}


/// Used for error reporting to show where in the source code an error originated.
impl Display for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        write!(formatter, "{} ({}, {})", self.path, self.line, self.column)
    }
}


impl SourceLocation
{
    /// Create a new SourceLocation at the start of the given source.
    pub fn new_from_path(path: &str) -> SourceLocation
    {
        SourceLocation { path: path.to_owned(), line: 1, column: 1 }
    }

    /// Create a new SourceLocation with all of the needed information.
    pub fn new_from_info(path: &str, line: usize, column: usize) -> SourceLocation
    {
        SourceLocation { path: path.to_owned(), line, column }
    }

    /// The path to the source code or a meaningful description of the source code.
    pub fn path(&self) -> &String
    {
        &self.path
    }

    /// The 1 based line number in the source code.
    pub fn line(&self) -> usize
    {
        self.line
    }

    /// The 1 based column number in the source code.
    pub fn column(&self) -> usize
    {
        self.column
    }
}



/// A forward only cursor over source text for the tokenizer.  As characters are consumed the
/// location of the cursor is kept up to date, with one character of look ahead.
///
/// The SourceBuffer only borrows the source code, the text is not copied.
pub struct SourceBuffer<'a>
{
    chars: Chars<'a>,
    location: SourceLocation,

    /// A character that has been peeked at but not yet consumed.
    current: Option<char>
}


impl<'a> SourceBuffer<'a>
{
    /// Create a new SourceBuffer with the path to, or meaningful tag for the source code and the
    /// source code itself.
    pub fn new(path: &str, source: &'a str) -> SourceBuffer<'a>
    {
        SourceBuffer
            {
                chars: source.chars(),
                location: SourceLocation::new_from_path(path),
                current: None
            }
    }

    /// The location the cursor is at in the source code being processed.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    /// Take a peek at the next character in the source code without consuming it.
    pub fn peek_next(&mut self) -> Option<char>
    {
        if self.current.is_none()
        {
            self.current = self.chars.next();
        }

        self.current
    }

    /// Get and consume the next character in the source code.
    pub fn next_char(&mut self) -> Option<char>
    {
        let next = match self.current.take()
            {
                Some(current) => Some(current),
                None => self.chars.next()
            };

        if let Some(next_char) = next
        {
            self.increment_location(next_char);
        }

        next
    }

    /// Skip the rest of the current line, leaving the new line itself in the buffer.
    pub fn skip_line(&mut self)
    {
        while let Some(next) = self.peek_next()
        {
            if next == '\n'
            {
                break;
            }

            let _ = self.next_char();
        }
    }

    /// Advance one column for regular characters.  Reset the column to 1 and increment the line
    /// for new line characters.
    fn increment_location(&mut self, next: char)
    {
        if next == '\n'
        {
            self.location.line += 1;
            self.location.column = 1;
        }
        else
        {
            self.location.column += 1;
        }
    }
}
