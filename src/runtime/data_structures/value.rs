use std::{ fmt::{ self,
                   Display,
                   Formatter },
           rc::Rc };
use crate::{ lang::ast::{ Block,
                          WordSeq },
             runtime::{ data_structures::{ symbol::Symbol,
                                           var_buffer::VarBuffer },
                        error::{ self,
                                 script_error },
                        interpreter::Interpreter } };



/// Core value enumeration of the cairn runtime.  Every variant that owns storage holds it through
/// an Rc, so cloning a Value makes another alias of the same data and dropping the last alias
/// releases it, along with anything it owns in turn.  Values are never mutated once built.
#[derive(Clone)]
pub enum Value
{
    /// A 64-bit signed integer.
    Int(i64),

    /// A double precision floating point value.
    Float(f64),

    /// An immutable string, shared between aliases.
    String(Rc<str>),

    /// An interned name written as `/name` in source.
    Symbol(Symbol),

    /// A quoted word sequence that has not been bound to any variables.
    Block(Rc<Block>),

    /// A quoted word sequence together with the window of variables it captured.
    BoundBlock(Rc<BoundBlock>),

    /// The data of a `{ a, b }` literal.  The contained sequences are never executed.
    List(Rc<ListLiteral>)
}


/// A block that closed over variable slots when it was evaluated inside a bind construct.
pub struct BoundBlock
{
    block: Rc<Block>,
    buffer: Rc<VarBuffer>
}


impl BoundBlock
{
    pub fn new(block: Rc<Block>, buffer: Rc<VarBuffer>) -> BoundBlock
    {
        BoundBlock { block, buffer }
    }

    pub fn block(&self) -> &Rc<Block>
    {
        &self.block
    }

    /// The captured variables, shared with every other alias of this closure.
    pub fn buffer(&self) -> &Rc<VarBuffer>
    {
        &self.buffer
    }
}


/// The comma separated word sequences of a list literal.
pub struct ListLiteral
{
    items: Vec<WordSeq>
}


impl ListLiteral
{
    pub fn new(items: Vec<WordSeq>) -> ListLiteral
    {
        ListLiteral { items }
    }

    pub fn items(&self) -> &Vec<WordSeq>
    {
        &self.items
    }

    pub fn len(&self) -> usize
    {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.items.is_empty()
    }
}


/// Convert an arbitrary data type to a Value.
pub trait ToValue
{
    /// Implement to handle the actual conversion.
    fn to_value(&self) -> Value;
}


impl ToValue for &str
{
    fn to_value(&self) -> Value
    {
        Value::String(Rc::from(*self))
    }
}


impl ToValue for String
{
    fn to_value(&self) -> Value
    {
        Value::String(Rc::from(self.as_str()))
    }
}


/// Lengths and counts are represented as integers inside the language.
impl ToValue for usize
{
    fn to_value(&self) -> Value
    {
        Value::Int(*self as i64)
    }
}


/// Comparison results are pushed as 1 or 0.
impl ToValue for bool
{
    fn to_value(&self) -> Value
    {
        Value::Int(if *self { 1 } else { 0 })
    }
}


/// Manage equality for the Value enumeration.  Numbers compare by value across the integer and
/// float variants, strings compare by content and everything else compares by identity.
impl PartialEq for Value
{
    fn eq(&self, other: &Value) -> bool
    {
        if Value::both_are_numeric(self, other)
        {
            if Value::either_is_float(self, other)
            {
                self.get_float_val() == other.get_float_val()
            }
            else
            {
                self.get_int_val() == other.get_int_val()
            }
        }
        else
        {
            match ( self, other )
            {
                ( Value::String(a),     Value::String(b)     ) => a == b,
                ( Value::Symbol(a),     Value::Symbol(b)     ) => a == b,
                ( Value::Block(a),      Value::Block(b)      ) => Rc::ptr_eq(a, b),
                ( Value::BoundBlock(a), Value::BoundBlock(b) ) => Rc::ptr_eq(a, b),
                ( Value::List(a),       Value::List(b)       ) => Rc::ptr_eq(a, b),

                _                                              => false
            }
        }
    }
}


/// Print the value the way the `print` word shows it, strings without their quotes.
impl Display for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::String(value) => write!(f, "{}", value),
            _                    => write!(f, "{}", self.stringify())
        }
    }
}


impl std::fmt::Debug for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self.stringify())
    }
}


/// Define implementations for converting between Values and the raw data types they represent.
macro_rules! value_conversion
{
    ($data_type:ty , $variant:ident , $as_ident:ident) =>
    {
        #[doc = concat!("Convert a value to ", stringify!($data_type), ".")]
        impl Value
        {
            pub fn $as_ident(&self, interpreter: &dyn Interpreter) -> error::Result<&$data_type>
            {
                match self
                {
                    Value::$variant(value) => Ok(value),
                    _ => script_error(interpreter,
                                      format!("expected {} but found {}",
                                              stringify!($variant).to_lowercase(),
                                              self.type_name()))
                }
            }
        }


        #[doc = concat!("Allow conversion from ", stringify!($data_type), " to a Value.")]
        impl ToValue for $data_type
        {
            fn to_value(&self) -> Value
            {
                Value::$variant(self.clone())
            }
        }


        #[doc = concat!("Support converting from a ", stringify!($data_type), " to a Value.")]
        impl From<$data_type> for Value
        {
            fn from(original: $data_type) -> Value
            {
                original.to_value()
            }
        }
    };
}


value_conversion!(i64,             Int,        as_int);
value_conversion!(f64,             Float,      as_float);
value_conversion!(Rc<str>,         String,     as_string);
value_conversion!(Symbol,          Symbol,     as_symbol);
value_conversion!(Rc<Block>,       Block,      as_block);
value_conversion!(Rc<BoundBlock>,  BoundBlock, as_bound_block);
value_conversion!(Rc<ListLiteral>, List,       as_list);


/// Handily implement variant checks for the types the Value enumeration supports.
macro_rules! is_variant
{
    ($name:ident , $either_name:ident , $variant:ident) =>
    {
        #[doc = concat!("Check if the value is the variant ", stringify!($variant), ".")]
        pub fn $name(&self) -> bool
        {
            matches!(self, Value::$variant(_))
        }

        #[doc = concat!("Check if either of the two values are the variant ",
                        stringify!($variant),
                        ".")]
        pub fn $either_name(a: &Value, b: &Value) -> bool
        {
            a.$name() || b.$name()
        }
    };
}


impl Value
{
    is_variant!(is_int,         either_is_int,         Int);
    is_variant!(is_float,       either_is_float,       Float);
    is_variant!(is_string,      either_is_string,      String);
    is_variant!(is_symbol,      either_is_symbol,      Symbol);
    is_variant!(is_block,       either_is_block,       Block);
    is_variant!(is_bound_block, either_is_bound_block, BoundBlock);
    is_variant!(is_list,        either_is_list,        List);


    /// Is the value any kind of numeric variant type?
    pub fn is_numeric(&self) -> bool
    {
        matches!(self, Value::Int(_) | Value::Float(_))
    }


    /// Are both values numeric types?
    pub fn both_are_numeric(a: &Value, b: &Value) -> bool
    {
        a.is_numeric() && b.is_numeric()
    }


    /// Can the value be run by `apply`?
    pub fn is_executable(&self) -> bool
    {
        matches!(self, Value::Block(_) | Value::BoundBlock(_))
    }


    /// The name of the variant, as used in run-time error messages.
    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Value::Int(_)        => "int",
            Value::Float(_)      => "float",
            Value::String(_)     => "string",
            Value::Symbol(_)     => "symbol",
            Value::Block(_)      => "block",
            Value::BoundBlock(_) => "closure",
            Value::List(_)       => "list"
        }
    }


    /// How many aliases share this value's storage.  Unboxed numbers always report one.
    pub fn ref_count(&self) -> usize
    {
        match self
        {
            Value::Int(_) | Value::Float(_) => 1,
            Value::String(value)            => Rc::strong_count(value),
            Value::Symbol(_)                => 1,
            Value::Block(value)             => Rc::strong_count(value),
            Value::BoundBlock(value)        => Rc::strong_count(value),
            Value::List(value)              => Rc::strong_count(value)
        }
    }


    /// Convert the Value to a boolean for conditionals.  Zero and the empty string are false.
    pub fn get_bool_val(&self) -> bool
    {
        match self
        {
            Value::Int(value)    => *value != 0,
            Value::Float(value)  => *value != 0.0,
            Value::String(value) => !value.is_empty(),
            _                    => true
        }
    }


    /// Convert a numeric value to an integer, truncating floats.  Only applicable to values that
    /// satisfy the is_numeric() test.
    pub fn get_int_val(&self) -> i64
    {
        match self
        {
            Value::Int(value)   => *value,
            Value::Float(value) => *value as i64,
            _                   => panic!("Value is not convertible to int.")
        }
    }


    /// Convert a numeric value to a float.  Only applicable to values that satisfy the
    /// is_numeric() test.
    pub fn get_float_val(&self) -> f64
    {
        match self
        {
            Value::Int(value)   => *value as f64,
            Value::Float(value) => *value,
            _                   => panic!("Value is not convertible to float.")
        }
    }


    /// Render the value the way it would be written in source.  Strings are quoted and escaped,
    /// used by the stack dump and by `->string` on non-string values.
    pub fn stringify(&self) -> String
    {
        match self
        {
            Value::Int(value)        => value.to_string(),
            Value::Float(value)      => format_float(*value),
            Value::String(value)     => Value::quote_string(value),
            Value::Symbol(value)     => format!("/{}", value),
            Value::Block(value)      => format!("[ {}]", value.body()),
            Value::BoundBlock(value) => format!("[ {}]{}", value.block().body(), value.buffer()),
            Value::List(value)       =>
                {
                    let items: Vec<String> = value.items()
                                                  .iter()
                                                  .map(|item| item.to_string())
                                                  .collect();

                    format!("{{ {}}}", items.join(", "))
                }
        }
    }


    /// Convert a string to a string that could be used directly within source code.  New lines
    /// are converted to the \n escape sequence and so on, and the whole is enclosed in double
    /// quotes.
    pub fn quote_string(text: &str) -> String
    {
        let mut result = String::with_capacity(text.len() + 2);

        result.push('"');

        for character in text.chars()
        {
            match character
            {
                '"'  => result.push_str("\\\""),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\\' => result.push_str("\\\\"),
                _    => result.push(character)
            }
        }

        result.push('"');

        result
    }
}


/// Floats always show a fractional part so they can't be confused with integers.
fn format_float(value: f64) -> String
{
    if value.is_finite() && value.fract() == 0.0
    {
        format!("{:.1}", value)
    }
    else
    {
        value.to_string()
    }
}
