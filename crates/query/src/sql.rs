//! SQL text accumulation.
//!
//! Rendering threads a single `SqlContext` through the whole call tree. Every
//! component appends its text to the context and binds its literal values as
//! positional `?` arguments, so argument order always matches placeholder
//! order.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Deref;
use vista_core::Value;

/// Ordered list of values bound to the `?` placeholders of a statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Returns the values as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the list and returns the values.
    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl Deref for Arguments {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Accumulates SQL text and its arguments while rendering.
#[derive(Debug, Default)]
pub struct SqlContext {
    sql: String,
    arguments: Arguments,
}

impl SqlContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw SQL text.
    #[inline]
    pub fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Appends a quoted identifier.
    pub fn push_identifier(&mut self, name: &str) {
        write_quoted(&mut self.sql, name);
    }

    /// Appends a `?` placeholder bound to `value`.
    pub fn push_argument(&mut self, value: Value) {
        self.sql.push('?');
        self.arguments.push(value);
    }

    /// Appends each item produced by `write`, separated by `separator`.
    pub fn push_joined<T>(
        &mut self,
        items: &[T],
        separator: &str,
        mut write: impl FnMut(&T, &mut SqlContext),
    ) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            write(item, self);
        }
    }

    /// Returns the SQL rendered so far.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the arguments bound so far.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Consumes the context and returns the SQL text and its arguments.
    pub fn finish(self) -> (String, Arguments) {
        (self.sql, self.arguments)
    }
}

/// Quotes an identifier, doubling embedded double quotes.
///
/// Identifiers are always quoted so that reserved words and special
/// characters in table, alias and column names are safe.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    write_quoted(&mut quoted, name);
    quoted
}

fn write_quoted(out: &mut String, name: &str) {
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}
