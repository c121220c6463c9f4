//! Reserved built-in names and language keywords

use std::collections::BTreeSet;

/// Built-in functions and types, with a one-line summary used by hover
pub const RESERVED_NAMES: &[(&str, &str)] = &[
    ("abs", "abs(x) -> number: absolute value"),
    ("all", "all(iterable) -> bool: true if every element is truthy"),
    ("any", "any(iterable) -> bool: true if some element is truthy"),
    ("bool", "bool(x) -> bool: truth value of x"),
    ("chr", "chr(code) -> str: character for a code point"),
    ("dict", "dict(...) -> dict: new dictionary"),
    ("enumerate", "enumerate(iterable) -> iterator of (index, item)"),
    ("exit", "exit(code): terminate the program"),
    ("filter", "filter(fn, iterable) -> iterator of items where fn(item) is truthy"),
    ("float", "float(x) -> float: convert to floating point"),
    ("format", "format(value, spec) -> str: formatted representation"),
    ("hash", "hash(x) -> int: hash value"),
    ("id", "id(x) -> int: identity of an object"),
    ("input", "input(prompt) -> str: read a line from standard input"),
    ("int", "int(x) -> int: convert to integer"),
    ("isinstance", "isinstance(x, type) -> bool: type check"),
    ("len", "len(x) -> int: number of items in a container"),
    ("list", "list(iterable) -> list: new list"),
    ("map", "map(fn, iterable) -> iterator of fn(item)"),
    ("max", "max(iterable) -> largest item"),
    ("min", "min(iterable) -> smallest item"),
    ("open", "open(path, mode) -> file: open a file"),
    ("ord", "ord(ch) -> int: code point of a character"),
    ("pow", "pow(base, exp) -> number: exponentiation"),
    ("print", "print(*values): write values to standard output"),
    ("range", "range(start, stop, step) -> iterator of integers"),
    ("repr", "repr(x) -> str: printable representation"),
    ("round", "round(x, digits) -> number: rounded value"),
    ("set", "set(iterable) -> set: new set"),
    ("sorted", "sorted(iterable) -> list: new sorted list"),
    ("str", "str(x) -> str: string conversion"),
    ("sum", "sum(iterable) -> number: total of the items"),
    ("tuple", "tuple(iterable) -> tuple: new tuple"),
    ("type", "type(x) -> type: runtime type of x"),
    ("zip", "zip(*iterables) -> iterator of tuples"),
];

/// Language keywords offered by completion
pub const KEYWORDS: &[&str] = &[
    "abstract",
    "and",
    "as",
    "break",
    "class",
    "continue",
    "def",
    "elif",
    "else",
    "except",
    "extends",
    "False",
    "final",
    "finally",
    "for",
    "from",
    "if",
    "implements",
    "import",
    "in",
    "interface",
    "None",
    "not",
    "or",
    "pass",
    "raise",
    "return",
    "static",
    "True",
    "try",
    "while",
];

/// Summary text for a built-in name
pub fn builtin_summary(name: &str) -> Option<&'static str> {
    RESERVED_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, summary)| *summary)
}

/// The reserved-name set checked by the shadow detector
#[derive(Debug, Clone)]
pub struct ReservedNames {
    names: BTreeSet<String>,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self {
            names: RESERVED_NAMES
                .iter()
                .map(|(name, _)| (*name).to_string())
                .collect(),
        }
    }
}

impl ReservedNames {
    /// Built-ins plus project-specific additions
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reserved = Self::default();
        reserved.names.extend(
            extra
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.is_empty()),
        );
        reserved
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
