use std::fmt;

/// The kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Nothing,
    Numeric,
    Reference,
}

/// A value the language can hold.
///
/// Only `Numeric` is produced today (the count of a `repeat`). `Reference`
/// names a binding in an environment the language does not have yet; nothing
/// creates or resolves one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    #[default]
    Nothing,
    Numeric(u64),
    Reference(String),
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Nothing => ValueTag::Nothing,
            Value::Numeric(_) => ValueTag::Numeric,
            Value::Reference(_) => ValueTag::Reference,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.tag().name()
    }

    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            Value::Numeric(n) => Some(*n),
            _ => None,
        }
    }
}

impl ValueTag {
    pub fn name(self) -> &'static str {
        match self {
            ValueTag::Nothing => "Nothing",
            ValueTag::Numeric => "Numeric",
            ValueTag::Reference => "Reference",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "nothing"),
            Value::Numeric(n) => write!(f, "{}", n),
            Value::Reference(name) => write!(f, "{}", name),
        }
    }
}
