pub mod list;
pub mod set;
pub mod string;

pub use list::ListValue;
pub use set::SetValue;
pub use string::StrValue;

/// A value held under a key. A key maps to exactly one variant at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(StrValue),
    List(ListValue),
    Set(SetValue),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListValue> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut SetValue> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Empty collections are never kept around; a list or set that drops to
    /// zero elements is removed along with its key.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(l) => l.is_empty(),
            Value::Set(s) => s.is_empty(),
        }
    }
}
