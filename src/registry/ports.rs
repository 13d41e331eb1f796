use crate::strategy::{EdgeKind, Value};
use std::fmt;

pub const CONTROL_IN: &str = "control:in";
pub const CONTROL_OUT: &str = "control:out";
pub const CONTROL_TRUE: &str = "control:true";
pub const CONTROL_FALSE: &str = "control:false";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// The value type a data port carries. `Any` accepts every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Number,
    String,
    Boolean,
    Series,
    Any,
}

impl DataType {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            DataType::Any => true,
            DataType::Number => value.as_number().is_some(),
            DataType::String => value.as_str().is_some(),
            DataType::Boolean => value.as_bool().is_some(),
            DataType::Series => value.as_series().is_some(),
        }
    }

    /// Whether an output of this type may be wired into an input of `target`.
    /// Strings may feed numeric inputs since numeric strings are coerced at run time.
    pub fn can_feed(&self, target: DataType) -> bool {
        match (self, target) {
            (DataType::Any, _) | (_, DataType::Any) => true,
            (DataType::String, DataType::Number) => true,
            (source, target) => *source == target,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Series => "series",
            DataType::Any => "any",
        };
        f.write_str(name)
    }
}

/// A port declared by a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub id: &'static str,
    pub direction: PortDirection,
    pub kind: EdgeKind,
    pub data_type: Option<DataType>,
    pub required: bool,
}

impl PortSpec {
    pub const fn control_in() -> Self {
        Self {
            id: CONTROL_IN,
            direction: PortDirection::Input,
            kind: EdgeKind::Control,
            data_type: None,
            required: false,
        }
    }

    pub const fn control_out(id: &'static str) -> Self {
        Self {
            id,
            direction: PortDirection::Output,
            kind: EdgeKind::Control,
            data_type: None,
            required: false,
        }
    }

    pub const fn input(id: &'static str, data_type: DataType, required: bool) -> Self {
        Self {
            id,
            direction: PortDirection::Input,
            kind: EdgeKind::Data,
            data_type: Some(data_type),
            required,
        }
    }

    pub const fn output(id: &'static str, data_type: DataType) -> Self {
        Self {
            id,
            direction: PortDirection::Output,
            kind: EdgeKind::Data,
            data_type: Some(data_type),
            required: false,
        }
    }

    pub fn is_data_input(&self) -> bool {
        self.direction == PortDirection::Input && self.kind == EdgeKind::Data
    }
}
