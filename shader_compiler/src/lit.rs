use crate::ty::Type;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lit {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl Lit {
    pub fn ty(self) -> Type {
        match self {
            Lit::Bool(_) => Type::BOOL,
            Lit::Int(_) => Type::INT,
            Lit::Float(_) => Type::FLOAT,
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lit::Bool(lit) => write!(f, "{}", lit),
            Lit::Int(lit) => write!(f, "{}", lit),
            Lit::Float(lit) => write!(f, "{}", PrettyPrintedFloat(*lit)),
        }
    }
}

/// Prints the shortest representation that reads back as the same `f32`, always
/// with a decimal point so every shading language sees a float literal.
pub struct PrettyPrintedFloat(pub f32);

impl fmt::Display for PrettyPrintedFloat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let string = self.0.to_string();
        if string.contains('.') || !self.0.is_finite() {
            write!(f, "{}", string)
        } else {
            write!(f, "{}.0", string)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_printed_float() {
        assert_eq!(PrettyPrintedFloat(1.5).to_string(), "1.5");
        assert_eq!(PrettyPrintedFloat(3.0).to_string(), "3.0");
        assert_eq!(PrettyPrintedFloat(0.1).to_string(), "0.1");
        assert_eq!(PrettyPrintedFloat(1e-10).to_string().parse::<f32>().unwrap(), 1e-10);
        assert_eq!(Lit::Int(42).to_string(), "42");
        assert_eq!(Lit::Bool(false).to_string(), "false");
    }
}
