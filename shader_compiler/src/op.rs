use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OpCategory {
    Math,
    Assign,
    Rel,
    Bit,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOpType {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    ShlAssign,
    ShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
}

impl BinaryOpType {
    pub const ALL: [BinaryOpType; 30] = [
        BinaryOpType::Add,
        BinaryOpType::Sub,
        BinaryOpType::Mul,
        BinaryOpType::Div,
        BinaryOpType::Mod,
        BinaryOpType::Assign,
        BinaryOpType::AddAssign,
        BinaryOpType::SubAssign,
        BinaryOpType::MulAssign,
        BinaryOpType::DivAssign,
        BinaryOpType::ModAssign,
        BinaryOpType::Or,
        BinaryOpType::Xor,
        BinaryOpType::And,
        BinaryOpType::Eq,
        BinaryOpType::Ne,
        BinaryOpType::Le,
        BinaryOpType::Ge,
        BinaryOpType::Lt,
        BinaryOpType::Gt,
        BinaryOpType::Shl,
        BinaryOpType::Shr,
        BinaryOpType::BitAnd,
        BinaryOpType::BitOr,
        BinaryOpType::BitXor,
        BinaryOpType::ShlAssign,
        BinaryOpType::ShrAssign,
        BinaryOpType::BitAndAssign,
        BinaryOpType::BitOrAssign,
        BinaryOpType::BitXorAssign,
    ];

    pub fn for_symbol(symbol: &str) -> Option<BinaryOpType> {
        BinaryOpType::ALL.iter().copied().find(|op| op.symbol() == symbol)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOpType::Add => "+",
            BinaryOpType::Sub => "-",
            BinaryOpType::Mul => "*",
            BinaryOpType::Div => "/",
            BinaryOpType::Mod => "%",
            BinaryOpType::Assign => "=",
            BinaryOpType::AddAssign => "+=",
            BinaryOpType::SubAssign => "-=",
            BinaryOpType::MulAssign => "*=",
            BinaryOpType::DivAssign => "/=",
            BinaryOpType::ModAssign => "%=",
            BinaryOpType::Or => "||",
            BinaryOpType::Xor => "^^",
            BinaryOpType::And => "&&",
            BinaryOpType::Eq => "==",
            BinaryOpType::Ne => "!=",
            BinaryOpType::Le => "<=",
            BinaryOpType::Ge => ">=",
            BinaryOpType::Lt => "<",
            BinaryOpType::Gt => ">",
            BinaryOpType::Shl => "<<",
            BinaryOpType::Shr => ">>",
            BinaryOpType::BitAnd => "&",
            BinaryOpType::BitOr => "|",
            BinaryOpType::BitXor => "^",
            BinaryOpType::ShlAssign => "<<=",
            BinaryOpType::ShrAssign => ">>=",
            BinaryOpType::BitAndAssign => "&=",
            BinaryOpType::BitOrAssign => "|=",
            BinaryOpType::BitXorAssign => "^=",
        }
    }

    pub fn category(self) -> OpCategory {
        match self {
            BinaryOpType::Add | BinaryOpType::Sub | BinaryOpType::Mul | BinaryOpType::Div | BinaryOpType::Mod => {
                OpCategory::Math
            }
            BinaryOpType::Assign
            | BinaryOpType::AddAssign
            | BinaryOpType::SubAssign
            | BinaryOpType::MulAssign
            | BinaryOpType::DivAssign
            | BinaryOpType::ModAssign => OpCategory::Assign,
            BinaryOpType::Or
            | BinaryOpType::Xor
            | BinaryOpType::And
            | BinaryOpType::Eq
            | BinaryOpType::Ne
            | BinaryOpType::Le
            | BinaryOpType::Ge
            | BinaryOpType::Lt
            | BinaryOpType::Gt => OpCategory::Rel,
            BinaryOpType::Shl
            | BinaryOpType::Shr
            | BinaryOpType::BitAnd
            | BinaryOpType::BitOr
            | BinaryOpType::BitXor
            | BinaryOpType::ShlAssign
            | BinaryOpType::ShrAssign
            | BinaryOpType::BitAndAssign
            | BinaryOpType::BitOrAssign
            | BinaryOpType::BitXorAssign => OpCategory::Bit,
        }
    }

    pub fn is_relational(self) -> bool {
        self.category() == OpCategory::Rel
    }

    pub fn is_assignment(self) -> bool {
        self.category() == OpCategory::Assign
    }

    pub fn is_bitwise(self) -> bool {
        self.category() == OpCategory::Bit
    }

    /// `&&`, `||` and `^^`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOpType::Or | BinaryOpType::Xor | BinaryOpType::And)
    }

    /// Comparisons that yield one bool per component.
    pub fn is_comparison(self) -> bool {
        self.is_relational() && !self.is_logical()
    }

    /// Assignments, including the compound bitwise ones which live in the BIT category.
    pub fn modifies_lhs(self) -> bool {
        self.is_assignment()
            || matches!(
                self,
                BinaryOpType::ShlAssign
                    | BinaryOpType::ShrAssign
                    | BinaryOpType::BitAndAssign
                    | BinaryOpType::BitOrAssign
                    | BinaryOpType::BitXorAssign
            )
    }

    /// For compound assignments, the operator applied before storing (`+=` gives `+`).
    pub fn compound_op(self) -> Option<BinaryOpType> {
        match self {
            BinaryOpType::AddAssign => Some(BinaryOpType::Add),
            BinaryOpType::SubAssign => Some(BinaryOpType::Sub),
            BinaryOpType::MulAssign => Some(BinaryOpType::Mul),
            BinaryOpType::DivAssign => Some(BinaryOpType::Div),
            BinaryOpType::ModAssign => Some(BinaryOpType::Mod),
            BinaryOpType::ShlAssign => Some(BinaryOpType::Shl),
            BinaryOpType::ShrAssign => Some(BinaryOpType::Shr),
            BinaryOpType::BitAndAssign => Some(BinaryOpType::BitAnd),
            BinaryOpType::BitOrAssign => Some(BinaryOpType::BitOr),
            BinaryOpType::BitXorAssign => Some(BinaryOpType::BitXor),
            _ => None,
        }
    }

    /// Binding strength; higher binds tighter. MATH > BIT > REL > ASSIGN, with the
    /// conditional operator sitting between REL and ASSIGN.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOpType::Mul | BinaryOpType::Div | BinaryOpType::Mod => 13,
            BinaryOpType::Add | BinaryOpType::Sub => 12,
            BinaryOpType::Shl | BinaryOpType::Shr => 11,
            BinaryOpType::BitAnd => 10,
            BinaryOpType::BitXor => 9,
            BinaryOpType::BitOr => 8,
            BinaryOpType::Lt | BinaryOpType::Gt | BinaryOpType::Le | BinaryOpType::Ge => 7,
            BinaryOpType::Eq | BinaryOpType::Ne => 6,
            BinaryOpType::And => 5,
            BinaryOpType::Xor => 4,
            BinaryOpType::Or => 3,
            _ => ASSIGN_PRECEDENCE,
        }
    }

    pub fn is_right_assoc(self) -> bool {
        self.modifies_lhs()
    }
}

pub(crate) const ASSIGN_PRECEDENCE: u8 = 1;
pub(crate) const COND_PRECEDENCE: u8 = 2;
pub(crate) const UNARY_PRECEDENCE: u8 = 14;
pub(crate) const POSTFIX_PRECEDENCE: u8 = 15;

impl fmt::Display for BinaryOpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOpType {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOpType {
    pub fn for_prefix_symbol(symbol: &str) -> Option<UnaryOpType> {
        match symbol {
            "-" => Some(UnaryOpType::Neg),
            "!" => Some(UnaryOpType::Not),
            "~" => Some(UnaryOpType::BitNot),
            "++" => Some(UnaryOpType::PreInc),
            "--" => Some(UnaryOpType::PreDec),
            _ => None,
        }
    }

    pub fn for_postfix_symbol(symbol: &str) -> Option<UnaryOpType> {
        match symbol {
            "++" => Some(UnaryOpType::PostInc),
            "--" => Some(UnaryOpType::PostDec),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOpType::Neg => "-",
            UnaryOpType::Not => "!",
            UnaryOpType::BitNot => "~",
            UnaryOpType::PreInc | UnaryOpType::PostInc => "++",
            UnaryOpType::PreDec | UnaryOpType::PostDec => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOpType::PostInc | UnaryOpType::PostDec)
    }

    pub fn modifies_operand(self) -> bool {
        matches!(self, UnaryOpType::PreInc | UnaryOpType::PreDec | UnaryOpType::PostInc | UnaryOpType::PostDec)
    }
}

impl fmt::Display for UnaryOpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_bijection() {
        for op in BinaryOpType::ALL {
            assert_eq!(BinaryOpType::for_symbol(op.symbol()), Some(op));
        }
        for symbol in ["", "===", "<<<", "**", "~", "!", "?", "+ ="] {
            assert_eq!(BinaryOpType::for_symbol(symbol), None);
        }
    }

    #[test]
    fn test_categories() {
        assert!(BinaryOpType::Le.is_relational());
        assert!(BinaryOpType::AddAssign.is_assignment());
        assert!(!BinaryOpType::Add.is_assignment());
        assert!(BinaryOpType::ShlAssign.is_bitwise());
        assert!(!BinaryOpType::ShlAssign.is_assignment());
        assert!(BinaryOpType::ShlAssign.modifies_lhs());
        assert_eq!(BinaryOpType::BitXorAssign.compound_op(), Some(BinaryOpType::BitXor));
        assert!(BinaryOpType::Xor.is_logical());
        assert!(!BinaryOpType::Xor.is_comparison());
    }

    #[test]
    fn test_precedence_order() {
        assert!(BinaryOpType::Mul.precedence() > BinaryOpType::Add.precedence());
        assert!(BinaryOpType::Add.precedence() > BinaryOpType::Shl.precedence());
        assert!(BinaryOpType::BitOr.precedence() > BinaryOpType::Lt.precedence());
        assert!(BinaryOpType::Or.precedence() > COND_PRECEDENCE);
        assert_eq!(BinaryOpType::MulAssign.precedence(), ASSIGN_PRECEDENCE);
        assert!(BinaryOpType::Assign.is_right_assoc());
        assert!(!BinaryOpType::Sub.is_right_assoc());
    }

    #[test]
    fn test_unary_symbols() {
        assert_eq!(UnaryOpType::for_prefix_symbol("~"), Some(UnaryOpType::BitNot));
        assert_eq!(UnaryOpType::for_postfix_symbol("++"), Some(UnaryOpType::PostInc));
        assert_eq!(UnaryOpType::for_postfix_symbol("-"), None);
        assert!(UnaryOpType::PostDec.is_postfix());
        assert_eq!(UnaryOpType::PostDec.symbol(), "--");
    }
}
