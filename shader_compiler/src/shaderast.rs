use crate::builtin::{intrinsic, intrinsic_candidates};
use crate::function::{resolve_overload, FuncId, Function, LookupError};
use crate::ident::Ident;
use crate::lit::Lit;
use crate::op::{BinaryOpType, UnaryOpType};
use crate::span::Span;
use crate::swizzle::Swizzle;
use crate::ty::Type;

/// Root of a parsed and type-checked JSL program. Owns the whole tree, plus the
/// arenas that [`FuncId::User`] and [`VarId`] handles point into.
#[derive(Clone, Debug, Default)]
pub struct ProgramUnit {
    pub(crate) decls: Vec<ExtDecl>,
    pub(crate) funcs: Vec<Function>,
    pub(crate) vars: Vec<Variable>,
}

impl ProgramUnit {
    pub fn decls(&self) -> &[ExtDecl] {
        &self.decls
    }

    pub fn function(&self, id: FuncId) -> &Function {
        match id {
            FuncId::Intrinsic(index) => intrinsic(index),
            FuncId::User(index) => &self.funcs[index],
        }
    }

    pub fn user_functions(&self) -> &[Function] {
        &self.funcs
    }

    /// Resolves a call of `name` with `arg_types` the way the parser does, against
    /// the intrinsics and this program's functions.
    pub fn lookup_function(&self, name: &str, arg_types: &[Type]) -> Result<FuncId, LookupError> {
        let intrinsics = intrinsic_candidates().map(|(id, func)| (id, func as &Function));
        let user = self.funcs.iter().enumerate().map(|(index, func)| (FuncId::User(index), func));
        resolve_overload(intrinsics.chain(user), Ident::new(name), arg_types)
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.vars[id.0]
    }

    /// Global variables in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = &Variable> {
        self.decls
            .iter()
            .filter_map(|decl| match decl {
                ExtDecl::Var(decl) => Some(decl),
                ExtDecl::Func(_) => None,
            })
            .flat_map(|decl| decl.declarators.iter())
            .map(move |declarator| self.variable(declarator.var))
    }

    pub fn find_func_decl(&self, name: &str) -> Option<&FuncDecl> {
        self.decls.iter().find_map(|decl| match decl {
            ExtDecl::Func(decl) if decl.body.is_some() && decl.name.with(|string| string == name) => Some(decl),
            _ => None,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VarId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VarKind {
    /// Host-settable global, declared with `param`.
    Param,
    Const,
    /// Plain global without qualifier.
    Global,
    Local,
    FnParam,
    Builtin(BuiltinVar),
}

/// Variables that exist implicitly inside `main`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuiltinVar {
    Pos0,
    Pos1,
    PixCoord,
    VertexColor,
    Color,
}

impl BuiltinVar {
    pub const ALL: [BuiltinVar; 5] =
        [BuiltinVar::Pos0, BuiltinVar::Pos1, BuiltinVar::PixCoord, BuiltinVar::VertexColor, BuiltinVar::Color];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinVar::Pos0 => "pos0",
            BuiltinVar::Pos1 => "pos1",
            BuiltinVar::PixCoord => "pixcoord",
            BuiltinVar::VertexColor => "jsl_vertexColor",
            BuiltinVar::Color => "color",
        }
    }

    pub fn ty(self) -> Type {
        match self {
            BuiltinVar::Pos0 | BuiltinVar::Pos1 | BuiltinVar::PixCoord => Type::FLOAT2,
            BuiltinVar::VertexColor | BuiltinVar::Color => Type::FLOAT4,
        }
    }

    /// Only the output color can be assigned.
    pub fn is_writable(self) -> bool {
        self == BuiltinVar::Color
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Precision {
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn keyword(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Variable {
    /// Where the variable was declared; only used for diagnostics.
    pub span: Span,
    pub name: Ident,
    /// `None` when the declared type could not be resolved.
    pub ty: Option<Type>,
    pub kind: VarKind,
    pub array_size: Option<u32>,
    pub precision: Option<Precision>,
}

impl Variable {
    pub fn is_lvalue(&self) -> bool {
        match self.kind {
            VarKind::Global | VarKind::Local | VarKind::FnParam => true,
            VarKind::Builtin(builtin) => builtin.is_writable(),
            VarKind::Param | VarKind::Const => false,
        }
    }
}

/// A type as written in the source, with its resolution.
#[derive(Clone, Copy, Debug)]
pub struct TyExpr {
    pub span: Span,
    pub name: Ident,
    pub ty: Option<Type>,
}

#[derive(Clone, Debug)]
pub enum ExtDecl {
    Var(VarDecl),
    Func(FuncDecl),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Qualifier {
    Const,
    Param,
}

impl Qualifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Qualifier::Const => "const",
            Qualifier::Param => "param",
        }
    }
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub span: Span,
    pub qualifier: Option<Qualifier>,
    pub precision: Option<Precision>,
    pub ty_expr: TyExpr,
    pub declarators: Vec<Declarator>,
}

#[derive(Clone, Debug)]
pub struct Declarator {
    pub span: Span,
    pub name: Ident,
    pub var: VarId,
    pub array_size: Option<u32>,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub span: Span,
    /// `None` when the signature could not be registered, e.g. on a redefinition.
    pub func: Option<FuncId>,
    pub return_ty_expr: TyExpr,
    pub name: Ident,
    pub params: Vec<ParamDecl>,
    /// `None` for a prototype.
    pub body: Option<Block>,
}

#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub span: Span,
    pub ty_expr: TyExpr,
    pub name: Ident,
    pub var: VarId,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Block(Block),
    Decl(VarDecl),
    If { span: Span, cond: Expr, then_stmt: Box<Stmt>, else_stmt: Option<Box<Stmt>> },
    /// A counted loop; see the parser for the accepted shapes of `init`, `cond` and `step`.
    For { span: Span, init: Box<Stmt>, cond: Expr, step: Expr, body: Box<Stmt> },
    Return { span: Span, expr: Option<Expr> },
    Break { span: Span },
    Continue { span: Span },
    Discard { span: Span },
    Expr { span: Span, expr: Expr },
    Empty { span: Span },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(block) => block.span,
            Stmt::Decl(decl) => decl.span,
            Stmt::If { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Discard { span }
            | Stmt::Expr { span, .. }
            | Stmt::Empty { span } => *span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub span: Span,
    /// Static type, fixed when the node is built. `None` after a type error, so
    /// checks on enclosing expressions stay quiet.
    pub ty: Option<Type>,
    pub kind: ExprKind,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Lit(Lit),
    Var { name: Ident, var: Option<VarId> },
    Un { op: UnaryOpType, expr: Box<Expr> },
    Bin { op: BinaryOpType, left: Box<Expr>, right: Box<Expr> },
    Assign { op: BinaryOpType, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { name: Ident, func: Option<FuncId>, args: Vec<Expr> },
    /// Vector constructor or scalar conversion, e.g. `float3(1.0)` or `int(x)`.
    Cons { ty: Type, args: Vec<Expr> },
    Field { expr: Box<Expr>, field: Ident, swizzle: Option<Swizzle> },
    Index { expr: Box<Expr>, index: Box<Expr> },
    Cond { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    /// Implicit int to float promotion to `Expr::ty`. Not present in the source text.
    Convert { expr: Box<Expr> },
}

impl Expr {
    pub(crate) fn new(span: Span, ty: Option<Type>, kind: ExprKind) -> Self {
        Expr { span, ty, kind }
    }

    /// Skips implicit conversions.
    pub fn unconverted(&self) -> &Expr {
        match &self.kind {
            ExprKind::Convert { expr } => expr.unconverted(),
            _ => self,
        }
    }

    /// Whether evaluating the expression can change program state: assignments,
    /// `++` / `--`, and calls to user functions.
    pub fn has_side_effects(&self) -> bool {
        match &self.kind {
            ExprKind::Lit(_) | ExprKind::Var { .. } => false,
            ExprKind::Un { op, expr } => op.modifies_operand() || expr.has_side_effects(),
            ExprKind::Bin { left, right, .. } => left.has_side_effects() || right.has_side_effects(),
            ExprKind::Assign { .. } => true,
            ExprKind::Call { func: Some(FuncId::Intrinsic(_)), args, .. } | ExprKind::Cons { args, .. } => {
                args.iter().any(Expr::has_side_effects)
            }
            ExprKind::Call { .. } => true,
            ExprKind::Field { expr, .. } | ExprKind::Convert { expr } => expr.has_side_effects(),
            ExprKind::Index { expr, index } => expr.has_side_effects() || index.has_side_effects(),
            ExprKind::Cond { cond, then_expr, else_expr } => {
                cond.has_side_effects() || then_expr.has_side_effects() || else_expr.has_side_effects()
            }
        }
    }
}
