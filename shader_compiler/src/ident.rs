use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;

static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// An "interned" identifier. The interner is shared by every compilation in the
/// process and is safe to use from multiple threads; see
/// <https://en.wikipedia.org/wiki/String_interning>.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Ident(Spur);

impl Ident {
    pub fn new<'a, S>(string: S) -> Ident
    where
        S: Into<Cow<'a, str>>,
    {
        Self(INTERNER.get_or_intern(string.into()))
    }

    pub fn with<F, R>(self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        f(INTERNER.resolve(&self.0))
    }

    pub fn as_str(self) -> &'static str {
        // `ThreadedRodeo` never frees strings, and the interner itself is a static.
        let interner: &'static ThreadedRodeo = &INTERNER;
        interner.resolve(&self.0)
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.with(|string| write!(f, "{}", string))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.with(|string| write!(f, "{}", string))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Ident) -> Ordering {
        INTERNER.resolve(&self.0).cmp(INTERNER.resolve(&other.0))
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Ident) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_interning() {
        let a = Ident::new("baseImg");
        let b = Ident::new(String::from("baseImg"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "baseImg");
        assert!(Ident::new("alpha") < Ident::new("beta"));
    }
}
