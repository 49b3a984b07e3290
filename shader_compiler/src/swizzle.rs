use crate::ident::Ident;
use std::fmt;

/// Vector component selection such as `.xy` or `.bgra`. At most four components.
#[derive(Clone, Debug, PartialEq)]
pub struct Swizzle {
    indices: Vec<usize>,
    is_color: bool,
}

#[allow(clippy::len_without_is_empty)]
impl Swizzle {
    pub(crate) fn parse(ident: Ident) -> Option<Swizzle> {
        ident.with(|string| {
            if string.is_empty() || string.len() > 4 {
                return None;
            }
            let mut chars = string.chars().peekable();
            let is_color = matches!(chars.peek(), Some('r' | 'g' | 'b' | 'a'));
            let mut indices = Vec::new();
            for ch in chars {
                indices.push(match (is_color, ch) {
                    (false, 'x') | (true, 'r') => 0,
                    (false, 'y') | (true, 'g') => 1,
                    (false, 'z') | (true, 'b') => 2,
                    (false, 'w') | (true, 'a') => 3,
                    _ => return None,
                });
            }
            Some(Swizzle { indices, is_color })
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Highest component index used, to check against the vector width.
    pub fn max_index(&self) -> usize {
        self.indices.iter().copied().max().unwrap_or(0)
    }

    pub fn has_duplicates(&self) -> bool {
        self.indices.iter().enumerate().any(|(index, component)| self.indices[index + 1..].contains(component))
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = if self.is_color { ['r', 'g', 'b', 'a'] } else { ['x', 'y', 'z', 'w'] };
        for index in &self.indices {
            write!(f, "{}", names[*index])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let swizzle = Swizzle::parse(Ident::new("wzyx")).unwrap();
        assert_eq!(swizzle.len(), 4);
        assert_eq!(swizzle.max_index(), 3);
        assert_eq!(swizzle.to_string(), "wzyx");
        assert_eq!(Swizzle::parse(Ident::new("bgr")).unwrap().to_string(), "bgr");
        assert_eq!(Swizzle::parse(Ident::new("xg")), None);
        assert_eq!(Swizzle::parse(Ident::new("xyzwx")), None);
        assert_eq!(Swizzle::parse(Ident::new("length")), None);
    }

    #[test]
    fn test_duplicates() {
        assert!(Swizzle::parse(Ident::new("xx")).unwrap().has_duplicates());
        assert!(!Swizzle::parse(Ident::new("zyx")).unwrap().has_duplicates());
        assert_eq!(Swizzle::parse(Ident::new("ra")).unwrap().max_index(), 3);
    }
}
