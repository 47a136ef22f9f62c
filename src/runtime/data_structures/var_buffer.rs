use crate::runtime::data_structures::value::Value;
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// Storage for lexically bound variables.  Each buffer holds the slots introduced by one bind
/// construct, starting at `base`, and chains to the buffer holding the slots bound further out.
///
/// Buffers are never mutated after creation, so any number of closures can share one.  A slot
/// index is an absolute position in the whole chain, assigned at compile time.
pub struct VarBuffer {
    base: usize,
    values: Vec<Value>,
    parent: Option<Rc<VarBuffer>>,
}

impl VarBuffer {
    /// Create a buffer for slots `base .. base + values.len()` chained onto `parent`.
    pub fn new(base: usize, values: Vec<Value>, parent: Option<Rc<VarBuffer>>) -> Rc<VarBuffer> {
        Rc::new(VarBuffer {
            base,
            values,
            parent,
        })
    }

    /// The first slot held directly by this buffer.
    pub fn base(&self) -> usize {
        self.base
    }

    /// The number of slots visible through this buffer, including the chained ones.
    pub fn len(&self) -> usize {
        self.base + self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a slot anywhere in the chain.
    pub fn get(&self, slot: usize) -> Option<&Value> {
        if slot >= self.base {
            self.values.get(slot - self.base)
        } else {
            self.parent.as_ref()?.get(slot)
        }
    }

    /// Restrict a chain to its first `count` slots, which is the window a closure or a local word
    /// captures.  Whole buffers are shared, a buffer straddling the boundary is copied with only
    /// the visible values aliased into the copy.
    pub fn window(buffer: &Rc<VarBuffer>, count: usize) -> Option<Rc<VarBuffer>> {
        let mut current = buffer;

        loop {
            if count >= current.len() {
                return Some(Rc::clone(current));
            }

            if current.base < count {
                let keep = count - current.base;

                return Some(VarBuffer::new(
                    current.base,
                    current.values[..keep].to_vec(),
                    current.parent.clone(),
                ));
            }

            match &current.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }
}

impl Display for VarBuffer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "<")?;

        for slot in 0..self.len() {
            if slot > 0 {
                write!(f, " ")?;
            }

            match self.get(slot) {
                Some(value) => write!(f, "{}", value.stringify())?,
                None => write!(f, "?")?,
            }
        }

        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|value| Value::Int(*value)).collect()
    }

    #[test]
    fn slots_are_read_through_the_chain() {
        let outer = VarBuffer::new(0, ints(&[1, 2]), None);
        let inner = VarBuffer::new(2, ints(&[3]), Some(outer));

        assert_eq!(inner.len(), 3);
        assert_eq!(inner.get(0), Some(&Value::Int(1)));
        assert_eq!(inner.get(2), Some(&Value::Int(3)));
        assert!(inner.get(3).is_none());
    }

    #[test]
    fn window_on_a_buffer_boundary_shares_the_parent() {
        let outer = VarBuffer::new(0, ints(&[1, 2]), None);
        let inner = VarBuffer::new(2, ints(&[3]), Some(Rc::clone(&outer)));

        let window = VarBuffer::window(&inner, 2).unwrap();

        assert!(Rc::ptr_eq(&window, &outer));
    }

    #[test]
    fn window_inside_a_buffer_copies_the_visible_part() {
        let buffer = VarBuffer::new(0, ints(&[1, 2, 3]), None);
        let window = VarBuffer::window(&buffer, 2).unwrap();

        assert_eq!(window.len(), 2);
        assert_eq!(window.get(1), Some(&Value::Int(2)));
        assert!(window.get(2).is_none());
    }

    #[test]
    fn zero_window_captures_nothing() {
        let buffer = VarBuffer::new(0, ints(&[1]), None);

        assert!(VarBuffer::window(&buffer, 0).is_none());
    }

    #[test]
    fn oversized_window_keeps_the_whole_chain() {
        let buffer = VarBuffer::new(0, ints(&[1]), None);
        let window = VarBuffer::window(&buffer, usize::MAX).unwrap();

        assert!(Rc::ptr_eq(&window, &buffer));
    }
}
