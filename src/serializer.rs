//! Combinator-based codec for the Game-ID cell stream.
//!
//! A combinator consumes a prefix of the input (values when serializing,
//! bytes when deserializing) and reports how much it consumed. `None`
//! means the combinator does not apply at the current position.

pub trait Combinator<T> {
    fn serialize(&self, input: &[T]) -> Option<(usize, Vec<u8>)>;
    fn deserialize(&self, input: &[u8]) -> Option<(usize, Vec<T>)>;
}

impl<A, T> Combinator<T> for &A
where
    A: Combinator<T>,
{
    fn serialize(&self, input: &[T]) -> Option<(usize, Vec<u8>)> {
        (*self).serialize(input)
    }

    fn deserialize(&self, input: &[u8]) -> Option<(usize, Vec<T>)> {
        (*self).deserialize(input)
    }
}

pub struct Choice<T> {
    choices: Vec<Box<dyn Combinator<T>>>,
}

impl<T> Choice<T> {
    pub fn new(choices: Vec<Box<dyn Combinator<T>>>) -> Choice<T> {
        Choice { choices }
    }
}

impl<T> Combinator<T> for Choice<T> {
    fn serialize(&self, input: &[T]) -> Option<(usize, Vec<u8>)> {
        self.choices
            .iter()
            .find_map(|choice| choice.serialize(input))
    }

    fn deserialize(&self, input: &[u8]) -> Option<(usize, Vec<T>)> {
        self.choices
            .iter()
            .find_map(|choice| choice.deserialize(input))
    }
}

/// A single fixed byte standing for a single fixed value.
pub struct Dict<T: Clone + PartialEq> {
    value: T,
    symbol: u8,
}

impl<T: Clone + PartialEq> Dict<T> {
    pub fn new(value: T, symbol: char) -> Dict<T> {
        Dict {
            value,
            symbol: symbol as u8,
        }
    }
}

impl<T: Clone + PartialEq> Combinator<T> for Dict<T> {
    fn serialize(&self, input: &[T]) -> Option<(usize, Vec<u8>)> {
        if input.len() == 0 || input[0] != self.value {
            None
        } else {
            Some((1, vec![self.symbol]))
        }
    }

    fn deserialize(&self, input: &[u8]) -> Option<(usize, Vec<T>)> {
        if input.len() == 0 || input[0] != self.symbol {
            None
        } else {
            Some((1, vec![self.value.clone()]))
        }
    }
}

/// Run of consecutive `space` values as one letter: `minimum` stands for a
/// run of 1, the next letter for 2, and so on up to 'z'. Longer runs are
/// covered by repeated application.
pub struct Spaces<T: Clone + PartialEq> {
    space: T,
    minimum: u8,
    maximum: u8,
}

impl<T: Clone + PartialEq> Spaces<T> {
    pub fn new(space: T, minimum: char) -> Spaces<T> {
        Spaces {
            space,
            minimum: minimum as u8,
            maximum: 'z' as u8,
        }
    }
}

impl<T: Clone + PartialEq> Combinator<T> for Spaces<T> {
    fn serialize(&self, input: &[T]) -> Option<(usize, Vec<u8>)> {
        let n_spaces_max = (self.maximum - self.minimum) as usize + 1;
        let mut n_spaces = 0;
        while n_spaces < input.len() && n_spaces < n_spaces_max && input[n_spaces] == self.space {
            n_spaces += 1;
        }
        if n_spaces == 0 {
            None
        } else {
            Some((n_spaces, vec![self.minimum + (n_spaces - 1) as u8]))
        }
    }

    fn deserialize(&self, input: &[u8]) -> Option<(usize, Vec<T>)> {
        if input.len() == 0 {
            return None;
        }
        let v = input[0];
        if !(self.minimum <= v && v <= self.maximum) {
            return None;
        }
        let mut ret = vec![];
        for _ in 0..=(v - self.minimum) {
            ret.push(self.space.clone());
        }
        Some((1, ret))
    }
}

/// Apply the base combinator repeatedly until exactly `count` values have
/// been produced. Deserialization tolerates the last application running
/// past `count` (a trailing run letter may overshoot the grid end) and
/// truncates.
pub struct Seq<S> {
    base_serializer: S,
    count: usize,
}

impl<S> Seq<S> {
    pub fn new(base_serializer: S, count: usize) -> Seq<S> {
        Seq {
            base_serializer,
            count,
        }
    }
}

impl<S, T> Combinator<T> for Seq<S>
where
    S: Combinator<T>,
{
    fn serialize(&self, input: &[T]) -> Option<(usize, Vec<u8>)> {
        if input.len() < self.count {
            return None;
        }

        let mut ofs = 0;
        let mut ret = vec![];
        while ofs < self.count {
            let (n_read, part) = self.base_serializer.serialize(&input[ofs..self.count])?;
            ofs += n_read;
            ret.extend(part);
        }

        Some((self.count, ret))
    }

    fn deserialize(&self, input: &[u8]) -> Option<(usize, Vec<T>)> {
        let mut ofs = 0;
        let mut ret = vec![];
        while ret.len() < self.count {
            let (n_read, part) = self.base_serializer.deserialize(&input[ofs..])?;
            ofs += n_read;
            ret.extend(part);
        }

        ret.truncate(self.count);
        Some((ofs, ret))
    }
}
