//! Scalar/sequence broadcasting for vectorized drawing calls.
//!
//! Every drawing argument is either one value or a sequence. All sequences in
//! a call must agree on a common length `L` (or have length 1); scalars and
//! length-1 sequences are replicated to `L`.

use crate::errors::BroadcastError;

/// One argument of a vectorized call
#[derive(Clone, Debug, PartialEq)]
pub enum Arg<T> {
    Scalar(T),
    Seq(Vec<T>),
}

impl<T> Arg<T> {
    /// `None` for scalars, the element count for sequences
    pub fn shape_len(&self) -> Option<usize> {
        match self {
            Arg::Scalar(_) => None,
            Arg::Seq(items) => Some(items.len()),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Arg<U> {
        match self {
            Arg::Scalar(v) => Arg::Scalar(f(v)),
            Arg::Seq(items) => Arg::Seq(items.into_iter().map(f).collect()),
        }
    }

    /// Expand to exactly `len` elements. `index` only labels the error.
    pub fn expand_at(self, index: usize, len: usize) -> Result<Vec<T>, BroadcastError>
    where
        T: Clone,
    {
        match self {
            Arg::Scalar(v) => Ok(vec![v; len]),
            Arg::Seq(items) if items.len() == len => Ok(items),
            Arg::Seq(mut items) if items.len() == 1 => {
                let v = items.remove(0);
                Ok(vec![v; len])
            }
            Arg::Seq(items) => Err(BroadcastError::ShapeMismatch {
                index,
                found: items.len(),
                expected: len,
            }),
        }
    }
}

impl<T> Default for Arg<T>
where
    T: Default,
{
    fn default() -> Self {
        Arg::Scalar(T::default())
    }
}

/// Compute the broadcast length over argument shapes and validate every one.
///
/// `L = max(1, longest sequence)`; a sequence whose length is neither 1 nor
/// `L` is a [`BroadcastError::ShapeMismatch`].
pub fn common_len(shapes: &[Option<usize>]) -> Result<usize, BroadcastError> {
    let len = shapes.iter().flatten().copied().max().unwrap_or(1).max(1);
    for (index, shape) in shapes.iter().enumerate() {
        if let Some(found) = *shape {
            if found != 1 && found != len {
                return Err(BroadcastError::ShapeMismatch {
                    index,
                    found,
                    expected: len,
                });
            }
        }
    }
    Ok(len)
}

/// Align homogeneous arguments to their common length.
pub fn unify<T: Clone>(args: Vec<Arg<T>>) -> Result<Vec<Vec<T>>, BroadcastError> {
    let shapes: Vec<Option<usize>> = args.iter().map(Arg::shape_len).collect();
    let len = common_len(&shapes)?;
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| arg.expand_at(index, len))
        .collect()
}

macro_rules! impl_arg_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg<$ty> {
                fn from(v: $ty) -> Self {
                    Arg::Scalar(v)
                }
            }

            impl From<Vec<$ty>> for Arg<$ty> {
                fn from(v: Vec<$ty>) -> Self {
                    Arg::Seq(v)
                }
            }

            impl From<&[$ty]> for Arg<$ty> {
                fn from(v: &[$ty]) -> Self {
                    Arg::Seq(v.to_vec())
                }
            }

            impl<const N: usize> From<[$ty; N]> for Arg<$ty> {
                fn from(v: [$ty; N]) -> Self {
                    Arg::Seq(v.to_vec())
                }
            }
        )*
    };
}

impl_arg_from!(f64, String);

impl From<&str> for Arg<String> {
    fn from(v: &str) -> Self {
        Arg::Scalar(v.to_string())
    }
}

impl From<Vec<&str>> for Arg<String> {
    fn from(v: Vec<&str>) -> Self {
        Arg::Seq(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Arg<String> {
    fn from(v: [&str; N]) -> Self {
        Arg::Seq(v.iter().map(|s| s.to_string()).collect())
    }
}
