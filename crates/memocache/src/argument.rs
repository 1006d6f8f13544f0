//! Argument resolution
//!
//! Every argument of a memoized call contributes one canonical string to the
//! fingerprint. Literals contribute their printed form verbatim. Captured
//! values contribute the compact JSON of the leaf value actually used, after
//! walking a field chain down from the captured root. `serde_json` keeps
//! object keys sorted, so equal values always print identically.
//!
//! JSON has no representation for NaN or infinities: `serde_json` prints
//! every non-finite float as `null`. A captured `f64::NAN`, `f64::INFINITY`
//! and `None` therefore contribute the same string. Capture such values in
//! a representation that keeps them apart, e.g. their `to_string()`.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

/// One argument of a memoized call
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A constant, used as printed
    Literal(String),

    /// A value captured from the caller's scope
    Reference {
        /// The captured root value
        root: Value,
        /// Field names from the root down to the leaf actually used
        chain: Vec<String>,
    },

    /// A captured value that could not be serialized
    Unserializable {
        /// Error message from the serializer
        message: String,
    },

    /// Neither a literal nor a captured value; only a description is known
    Opaque(String),
}

/// What to do with an argument that cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentPolicy {
    /// Fail with [`Error::UnresolvableArgument`]
    #[default]
    Strict,
    /// Fall back to the JSON encoding of the argument's description
    ///
    /// Distinct values with the same description share a fingerprint, so
    /// only use this where that is acceptable.
    Describe,
}

impl Argument {
    /// A constant argument, contributing its `Display` form
    ///
    /// Note that strings are not quoted; use [`Argument::value`] for string
    /// data so `"5"` and `5` stay distinct.
    pub fn literal(value: impl Display) -> Self {
        Self::Literal(value.to_string())
    }

    /// An inline collection literal, printed as `[a, b, c]`
    pub fn literal_list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let printed: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
        Self::Literal(format!("[{}]", printed.join(", ")))
    }

    /// A captured value used directly
    ///
    /// Non-finite floats serialize as `null`; see the module docs.
    pub fn value<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::reference(value, std::iter::empty::<&str>())
    }

    /// A captured value reached through a chain of field accesses
    ///
    /// `chain` names each field from `root` down to the leaf; numeric
    /// segments index into sequences.
    pub fn reference<T, I, S>(root: &T, chain: I) -> Self
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match serde_json::to_value(root) {
            Ok(root) => Self::Reference {
                root,
                chain: chain.into_iter().map(Into::into).collect(),
            },
            Err(e) => Self::Unserializable {
                message: e.to_string(),
            },
        }
    }

    /// An argument known only by its description
    pub fn opaque(description: impl Into<String>) -> Self {
        Self::Opaque(description.into())
    }
}

/// Resolve the argument at `index` to its fingerprint contribution
pub fn resolve(argument: &Argument, index: usize, policy: ArgumentPolicy) -> Result<String> {
    match argument {
        Argument::Literal(printed) => Ok(printed.clone()),
        Argument::Reference { root, chain } => match walk(root, chain) {
            Some(leaf) => Ok(leaf.to_string()),
            None => fallback(
                index,
                policy,
                &chain.join("."),
                format!("field chain `{}` does not exist", chain.join(".")),
            ),
        },
        Argument::Unserializable { message } => Err(Error::unresolvable(index, message.clone())),
        Argument::Opaque(description) => fallback(
            index,
            policy,
            description,
            format!("`{description}` is neither a literal nor a captured value"),
        ),
    }
}

/// Follow `chain` from `root` to the referenced leaf
fn walk<'a>(root: &'a Value, chain: &[String]) -> Option<&'a Value> {
    chain.iter().try_fold(root, |value, field| match value {
        Value::Object(map) => map.get(field),
        Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn fallback(
    index: usize,
    policy: ArgumentPolicy,
    description: &str,
    message: String,
) -> Result<String> {
    match policy {
        ArgumentPolicy::Strict => Err(Error::unresolvable(index, message)),
        ArgumentPolicy::Describe => {
            tracing::debug!(index, description, "Falling back to argument description");
            Ok(Value::String(description.to_string()).to_string())
        }
    }
}
