//! Cache key computation
//!
//! A key is the standard base64 encoding of a SHA-256 digest over the
//! function identity followed by each resolved argument in declaration
//! order. Every segment is written as `<byte length>:<segment>` so that
//! argument boundaries are part of the hashed input and `("ab", "c")` can
//! never collide with `("a", "bc")`.
//!
//! Keys are stable for one serializer configuration. They are opaque: the
//! base64 alphabet includes `+` and `/`, so do not splice them into key
//! namespaces that reserve those characters.

use crate::argument::{Argument, ArgumentPolicy, resolve};
use crate::error::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::fmt;

/// The identity and arguments of a memoized call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    name: String,
    arguments: Vec<Argument>,
}

impl Call {
    /// Start describing a call to the function identified by `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Append the next argument
    #[must_use]
    pub fn arg(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Function identity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments in declaration order
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }
}

/// Opaque fingerprint of a call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key as stored
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the cache key for `call`
pub fn compute_key(call: &Call, policy: ArgumentPolicy) -> Result<CacheKey> {
    let mut hasher = Sha256::new();
    update_segment(&mut hasher, &call.name);
    for (index, argument) in call.arguments.iter().enumerate() {
        let contribution = resolve(argument, index, policy)?;
        update_segment(&mut hasher, &contribution);
    }
    let digest = hasher.finalize();
    Ok(CacheKey(STANDARD.encode(digest.as_slice())))
}

fn update_segment(hasher: &mut Sha256, segment: &str) {
    hasher.update(segment.len().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(segment.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(call: &Call) -> CacheKey {
        compute_key(call, ArgumentPolicy::Strict).unwrap()
    }

    #[test]
    fn test_known_digest() {
        // SHA-256 of "3:Foo1:5"
        let call = Call::new("Foo").arg(Argument::literal(5));
        let expected = STANDARD.encode(Sha256::digest(b"3:Foo1:5").as_slice());
        assert_eq!(key(&call).as_str(), expected);
    }

    #[test]
    fn test_key_is_standard_base64_of_32_bytes() {
        let k = key(&Call::new("Foo").arg(Argument::literal(5)));
        assert_eq!(k.as_str().len(), 44);
        assert!(k.as_str().ends_with('='));
        assert_eq!(STANDARD.decode(k.as_str()).unwrap().len(), 32);
    }

    #[test]
    fn test_deterministic() {
        let call = Call::new("lookup")
            .arg(Argument::literal(1))
            .arg(Argument::value(&vec!["a", "b"]));
        assert_eq!(key(&call), key(&call.clone()));
    }

    #[test]
    fn test_function_identity_matters() {
        let a = Call::new("Foo").arg(Argument::literal(5));
        let b = Call::new("Bar").arg(Argument::literal(5));
        assert_ne!(key(&a), key(&b));
    }

    #[test]
    fn test_argument_order_matters() {
        let a = Call::new("f")
            .arg(Argument::literal(1))
            .arg(Argument::literal(2));
        let b = Call::new("f")
            .arg(Argument::literal(2))
            .arg(Argument::literal(1));
        assert_ne!(key(&a), key(&b));
    }

    #[test]
    fn test_argument_boundaries_do_not_collide() {
        let a = Call::new("f")
            .arg(Argument::literal("ab"))
            .arg(Argument::literal("c"));
        let b = Call::new("f")
            .arg(Argument::literal("a"))
            .arg(Argument::literal("bc"));
        assert_ne!(key(&a), key(&b));

        let c = Call::new("fa").arg(Argument::literal("b"));
        let d = Call::new("f").arg(Argument::literal("ab"));
        assert_ne!(key(&c), key(&d));
    }

    #[test]
    fn test_literal_and_captured_number_agree() {
        let literal = Call::new("f").arg(Argument::literal(5));
        let captured = Call::new("f").arg(Argument::value(&5));
        assert_eq!(key(&literal), key(&captured));
    }

    #[test]
    fn test_unresolvable_argument_propagates() {
        let call = Call::new("f").arg(Argument::opaque("rand()"));
        assert!(compute_key(&call, ArgumentPolicy::Strict).is_err());
        assert!(compute_key(&call, ArgumentPolicy::Describe).is_ok());
    }

    #[test]
    fn test_display_matches_as_str() {
        let k = key(&Call::new("f"));
        assert_eq!(k.to_string(), k.as_str());
        assert_eq!(k.as_ref(), k.as_str());
    }
}
