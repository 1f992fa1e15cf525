//! Hash chain over the action log.
//!
//!   genesis = H("genesis::" + seed)
//!   hash_i  = H(prev + "::" + canonical(round_i, action_i))
//!
//! H is the same 32-bit FNV-1a as the draw function, rendered as eight
//! lowercase hex digits.
//!
//! RULE: during verification a stored hash is only ever compared, never
//! fed back in as `prev`. The next link is always built on the previous
//! *recomputed* hash, so patching one entry's stored hash in isolation
//! cannot repair a tampered log.

use crate::{draw::fnv1a32, types::Seed};

pub fn hash_hex(input: &str) -> String {
    format!("{:08x}", fnv1a32(input.as_bytes()))
}

pub fn genesis(seed: &Seed) -> String {
    hash_hex(&format!("genesis::{seed}"))
}

pub fn link(prev: &str, canonical: &str) -> String {
    hash_hex(&format!("{prev}::{canonical}"))
}

/// Append-only chain builder. The head commits to every link so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBuilder {
    head: String,
    len:  usize,
}

impl ChainBuilder {
    pub fn new(seed: &Seed) -> Self {
        Self {
            head: genesis(seed),
            len:  0,
        }
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The hash the next link would get, without appending it.
    pub fn next_hash(&self, canonical: &str) -> String {
        link(&self.head, canonical)
    }

    /// Extend the chain and return the new head.
    pub fn append(&mut self, canonical: &str) -> String {
        self.head = self.next_hash(canonical);
        self.len += 1;
        self.head.clone()
    }
}

/// First link whose stored hash disagrees with the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMismatch {
    /// Zero-based position in the sequence.
    pub index:    usize,
    pub expected: String,
    pub stored:   String,
}

/// Verify `(canonical, stored_hash)` pairs against a fresh chain from
/// `seed`. Returns the recomputed head on success.
pub fn verify_links<'a, I>(seed: &Seed, links: I) -> Result<String, LinkMismatch>
where
    I: IntoIterator<Item = (String, &'a str)>,
{
    let mut chain = ChainBuilder::new(seed);
    for (index, (canonical, stored)) in links.into_iter().enumerate() {
        let expected = chain.next_hash(&canonical);
        if expected != stored {
            return Err(LinkMismatch {
                index,
                expected,
                stored: stored.to_string(),
            });
        }
        chain.append(&canonical);
    }
    Ok(chain.head)
}
