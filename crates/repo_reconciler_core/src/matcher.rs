//! Matching desired and observed entries by identity.

use std::collections::{HashMap, VecDeque};

use crate::state::{IdentityKey, Keyed};

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;

/// The three-way partition of two keyed collections.
///
/// Every input entry lands in exactly one bucket. Pairs and creates follow the
/// desired order, deletes follow the observed order.
#[derive(Debug)]
pub struct Matched<'a, T> {
    /// `(desired, observed)` entries with the same identity.
    pub pairs: Vec<(&'a T, &'a T)>,
    pub to_create: Vec<&'a T>,
    pub to_delete: Vec<&'a T>,
}

/// Partitions `desired` and `observed` by identity key.
///
/// If the platform reports the same identity twice, the first observed entry is
/// paired and the others are deleted.
pub fn match_keyed<'a, T: Keyed>(desired: &'a [T], observed: &'a [T]) -> Matched<'a, T> {
    let mut unmatched: HashMap<&IdentityKey, VecDeque<usize>> = HashMap::new();
    for (index, entry) in observed.iter().enumerate() {
        unmatched.entry(entry.key()).or_default().push_back(index);
    }

    let mut paired = vec![false; observed.len()];
    let mut pairs = Vec::new();
    let mut to_create = Vec::new();

    for entry in desired {
        match unmatched
            .get_mut(entry.key())
            .and_then(VecDeque::pop_front)
        {
            Some(index) => {
                paired[index] = true;
                pairs.push((entry, &observed[index]));
            }
            None => to_create.push(entry),
        }
    }

    let to_delete = observed
        .iter()
        .zip(&paired)
        .filter(|(_, paired)| !**paired)
        .map(|(entry, _)| entry)
        .collect();

    Matched {
        pairs,
        to_create,
        to_delete,
    }
}
