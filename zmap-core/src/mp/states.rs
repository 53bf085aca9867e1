// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde::{Deserialize, Serialize};

/// Filter over azimuthal frequencies |m|
///
/// # Examples
///
/// ```
/// use zmap_core::mp::States;
///
/// let m = [0, -1, 1, -2, 0, 2];
///
/// assert_eq!(States::All.resolve(&m), vec![0, 1, 2]);
/// assert_eq!(States::NonZero.resolve(&m), vec![1, 2]);
/// assert_eq!(States::Only(vec![2, 2, 0]).resolve(&m), vec![0, 2]);
/// assert_eq!(States::from_sentinel(-1), States::NonZero);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum States {
    /// Every |m| present in the basis
    #[default]
    All,
    /// Only the listed |m| values
    Only(Vec<usize>),
    /// Every non-zero |m| present in the basis
    NonZero,
}

impl States {
    /// Negative values select all non-zero states, others a single state
    pub fn from_sentinel(state: i64) -> States {
        if state < 0 {
            States::NonZero
        } else {
            States::Only(vec![state as usize])
        }
    }

    /// Sorted, deduplicated |m| values retained from `m`
    pub fn resolve(&self, m: &[i32]) -> Vec<usize> {
        let mut present: Vec<usize> = m.iter().map(|mi| mi.unsigned_abs() as usize).collect();
        present.sort_unstable();
        present.dedup();

        match self {
            States::All => present,
            States::NonZero => present.into_iter().filter(|&v| v != 0).collect(),
            States::Only(states) => {
                let mut states = states.clone();
                states.sort_unstable();
                states.dedup();
                states
            }
        }
    }

    /// Positions in `m` whose |m| is retained
    pub fn columns(&self, m: &[i32]) -> Vec<usize> {
        let keep = self.resolve(m);
        m.iter()
            .enumerate()
            .filter(|(_, mi)| keep.binary_search(&(mi.unsigned_abs() as usize)).is_ok())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_columns() {
        let m = [0, -1, 1, -2, 0, 2, -3, 3];
        assert_eq!(States::All.columns(&m), (0..8).collect::<Vec<usize>>());
        assert_eq!(States::NonZero.columns(&m), vec![1, 2, 3, 5, 6, 7]);
        assert_eq!(States::Only(vec![0, 3]).columns(&m), vec![0, 4, 6, 7]);
        assert!(States::Only(vec![5]).columns(&m).is_empty());
    }

    #[test]
    fn test_from_sentinel() {
        assert_eq!(States::from_sentinel(0), States::Only(vec![0]));
        assert_eq!(States::from_sentinel(4), States::Only(vec![4]));
        assert_eq!(States::from_sentinel(-3), States::NonZero);
    }

    #[test]
    fn test_states_json() {
        let states: States = serde_json::from_str(r#"{"only": [2, 4]}"#).unwrap();
        assert_eq!(states, States::Only(vec![2, 4]));
        let states: States = serde_json::from_str(r#""non_zero""#).unwrap();
        assert_eq!(states, States::NonZero);
    }
}
