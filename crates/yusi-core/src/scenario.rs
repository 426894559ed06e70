//! Owner-side scenario selection for starting a room.
//!
//! Two modes resolve the scenario id passed to the start call: an explicit
//! pick from the approved catalog, or a uniform draw from a curated pool.
//! The draw happens client-side; the scenario is cosmetic content, not an
//! adversarial resource, so reproducibility is not a goal.

use rand::RngExt;
use thiserror::Error;

use crate::model::{Scenario, ScenarioId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no scenario selected")]
    EmptySelection,
}

/// How the owner chose (or will randomly draw) the scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSelection {
    /// Exactly one scenario, chosen by hand.
    Explicit(ScenarioId),
    /// A curated subset of the catalog; one id is drawn uniformly on start.
    Pool(Vec<ScenarioId>),
}

impl ScenarioSelection {
    /// The default random pool: the full approved catalog.
    pub fn from_catalog(catalog: &[Scenario]) -> Self {
        ScenarioSelection::Pool(catalog.iter().map(|s| s.id.clone()).collect())
    }

    /// Toggle an id in or out of the pool. No-op for an explicit pick.
    pub fn toggle(&mut self, id: &str) {
        if let ScenarioSelection::Pool(pool) = self {
            if let Some(pos) = pool.iter().position(|p| p == id) {
                pool.remove(pos);
            } else {
                pool.push(id.to_string());
            }
        }
    }

    /// Resolve to a concrete scenario id, drawing from the pool if needed.
    ///
    /// An empty pool (or empty explicit id) refuses rather than guessing;
    /// the start call must not be made.
    pub fn resolve<R: RngExt + ?Sized>(&self, rng: &mut R) -> Result<ScenarioId, SelectionError> {
        match self {
            ScenarioSelection::Explicit(id) => {
                if id.is_empty() {
                    return Err(SelectionError::EmptySelection);
                }
                Ok(id.clone())
            }
            ScenarioSelection::Pool(pool) => {
                if pool.is_empty() {
                    return Err(SelectionError::EmptySelection);
                }
                Ok(pool[rng.random_range(0..pool.len())].clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Scenario> {
        ["s1", "s2", "s3"]
            .iter()
            .map(|id| Scenario {
                id: (*id).to_string(),
                title: format!("title {id}"),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn explicit_pick_resolves_to_itself() {
        let sel = ScenarioSelection::Explicit("s2".into());
        let mut rng = rand::rng();
        assert_eq!(sel.resolve(&mut rng).unwrap(), "s2");
    }

    #[test]
    fn pool_draw_always_lands_in_the_pool() {
        let sel = ScenarioSelection::from_catalog(&catalog());
        let mut rng = rand::rng();
        for _ in 0..64 {
            let id = sel.resolve(&mut rng).unwrap();
            assert!(["s1", "s2", "s3"].contains(&id.as_str()));
        }
    }

    #[test]
    fn empty_pool_refuses() {
        let sel = ScenarioSelection::Pool(Vec::new());
        let mut rng = rand::rng();
        assert_eq!(sel.resolve(&mut rng), Err(SelectionError::EmptySelection));
    }

    #[test]
    fn toggle_curates_the_pool() {
        let mut sel = ScenarioSelection::from_catalog(&catalog());
        sel.toggle("s2");
        assert_eq!(sel, ScenarioSelection::Pool(vec!["s1".into(), "s3".into()]));
        sel.toggle("s2");
        let ScenarioSelection::Pool(pool) = &sel else {
            panic!("still a pool");
        };
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn single_entry_pool_is_deterministic() {
        let sel = ScenarioSelection::Pool(vec!["only".into()]);
        let mut rng = rand::rng();
        assert_eq!(sel.resolve(&mut rng).unwrap(), "only");
    }
}
