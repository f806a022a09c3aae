#![crate_name = "heredity"]
//! Exact inference of gene copies and trait presence over a family pedigree.
//!
//! A `Population` is read from an observation source (usually a CSV file via
//! `observable::CsvBuilder`), then `Heredity::infer` enumerates every
//! assignment of gene counts and traits consistent with the observed traits
//! and returns per-individual posterior distributions.
use std::collections::BTreeMap;

pub mod prelude;

pub mod error;
pub mod genetics;
pub mod inference;
pub mod logging;
pub mod observable;
pub mod report;

use crate::error::{HeredityError, Result};

/// Index of an individual in its `Population`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PersonId(pub usize);

pub type NameIndex = BTreeMap<String, PersonId>;

/// One member of a pedigree.
///
/// Parents are held as ids into the same `Population`, so individuals never
/// own each other. Either both parents are known or neither is.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    name: String,
    parents: Option<(PersonId, PersonId)>,
    trait_: Option<bool>,
}

impl Individual {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mother(&self) -> Option<PersonId> {
        self.parents.map(|(mother, _)| mother)
    }

    pub fn father(&self) -> Option<PersonId> {
        self.parents.map(|(_, father)| father)
    }

    /// `(mother, father)`, or `None` for a founder.
    pub fn parents(&self) -> Option<(PersonId, PersonId)> {
        self.parents
    }

    pub fn is_founder(&self) -> bool {
        self.parents.is_none()
    }

    /// Observed trait, `None` when unknown.
    pub fn observed_trait(&self) -> Option<bool> {
        self.trait_
    }
}

/// A single row of input data.
///
/// Parents are given by name; they are resolved once the whole source has
/// been read, so a row may refer to a parent that appears later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub name: String,
    pub mother: Option<String>,
    pub father: Option<String>,
    pub trait_: Option<bool>,
}

impl Observation {
    pub fn founder(name: &str, trait_: Option<bool>) -> Self {
        Self {
            name: name.into(),
            mother: None,
            father: None,
            trait_,
        }
    }

    pub fn child(name: &str, mother: &str, father: &str, trait_: Option<bool>) -> Self {
        Self {
            name: name.into(),
            mother: Some(mother.into()),
            father: Some(father.into()),
            trait_,
        }
    }
}

/// All individuals of a pedigree, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    individuals: Vec<Individual>,
    index: NameIndex,
}

impl Population {
    /// Constructs a new empty `Population`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a population from already-parsed observations.
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self> {
        let mut population = Self::new();
        population.observe(observations.into_iter().map(Ok))?;
        Ok(population)
    }

    /// Observe all the data in the argument.
    ///
    /// Individuals are appended after any already present. Parent names are
    /// resolved against the whole population once the source is exhausted,
    /// and the result is checked for half-known parentage, dangling
    /// references and cycles. On error the population is left unchanged.
    pub fn observe<I>(&mut self, observable: I) -> Result<()>
    where
        I: Iterator<Item = Result<Observation>>,
    {
        let mut pending = vec![];
        let mut index = self.index.clone();
        for observation in observable {
            let observation = observation?;
            let id = PersonId(self.individuals.len() + pending.len());
            if index.insert(observation.name.clone(), id).is_some() {
                return Err(HeredityError::DuplicateIndividual(observation.name));
            }
            pending.push(observation);
        }

        let mut individuals = self.individuals.clone();
        for observation in pending {
            let parents = match (&observation.mother, &observation.father) {
                (None, None) => None,
                (Some(mother), Some(father)) => Some((
                    resolve(&index, &observation.name, mother)?,
                    resolve(&index, &observation.name, father)?,
                )),
                (Some(_), None) => {
                    return Err(HeredityError::HalfKnownParents {
                        name: observation.name,
                        known: "mother",
                        missing: "father",
                    })
                }
                (None, Some(_)) => {
                    return Err(HeredityError::HalfKnownParents {
                        name: observation.name,
                        known: "father",
                        missing: "mother",
                    })
                }
            };
            individuals.push(Individual {
                name: observation.name,
                parents,
                trait_: observation.trait_,
            });
        }

        check_acyclic(&individuals)?;
        self.individuals = individuals;
        self.index = index;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, id: PersonId) -> Option<&Individual> {
        self.individuals.get(id.0)
    }

    /// Looks up an individual's id by name.
    pub fn id(&self, name: &str) -> Option<PersonId> {
        self.index.get(name).copied()
    }

    /// Individuals with their ids, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (PersonId, &Individual)> {
        self.individuals
            .iter()
            .enumerate()
            .map(|(i, individual)| (PersonId(i), individual))
    }

    pub fn ids(&self) -> impl Iterator<Item = PersonId> {
        (0..self.individuals.len()).map(PersonId)
    }

    /// Names of all individuals, in input order.
    pub fn names(&self) -> Vec<&str> {
        self.individuals.iter().map(|x| x.name()).collect()
    }
}

fn resolve(index: &NameIndex, child: &str, parent: &str) -> Result<PersonId> {
    index
        .get(parent)
        .copied()
        .ok_or_else(|| HeredityError::UnknownParent {
            name: child.into(),
            parent: parent.into(),
        })
}

// Kahn's algorithm over parent -> child edges.
fn check_acyclic(individuals: &[Individual]) -> Result<()> {
    let mut children: Vec<Vec<usize>> = vec![vec![]; individuals.len()];
    let mut unresolved = vec![0usize; individuals.len()];
    for (i, individual) in individuals.iter().enumerate() {
        if let Some((mother, father)) = individual.parents {
            children[mother.0].push(i);
            children[father.0].push(i);
            unresolved[i] = 2;
        }
    }

    let mut ready: Vec<usize> = (0..individuals.len())
        .filter(|i| unresolved[*i] == 0)
        .collect();
    let mut visited = 0;
    while let Some(i) = ready.pop() {
        visited += 1;
        for child in &children[i] {
            unresolved[*child] -= 1;
            if unresolved[*child] == 0 {
                ready.push(*child);
            }
        }
    }

    if visited < individuals.len() {
        let stuck = unresolved
            .iter()
            .position(|x| *x > 0)
            .map(|i| individuals[i].name.clone())
            .unwrap_or_default();
        return Err(HeredityError::CyclicPedigree(stuck));
    }
    Ok(())
}
