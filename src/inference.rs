//! Exact inference by enumeration.
//!
//! Every assignment of a trait (present/absent) and a gene count (0/1/2) to
//! each individual is a candidate world. Worlds that contradict an observed
//! trait are skipped; every other world is scored under the network's
//! conditional probability tables and its probability is added to the
//! matching gene and trait bucket of every individual. Normalizing the
//! buckets gives each individual's posterior distributions.
//!
//! The cost is exponential: 2^N trait sets times 3^N gene assignments.
use crate::error::{HeredityError, Result};
use crate::genetics::{GeneCount, Probabilities};
use crate::{PersonId, Population};
use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Largest population a `Subset` can describe.
pub const MAX_INDIVIDUALS: usize = 32;

/// Populations above this size take minutes or more to enumerate.
const SLOW_POPULATION: usize = 10;

/// A set of individuals stored as a bitmask over `PersonId`s.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Subset(u64);

impl Subset {
    pub const EMPTY: Subset = Subset(0);

    /// Every individual of a population of `len` members.
    pub fn full(len: usize) -> Result<Self> {
        check_size(len)?;
        Ok(Subset((1u64 << len) - 1))
    }

    pub fn from_ids<I: IntoIterator<Item = PersonId>>(ids: I) -> Result<Self> {
        let mut subset = Subset::EMPTY;
        for id in ids {
            subset.insert(id)?;
        }
        Ok(subset)
    }

    pub fn contains(self, id: PersonId) -> bool {
        id.0 < MAX_INDIVIDUALS && self.0 & (1 << id.0) != 0
    }

    /// Adds `id`; ids past `MAX_INDIVIDUALS` cannot be represented.
    pub fn insert(&mut self, id: PersonId) -> Result<()> {
        check_size(id.0 + 1)?;
        self.0 |= 1 << id.0;
        Ok(())
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Members in ascending id order.
    pub fn iter(self) -> impl Iterator<Item = PersonId> {
        (0..MAX_INDIVIDUALS)
            .filter(move |i| self.0 & (1 << *i) != 0)
            .map(PersonId)
    }

    /// Every subset of `self`, each exactly once, from `self` down to empty.
    pub fn subsets(self) -> Subsets {
        Subsets {
            of: self.0,
            next: Some(self.0),
        }
    }

    fn difference(self, other: Subset) -> Subset {
        Subset(self.0 & !other.0)
    }

    fn intersection(self, other: Subset) -> Subset {
        Subset(self.0 & other.0)
    }
}

fn check_size(len: usize) -> Result<()> {
    if len > MAX_INDIVIDUALS {
        return Err(HeredityError::PopulationTooLarge {
            found: len,
            max: MAX_INDIVIDUALS,
        });
    }
    Ok(())
}

/// Iterator over the power set of a `Subset`.
pub struct Subsets {
    of: u64,
    next: Option<u64>,
}

impl Iterator for Subsets {
    type Item = Subset;

    fn next(&mut self) -> Option<Subset> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            Some((current - 1) & self.of)
        };
        Some(Subset(current))
    }
}

/// One candidate world: a gene count and a trait value for every individual.
///
/// Anyone in neither gene set carries zero copies; anyone outside
/// `has_trait` lacks the trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct World {
    one_gene: Subset,
    two_genes: Subset,
    has_trait: Subset,
}

impl World {
    /// A world over `population`. Fails if the population is too large to
    /// enumerate or if anyone is in both gene sets.
    pub fn new(
        population: &Population,
        one_gene: Subset,
        two_genes: Subset,
        has_trait: Subset,
    ) -> Result<Self> {
        check_size(population.len())?;
        if let Some(id) = one_gene.intersection(two_genes).iter().next() {
            let name = population
                .get(id)
                .map(|individual| individual.name().to_string())
                .unwrap_or_else(|| format!("#{}", id.0));
            return Err(HeredityError::OverlappingGeneSets(name));
        }
        Ok(Self {
            one_gene,
            two_genes,
            has_trait,
        })
    }

    /// Builds a world from individual names.
    pub fn from_names(
        population: &Population,
        one_gene: &[&str],
        two_genes: &[&str],
        has_trait: &[&str],
    ) -> Result<Self> {
        let subset = |names: &[&str]| -> Result<Subset> {
            names
                .iter()
                .map(|name| {
                    population
                        .id(name)
                        .ok_or_else(|| HeredityError::UnknownIndividual(name.to_string()))
                })
                .collect::<Result<Vec<_>>>()
                .and_then(Subset::from_ids)
        };
        check_size(population.len())?;
        World::new(
            population,
            subset(one_gene)?,
            subset(two_genes)?,
            subset(has_trait)?,
        )
    }

    pub fn gene_count(&self, id: PersonId) -> GeneCount {
        if self.two_genes.contains(id) {
            GeneCount::Two
        } else if self.one_gene.contains(id) {
            GeneCount::One
        } else {
            GeneCount::Zero
        }
    }

    pub fn has_trait(&self, id: PersonId) -> bool {
        self.has_trait.contains(id)
    }
}

/// Observed traits of a population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evidence {
    observed: Subset,
    present: Subset,
}

impl Evidence {
    pub fn from_population(population: &Population) -> Result<Self> {
        let mut evidence = Evidence::default();
        for (id, individual) in population.iter() {
            if let Some(has_trait) = individual.observed_trait() {
                evidence.observed.insert(id)?;
                if has_trait {
                    evidence.present.insert(id)?;
                }
            }
        }
        Ok(evidence)
    }

    /// Whether a trait assignment agrees with every observation.
    pub fn admits(&self, has_trait: Subset) -> bool {
        (has_trait.0 ^ self.present.0) & self.observed.0 == 0
    }
}

/// Counts gathered while enumerating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationStats {
    /// Trait sets considered, 2^N.
    pub trait_sets: u64,
    /// Trait sets skipped for contradicting evidence.
    pub rejected_trait_sets: u64,
    /// Gene assignments per trait set, 3^N.
    pub gene_assignments: u64,
    /// Worlds handed to the visitor.
    pub worlds: u64,
}

impl EnumerationStats {
    /// Worlds that would be scored with no evidence at all.
    pub fn unfiltered_worlds(&self) -> u64 {
        self.trait_sets * self.gene_assignments
    }
}

/// Calls `visit` once for every world consistent with the observed traits.
///
/// Enumeration order is fixed, so repeated runs visit worlds identically.
pub fn enumerate_worlds<F>(population: &Population, mut visit: F) -> Result<EnumerationStats>
where
    F: FnMut(&World) -> Result<()>,
{
    let everyone = Subset::full(population.len())?;
    let evidence = Evidence::from_population(population)?;
    if population.len() > SLOW_POPULATION {
        warn!(
            individuals = population.len(),
            unobserved = population.len() - evidence.observed.len(),
            "exact enumeration visits 2^unobserved * 3^individuals worlds; this may take a very long time"
        );
    }

    let mut stats = EnumerationStats::default();

    for has_trait in everyone.subsets() {
        stats.trait_sets += 1;
        if !evidence.admits(has_trait) {
            stats.rejected_trait_sets += 1;
            continue;
        }

        let mut gene_assignments = 0;
        for one_gene in everyone.subsets() {
            for two_genes in everyone.difference(one_gene).subsets() {
                let world = World {
                    one_gene,
                    two_genes,
                    has_trait,
                };
                visit(&world)?;
                gene_assignments += 1;
            }
        }
        stats.gene_assignments = gene_assignments;
        stats.worlds += gene_assignments;
    }

    Ok(stats)
}

/// Enumerates without scoring, returning only the counts.
pub fn count_worlds(population: &Population) -> Result<EnumerationStats> {
    enumerate_worlds(population, |_| Ok(()))
}

/// Probability of exactly this world under the model.
///
/// Product over individuals of P(gene count | parents' gene counts) and
/// P(trait | gene count). Founders draw their gene count from the prior.
/// Parent ids always index into `population`; `Population::observe` resolves
/// them before an `Individual` exists.
pub fn joint_probability(
    population: &Population,
    world: &World,
    probabilities: &Probabilities,
) -> Result<f64> {
    check_size(population.len())?;
    let mut joint = 1.0;
    for (id, individual) in population.iter() {
        let count = world.gene_count(id);
        let gene = match individual.parents() {
            None => probabilities.gene_prior(count),
            Some((mother, father)) => {
                let mother = probabilities.passing(world.gene_count(mother));
                let father = probabilities.passing(world.gene_count(father));
                match count {
                    GeneCount::Two => mother * father,
                    GeneCount::One => mother * (1.0 - father) + (1.0 - mother) * father,
                    GeneCount::Zero => (1.0 - mother) * (1.0 - father),
                }
            }
        };
        joint *= gene * probabilities.trait_probability(count, world.has_trait(id));
    }
    Ok(joint)
}

/// Posterior over gene count for one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeneDistribution {
    #[serde(rename = "0")]
    pub zero: f64,
    #[serde(rename = "1")]
    pub one: f64,
    #[serde(rename = "2")]
    pub two: f64,
}

impl GeneDistribution {
    pub fn get(&self, count: GeneCount) -> f64 {
        match count {
            GeneCount::Zero => self.zero,
            GeneCount::One => self.one,
            GeneCount::Two => self.two,
        }
    }

    pub fn total(&self) -> f64 {
        self.zero + self.one + self.two
    }
}

/// Posterior over trait presence for one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraitDistribution {
    #[serde(rename = "true")]
    pub present: f64,
    #[serde(rename = "false")]
    pub absent: f64,
}

impl TraitDistribution {
    pub fn get(&self, has_trait: bool) -> f64 {
        if has_trait {
            self.present
        } else {
            self.absent
        }
    }

    pub fn total(&self) -> f64 {
        self.present + self.absent
    }
}

/// Per-individual gene and trait weights.
///
/// Row `i` of each table belongs to `PersonId(i)`. Gene columns are indexed
/// by `GeneCount::index`; trait column 0 is absent and 1 is present. Weights
/// are unnormalized until `normalize` succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Posteriors {
    names: Vec<String>,
    gene: Array2<f64>,
    trait_: Array2<f64>,
}

impl Posteriors {
    /// Zeroed tables for every member of `population`.
    pub fn new(population: &Population) -> Self {
        let n = population.len();
        Self {
            names: population.names().into_iter().map(String::from).collect(),
            gene: Array2::zeros((n, 3)),
            trait_: Array2::zeros((n, 2)),
        }
    }

    /// Adds `p` to each individual's gene bucket and trait bucket in `world`.
    pub fn update(&mut self, world: &World, p: f64) {
        for i in 0..self.names.len() {
            let id = PersonId(i);
            self.gene[[i, world.gene_count(id).index()]] += p;
            self.trait_[[i, world.has_trait(id) as usize]] += p;
        }
    }

    /// Rescales every distribution to sum to one.
    ///
    /// Fails without touching the tables if any individual has no weight,
    /// which happens only when the evidence has zero probability.
    pub fn normalize(&mut self) -> Result<()> {
        let gene_totals = self.gene.sum_axis(ndarray::Axis(1));
        let trait_totals = self.trait_.sum_axis(ndarray::Axis(1));
        for (i, name) in self.names.iter().enumerate() {
            if !(gene_totals[i] > 0.0 && trait_totals[i] > 0.0) {
                return Err(HeredityError::NoConsistentWorld {
                    individual: name.clone(),
                });
            }
        }

        for (mut row, total) in self.gene.rows_mut().into_iter().zip(gene_totals.iter()) {
            row.mapv_inplace(|x| x / total);
        }
        for (mut row, total) in self.trait_.rows_mut().into_iter().zip(trait_totals.iter()) {
            row.mapv_inplace(|x| x / total);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn gene(&self, id: PersonId) -> GeneDistribution {
        let row = self.gene.row(id.0);
        GeneDistribution {
            zero: row[0],
            one: row[1],
            two: row[2],
        }
    }

    pub fn trait_(&self, id: PersonId) -> TraitDistribution {
        let row = self.trait_.row(id.0);
        TraitDistribution {
            present: row[1],
            absent: row[0],
        }
    }

    /// Raw gene weights, one row per individual.
    pub fn gene_table(&self) -> &Array2<f64> {
        &self.gene
    }

    /// Raw trait weights, one row per individual.
    pub fn trait_table(&self) -> &Array2<f64> {
        &self.trait_
    }

    /// `(name, gene, trait)` for every individual, in population order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, GeneDistribution, TraitDistribution)> {
        self.names
            .iter()
            .enumerate()
            .map(move |(i, name)| (name.as_str(), self.gene(PersonId(i)), self.trait_(PersonId(i))))
    }
}

pub trait Heredity {
    /// Posterior gene and trait distributions for every individual.
    fn infer(&self, probabilities: &Probabilities) -> Result<Posteriors>;
}

impl Heredity for Population {
    fn infer(&self, probabilities: &Probabilities) -> Result<Posteriors> {
        let mut posteriors = Posteriors::new(self);
        let stats = enumerate_worlds(self, |world| {
            let p = joint_probability(self, world, probabilities)?;
            posteriors.update(world, p);
            Ok(())
        })?;
        debug!(
            trait_sets = stats.trait_sets,
            rejected = stats.rejected_trait_sets,
            gene_assignments = stats.gene_assignments,
            "enumeration finished"
        );

        posteriors.normalize()?;
        info!(
            individuals = self.len(),
            worlds = stats.worlds,
            "inference complete"
        );
        Ok(posteriors)
    }
}
