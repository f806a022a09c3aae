use crate::error::{HeredityError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const SUM_TOLERANCE: f64 = 1e-9;

/// Number of copies of the gene an individual carries.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum GeneCount {
    Zero,
    One,
    Two,
}

impl GeneCount {
    /// All counts, ascending.
    pub const ALL: [GeneCount; 3] = [GeneCount::Zero, GeneCount::One, GeneCount::Two];

    /// Column of this count in a gene distribution table.
    pub fn index(self) -> usize {
        match self {
            GeneCount::Zero => 0,
            GeneCount::One => 1,
            GeneCount::Two => 2,
        }
    }

    pub fn copies(self) -> u8 {
        self.index() as u8
    }
}

/// The conditional probability tables of the heredity network.
///
/// This is an immutable value handed to the scorer, so alternate constants
/// can be tried without touching any global state.
#[derive(Debug, Clone, PartialEq)]
pub struct Probabilities {
    /// Unconditional prior over gene count for founders, indexed by `GeneCount::index`.
    gene: [f64; 3],
    /// P(trait | gene count), indexed by `GeneCount::index`.
    trait_given_gene: [f64; 3],
    /// Chance a copy flips when passed from parent to child, in either direction.
    mutation: f64,
}

impl Default for Probabilities {
    fn default() -> Self {
        Self {
            gene: [0.96, 0.03, 0.01],
            trait_given_gene: [0.01, 0.56, 0.65],
            mutation: 0.01,
        }
    }
}

impl Probabilities {
    /// Builds and validates a model.
    pub fn new(gene: [f64; 3], trait_given_gene: [f64; 3], mutation: f64) -> Result<Self> {
        let probabilities = Self {
            gene,
            trait_given_gene,
            mutation,
        };
        probabilities.validate()?;
        Ok(probabilities)
    }

    /// Loads a model from a TOML file. Fields left out keep their reference values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HeredityError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ModelFile = toml::from_str(&text).map_err(|source| HeredityError::ModelParse {
            path: path.to_path_buf(),
            source,
        })?;
        let probabilities = Self::from(file);
        probabilities.validate()?;
        Ok(probabilities)
    }

    /// Checks that every entry is a probability and that the gene prior sums to one.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("gene.zero", self.gene[0]),
            ("gene.one", self.gene[1]),
            ("gene.two", self.gene[2]),
            ("trait.zero", self.trait_given_gene[0]),
            ("trait.one", self.trait_given_gene[1]),
            ("trait.two", self.trait_given_gene[2]),
            ("mutation", self.mutation),
        ];
        for (field, value) in named.iter() {
            if !value.is_finite() || *value < 0.0 || *value > 1.0 {
                return Err(HeredityError::InvalidModel(format!(
                    "{} = {} is not a probability",
                    field, value
                )));
            }
        }

        let total: f64 = self.gene.iter().sum();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(HeredityError::InvalidModel(format!(
                "gene prior sums to {}, expected 1",
                total
            )));
        }
        Ok(())
    }

    pub fn gene_prior(&self, count: GeneCount) -> f64 {
        self.gene[count.index()]
    }

    /// P(trait = `has_trait` | `count`).
    pub fn trait_probability(&self, count: GeneCount, has_trait: bool) -> f64 {
        let p = self.trait_given_gene[count.index()];
        if has_trait {
            p
        } else {
            1.0 - p
        }
    }

    pub fn mutation(&self) -> f64 {
        self.mutation
    }

    /// Probability that a parent carrying `count` copies hands the gene to a child.
    ///
    /// For one copy the mutation terms cancel: 0.5(1 - m) + 0.5m = 0.5.
    pub fn passing(&self, count: GeneCount) -> f64 {
        match count {
            GeneCount::Two => 1.0 - self.mutation,
            GeneCount::One => 0.5,
            GeneCount::Zero => self.mutation,
        }
    }

    /// Returns a copy with a different mutation rate.
    pub fn with_mutation(&self, mutation: f64) -> Result<Self> {
        Self::new(self.gene, self.trait_given_gene, mutation)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    mutation: Option<f64>,
    #[serde(default)]
    gene: CountTable,
    #[serde(default, rename = "trait")]
    trait_: CountTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CountTable {
    zero: Option<f64>,
    one: Option<f64>,
    two: Option<f64>,
}

impl CountTable {
    fn merge(&self, defaults: [f64; 3]) -> [f64; 3] {
        [
            self.zero.unwrap_or(defaults[0]),
            self.one.unwrap_or(defaults[1]),
            self.two.unwrap_or(defaults[2]),
        ]
    }
}

impl From<ModelFile> for Probabilities {
    fn from(file: ModelFile) -> Self {
        let defaults = Probabilities::default();
        Self {
            gene: file.gene.merge(defaults.gene),
            trait_given_gene: file.trait_.merge(defaults.trait_given_gene),
            mutation: file.mutation.unwrap_or(defaults.mutation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::Write;

    #[test]
    fn test_default_model_is_valid() -> std::result::Result<(), Box<dyn Error>> {
        Probabilities::default().validate()?;
        Ok(())
    }

    #[test]
    fn test_passing_probabilities() {
        let probs = Probabilities::default();
        assert!((probs.passing(GeneCount::Two) - 0.99).abs() < 1e-12);
        assert_eq!(probs.passing(GeneCount::One), 0.5);
        assert!((probs.passing(GeneCount::Zero) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_trait_rows_sum_to_one() {
        let probs = Probabilities::default();
        for count in GeneCount::ALL.iter() {
            let total =
                probs.trait_probability(*count, true) + probs.trait_probability(*count, false);
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_prior_not_summing_to_one() {
        let result = Probabilities::new([0.5, 0.3, 0.1], [0.01, 0.56, 0.65], 0.01);
        assert!(matches!(result, Err(HeredityError::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_out_of_range_mutation() {
        let result = Probabilities::default().with_mutation(1.5);
        assert!(matches!(result, Err(HeredityError::InvalidModel(_))));
        let result = Probabilities::default().with_mutation(f64::NAN);
        assert!(matches!(result, Err(HeredityError::InvalidModel(_))));
    }

    #[test]
    fn test_model_file_overrides_and_defaults() -> std::result::Result<(), Box<dyn Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "mutation = 0.05")?;
        writeln!(file, "[trait]")?;
        writeln!(file, "two = 0.9")?;
        let probs = Probabilities::from_path(file.path())?;
        assert_eq!(probs.mutation(), 0.05);
        assert_eq!(probs.trait_probability(GeneCount::Two, true), 0.9);
        assert_eq!(probs.trait_probability(GeneCount::One, true), 0.56);
        assert_eq!(probs.gene_prior(GeneCount::Zero), 0.96);
        Ok(())
    }

    #[test]
    fn test_model_file_unknown_key_is_rejected() -> std::result::Result<(), Box<dyn Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "mutaton = 0.05")?;
        let result = Probabilities::from_path(file.path());
        assert!(matches!(result, Err(HeredityError::ModelParse { .. })));
        Ok(())
    }
}
