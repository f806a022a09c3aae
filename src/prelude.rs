pub use crate::error::{HeredityError, Result};
pub use crate::genetics::{GeneCount, Probabilities};
pub use crate::inference::{
    count_worlds, enumerate_worlds, joint_probability, EnumerationStats, Evidence,
    GeneDistribution, Heredity, Posteriors, Subset, TraitDistribution, World,
};
pub use crate::observable::{Csv, CsvBuilder};
pub use crate::{Individual, Observation, PersonId, Population};
