//! Rendering of posterior distributions.
use crate::error::Result;
use crate::genetics::GeneCount;
use crate::inference::{GeneDistribution, Posteriors, TraitDistribution};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_PRECISION: usize = 4;

#[derive(Debug, Serialize)]
struct PersonReport<'a> {
    name: &'a str,
    gene: GeneDistribution,
    #[serde(rename = "trait")]
    trait_: TraitDistribution,
}

/// Plain text, one block per individual, gene counts listed from two down to zero.
///
/// ```text
/// Harry:
///   Gene:
///     2: 0.0092
///     1: 0.4557
///     0: 0.5351
///   Trait:
///     True: 0.2665
///     False: 0.7335
/// ```
pub struct TextReport<'a> {
    posteriors: &'a Posteriors,
    precision: usize,
}

impl<'a> TextReport<'a> {
    pub fn new(posteriors: &'a Posteriors, precision: usize) -> Self {
        Self {
            posteriors,
            precision,
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.precision;
        for (name, gene, trait_) in self.posteriors.iter() {
            writeln!(f, "{}:", name)?;
            writeln!(f, "  Gene:")?;
            for count in GeneCount::ALL.iter().rev() {
                writeln!(
                    f,
                    "    {}: {:.*}",
                    count.copies(),
                    precision,
                    gene.get(*count)
                )?;
            }
            writeln!(f, "  Trait:")?;
            for (label, has_trait) in [("True", true), ("False", false)].iter() {
                writeln!(f, "    {}: {:.*}", label, precision, trait_.get(*has_trait))?;
            }
        }
        Ok(())
    }
}

/// Renders a `TextReport` to a string.
pub fn render_text(posteriors: &Posteriors, precision: usize) -> String {
    TextReport::new(posteriors, precision).to_string()
}

/// A JSON array of `{name, gene, trait}` objects in population order.
pub fn render_json(posteriors: &Posteriors) -> Result<String> {
    let people: Vec<PersonReport> = posteriors
        .iter()
        .map(|(name, gene, trait_)| PersonReport { name, gene, trait_ })
        .collect();
    Ok(serde_json::to_string_pretty(&people)?)
}
