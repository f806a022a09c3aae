use crate::error::{HeredityError, Result};
use crate::Observation;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Copy)]
struct Columns {
    name: usize,
    mother: usize,
    father: usize,
    trait_: usize,
}

/// Produces Observations from delimited pedigree data
///
/// `Csv` implements Iterator so it can be passed
/// directly to `Population::observe()`
pub struct Csv {
    records: csv::StringRecordsIntoIter<Box<dyn Read>>,
    columns: Columns,
}

impl Csv {
    fn new(records: csv::StringRecordsIntoIter<Box<dyn Read>>, columns: Columns) -> Self {
        Self { records, columns }
    }

    fn to_observation(&self, row: &csv::StringRecord) -> Result<Observation> {
        let field = |i: usize| row.get(i).unwrap_or("");
        let optional = |i: usize| match field(i) {
            "" => None,
            s => Some(s.to_string()),
        };

        let name = field(self.columns.name).to_string();
        let trait_ = match field(self.columns.trait_) {
            "1" => Some(true),
            "0" => Some(false),
            "" => None,
            other => {
                return Err(HeredityError::InvalidTrait {
                    name,
                    value: other.to_string(),
                })
            }
        };

        Ok(Observation {
            mother: optional(self.columns.mother),
            father: optional(self.columns.father),
            name,
            trait_,
        })
    }
}

impl Iterator for Csv {
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Result<Observation>> {
        match self.records.next()? {
            Ok(row) => Some(self.to_observation(&row)),
            Err(e) => Some(Err(e.into())),
        }
    }
}

pub struct CsvBuilder {
    delimiter: u8,
    name_field: String,
    mother_field: String,
    father_field: String,
    trait_field: String,
}

impl Default for CsvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvBuilder {
    /// Construct a new Csv builder
    ///
    /// Defaults to comma delimited data with the columns
    /// `name`, `mother`, `father` and `trait`.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            name_field: "name".to_owned(),
            mother_field: "mother".to_owned(),
            father_field: "father".to_owned(),
            trait_field: "trait".to_owned(),
        }
    }

    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    pub fn name_field(&mut self, name_field: &str) -> &mut Self {
        self.name_field = name_field.to_owned();
        self
    }

    pub fn mother_field(&mut self, mother_field: &str) -> &mut Self {
        self.mother_field = mother_field.to_owned();
        self
    }

    pub fn father_field(&mut self, father_field: &str) -> &mut Self {
        self.father_field = father_field.to_owned();
        self
    }

    pub fn trait_field(&mut self, trait_field: &str) -> &mut Self {
        self.trait_field = trait_field.to_owned();
        self
    }

    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<Csv> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| HeredityError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.from_reader(Box::new(file))
    }

    pub fn from_reader(&self, reader: Box<dyn Read>) -> Result<Csv> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |field: &str| {
            headers
                .iter()
                .position(|h| h == field)
                .ok_or_else(|| HeredityError::MissingColumn(field.to_owned()))
        };
        let columns = Columns {
            name: column(&self.name_field)?,
            mother: column(&self.mother_field)?,
            father: column(&self.father_field)?,
            trait_: column(&self.trait_field)?,
        };

        Ok(Csv::new(rdr.into_records(), columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use std::error::Error;

    const FAMILY: &str = "name,mother,father,trait\nHarry,Lily,James,\nJames,,,1\nLily,,,0\n";

    #[test]
    fn test_csv_reads_parents_and_traits() -> std::result::Result<(), Box<dyn Error>> {
        let observations = CsvBuilder::new()
            .from_reader(Box::new(FAMILY.as_bytes()))?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(
            observations,
            vec![
                Observation::child("Harry", "Lily", "James", None),
                Observation::founder("James", Some(true)),
                Observation::founder("Lily", Some(false)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_csv_columns_in_any_order() -> std::result::Result<(), Box<dyn Error>> {
        let data = "trait;father;name;mother;notes\n1;;James;;x\n ; James ; Harry ; Lily ;\n0;;Lily;;\n";
        let mut population = Population::new();
        population.observe(
            CsvBuilder::new()
                .delimiter(b';')
                .from_reader(Box::new(data.as_bytes()))?,
        )?;
        assert_eq!(population.names(), vec!["James", "Harry", "Lily"]);
        let harry = population.id("Harry").and_then(|id| population.get(id));
        assert_eq!(harry.and_then(|h| h.father()), population.id("James"));
        assert_eq!(harry.and_then(|h| h.observed_trait()), None);
        Ok(())
    }

    #[test]
    fn test_csv_missing_column() {
        let result = CsvBuilder::new().from_reader(Box::new("name,mother,father\n".as_bytes()));
        assert!(matches!(result, Err(HeredityError::MissingColumn(c)) if c == "trait"));
    }

    #[test]
    fn test_csv_custom_column_names() -> std::result::Result<(), Box<dyn Error>> {
        let data = "id,mum,dad,affected\nA,,,1\n";
        let observations = CsvBuilder::new()
            .name_field("id")
            .mother_field("mum")
            .father_field("dad")
            .trait_field("affected")
            .from_reader(Box::new(data.as_bytes()))?
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(observations, vec![Observation::founder("A", Some(true))]);
        Ok(())
    }

    #[test]
    fn test_csv_invalid_trait() -> std::result::Result<(), Box<dyn Error>> {
        let data = "name,mother,father,trait\nJames,,,yes\n";
        let mut population = Population::new();
        let result = population.observe(CsvBuilder::new().from_reader(Box::new(data.as_bytes()))?);
        assert!(matches!(
            result,
            Err(HeredityError::InvalidTrait { value, .. }) if value == "yes"
        ));
        Ok(())
    }
}
