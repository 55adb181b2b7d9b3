use std::{io, path::Path};

use tracing::{debug, warn};

use super::error::ConfigError;
use crate::ast::node::Query;
use crate::compiler::{Weights, compile};
use crate::parser::parse;

/// A query with its measured execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub text: String,
    pub query: Query,
    pub seconds: f64,
}

/// Training samples, parsed once up front.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Builds a dataset from `(query, seconds)` pairs.
    ///
    /// Queries that fail to parse or compile to nothing are logged and skipped.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let samples = pairs
            .into_iter()
            .filter_map(|(text, seconds)| prepare(text.into(), seconds))
            .collect();

        Self { samples }
    }

    /// Reads `query;seconds` records. Lines starting with `#` are ignored.
    ///
    /// Queries are not quoted, so a record with more than two fields keeps
    /// everything before the last `;` as the query.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, ConfigError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(reader);
        let mut pairs = Vec::new();

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let fields = record.iter().collect::<Vec<_>>();

            let Some((seconds, query)) = fields.split_last() else {
                continue;
            };

            if query.is_empty() {
                warn!(line, "Skipping record without a duration");
                continue;
            }

            match seconds.trim().parse::<f64>() {
                Ok(seconds) if seconds.is_finite() => pairs.push((query.join(";"), seconds)),
                _ => warn!(line, seconds = %seconds, "Skipping record with an invalid duration"),
            }
        }

        Ok(Self::from_pairs(pairs))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ConfigError::io(path, e))?;
        let dataset = Self::from_reader(io::BufReader::new(file))?;
        debug!(path = %path.display(), samples = dataset.len(), "Loaded dataset");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn prepare(text: String, seconds: f64) -> Option<Sample> {
    let query = match parse(&text) {
        Ok(query) => query,
        Err(err) => {
            warn!(query = %text, error = %err, "Skipping unparseable query");
            return None;
        }
    };

    // structure does not depend on weight values
    if let Err(err) = compile(&query, &Weights::default()) {
        warn!(query = %text, error = %err, "Skipping query without cost");
        return None;
    }

    Some(Sample {
        text,
        query,
        seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader() {
        let data = r#"# query;seconds
[word="a.*"];2.5
[lemma="x"] within <s/>;0.1
[word="a;b"];1
"#;
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let samples = dataset.iter().collect::<Vec<_>>();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].text, r#"[word="a.*"]"#);
        assert_eq!(samples[0].seconds, 2.5);
        assert_eq!(samples[2].text, r#"[word="a;b"]"#);
        assert_eq!(samples[2].seconds, 1.0);
    }

    #[test]
    fn test_skips_invalid_records() {
        let data = r#"[word="a";1.0
[word="b"];slow
[word=""];3
[word="c"]
[word="d"];0.5
"#;
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.iter().next().unwrap().text, r#"[word="d"]"#);
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        std::fs::write(&path, "\"x\";1.5\n").unwrap();

        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.len(), 1);

        assert!(matches!(
            Dataset::load(dir.path().join("missing.csv")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_from_pairs() {
        let dataset = Dataset::from_pairs([("[]", 1.0), ("[", 2.0)]);
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.is_empty());
    }
}
