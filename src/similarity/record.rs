//! Tab-separated comparison records.
//!
//! One record per line: `left<TAB>right[<TAB>similarity]`, terminated by
//! `\r\n` when written. Unscored input lists carry only the pair.

use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    io::{BufRead, Write},
    str::FromStr,
};

use thiserror::Error;

use crate::errors::Result;

/// Key identifying a pair regardless of the order of its members.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnorderedPair<T> {
    low: T,
    high: T,
}

impl<T: Ord> UnorderedPair<T> {
    #[must_use]
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The smaller member.
    pub fn low(&self) -> &T {
        &self.low
    }

    /// The larger member.
    pub fn high(&self) -> &T {
        &self.high
    }

    pub fn contains(&self, value: &T) -> bool {
        &self.low == value || &self.high == value
    }
}

/// One line of a comparison file.
#[derive(Clone, Debug)]
pub struct ComparisonRecord {
    pub left: String,
    pub right: String,
    pub similarity: Option<f64>,
}

impl ComparisonRecord {
    /// An unscored comparison.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            similarity: None,
        }
    }

    #[must_use]
    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Order-insensitive key of the compared pair.
    pub fn pair(&self) -> UnorderedPair<&str> {
        UnorderedPair::new(self.left.as_str(), self.right.as_str())
    }

    /// The record followed by `\r\n`.
    pub fn to_line(&self) -> String {
        format!("{self}\r\n")
    }
}

impl PartialEq for ComparisonRecord {
    fn eq(&self, other: &Self) -> bool {
        self.pair() == other.pair()
    }
}

impl Eq for ComparisonRecord {}

impl Hash for ComparisonRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pair().hash(state);
    }
}

impl Display for ComparisonRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.left, self.right)?;
        if let Some(similarity) = self.similarity {
            // Debug keeps the shortest round-trip form and always a fraction.
            write!(f, "\t{similarity:?}")?;
        }
        Ok(())
    }
}

impl FromStr for ComparisonRecord {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        let (left, right, similarity) = match fields.as_slice() {
            [left, right] => (*left, *right, None),
            [left, right, similarity] => (*left, *right, Some(*similarity)),
            _ => {
                return Err(RecordError::FieldCount {
                    found: fields.len(),
                })
            }
        };
        if left.is_empty() || right.is_empty() {
            return Err(RecordError::EmptyEntity);
        }

        let similarity = similarity
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| RecordError::InvalidSimilarity {
                        value: value.to_string(),
                    })
                    .and_then(|parsed| {
                        if (0.0..=1.0).contains(&parsed) {
                            Ok(parsed)
                        } else {
                            Err(RecordError::OutOfRange {
                                value: value.to_string(),
                            })
                        }
                    })
            })
            .transpose()?;

        Ok(Self {
            left: left.to_string(),
            right: right.to_string(),
            similarity,
        })
    }
}

/// Errors raised when parsing a comparison record.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 2 or 3 tab-separated fields, found {found}")]
    FieldCount { found: usize },
    #[error("record has an empty entity field")]
    EmptyEntity,
    #[error("invalid similarity value `{value}`")]
    InvalidSimilarity { value: String },
    #[error("similarity `{value}` is outside [0, 1]")]
    OutOfRange { value: String },
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<RecordError>,
    },
}

/// Parses every non-blank line of `reader`.
///
/// # Errors
/// Returns [`crate::Error::Io`] on read failures and [`crate::Error::Record`]
/// with the 1-based line number on malformed lines.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<ComparisonRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = line
            .parse::<ComparisonRecord>()
            .map_err(|source| RecordError::Line {
                line: index + 1,
                source: Box::new(source),
            })?;
        records.push(record);
    }
    Ok(records)
}

/// Writes each record as one `\r\n` terminated line.
///
/// # Errors
/// Returns [`crate::Error::Io`] when writing fails.
pub fn write_records<W: Write>(mut writer: W, records: &[ComparisonRecord]) -> Result<()> {
    for record in records {
        writer.write_all(record.to_line().as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
