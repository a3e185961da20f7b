//! Append-only record of every evaluated candidate.
//!
//! [`History`] is a cheap, cloneable handle around
//! `Arc<RwLock<Vec<HistoryEntry>>>`. The engine appends one whole
//! generation at a time, after all of that generation's evaluations have
//! finished; entries are never removed or modified.
//!
//! Candidates whose objectives are not finite are kept with
//! [`CandidateStatus::Excluded`] so they remain auditable even though they
//! never take part in ranking or in the Pareto front.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::parameter::PARAM_NAMES;
use crate::types::{Candidate, CandidateStatus, Objectives};

/// One evaluated candidate and where it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    /// Generation that produced the candidate (0-based).
    pub generation: usize,
    /// Position within its generation.
    pub index: usize,
    /// The evaluated candidate.
    pub candidate: Candidate,
    /// Whether the candidate was eligible for ranking.
    pub status: CandidateStatus,
}

/// Flat export row: parameters, objectives, and provenance.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryRecord {
    /// Scale factor for monomer fraction 1.
    pub s1: f64,
    /// Scale factor for monomer fraction 2.
    pub s2: f64,
    /// Scale factor for monomer fraction 3.
    pub s3: f64,
    /// Chain-length scale factor.
    pub c_scale: f64,
    /// Stiffness bias.
    pub sb: f64,
    /// Combined percent error (a string such as `"NaN"` in JSON when
    /// non-finite).
    #[cfg_attr(feature = "serde", serde(with = "non_finite_f64"))]
    pub error: f64,
    /// Runtime cost proxy (a string such as `"inf"` in JSON when
    /// non-finite).
    #[cfg_attr(feature = "serde", serde(with = "non_finite_f64"))]
    pub runtime_cost: f64,
    /// Generation index.
    pub generation: usize,
    /// Position within the generation.
    pub index: usize,
    /// Ranking status.
    pub status: CandidateStatus,
}

impl From<&HistoryEntry> for HistoryRecord {
    fn from(entry: &HistoryEntry) -> Self {
        let v = entry.candidate.vector;
        let o = entry.candidate.objectives;
        Self {
            s1: v.s1,
            s2: v.s2,
            s3: v.s3,
            c_scale: v.c_scale,
            sb: v.sb,
            error: o.error,
            runtime_cost: o.runtime_cost,
            generation: entry.generation,
            index: entry.index,
            status: entry.status,
        }
    }
}

impl From<&HistoryRecord> for HistoryEntry {
    fn from(record: &HistoryRecord) -> Self {
        let vector = crate::parameter::CalibrationVector::new(
            record.s1,
            record.s2,
            record.s3,
            record.c_scale,
            record.sb,
        );
        let objectives = Objectives::new(record.error, record.runtime_cost);
        Self {
            generation: record.generation,
            index: record.index,
            candidate: Candidate::new(vector, objectives),
            status: record.status,
        }
    }
}

/// Shared, append-only history of a search run.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Appends one generation under a single write lock.
    ///
    /// Returns the number of excluded (non-finite) candidates.
    pub(crate) fn append_generation(&self, generation: usize, candidates: &[Candidate]) -> usize {
        let mut excluded = 0;
        let mut entries = self.entries.write();
        entries.reserve(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let status = if candidate.is_finite() {
                CandidateStatus::Ranked
            } else {
                excluded += 1;
                CandidateStatus::Excluded
            };
            entries.push(HistoryEntry {
                generation,
                index,
                candidate: *candidate,
                status,
            });
        }
        excluded
    }

    /// Number of recorded candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of recorded generations.
    #[must_use]
    pub fn n_generations(&self) -> usize {
        self.entries.read().last().map_or(0, |e| e.generation + 1)
    }

    /// All entries in evaluation order.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    /// Entries of one generation.
    #[must_use]
    pub fn generation(&self, generation: usize) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.generation == generation)
            .copied()
            .collect()
    }

    /// Entries that took part in ranking.
    #[must_use]
    pub fn ranked(&self) -> Vec<HistoryEntry> {
        self.with_status(CandidateStatus::Ranked)
    }

    /// Entries excluded because of non-finite objectives.
    #[must_use]
    pub fn excluded(&self) -> Vec<HistoryEntry> {
        self.with_status(CandidateStatus::Excluded)
    }

    fn with_status(&self, status: CandidateStatus) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.status == status)
            .copied()
            .collect()
    }

    /// Non-dominated entries over the whole history.
    ///
    /// Excluded entries never appear. Returned in evaluation order.
    #[must_use]
    pub fn pareto_front(&self) -> Vec<HistoryEntry> {
        let ranked = self.ranked();
        let objectives: Vec<Objectives> = ranked.iter().map(|e| e.candidate.objectives).collect();
        let mut front = crate::pareto::pareto_front_indices(&objectives);
        front.sort_unstable();
        front.into_iter().map(|i| ranked[i]).collect()
    }

    /// Flat export rows in evaluation order.
    #[must_use]
    pub fn to_records(&self) -> Vec<HistoryRecord> {
        self.entries.read().iter().map(HistoryRecord::from).collect()
    }

    /// Write every entry to a writer in CSV format.
    ///
    /// Columns: the five parameters, `error`, `runtime_cost`,
    /// `generation`, `index`, `status`. Non-finite objectives are written
    /// as `NaN` / `inf`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use cg_calibrate::History;
    ///
    /// let history = History::new();
    /// let mut buf = Vec::new();
    /// history.to_csv(&mut buf).unwrap();
    /// assert_eq!(
    ///     String::from_utf8(buf).unwrap(),
    ///     "s1,s2,s3,c_scale,sb,error,runtime_cost,generation,index,status\n"
    /// );
    /// ```
    pub fn to_csv(&self, mut writer: impl std::io::Write) -> std::io::Result<()> {
        writeln!(
            writer,
            "{},error,runtime_cost,generation,index,status",
            PARAM_NAMES.join(",")
        )?;
        for r in &self.to_records() {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{}",
                r.s1,
                r.s2,
                r.s3,
                r.c_scale,
                r.sb,
                r.error,
                r.runtime_cost,
                r.generation,
                r.index,
                r.status
            )?;
        }
        writer.flush()
    }

    /// Export every entry to a CSV file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_csv(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv(std::io::BufWriter::new(file))
    }
}

/// A serializable snapshot of a history.
///
/// # Schema versioning
///
/// The `version` field enables future schema evolution. The current
/// version is `1`.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HistorySnapshot {
    /// Schema version.
    pub version: u32,
    /// Every entry as a flat record.
    pub records: Vec<HistoryRecord>,
}

#[cfg(feature = "serde")]
impl History {
    /// Save the history to a JSON file.
    ///
    /// Non-finite objective values are stored as the strings `"NaN"`,
    /// `"inf"` or `"-inf"` and read back unchanged.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        let snapshot = HistorySnapshot {
            version: 1,
            records: self.to_records(),
        };
        // Write next to the target, then rename over it.
        let parent = path.parent().unwrap_or(std::path::Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        let file = std::fs::File::create(&tmp_path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &snapshot)
            .map_err(std::io::Error::other)?;
        std::fs::rename(&tmp_path, path)
    }

    /// Load a history from a JSON file written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let snapshot: HistorySnapshot = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::with_entries(
            snapshot.records.iter().map(HistoryEntry::from).collect(),
        ))
    }
}

/// Finite values as JSON numbers; `NaN`, `inf` and `-inf` as strings.
/// `null` is read back as `NaN`.
#[cfg(feature = "serde")]
mod non_finite_f64 {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&value.to_string())
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(f64::NAN),
            Some(Repr::Number(value)) => Ok(value),
            Some(Repr::Text(text)) => text
                .parse::<f64>()
                .ok()
                .filter(|v| !v.is_finite())
                .ok_or_else(|| D::Error::custom(format!("invalid non-finite value '{text}'"))),
        }
    }
}
