//! Name-keyed assignments and the solution-file writer.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::{Array1, ArrayView1};

use crate::error::{MppError, Result};
use crate::instance::Instance;

/// A start time for every intervention, in instance intervention order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    entries: Vec<(String, i64)>,
}

impl Assignment {
    /// Builds an assignment from explicit `(name, start)` pairs.
    pub fn new(entries: Vec<(String, i64)>) -> Self {
        Self { entries }
    }

    /// Decodes an engine start-time vector into a name-keyed assignment.
    pub fn from_starts(instance: &Instance, starts: ArrayView1<'_, i64>) -> Self {
        let entries = instance
            .intervention_names()
            .zip(starts.iter())
            .map(|(name, &start)| (name.to_string(), start))
            .collect();
        Self { entries }
    }

    /// Start time of the named intervention, if present.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, start)| start)
    }

    /// Iterates `(name, start)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    /// Re-encodes the assignment as a start-time vector in instance order,
    /// validating coverage and feasible windows.
    pub fn to_starts(&self, instance: &Instance) -> Result<Array1<i64>> {
        let by_name: HashMap<&str, i64> = self
            .entries
            .iter()
            .map(|(n, s)| (n.as_str(), *s))
            .collect();
        let mut starts = Vec::with_capacity(instance.intervention_count());
        for intervention in instance.interventions() {
            let start = *by_name.get(intervention.name()).ok_or_else(|| {
                MppError::MissingIntervention {
                    name: intervention.name().to_string(),
                }
            })?;
            if start < 1 || start as usize > intervention.tmax() {
                return Err(MppError::StartOutOfWindow {
                    name: intervention.name().to_string(),
                    start,
                    tmax: intervention.tmax(),
                });
            }
            starts.push(start);
        }
        Ok(Array1::from(starts))
    }

    /// Writes the solution file: one `<name> <start>` line per intervention.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write = || -> std::io::Result<()> {
            let mut out = BufWriter::new(File::create(path)?);
            for (name, start) in &self.entries {
                writeln!(out, "{name} {start}")?;
            }
            out.flush()
        };
        write().map_err(|source| MppError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
