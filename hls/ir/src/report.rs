use crate::ResourceId;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;

/// The result of a synthesis run.
///
/// Serializes to JSON with `null` for unscheduled and unbound operations.
/// [Display](fmt::Display) renders the plain-text form: a line of start
/// cycles, a line of per-resource instance counts, then one line per
/// operation holding `resource instance` or `-1` when it is unbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub schedule: Vec<Option<u32>>,
    pub instances: Vec<u32>,
    pub binding: Vec<Option<(ResourceId, u32)>>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycles = self
            .schedule
            .iter()
            .map(|c| c.map_or(-1, i64::from))
            .join(" ");
        writeln!(f, "{cycles}")?;
        writeln!(f, "{}", self.instances.iter().join(" "))?;
        for bind in &self.binding {
            match bind {
                Some((rtid, inst)) => writeln!(f, "{rtid} {inst}")?,
                None => writeln!(f, "-1")?,
            }
        }
        Ok(())
    }
}
