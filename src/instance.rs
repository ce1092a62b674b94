//! The parsed, normalized problem instance.
//!
//! The instance document is JSON whose numeric fields may arrive either as
//! numbers or as stringified numbers, and whose risk/workload functions are
//! nested maps keyed by stringified periods. Loading coerces everything to
//! its numeric type once and densifies the sparse maps into per-`(i, ts)`
//! flat arrays indexed by the offset `t - ts`, so the evaluator never hashes
//! on the hot path. After construction the model is immutable and can be
//! shared across worker threads by reference.
//!
//! Interventions, resources, seasons and exclusions keep their document
//! order; together with a fixed seed this makes the whole search
//! reproducible.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{MppError, Result};

/// A per-period renewable resource with real-valued usage bounds.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Resource name as it appears in the instance.
    pub name: String,
    /// Per-period lower bound, length `T`.
    pub min: Vec<f64>,
    /// Per-period upper bound, length `T`.
    pub max: Vec<f64>,
}

/// A named subset of periods during which exclusions apply.
#[derive(Debug, Clone)]
pub struct Season {
    /// Season name as it appears in the instance.
    pub name: String,
    /// Member periods, 1-indexed, in document order.
    pub periods: Vec<usize>,
}

/// A pairwise temporal forbiddance over a season.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion {
    /// Index of the first intervention.
    pub first: usize,
    /// Index of the second intervention.
    pub second: usize,
    /// Index into [`Instance::seasons`].
    pub season: usize,
}

/// Workload of one intervention on one resource, densified per start time.
#[derive(Debug, Clone)]
pub(crate) struct ResourceLoad {
    /// Index into [`Instance::resources`].
    pub(crate) resource: usize,
    /// `amounts[ts - 1][t - ts]` is the load at period `t` when started at
    /// `ts`; zero where the document has no entry.
    pub(crate) amounts: Vec<Vec<f64>>,
}

/// A maintenance intervention with a start-dependent duration, risk profile
/// and resource footprint.
#[derive(Debug, Clone)]
pub struct Intervention {
    pub(crate) name: String,
    pub(crate) tmax: usize,
    /// Realized duration per allowed start, length `tmax`.
    pub(crate) delta: Vec<usize>,
    /// `risk[ts - 1][t - ts]` holds the per-scenario contributions at period
    /// `t` when started at `ts`; an empty inner vector means no listed
    /// scenarios (all zero).
    pub(crate) risk: Vec<Vec<Vec<f64>>>,
    pub(crate) workload: Vec<ResourceLoad>,
}

impl Intervention {
    /// Name of the intervention.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest allowed start time.
    pub fn tmax(&self) -> usize {
        self.tmax
    }
}

/// The immutable maintenance-planning instance.
#[derive(Debug, Clone)]
pub struct Instance {
    horizon: usize,
    quantile: f64,
    alpha: f64,
    scenarios: Vec<usize>,
    resources: Vec<Resource>,
    seasons: Vec<Season>,
    interventions: Vec<Intervention>,
    exclusions: Vec<Exclusion>,
    intervention_index: HashMap<String, usize>,
}

impl Instance {
    /// Loads and normalizes an instance from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MppError::InstanceRead {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value =
            serde_json::from_str(&text).map_err(|source| MppError::InstanceParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_document(&document)
    }

    /// Builds an instance from an already-parsed JSON document.
    pub fn from_document(document: &Value) -> Result<Self> {
        let horizon = coerce_usize(require(document, "T")?, "T")?;
        let quantile = coerce_f64(require(document, "Quantile")?, "Quantile")?;
        let alpha = coerce_f64(require(document, "Alpha")?, "Alpha")?;

        let scenarios = number_vec(require(document, "Scenarios_number")?, "Scenarios_number")?;
        if scenarios.len() != horizon {
            return Err(schema(format!(
                "Scenarios_number has {} entries, expected T = {horizon}",
                scenarios.len()
            )));
        }

        let mut resources = Vec::new();
        let mut resource_index = HashMap::new();
        for (name, data) in object(require(document, "Resources")?, "Resources")? {
            let min = bound_vec(require(data, "min")?, horizon, &format!("Resources.{name}.min"))?;
            let max = bound_vec(require(data, "max")?, horizon, &format!("Resources.{name}.max"))?;
            resource_index.insert(name.clone(), resources.len());
            resources.push(Resource {
                name: name.clone(),
                min,
                max,
            });
        }

        let mut seasons = Vec::new();
        let mut season_index = HashMap::new();
        if let Some(seasons_doc) = document.get("Seasons") {
            for (name, periods_doc) in object(seasons_doc, "Seasons")? {
                let field = format!("Seasons.{name}");
                let periods = array(periods_doc, &field)?
                    .iter()
                    .map(|v| coerce_usize(v, &field))
                    .collect::<Result<Vec<_>>>()?;
                season_index.insert(name.clone(), seasons.len());
                seasons.push(Season {
                    name: name.clone(),
                    periods,
                });
            }
        }

        let mut interventions = Vec::new();
        let mut intervention_index = HashMap::new();
        for (name, data) in object(require(document, "Interventions")?, "Interventions")? {
            let intervention = load_intervention(
                name,
                data,
                horizon,
                &scenarios,
                &resource_index,
            )?;
            intervention_index.insert(name.clone(), interventions.len());
            interventions.push(intervention);
        }

        let mut exclusions = Vec::new();
        if let Some(exclusions_doc) = document.get("Exclusions") {
            for (name, data) in object(exclusions_doc, "Exclusions")? {
                let field = format!("Exclusions.{name}");
                let entries = array(data, &field)?;
                if entries.len() != 3 {
                    return Err(schema(format!(
                        "{field} has {} entries, expected [A, B, season]",
                        entries.len()
                    )));
                }
                let first = lookup(&intervention_index, string(&entries[0], &field)?, &field)?;
                let second = lookup(&intervention_index, string(&entries[1], &field)?, &field)?;
                let season = lookup(&season_index, string(&entries[2], &field)?, &field)?;
                exclusions.push(Exclusion {
                    first,
                    second,
                    season,
                });
            }
        }

        Ok(Self {
            horizon,
            quantile,
            alpha,
            scenarios,
            resources,
            seasons,
            interventions,
            exclusions,
            intervention_index,
        })
    }

    /// Horizon length `T`.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Risk quantile `q`.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Risk-blend weight `alpha`.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of scenarios at period `t` (1-indexed).
    pub fn scenario_count(&self, t: usize) -> usize {
        self.scenarios[t - 1]
    }

    /// Per-period scenario counts, indexed by `t - 1`.
    pub(crate) fn scenario_counts(&self) -> &[usize] {
        &self.scenarios
    }

    /// Interventions in document order.
    pub fn interventions(&self) -> &[Intervention] {
        &self.interventions
    }

    /// Number of interventions.
    pub fn intervention_count(&self) -> usize {
        self.interventions.len()
    }

    /// Intervention names in document order.
    pub fn intervention_names(&self) -> impl Iterator<Item = &str> {
        self.interventions.iter().map(|i| i.name.as_str())
    }

    /// Index of the named intervention, if present.
    pub fn intervention_index(&self, name: &str) -> Option<usize> {
        self.intervention_index.get(name).copied()
    }

    /// Latest allowed start of intervention `i`.
    pub fn tmax(&self, i: usize) -> usize {
        self.interventions[i].tmax
    }

    /// Realized duration of intervention `i` when started at `ts` (1-indexed).
    pub fn delta(&self, i: usize, ts: usize) -> usize {
        self.interventions[i].delta[ts - 1]
    }

    /// Per-scenario risk contributions of intervention `i` at period `t`
    /// when started at `ts`; empty outside the active window.
    pub fn risk(&self, i: usize, t: usize, ts: usize) -> &[f64] {
        let intervention = &self.interventions[i];
        if ts >= 1 && ts <= intervention.tmax && t >= ts {
            let per_start = &intervention.risk[ts - 1];
            if t - ts < per_start.len() {
                return &per_start[t - ts];
            }
        }
        &[]
    }

    /// Workload of intervention `i` on `resource` at period `t` when started
    /// at `ts`, if the pair lies in the active window.
    pub fn workload(&self, i: usize, resource: &str, t: usize, ts: usize) -> Option<f64> {
        let intervention = &self.interventions[i];
        let load = intervention
            .workload
            .iter()
            .find(|l| self.resources[l.resource].name == resource)?;
        if ts >= 1 && ts <= intervention.tmax && t >= ts {
            let per_start = &load.amounts[ts - 1];
            if t - ts < per_start.len() {
                return Some(per_start[t - ts]);
            }
        }
        None
    }

    /// Resources in document order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// `(min, max)` bounds of `resource` at period `t` (1-indexed).
    pub fn resource_bounds(&self, resource: &str, t: usize) -> Option<(f64, f64)> {
        let r = self.resources.iter().find(|r| r.name == resource)?;
        Some((r.min[t - 1], r.max[t - 1]))
    }

    /// Seasons in document order.
    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Member periods of the named season.
    pub fn season_periods(&self, name: &str) -> Option<&[usize]> {
        self.seasons
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.periods.as_slice())
    }

    /// Exclusions in document order.
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }
}

fn load_intervention(
    name: &str,
    data: &Value,
    horizon: usize,
    scenarios: &[usize],
    resource_index: &HashMap<String, usize>,
) -> Result<Intervention> {
    let context = format!("Interventions.{name}");
    let tmax = coerce_usize(require(data, "tmax")?, &format!("{context}.tmax"))?;
    if tmax == 0 {
        return Err(schema(format!("{context}.tmax must be at least 1")));
    }

    let delta_field = format!("{context}.Delta");
    let delta = number_vec(require(data, "Delta")?, &delta_field)?;
    if delta.len() != tmax {
        return Err(schema(format!(
            "{delta_field} has {} entries, expected tmax = {tmax}",
            delta.len()
        )));
    }
    for (ts, &d) in delta.iter().enumerate() {
        if ts + d > horizon {
            return Err(schema(format!(
                "{context} started at {} runs past the horizon ({} + {d} - 1 > {horizon})",
                ts + 1,
                ts + 1
            )));
        }
    }

    // Densify risk into per-start flat arrays; entries outside the active
    // window can never be read by the evaluator and are dropped here.
    let mut risk: Vec<Vec<Vec<f64>>> = delta.iter().map(|&d| vec![Vec::new(); d]).collect();
    if let Some(risk_doc) = data.get("risk") {
        for (t_key, by_start) in object(risk_doc, &format!("{context}.risk"))? {
            let t = period_key(t_key, &format!("{context}.risk"))?;
            for (ts_key, values) in object(by_start, &format!("{context}.risk.{t_key}"))? {
                let ts = period_key(ts_key, &format!("{context}.risk.{t_key}"))?;
                if ts < 1 || ts > tmax || t < ts || t - ts >= delta[ts - 1] {
                    continue;
                }
                let field = format!("{context}.risk.{t_key}.{ts_key}");
                let contributions = array(values, &field)?
                    .iter()
                    .map(|v| coerce_f64(v, &field))
                    .collect::<Result<Vec<_>>>()?;
                if contributions.len() > scenarios[t - 1] {
                    return Err(schema(format!(
                        "{field} lists {} scenarios, expected at most S[{t}] = {}",
                        contributions.len(),
                        scenarios[t - 1]
                    )));
                }
                risk[ts - 1][t - ts] = contributions;
            }
        }
    }

    let mut workload = Vec::new();
    if let Some(workload_doc) = data.get("workload") {
        for (resource_name, by_period) in object(workload_doc, &format!("{context}.workload"))? {
            let field = format!("{context}.workload.{resource_name}");
            let resource = lookup(resource_index, resource_name, &field)?;
            let mut amounts: Vec<Vec<f64>> = delta.iter().map(|&d| vec![0.0; d]).collect();
            for (t_key, by_start) in object(by_period, &field)? {
                let t = period_key(t_key, &field)?;
                for (ts_key, value) in object(by_start, &format!("{field}.{t_key}"))? {
                    let ts = period_key(ts_key, &format!("{field}.{t_key}"))?;
                    if ts < 1 || ts > tmax || t < ts || t - ts >= delta[ts - 1] {
                        continue;
                    }
                    amounts[ts - 1][t - ts] =
                        coerce_f64(value, &format!("{field}.{t_key}.{ts_key}"))?;
                }
            }
            workload.push(ResourceLoad { resource, amounts });
        }
    }

    Ok(Intervention {
        name: name.to_string(),
        tmax,
        delta,
        risk,
        workload,
    })
}

fn schema(detail: String) -> MppError {
    MppError::Schema { detail }
}

fn require<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| schema(format!("missing key `{key}`")))
}

fn object<'a>(value: &'a Value, field: &str) -> Result<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| schema(format!("`{field}` is not an object")))
}

fn array<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| schema(format!("`{field}` is not an array")))
}

fn string<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| schema(format!("`{field}` is not a string")))
}

fn lookup(index: &HashMap<String, usize>, name: &str, field: &str) -> Result<usize> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| schema(format!("`{field}` references unknown name `{name}`")))
}

/// Coerces a JSON number or stringified number to `f64`.
fn coerce_f64(value: &Value, field: &str) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| schema(format!("`{field}` is not a finite number"))),
        Value::String(s) => s.trim().parse().map_err(|_| MppError::Normalization {
            field: field.to_string(),
            value: s.clone(),
        }),
        _ => Err(schema(format!("`{field}` is neither number nor string"))),
    }
}

/// Coerces a JSON integer or stringified integer to `usize`.
fn coerce_usize(value: &Value, field: &str) -> Result<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| schema(format!("`{field}` is not a non-negative integer"))),
        Value::String(s) => s.trim().parse().map_err(|_| MppError::Normalization {
            field: field.to_string(),
            value: s.clone(),
        }),
        _ => Err(schema(format!("`{field}` is neither number nor string"))),
    }
}

fn period_key(key: &str, field: &str) -> Result<usize> {
    key.trim()
        .parse()
        .map_err(|_| schema(format!("`{field}` has non-integer period key `{key}`")))
}

fn number_vec(value: &Value, field: &str) -> Result<Vec<usize>> {
    array(value, field)?
        .iter()
        .map(|v| coerce_usize(v, field))
        .collect()
}

fn bound_vec(value: &Value, horizon: usize, field: &str) -> Result<Vec<f64>> {
    let bounds = array(value, field)?
        .iter()
        .map(|v| coerce_f64(v, field))
        .collect::<Result<Vec<_>>>()?;
    if bounds.len() != horizon {
        return Err(schema(format!(
            "`{field}` has {} entries, expected T = {horizon}",
            bounds.len()
        )));
    }
    Ok(bounds)
}
