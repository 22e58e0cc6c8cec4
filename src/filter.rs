//! Filter engine
//!
//! Selections are held per dimension; an empty selection is a wildcard. The
//! engine computes cascading option lists and the conjunctive row mask that
//! yields the filtered view.

use crate::data_utils::string_values;
use crate::dimension::Dimension;
use crate::error::Result;
use crate::loader::SalesTable;
use itertools::Itertools;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Selected values per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    selections: BTreeMap<Dimension, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from URL query pairs such as `YEAR_ID=2004&COUNTRY=USA&COUNTRY=France`.
    /// Repeated keys accumulate and empty values are ignored.
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = Self::new();
        for (key, value) in pairs {
            let dim: Dimension = key.as_ref().parse()?;
            let value = value.as_ref().trim();
            if !value.is_empty() {
                state.add(dim, value);
            }
        }
        Ok(state)
    }

    /// Replace the selection for `dim`. An empty iterator clears it.
    pub fn select<I, S>(&mut self, dim: Dimension, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.selections.remove(&dim);
        } else {
            self.selections.insert(dim, values);
        }
        self
    }

    pub fn add(&mut self, dim: Dimension, value: impl Into<String>) -> &mut Self {
        self.selections.entry(dim).or_default().insert(value.into());
        self
    }

    pub fn clear(&mut self, dim: Dimension) -> &mut Self {
        self.selections.remove(&dim);
        self
    }

    pub fn selected(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.selections.get(&dim)
    }

    pub fn is_active(&self) -> bool {
        !self.selections.is_empty()
    }

    pub fn active_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.selections.keys().copied()
    }

    /// Flatten back into query pairs, column names as keys.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.selections
            .iter()
            .flat_map(|(dim, values)| values.iter().map(move |v| (dim.column().to_string(), v.clone())))
            .collect()
    }
}

/// Options a filter widget may offer, given the other filters' selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub dimension: Dimension,
    pub column: &'static str,
    pub label: &'static str,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

/// Read-only subset of the sales table matching a `FilterState`.
#[derive(Debug, Clone)]
pub struct FilteredView {
    frame: DataFrame,
    total_rows: usize,
}

impl FilteredView {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Row count of the table the view was cut from.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }
}

/// Dimension keys of every row, read once per request.
struct DimensionKeys {
    keys: HashMap<Dimension, Vec<Option<String>>>,
    height: usize,
}

impl DimensionKeys {
    fn read(df: &DataFrame, dims: impl IntoIterator<Item = Dimension>) -> Result<Self> {
        let mut keys = HashMap::new();
        for dim in dims {
            if !keys.contains_key(&dim) {
                keys.insert(dim, string_values(df, dim.column())?);
            }
        }
        Ok(Self { keys, height: df.height() })
    }

    /// AND of every selection except the one on `skip`.
    fn mask(&self, state: &FilterState, skip: Option<Dimension>) -> Vec<bool> {
        let mut mask = vec![true; self.height];
        for (dim, selected) in &state.selections {
            if Some(*dim) == skip {
                continue;
            }
            let Some(values) = self.keys.get(dim) else {
                continue;
            };
            for (keep, value) in mask.iter_mut().zip(values) {
                if *keep {
                    *keep = value.as_ref().is_some_and(|v| selected.contains(v));
                }
            }
        }
        mask
    }
}

pub struct FilterEngine;

impl FilterEngine {
    /// Cascading options: for each dimension in `dims`, the distinct values
    /// found in rows that pass every selection on the other dimensions.
    pub fn allowed_values(
        table: &SalesTable,
        state: &FilterState,
        dims: &[Dimension],
    ) -> Result<Vec<FilterOptions>> {
        let keys = DimensionKeys::read(
            table.frame(),
            dims.iter().copied().chain(state.active_dimensions()),
        )?;

        let mut result = Vec::with_capacity(dims.len());
        for &dim in dims {
            let mask = keys.mask(state, Some(dim));
            let mut options: Vec<String> = keys.keys[&dim]
                .iter()
                .zip(&mask)
                .filter_map(|(value, keep)| if *keep { value.clone() } else { None })
                .unique()
                .collect();
            dim.sort_values(&mut options);

            let mut selected: Vec<String> = state
                .selected(dim)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default();
            dim.sort_values(&mut selected);

            debug!("Filter {} offers {} options", dim, options.len());
            result.push(FilterOptions {
                dimension: dim,
                column: dim.column(),
                label: dim.label(),
                options,
                selected,
            });
        }
        Ok(result)
    }

    /// Apply every active selection as a conjunctive predicate.
    pub fn filter_df(table: &SalesTable, state: &FilterState) -> Result<FilteredView> {
        let df = table.frame();
        if !state.is_active() {
            return Ok(FilteredView {
                frame: df.clone(),
                total_rows: df.height(),
            });
        }

        let keys = DimensionKeys::read(df, state.active_dimensions())?;
        let mask = keys.mask(state, None);
        let mask = BooleanChunked::from_slice("mask", &mask);
        let frame = df.filter(&mask)?;

        debug!(
            "Filtered view keeps {} of {} rows ({})",
            frame.height(),
            df.height(),
            state
                .to_query_pairs()
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .join("&")
        );
        Ok(FilteredView {
            frame,
            total_rows: df.height(),
        })
    }
}
