//! Return modes and the per-run return provider
//!
//! A `ReturnConfig` describes where yearly returns come from: a fixed rate,
//! a seeded normal distribution, a recorded historical index series, or a
//! black-swan override layered on top of another mode. The `ReturnProvider`
//! resolves a config into the concrete rate sequence for one simulation run,
//! advancing the RNG exactly once per simulated year so seeded runs are
//! bit-reproducible.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::error::ReturnError;

/// A recorded annual-return series for a market index.
///
/// Supplied as static external input; `data[i]` is the return for calendar
/// year `start_year + i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalIndex {
    pub id: String,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub currency: String,
    pub data: Vec<f64>,
}

impl HistoricalIndex {
    /// Recorded return for a calendar year, if inside the series span.
    #[must_use]
    pub fn return_for(&self, year: i32) -> Option<f64> {
        if year < self.start_year {
            return None;
        }
        self.data.get((year - self.start_year) as usize).copied()
    }

    /// Arithmetic long-run average, used as the documented fallback for
    /// years outside the recorded span.
    #[must_use]
    pub fn long_run_average(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.data.iter().sum::<f64>() / self.data.len() as f64
        }
    }

    // DAX total return index, yearly changes.
    // Source: Deutsche Börse / boerse.frankfurt.de yearly closes, 2000-2023.
    #[must_use]
    pub fn dax() -> Self {
        Self {
            id: "dax".to_string(),
            name: "DAX (Total Return)".to_string(),
            start_year: 2000,
            end_year: 2023,
            currency: "EUR".to_string(),
            data: vec![
                -0.0754, -0.1979, -0.4394, 0.3708, 0.0734, 0.2707, 0.2198, 0.2229, -0.4037,
                0.2385, 0.1611, -0.1469, 0.2922, 0.2548, 0.0265, 0.0956, 0.0687, 0.1251,
                -0.1818, 0.2544, 0.0355, 0.1588, -0.1224, 0.2030,
            ],
        }
    }

    // S&P 500 total return, yearly.
    // Source: Robert Shiller, Yale University; slbuchalter S&P data, 1990-2023.
    #[must_use]
    pub fn sp500() -> Self {
        Self {
            id: "sp500".to_string(),
            name: "S&P 500 (Total Return)".to_string(),
            start_year: 1990,
            end_year: 2023,
            currency: "USD".to_string(),
            data: vec![
                -0.0310, 0.3047, 0.0762, 0.1008, 0.0132, 0.3758, 0.2296, 0.3336, 0.2858,
                0.2104, -0.0910, -0.1189, -0.2210, 0.2868, 0.1088, 0.0491, 0.1579, 0.0549,
                -0.3700, 0.2646, 0.1506, 0.0211, 0.1600, 0.3239, 0.1369, 0.0138, 0.1196,
                0.2183, -0.0438, 0.3149, 0.1840, 0.2871, -0.1811, 0.2629,
            ],
        }
    }

    // MSCI World net total return in EUR, yearly.
    // Source: MSCI end-of-year index factsheets, 2000-2023.
    #[must_use]
    pub fn msci_world() -> Self {
        Self {
            id: "msci_world".to_string(),
            name: "MSCI World (Net, EUR)".to_string(),
            start_year: 2000,
            end_year: 2023,
            currency: "EUR".to_string(),
            data: vec![
                -0.0704, -0.1183, -0.3218, 0.1023, 0.0648, 0.2617, 0.0755, -0.0165, -0.3775,
                0.2584, 0.1972, -0.0244, 0.1404, 0.2103, 0.1947, 0.1045, 0.1045, 0.0751,
                -0.0408, 0.3010, 0.0623, 0.3114, -0.1295, 0.1960,
            ],
        }
    }
}

/// A predefined crisis return override applied for a bounded window.
///
/// `yearly_returns` is keyed by zero-based offset from the configured event
/// start year; offsets without an entry fall through to the base mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackSwanEvent {
    pub id: String,
    pub name: String,
    /// Window length in years; offsets in `[0, duration)` are eligible for
    /// overrides.
    pub duration: usize,
    pub yearly_returns: BTreeMap<usize, f64>,
    /// Historically observed years until the pre-crisis level was regained.
    #[serde(default)]
    pub recovery_years: Option<u32>,
}

impl BlackSwanEvent {
    /// Override for a zero-based offset inside the event window.
    #[must_use]
    pub fn override_for(&self, offset: usize) -> Option<f64> {
        if offset < self.duration {
            self.yearly_returns.get(&offset).copied()
        } else {
            None
        }
    }

    /// Cumulative impact of the full event window, `Π(1+rᵢ) − 1`.
    ///
    /// Reporting only; the simulation always applies the yearly overrides.
    #[must_use]
    pub fn cumulative_impact(&self) -> f64 {
        self.yearly_returns
            .values()
            .map(|r| 1.0 + r)
            .product::<f64>()
            - 1.0
    }

    // Dotcom crash, 2000-2002 (MSCI World EUR yearly returns).
    #[must_use]
    pub fn dotcom_crash() -> Self {
        Self {
            id: "dotcom".to_string(),
            name: "Dotcom Crash (2000-2002)".to_string(),
            duration: 3,
            yearly_returns: BTreeMap::from([(0, -0.0704), (1, -0.1183), (2, -0.3218)]),
            recovery_years: Some(13),
        }
    }

    // Global financial crisis, 2008 drawdown plus 2009 rebound.
    #[must_use]
    pub fn financial_crisis_2008() -> Self {
        Self {
            id: "financial_crisis".to_string(),
            name: "Financial Crisis (2008)".to_string(),
            duration: 2,
            yearly_returns: BTreeMap::from([(0, -0.3775), (1, 0.2584)]),
            recovery_years: Some(5),
        }
    }

    // COVID crash, compressed into the 2020 calendar year.
    #[must_use]
    pub fn covid_crash() -> Self {
        Self {
            id: "covid".to_string(),
            name: "COVID Crash (2020)".to_string(),
            duration: 1,
            yearly_returns: BTreeMap::from([(0, -0.1240)]),
            recovery_years: Some(1),
        }
    }

    /// The fixed catalogue used by the stress tester.
    #[must_use]
    pub fn catalogue() -> Vec<BlackSwanEvent> {
        vec![
            Self::dotcom_crash(),
            Self::financial_crisis_2008(),
            Self::covid_crash(),
        ]
    }
}

/// Where yearly returns come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum ReturnConfig {
    /// The same rate every year.
    Fixed { rate: f64 },
    /// Independent normal draws; a fixed seed makes the sequence
    /// reproducible across runs and re-entrant calls.
    Random {
        mean: f64,
        std_dev: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Recorded index returns starting `offset_years` into the series.
    /// Years beyond the recorded span fall back to the long-run average and
    /// clear the coverage flag; they are never zero-filled.
    Historical {
        index: HistoricalIndex,
        #[serde(default)]
        offset_years: usize,
    },
    /// Crisis overrides inside the event window, base mode elsewhere.
    BlackSwan {
        event: BlackSwanEvent,
        event_start_year: i32,
        base: Box<ReturnConfig>,
    },
}

/// Resolved yearly rates for one simulation run.
///
/// Construction draws the RNG once per simulated year; afterwards lookups
/// are pure, so repeated or concurrent runs with the same config cannot
/// interfere with each other.
#[derive(Debug, Clone)]
pub struct ReturnProvider {
    rates: Vec<f64>,
    full_coverage: bool,
}

impl ReturnProvider {
    pub fn new(
        config: &ReturnConfig,
        start_year: i32,
        num_years: usize,
    ) -> Result<Self, ReturnError> {
        match config {
            ReturnConfig::Fixed { rate } => Ok(Self {
                rates: vec![*rate; num_years],
                full_coverage: true,
            }),
            ReturnConfig::Random {
                mean,
                std_dev,
                seed,
            } => {
                let normal = rand_distr::Normal::new(*mean, *std_dev).map_err(|_| {
                    ReturnError::InvalidDistributionParameters {
                        mean: *mean,
                        std_dev: *std_dev,
                        reason: "std_dev must be non-negative and finite",
                    }
                })?;
                let mut rng = SmallRng::seed_from_u64(seed.unwrap_or_else(rand::random));
                let rates = (0..num_years).map(|_| normal.sample(&mut rng)).collect();
                Ok(Self {
                    rates,
                    full_coverage: true,
                })
            }
            ReturnConfig::Historical {
                index,
                offset_years,
            } => {
                if index.data.is_empty() {
                    return Err(ReturnError::EmptyHistoricalData {
                        index_id: index.id.clone(),
                    });
                }
                let average = index.long_run_average();
                let first_year = index.start_year + *offset_years as i32;
                let mut full_coverage = true;
                let rates = (0..num_years)
                    .map(|i| {
                        index.return_for(first_year + i as i32).unwrap_or_else(|| {
                            full_coverage = false;
                            average
                        })
                    })
                    .collect();
                Ok(Self {
                    rates,
                    full_coverage,
                })
            }
            ReturnConfig::BlackSwan {
                event,
                event_start_year,
                base,
            } => {
                let mut provider = Self::new(base, start_year, num_years)?;
                for (i, rate) in provider.rates.iter_mut().enumerate() {
                    let year = start_year + i as i32;
                    if year >= *event_start_year {
                        let offset = (year - event_start_year) as usize;
                        if let Some(override_rate) = event.override_for(offset) {
                            *rate = override_rate;
                        }
                    }
                }
                Ok(provider)
            }
        }
    }

    /// Rate to apply in the given year of the run (zero-based index).
    /// Indices beyond the horizon return 0; the engine never asks for them.
    #[must_use]
    pub fn rate_for(&self, year_index: usize) -> f64 {
        self.rates.get(year_index).copied().unwrap_or(0.0)
    }

    /// False when any simulated year fell outside the historical span and
    /// used the long-run-average fallback.
    #[must_use]
    pub fn full_coverage(&self) -> bool {
        self.full_coverage
    }
}
