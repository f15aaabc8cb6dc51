//! Tax calculations for the projection engine
//!
//! Covers the three rule sets the simulation needs: progressive income tax
//! (German §32a zone formula), capital gains tax with partial exemption and
//! yearly allowance, and inheritance tax by relationship class.
//!
//! All functions here are pure; the simulation threads allowance state
//! through explicitly.

use serde::{Deserialize, Serialize};

use crate::model::Relationship;

/// Capital gains tax configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Flat capital gains rate (Abgeltungsteuer), e.g. 0.25.
    pub capital_gains_rate: f64,
    /// Fraction of gains excluded from taxation (Teilfreistellung).
    /// 0.30 for equity funds, 0.15 for mixed funds, 0.0 for bonds.
    pub partial_exemption: f64,
    /// Yearly tax-free allowance (Sparerpauschbetrag), e.g. 1000 per person,
    /// 2000 for couples. Consumed first, in order of realization.
    pub annual_allowance: f64,
    /// Whether church tax applies on top of the capital gains tax.
    pub church_tax: bool,
    /// Church tax rate on the capital gains tax amount (0.08 or 0.09).
    pub church_tax_rate: f64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            capital_gains_rate: 0.25,
            partial_exemption: 0.30,
            annual_allowance: 1_000.0,
            church_tax: false,
            church_tax_rate: 0.09,
        }
    }
}

// ============================================================================
// Progressive income tax (§32a EStG, 2024 parameters)
// ============================================================================

/// Basic allowance (Grundfreibetrag) below which no income tax is owed.
pub const BASIC_ALLOWANCE: f64 = 11_604.0;

const ZONE2_END: f64 = 17_005.0;
const ZONE3_END: f64 = 66_760.0;
const ZONE4_END: f64 = 277_825.0;

/// Income tax on a given taxable income, per the 2024 zone formula.
///
/// The statutory rounding to whole euros is deliberately omitted so the
/// function stays continuous and monotone, which the analysis layer relies
/// on.
#[must_use]
pub fn income_tax(income: f64) -> f64 {
    if income <= BASIC_ALLOWANCE {
        0.0
    } else if income <= ZONE2_END {
        let y = (income - BASIC_ALLOWANCE) / 10_000.0;
        (922.98 * y + 1_400.0) * y
    } else if income <= ZONE3_END {
        let z = (income - ZONE2_END) / 10_000.0;
        (181.19 * z + 2_397.0) * z + 1_025.38
    } else if income <= ZONE4_END {
        0.42 * income - 10_602.13
    } else {
        0.45 * income - 18_936.88
    }
}

/// Average tax rate at the given income (tax / income, 0 at or below the
/// basic allowance).
#[must_use]
pub fn average_tax_rate(income: f64) -> f64 {
    if income <= 0.0 {
        0.0
    } else {
        income_tax(income) / income
    }
}

/// Marginal tax rate at the given income (analytic derivative of the zone
/// formula).
#[must_use]
pub fn marginal_tax_rate(income: f64) -> f64 {
    if income <= BASIC_ALLOWANCE {
        0.0
    } else if income <= ZONE2_END {
        let y = (income - BASIC_ALLOWANCE) / 10_000.0;
        (2.0 * 922.98 * y + 1_400.0) / 10_000.0
    } else if income <= ZONE3_END {
        let z = (income - ZONE2_END) / 10_000.0;
        (2.0 * 181.19 * z + 2_397.0) / 10_000.0
    } else if income <= ZONE4_END {
        0.42
    } else {
        0.45
    }
}

// ============================================================================
// Capital gains tax
// ============================================================================

/// Breakdown of a single capital gains tax computation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CapitalGainsTax {
    /// Gain subject to tax after the partial exemption.
    pub taxable_gain: f64,
    /// Portion of the yearly allowance consumed by this computation.
    pub allowance_used: f64,
    /// Capital gains tax owed.
    pub tax: f64,
    /// Church tax owed on top of `tax` (0 when the flag is off). Tracked
    /// separately so a user can compare opting out.
    pub church_tax: f64,
}

impl CapitalGainsTax {
    /// Total liability including church tax.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.tax + self.church_tax
    }
}

/// Capital gains tax on a gross gain, net of the partial exemption and the
/// remaining yearly allowance.
///
/// `remaining_allowance` is whatever is left of the yearly tax-free
/// allowance; the caller subtracts `allowance_used` from it afterwards.
/// Losses produce a zero result (no loss carry-forward is modeled).
#[must_use]
pub fn capital_gains_tax(
    gross_gain: f64,
    remaining_allowance: f64,
    config: &TaxConfig,
) -> CapitalGainsTax {
    if gross_gain <= 0.0 {
        return CapitalGainsTax::default();
    }

    let taxable_gain = gross_gain * (1.0 - config.partial_exemption);
    let allowance_used = taxable_gain.min(remaining_allowance.max(0.0));
    let tax = (taxable_gain - allowance_used) * config.capital_gains_rate;
    let church_tax = if config.church_tax {
        config.church_tax_rate * tax
    } else {
        0.0
    };

    CapitalGainsTax {
        taxable_gain,
        allowance_used,
        tax,
        church_tax,
    }
}

// ============================================================================
// Inheritance tax
// ============================================================================

/// Inheritance tax class per §15 ErbStG, derived from the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InheritanceTaxClass {
    I,
    II,
    III,
}

/// Rate band thresholds on the taxable amount (§19 ErbStG).
const BAND_LIMITS: [f64; 7] = [
    75_000.0,
    300_000.0,
    600_000.0,
    6_000_000.0,
    13_000_000.0,
    26_000_000.0,
    f64::INFINITY,
];

const CLASS_I_RATES: [f64; 7] = [0.07, 0.11, 0.15, 0.19, 0.23, 0.27, 0.30];
const CLASS_II_RATES: [f64; 7] = [0.15, 0.20, 0.25, 0.30, 0.35, 0.40, 0.43];
const CLASS_III_RATES: [f64; 7] = [0.30, 0.30, 0.30, 0.30, 0.50, 0.50, 0.50];

/// Result of an inheritance tax computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InheritanceTax {
    pub exemption: f64,
    pub taxable_amount: f64,
    /// Band rate applied to the full taxable amount.
    pub rate: f64,
    pub tax: f64,
    pub net_amount: f64,
}

/// Inheritance tax on a gross amount for a given relationship class.
///
/// The exemption is subtracted first; the band rate for the remaining
/// taxable amount applies to that full remainder. Amounts at or below the
/// exemption are tax-free, and the tax is continuous at the boundary.
#[must_use]
pub fn inheritance_tax(gross_amount: f64, relationship: Relationship) -> InheritanceTax {
    let exemption = relationship.exemption();
    let taxable_amount = (gross_amount - exemption).max(0.0);

    let rate = if taxable_amount > 0.0 {
        let rates = match relationship.tax_class() {
            InheritanceTaxClass::I => &CLASS_I_RATES,
            InheritanceTaxClass::II => &CLASS_II_RATES,
            InheritanceTaxClass::III => &CLASS_III_RATES,
        };
        let band = BAND_LIMITS
            .iter()
            .position(|limit| taxable_amount <= *limit)
            .unwrap_or(BAND_LIMITS.len() - 1);
        rates[band]
    } else {
        0.0
    };

    let tax = taxable_amount * rate;

    InheritanceTax {
        exemption,
        taxable_amount,
        rate,
        tax,
        net_amount: gross_amount - tax,
    }
}
