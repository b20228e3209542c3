//! Utility functions over two-good bundles
//!
//! Three closed families are supported. Every evaluation adds
//! [`UTILITY_EPSILON`] to each quantity, so utility stays finite and
//! positive at zero holdings and marginal incentives never vanish
//! entirely for smooth forms.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::Good;
use crate::economy::bundle::Bundle;

/// Added to every good quantity before evaluation
pub const UTILITY_EPSILON: f64 = 0.01;

/// Tolerance for `alpha + beta == 1` in Cobb-Douglas
const EXPONENT_SUM_TOLERANCE: f64 = 1e-9;

/// A validated utility function
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UtilityFunction {
    /// `(x+e)^alpha * (y+e)^beta`
    CobbDouglas { alpha: f64, beta: f64 },
    /// `alpha*(x+e) + beta*(y+e)`
    PerfectSubstitutes { alpha: f64, beta: f64 },
    /// `min(alpha*(x+e), beta*(y+e))`
    PerfectComplements { alpha: f64, beta: f64 },
}

impl UtilityFunction {
    /// Cobb-Douglas with `beta = 1 - alpha`
    pub fn cobb_douglas(alpha: f64) -> Result<Self> {
        Self::cobb_douglas_with_beta(alpha, 1.0 - alpha)
    }

    pub fn cobb_douglas_with_beta(alpha: f64, beta: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(SimError::InvalidUtility(format!(
                "Cobb-Douglas alpha must be in (0, 1), got {alpha}"
            )));
        }
        if !beta.is_finite() || (alpha + beta - 1.0).abs() > EXPONENT_SUM_TOLERANCE {
            return Err(SimError::InvalidUtility(format!(
                "Cobb-Douglas alpha + beta must equal 1, got {alpha} + {beta}"
            )));
        }
        Ok(Self::CobbDouglas { alpha, beta })
    }

    pub fn perfect_substitutes(alpha: f64, beta: f64) -> Result<Self> {
        check_positive("perfect substitutes", alpha, beta)?;
        Ok(Self::PerfectSubstitutes { alpha, beta })
    }

    pub fn perfect_complements(alpha: f64, beta: f64) -> Result<Self> {
        check_positive("perfect complements", alpha, beta)?;
        Ok(Self::PerfectComplements { alpha, beta })
    }

    /// Short tag naming the family
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::CobbDouglas { .. } => "cobb_douglas",
            Self::PerfectSubstitutes { .. } => "perfect_substitutes",
            Self::PerfectComplements { .. } => "perfect_complements",
        }
    }

    /// Utility of a bundle, always >= 0
    pub fn utility(&self, bundle: &Bundle) -> f64 {
        let x = f64::from(bundle.get(Good::A)) + UTILITY_EPSILON;
        let y = f64::from(bundle.get(Good::B)) + UTILITY_EPSILON;
        match *self {
            Self::CobbDouglas { alpha, beta } => x.powf(alpha) * y.powf(beta),
            Self::PerfectSubstitutes { alpha, beta } => alpha * x + beta * y,
            Self::PerfectComplements { alpha, beta } => (alpha * x).min(beta * y),
        }
    }

    /// Utility change from adding `amount` units of `good`
    ///
    /// Evaluated as a before/after difference for every family, which is
    /// what the kinked complements form requires.
    pub fn marginal_utility(&self, bundle: &Bundle, good: Good, amount: u32) -> f64 {
        let mut after = bundle.clone();
        after.add(good, amount);
        self.utility(&after) - self.utility(bundle)
    }
}

fn check_positive(family: &str, alpha: f64, beta: f64) -> Result<()> {
    if alpha.is_finite() && beta.is_finite() && alpha > 0.0 && beta > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidUtility(format!(
            "{family} weights must be strictly positive, got alpha={alpha} beta={beta}"
        )))
    }
}

impl Default for UtilityFunction {
    fn default() -> Self {
        Self::CobbDouglas {
            alpha: 0.5,
            beta: 0.5,
        }
    }
}

/// Unvalidated utility description as it appears in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UtilitySpec {
    CobbDouglas {
        alpha: f64,
        #[serde(default)]
        beta: Option<f64>,
    },
    PerfectSubstitutes { alpha: f64, beta: f64 },
    PerfectComplements { alpha: f64, beta: f64 },
}

impl Default for UtilitySpec {
    fn default() -> Self {
        Self::CobbDouglas {
            alpha: 0.5,
            beta: None,
        }
    }
}

impl TryFrom<&UtilitySpec> for UtilityFunction {
    type Error = SimError;

    fn try_from(spec: &UtilitySpec) -> Result<Self> {
        match *spec {
            UtilitySpec::CobbDouglas { alpha, beta } => match beta {
                Some(beta) => UtilityFunction::cobb_douglas_with_beta(alpha, beta),
                None => UtilityFunction::cobb_douglas(alpha),
            },
            UtilitySpec::PerfectSubstitutes { alpha, beta } => {
                UtilityFunction::perfect_substitutes(alpha, beta)
            }
            UtilitySpec::PerfectComplements { alpha, beta } => {
                UtilityFunction::perfect_complements(alpha, beta)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(a: u32, b: u32) -> Bundle {
        Bundle::from_pairs([(Good::A, a), (Good::B, b)])
    }

    #[test]
    fn test_cobb_douglas_rejects_bad_alpha() {
        assert!(UtilityFunction::cobb_douglas(0.0).is_err());
        assert!(UtilityFunction::cobb_douglas(1.0).is_err());
        assert!(UtilityFunction::cobb_douglas(-0.2).is_err());
        assert!(UtilityFunction::cobb_douglas(f64::NAN).is_err());
        assert!(UtilityFunction::cobb_douglas_with_beta(0.3, 0.3).is_err());
        assert!(UtilityFunction::cobb_douglas_with_beta(0.3, 0.7).is_ok());
    }

    #[test]
    fn test_cobb_douglas_zero_bundle_is_positive() {
        let u = UtilityFunction::cobb_douglas(0.5).unwrap();
        let value = u.utility(&Bundle::new());
        assert!(value > 0.0);
        assert!((value - UTILITY_EPSILON).abs() < 1e-12);
    }

    #[test]
    fn test_cobb_douglas_diminishing_marginal_utility() {
        let u = UtilityFunction::cobb_douglas(0.5).unwrap();
        let first = u.marginal_utility(&bundle(1, 3), Good::A, 1);
        let second = u.marginal_utility(&bundle(2, 3), Good::A, 1);
        let third = u.marginal_utility(&bundle(3, 3), Good::A, 1);
        assert!(first > second);
        assert!(second > third);
        assert!(third > 0.0);
    }

    #[test]
    fn test_substitutes_marginal_is_constant() {
        let u = UtilityFunction::perfect_substitutes(2.0, 3.0).unwrap();
        let m1 = u.marginal_utility(&bundle(0, 0), Good::A, 1);
        let m2 = u.marginal_utility(&bundle(10, 4), Good::A, 1);
        assert!((m1 - 2.0).abs() < 1e-9);
        assert!((m2 - 2.0).abs() < 1e-9);
        let mb = u.marginal_utility(&bundle(7, 7), Good::B, 1);
        assert!((mb - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_substitutes_rejects_non_positive() {
        assert!(UtilityFunction::perfect_substitutes(0.0, 1.0).is_err());
        assert!(UtilityFunction::perfect_substitutes(1.0, -1.0).is_err());
    }

    #[test]
    fn test_complements_kink() {
        let u = UtilityFunction::perfect_complements(1.0, 1.0).unwrap();
        // A is in excess: more A is worthless, more B helps
        let holdings = bundle(5, 1);
        assert!(u.marginal_utility(&holdings, Good::A, 1).abs() < 1e-12);
        assert!(u.marginal_utility(&holdings, Good::B, 1) > 0.9);
    }

    #[test]
    fn test_complements_rejects_non_positive() {
        assert!(UtilityFunction::perfect_complements(1.0, 0.0).is_err());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(UtilityFunction::default().kind_tag(), "cobb_douglas");
        assert_eq!(
            UtilityFunction::perfect_substitutes(1.0, 1.0).unwrap().kind_tag(),
            "perfect_substitutes"
        );
        assert_eq!(
            UtilityFunction::perfect_complements(1.0, 1.0).unwrap().kind_tag(),
            "perfect_complements"
        );
    }

    #[test]
    fn test_spec_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            utility: UtilitySpec,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [utility]
            kind = "cobb_douglas"
            alpha = 0.8
            "#,
        )
        .unwrap();
        let u = UtilityFunction::try_from(&parsed.utility).unwrap();
        match u {
            UtilityFunction::CobbDouglas { alpha, beta } => {
                assert!((alpha - 0.8).abs() < 1e-12);
                assert!((beta - 0.2).abs() < 1e-12);
            }
            other => panic!("unexpected utility {other:?}"),
        }
    }
}
