//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)
//!
//! Payoffs act on terminal prices. A NaN price yields a NaN payoff so that
//! the estimators can mask it out.

/// Enumeration of supported option payoff types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payoff {
    /// European call option: max(S_T - K, 0)
    EuropeanCall { k: f64 },

    /// European put option: max(K - S_T, 0)
    EuropeanPut { k: f64 },
}

impl Payoff {
    pub fn european(k: f64, is_call: bool) -> Self {
        if is_call {
            Payoff::EuropeanCall { k }
        } else {
            Payoff::EuropeanPut { k }
        }
    }

    pub fn strike(&self) -> f64 {
        match self {
            Payoff::EuropeanCall { k } | Payoff::EuropeanPut { k } => *k,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Payoff::EuropeanCall { .. })
    }

    /// Payoff for terminal price `s_t`
    pub fn calculate(&self, s_t: f64) -> f64 {
        if s_t.is_nan() {
            return f64::NAN;
        }
        match self {
            Payoff::EuropeanCall { k } => (s_t - k).max(0.0),
            Payoff::EuropeanPut { k } => (k - s_t).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payoffs() {
        let call = Payoff::european(1.0, true);
        let put = Payoff::european(1.0, false);
        assert!((call.calculate(1.2) - 0.2).abs() < 1e-15);
        assert_eq!(call.calculate(0.8), 0.0);
        assert_eq!(put.calculate(1.2), 0.0);
        assert!((put.calculate(0.7) - 0.3).abs() < 1e-15);
        assert!(call.calculate(f64::NAN).is_nan());
        assert!(call.is_call() && !put.is_call());
        assert_eq!(put.strike(), 1.0);
    }
}
