//! Daily security snapshots fed to universe selection.
//!
//! Coarse rows carry cheap price data for every tradable security; fine rows
//! carry fundamentals for the coarse survivors only.

/// One coarse row: last price against the prior session's adjusted close.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseSnapshot {
    pub symbol: String,
    pub price: f64,
    pub adjusted_prior_close: f64,
}

impl CoarseSnapshot {
    /// Premarket gap as a fraction of the prior close.
    ///
    /// A zero prior close yields `0.0` rather than a division by zero. That
    /// reads a data anomaly as "no gap"; callers that care must check
    /// `adjusted_prior_close` themselves.
    pub fn gap_fraction(&self) -> f64 {
        if self.adjusted_prior_close == 0.0 {
            return 0.0;
        }
        (self.price - self.adjusted_prior_close) / self.adjusted_prior_close
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub market_cap: Option<f64>,
}

/// One fine row. `profile` is `None` when no fundamentals exist for the symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FineSnapshot {
    pub symbol: String,
    pub profile: Option<CompanyProfile>,
}

impl FineSnapshot {
    pub fn market_cap(&self) -> Option<f64> {
        self.profile.as_ref().and_then(|p| p.market_cap)
    }
}
