//! Curated source lists
//!
//! Known outlets loaded into the registry at startup so that well-known
//! sources start with a track record instead of neutral trust.

use crate::{DomainRecord, Membership};

/// A curated domain with its starting trust
#[derive(Debug, Clone)]
pub struct CuratedSource {
    /// Canonical domain
    pub domain: &'static str,
    /// Starting membership (Reliable or Unreliable)
    pub membership: Membership,
}

impl CuratedSource {
    const fn reliable(domain: &'static str) -> Self {
        Self {
            domain,
            membership: Membership::Reliable,
        }
    }

    const fn unreliable(domain: &'static str) -> Self {
        Self {
            domain,
            membership: Membership::Unreliable,
        }
    }

    /// Ledger record this source starts with
    pub fn record(&self) -> DomainRecord {
        match self.membership {
            Membership::Reliable => DomainRecord::seeded(Membership::Reliable, 2.0, 5, 5),
            Membership::Unreliable => DomainRecord::seeded(Membership::Unreliable, 0.2, 1, 5),
            other => DomainRecord::seeded(other, 1.0, 0, 0),
        }
    }
}

/// Default curated sources: established market news, data and research outlets
/// followed by known low-quality aggregators and pump channels.
pub static CURATED_SOURCES: &[CuratedSource] = &[
    CuratedSource::reliable("coindesk.com"),
    CuratedSource::reliable("cointelegraph.com"),
    CuratedSource::reliable("theblock.co"),
    CuratedSource::reliable("decrypt.co"),
    CuratedSource::reliable("bloomberg.com"),
    CuratedSource::reliable("reuters.com"),
    CuratedSource::reliable("wsj.com"),
    CuratedSource::reliable("ft.com"),
    CuratedSource::reliable("cnbc.com"),
    CuratedSource::reliable("forbes.com"),
    CuratedSource::reliable("coingecko.com"),
    CuratedSource::reliable("coinmarketcap.com"),
    CuratedSource::reliable("messari.io"),
    CuratedSource::reliable("glassnode.com"),
    CuratedSource::reliable("kaiko.com"),
    CuratedSource::reliable("chainalysis.com"),
    CuratedSource::reliable("dune.com"),
    CuratedSource::reliable("defillama.com"),
    CuratedSource::reliable("tradingview.com"),
    CuratedSource::reliable("investing.com"),
    CuratedSource::reliable("binance.com"),
    CuratedSource::reliable("coinbase.com"),
    CuratedSource::reliable("kraken.com"),
    CuratedSource::reliable("etherscan.io"),
    CuratedSource::reliable("bitcoin.org"),
    CuratedSource::reliable("ethereum.org"),
    CuratedSource::unreliable("cryptopumpsignals.net"),
    CuratedSource::unreliable("moonshotcalls.io"),
    CuratedSource::unreliable("100xgems.com"),
    CuratedSource::unreliable("freecryptosignals.org"),
    CuratedSource::unreliable("guaranteedprofits.biz"),
    CuratedSource::unreliable("cryptoinsiderleaks.com"),
    CuratedSource::unreliable("altcoinmoonshots.net"),
];

/// Curated sources with the given membership
pub fn curated_with(membership: Membership) -> impl Iterator<Item = &'static CuratedSource> {
    CURATED_SOURCES
        .iter()
        .filter(move |s| s.membership == membership)
}

/// Starting records for every curated source
pub fn curated_records() -> Vec<(String, DomainRecord)> {
    CURATED_SOURCES
        .iter()
        .map(|s| (s.domain.to_string(), s.record()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_counts() {
        assert_eq!(curated_with(Membership::Reliable).count(), 26);
        assert_eq!(curated_with(Membership::Unreliable).count(), 7);
    }

    #[test]
    fn test_curated_records() {
        let records = curated_records();
        let (_, unreliable) = records
            .iter()
            .find(|(d, _)| d == "100xgems.com")
            .unwrap();
        assert_eq!(unreliable.weight, 0.2);
        assert_eq!(unreliable.accuracy.correct, 1);
        assert_eq!(unreliable.accuracy.total, 5);
    }

    #[test]
    fn test_domains_are_canonical() {
        for source in CURATED_SOURCES {
            assert_eq!(crate::canonicalize_domain(source.domain), source.domain);
        }
    }
}
