//! # Scan Flow
//!
//! Ties a scanned barcode to a verdict: look the product up, then run its
//! ingredient text through the matcher against the user's watchlist.
//!
//! Only one scan may be outstanding per session. [`ScanGate`] hands out a
//! [`ScanPermit`] for the duration of a lookup; a second scan from the same
//! session is refused until the permit is dropped, which happens whether
//! the lookup succeeds or fails.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Instrument};

use crate::errors::LookupError;
use crate::lookup::ProductLookup;
use crate::observability;
use crate::product::ProductRecord;
use crate::validation::{is_barcode_input, normalize_barcode};
use crate::watchlist::Watchlist;

/// Outcome of a successful scan, handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub product: ProductRecord,
    /// Watchlist entries found in the ingredients, in watchlist order
    pub matches: Vec<String>,
}

impl ScanReport {
    /// No watchlist entry was found
    pub fn is_clear(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Why a scan produced no report
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Another scan for the same session has not finished yet
    Busy,
    /// Input is not a barcode: stray characters or an unsupported length
    InvalidBarcode(String),
    /// The product lookup failed
    Lookup(LookupError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Busy => write!(f, "[SCAN_BUSY] A scan is already in progress"),
            ScanError::InvalidBarcode(code) => {
                write!(f, "[SCAN_BARCODE] Not a valid barcode: {}", code)
            }
            ScanError::Lookup(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<LookupError> for ScanError {
    fn from(err: LookupError) -> Self {
        ScanError::Lookup(err)
    }
}

/// Tracks which sessions have a scan in flight
#[derive(Debug, Clone, Default)]
pub struct ScanGate {
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session, or `None` if it is already scanning
    pub fn try_begin(&self, session_id: i64) -> Option<ScanPermit> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(session_id) {
            return None;
        }
        Some(ScanPermit {
            gate: Arc::clone(&self.in_flight),
            session_id,
        })
    }

    pub fn is_scanning(&self, session_id: i64) -> bool {
        self.in_flight.lock().contains(&session_id)
    }
}

/// Held while a scan is outstanding; releases the session on drop
#[derive(Debug)]
pub struct ScanPermit {
    gate: Arc<Mutex<HashSet<i64>>>,
    session_id: i64,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.gate.lock().remove(&self.session_id);
    }
}

/// Runs scans against a product lookup
#[derive(Debug)]
pub struct Scanner<L> {
    lookup: L,
    gate: ScanGate,
}

impl<L: ProductLookup> Scanner<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            gate: ScanGate::new(),
        }
    }

    pub fn gate(&self) -> &ScanGate {
        &self.gate
    }

    /// Scan `raw_input` for `session_id` and check it against `watchlist`.
    ///
    /// The watchlist is only consulted after the lookup succeeds.
    pub async fn scan(
        &self,
        session_id: i64,
        raw_input: &str,
        watchlist: &Watchlist,
    ) -> Result<ScanReport, ScanError> {
        let prepared = self.prepare(session_id, raw_input)?;
        self.run(prepared, watchlist).await
    }

    /// Validate the input and claim the session without starting the lookup.
    ///
    /// The session stays claimed until the returned scan is run or dropped.
    pub fn prepare(&self, session_id: i64, raw_input: &str) -> Result<PreparedScan, ScanError> {
        if !is_barcode_input(raw_input) {
            debug!(
                session_id = %session_id,
                digits = raw_input.chars().filter(char::is_ascii_digit).count(),
                chars = raw_input.trim().chars().count(),
                "Scan input rejected"
            );
            observability::record_scan_metrics("invalid_barcode", 0);
            return Err(ScanError::InvalidBarcode(raw_input.trim().to_string()));
        }
        let barcode = normalize_barcode(raw_input);

        match self.gate.try_begin(session_id) {
            Some(permit) => Ok(PreparedScan { barcode, permit }),
            None => {
                debug!(session_id = %session_id, barcode = %barcode, "Scan rejected, another is in flight");
                observability::record_scan_metrics("busy", 0);
                Err(ScanError::Busy)
            }
        }
    }

    /// Look up a prepared scan and match it against `watchlist`
    pub async fn run(
        &self,
        prepared: PreparedScan,
        watchlist: &Watchlist,
    ) -> Result<ScanReport, ScanError> {
        let PreparedScan { barcode, permit } = prepared;
        let session_id = permit.session_id;

        let span = observability::scan_span(&barcode, session_id);
        let start = Instant::now();

        let result = self.lookup.lookup(&barcode).instrument(span).await;
        drop(permit);

        let product = match result {
            Ok(product) => product,
            Err(e) => {
                let outcome = if e.is_not_found() { "not_found" } else { "lookup_error" };
                observability::record_scan_metrics(outcome, 0);
                return Err(ScanError::Lookup(e));
            }
        };

        let matches = watchlist.find_in(&product.ingredients_text);
        observability::record_scan_metrics("completed", matches.len());

        info!(
            session_id = %session_id,
            barcode = %barcode,
            watchlist_size = watchlist.len(),
            matches = matches.len(),
            duration_ms = start.elapsed().as_millis(),
            "Scan completed"
        );

        Ok(ScanReport { product, matches })
    }
}

/// A validated barcode whose session is already claimed
#[derive(Debug)]
pub struct PreparedScan {
    barcode: String,
    permit: ScanPermit,
}

impl PreparedScan {
    pub fn barcode(&self) -> &str {
        &self.barcode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_single_permit_per_session() {
        let gate = ScanGate::new();
        let permit = gate.try_begin(1).expect("first scan should be admitted");
        assert!(gate.try_begin(1).is_none());
        assert!(gate.try_begin(2).is_some());
        assert!(gate.is_scanning(1));

        drop(permit);
        assert!(!gate.is_scanning(1));
        assert!(gate.try_begin(1).is_some());
    }

    #[test]
    fn test_prepared_scan_holds_the_session() {
        struct NoLookup;
        impl ProductLookup for NoLookup {
            async fn lookup(&self, barcode: &str) -> Result<ProductRecord, LookupError> {
                Err(LookupError::NotFound(barcode.to_string()))
            }
        }

        let scanner = Scanner::new(NoLookup);
        let prepared = scanner.prepare(7, " 4006381333931 ").unwrap();
        assert_eq!(prepared.barcode(), "4006381333931");
        assert!(matches!(scanner.prepare(7, "4006381333931"), Err(ScanError::Busy)));

        drop(prepared);
        assert!(!scanner.gate().is_scanning(7));
        assert!(matches!(
            scanner.prepare(7, "123"),
            Err(ScanError::InvalidBarcode(code)) if code == "123"
        ));
    }

    #[test]
    fn test_prepare_rejects_letters_around_digits() {
        struct NoLookup;
        impl ProductLookup for NoLookup {
            async fn lookup(&self, barcode: &str) -> Result<ProductRecord, LookupError> {
                Err(LookupError::NotFound(barcode.to_string()))
            }
        }

        let scanner = Scanner::new(NoLookup);
        assert!(matches!(
            scanner.prepare(7, "abc4006381333931"),
            Err(ScanError::InvalidBarcode(code)) if code == "abc4006381333931"
        ));
        assert!(matches!(
            scanner.prepare(7, "4006381333931 #"),
            Err(ScanError::InvalidBarcode(_))
        ));
        assert!(!scanner.gate().is_scanning(7));

        // Spaces and dashes between digit groups are still accepted
        let prepared = scanner.prepare(7, "4-006381-333931").unwrap();
        assert_eq!(prepared.barcode(), "4006381333931");
    }

    #[test]
    fn test_scan_error_display() {
        assert_eq!(ScanError::Busy.to_string(), "[SCAN_BUSY] A scan is already in progress");
        let err: ScanError = LookupError::HttpStatus(502).into();
        assert!(err.to_string().contains("502"));
    }
}
