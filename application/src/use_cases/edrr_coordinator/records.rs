//! In-cycle sink for dialectical reasoning steps

use super::types::DialecticalRecordSet;
use crate::ports::dialectical::PhaseRecorder;
use edrr_domain::DialecticalSequence;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct DialecticalRecords {
    records: Mutex<DialecticalRecordSet>,
}

impl DialecticalRecords {
    pub fn snapshot(&self) -> DialecticalRecordSet {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, DialecticalRecordSet> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PhaseRecorder for DialecticalRecords {
    fn record_expand_results(&self, result: &DialecticalSequence) {
        self.lock().expand.push(result.clone());
    }

    fn record_differentiate_results(&self, result: &DialecticalSequence) {
        self.lock().differentiate.push(result.clone());
    }

    fn record_refine_results(&self, result: &DialecticalSequence) {
        self.lock().refine.push(result.clone());
    }
}
