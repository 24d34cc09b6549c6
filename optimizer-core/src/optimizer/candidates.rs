//! Candidate set builder
//!
//! Walks attribute -> threats -> measures and produces the deduplicated list
//! of measures eligible for the attribute's model. Links are visited sorted by
//! threat id and measures by measure id, so the result does not depend on the
//! order the store returns rows in.

use std::collections::HashMap;
use uuid::Uuid;

use super::types::{CandidateMeasure, CandidateSet};
use crate::error::StoreError;
use crate::models::{SecurityAttribute, ThreatMeasureLink};
use crate::store::SecurityStore;

pub async fn build_candidate_set(
    store: &dyn SecurityStore,
    attribute: &SecurityAttribute,
) -> Result<CandidateSet, StoreError> {
    let mut links = store.get_attribute_threats(attribute.id).await?;
    links.sort_by_key(|l| l.threat_id);
    links.dedup_by_key(|l| l.threat_id);

    let mut set = CandidateSet {
        threat_ids: links.iter().map(|l| l.threat_id).collect(),
        exposure: links.iter().map(|l| l.financial_risk()).sum(),
        ..CandidateSet::default()
    };
    let mut positions: HashMap<Uuid, usize> = HashMap::new();

    for link in &links {
        let mut measures = store.get_threat_measures(link.threat_id).await?;
        measures.sort_by_key(|m| m.measure.id);

        for entry in measures {
            if let Some(issue) = entry.measure.validation_issue() {
                tracing::debug!("Rejecting measure {} ({}): {}", entry.measure.name, entry.measure.id, issue);
                set.measures_rejected += 1;
                continue;
            }

            match positions.get(&entry.measure.id) {
                Some(&index) => {
                    let candidate = &mut set.candidates[index];
                    if !candidate.covers(link.threat_id) {
                        candidate.covered_threats.push(link.threat_id);
                    }
                }
                None => {
                    positions.insert(entry.measure.id, set.candidates.len());
                    set.candidates.push(candidate_from(entry));
                }
            }
        }
    }

    tracing::debug!(
        "Attribute {}: {} threats, {} candidates, {} rejected",
        attribute.id,
        set.threats_analyzed(),
        set.candidates.len(),
        set.measures_rejected
    );
    Ok(set)
}

fn candidate_from(entry: ThreatMeasureLink) -> CandidateMeasure {
    let cost = entry.measure.total_cost_3y();
    let measure = entry.measure;
    CandidateMeasure {
        measure_id: measure.id,
        code: measure.code,
        name: measure.name,
        nature: measure.nature,
        cost,
        efficacy: measure.efficacy,
        threat_id: entry.threat_id,
        threat_efficacy: entry.efficacy,
        compliance: entry.compliance,
        covered_threats: vec![entry.threat_id],
    }
}
