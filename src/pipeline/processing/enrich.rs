use std::collections::HashMap;

use tracing::{info, warn};

use crate::domain::{EnrichedRecord, QuarterlyRecord, RegistryRecord};
use crate::metrics::NormalizeMetrics;

/// Left join of quarterly records against the registry on RegistroANS.
///
/// Every quarterly record comes out exactly once and in input order. When an
/// operator id appears more than once in the registry, the first entry is
/// used. Registry entries without expenses never appear.
pub fn enrich(quarterly: &[QuarterlyRecord], registry: &[RegistryRecord]) -> Vec<EnrichedRecord> {
    let mut by_id: HashMap<&str, &RegistryRecord> = HashMap::with_capacity(registry.len());
    let mut duplicates = 0usize;
    for entry in registry {
        if by_id.contains_key(entry.registro_ans.as_str()) {
            duplicates += 1;
        } else {
            by_id.insert(entry.registro_ans.as_str(), entry);
        }
    }
    if duplicates > 0 {
        warn!(duplicates, "registry has repeated operator ids; keeping the first of each");
    }

    let mut unmatched = 0usize;
    let enriched: Vec<EnrichedRecord> = quarterly
        .iter()
        .map(|q| {
            let hit = by_id.get(q.registro_ans.as_str());
            if hit.is_none() {
                unmatched += 1;
            }
            EnrichedRecord {
                registro_ans: q.registro_ans.clone(),
                valor_despesas: q.valor_despesas,
                ano: q.ano,
                trimestre: q.trimestre,
                razao_social: hit.map(|r| r.razao_social.clone()),
                cnpj: hit.map(|r| r.cnpj.clone()),
                uf: hit.map(|r| r.uf.clone()),
                modalidade: hit.map(|r| r.modalidade.clone()),
            }
        })
        .collect();

    NormalizeMetrics::record_unmatched(unmatched);
    info!(records = enriched.len(), unmatched, "records enriched with registry data");
    enriched
}
