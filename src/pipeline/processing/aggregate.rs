use std::collections::HashMap;

use tracing::{info, warn};

use crate::constants::AGGREGATION_COLUMNS;
use crate::domain::{AggregatedRecord, EnrichedRecord};
use crate::error::{ParseError, Result};
use crate::pipeline::processing::locale::format_brl;
use crate::pipeline::processing::table::{field, RawTable};

/// Numeric totals for one (CNPJ, RazaoSocial, UF, Ano, Trimestre) group,
/// before any display formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    pub cnpj: String,
    pub razao_social: String,
    pub uf: String,
    pub ano: i32,
    pub trimestre: u8,
    pub total: f64,
    pub count: usize,
}

impl ExpenseSummary {
    pub fn mean(&self) -> f64 {
        self.total / self.count as f64
    }

    fn into_formatted(self) -> AggregatedRecord {
        let mean = self.mean();
        AggregatedRecord {
            despesa_total: format_brl(Some(self.total)),
            despesa_media_trimestre: format_brl(Some(mean)),
            cnpj: self.cnpj,
            razao_social: self.razao_social,
            uf: self.uf,
            ano: self.ano,
            trimestre: self.trimestre,
        }
    }
}

type GroupKey<'a> = (&'a str, &'a str, &'a str, i32, u8);

/// Sum and count per group, largest total first. Ties keep the order in
/// which groups first appeared. Records without registry data belong to no
/// group.
pub fn summarize(enriched: &[EnrichedRecord]) -> Vec<ExpenseSummary> {
    let mut index: HashMap<GroupKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<ExpenseSummary> = Vec::new();
    let mut ungrouped = 0usize;

    for record in enriched {
        let (cnpj, razao_social, uf) = match (&record.cnpj, &record.razao_social, &record.uf) {
            (Some(c), Some(r), Some(u)) => (c.as_str(), r.as_str(), u.as_str()),
            _ => {
                ungrouped += 1;
                continue;
            }
        };
        let key = (cnpj, razao_social, uf, record.ano, record.trimestre);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(ExpenseSummary {
                cnpj: cnpj.to_string(),
                razao_social: razao_social.to_string(),
                uf: uf.to_string(),
                ano: record.ano,
                trimestre: record.trimestre,
                total: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        groups[slot].total += record.valor_despesas;
        groups[slot].count += 1;
    }

    if ungrouped > 0 {
        warn!(ungrouped, "records without registry data left out of the aggregation");
    }

    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups
}

/// Group, total, average and format. The money columns come out as BRL
/// display strings.
pub fn aggregate(enriched: &[EnrichedRecord]) -> Vec<AggregatedRecord> {
    let aggregated: Vec<AggregatedRecord> = summarize(enriched)
        .into_iter()
        .map(ExpenseSummary::into_formatted)
        .collect();
    info!(groups = aggregated.len(), "expenses aggregated");
    aggregated
}

/// Rebuild enriched records from a consolidated detail file so it can be
/// aggregated again. The detail file holds raw numbers; a formatted report
/// lacks `ValorDespesas` and is rejected.
///
/// Unmatched records are written with all four registry columns empty. A row
/// with any of them filled was matched and keeps its other columns as they
/// are, blank ones included, so it groups the same way it did originally.
pub fn enriched_from_table(table: &RawTable) -> Result<Vec<EnrichedRecord>> {
    let pos = table.require_exact(&AGGREGATION_COLUMNS)?;
    let optional = table.require_exact(&["RegistroANS", "Modalidade"]).ok();

    table
        .rows
        .iter()
        .map(|row| -> Result<EnrichedRecord> {
            let ano = parse_field::<i32>(row, pos[3], "Ano")?;
            let trimestre = parse_field::<u8>(row, pos[4], "Trimestre")?;
            let valor_despesas = parse_field::<f64>(row, pos[5], "ValorDespesas")?;

            let cnpj = field(row, pos[0]).trim();
            let razao_social = field(row, pos[1]).trim();
            let uf = field(row, pos[2]).trim();
            let modalidade = optional.as_ref().map_or("", |o| field(row, o[1]).trim());
            let matched = [cnpj, razao_social, uf, modalidade].iter().any(|v| !v.is_empty());
            let registry = |value: &str| matched.then(|| value.to_string());

            Ok(EnrichedRecord {
                registro_ans: optional
                    .as_ref()
                    .map(|o| field(row, o[0]).trim().to_string())
                    .unwrap_or_default(),
                valor_despesas,
                ano,
                trimestre,
                razao_social: registry(razao_social),
                cnpj: registry(cnpj),
                uf: registry(uf),
                modalidade: registry(modalidade),
            })
        })
        .collect()
}

fn parse_field<T: std::str::FromStr>(row: &[String], idx: usize, column: &str) -> Result<T> {
    let raw = field(row, idx).trim();
    raw.parse::<T>().map_err(|_| {
        ParseError::Field {
            column: column.to_string(),
            value: raw.to_string(),
        }
        .into()
    })
}
