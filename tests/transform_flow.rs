use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ans_etl::app::ports::HttpClientPort;
use ans_etl::config::EtlConfig;
use ans_etl::error::{EtlError, Result};
use ans_etl::pipeline::Pipeline;

const BOM: &str = "\u{feff}";

/// Local transforms never touch the network.
struct Offline;

impl HttpClientPort for Offline {
    fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        panic!("unexpected fetch of {url}")
    }

    fn download(&self, url: &str, _dest: &Path, _timeout: Duration) -> Result<u64> {
        panic!("unexpected download of {url}")
    }
}

fn config_in(root: &Path) -> EtlConfig {
    EtlConfig {
        raw_dir: root.join("raw"),
        processed_dir: root.join("processed"),
        log_dir: root.join("logs"),
        ..EtlConfig::default()
    }
}

fn write_fixtures(dir: &Path) -> (Vec<PathBuf>, PathBuf) {
    // Latin-1 export: the description column carries a non-UTF-8 byte
    let mut q1: Vec<u8> = b"DATA;REG_ANS;CD_CONTA_CONTABIL;DESCRICAO;VL_SALDO_INICIAL;VL_SALDO_FINAL\n".to_vec();
    q1.extend_from_slice(b"2024-01-01;123;411;EVENTOS INDENIZ\xc1VEIS;0;1.500,00\n");
    q1.extend_from_slice(b"2024-01-01;123;412;OUTROS;0;500,50\n");
    q1.extend_from_slice(b"2024-01-01;456;411;EVENTOS;0;2.000,00\n");
    q1.extend_from_slice(b"2024-01-01;999;411;EVENTOS;0;10,00\n");
    q1.extend_from_slice(b"2024-01-01;;411;SEM OPERADORA;0;5,00\n");
    q1.extend_from_slice(b"2024-01-01;456;411;VALOR INVALIDO;0;abc\n");
    let q1_path = dir.join("1T2024.csv");
    fs::write(&q1_path, q1).unwrap();

    let q2_path = dir.join("2T2024.csv");
    fs::write(&q2_path, " reg_ans ; Vl_Saldo_Final \n123;100,00\n").unwrap();

    let unnamed = dir.join("balancete.csv");
    fs::write(&unnamed, "REG_ANS;VL_SALDO_FINAL\n123;1,00\n").unwrap();

    let no_value = dir.join("3T2024.csv");
    fs::write(&no_value, "REG_ANS;VL_SALDO_INICIAL\n123;1,00\n").unwrap();

    let registry = dir.join("Relatorio_cadop.csv");
    fs::write(
        &registry,
        "Registro_Operadora;CNPJ;Razao_Social;Nome_Fantasia;Modalidade;Logradouro;UF\n\
         123;11.222.333/0001-44; ALFA SAUDE ;ALFA;Medicina de Grupo;RUA A;SP\n\
         456;55.666.777/0001-88;BETA COOPERATIVA;BETA;Cooperativa Médica;RUA B;RJ\n",
    )
    .unwrap();

    (vec![q1_path, q2_path, unnamed, no_value], registry)
}

fn read_output(path: &Path) -> String {
    let text = fs::read_to_string(path).unwrap();
    assert!(text.starts_with(BOM), "{} has no BOM", path.display());
    text[BOM.len()..].to_string()
}

#[test]
fn transform_writes_detail_report_archives_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let (quarterly, registry) = write_fixtures(dir.path());
    let pipeline = Pipeline::new(config_in(dir.path()), Offline);

    let manifest = pipeline.transform(&quarterly, &registry).unwrap();

    assert_eq!(manifest.command, "transform");
    assert_eq!(manifest.processed_files, quarterly[..2].to_vec());
    assert_eq!(manifest.skipped_files.len(), 2);
    assert_eq!(manifest.counts.quarterly_records, 5);
    assert_eq!(manifest.counts.dropped_rows, 2);
    assert_eq!(manifest.counts.unmatched_records, 1);
    assert_eq!(manifest.counts.aggregated_groups, 3);

    let processed = dir.path().join("processed");
    let detail = read_output(&processed.join("consolidado_despesas.csv"));
    let lines: Vec<&str> = detail.lines().collect();
    assert_eq!(lines[0], "RegistroANS;ValorDespesas;Ano;Trimestre;RazaoSocial;CNPJ;UF;Modalidade");
    assert_eq!(lines[1], "123;1500.0;2024;1;ALFA SAUDE;11.222.333/0001-44;SP;Medicina de Grupo");
    assert_eq!(lines[4], "999;10.0;2024;1;;;;");
    assert_eq!(lines[5], "123;100.0;2024;2;ALFA SAUDE;11.222.333/0001-44;SP;Medicina de Grupo");
    assert_eq!(lines.len(), 6);

    let report = read_output(&processed.join("despesas_agregadas.csv"));
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(
        lines,
        vec![
            "CNPJ;RazaoSocial;UF;Ano;Trimestre;DespesaTotal;DespesaMediaTrimestre",
            "11.222.333/0001-44;ALFA SAUDE;SP;2024;1;R$ 2.000,50;R$ 1.000,25",
            "55.666.777/0001-88;BETA COOPERATIVA;RJ;2024;1;R$ 2.000,00;R$ 2.000,00",
            "11.222.333/0001-44;ALFA SAUDE;SP;2024;2;R$ 100,00;R$ 100,00",
        ]
    );

    for name in ["consolidado_despesas.zip", "despesas_agregadas.zip", "run_manifest.json"] {
        assert!(processed.join(name).is_file(), "{name} missing");
    }
    let outputs: Vec<String> = manifest
        .outputs
        .iter()
        .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(outputs.contains(&"despesas_agregadas.zip".to_string()));
    assert!(manifest.outputs.iter().all(|o| o.sha256.len() == 64 && o.bytes > 0));
}

#[test]
fn detail_file_reaggregates_to_the_same_report() {
    let dir = tempfile::tempdir().unwrap();
    let (quarterly, registry) = write_fixtures(dir.path());
    let pipeline = Pipeline::new(config_in(dir.path()), Offline);
    pipeline.transform(&quarterly, &registry).unwrap();

    let processed = dir.path().join("processed");
    let first = fs::read(processed.join("despesas_agregadas.csv")).unwrap();

    let manifest = pipeline
        .aggregate_file(&processed.join("consolidado_despesas.csv"))
        .unwrap();
    assert_eq!(manifest.command, "aggregate");
    assert_eq!(manifest.counts.aggregated_groups, 3);
    assert_eq!(fs::read(processed.join("despesas_agregadas.csv")).unwrap(), first);
}

#[test]
fn aggregated_report_cannot_be_aggregated_again() {
    let dir = tempfile::tempdir().unwrap();
    let (quarterly, registry) = write_fixtures(dir.path());
    let pipeline = Pipeline::new(config_in(dir.path()), Offline);
    pipeline.transform(&quarterly, &registry).unwrap();

    let report = dir.path().join("processed/despesas_agregadas.csv");
    assert!(matches!(pipeline.aggregate_file(&report), Err(EtlError::Schema(_))));
}

#[test]
fn all_files_failing_is_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let (quarterly, registry) = write_fixtures(dir.path());
    let pipeline = Pipeline::new(config_in(dir.path()), Offline);

    let err = pipeline.transform(&quarterly[2..], &registry).unwrap_err();
    assert!(matches!(err, EtlError::NoData(_)));
    assert!(!dir.path().join("processed/consolidado_despesas.csv").exists());
}

#[test]
fn registry_without_required_columns_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let (quarterly, _) = write_fixtures(dir.path());
    let registry = dir.path().join("cadop_antigo.csv");
    fs::write(&registry, "Registro_ANS;CNPJ;Razao_Social\n123;1;A\n").unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), Offline);

    match pipeline.transform(&quarterly, &registry) {
        Err(EtlError::Schema(err)) => {
            assert!(err.missing.contains(&"registro_operadora".to_string()));
            assert!(err.missing.contains(&"uf".to_string()));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}
