use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;

use ans_etl::app::ports::HttpClientPort;
use ans_etl::config::EtlConfig;
use ans_etl::error::{EtlError, Result};
use ans_etl::pipeline::Pipeline;
use zip::write::FileOptions;
use zip::ZipWriter;

const BASE: &str = "https://portal.test/FTP/PDA/";
const DISCLOSURES: &str = "https://portal.test/FTP/PDA/demonstracoes_contabeis/";
const REGISTRY_URL: &str = "https://portal.test/FTP/PDA/operadoras/Relatorio_cadop.csv";

/// In-memory stand-in for the open-data portal: listing pages by URL and
/// downloadable files by URL.
#[derive(Default)]
struct FakePortal {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl FakePortal {
    fn listing(mut self, url: &str, hrefs: &[&str]) -> Self {
        let links: String = hrefs.iter().map(|h| format!("<a href=\"{h}\">{h}</a><br>")).collect();
        self.pages
            .insert(url.to_string(), format!("<html><body><pre>{links}</pre></body></html>"));
        self
    }

    fn file(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    fn was_requested(&self, suffix: &str) -> bool {
        self.requested.borrow().iter().any(|u| u.ends_with(suffix))
    }
}

impl HttpClientPort for FakePortal {
    fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.requested.borrow_mut().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| EtlError::Transport {
            url: url.to_string(),
            message: "HTTP status client error (404 Not Found)".into(),
        })
    }

    fn download(&self, url: &str, dest: &Path, _timeout: Duration) -> Result<u64> {
        self.requested.borrow_mut().push(url.to_string());
        let bytes = self.files.get(url).ok_or_else(|| EtlError::Transport {
            url: url.to_string(),
            message: "HTTP status client error (404 Not Found)".into(),
        })?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

fn zipped(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn quarter_csv(rows: &[(&str, &str)]) -> String {
    let mut csv = String::from("DATA;REG_ANS;CD_CONTA_CONTABIL;DESCRICAO;VL_SALDO_INICIAL;VL_SALDO_FINAL\n");
    for (id, value) in rows {
        csv.push_str(&format!("2025-01-01;{id};411;EVENTOS;0;{value}\n"));
    }
    csv
}

fn registry_csv() -> Vec<u8> {
    b"Registro_Operadora;CNPJ;Razao_Social;Modalidade;UF\n\
      123;11.222.333/0001-44;ALFA SAUDE;Medicina de Grupo;SP\n"
        .to_vec()
}

fn config_in(root: &Path) -> EtlConfig {
    EtlConfig {
        base_listing_url: BASE.to_string(),
        registry_url: REGISTRY_URL.to_string(),
        raw_dir: root.join("raw"),
        processed_dir: root.join("processed"),
        log_dir: root.join("logs"),
        ..EtlConfig::default()
    }
}

fn portal() -> FakePortal {
    let year = format!("{DISCLOSURES}2025/");
    FakePortal::default()
        .listing(BASE, &["../", "operadoras/", "demonstracoes_contabeis/"])
        .listing(DISCLOSURES, &["../", "2024/", "2025/"])
        .listing(&year, &["1T2025.zip", "2T2025.zip", "3T2025.zip", "4T2025.zip"])
        .file(
            &format!("{year}4T2025.zip"),
            zipped(&[("4T2025.csv", quarter_csv(&[("123", "1.000,00"), ("123", "500,00")]).as_str())]),
        )
        .file(
            &format!("{year}3T2025.zip"),
            zipped(&[("3T2025.csv", quarter_csv(&[("123", "300,00")]).as_str())]),
        )
        .file(
            &format!("{year}2T2025.zip"),
            zipped(&[
                ("2T2025.csv", quarter_csv(&[("123", "200,00"), ("777", "50,00")]).as_str()),
                ("leiame.txt", "layout description"),
            ]),
        )
        .file(REGISTRY_URL, registry_csv())
}

#[test]
fn run_downloads_latest_three_quarters_and_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let portal = portal();
    let pipeline = Pipeline::new(config_in(dir.path()), &portal);

    let manifest = pipeline.run().unwrap();

    let periods: Vec<String> = manifest.archives.iter().map(|a| a.period().to_string()).collect();
    assert_eq!(periods, vec!["4T2025", "3T2025", "2T2025"]);
    assert!(!portal.was_requested("1T2025.zip"));
    assert!(!portal.was_requested("/2024/"));

    let raw = dir.path().join("raw");
    assert!(raw.join("zips/4T2025.zip").is_file());
    assert!(raw.join("4T2025/4T2025.csv").is_file());
    assert!(raw.join("2T2025/leiame.txt").is_file());
    assert!(raw.join("Relatorio_cadop.csv").is_file());

    assert_eq!(manifest.command, "run");
    assert_eq!(manifest.processed_files.len(), 3);
    assert_eq!(manifest.counts.quarterly_records, 5);
    assert_eq!(manifest.counts.unmatched_records, 1);
    assert_eq!(manifest.counts.aggregated_groups, 3);

    let report = fs::read_to_string(dir.path().join("processed/despesas_agregadas.csv")).unwrap();
    let lines: Vec<&str> = report.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines[1], "11.222.333/0001-44;ALFA SAUDE;SP;2025;4;R$ 1.500,00;R$ 750,00");
    assert_eq!(lines[2], "11.222.333/0001-44;ALFA SAUDE;SP;2025;3;R$ 300,00;R$ 300,00");
    assert_eq!(lines[3], "11.222.333/0001-44;ALFA SAUDE;SP;2025;2;R$ 200,00;R$ 200,00");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("processed/run_manifest.json")).unwrap())
            .unwrap();
    assert_eq!(json["archives"].as_array().unwrap().len(), 3);
    assert_eq!(json["counts"]["aggregated_groups"], 3);
}

#[test]
fn existing_registry_is_not_downloaded_again() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join("Relatorio_cadop.csv"), registry_csv()).unwrap();

    let mut portal = portal();
    portal.files.remove(REGISTRY_URL);
    let pipeline = Pipeline::new(config_in(dir.path()), &portal);

    pipeline.run().unwrap();
    assert!(!portal.was_requested("Relatorio_cadop.csv"));
}

#[test]
fn archives_without_csv_are_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let year = format!("{DISCLOSURES}2025/");
    let portal = FakePortal::default()
        .listing(BASE, &["demonstracoes_contabeis/"])
        .listing(DISCLOSURES, &["2025/"])
        .listing(&year, &["1T2025.zip"])
        .file(&format!("{year}1T2025.zip"), zipped(&[("leiame.txt", "nothing here")]))
        .file(REGISTRY_URL, registry_csv());
    let pipeline = Pipeline::new(config_in(dir.path()), &portal);

    assert!(matches!(pipeline.run(), Err(EtlError::NoData(_))));
}

#[test]
fn failed_download_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut portal = portal();
    portal.files.remove(&format!("{DISCLOSURES}2025/3T2025.zip"));
    let pipeline = Pipeline::new(config_in(dir.path()), &portal);

    assert!(matches!(pipeline.run(), Err(EtlError::Transport { .. })));
    assert!(!dir.path().join("processed/run_manifest.json").exists());
}

#[test]
fn discover_lists_urls_without_downloading() {
    let dir = tempfile::tempdir().unwrap();
    let portal = portal();
    let pipeline = Pipeline::new(config_in(dir.path()), &portal);

    let archives = pipeline.discover().unwrap();
    assert_eq!(archives.len(), 3);
    assert_eq!(archives[0].url, format!("{DISCLOSURES}2025/4T2025.zip"));
    assert!(!dir.path().join("raw").exists());
}
