use std::fs;
use std::path::PathBuf;

use fatura_engine::{
    BatchSource, KnowledgeBase, PipelineOptions, SENTINEL_FALLBACK, process_batches,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("fatura-e2e-{}-{name}", std::process::id()))
}

const MARCO: &str = "\
date,category,title,amount,id
2024-03-01,transporte,Uber Trip,18.50,tx-001
2024-03-02,restaurante,Ifood *Lanchonete Boa,35.00,tx-002
2024-03-05,parcelada,Lojas Renner - Parcela 1/4,89.90,tx-003
2024-03-07,,PADARIA ESTRELA LTDA SP,12.40,tx-004
2024-03-09,,Pix João,250.00,tx-005
";

const ABRIL: &str = "\
date,category,title,amount,id
2024-04-05,parcelada,Lojas Renner - Parcela 2/4,89.90,tx-101
2024-03-02,restaurante,Ifood *Lanchonete Boa,35.00,tx-002
";

fn knowledge() -> KnowledgeBase {
    let mut kb = KnowledgeBase::default();
    kb.add_keyword("Transporte", "uber");
    kb.add_keyword("Alimentação", "ifood");
    kb.add_keyword("Vestuário", "lojas renner");
    kb
}

/// Full run across overlapping statements, with the reference directory on
/// disk: keyword matches, fuzzy establishment match, installments, issuer
/// column carry-over, dedup, and fallback all in one pass.
#[test]
fn test_full_run_with_reference_directory() {
    let reference_path = temp_path("estab.csv");
    fs::write(
        &reference_path,
        "\u{feff}Column5;Grupo_Atividade\nPADARIA ESTRELA LTDA SP;Padarias\nPOSTO SHELL CENTRO;Combustível\n",
    )
    .unwrap();

    let options = PipelineOptions {
        use_establishments: true,
        establishments_path: Some(reference_path.clone()),
        ..PipelineOptions::default()
    };

    let out = process_batches(
        vec![
            BatchSource::from_string("marco.csv", MARCO),
            BatchSource::from_string("abril.csv", ABRIL),
            // duplicate upload of the same statement: must not add rows
            BatchSource::from_string("marco.csv", MARCO),
        ],
        &knowledge(),
        &options,
    );
    fs::remove_file(&reference_path).ok();

    // 5 unique rows from marco + 2 from abril (the repeated Ifood row has a
    // different source batch, so it stays); the duplicated marco upload adds none
    assert_eq!(out.len(), 7);

    let by_id = |id: &str| {
        out.iter()
            .find(|t| t.id_nubank_original.as_deref() == Some(id) && t.source_batch == "marco.csv")
            .unwrap()
    };

    assert_eq!(by_id("tx-001").category, "Transporte");
    assert_eq!(by_id("tx-002").category, "Alimentação");
    assert_eq!(
        by_id("tx-002").category_nubank_original.as_deref(),
        Some("restaurante")
    );

    let renner = by_id("tx-003");
    assert_eq!(renner.category, "Vestuário");
    assert_eq!(renner.installment_current, Some(1));
    assert_eq!(renner.installment_total, Some(4));

    // exact normalized match against the reference directory
    assert_eq!(by_id("tx-004").category, "Padarias");

    // nothing matches "pix joão" at threshold 95
    assert_eq!(
        by_id("tx-005").category,
        fatura_engine::SENTINEL_LOW_SIMILARITY
    );
}

/// With approximate matching off, unmatched titles get the plain fallback
/// no matter what the reference directory contains.
#[test]
fn test_fuzzy_disabled_ignores_reference() {
    let reference_path = temp_path("estab-off.csv");
    fs::write(
        &reference_path,
        "Column5;Grupo_Atividade\nPIX JOÃO;Transferências\n",
    )
    .unwrap();

    let options = PipelineOptions {
        use_establishments: false,
        establishments_path: Some(reference_path.clone()),
        ..PipelineOptions::default()
    };

    let out = process_batches(
        vec![BatchSource::from_string("marco.csv", MARCO)],
        &knowledge(),
        &options,
    );
    fs::remove_file(&reference_path).ok();

    let pix = out
        .iter()
        .find(|t| t.id_nubank_original.as_deref() == Some("tx-005"))
        .unwrap();
    assert_eq!(pix.category, SENTINEL_FALLBACK);
}

/// Knowledge base loaded from disk drives the same run: key order decides
/// keyword priority and the loaded base behaves like the in-memory one.
#[test]
fn test_run_with_knowledge_base_from_disk() {
    let kb_path = temp_path("Categorias.json");
    fs::write(
        &kb_path,
        r#"{"Transporte": ["uber"], "Alimentação": ["ifood", "padaria"]}"#,
    )
    .unwrap();

    let kb = KnowledgeBase::load(&kb_path);
    let out = process_batches(
        vec![BatchSource::from_string("marco.csv", MARCO)],
        &kb,
        &PipelineOptions::default(),
    );
    fs::remove_file(&kb_path).ok();

    assert_eq!(out.len(), 5);
    let padaria = out
        .iter()
        .find(|t| t.id_nubank_original.as_deref() == Some("tx-004"))
        .unwrap();
    // "padaria" keyword hits the establishment title without fuzzy matching
    assert_eq!(padaria.category, "Alimentação");
}
