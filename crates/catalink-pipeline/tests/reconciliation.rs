//! File-to-file runs of the reconciliation pipeline

use catalink_model::{normalize_name, AssetNameError, NameFolding};
use catalink_pipeline::{Pipeline, PipelineConfig, PipelineError, StageKind};
use catalink_test_utils::{catalog_csv, vodka_gold, Workspace, CATALOG_HEADERS};
use pretty_assertions::assert_eq;

fn config_for(ws: &Workspace) -> PipelineConfig {
    PipelineConfig::new()
        .with_input(ws.path("catalog.csv"))
        .with_output(ws.path("out.csv"))
        .with_assets_dir(ws.assets_dir())
}

fn run(ws: &Workspace, stages: &[StageKind]) -> Result<catalink_pipeline::RunReport, PipelineError> {
    Pipeline::new(config_for(ws)).unwrap().run_files(stages)
}

#[test]
fn missing_percentage_is_filled_from_the_asset() {
    let ws = Workspace::new().with_assets(&["Vodka Gold 70-6-40.png"]);
    ws.write_catalog("catalog.csv", &vodka_gold(""));

    let report = run(&ws, &[StageKind::Percentage]).unwrap();

    assert_eq!(ws.read("out.csv"), vodka_gold("40"));
    assert_eq!(report.rows, 1);
    assert_eq!(report.stages[0].filled, 1);
}

#[test]
fn conflicting_percentage_aborts_without_output() {
    let ws = Workspace::new().with_assets(&["Vodka Gold 70-6-40.png"]);
    ws.write_catalog("catalog.csv", &vodka_gold("38"));

    let err = run(&ws, &[StageKind::Percentage]).unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("38") && msg.contains("40"), "{msg}");
    assert!(msg.contains("70cl"), "{msg}");
    assert!(!ws.path("out.csv").exists());
}

#[test]
fn failed_run_leaves_an_existing_output_untouched() {
    let ws = Workspace::new().with_assets(&["Vodka Gold 70-6-40.png"]);
    ws.write_catalog("catalog.csv", &vodka_gold("38"));
    ws.write_catalog("out.csv", "previous,output\n");

    run(&ws, &[StageKind::Percentage]).unwrap_err();

    assert_eq!(ws.read("out.csv"), "previous,output\n");
}

#[test]
fn percentage_fill_is_idempotent() {
    let ws = Workspace::new().with_assets(&["Vodka Gold 70-6-40.png", "Rum X 70-6-37.5.png"]);
    ws.write_catalog(
        "catalog.csv",
        &catalog_csv(
            &CATALOG_HEADERS,
            &[&["Vodka Gold", "70cl", "6", ""], &["Rum X", "70", "6", "null"]],
        ),
    );
    run(&ws, &[StageKind::Percentage]).unwrap();
    let first = ws.read("out.csv");

    let second_config = PipelineConfig::new()
        .with_input(ws.path("out.csv"))
        .with_output(ws.path("again.csv"))
        .with_assets_dir(ws.assets_dir());
    let report = Pipeline::new(second_config)
        .unwrap()
        .run_files(&[StageKind::Percentage])
        .unwrap();

    assert_eq!(ws.read("again.csv"), first);
    assert_eq!(report.stages[0].filled, 0);
    assert_eq!(report.stages[0].confirmed, 2);
}

#[test]
fn strict_mode_rejects_malformed_assets_before_rows() {
    // The row itself has no match; the malformed asset must be reported first
    let ws = Workspace::new().with_assets(&["Gin 70-6-40.png", "gin_label.png"]);
    ws.write_catalog(
        "catalog.csv",
        &catalog_csv(&CATALOG_HEADERS, &[&["Unknown", "70", "6", "40"]]),
    );

    let err = run(&ws, &[StageKind::Strict]).unwrap_err();

    assert!(
        matches!(err, PipelineError::MalformedAsset { ref file, .. } if file == "gin_label.png"),
        "{err}"
    );
    assert!(!ws.path("out.csv").exists());
}

#[cfg(unix)]
#[test]
fn strict_mode_rejects_non_utf8_asset_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let ws = Workspace::new().with_assets(&["Gin 70-6-40.png"]);
    std::fs::write(
        ws.assets_dir().join(OsStr::from_bytes(b"Gin \xff 70-6-40.png")),
        b"",
    )
    .unwrap();
    ws.write_catalog(
        "catalog.csv",
        &catalog_csv(&CATALOG_HEADERS, &[&["Gin", "70", "6", "40"]]),
    );

    let err = run(&ws, &[StageKind::Strict]).unwrap_err();
    assert!(
        matches!(
            err,
            PipelineError::MalformedAsset {
                reason: AssetNameError::NotUtf8,
                ..
            }
        ),
        "{err}"
    );
    assert!(!ws.path("out.csv").exists());

    // The fill stages only skip it
    run(&ws, &[StageKind::Percentage, StageKind::ImagePaths]).unwrap();
    assert!(ws.read("out.csv").contains("Gin 70-6-40.png"));
}

#[test]
fn strict_mode_rejects_duplicate_variants() {
    let ws = Workspace::new().with_assets(&["Rum X 70-6-37.5.png", "Rum X 70-6-37.5.webp"]);
    ws.write_catalog(
        "catalog.csv",
        &catalog_csv(&CATALOG_HEADERS, &[&["Rum X", "70", "6", "37.5"]]),
    );

    let err = run(&ws, &[StageKind::Strict]).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateAsset { .. }), "{err}");
}

#[test]
fn full_run_fills_and_links_every_row() {
    let ws = Workspace::new().with_assets(&["Vodka Gold 70-6-40.png", "Ouzo 70-12-38.webp"]);
    ws.write_catalog(
        "catalog.csv",
        &catalog_csv(
            &["productId", "name", "volume", "quantityInBox", "percentage"],
            &[
                &["P-1", "Vodka Gold", "70cl", "6", ""],
                &["P-2", "Ouzo", "70", "12", "38"],
            ],
        ),
    );

    let mut config = config_for(&ws);
    config.image_paths.path_prefix = Some("/static/img".to_string());
    let report = Pipeline::new(config)
        .unwrap()
        .run_files(&StageKind::ALL)
        .unwrap();

    let expected = catalog_csv(
        &["productId", "name", "volume", "quantityInBox", "percentage", "imageFile"],
        &[
            &["P-1", "Vodka Gold", "70cl", "6", "40", "/static/img/Vodka Gold 70-6-40.png"],
            &["P-2", "Ouzo", "70", "12", "38", "/static/img/Ouzo 70-12-38.webp"],
        ],
    );
    assert_eq!(ws.read("out.csv"), expected);
    assert_eq!(report.stages.len(), 3);
    assert_eq!(report.stages[2].confirmed, 2);
}

#[test]
fn dry_run_writes_nothing_but_reports_the_checksum() {
    let ws = Workspace::new().with_assets(&["Vodka Gold 70-6-40.png"]);
    ws.write_catalog("catalog.csv", &vodka_gold(""));

    let dry = Pipeline::new(config_for(&ws).with_dry_run(true))
        .unwrap()
        .run_files(&[StageKind::Percentage])
        .unwrap();
    assert!(dry.dry_run);
    assert!(!ws.path("out.csv").exists());

    let wet = run(&ws, &[StageKind::Percentage]).unwrap();
    assert_eq!(dry.checksum, wet.checksum);
}

#[test]
fn semicolon_catalogs_keep_comma_decimals() {
    let ws = Workspace::new().with_assets(&["Rum X 0,7-12-37,5.png"]);
    ws.write_catalog(
        "catalog.csv",
        "name;volume;quantityInBox;percentage\nRum X;0,7;12;\n",
    );

    let mut config = config_for(&ws);
    config.delimiter = ';';
    Pipeline::new(config)
        .unwrap()
        .run_files(&[StageKind::Percentage])
        .unwrap();

    assert_eq!(
        ws.read("out.csv"),
        "name;volume;quantityInBox;percentage\nRum X;0,7;12;37.5\n"
    );
}

#[test]
fn unresolvable_image_names_the_product() {
    let ws = Workspace::new().with_assets(&["Gin 70-6-40.png"]);
    ws.write_catalog(
        "catalog.csv",
        &catalog_csv(&CATALOG_HEADERS, &[&["Whisky", "70", "6", "40"]]),
    );

    let err = run(&ws, &[StageKind::ImagePaths]).unwrap_err();
    assert!(err.to_string().contains("Whisky"), "{err}");
    assert_eq!(err.row(), Some(1));
    assert!(!ws.path("out.csv").exists());
}

#[test]
fn untouched_columns_keep_their_padding() {
    let ws = Workspace::new().with_assets(&["Gin 70-6-40.png"]);
    ws.write_catalog(
        "catalog.csv",
        "name,volume,quantityInBox,percentage,note\nGin,70,6,40,\"  keep my spaces  \"\n",
    );

    run(&ws, &[StageKind::Percentage]).unwrap();

    let out = ws.read("out.csv");
    assert!(out.contains("  keep my spaces  "), "{out}");
}

#[test]
fn possessive_folding_matches_plain_name() {
    assert_eq!(
        normalize_name("Ouzo's", NameFolding::Possessive),
        normalize_name("ouzo", NameFolding::Possessive)
    );
}
