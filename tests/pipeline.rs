//! End-to-end run of every stage on a small scenario inside a temp directory.

use std::fs;
use std::path::Path;

use scenario_shocks::app::pipeline::{Stage, run_stages};
use scenario_shocks::config::ScenarioPaths;
use scenario_shocks::shock::ShockSettings;
use serde_json::Value;

const DOMESTIC_HEADER: &str = "Scenario Name,Date,Real GDP growth,Unemployment rate,\
10-year Treasury yield,BBB corporate yield,Mortgage rate";

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn setup(paths: &ScenarioPaths) {
    let files = paths.source_files();

    write(
        &files.historic.domestic,
        &format!(
            "{DOMESTIC_HEADER}\n\
             Historic,2024 Q4,2.5,4.0,4.0,5.5,6.5\n\
             Historic,2024 Q3,2.8,4.1,4.2,5.7,6.6\n"
        ),
    );
    write(
        &files.historic.international,
        "Scenario Name,Date,Euro area real GDP growth\n\
         Historic,2024 Q3,0.8\n\
         Historic,2024 Q4,1.0\n",
    );
    write(
        &files.severely_adverse.domestic,
        &format!(
            "{DOMESTIC_HEADER}\n\
             Severely adverse,2025 Q1,-6.0,6.0,1.0,5.5,5.0\n\
             Severely adverse,2025 Q2,-4.0,8.0,0.8,6.0,4.5\n\
             Severely adverse,2025 Q3,1.0,9.5,1.2,5.0,4.8\n"
        ),
    );
    write(
        &files.severely_adverse.international,
        "Scenario Name,Date,Euro area real GDP growth\n\
         Severely adverse,2025 Q1,-5.0\n\
         Severely adverse,2025 Q2,-2.0\n\
         Severely adverse,2025 Q3,0.5\n",
    );
    write(
        &files.baseline.domestic,
        &format!(
            "{DOMESTIC_HEADER}\n\
             Baseline,2025 Q1,2.0,4.1,4.0,5.4,6.4\n\
             Baseline,2025 Q2,2.1,4.3,4.0,5.4,6.3\n\
             Baseline,2025 Q3,2.1,4.4,4.1,5.5,6.3\n"
        ),
    );
    write(
        &files.baseline.international,
        "Scenario Name,Date,Euro area real GDP growth\n\
         Baseline,2025 Q1,1.1\n\
         Baseline,2025 Q2,1.2\n\
         Baseline,2025 Q3,1.2\n",
    );

    write(
        &paths.factor_mapping_path(),
        r#"{"factors": [
            {"name": "Unemployment rate", "source_column": "Unemployment rate"},
            {"name": "Real GDP", "source_column": "Real GDP level (index)"},
            {"name": "BBB spread", "source_column": "BBB-10Y spread"},
            {"name": "10Y yield", "source_column": "10-year Treasury yield"},
            {"name": "Euro area GDP growth", "source_column": "Euro area real GDP growth"}
        ]}"#,
    );
    write(
        &paths.shock_config_path(),
        r#"{"factors": [
            {"name": "Unemployment rate", "extreme": "max", "shock_method": "level_delta_vs_t0"},
            {"name": "Real GDP", "extreme": "min", "shock_method": "level_pct_vs_t0",
             "output": {"type": "percent"}},
            {"name": "BBB spread", "extreme": "max", "shock_method": "level_delta_vs_t0"},
            {"name": "10Y yield", "extreme": "range", "shock_method": "rate_range"},
            {"name": "Euro area GDP growth", "extreme": "min", "shock_method": "level_delta_vs_t0"}
        ]}"#,
    );

    write(
        &paths.md_config("key_commentary"),
        r#"{"title": "Key Factor Shocks", "categories": [{
            "name": "Labor",
            "bullets": [
                {"type": "computed", "template": "Unemployment rises {Unemployment rate.shock:.1f}ppts to {Unemployment rate.extreme:.1f}%"},
                {"type": "manual", "text": "Labor markets weaken broadly."}
            ]
        }]}"#,
    );
    write(
        &paths.md_config("summary"),
        r#"{"release_date": "February 5, 2025", "scenario_year": 2025, "sections": [{
            "name": "Severely Adverse",
            "bullets": [
                {"template": "BBB spreads widen {BBB spread.shock_bps:.0f}bps"},
                {"template": "Baseline unemployment peaks at {baseline.Unemployment rate.max:.1f}%"},
                {"template": "Prime rate moves {Prime rate.shock:.1f}ppts"}
            ]
        }]}"#,
    );
    write(
        &paths.md_config("timeline"),
        r#"{"release_date": "2025-02-05", "milestones": [
            {"day_offset": 3, "description": "Shocks circulated by {date}"}
        ]}"#,
    );

    write(
        &paths.table_config("table_vs_lastyear"),
        r#"{"scenario_name": "CCAR 2025 (SA)", "factors": [
            {"source": "10Y yield", "template": "{low:.1f}% to {high:.1f}%"},
            {"source": "Unemployment rate", "template": "{shock:+.1f}ppts"}
        ]}"#,
    );
    write(
        &paths.history_table_json("table_vs_lastyear"),
        r#"{"CCAR 2024 (SA)": {"10Y yield": {"display": "0.5% to 1.0%"}}}"#,
    );
    write(
        &paths.table_config("table_vs_history"),
        r#"{"scenario_name": "CCAR 2025 FRB SA", "factor_order": ["Unemployment rate", "10Y yield"]}"#,
    );
    write(
        &paths.table_config("table_vs_avg_gfc"),
        r#"{"factor_groups": [{"group": "Credit", "factors": [
            {"name": "BBB spread", "source": "BBB spread", "template": "{value:.0f}bps", "scale": 100}
        ]}]}"#,
    );
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn full_pipeline_writes_shocks_tables_and_pages() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ScenarioPaths::new(dir.path(), "2025");
    setup(&paths);

    let settings = ShockSettings { round_digits: Some(4) };
    run_stages(&paths, &settings, &[]).unwrap();

    // Shock data keeps configuration order.
    let shocks = read_json(&paths.shock_data_json());
    let names: Vec<&str> = shocks.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["Unemployment rate", "Real GDP", "BBB spread", "10Y yield", "Euro area GDP growth"]
    );

    let unemployment = &shocks["Unemployment rate"];
    assert_eq!(unemployment["extreme_value"], 9.5);
    assert_eq!(unemployment["shock_value"], 5.5);
    assert_eq!(unemployment["extreme_period"], "2025 Q3");

    let gdp = &shocks["Real GDP"];
    let gdp_shock = gdp["shock_value"].as_f64().unwrap();
    assert!(gdp_shock < -2.5 && gdp_shock > -2.6, "{gdp_shock}");
    assert_eq!(gdp["extreme_period"], "2025 Q2");
    assert_eq!(gdp["formatted"], "-2.5%");

    assert_eq!(shocks["BBB spread"]["shock_value"], 3.7);

    let rates = &shocks["10Y yield"];
    assert_eq!(rates["shock_value"]["min"], 0.8);
    assert_eq!(rates["shock_value"]["max"], 1.2);
    assert_eq!(rates["extreme_period"]["min"], "2025 Q2");
    assert!(rates.get("formatted").is_none());

    assert_eq!(shocks["Euro area GDP growth"]["shock_value"], -6.0);

    // t0 carries the derived keys after selection.
    let t0 = read_json(&paths.t0_json());
    assert_eq!(t0["date"], "2024 Q4");
    assert_eq!(t0["factors"]["Real GDP"], 100.0);
    assert_eq!(t0["factors"]["BBB spread"], 1.5);

    // Markdown pages.
    let commentary = fs::read_to_string(paths.artifact("key_commentary.md")).unwrap();
    assert!(commentary.starts_with("# Key Factor Shocks\n\n"));
    assert!(commentary.contains("- Unemployment rises 5.5ppts to 9.5%  `[computed]`\n"));
    assert!(commentary.contains("- Labor markets weaken broadly.  `[manual]`\n"));

    let summary = fs::read_to_string(paths.artifact("summary.md")).unwrap();
    assert!(summary.contains("On February 5, 2025, the FRB released the CCAR 2025 Supervisory scenarios."));
    assert!(summary.contains("- BBB spreads widen 370bps\n"));
    assert!(summary.contains("- Baseline unemployment peaks at 4.4%\n"));
    assert!(summary.contains("- Prime rate moves [Prime rate.shock:N/A]\n"));

    let timeline = fs::read_to_string(paths.artifact("timeline.md")).unwrap();
    assert!(timeline.contains("1. Shocks circulated by Saturday, February 8\n"));

    // Tables: JSON always, CSV only where history exists.
    let lastyear = read_json(&paths.current_table_json("table_vs_lastyear"));
    assert_eq!(lastyear["CCAR 2025 (SA)"]["Unemployment rate"]["display"], "+5.5ppts");
    let csv = fs::read_to_string(paths.artifact("table_vs_lastyear.csv")).unwrap();
    assert_eq!(
        csv,
        "Factor,CCAR 2024 (SA),CCAR 2025 (SA)\n\
         10Y yield,0.5% to 1.0%,0.8% to 1.2%\n\
         Unemployment rate,,+5.5ppts\n"
    );

    let history = read_json(&paths.current_table_json("table_vs_history"));
    assert_eq!(history["CCAR 2025 FRB SA"]["Unemployment rate"], 5.5);
    assert!(history["CCAR 2025 FRB SA"]["10Y yield"].is_null());
    assert!(!paths.artifact("table_vs_history.csv").exists());

    let avg_gfc = read_json(&paths.current_table_json("table_vs_avg_gfc"));
    assert_eq!(avg_gfc["CCAR 2025 (SA)"]["BBB spread"], 370.0);
    assert!(!paths.artifact("table_vs_avg_gfc.csv").exists());
}

#[test]
fn rerunning_a_stage_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ScenarioPaths::new(dir.path(), "2025");
    setup(&paths);

    let settings = ShockSettings::default();
    run_stages(&paths, &settings, &[Stage::Preprocess, Stage::Derive, Stage::Select]).unwrap();
    let first = fs::read_to_string(paths.path_sa_csv()).unwrap();

    run_stages(&paths, &settings, &[Stage::Derive, Stage::Select]).unwrap();
    assert_eq!(fs::read_to_string(paths.path_sa_csv()).unwrap(), first);
}

#[test]
fn unknown_method_fails_with_exit_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ScenarioPaths::new(dir.path(), "2025");
    setup(&paths);
    write(
        &paths.shock_config_path(),
        r#"{"factors": [{"name": "Unemployment rate", "shock_method": "level_ratio"}]}"#,
    );

    let err = run_stages(&paths, &ShockSettings::default(), &[]).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("level_ratio"));
    assert!(!paths.shock_data_json().exists());
}
