use assert_approx_eq::assert_approx_eq;

use efiscen_export::{
    analysis::{Aggregator, Metric},
    error::EfiscenError,
    export::{
        column, read_age_classes, CsvWriter, DatabaseWriter, Exporter, SimulationInfo, Table,
    },
    io,
    models::{
        AgeClasses, Experiment, Selection, SoilSeries, Stratum, StratumKey, TreeCarbonSeries,
    },
};

fn spread(total: f64) -> AgeClasses {
    let mut classes = [0.0; 16];
    classes[4] = total * 0.75;
    classes[15] = total * 0.25;
    classes
}

fn make_stratum(area: f64, stock: [f64; 3]) -> Stratum {
    Stratum {
        area: vec![spread(area); 3].into(),
        growing_stock: stock.iter().map(|v| spread(*v)).collect(),
        deadwood: vec![spread(2.0); 3].into(),
        increment: vec![4.0, 4.5, 5.0].into(),
        natural_mortality: vec![spread(1.0); 3].into(),
        felling_area: vec![spread(0.5); 3].into(),
        felling_removals: vec![spread(20.0); 3].into(),
        felling_residues: vec![spread(1.0); 3].into(),
        soil: SoilSeries {
            nwl: vec![10.0, 11.0, 12.0].into(),
            hum1: vec![50.0, 51.0, 52.0].into(),
            carbon_lost: vec![0.0, 0.2, 0.2].into(),
            ..Default::default()
        },
        tree_carbon: TreeCarbonSeries {
            stem: vec![spread(30.0); 3].into(),
            leaves: vec![spread(3.0); 3].into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn create_test_experiment() -> Experiment {
    let mut exp = Experiment::new("Integration", 2000, 5);
    exp.strata.insert(
        StratumKey::pack(1, 1, 1, 1),
        make_stratum(10.0, [1000.0, 1100.0, 1200.0]),
    );
    exp.strata.insert(
        StratumKey::pack(1, 2, 1, 1),
        make_stratum(30.0, [600.0, 650.0, 700.0]),
    );
    exp.strata.insert(
        StratumKey::pack(2, 1, 3, 4),
        make_stratum(20.0, [400.0, 420.0, 440.0]),
    );
    exp
}

fn info() -> SimulationInfo {
    SimulationInfo {
        scenario_id: 2,
        country_id: 14,
        project_id: 1,
        param_file: "test.prm".to_string(),
    }
}

#[test]
fn test_aggregate_with_owner_filter() {
    let exp = create_test_experiment();
    let selection = Selection::new([], [2], [], []);
    let agg = Aggregator::new(&exp, &selection);
    assert_eq!(agg.num_matched(), 1);
    assert_approx_eq!(agg.latest(Metric::Area), 30.0);
    assert_approx_eq!(agg.latest(Metric::AvgVolume), 700.0 / 30.0);
}

#[test]
fn test_region_wildcard_spans_all_strata() {
    let exp = create_test_experiment();
    let all = Selection::all();
    let agg = Aggregator::new(&exp, &all);
    assert_eq!(agg.num_matched(), 3);
    let series: Vec<(usize, f64)> = agg.series(Metric::GrowingStock).collect();
    assert_eq!(series.len(), 3);
    assert_approx_eq!(series[2].1, 2340.0);
    assert_approx_eq!(agg.latest(Metric::GrowingStock), series[2].1);

    // incremental mean weighted by area: all strata share the same increment
    assert_approx_eq!(agg.latest(Metric::IncrAv), 5.0);

    let dist = agg.distribution_at(Metric::Area, 0).unwrap();
    assert_approx_eq!(dist[4], 45.0);
    assert_approx_eq!(dist[15], 15.0);
}

#[test]
fn test_database_export_all_tables() {
    let exp = create_test_experiment();
    let mut exporter = Exporter::new(exp.into(), DatabaseWriter::in_memory().unwrap());
    let report = exporter.save(&info()).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.exported.len(), 10);
    assert_eq!(report.matrices, 3);
    assert_eq!(report.rows(Table::Base), Some(9));
    assert_eq!(report.rows(Table::CarbonSoil), Some(3));

    let db = exporter.store();
    assert_eq!(db.count_matrices().unwrap(), 3);
    assert_eq!(db.count_rows(Table::Deadwood).unwrap(), 9);
    assert_eq!(db.count_rows(Table::CarbonCountry).unwrap(), 3);

    let sim = db.simulation(report.simulation_id).unwrap().unwrap();
    assert_eq!(sim.country_id, 14);
    assert_eq!(sim.base_year, 2000);
    assert_eq!(sim.param_file, "test.prm");

    let base = db.fetch_rows(Table::Base).unwrap();
    let first = &base[0];
    assert_eq!(column(first, "step").and_then(|v| v.as_i64()), Some(2000));
    assert_eq!(column(first, "grincr").and_then(|v| v.as_f64()), Some(0.0));
    let area = read_age_classes("area", first).unwrap();
    assert_approx_eq!(area[4], 7.5);
    assert_approx_eq!(area[15], 2.5);
    let last = &base[2];
    assert_eq!(column(last, "step").and_then(|v| v.as_i64()), Some(2010));

    let soil = db.fetch_rows(Table::CarbonSoil).unwrap();
    assert_eq!(column(&soil[0], "litin").and_then(|v| v.as_f64()), Some(0.0));
    // (186 - 180) + 5 * 0.6
    let litin = column(&soil[1], "litin").and_then(|v| v.as_f64()).unwrap();
    assert_approx_eq!(litin, 9.0);
    let csoil = column(&soil[2], "csoil").and_then(|v| v.as_f64()).unwrap();
    assert_approx_eq!(csoil, 192.0);
}

#[test]
fn test_repeated_export_reuses_matrix_ids() {
    let exp = create_test_experiment();
    let mut exporter = Exporter::new(exp.into(), DatabaseWriter::in_memory().unwrap());
    let first = exporter.save(&info()).unwrap();
    let second = exporter.save(&info()).unwrap();
    assert_ne!(first.simulation_id, second.simulation_id);
    assert_eq!(exporter.store().count_matrices().unwrap(), 3);
    assert_eq!(exporter.store().count_rows(Table::Base).unwrap(), 18);
}

#[test]
fn test_selected_export_only_writes_enabled_tables() {
    let dir = tempfile::tempdir().unwrap();
    let selection = dir.path().join("tables.txt");
    std::fs::write(&selection, "base 1\nfelling_matrix 0\nnatmort 1\nbogus 1\n").unwrap();

    let mut exporter = Exporter::new(
        create_test_experiment().into(),
        DatabaseWriter::in_memory().unwrap(),
    );
    let report = exporter.save_selected_database(&info(), &selection).unwrap();
    assert_eq!(report.exported.len(), 2);
    assert_eq!(exporter.store().count_rows(Table::NatMort).unwrap(), 9);
    assert_eq!(exporter.store().count_rows(Table::FellingMatrix).unwrap(), 0);
}

#[test]
fn test_selected_export_without_file_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = Exporter::new(
        create_test_experiment().into(),
        DatabaseWriter::in_memory().unwrap(),
    );
    let err = exporter
        .save_selected_database(&info(), dir.path().join("missing.txt"))
        .unwrap_err();
    assert!(matches!(err, EfiscenError::Io(_)));
    assert_eq!(exporter.store().count_matrices().unwrap(), 0);
}

#[test]
fn test_csv_export_writes_one_file_per_table() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut exporter = Exporter::new(
        create_test_experiment().into(),
        CsvWriter::create(&out).unwrap(),
    );
    let report = exporter.save(&info()).unwrap();
    assert!(report.is_complete());
    for table in Table::ALL {
        assert!(exporter.store().table_path(table).exists(), "{table} missing");
    }
    assert!(out.join("matrix.csv").exists());

    let mut rdr = csv::Reader::from_path(exporter.store().table_path(Table::TreeC)).unwrap();
    assert_eq!(rdr.records().count(), 9);
}

#[test]
fn test_json_roundtrip_then_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exp.json");
    io::write_json(&create_test_experiment(), &path, false).unwrap();
    let loaded = io::read_json(&path).unwrap();
    assert_eq!(loaded, create_test_experiment());

    let mut exporter = Exporter::new(loaded.into(), DatabaseWriter::in_memory().unwrap());
    assert!(exporter.save(&info()).unwrap().is_complete());
}

#[test]
fn test_export_snapshots_live_experiment_per_session() {
    let shared = create_test_experiment().into_shared();
    let db = DatabaseWriter::in_memory().unwrap();
    let mut exporter = Exporter::from_shared(&shared, db).unwrap();
    let first = exporter.save(&info()).unwrap();
    assert_eq!(first.matrices, 3);

    // the simulation keeps recording between sessions
    shared
        .write()
        .unwrap()
        .strata
        .insert(StratumKey::pack(3, 1, 1, 1), make_stratum(5.0, [1.0, 2.0, 3.0]));
    let session = exporter.begin_session(&info()).unwrap();
    assert_eq!(session.num_matrices(), 4);

    // and during one, which that session does not see
    shared.write().unwrap().strata.clear();
    assert_eq!(exporter.save_table(&session, Table::Base).unwrap(), 12);
    assert_eq!(exporter.experiment().num_strata(), 4);
}

#[test]
fn test_ragged_experiment_is_rejected_on_load() {
    let mut exp = create_test_experiment();
    exp.strata
        .get_mut(&StratumKey::pack(1, 1, 1, 1))
        .unwrap()
        .soil
        .nwl
        .push(13.0);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.json");
    io::write_json(&exp, &path, false).unwrap();
    let err = io::read_json(&path).unwrap_err();
    assert!(matches!(err, EfiscenError::ValidationError(_)));
}
