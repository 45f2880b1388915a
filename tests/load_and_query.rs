use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use stopfrisk::{
    load_file, load_file_with, Borough, ColumnLayout, Dataset, LoadOptions, MalformedRows, Race,
    RowError, StopRates,
};

struct Row<'a> {
    year: &'a str,
    description: &'a str,
    arrested: bool,
    frisked: bool,
    gender: &'a str,
    race: &'a str,
    location: &'a str,
}

fn csv_text(rows: &[Row]) -> String {
    let layout = ColumnLayout::default();
    let width = layout.min_columns();
    let mut out = (0..width).map(|i| format!("h{i}")).collect::<Vec<_>>().join(",");
    out.push('\n');
    for row in rows {
        let mut cells = vec!["".to_string(); width];
        cells[layout.year] = row.year.into();
        cells[layout.description] = row.description.into();
        cells[layout.arrested] = if row.arrested { "Y" } else { "N" }.into();
        cells[layout.frisked] = if row.frisked { "Y" } else { "N" }.into();
        cells[layout.gender] = row.gender.into();
        cells[layout.race] = row.race.into();
        cells[layout.location] = row.location.into();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

fn row<'a>(year: &'a str, gender: &'a str, race: &'a str) -> Row<'a> {
    Row {
        year,
        description: "CPW",
        arrested: false,
        frisked: false,
        gender,
        race,
        location: "Brooklyn",
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[test]
fn end_to_end_2021_example() -> Result<()> {
    let dir = TempDir::new()?;
    let rows = [
        row("2021", "F", "B"),
        row("2021", "F", "B"),
        row("2021", "M", "B"),
        row("2021", "F", "W"),
        row("2021", "M", "W"),
    ];
    let path = write_file(&dir, "stops.csv", &csv_text(&rows))?;
    let ds = load_file(&path)?;

    let bias = ds.gender_bias(2021);
    assert_eq!(bias.female().map(round2), [66.67, 50.0, 60.0]);
    assert_eq!(bias.male().map(round2), [33.33, 50.0, 40.0]);

    let black = ds.population_stopped(2021, "B");
    assert_eq!(black.len(), 3);
    assert!(black.iter().all(|r| r.race == Race::Black));
    let genders: Vec<&str> = black.iter().map(|r| r.gender.code()).collect();
    assert_eq!(genders, vec!["F", "F", "M"]);

    assert_eq!(ds.most_common_borough(2021), Some(Borough::Brooklyn));
    Ok(())
}

#[test]
fn every_record_lands_in_its_year() -> Result<()> {
    let dir = TempDir::new()?;
    let rows = [
        row("2011", "M", "B"),
        row("2012", "M", "W"),
        row("2011", "F", "Q"),
        row(" 2013 ", "F", "B"),
        row("2012", "M", "B"),
    ];
    let path = write_file(&dir, "stops.csv", &csv_text(&rows))?;
    let ds = load_file(&path)?;

    assert_eq!(ds.years(), vec![2011, 2012, 2013]);
    assert_eq!(ds.record_count(), rows.len());
    for group in ds.groups() {
        let expected = rows
            .iter()
            .filter(|r| r.year.trim().parse::<i32>().ok() == Some(group.year()))
            .count();
        assert_eq!(group.len(), expected);
    }
    Ok(())
}

#[test]
fn rates_stay_within_bounds() -> Result<()> {
    let dir = TempDir::new()?;
    let mut rows = Vec::new();
    for i in 0..10 {
        rows.push(Row {
            frisked: i % 2 == 0,
            arrested: i % 5 == 0,
            ..row("2012", "M", "B")
        });
    }
    let path = write_file(&dir, "stops.csv", &csv_text(&rows))?;
    let ds = load_file(&path)?;

    let rates = ds.frisked_vs_arrested(2012);
    assert_eq!(rates, StopRates { frisked: 50.0, arrested: 20.0 });
    assert!((0.0..=100.0).contains(&rates.frisked));
    assert!((0.0..=100.0).contains(&rates.arrested));
    Ok(())
}

#[test]
fn header_only_file_answers_every_query() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "empty.csv", &csv_text(&[]))?;
    let ds = load_file(&path)?;

    assert!(ds.is_empty());
    assert!(ds.year(2011).is_none());
    assert!(ds.population_stopped(2011, "B").is_empty());
    assert_eq!(ds.frisked_vs_arrested(2011), StopRates::default());
    assert_eq!(ds.gender_bias(2011).female(), [0.0; 3]);
    assert_eq!(ds.gender_bias(2011).male(), [0.0; 3]);
    assert_eq!(ds.crime_increase("ROBBERY", 2011, 2012), 0.0);
    assert_eq!(ds.most_common_borough(2011), None);
    Ok(())
}

#[test]
fn malformed_row_policies() -> Result<()> {
    let dir = TempDir::new()?;
    let mut text = csv_text(&[row("2011", "M", "B"), row("2012", "F", "W")]);
    text.push_str("2013,ROBBERY,Y\n");
    let path = write_file(&dir, "bad.csv", &text)?;

    let err = load_file(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RowError>(),
        Some(RowError::TooFewColumns { found: 3, .. })
    ));

    let options = LoadOptions {
        malformed: MalformedRows::Skip,
        ..LoadOptions::default()
    };
    let loaded = load_file_with(&path, &options)?;
    assert_eq!(loaded.rows_loaded, 2);
    assert_eq!(loaded.rows_skipped, 1);
    assert_eq!(loaded.dataset.years(), vec![2011, 2012]);
    Ok(())
}

#[test]
fn layout_from_json_file() -> Result<()> {
    let dir = TempDir::new()?;
    let layout_path = write_file(
        &dir,
        "layout.json",
        r#"{ "year": 3, "description": 0, "arrested": 1, "frisked": 2,
             "gender": 4, "race": 5, "location": 6 }"#,
    )?;
    let layout = ColumnLayout::from_json_file(&layout_path)?;
    assert_eq!(layout.min_columns(), 7);
    assert_eq!(layout.marker, "Y");

    let data = "desc,arr,frisk,year,sex,race,loc\n\
                ROBBERY,Y,Y,2019,M,W,Staten Island\n\
                CPW,N,Y,2019,F,B,staten island\n";
    let path = write_file(&dir, "narrow.csv", data)?;
    let loaded = load_file_with(&path, &LoadOptions { layout, ..LoadOptions::default() })?;
    let ds = loaded.dataset;

    assert_eq!(ds.most_common_borough(2019), Some(Borough::StatenIsland));
    assert_eq!(ds.frisked_vs_arrested(2019).frisked, 100.0);
    assert_eq!(ds.crime_increase("ROBBERY", 2018, 2019), 50.0);
    Ok(())
}

#[test]
fn loads_json_records() -> Result<()> {
    let dir = TempDir::new()?;
    let json = r#"[
        { "year": 2014, "description": "BURGLARY", "arrested": true, "frisked": false,
          "gender": "f", "race": "w", "location": "QUEENS" },
        { "year": 2014, "description": "CPW", "arrested": false, "frisked": true,
          "gender": "M", "race": "B", "location": "BRONX" },
        { "year": 2014, "description": "CPW", "arrested": false, "frisked": true,
          "gender": "M", "race": "B", "location": "QUEENS" }
    ]"#;
    let path = write_file(&dir, "stops.json", json)?;
    let ds = load_file(&path)?;

    assert_eq!(ds.record_count(), 3);
    assert_eq!(ds.population_stopped(2014, "W").len(), 1);
    assert_eq!(ds.most_common_borough(2014), Some(Borough::Queens));
    assert_eq!(ds.gender_bias(2014).female()[1], 100.0);
    Ok(())
}

#[test]
fn json_row_missing_year_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let json = r#"[{ "description": "CPW", "arrested": false, "frisked": true,
                     "gender": "M", "race": "B", "location": "BRONX" }]"#;
    let path = write_file(&dir, "stops.json", json)?;
    let err = load_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("JSON row 1"));
    Ok(())
}

#[test]
fn loads_parquet_columns() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stops.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int64, false),
        Field::new("description", DataType::Utf8, false),
        Field::new("arrested", DataType::Boolean, false),
        Field::new("frisked", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("race", DataType::Utf8, false),
        Field::new("location", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![2011, 2011, 2012])),
            Arc::new(StringArray::from(vec!["ROBBERY", "CPW", "ROBBERY"])),
            Arc::new(BooleanArray::from(vec![true, false, false])),
            Arc::new(StringArray::from(vec!["Y", "N", "Y"])),
            Arc::new(StringArray::from(vec!["M", "F", "M"])),
            Arc::new(StringArray::from(vec!["B", "W", "B"])),
            Arc::new(StringArray::from(vec!["BRONX", "BRONX", "MANHATTAN"])),
        ],
    )?;
    let mut writer = ArrowWriter::try_new(File::create(&path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let ds = load_file(&path)?;
    assert_eq!(ds.years(), vec![2011, 2012]);
    assert_eq!(ds.frisked_vs_arrested(2011), StopRates { frisked: 50.0, arrested: 50.0 });
    assert_eq!(ds.most_common_borough(2011), Some(Borough::Bronx));
    assert_eq!(ds.crime_increase("ROBBERY", 2011, 2012), 50.0);
    Ok(())
}

#[test]
fn dataset_can_be_queried_from_threads() -> Result<()> {
    let dir = TempDir::new()?;
    let rows = [row("2011", "M", "B"), row("2011", "F", "W")];
    let path = write_file(&dir, "stops.csv", &csv_text(&rows))?;
    let ds: Dataset = load_file(&path)?;

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert_eq!(ds.population_stopped(2011, "b").len(), 1);
                assert_eq!(ds.most_common_borough(2011), Some(Borough::Brooklyn));
            });
        }
    });
    Ok(())
}

#[test]
fn json_bad_row_follows_policy() -> Result<()> {
    let dir = TempDir::new()?;
    let json = r#"[
        { "year": 2014, "description": "CPW", "arrested": false, "frisked": true,
          "gender": "M", "race": "B", "location": "BRONX" },
        { "year": "not a year", "description": "CPW", "arrested": false, "frisked": true,
          "gender": "M", "race": "B", "location": "BRONX" }
    ]"#;
    let path = write_file(&dir, "stops.json", json)?;

    let err = load_file(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RowError>(),
        Some(RowError::InvalidJson { .. })
    ));
    assert!(format!("{err:#}").contains("JSON row 2"));

    let options = LoadOptions {
        malformed: MalformedRows::Skip,
        ..LoadOptions::default()
    };
    let loaded = load_file_with(&path, &options)?;
    assert_eq!(loaded.rows_loaded, 1);
    assert_eq!(loaded.rows_skipped, 1);
    assert_eq!(loaded.dataset.years(), vec![2014]);
    Ok(())
}

#[test]
fn parquet_null_year_follows_policy() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nulls.parquet");

    let text = |name: &str| Field::new(name, DataType::Utf8, false);
    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int64, true),
        text("description"),
        Field::new("arrested", DataType::Boolean, false),
        Field::new("frisked", DataType::Boolean, false),
        text("gender"),
        text("race"),
        text("location"),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![Some(2011), None])),
            Arc::new(StringArray::from(vec!["ROBBERY", "CPW"])),
            Arc::new(BooleanArray::from(vec![false, true])),
            Arc::new(BooleanArray::from(vec![true, true])),
            Arc::new(StringArray::from(vec!["M", "F"])),
            Arc::new(StringArray::from(vec!["B", "W"])),
            Arc::new(StringArray::from(vec!["QUEENS", "BRONX"])),
        ],
    )?;
    let mut writer = ArrowWriter::try_new(File::create(&path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let err = load_file(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RowError>(),
        Some(RowError::InvalidYear { .. })
    ));
    assert!(format!("{err:#}").contains("Parquet row 2"));

    let options = LoadOptions {
        malformed: MalformedRows::Skip,
        ..LoadOptions::default()
    };
    let loaded = load_file_with(&path, &options)?;
    assert_eq!(loaded.rows_loaded, 1);
    assert_eq!(loaded.rows_skipped, 1);
    assert_eq!(loaded.dataset.most_common_borough(2011), Some(Borough::Queens));
    Ok(())
}
