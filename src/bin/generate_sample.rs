use anyhow::{Context, Result};
use stopfrisk::ColumnLayout;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick from `(item, weight)` pairs.
    fn weighted<'a>(&mut self, items: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for &(item, weight) in items {
            if roll < weight {
                return item;
            }
            roll -= weight;
        }
        items.last().map(|(item, _)| *item).unwrap_or_default()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_stops.csv".to_string());

    let mut rng = SimpleRng::new(42);
    let layout = ColumnLayout::default();
    let width = layout.min_columns();

    let descriptions = [
        ("ROBBERY", 3.0),
        ("CPW", 2.5),
        ("BURGLARY", 1.5),
        ("GRAND LARCENY AUTO", 1.0),
        ("CRIMINAL TRESPASS", 1.5),
        ("ASSAULT, 3RD DEGREE", 0.5),
    ];
    let races = [("B", 5.0), ("Q", 2.5), ("W", 1.0), ("P", 0.6), ("A", 0.4), ("Z", 0.1)];
    let genders = [("M", 9.0), ("F", 0.8), ("Z", 0.2)];
    let locations = [
        ("BROOKLYN", 3.2),
        ("MANHATTAN", 2.2),
        ("BRONX", 2.4),
        ("QUEENS", 1.8),
        ("STATEN ISLAND", 0.4),
        ("PCT 075", 0.1),
    ];
    // (year, stops, frisk rate, arrest rate)
    let years = [
        (2011, 600, 0.56, 0.06),
        (2012, 500, 0.55, 0.06),
        (2013, 200, 0.50, 0.07),
        (2014, 50, 0.45, 0.14),
    ];

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let header: Vec<String> = (0..width).map(|i| format!("col{i}")).collect();
    writer.write_record(&header)?;

    let mut rows = 0usize;
    for &(year, stops, frisk_rate, arrest_rate) in &years {
        for _ in 0..stops {
            let mut cells = vec![String::new(); width];
            cells[layout.year] = year.to_string();
            cells[layout.description] = rng.weighted(&descriptions).to_string();
            cells[layout.arrested] = flag(rng.chance(arrest_rate), &layout);
            cells[layout.frisked] = flag(rng.chance(frisk_rate), &layout);
            cells[layout.gender] = rng.weighted(&genders).to_string();
            cells[layout.race] = rng.weighted(&races).to_string();
            cells[layout.location] = rng.weighted(&locations).to_string();
            writer.write_record(&cells)?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!("Wrote {rows} stops ({} years, {width} columns) to {output_path}", years.len());
    Ok(())
}

fn flag(set: bool, layout: &ColumnLayout) -> String {
    if set { layout.marker.clone() } else { "N".to_string() }
}
