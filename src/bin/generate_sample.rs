use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    /// Uniform value in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

struct Row {
    year: i64,
    department: &'static str,
    segment: &'static str,
    profile: Option<&'static str>,
    sales: f64,
    customers: i64,
}

const YEARS: [i64; 2] = [2022, 2023];

/// (department, base spend per customer)
const DEPARTMENTS: [(&str, f64); 6] = [
    ("Boots", 140.0),
    ("Boot Accessories", 35.0),
    ("Cowboy Hats", 95.0),
    ("Formalwear", 120.0),
    ("Knick Knacks", 18.0),
    ("Women's Jeans", 60.0),
];

/// (segment, customer base, spend multiplier)
const SEGMENTS: [(&str, f64, f64); 4] = [
    ("Core", 1800.0, 1.0),
    ("Elite", 350.0, 2.4),
    ("Infrequent", 2600.0, 0.55),
    ("New", 900.0, 0.8),
];

const PROFILES: [&str; 3] = ["Blue Collar Royalty", "Country Casual", "Urban Rider"];

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for &year in &YEARS {
        let year_trend = if year == 2023 { 1.06 } else { 1.0 };
        for &(department, spend) in &DEPARTMENTS {
            for &(segment, base_customers, multiplier) in &SEGMENTS {
                // One unprofiled roll-up row plus one row per profile.
                let profiles = std::iter::once(None).chain(PROFILES.iter().copied().map(Some));
                for profile in profiles {
                    // Leave some combinations out so the heatmap has gaps.
                    if profile.is_some() && rng.next_f64() < 0.15 {
                        continue;
                    }
                    let share = if profile.is_some() { 0.3 } else { 1.0 };
                    let customers = (base_customers * share * rng.uniform(0.6, 1.4)).round() as i64;
                    let per_customer = spend * multiplier * year_trend * rng.uniform(0.8, 1.25);
                    rows.push(Row {
                        year,
                        department,
                        segment,
                        profile,
                        sales: (customers as f64 * per_customer * 100.0).round() / 100.0,
                        customers,
                    });
                }
            }
        }
    }
    rows
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Year", DataType::Int64, false),
        Field::new("Department Description", DataType::Utf8, false),
        Field::new("Segment Description", DataType::Utf8, false),
        Field::new("Profile Description", DataType::Utf8, true),
        Field::new("Sales", DataType::Float64, false),
        Field::new("Customers", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.department))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.segment))),
            Arc::new(rows.iter().map(|r| r.profile).collect::<StringArray>()),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.sales))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.customers))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "Year",
        "Department Description",
        "Segment Description",
        "Profile Description",
        "Sales",
        "Customers",
    ])?;
    for r in rows {
        writer.write_record([
            r.year.to_string(),
            r.department.to_string(),
            r.segment.to_string(),
            r.profile.unwrap_or_default().to_string(),
            format!("{:.2}", r.sales),
            r.customers.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    write_parquet(&rows, "sample_sales.parquet")?;
    write_csv(&rows, "sample_sales.csv")?;

    println!(
        "Wrote {} sales rows ({} years, {} departments, {} segments) to sample_sales.parquet and sample_sales.csv",
        rows.len(),
        YEARS.len(),
        DEPARTMENTS.len(),
        SEGMENTS.len()
    );
    Ok(())
}
