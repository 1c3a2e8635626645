//! Write `sample_data.xlsx` and `sample_data.parquet`: a contact sheet with
//! cells left empty at random, for trying out the null filters.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::Workbook;

const ROWS: i64 = 200;
const NULL_RATE: f64 = 0.2;
const HEADERS: [&str; 5] = ["ID", "NAME", "EMAIL", "PHONE", "SCORE"];

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

    /// `Some(value)` unless the draw lands under [`NULL_RATE`].
    fn maybe<T>(&mut self, value: T) -> Option<T> {
        (self.next_f64() >= NULL_RATE).then_some(value)
    }
}

struct Contact {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    score: Option<f64>,
}

fn generate(rng: &mut SimpleRng) -> Vec<Contact> {
    let first = ["Ada", "Brian", "Chen", "Dara", "Emil", "Farah", "Goran", "Hana"];
    let last = ["Lovel", "Kern", "Wu", "Okafor", "Berg", "Haddad", "Petrov", "Sato"];

    (1..=ROWS)
        .map(|id| {
            let f = first[(rng.next_u64() % first.len() as u64) as usize];
            let l = last[(rng.next_u64() % last.len() as u64) as usize];
            let phone = format!("+1-555-{:04}", rng.next_u64() % 10_000);
            let score = (rng.next_f64() * 1000.0).round() / 10.0;
            Contact {
                id,
                name: rng.maybe(format!("{f} {l}")),
                email: rng.maybe(format!("{}.{}@example.com", f.to_lowercase(), l.to_lowercase())),
                phone: rng.maybe(phone),
                score: rng.maybe(score),
            }
        })
        .collect()
}

fn write_xlsx(contacts: &[Contact], path: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (i, c) in contacts.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, c.id as f64)?;
        for (col, text) in [(1, &c.name), (2, &c.email), (3, &c.phone)] {
            if let Some(text) = text {
                sheet.write_string(row, col, text)?;
            }
        }
        if let Some(score) = c.score {
            sheet.write_number(row, 4, score)?;
        }
    }

    workbook.save(path).with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn write_parquet(contacts: &[Contact], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Int64, false),
        Field::new(HEADERS[1], DataType::Utf8, true),
        Field::new(HEADERS[2], DataType::Utf8, true),
        Field::new(HEADERS[3], DataType::Utf8, true),
        Field::new(HEADERS[4], DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(contacts.iter().map(|c| c.id))),
            Arc::new(StringArray::from_iter(contacts.iter().map(|c| c.name.as_deref()))),
            Arc::new(StringArray::from_iter(contacts.iter().map(|c| c.email.as_deref()))),
            Arc::new(StringArray::from_iter(contacts.iter().map(|c| c.phone.as_deref()))),
            Arc::new(Float64Array::from_iter(contacts.iter().map(|c| c.score))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let contacts = generate(&mut rng);

    write_xlsx(&contacts, "sample_data.xlsx")?;
    write_parquet(&contacts, "sample_data.parquet")?;

    println!(
        "Wrote {} rows ({} columns, ~{:.0}% empty cells) to sample_data.{{xlsx,parquet}}",
        contacts.len(),
        HEADERS.len(),
        NULL_RATE * 100.0
    );
    Ok(())
}
