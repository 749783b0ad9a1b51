//! Writes a few synthetic BRO CPT documents to `sample_data/` so the tool
//! can be tried without network access:
//!
//! ```text
//! cargo run --bin generate_sample
//! cargo run -- --source-dir sample_data CPT_SAMPLE_A CPT_SAMPLE_B CPT_SAMPLE_C
//! ```

use std::path::Path;

use anyhow::{Context, Result};

/// Value BRO uses for "not measured".
const NO_DATA: f64 = -999999.0;

/// One soil layer: (bottom depth below surface [m], cone resistance [MPa], friction ratio [%]).
type Layer = (f64, f64, f64);

struct SyntheticCpt {
    id: &'static str,
    offset: f64,
    final_length: f64,
    layers: &'static [Layer],
    /// Whether the U1/U3 filter positions were fitted.
    all_pore_filters: bool,
}

const SAMPLES: [SyntheticCpt; 3] = [
    SyntheticCpt {
        id: "CPT_SAMPLE_A",
        offset: 1.2,
        final_length: 24.0,
        layers: &[(1.5, 2.0, 2.5), (6.0, 0.6, 5.0), (9.0, 0.3, 8.0), (24.0, 18.0, 0.8)],
        all_pore_filters: false,
    },
    SyntheticCpt {
        id: "CPT_SAMPLE_B",
        offset: -0.8,
        final_length: 18.5,
        layers: &[(2.0, 1.5, 3.0), (8.5, 0.4, 6.5), (18.5, 14.0, 1.0)],
        all_pore_filters: true,
    },
    SyntheticCpt {
        id: "CPT_SAMPLE_C",
        offset: 3.5,
        final_length: 30.0,
        layers: &[(4.0, 8.0, 1.2), (12.0, 0.9, 4.0), (15.0, 0.2, 9.0), (30.0, 22.0, 0.6)],
        all_pore_filters: false,
    },
];

const STEP: f64 = 0.02;

/// Deterministic xoshiro256** generator; only normal deviates are drawn.
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

    /// Normal deviate by Box-Muller from two uniforms in `[0, 1)`.
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let mut uniform = || (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        let u1 = uniform().max(1e-15);
        let u2 = uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn layer_at(layers: &[Layer], depth: f64) -> Layer {
    layers
        .iter()
        .copied()
        .find(|(bottom, _, _)| depth <= *bottom)
        .or_else(|| layers.last().copied())
        .unwrap_or((depth, 1.0, 1.0))
}

/// Build the `cptcommon:values` payload: one `;`-terminated row of 24
/// comma-separated numbers per sample.
fn generate_payload(cpt: &SyntheticCpt, rng: &mut SimpleRng) -> String {
    let mut out = String::new();
    let steps = (cpt.final_length / STEP).round() as usize;
    let mut inclination: f64 = 0.0;

    for i in 1..=steps {
        let length = i as f64 * STEP;
        inclination = (inclination + rng.gauss(0.0, 0.02)).clamp(-3.0, 3.0);
        let depth = length * inclination.to_radians().cos();

        let (_, qc_mean, rf_mean) = layer_at(cpt.layers, depth);
        let qc = (qc_mean * (1.0 + rng.gauss(0.0, 0.08))).max(0.05);
        let rf = (rf_mean * (1.0 + rng.gauss(0.0, 0.1))).max(0.1);
        let fs = qc * rf / 100.0;
        let hydrostatic = 0.0098 * depth;
        let u2 = hydrostatic + if rf_mean > 4.0 { 0.15 * qc } else { 0.0 } + rng.gauss(0.0, 0.005);
        let (u1, u3) = if cpt.all_pore_filters {
            (u2 * 1.3, hydrostatic + rng.gauss(0.0, 0.003))
        } else {
            (NO_DATA, NO_DATA)
        };

        let row: [f64; 24] = [
            length,
            depth,
            length / 0.02,
            qc,
            qc + 0.2 * u2,
            qc - 0.018 * depth,
            NO_DATA,
            NO_DATA,
            NO_DATA,
            NO_DATA,
            NO_DATA,
            inclination,
            0.0,
            NO_DATA,
            NO_DATA,
            inclination.abs(),
            NO_DATA,
            fs,
            NO_DATA,
            NO_DATA,
            u1,
            u2,
            u3,
            rf,
        ];
        let fields: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
        out.push_str(&fields.join(","));
        out.push(';');
    }
    out
}

fn document(cpt: &SyntheticCpt, payload: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<dispatchCharacteristics xmlns="http://www.broservices.nl/xsd/dscpt/1.1"
    xmlns:bro="http://www.broservices.nl/xsd/brocommon/3.0"
    xmlns:cpt="http://www.broservices.nl/xsd/cpt/1.1"
    xmlns:cptcommon="http://www.broservices.nl/xsd/cptcommon/1.1">
  <dispatchDocument>
    <CPT_O>
      <bro:broId>{id}</bro:broId>
      <deliveredVerticalPosition>
        <cptcommon:offset uom="m">{offset}</cptcommon:offset>
      </deliveredVerticalPosition>
      <conePenetrometerSurvey>
        <cptcommon:finalDepth uom="m">{final_length}</cptcommon:finalDepth>
        <cpt:conePenetrationTest>
          <cptcommon:cptResult>
            <cptcommon:values>{payload}</cptcommon:values>
          </cptcommon:cptResult>
        </cpt:conePenetrationTest>
      </conePenetrometerSurvey>
    </CPT_O>
  </dispatchDocument>
</dispatchCharacteristics>
"#,
        id = cpt.id,
        offset = cpt.offset,
        final_length = cpt.final_length,
    )
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let out_dir = Path::new("sample_data");
    std::fs::create_dir_all(out_dir).context("Failed to create sample_data/")?;

    for cpt in &SAMPLES {
        let payload = generate_payload(cpt, &mut rng);
        let path = out_dir.join(format!("{}.xml", cpt.id));
        std::fs::write(&path, document(cpt, &payload))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "Wrote {} ({} rows, offset {} m)",
            path.display(),
            payload.matches(';').count(),
            cpt.offset
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_rows_are_terminated_and_complete() {
        let cpt = &SAMPLES[1];
        let payload = generate_payload(cpt, &mut SimpleRng::new(7));

        assert!(payload.ends_with(';'));
        let rows: Vec<&str> = payload.split(';').filter(|r| !r.is_empty()).collect();
        assert_eq!(rows.len(), (cpt.final_length / STEP).round() as usize);
        for row in &rows {
            let cells: Vec<f64> = row.split(',').map(|c| c.parse().unwrap()).collect();
            assert_eq!(cells.len(), 24);
        }
    }

    #[test]
    fn test_generator_is_deterministic() {
        let a = generate_payload(&SAMPLES[0], &mut SimpleRng::new(42));
        let b = generate_payload(&SAMPLES[0], &mut SimpleRng::new(42));
        assert_eq!(a, b);

        let mut rng = SimpleRng::new(1);
        let mean = (0..2000).map(|_| rng.gauss(5.0, 1.0)).sum::<f64>() / 2000.0;
        assert!((mean - 5.0).abs() < 0.1);
    }
}
