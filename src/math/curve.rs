//! Sampled response curves (grip, steering, engine torque)

use serde::{Deserialize, Serialize};

use super::Fp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveKey {
    pub input: Fp,
    pub output: Fp,
}

/// Piecewise-linear curve over keys sorted by input. Inputs outside the
/// key range evaluate to the nearest end key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct Curve {
    keys: Vec<CurveKey>,
}

impl From<Vec<CurveKey>> for Curve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Curve::new(keys)
    }
}

impl From<Curve> for Vec<CurveKey> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

impl Curve {
    /// Build a curve; keys are sorted by input.
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by_key(|k| k.input);
        Self { keys }
    }

    pub fn from_points(points: &[(Fp, Fp)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(input, output)| CurveKey { input, output })
                .collect(),
        )
    }

    pub fn constant(value: Fp) -> Self {
        Self::from_points(&[(Fp::ZERO, value)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn evaluate(&self, input: Fp) -> Fp {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Fp::ZERO,
        };
        if input <= first.input {
            return first.output;
        }
        if input >= last.input {
            return last.output;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if input <= b.input {
                let span = b.input - a.input;
                if span.is_zero() {
                    return b.output;
                }
                let t = (input - a.input) / span;
                return Fp::lerp(a.output, b.output, t);
            }
        }
        last.output
    }
}
