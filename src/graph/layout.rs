//! Force-directed layout (Fruchterman-Reingold), seeded for reproducibility.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN_DISTANCE: f64 = 0.01;
const CONVERGENCE_THRESHOLD: f64 = 1e-4;

/// Compute node positions for a weighted adjacency matrix.
///
/// `weights[i][j]` is the attraction between node i and j (0 when unconnected).
/// Positions are centred on the origin and scaled into [-1, 1].
pub fn spring_layout(weights: &[Vec<f64>], seed: u64, iterations: usize) -> Vec<[f64; 2]> {
    let n = weights.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![[0.0, 0.0]],
        _ => {}
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos: Vec<[f64; 2]> = (0..n).map(|_| [rng.gen::<f64>(), rng.gen::<f64>()]).collect();

    let k = (1.0 / n as f64).sqrt();
    let span = |axis: usize, pos: &[[f64; 2]]| {
        let (lo, hi) = pos.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[axis]), hi.max(p[axis]))
        });
        hi - lo
    };
    let mut temperature = span(0, &pos).max(span(1, &pos)) * 0.1;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut moves = vec![[0.0f64; 2]; n];
        for i in 0..n {
            let mut disp = [0.0f64; 2];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let delta = [pos[i][0] - pos[j][0], pos[i][1] - pos[j][1]];
                let distance = (delta[0] * delta[0] + delta[1] * delta[1])
                    .sqrt()
                    .max(MIN_DISTANCE);
                // repulsion k^2/d, attraction w*d^2/k, both along delta/d
                let force = k * k / (distance * distance) - weights[i][j] * distance / k;
                disp[0] += delta[0] * force;
                disp[1] += delta[1] * force;
            }
            let length = (disp[0] * disp[0] + disp[1] * disp[1]).sqrt().max(MIN_DISTANCE);
            moves[i] = [
                disp[0] * temperature / length,
                disp[1] * temperature / length,
            ];
        }

        let mut shift = 0.0;
        for (p, m) in pos.iter_mut().zip(&moves) {
            p[0] += m[0];
            p[1] += m[1];
            shift += m[0] * m[0] + m[1] * m[1];
        }
        temperature -= cooling;

        if shift.sqrt() / (n as f64) < CONVERGENCE_THRESHOLD {
            break;
        }
    }

    rescale(pos)
}

fn rescale(mut pos: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    let n = pos.len() as f64;
    let center = pos.iter().fold([0.0, 0.0], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
    let center = [center[0] / n, center[1] / n];

    let mut limit: f64 = 0.0;
    for p in pos.iter_mut() {
        p[0] -= center[0];
        p[1] -= center[1];
        limit = limit.max(p[0].abs()).max(p[1].abs());
    }
    if limit > 0.0 {
        for p in pos.iter_mut() {
            p[0] /= limit;
            p[1] /= limit;
        }
    }
    pos
}
