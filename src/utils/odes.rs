/// Advances an autonomous system by one classic fourth-order Runge-Kutta step.
///
/// Returns the new state together with the averaged slope
/// `(k1 + 2·k2 + 2·k3 + k4) / 6`, which callers use as the step's mean
/// derivative (e.g. the acceleration of a trajectory step).
pub fn rk4_step<const N: usize, F>(
    state: [f64; N],
    d_t: f64,
    derivatives: F,
) -> ([f64; N], [f64; N])
where
    F: Fn(&[f64; N]) -> [f64; N],
{
    let offset = |base: &[f64; N], slope: &[f64; N], factor: f64| -> [f64; N] {
        let mut out = *base;
        for (value, k) in out.iter_mut().zip(slope.iter()) {
            *value += k * factor;
        }
        out
    };

    let k1 = derivatives(&state);
    let k2 = derivatives(&offset(&state, &k1, 0.5 * d_t));
    let k3 = derivatives(&offset(&state, &k2, 0.5 * d_t));
    let k4 = derivatives(&offset(&state, &k3, d_t));

    let mut slope = [0.0; N];
    for i in 0..N {
        slope[i] = (k1[i] + 2.0 * (k2[i] + k3[i]) + k4[i]) / 6.0;
    }

    (offset(&state, &slope, d_t), slope)
}
