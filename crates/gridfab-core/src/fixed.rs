use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for every continuous quantity (mob positions, speeds, ranges) so
/// that free-layer movement is bit-identical on every platform.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Squared euclidean length of `(dx, dy)`, saturating instead of overflowing.
#[inline]
pub fn length_squared(dx: Fixed64, dy: Fixed64) -> Fixed64 {
    dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
}

/// Euclidean length of `(dx, dy)`.
///
/// Newton iteration on the fixed-point value. Deterministic; converges in
/// well under the iteration bound for any in-world distance.
pub fn length(dx: Fixed64, dy: Fixed64) -> Fixed64 {
    let sq = length_squared(dx, dy);
    if sq <= Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    let two = Fixed64::from_num(2);
    let mut guess = if sq > Fixed64::ONE { sq / two } else { Fixed64::ONE };
    for _ in 0..32 {
        let next = (guess + sq / guess) / two;
        if next == guess {
            break;
        }
        guess = next;
    }
    guess
}
