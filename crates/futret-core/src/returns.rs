/// Percentage change from `price_start` to `price_current`.
///
/// Missing or non-finite inputs and a zero start price yield `None`; the
/// result is never defaulted to zero. Full precision is kept, rounding is a
/// rendering concern.
pub fn percent_return(price_start: Option<f64>, price_current: Option<f64>) -> Option<f64> {
    let start = price_start.filter(|value| value.is_finite())?;
    let current = price_current.filter(|value| value.is_finite())?;
    if start == 0.0 {
        return None;
    }
    Some((current - start) / start * 100.0)
}
