pub struct StatsHelper;

impl StatsHelper {
    /// Mean of the non-NaN values; NaN when there are none.
    pub fn mean(values: &[f64]) -> f64 {
        let (sum, count) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            return f64::NAN;
        }
        sum / count as f64
    }

    /// Mean of the present values, skipping `None` and NaN entries.
    pub fn mean_present<I>(values: I) -> f64
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let present: Vec<f64> = values.into_iter().flatten().collect();
        Self::mean(&present)
    }

    /// Maximum of the non-NaN values; NaN when there are none.
    pub fn max(values: &[f64]) -> f64 {
        values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, f64::max)
    }
}
