use serde::{Deserialize, Serialize};

/// Number of age classes in a distribution: 15 ten-year bands plus ">150".
pub const AGE_CLASS_COUNT: usize = 16;

/// Width of one age class in years.
pub const AGE_CLASS_WIDTH: usize = 10;

/// Age-class distribution of area, volume or carbon.
pub type AgeClasses = [f64; AGE_CLASS_COUNT];

/// Human-readable label for an age class (e.g. "20-30", ">150").
pub fn age_class_label(index: usize) -> String {
    if index + 1 >= AGE_CLASS_COUNT {
        format!(">{}", (AGE_CLASS_COUNT - 1) * AGE_CLASS_WIDTH)
    } else {
        format!("{}-{}", index * AGE_CLASS_WIDTH, (index + 1) * AGE_CLASS_WIDTH)
    }
}

/// A value recorded once per simulation step that can be reduced to one number.
pub trait StepValue {
    fn total(&self) -> f64;
}

impl StepValue for f64 {
    fn total(&self) -> f64 {
        *self
    }
}

impl StepValue for AgeClasses {
    fn total(&self) -> f64 {
        self.iter().sum()
    }
}

/// Append-only, step-indexed record of one simulation output.
///
/// The simulation engine pushes one value per step; everything downstream
/// only reads. Reads past the recorded length return `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries<T> {
    values: Vec<T>,
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> TimeSeries<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value for the next step.
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    pub fn get(&self, step: usize) -> Option<&T> {
        self.values.get(step)
    }

    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T: StepValue> TimeSeries<T> {
    /// Reduced value at `step`, or 0 when nothing was recorded there.
    pub fn total_at(&self, step: usize) -> f64 {
        self.get(step).map(StepValue::total).unwrap_or(0.0)
    }
}

impl TimeSeries<AgeClasses> {
    /// Distribution at `step`, all zeros when nothing was recorded there.
    pub fn classes_at(&self, step: usize) -> AgeClasses {
        self.get(step).copied().unwrap_or([0.0; AGE_CLASS_COUNT])
    }
}

impl<T> From<Vec<T>> for TimeSeries<T> {
    fn from(values: Vec<T>) -> Self {
        Self { values }
    }
}

impl<T> FromIterator<T> for TimeSeries<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
