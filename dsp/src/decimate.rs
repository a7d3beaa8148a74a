use serde::{Deserialize, Serialize};

use crate::FilterChain;

/// Reduction of one filtered batch to one output sample.
///
/// Every sample of a batch always passes through the filter cascade, the
/// policy only selects what is retained.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decimation {
    /// Keep the cascade output of the last sample in the batch.
    #[default]
    Last,
    /// Keep the mean of the cascade outputs over the batch.
    Mean,
}

impl Decimation {
    /// Filter a batch and decimate it to a single value.
    ///
    /// # Args
    /// * `chain` - The filter cascade. Its state is updated by every sample.
    /// * `batch` - Raw samples, in acquisition order.
    ///
    /// # Returns
    /// The retained value or `None` if the batch was empty.
    pub fn process<I>(self, chain: &mut FilterChain, batch: I) -> Option<f32>
    where
        I: IntoIterator<Item = f32>,
    {
        let outputs = batch.into_iter().map(|x| chain.update(x));
        match self {
            Self::Last => outputs.fold(None, |_, y| Some(y)),
            Self::Mean => {
                let (sum, count) =
                    outputs.fold((0., 0u32), |(sum, count), y| (sum + y, count + 1));
                (count > 0).then(|| sum / count as f32)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coefficients, STAGES};

    #[test]
    fn last_sees_every_sample() {
        let batch = [3., -1., 4., 1., 5., 9., 2., 6.];
        let mut chain = FilterChain::default();
        let mut reference = FilterChain::default();
        let y = Decimation::Last.process(&mut chain, batch);
        let expect = batch.iter().map(|x| reference.update(*x)).last();
        assert_eq!(y, expect);
        assert_eq!(chain, reference);
    }

    #[test]
    fn mean() {
        let mut chain = FilterChain::new([Coefficients::UNITY; STAGES]);
        let y = Decimation::Mean.process(&mut chain, [10., 20., 30., 40.]);
        assert_eq!(y, Some(25.));
    }

    #[test]
    fn empty() {
        let mut chain = FilterChain::default();
        assert_eq!(Decimation::Last.process(&mut chain, []), None);
        assert_eq!(Decimation::Mean.process(&mut chain, []), None);
        assert_eq!(chain, FilterChain::default());
    }
}
