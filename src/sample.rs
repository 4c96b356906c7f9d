use std::ops::{Shl, Shr};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};

use crate::{
    error::Result,
    observability::log_debug,
    selector::{Selector, SelectorRef},
    table::{RowIdSet, Table},
};

/// Random sample of `n` rows, optionally drawn from the rows of a base selector.
///
/// If at most `n` rows are available the whole pool is selected, with or
/// without replacement. Without a
/// seed every evaluation draws anew; with a seed, [`select`](Selector::select)
/// and [`select_ids`](Selector::select_ids) draw the same rows.
///
/// # Example
/// ```
/// use rowselect::{Query, Sample, Selector};
///
/// let long = Query::new("`petal.length` >= 5").into_ref();
/// let sample = Sample::new(10).with_seed(7);
///
/// // all of these draw from the rows of `long`
/// let a = sample.with_base_selector(Some(long.clone()));
/// let b = sample.compose_from(&long);
/// let c = long.compose_into(&sample);
/// let d = sample.clone() << long.clone();
/// let e = long >> sample;
/// # let _ = (a, b, c, d, e);
/// ```
#[derive(Clone, Debug)]
pub struct Sample {
    n: usize,
    base: Option<SelectorRef>,
    replace: bool,
    seed: Option<u64>,
}

impl Sample {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            base: None,
            replace: false,
            seed: None,
        }
    }

    /// Create a new builder for Sample
    ///
    /// # Example
    /// ```
    /// use rowselect::Sample;
    ///
    /// let sample = Sample::builder(100).replace(true).seed(42).build();
    /// assert_eq!(sample.seed(), Some(42));
    /// ```
    pub fn builder(n: usize) -> SampleBuilder {
        SampleBuilder {
            n,
            ..Default::default()
        }
    }

    /// Draw with replacement. Rows drawn twice are selected once.
    pub fn with_replacement(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// A copy of this sample drawing from the rows of `base` instead.
    pub fn with_base_selector(&self, base: Option<SelectorRef>) -> Sample {
        Sample {
            base,
            ..self.clone()
        }
    }

    /// A copy of this sample drawing from the rows of `upstream`.
    pub fn compose_from(&self, upstream: &SelectorRef) -> Sample {
        self.with_base_selector(Some(upstream.clone()))
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn base(&self) -> Option<&SelectorRef> {
        self.base.as_ref()
    }

    pub fn replace(&self) -> bool {
        self.replace
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Sorted, distinct positions drawn from a pool of `len > n` rows.
    fn draw(&self, len: usize) -> Vec<usize> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut positions: Vec<usize> = if self.replace {
            (0..self.n).map(|_| rng.gen_range(0..len)).collect()
        } else {
            index::sample(&mut rng, len, self.n).into_vec()
        };
        positions.sort_unstable();
        positions.dedup();
        log_debug!(
            component = "sample",
            event = "sample_drawn",
            pool = len,
            n = self.n,
            replace = self.replace,
            distinct = positions.len(),
        );
        positions
    }
}

impl Selector for Sample {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        let pool = match &self.base {
            Some(base) => table.ordered_ids(&base.select_ids(table)?),
            None => table.row_ids().to_vec(),
        };
        if pool.len() <= self.n {
            return Ok(pool.into_iter().collect());
        }
        Ok(self
            .draw(pool.len())
            .into_iter()
            .map(|position| pool[position])
            .collect())
    }

    fn select(&self, table: &Table) -> Result<Table> {
        let pool = match &self.base {
            Some(base) => base.select(table)?,
            None => table.clone(),
        };
        if pool.num_rows() <= self.n {
            return Ok(pool);
        }
        pool.take(&self.draw(pool.num_rows()))
    }
}

impl SelectorRef {
    /// Feed the rows of this selector into `sample`.
    pub fn compose_into(&self, sample: &Sample) -> Sample {
        sample.compose_from(self)
    }
}

/// `sample << upstream` draws from the rows of `upstream`.
impl Shl<SelectorRef> for Sample {
    type Output = Sample;

    fn shl(self, upstream: SelectorRef) -> Sample {
        self.compose_from(&upstream)
    }
}

impl Shl<&SelectorRef> for &Sample {
    type Output = Sample;

    fn shl(self, upstream: &SelectorRef) -> Sample {
        self.compose_from(upstream)
    }
}

/// `upstream >> sample` draws from the rows of `upstream`.
impl Shr<Sample> for SelectorRef {
    type Output = Sample;

    fn shr(self, sample: Sample) -> Sample {
        self.compose_into(&sample)
    }
}

impl Shr<&Sample> for &SelectorRef {
    type Output = Sample;

    fn shr(self, sample: &Sample) -> Sample {
        self.compose_into(sample)
    }
}

/// Builder for Sample
#[derive(Clone, Debug, Default)]
pub struct SampleBuilder {
    n: usize,
    base: Option<SelectorRef>,
    replace: Option<bool>,
    seed: Option<u64>,
}

impl SampleBuilder {
    /// Draw with replacement (default: false)
    pub fn replace(mut self, value: bool) -> Self {
        self.replace = Some(value);
        self
    }

    /// Seed the draw for reproducible samples (default: unseeded)
    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Draw from the rows of `base` (default: the whole table)
    pub fn base_selector(mut self, base: SelectorRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn build(self) -> Sample {
        Sample {
            n: self.n,
            base: self.base,
            replace: self.replace.unwrap_or(false),
            seed: self.seed,
        }
    }
}
