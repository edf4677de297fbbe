//! Parallel map/reduce over sequences.
//!
//! Fan-out is coarse-grained: every worker owns a fresh sketch built by a
//! shared factory, ingests its slice of the input, and the partial sketches
//! fold together with [`StreamSketch::update`]. Merging is associative and
//! commutative on the admitted set (and additive on counts), so partials are
//! reduced in whatever order workers finish. Any worker error aborts the
//! whole job and every partial is dropped; a partially ingested sketch is
//! never folded into the result.

use std::marker::PhantomData;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Result, SketchError};
use crate::hash::KmerHasher;
use crate::sketch::{
    BottomCountSketch, BottomSketch, StreamSketch, TopCountSketch, TopSketch,
};

/// Map/reduce harness around a sketch factory.
///
/// The factory must build identically configured empty sketches: it is
/// invoked once per worker and once for the reduction identity.
pub struct ParallelSketcher<S, F> {
    factory: F,
    _sketch: PhantomData<fn() -> S>,
}

impl<S, F> ParallelSketcher<S, F>
where
    S: StreamSketch,
    F: Fn() -> S + Sync,
{
    pub fn new(factory: F) -> Self {
        ParallelSketcher {
            factory,
            _sketch: PhantomData,
        }
    }

    /// Sketch a single sequence.
    pub fn map_sequence(&self, seq: &[u8]) -> Result<S> {
        let mut sketch = (self.factory)();
        sketch.add(seq)?;
        Ok(sketch)
    }

    /// Sketch a batch of sequences into one partial sketch.
    pub fn map_sequences<'s, I>(&self, seqs: I) -> Result<S>
    where
        I: IntoIterator<Item = &'s [u8]>,
    {
        let mut sketch = (self.factory)();
        for seq in seqs {
            sketch.add(seq)?;
        }
        Ok(sketch)
    }

    /// Fold `b` into `a`.
    pub fn reduce(&self, mut a: S, b: &S) -> Result<S> {
        a.update(b)?;
        Ok(a)
    }

    /// Sketch many sequences across the rayon thread pool and reduce the
    /// partials, unordered, into one sketch.
    pub fn sketch_parallel<T>(&self, seqs: &[T]) -> Result<S>
    where
        T: AsRef<[u8]> + Sync,
    {
        debug!(
            sequences = seqs.len(),
            threads = rayon::current_num_threads(),
            "parallel sketch fan-out"
        );
        seqs.par_iter()
            .try_fold(
                || (self.factory)(),
                |mut sketch, seq| {
                    sketch.add(seq.as_ref())?;
                    Ok(sketch)
                },
            )
            .try_reduce(|| (self.factory)(), |mut a, b| {
                a.update(&b)?;
                Ok(a)
            })
    }
}

/// Which sketch shape to build; the runtime-selected counterpart of the
/// four concrete sketch types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchKind {
    Top,
    Bottom,
    TopCount,
    BottomCount,
}

/// Everything needed to build one sketch.
#[derive(Clone)]
pub struct SketchParams {
    pub k: usize,
    pub max_size: usize,
    pub seed: u64,
    pub hasher: Arc<dyn KmerHasher>,
}

impl SketchParams {
    pub fn build(&self, kind: SketchKind) -> Result<AnySketch> {
        let hasher = Arc::clone(&self.hasher);
        Ok(match kind {
            SketchKind::Top => {
                AnySketch::Top(TopSketch::new(self.k, self.max_size, hasher, self.seed)?)
            }
            SketchKind::Bottom => {
                AnySketch::Bottom(BottomSketch::new(self.k, self.max_size, hasher, self.seed)?)
            }
            SketchKind::TopCount => AnySketch::TopCount(TopCountSketch::new(
                self.k,
                self.max_size,
                hasher,
                self.seed,
            )?),
            SketchKind::BottomCount => AnySketch::BottomCount(BottomCountSketch::new(
                self.k,
                self.max_size,
                hasher,
                self.seed,
            )?),
        })
    }
}

/// A sketch whose polarity and counting are chosen at run time.
///
/// Updating across different shapes is an [`SketchError::IncompatibleSketch`]
/// error, mirroring what the type system enforces statically for the
/// concrete sketch types.
#[derive(Debug, Clone)]
pub enum AnySketch {
    Top(TopSketch),
    Bottom(BottomSketch),
    TopCount(TopCountSketch),
    BottomCount(BottomCountSketch),
}

impl AnySketch {
    pub fn kind(&self) -> SketchKind {
        match self {
            AnySketch::Top(_) => SketchKind::Top,
            AnySketch::Bottom(_) => SketchKind::Bottom,
            AnySketch::TopCount(_) => SketchKind::TopCount,
            AnySketch::BottomCount(_) => SketchKind::BottomCount,
        }
    }

    pub fn add(&mut self, seq: &[u8]) -> Result<()> {
        match self {
            AnySketch::Top(sketch) => sketch.add(seq),
            AnySketch::Bottom(sketch) => sketch.add(seq),
            AnySketch::TopCount(sketch) => sketch.add(seq),
            AnySketch::BottomCount(sketch) => sketch.add(seq),
        }
    }

    pub fn update(&mut self, other: &AnySketch) -> Result<()> {
        match (self, other) {
            (AnySketch::Top(a), AnySketch::Top(b)) => a.update(b),
            (AnySketch::Bottom(a), AnySketch::Bottom(b)) => a.update(b),
            (AnySketch::TopCount(a), AnySketch::TopCount(b)) => a.update(b),
            (AnySketch::BottomCount(a), AnySketch::BottomCount(b)) => a.update(b),
            (a, b) => Err(SketchError::IncompatibleSketch(format!(
                "sketch kind mismatch: {:?} vs {:?}",
                a.kind(),
                b.kind()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AnySketch::Top(sketch) => sketch.len(),
            AnySketch::Bottom(sketch) => sketch.len(),
            AnySketch::TopCount(sketch) => sketch.len(),
            AnySketch::BottomCount(sketch) => sketch.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nvisited(&self) -> u64 {
        match self {
            AnySketch::Top(sketch) => sketch.nvisited(),
            AnySketch::Bottom(sketch) => sketch.nvisited(),
            AnySketch::TopCount(sketch) => sketch.nvisited(),
            AnySketch::BottomCount(sketch) => sketch.nvisited(),
        }
    }

    pub fn sorted_hashes(&self) -> Vec<u64> {
        match self {
            AnySketch::Top(sketch) => sketch.sorted_hashes(),
            AnySketch::Bottom(sketch) => sketch.sorted_hashes(),
            AnySketch::TopCount(sketch) => sketch.sorted_hashes(),
            AnySketch::BottomCount(sketch) => sketch.sorted_hashes(),
        }
    }
}

impl StreamSketch for AnySketch {
    fn add(&mut self, seq: &[u8]) -> Result<()> {
        AnySketch::add(self, seq)
    }

    fn update(&mut self, other: &Self) -> Result<()> {
        AnySketch::update(self, other)
    }
}

/// Several sketches fed from the same stream, e.g. a top and a bottom sketch
/// of the same data built in one pass.
///
/// Construction broadcasts: a single kind expands over all parameter sets,
/// and a single parameter set expands over all kinds.
#[derive(Clone)]
pub struct SketchList {
    sketches: Vec<AnySketch>,
}

impl SketchList {
    pub fn new(kinds: &[SketchKind], params: &[SketchParams]) -> Result<Self> {
        let len = match (kinds.len(), params.len()) {
            (0, _) | (_, 0) => {
                return Err(SketchError::InvalidArgument(
                    "kinds and params must not be empty",
                ));
            }
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(SketchError::InvalidArgument(
                    "kinds and params must have the same length, or length 1",
                ));
            }
        };
        let mut sketches = Vec::with_capacity(len);
        for i in 0..len {
            let kind = kinds[i % kinds.len()];
            let params = &params[i % params.len()];
            sketches.push(params.build(kind)?);
        }
        Ok(SketchList { sketches })
    }

    pub fn len(&self) -> usize {
        self.sketches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sketches.is_empty()
    }

    pub fn sketches(&self) -> &[AnySketch] {
        &self.sketches
    }

    pub fn into_inner(self) -> Vec<AnySketch> {
        self.sketches
    }

    /// Feed one sequence to every sketch in the list.
    pub fn add(&mut self, seq: &[u8]) -> Result<()> {
        for sketch in &mut self.sketches {
            sketch.add(seq)?;
        }
        Ok(())
    }

    /// Element-wise in-place merge.
    pub fn update(&mut self, other: &SketchList) -> Result<()> {
        if self.sketches.len() != other.sketches.len() {
            return Err(SketchError::IncompatibleSketch(format!(
                "sketch list length mismatch: {} vs {}",
                self.sketches.len(),
                other.sketches.len()
            )));
        }
        for (mine, theirs) in self.sketches.iter_mut().zip(&other.sketches) {
            mine.update(theirs)?;
        }
        Ok(())
    }
}

impl StreamSketch for SketchList {
    fn add(&mut self, seq: &[u8]) -> Result<()> {
        SketchList::add(self, seq)
    }

    fn update(&mut self, other: &Self) -> Result<()> {
        SketchList::update(self, other)
    }
}
