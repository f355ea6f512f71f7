pub mod analysis;
pub mod dsp;

pub use analysis::{decode_batch, format_top_results, rank_scores, ClassifierOutput, RankedLabel};
pub use dsp::{standardize, standardize_rows, Moments};
