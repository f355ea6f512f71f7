use std::cmp::Ordering;

use anyhow::{ensure, Context, Result};
use esc_vocab::Vocabulary;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierOutput {
    pub index: usize,
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedLabel {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub index: usize,
    pub label: String,
    pub score: f32,
}

fn check_width(classes: usize, vocab: &Vocabulary) -> Result<()> {
    ensure!(
        classes == vocab.len(),
        "model produced {classes} scores but the vocabulary has {} labels",
        vocab.len()
    );
    Ok(())
}

/// Total order on scores with NaN below every number.
fn by_score(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}

/// Rank class scores from best to worst and attach their labels.
///
/// Ties keep class order and NaN scores rank last. `k` of `None` ranks
/// every class.
pub fn rank_scores(
    scores: ArrayView1<f32>,
    vocab: &Vocabulary,
    k: Option<usize>,
) -> Result<Vec<RankedLabel>> {
    check_width(scores.len(), vocab)?;
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| by_score(scores[b], scores[a]));
    let take = k.unwrap_or(order.len()).min(order.len());

    order
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(position, index)| -> Result<RankedLabel> {
            let label = vocab
                .label(index)
                .with_context(|| format!("no label for class {index}"))?;
            Ok(RankedLabel {
                rank: position + 1,
                index,
                label: label.to_string(),
                score: scores[index],
            })
        })
        .collect()
}

/// Arg-max of every row of a `[samples, classes]` output matrix.
///
/// The first of equal scores wins; NaN only wins a row with nothing else.
pub fn decode_batch(
    outputs: ArrayView2<f32>,
    vocab: &Vocabulary,
) -> Result<Vec<ClassifierOutput>> {
    check_width(outputs.ncols(), vocab)?;
    debug!(samples = outputs.nrows(), classes = outputs.ncols(), "decoding batch");
    outputs
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(sample, row)| -> Result<ClassifierOutput> {
            let (index, score) = row
                .iter()
                .copied()
                .enumerate()
                .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
                    Some((_, b)) if by_score(s, b) != Ordering::Greater => best,
                    _ => Some((i, s)),
                })
                .with_context(|| format!("sample {sample} has no scores"))?;
            let label = vocab
                .label(index)
                .with_context(|| format!("no label for class {index}"))?;
            Ok(ClassifierOutput {
                index,
                label: label.to_string(),
                score,
            })
        })
        .collect()
}

/// Plain-text top results report for one sample.
pub fn format_top_results(sample: &str, ranked: &[RankedLabel]) -> String {
    let mut out = format!("Top {} results for sample '{sample}':\n", ranked.len());
    for entry in ranked {
        out.push_str(&format!(
            "    [#{}] {} ({:.2})\n",
            entry.rank, entry.label, entry.score
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    fn vocab() -> Vocabulary {
        Vocabulary::new(["dog", "rooster", "rain", "sea_waves"])
    }

    #[test]
    fn ranks_by_descending_score() {
        let scores = array![0.1f32, 0.6, 0.05, 0.25];
        let ranked = rank_scores(scores.view(), &vocab(), Some(3)).unwrap();
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["rooster", "sea_waves", "dog"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].index, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn ties_keep_class_order_and_k_is_clamped() {
        let scores = array![0.25f32, 0.25, 0.25, 0.25];
        let ranked = rank_scores(scores.view(), &vocab(), Some(10)).unwrap();
        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
        assert_eq!(rank_scores(scores.view(), &vocab(), None).unwrap().len(), 4);
    }

    #[test]
    fn score_width_must_match_vocab() {
        let scores = array![0.5f32, 0.5];
        let err = rank_scores(scores.view(), &vocab(), None).unwrap_err();
        assert!(err.to_string().contains("4 labels"));
    }

    #[test]
    fn decodes_argmax_per_sample() {
        let outputs = array![[0.1f32, 0.2, 0.6, 0.1], [0.9, 0.0, 0.05, 0.05]];
        let decoded = decode_batch(outputs.view(), &vocab()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].label, "rain");
        assert_eq!(decoded[0].index, 2);
        assert_eq!(decoded[1].label, "dog");
        assert!((decoded[1].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn argmax_prefers_first_of_equal_scores() {
        let outputs = array![[0.4f32, 0.1, 0.4, 0.1]];
        let decoded = decode_batch(outputs.view(), &vocab()).unwrap();
        assert_eq!(decoded[0].index, 0);
    }

    #[test]
    fn nan_scores_rank_last() {
        let labels: Vec<String> = (0..64).map(|i| format!("class_{i}")).collect();
        let vocab = Vocabulary::from(labels);
        let scores: Array1<f32> = (0..64)
            .map(|i| if i % 3 == 0 { f32::NAN } else { i as f32 / 64.0 })
            .collect();

        let top = rank_scores(scores.view(), &vocab, Some(5)).unwrap();
        let indices: Vec<usize> = top.iter().map(|r| r.index).collect();
        assert_eq!(indices, [62, 61, 59, 58, 56]);

        let all = rank_scores(scores.view(), &vocab, None).unwrap();
        assert_eq!(all.len(), 64);
        let finite = 64 - 22;
        assert!(all[..finite].iter().all(|r| !r.score.is_nan()));
        assert!(all[finite..].iter().all(|r| r.score.is_nan()));
        // NaNs keep class order among themselves
        assert_eq!(all[finite].index, 0);
        assert_eq!(all[63].index, 63);
    }

    #[test]
    fn argmax_skips_nan() {
        let outputs = array![
            [f32::NAN, 0.1, 0.9, 0.0],
            [0.2, f32::NAN, 0.1, f32::NAN],
            [f32::NAN, f32::NAN, f32::NAN, f32::NAN]
        ];
        let decoded = decode_batch(outputs.view(), &vocab()).unwrap();
        assert_eq!(decoded[0].label, "rain");
        assert_eq!(decoded[1].index, 0);
        assert_eq!(decoded[2].index, 0);
        assert!(decoded[2].score.is_nan());
    }

    #[test]
    fn empty_batch_decodes_to_nothing() {
        let outputs = Array2::<f32>::zeros((0, 4));
        assert!(decode_batch(outputs.view(), &vocab()).unwrap().is_empty());
    }

    #[test]
    fn report_layout() {
        let scores = array![0.1f32, 0.6, 0.05, 0.25];
        let ranked = rank_scores(scores.view(), &vocab(), Some(2)).unwrap();
        assert_eq!(
            format_top_results("rooster_01", &ranked),
            "Top 2 results for sample 'rooster_01':\n\
             \x20   [#1] rooster (0.60)\n\
             \x20   [#2] sea_waves (0.25)\n"
        );
    }
}
