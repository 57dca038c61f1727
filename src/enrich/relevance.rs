//! # 相关度评分
//!
//! 简单的关键词匹配密度启发式，不是语义相似度——结果是近似值。

/// 计算专利与行业关键词的相关度评分
///
/// 无关键词时返回中性分 0.5。否则：`matches / len(keywords)` 上限 1.0；
/// 命中超过 1 个不同关键词时乘 1.2 加成（仍封顶 1.0）；保留 2 位小数。
/// 结果恒在 [0.0, 1.0] 区间内。
#[must_use]
pub fn relevance_score(
    title: &str,
    abstract_text: &str,
    technology_area: Option<&str>,
    keywords: &[String],
) -> f64 {
    if keywords.is_empty() {
        return 0.5;
    }

    let text = format!("{title} {abstract_text} {}", technology_area.unwrap_or("")).to_lowercase();

    let matches = keywords
        .iter()
        .filter(|k| text.contains(&k.to_lowercase()))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let mut score = (matches as f64 / keywords.len() as f64).min(1.0);

    if matches > 1 {
        score = (score * 1.2).min(1.0);
    }

    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn empty_keywords_yield_neutral_score() {
        assert_eq!(relevance_score("Any title", "Any abstract", None, &[]), 0.5);
    }

    #[test]
    fn no_matches_score_zero() {
        let score = relevance_score("Umbrella", "A rain shield", None, &kw(&["drug", "medicine"]));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn full_single_keyword_match_scores_one() {
        let score = relevance_score("Drug delivery", "", None, &kw(&["drug"]));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn multiple_matches_get_boost() {
        // 5 个关键词命中 2 个：2/5 = 0.4，加成 ×1.2 = 0.48
        let score = relevance_score(
            "Drug therapy",
            "A therapeutic compound",
            None,
            &kw(&["drug", "therapeutic", "medicine", "pharmaceutical", "biotechnology"]),
        );
        assert_eq!(score, 0.48);
    }

    #[test]
    fn boost_is_capped_at_one() {
        let score = relevance_score(
            "Drug medicine",
            "therapeutic",
            None,
            &kw(&["drug", "medicine", "therapeutic"]),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn technology_area_participates_in_matching() {
        let score = relevance_score("Untitled", "", Some("biotechnology"), &kw(&["biotechnology"]));
        assert_eq!(score, 1.0);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["drug"])]
    #[case(&["drug", "medicine"])]
    #[case(&["a", "b", "c", "d", "e", "f", "g"])]
    fn score_is_always_within_unit_interval(#[case] keywords: &[&str]) {
        let score = relevance_score(
            "Drug medicine device",
            "a b c therapeutic",
            Some("biotechnology"),
            &kw(keywords),
        );
        assert!((0.0..=1.0).contains(&score), "score = {score}");
    }
}
